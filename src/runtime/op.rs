use std::cmp::Ordering;
use std::rc::Rc;

use crate::op::{ArithmeticError, BinaryOp, Number};

use super::error::RuntimeErrorKind;
use super::value::Value;
use super::MAX_SEQUENCE_LEN;

pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
    let ordering = |wanted: fn(Ordering) -> bool| {
        compare(op, lhs, rhs, &mut vec![]).map(|ord| Value::Bool(ord.is_some_and(wanted)))
    };

    match op {
        BinaryOp::Equal => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEqual => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt => ordering(Ordering::is_lt),
        BinaryOp::Gt => ordering(Ordering::is_gt),
        BinaryOp::Lte => ordering(Ordering::is_le),
        BinaryOp::Gte => ordering(Ordering::is_ge),
        BinaryOp::Plus => add(lhs, rhs),
        BinaryOp::Multiply => multiply(lhs, rhs),
        BinaryOp::Minus | BinaryOp::Divide | BinaryOp::Modulo => arithmetic(op, lhs, rhs),
    }
}

pub fn negate(value: &Value) -> Result<Value, RuntimeErrorKind> {
    match value.as_number() {
        Some(n) => Ok(n.negate().into()),
        None => Err(RuntimeErrorKind::TypeError(format!(
            "bad operand type for unary `-`: {}",
            value.type_str()
        ))),
    }
}

pub fn not(value: &Value) -> Value {
    Value::Bool(!value.is_truthy())
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => {
            sequence_len(a.len(), 1, b.len())?;
            Ok(Value::Str(format!("{a}{b}")))
        }
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            let mut items = Vec::with_capacity(sequence_len(a.len(), 1, b.len())?);
            items.extend(a.iter().cloned());
            items.extend(b.iter().cloned());

            Ok(Value::new_list(items))
        }
        _ => arithmetic(BinaryOp::Plus, lhs, rhs),
    }
}

fn multiply(lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
    match (lhs, rhs) {
        (Value::Str(s), n) | (n, Value::Str(s)) if repeat_count(n).is_some() => {
            let count = repeat_count(n).unwrap_or(0);
            sequence_len(s.len(), count, 0)?;

            Ok(Value::Str(s.repeat(count)))
        }
        (Value::List(list), n) | (n, Value::List(list)) if repeat_count(n).is_some() => {
            let count = repeat_count(n).unwrap_or(0);
            let items = list.borrow();
            let mut repeated = Vec::with_capacity(sequence_len(items.len(), count, 0)?);
            if items.is_empty() {
                return Ok(Value::new_list(repeated));
            }
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }

            Ok(Value::new_list(repeated))
        }
        _ => arithmetic(BinaryOp::Multiply, lhs, rhs),
    }
}

fn repeat_count(value: &Value) -> Option<usize> {
    match value {
        Value::Int(i) => Some(usize::try_from((*i).max(0)).unwrap_or(usize::MAX)),
        Value::Bool(b) => Some(*b as usize),
        _ => None,
    }
}

/// `len * count + extra`, refused past `MAX_SEQUENCE_LEN`.
fn sequence_len(len: usize, count: usize, extra: usize) -> Result<usize, RuntimeErrorKind> {
    len.checked_mul(count)
        .and_then(|n| n.checked_add(extra))
        .filter(|n| *n <= MAX_SEQUENCE_LEN)
        .ok_or(RuntimeErrorKind::SequenceTooLong)
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Err(unsupported(op, lhs, rhs));
    };

    match Number::arithmetic(op, a, b) {
        Ok(n) => Ok(n.into()),
        Err(ArithmeticError::DivisionByZero) => Err(RuntimeErrorKind::DivisionByZero),
        Err(ArithmeticError::NotArithmetic) => Err(unsupported(op, lhs, rhs)),
    }
}

/// `None` when the operands are unordered (a NaN is involved).
/// `active` holds the list pairs being ordered further up; meeting one again
/// means the lists contain themselves.
fn compare(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    active: &mut Vec<(usize, usize)>,
) -> Result<Option<Ordering>, RuntimeErrorKind> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            let pair = (Rc::as_ptr(a) as usize, Rc::as_ptr(b) as usize);
            if active.contains(&pair) {
                return Err(RuntimeErrorKind::CyclicComparison);
            }

            let (a, b) = (a.borrow(), b.borrow());
            for (x, y) in a.iter().zip(b.iter()) {
                if x != y {
                    active.push(pair);
                    let ordering = compare(op, x, y, active);
                    active.pop();
                    return ordering;
                }
            }

            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
            _ => Err(RuntimeErrorKind::TypeError(format!(
                "`{op}` not supported between {} and {}",
                lhs.type_str(),
                rhs.type_str()
            ))),
        },
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::TypeError(format!(
        "unsupported operand types for `{op}`: {} and {}",
        lhs.type_str(),
        rhs.type_str()
    ))
}

/// Reads `container[key]` for lists, strings and dicts.
pub fn get_item(container: &Value, key: &Value) -> Result<Value, RuntimeErrorKind> {
    match container {
        Value::List(list) => {
            let list = list.borrow();
            let index = resolve_index(key, list.len())?;

            Ok(list[index].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let index = resolve_index(key, chars.len())?;

            Ok(Value::Str(chars[index].to_string()))
        }
        Value::Dict(dict) => dict
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RuntimeErrorKind::KeyNotFound(key.repr())),
        other => Err(RuntimeErrorKind::TypeError(format!(
            "{} is not subscriptable",
            other.type_str()
        ))),
    }
}

pub fn set_item(container: &Value, key: Value, value: Value) -> Result<(), RuntimeErrorKind> {
    match container {
        Value::List(list) => {
            let mut list = list.borrow_mut();
            let index = resolve_index(&key, list.len())?;
            list[index] = value;

            Ok(())
        }
        Value::Dict(dict) => {
            if matches!(key, Value::List(_) | Value::Dict(_)) {
                return Err(RuntimeErrorKind::TypeError(format!(
                    "unhashable type: {}",
                    key.type_str()
                )));
            }

            let position = dict.borrow().iter().position(|(k, _)| *k == key);
            let mut dict = dict.borrow_mut();
            match position {
                Some(i) => dict[i].1 = value,
                None => dict.push((key, value)),
            }

            Ok(())
        }
        other => Err(RuntimeErrorKind::TypeError(format!(
            "{} does not support item assignment",
            other.type_str()
        ))),
    }
}

pub fn append(target: &Value, value: Value) -> Result<(), RuntimeErrorKind> {
    match target {
        Value::List(list) => {
            list.borrow_mut().push(value);
            Ok(())
        }
        other => Err(no_method(other, "append")),
    }
}

/// Removes the first element equal to `value`.
pub fn remove(target: &Value, value: &Value) -> Result<(), RuntimeErrorKind> {
    match target {
        Value::List(list) => {
            let position = list.borrow().iter().position(|item| item == value);
            match position {
                Some(i) => {
                    list.borrow_mut().remove(i);
                    Ok(())
                }
                None => Err(RuntimeErrorKind::ValueError(format!(
                    "list.remove(x): {} not in list",
                    value.repr()
                ))),
            }
        }
        other => Err(no_method(other, "remove")),
    }
}

fn no_method(value: &Value, method: &str) -> RuntimeErrorKind {
    RuntimeErrorKind::TypeError(format!("{} has no method `{method}`", value.type_str()))
}

pub fn len(value: &Value) -> Result<Value, RuntimeErrorKind> {
    let len = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(list) => list.borrow().len(),
        Value::Dict(dict) => dict.borrow().len(),
        other => {
            return Err(RuntimeErrorKind::TypeError(format!(
                "object of type {} has no len()",
                other.type_str()
            )))
        }
    };

    Ok(Value::Int(len as i64))
}

pub fn to_int(value: &Value) -> Result<Value, RuntimeErrorKind> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(f) => Err(RuntimeErrorKind::ValueError(format!(
            "cannot convert float {} to integer",
            Value::Float(*f)
        ))),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeErrorKind::ValueError(format!("invalid literal for int(): {}", value.repr()))
        }),
        other => Err(RuntimeErrorKind::TypeError(format!(
            "int() argument must be a string or a number, not {}",
            other.type_str()
        ))),
    }
}

pub fn to_float(value: &Value) -> Result<Value, RuntimeErrorKind> {
    if let Some(n) = value.as_number() {
        return Ok(Value::Float(n.as_f64()));
    }

    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeErrorKind::ValueError(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => Err(RuntimeErrorKind::TypeError(format!(
            "float() argument must be a string or a number, not {}",
            other.type_str()
        ))),
    }
}

fn resolve_index(key: &Value, len: usize) -> Result<usize, RuntimeErrorKind> {
    let index = match key {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        other => {
            return Err(RuntimeErrorKind::TypeError(format!(
                "indices must be integers, not {}",
                other.type_str()
            )))
        }
    };

    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(RuntimeErrorKind::IndexOutOfRange { index, len });
    }

    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(items: &[i64]) -> Value {
        Value::new_list(items.iter().map(|i| Value::Int(*i)).collect())
    }

    #[test]
    fn arithmetic_follows_python() {
        let cases = [
            (BinaryOp::Divide, Value::Int(7), Value::Int(2), Value::Float(3.5)),
            (BinaryOp::Modulo, Value::Int(-7), Value::Int(3), Value::Int(2)),
            (BinaryOp::Plus, Value::Int(i64::MAX), Value::Int(1), Value::Float(i64::MAX as f64 + 1.0)),
            (BinaryOp::Minus, Value::Bool(true), Value::Int(3), Value::Int(-2)),
            (BinaryOp::Multiply, Value::Float(1.5), Value::Int(2), Value::Float(3.0)),
        ];

        for (op, lhs, rhs, expected) in cases {
            assert_eq!(binary(op, &lhs, &rhs).unwrap(), expected, "{lhs} {op} {rhs}");
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        for op in [BinaryOp::Divide, BinaryOp::Modulo] {
            assert_eq!(
                binary(op, &Value::Int(1), &Value::Int(0)),
                Err(RuntimeErrorKind::DivisionByZero)
            );
            assert_eq!(
                binary(op, &Value::Float(1.0), &Value::Float(0.0)),
                Err(RuntimeErrorKind::DivisionByZero)
            );
        }
    }

    #[test]
    fn string_and_list_operators() {
        assert_eq!(
            binary(BinaryOp::Plus, &Value::str("ab"), &Value::str("cd")).unwrap(),
            Value::str("abcd")
        );
        assert_eq!(
            binary(BinaryOp::Multiply, &Value::Int(3), &Value::str("ab")).unwrap(),
            Value::str("ababab")
        );
        assert_eq!(
            binary(BinaryOp::Multiply, &Value::str("ab"), &Value::Int(-1)).unwrap(),
            Value::str("")
        );
        assert_eq!(
            binary(BinaryOp::Plus, &ints(&[1]), &ints(&[2, 3])).unwrap(),
            ints(&[1, 2, 3])
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::str("abc"), &Value::str("abd")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Gte, &ints(&[1, 2]), &ints(&[1])).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn mismatched_operands() {
        assert_eq!(
            binary(BinaryOp::Minus, &Value::str("a"), &Value::Int(1)),
            Err(RuntimeErrorKind::TypeError(
                "unsupported operand types for `-`: str and int".to_string()
            ))
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::str("a"), &Value::Int(1)),
            Err(RuntimeErrorKind::TypeError("`<` not supported between str and int".to_string()))
        );
        assert_eq!(
            binary(BinaryOp::Equal, &Value::str("a"), &Value::Int(1)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn oversized_sequences_are_refused() {
        assert_eq!(
            binary(BinaryOp::Multiply, &Value::str("ab"), &Value::Int(9_999_999_999_999_999)),
            Err(RuntimeErrorKind::SequenceTooLong)
        );
        assert_eq!(
            binary(BinaryOp::Multiply, &Value::Int(i64::MAX), &ints(&[1, 2, 3])),
            Err(RuntimeErrorKind::SequenceTooLong)
        );

        let limit = MAX_SEQUENCE_LEN as i64;
        assert_eq!(
            binary(BinaryOp::Multiply, &Value::str("a"), &Value::Int(limit + 1)),
            Err(RuntimeErrorKind::SequenceTooLong)
        );
        assert_eq!(
            binary(BinaryOp::Multiply, &ints(&[]), &Value::Int(i64::MAX)).unwrap(),
            ints(&[])
        );
    }

    #[test]
    fn ordering_self_containing_lists() {
        let cyclic = |tail: i64| {
            let list = ints(&[]);
            if let Value::List(items) = &list {
                items.borrow_mut().push(list.clone());
                items.borrow_mut().push(Value::Int(tail));
            }
            list
        };
        let (a, b) = (cyclic(1), cyclic(2));

        assert_eq!(
            binary(BinaryOp::Lt, &a, &b),
            Err(RuntimeErrorKind::CyclicComparison)
        );
        assert_eq!(binary(BinaryOp::Equal, &a, &b).unwrap(), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Lte, &a, &a).unwrap(), Value::Bool(true));
    }

    #[test]
    fn nan_compares_false() {
        let nan = Value::Float(f64::NAN);
        for op in [BinaryOp::Lt, BinaryOp::Gt, BinaryOp::Lte, BinaryOp::Gte] {
            assert_eq!(binary(op, &nan, &Value::Int(1)).unwrap(), Value::Bool(false));
        }
    }

    #[test]
    fn indexing() {
        let list = ints(&[10, 20, 30]);

        assert_eq!(get_item(&list, &Value::Int(-1)).unwrap(), Value::Int(30));
        assert_eq!(
            get_item(&list, &Value::Int(3)),
            Err(RuntimeErrorKind::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(get_item(&Value::str("hey"), &Value::Int(1)).unwrap(), Value::str("e"));
        assert!(matches!(
            get_item(&Value::Int(1), &Value::Int(0)),
            Err(RuntimeErrorKind::TypeError(_))
        ));

        set_item(&list, Value::Int(0), Value::str("x")).unwrap();
        assert_eq!(list.to_string(), "['x', 20, 30]");
    }

    #[test]
    fn dict_items() {
        let dict = Value::new_dict();
        set_item(&dict, Value::str("a"), Value::Int(1)).unwrap();
        set_item(&dict, Value::str("b"), Value::Int(2)).unwrap();
        set_item(&dict, Value::str("a"), Value::Int(3)).unwrap();

        assert_eq!(dict.to_string(), "{'a': 3, 'b': 2}");
        assert_eq!(get_item(&dict, &Value::str("b")).unwrap(), Value::Int(2));
        assert_eq!(
            get_item(&dict, &Value::str("c")),
            Err(RuntimeErrorKind::KeyNotFound("'c'".to_string()))
        );
        assert!(set_item(&dict, ints(&[]), Value::None).is_err());
    }

    #[test]
    fn append_and_remove() {
        let list = ints(&[1, 2, 1]);
        append(&list, Value::Int(4)).unwrap();
        remove(&list, &Value::Int(1)).unwrap();

        assert_eq!(list, ints(&[2, 1, 4]));
        assert!(matches!(
            remove(&list, &Value::Int(9)),
            Err(RuntimeErrorKind::ValueError(_))
        ));
        assert!(append(&Value::str("s"), Value::Int(1)).is_err());
    }

    #[test]
    fn conversions() {
        assert_eq!(to_int(&Value::str(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(to_int(&Value::Float(-2.9)).unwrap(), Value::Int(-2));
        assert!(to_int(&Value::str("4.2")).is_err());
        assert_eq!(to_float(&Value::str("2.5")).unwrap(), Value::Float(2.5));
        assert_eq!(to_float(&Value::Int(2)).unwrap().to_string(), "2.0");
        assert_eq!(len(&Value::str("héllo")).unwrap(), Value::Int(5));
        assert!(len(&Value::Int(3)).is_err());
    }
}
