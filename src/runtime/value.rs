use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::op::Number;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
/// Insertion-ordered key/value pairs.
pub type DictRef = Rc<RefCell<Vec<(Value, Value)>>>;

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(ListRef),
    Dict(DictRef),
    None,
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn new_dict() -> Self {
        Value::Dict(Rc::new(RefCell::new(vec![])))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::None => "NoneType",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(list) => !list.borrow().is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::None => false,
        }
    }

    /// Numeric view used by arithmetic; booleans count as 0 and 1.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            _ => None,
        }
    }

    /// The `repr()` form, used for elements inside lists and dicts.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            other => other.to_string(),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut vec![])
    }
}

impl Value {
    /// Structural equality. A pair of containers already being compared
    /// further up is assumed equal, so cyclic values terminate.
    fn eq_guarded(&self, other: &Self, active: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (addr(a), addr(b));
                if active.contains(&pair) {
                    return true;
                }

                let (a, b) = (a.borrow(), b.borrow());
                active.push(pair);
                let equal = a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.eq_guarded(y, active));
                active.pop();

                equal
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (addr(a), addr(b));
                if active.contains(&pair) {
                    return true;
                }

                let (a, b) = (a.borrow(), b.borrow());
                active.push(pair);
                let equal = a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key.eq_guarded(other_key, active)
                                && value.eq_guarded(other_value, active)
                        })
                    });
                active.pop();

                equal
            }
            (lhs, rhs) => match (lhs.as_number(), rhs.as_number()) {
                (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
                (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
                _ => false,
            },
        }
    }

    /// Writes the value, quoting strings when `quoted`. Containers already
    /// on `active` render as `[...]` / `{...}`.
    fn write_to(
        &self,
        f: &mut fmt::Formatter<'_>,
        quoted: bool,
        active: &mut Vec<usize>,
    ) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) if quoted => f.write_str(&quote(s)),
            Value::Str(s) => f.write_str(s),
            Value::None => f.write_str("None"),
            Value::List(list) => {
                let id = addr(list);
                if active.contains(&id) {
                    return f.write_str("[...]");
                }

                active.push(id);
                f.write_str("[")?;
                for (i, item) in list.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_to(f, true, active)?;
                }
                active.pop();
                f.write_str("]")
            }
            Value::Dict(dict) => {
                let id = addr(dict);
                if active.contains(&id) {
                    return f.write_str("{...}");
                }

                active.push(id);
                f.write_str("{")?;
                for (i, (key, value)) in dict.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_to(f, true, active)?;
                    f.write_str(": ")?;
                    value.write_to(f, true, active)?;
                }
                active.pop();
                f.write_str("}")
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, false, &mut vec![])
    }
}

fn addr<T>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else {
        format!("{v:?}")
    }
}

fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prints_like_python() {
        let list = Value::new_list(vec![
            Value::Int(1),
            Value::Float(2.0),
            Value::str("a'b"),
            Value::Bool(true),
            Value::None,
        ]);

        assert_eq!(list.to_string(), r#"[1, 2.0, "a'b", True, None]"#);
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::str("plain").to_string(), "plain");
    }

    #[test]
    fn dict_keeps_insertion_order() {
        let dict = Value::new_dict();
        if let Value::Dict(pairs) = &dict {
            pairs.borrow_mut().push((Value::str("z"), Value::Int(1)));
            pairs.borrow_mut().push((Value::str("a"), Value::new_list(vec![])));
        }

        assert_eq!(dict.to_string(), "{'z': 1, 'a': []}");
    }

    #[test]
    fn numeric_equality_crosses_types() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Bool(true), Value::Int(1));
        assert!(Value::str("1") != Value::Int(1));
        assert!(Value::None != Value::Int(0));
    }

    #[test]
    fn self_containing_containers() {
        let list = Value::new_list(vec![Value::Int(1)]);
        if let Value::List(items) = &list {
            items.borrow_mut().push(list.clone());
        }
        let dict = Value::new_dict();
        if let Value::Dict(pairs) = &dict {
            pairs.borrow_mut().push((Value::str("me"), dict.clone()));
        }

        assert_eq!(list.to_string(), "[1, [...]]");
        assert_eq!(dict.to_string(), "{'me': {...}}");

        let other = Value::new_list(vec![Value::Int(1)]);
        if let Value::List(items) = &other {
            items.borrow_mut().push(other.clone());
        }
        assert!(list == other);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::new_list(vec![]).is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(!Value::None.is_truthy());
    }
}
