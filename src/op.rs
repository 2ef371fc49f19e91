use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Lte => "<=",
            BinaryOp::Gte => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Lte
                | BinaryOp::Gte
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A numeric literal as written in source or produced by constant folding.
#[derive(Copy, Clone, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ArithmeticError {
    DivisionByZero,
    NotArithmetic,
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn negate(self) -> Number {
        match self {
            Number::Int(i) => match i.checked_neg() {
                Some(n) => Number::Int(n),
                None => Number::Float(-(i as f64)),
            },
            Number::Float(f) => Number::Float(-f),
        }
    }

    /// Evaluates one of the arithmetic operators. The interpreter and the
    /// constant folder both go through here so folded code prints exactly what
    /// the unfolded code would have.
    pub fn arithmetic(op: BinaryOp, lhs: Number, rhs: Number) -> Result<Number, ArithmeticError> {
        match op {
            BinaryOp::Plus => Ok(int_or_float(lhs, rhs, i64::checked_add, |a, b| a + b)),
            BinaryOp::Minus => Ok(int_or_float(lhs, rhs, i64::checked_sub, |a, b| a - b)),
            BinaryOp::Multiply => Ok(int_or_float(lhs, rhs, i64::checked_mul, |a, b| a * b)),
            BinaryOp::Divide => {
                if rhs.is_zero() {
                    return Err(ArithmeticError::DivisionByZero);
                }

                Ok(Number::Float(lhs.as_f64() / rhs.as_f64()))
            }
            BinaryOp::Modulo => {
                if rhs.is_zero() {
                    return Err(ArithmeticError::DivisionByZero);
                }

                Ok(match (lhs, rhs) {
                    (Number::Int(a), Number::Int(b)) => {
                        let r = a.wrapping_rem(b);
                        if r != 0 && ((r < 0) != (b < 0)) {
                            Number::Int(r + b)
                        } else {
                            Number::Int(r)
                        }
                    }
                    (a, b) => {
                        let (a, b) = (a.as_f64(), b.as_f64());
                        let r = a % b;
                        if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                            Number::Float(r + b)
                        } else {
                            Number::Float(r)
                        }
                    }
                })
            }
            _ => Err(ArithmeticError::NotArithmetic),
        }
    }
}

fn int_or_float(
    lhs: Number,
    rhs: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Number {
    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => match int_op(a, b) {
            Some(n) => Number::Int(n),
            None => Number::Float(float_op(a as f64, b as f64)),
        },
        (a, b) => Number::Float(float_op(a.as_f64(), b.as_f64())),
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing `.0` on whole floats
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn floats_keep_their_point() {
        assert_eq!(Number::Float(3.0).to_string(), "3.0");
        assert_eq!(Number::Int(3).to_string(), "3");
    }

    #[test]
    fn true_division_is_float() {
        let n = Number::arithmetic(BinaryOp::Divide, Number::Int(7), Number::Int(2));

        assert_eq!(n, Ok(Number::Float(3.5)));
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        let pos = Number::arithmetic(BinaryOp::Modulo, Number::Int(-7), Number::Int(3));
        let neg = Number::arithmetic(BinaryOp::Modulo, Number::Int(7), Number::Int(-3));

        assert_eq!(pos, Ok(Number::Int(2)));
        assert_eq!(neg, Ok(Number::Int(-2)));
    }

    #[test]
    fn division_by_zero() {
        for op in [BinaryOp::Divide, BinaryOp::Modulo] {
            assert_eq!(
                Number::arithmetic(op, Number::Int(1), Number::Float(0.0)),
                Err(ArithmeticError::DivisionByZero)
            );
        }
    }

    #[test]
    fn overflow_promotes_to_float() {
        let n = Number::arithmetic(BinaryOp::Plus, Number::Int(i64::MAX), Number::Int(1));

        assert!(matches!(n, Ok(Number::Float(_))));
    }
}
