#![forbid(unsafe_code)]

//! Style-document expressions.
//!
//! [`Expr`] is the shape in which values arrive from, and return to, the
//! style document: literals, attribute references, function invocations and
//! arithmetic. Its [`Display`](fmt::Display) form is the canonical text used
//! for change detection, so two trees that print the same are the same
//! value as far as fields are concerned.
//!
//! ```text
//! Literal(4)                         4
//! Literal("road")                    'road'
//! Attribute("width")                 width
//! Function("strConcat", [a, 'x'])    strConcat(a, 'x')
//! Binary(Mul, width, 2)              (width * 2)
//! ```

use std::fmt;

use crate::scalar::Scalar;

/// Arithmetic operator of a binary expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

/// An expression as the style document sees it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Explicit absence of a value.
    Nil,
    Literal(Scalar),
    Attribute(String),
    Function { name: String, args: Vec<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    #[must_use]
    pub fn literal(value: impl Into<Scalar>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Function {
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => Ok(()),
            Self::Literal(value) if value.is_bare() => write!(f, "{value}"),
            Self::Literal(value) => write!(f, "'{}'", value.to_string().replace('\'', "''")),
            Self::Attribute(name) => f.write_str(name),
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_quote_text_but_not_numbers() {
        assert_eq!(Expr::literal(4).to_string(), "4");
        assert_eq!(Expr::literal(2.5).to_string(), "2.5");
        assert_eq!(Expr::literal(true).to_string(), "true");
        assert_eq!(Expr::literal("road").to_string(), "'road'");
        assert_eq!(Expr::literal("it's").to_string(), "'it''s'");
    }

    #[test]
    fn nested_function_and_binary_render() {
        let expr = Expr::function(
            "strConcat",
            vec![
                Expr::attribute("name"),
                Expr::binary(BinaryOp::Multiply, Expr::attribute("width"), Expr::literal(2)),
            ],
        );
        assert_eq!(expr.to_string(), "strConcat(name, (width * 2))");
    }

    #[test]
    fn nil_renders_empty() {
        assert!(Expr::Nil.is_nil());
        assert_eq!(Expr::Nil.to_string(), "");
    }
}
