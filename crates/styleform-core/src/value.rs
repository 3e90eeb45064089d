#![forbid(unsafe_code)]

//! The value model: how a field's value is represented.
//!
//! A field holds exactly one [`ValueModel`] variant at a time:
//!
//! - [`ValueModel::Constant`]: a literal of the field's declared type
//! - [`ValueModel::AttributeRef`]: the value of a feature attribute
//! - [`ValueModel::Expression`]: a composed expression
//! - [`ValueModel::FunctionCall`]: a named function over sub-models
//!
//! # Invariants
//!
//! 1. Equality for change detection is on [`ValueModel::display_string`],
//!    not on structure. Two models that render the same text are the same
//!    value.
//! 2. A `Constant` that has gone through [`ValueModel::conform`] holds a
//!    scalar of the declared type.
//! 3. Switching variant drops the old payload; the declared type lives on
//!    the field, not in the model.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::expr::Expr;
use crate::scalar::{Colour, ColourMap, DataType, FeatureTypeConstraint, Font, Scalar};

/// Which variant a [`ValueModel`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Constant,
    Attribute,
    Expression,
    Function,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Attribute => "attribute",
            Self::Expression => "expression",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representation of a field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueModel {
    Constant(Scalar),
    AttributeRef(String),
    Expression(Expr),
    FunctionCall { name: String, args: Vec<ValueModel> },
}

impl ValueModel {
    /// Wrap a raw value as a constant of `data_type`.
    ///
    /// `None` yields `default` run through the same coercion: reverting to
    /// the default is how absent input is handled.
    pub fn from_raw(data_type: DataType, raw: Option<Scalar>, default: &Scalar) -> Result<Self> {
        let scalar = raw.unwrap_or_else(|| default.clone());
        data_type.coerce(scalar).map(Self::Constant)
    }

    /// Classify an incoming document expression.
    ///
    /// Returns `None` for [`Expr::Nil`]; callers treat that like absent input.
    /// Literals become constants (not yet coerced, see [`Self::conform`]),
    /// attribute names become references, functions convert recursively and
    /// anything else is kept as an opaque expression.
    #[must_use]
    pub fn from_model_expression(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Nil => None,
            other => Some(Self::from_argument(other)),
        }
    }

    fn from_argument(expr: &Expr) -> Self {
        match expr {
            Expr::Literal(value) => Self::Constant(value.clone()),
            Expr::Attribute(name) => Self::AttributeRef(name.clone()),
            Expr::Function { name, args } => Self::FunctionCall {
                name: name.clone(),
                args: args.iter().map(Self::from_argument).collect(),
            },
            Expr::Nil | Expr::Binary { .. } => Self::Expression(expr.clone()),
        }
    }

    /// Coerce a constant payload to `data_type`. Other variants are untyped
    /// and pass through.
    pub fn conform(self, data_type: DataType) -> Result<Self> {
        match self {
            Self::Constant(scalar) => data_type.coerce(scalar).map(Self::Constant),
            other => Ok(other),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Constant(_) => ValueKind::Constant,
            Self::AttributeRef(_) => ValueKind::Attribute,
            Self::Expression(_) => ValueKind::Expression,
            Self::FunctionCall { .. } => ValueKind::Function,
        }
    }

    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    #[must_use]
    pub const fn as_constant(&self) -> Option<&Scalar> {
        match self {
            Self::Constant(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Canonical text used for display and for change detection.
    #[must_use]
    pub fn display_string(&self) -> String {
        self.to_string()
    }

    /// Whether both models render the same [`Self::display_string`].
    #[must_use]
    pub fn same_display(&self, other: &Self) -> bool {
        self.display_string() == other.display_string()
    }

    /// Materialize the model as the expression the style document consumes.
    #[must_use]
    pub fn to_emitted_expression(&self, data_type: DataType) -> Expr {
        match self {
            Self::Constant(scalar) => Expr::Literal(
                data_type
                    .coerce(scalar.clone())
                    .unwrap_or_else(|_| scalar.clone()),
            ),
            other => other.to_expr(),
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Self::Constant(scalar) => Expr::Literal(scalar.clone()),
            Self::AttributeRef(name) => Expr::Attribute(name.clone()),
            Self::Expression(expr) => expr.clone(),
            Self::FunctionCall { name, args } => Expr::Function {
                name: name.clone(),
                args: args.iter().map(Self::to_expr).collect(),
            },
        }
    }

    /// Rough heap + inline footprint, for history budgeting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.display_string().len()
    }
}

impl fmt::Display for ValueModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(scalar) => write!(f, "{scalar}"),
            Self::AttributeRef(name) => f.write_str(name),
            Self::Expression(expr) => write!(f, "{expr}"),
            Self::FunctionCall { .. } => write!(f, "{}", self.to_expr()),
        }
    }
}

/// Anything a caller may hand to a field's populate entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// No value: the field reverts to its default.
    Null,
    /// A raw typed value, coerced to the declared type.
    Raw(Scalar),
    /// An expression from the style document.
    Expr(Expr),
    /// An already-built model, e.g. one read back from another field.
    Model(ValueModel),
}

impl From<Scalar> for FieldInput {
    fn from(v: Scalar) -> Self {
        Self::Raw(v)
    }
}

impl From<Expr> for FieldInput {
    fn from(v: Expr) -> Self {
        Self::Expr(v)
    }
}

impl From<ValueModel> for FieldInput {
    fn from(v: ValueModel) -> Self {
        Self::Model(v)
    }
}

impl<T: Into<FieldInput>> From<Option<T>> for FieldInput {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

macro_rules! raw_input_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldInput {
                fn from(v: $ty) -> Self {
                    Self::Raw(Scalar::from(v))
                }
            }
        )*
    };
}

raw_input_from!(
    bool,
    i32,
    i64,
    f64,
    &str,
    String,
    Colour,
    Font,
    ColourMap,
    NaiveDateTime,
    Vec<FeatureTypeConstraint>,
);
