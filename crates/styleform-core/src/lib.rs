#![forbid(unsafe_code)]

//! Core: field identities, typed scalars, expressions and the value model.
//!
//! # Role in StyleForm
//! `styleform-core` holds the pure, immutable vocabulary of the field-binding
//! engine. It has no interior mutability and no session state; the stateful
//! pieces (fields, registries, undo history, notification) live in
//! `styleform-runtime` and build on these types.
//!
//! # Primary responsibilities
//! - **FieldIdentity**: `(kind, index)` keys for fields within a panel.
//! - **Scalar / DataType**: typed literals and the runtime type gate.
//! - **Expr**: the expression shape exchanged with the style document.
//! - **ValueModel**: constant / attribute / expression / function values,
//!   their conversions and their canonical display text.
//! - **NumericConfig**: clamping policy for numeric fields.

pub mod error;
pub mod expr;
pub mod identity;
pub mod numeric;
pub mod scalar;
pub mod value;

pub use error::{FieldError, Result};
pub use expr::{BinaryOp, Expr};
pub use identity::{FieldIdentity, FieldKind};
pub use numeric::NumericConfig;
pub use scalar::{
    Colour, ColourMap, ColourMapEntry, DataType, FeatureTypeConstraint, Font, FontStyle,
    FontWeight, ParseColourError, Scalar,
};
pub use value::{FieldInput, ValueKind, ValueModel};
