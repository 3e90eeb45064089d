#![forbid(unsafe_code)]

//! Editable fields.
//!
//! A [`Field`] describes one input: declared type, default, numeric policy
//! and flags. Adding it to a [`FieldRegistry`](crate::FieldRegistry) binds it
//! to the session and yields a [`FieldHandle`], through which all edits flow.
//!
//! # Commit pipeline
//!
//! ```text
//! populate(input)
//!   │ normalize: Null -> default, coerce raw, classify expression
//!   │ value-only check, numeric clamp
//!   ├── same display text ───────────────► Unchanged
//!   ├── coercion/shape error ────────────► Rejected (value kept)
//!   ▼
//!   swap value ─► notify (unless populating) ─► record undo ─► mark dirty
//! ```
//!
//! Undo and redo bypass the pipeline: they write the stored value directly,
//! always notify, and never record or mark dirty.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::NaiveDateTime;
use styleform_core::{
    Colour, ColourMap, DataType, Expr, FeatureTypeConstraint, FieldError, FieldIdentity,
    FieldInput, Font, NumericConfig, Result, Scalar, ValueKind, ValueModel,
};
use tracing::{debug, trace, warn};

use crate::context::UndoContext;
use crate::dirty::DirtyTracker;
use crate::notify::{ChangeNotifier, DataChangedListener, Subscription};
use crate::registry::RegistryInner;
use crate::undo::UndoEntry;

/// Outcome of a populate call.
#[derive(Debug, Clone, PartialEq)]
pub enum Populated {
    /// The value changed; listeners, history and dirty flag were updated.
    Changed,
    /// The input rendered the same as the current value.
    Unchanged,
    /// The input could not be accepted; the previous value is kept.
    Rejected(FieldError),
}

impl Populated {
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Field definition and state.
#[derive(Debug, Clone)]
pub struct Field {
    identity: FieldIdentity,
    data_type: DataType,
    current: ValueModel,
    default_value: Scalar,
    value_only: bool,
    enabled: bool,
    visible: bool,
    suppress_undo: bool,
    optional: bool,
    option_selected: bool,
    numeric: Option<NumericConfig>,
    attribute_selection: Option<String>,
}

impl Field {
    /// A field of `data_type` whose default is the type's zero value.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        let default_value = data_type.zero_value();
        Self {
            identity: FieldIdentity::UNKNOWN,
            data_type,
            current: ValueModel::Constant(default_value.clone()),
            default_value,
            value_only: false,
            enabled: true,
            visible: true,
            suppress_undo: false,
            optional: false,
            option_selected: true,
            numeric: None,
            attribute_selection: None,
        }
    }

    /// Set the default and reset the current value to it.
    ///
    /// A default that does not coerce to the declared type is ignored.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Scalar>) -> Self {
        match self.data_type.coerce(default.into()) {
            Ok(value) => {
                self.default_value = self.clamp_scalar(value);
                self.current = ValueModel::Constant(self.default_value.clone());
            }
            Err(err) => warn!(error = %err, "ignoring field default"),
        }
        self
    }

    /// Only literal values are accepted.
    #[must_use]
    pub fn value_only(mut self) -> Self {
        self.value_only = true;
        self
    }

    /// Changes to this field are never recorded for undo.
    #[must_use]
    pub fn suppress_undo(mut self) -> Self {
        self.suppress_undo = true;
        self
    }

    /// The field has an enabling checkbox, initially unchecked.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.option_selected = false;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: NumericConfig) -> Self {
        self.numeric = Some(config);
        self.default_value = self.clamp_scalar(self.default_value.clone());
        self.current = self.clamp(self.current.clone());
        self
    }

    #[must_use]
    pub fn identity(&self) -> FieldIdentity {
        self.identity
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub fn value(&self) -> &ValueModel {
        &self.current
    }

    #[must_use]
    pub fn default_value(&self) -> &Scalar {
        &self.default_value
    }

    fn normalize(&self, input: FieldInput) -> Result<ValueModel> {
        let model = match input {
            FieldInput::Null => ValueModel::Constant(self.default_value.clone()),
            FieldInput::Raw(raw) => {
                ValueModel::from_raw(self.data_type, Some(raw), &self.default_value)?
            }
            FieldInput::Expr(expr) => match ValueModel::from_model_expression(&expr) {
                Some(model) => model.conform(self.data_type)?,
                None => ValueModel::Constant(self.default_value.clone()),
            },
            FieldInput::Model(model) => model.conform(self.data_type)?,
        };
        if self.value_only && !model.is_constant() {
            return Err(FieldError::NotAConstant {
                field: self.identity,
                kind: model.kind(),
            });
        }
        Ok(self.clamp(model))
    }

    fn clamp(&self, model: ValueModel) -> ValueModel {
        match model {
            ValueModel::Constant(scalar) => ValueModel::Constant(self.clamp_scalar(scalar)),
            other => other,
        }
    }

    fn clamp_scalar(&self, scalar: Scalar) -> Scalar {
        match &self.numeric {
            Some(config) if self.data_type.is_numeric() => config.apply(scalar),
            _ => scalar,
        }
    }
}

struct FieldCell {
    state: RefCell<Field>,
    notifier: ChangeNotifier,
    context: UndoContext,
    dirty: DirtyTracker,
    registry: Weak<RegistryInner>,
}

/// A field bound into a session.
///
/// Cloning yields another handle to the same field.
#[derive(Clone)]
pub struct FieldHandle {
    cell: Rc<FieldCell>,
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.state.borrow();
        f.debug_struct("FieldHandle")
            .field("identity", &state.identity)
            .field("data_type", &state.data_type)
            .field("value", &state.current)
            .field("listeners", &self.cell.notifier.listener_count())
            .finish()
    }
}

macro_rules! typed_getter {
    ($(#[$meta:meta])* $name:ident, $data_type:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $name(&self) -> Result<$ty> {
            match self.typed_as(DataType::$data_type)? {
                Scalar::$variant(value) => Ok(value),
                other => Err(FieldError::mismatch(
                    self.identity(),
                    DataType::$data_type,
                    other.data_type(),
                )),
            }
        }
    };
}

impl FieldHandle {
    pub(crate) fn bind(
        mut field: Field,
        identity: FieldIdentity,
        context: UndoContext,
        dirty: DirtyTracker,
        registry: Weak<RegistryInner>,
    ) -> Self {
        field.identity = identity;
        Self {
            cell: Rc::new(FieldCell {
                state: RefCell::new(field),
                notifier: ChangeNotifier::new(),
                context,
                dirty,
                registry,
            }),
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Offer a new value.
    ///
    /// `None`/[`FieldInput::Null`] and [`Expr::Nil`] revert to the default.
    /// Raw values are coerced to the declared type and numeric values are
    /// clamped to the installed [`NumericConfig`].
    pub fn populate(&self, input: impl Into<FieldInput>) -> Populated {
        let input = input.into();
        let (identity, before, after, suppress_undo) = {
            let mut state = self.cell.state.borrow_mut();
            let next = match state.normalize(input) {
                Ok(next) => next,
                Err(err) => {
                    warn!(
                        field = %state.identity,
                        error = %err,
                        "rejected field input; keeping last good value"
                    );
                    return Populated::Rejected(err);
                }
            };
            if next.same_display(&state.current) {
                trace!(field = %state.identity, "populate left value unchanged");
                return Populated::Unchanged;
            }
            let before = std::mem::replace(&mut state.current, next);
            (
                state.identity,
                before,
                state.current.clone(),
                state.suppress_undo,
            )
        };

        debug!(field = %identity, before = %before, after = %after, "field value committed");
        self.cell
            .notifier
            .fire_data_changed(identity, &self.cell.context);
        let entry = UndoEntry::new(identity, before, after).bound_to(self.cell.registry.clone());
        self.cell.context.record(entry, suppress_undo);
        self.cell.dirty.mark();
        Populated::Changed
    }

    /// Populate with the default value.
    pub fn revert_to_default_value(&self) -> Populated {
        self.populate(FieldInput::Null)
    }

    /// Replace the default. Does not change the current value.
    pub fn set_default_value(&self, default: impl Into<Scalar>) -> Result<()> {
        let mut state = self.cell.state.borrow_mut();
        let value = state.data_type.coerce(default.into())?;
        state.default_value = state.clamp_scalar(value);
        Ok(())
    }

    #[must_use]
    pub fn default_value(&self) -> Scalar {
        self.cell.state.borrow().default_value.clone()
    }

    /// Install a numeric policy. Future commits are clamped; the current
    /// value is left as is.
    pub fn set_config(&self, config: NumericConfig) {
        let mut state = self.cell.state.borrow_mut();
        state.numeric = Some(config);
        state.default_value = state.clamp_scalar(state.default_value.clone());
    }

    #[must_use]
    pub fn numeric_config(&self) -> Option<NumericConfig> {
        self.cell.state.borrow().numeric
    }

    /// Restore the value held before `entry` was committed.
    ///
    /// Returns `false` for `None` or an entry aimed at another field.
    pub fn undo_action(&self, entry: Option<&UndoEntry>) -> bool {
        self.restore(entry, UndoEntry::before, "undo")
    }

    /// Restore the value committed by `entry`.
    pub fn redo_action(&self, entry: Option<&UndoEntry>) -> bool {
        self.restore(entry, UndoEntry::after, "redo")
    }

    fn restore(
        &self,
        entry: Option<&UndoEntry>,
        pick: fn(&UndoEntry) -> &ValueModel,
        direction: &'static str,
    ) -> bool {
        let Some(entry) = entry else {
            return false;
        };
        let identity = {
            let mut state = self.cell.state.borrow_mut();
            if entry.target() != state.identity {
                debug!(
                    field = %state.identity,
                    target = %entry.target(),
                    direction,
                    "undo entry belongs to another field"
                );
                return false;
            }
            state.current = pick(entry).clone();
            state.identity
        };
        self.cell.notifier.fire(identity);
        true
    }

    // ========================================================================
    // Attribute selection
    // ========================================================================

    /// Record which attribute the editor has picked.
    ///
    /// `None` clears the selection and re-enables direct editing. This never
    /// changes the committed value.
    pub fn attribute_selection(&self, attribute: Option<&str>) {
        let mut state = self.cell.state.borrow_mut();
        state.attribute_selection = attribute.map(str::to_owned);
        trace!(
            field = %state.identity,
            attribute = attribute.unwrap_or(""),
            "attribute selection changed"
        );
    }

    #[must_use]
    pub fn selected_attribute(&self) -> Option<String> {
        self.cell.state.borrow().attribute_selection.clone()
    }

    /// Whether the literal editor is usable (no attribute picked).
    #[must_use]
    pub fn is_direct_edit_enabled(&self) -> bool {
        self.cell.state.borrow().attribute_selection.is_none()
    }

    // ========================================================================
    // Flags
    // ========================================================================

    pub fn set_enabled(&self, enabled: bool) {
        self.cell.state.borrow_mut().enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cell.state.borrow().enabled
    }

    pub fn set_visible(&self, visible: bool) {
        self.cell.state.borrow_mut().visible = visible;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.cell.state.borrow().visible
    }

    /// Tick or untick the enabling checkbox of an optional field.
    pub fn set_option_selected(&self, selected: bool) {
        self.cell.state.borrow_mut().option_selected = selected;
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.cell.state.borrow().optional
    }

    /// Optional fields only contribute a value while their checkbox is ticked.
    #[must_use]
    pub fn is_value_readable(&self) -> bool {
        let state = self.cell.state.borrow();
        !state.optional || state.option_selected
    }

    #[must_use]
    pub fn is_value_only(&self) -> bool {
        self.cell.state.borrow().value_only
    }

    #[must_use]
    pub fn is_suppress_undo(&self) -> bool {
        self.cell.state.borrow().suppress_undo
    }

    // ========================================================================
    // Reading
    // ========================================================================

    #[must_use]
    pub fn identity(&self) -> FieldIdentity {
        self.cell.state.borrow().identity
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.cell.state.borrow().data_type
    }

    #[must_use]
    pub fn value(&self) -> ValueModel {
        self.cell.state.borrow().current.clone()
    }

    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.cell.state.borrow().current.kind()
    }

    #[must_use]
    pub fn display_string(&self) -> String {
        self.cell.state.borrow().current.display_string()
    }

    /// The value as the style document should receive it, or `None` when
    /// an optional field is unticked.
    #[must_use]
    pub fn expression(&self) -> Option<Expr> {
        let state = self.cell.state.borrow();
        if state.optional && !state.option_selected {
            return None;
        }
        Some(state.current.to_emitted_expression(state.data_type))
    }

    /// Text form of the value. Value-only fields must hold a literal.
    pub fn string_value(&self) -> Result<String> {
        let state = self.cell.state.borrow();
        if state.value_only && !state.current.is_constant() {
            return Err(FieldError::mismatch(
                state.identity,
                ValueKind::Constant,
                state.current.kind(),
            ));
        }
        Ok(state.current.display_string())
    }

    /// The literal the field holds. Non-literal values are a type mismatch.
    pub fn typed_value(&self) -> Result<Scalar> {
        let state = self.cell.state.borrow();
        match &state.current {
            ValueModel::Constant(scalar) => Ok(scalar.clone()),
            other => Err(FieldError::mismatch(
                state.identity,
                ValueKind::Constant,
                other.kind(),
            )),
        }
    }

    fn typed_as(&self, expected: DataType) -> Result<Scalar> {
        let declared = self.data_type();
        if declared != expected {
            return Err(FieldError::mismatch(self.identity(), expected, declared));
        }
        self.typed_value()
    }

    typed_getter!(bool_value, Boolean, Boolean, bool);
    typed_getter!(int_value, Integer, Integer, i64);
    typed_getter!(double_value, Double, Double, f64);
    typed_getter!(colour_value, Colour, Colour, Colour);
    typed_getter!(font_value, Font, Font, Font);
    typed_getter!(colour_map_value, ColourMap, ColourMap, ColourMap);
    typed_getter!(date_value, Date, Date, NaiveDateTime);
    typed_getter!(
        /// Feature type constraints held by the field.
        feature_type_constraints,
        FeatureTypeConstraint,
        FeatureTypeConstraints,
        Vec<FeatureTypeConstraint>
    );
    typed_getter!(
        /// Selected option of a combo-box style field.
        enum_value,
        Enum,
        Enum,
        String
    );

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_listener(&self, listener: Rc<dyn DataChangedListener>) -> bool {
        self.cell.notifier.add_listener(listener)
    }

    pub fn remove_listener(&self, listener: &Rc<dyn DataChangedListener>) -> bool {
        self.cell.notifier.remove_listener(listener)
    }

    pub fn subscribe(&self, callback: impl Fn(FieldIdentity) + 'static) -> Subscription {
        self.cell.notifier.subscribe(callback)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.cell.notifier.listener_count()
    }

    #[must_use]
    pub fn context(&self) -> &UndoContext {
        &self.cell.context
    }
}
