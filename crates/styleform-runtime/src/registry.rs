#![forbid(unsafe_code)]

//! Per-panel field registry.
//!
//! A [`FieldRegistry`] maps [`FieldIdentity`] to bound fields for one
//! editing panel. Populate helpers are permissive: an identity the panel
//! does not have is skipped silently, so one "populate this symbolizer" call
//! site can serve panels that only carry a subset of the fields. Readers
//! likewise return the type's zero value for unknown identities.
//!
//! Undo entries hold a weak link to the registry that produced them. Once
//! the registry is dropped its entries become stale.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use styleform_core::{
    Colour, ColourMap, DataType, Expr, FeatureTypeConstraint, FieldIdentity, FieldInput, Font,
    Result,
};
use tracing::{debug, trace};

use crate::context::UndoContext;
use crate::dirty::DirtyTracker;
use crate::field::{Field, FieldHandle, Populated};

struct Slot {
    seq: u64,
    handle: FieldHandle,
}

pub(crate) struct RegistryInner {
    fields: RefCell<BTreeMap<FieldIdentity, Slot>>,
    next_seq: Cell<u64>,
    context: UndoContext,
    dirty: DirtyTracker,
}

impl RegistryInner {
    pub(crate) fn field(&self, identity: FieldIdentity) -> Option<FieldHandle> {
        self.fields
            .borrow()
            .get(&identity)
            .map(|slot| slot.handle.clone())
    }
}

/// Fields of one editing panel.
pub struct FieldRegistry {
    inner: Rc<RegistryInner>,
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("fields", &self.identities())
            .field("tree_data_updated", &self.is_tree_data_updated())
            .finish()
    }
}

impl FieldRegistry {
    #[must_use]
    pub fn new(context: &UndoContext) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                fields: RefCell::new(BTreeMap::new()),
                next_seq: Cell::new(0),
                context: context.clone(),
                dirty: DirtyTracker::new(),
            }),
        }
    }

    #[must_use]
    pub fn context(&self) -> &UndoContext {
        &self.inner.context
    }

    /// Register `field` under `identity`, replacing any field already there.
    pub fn add(&self, identity: impl Into<FieldIdentity>, field: Field) -> FieldHandle {
        let identity = identity.into();
        let handle = FieldHandle::bind(
            field,
            identity,
            self.inner.context.clone(),
            self.inner.dirty.clone(),
            Rc::downgrade(&self.inner),
        );
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);

        let previous = self.inner.fields.borrow_mut().insert(
            identity,
            Slot {
                seq,
                handle: handle.clone(),
            },
        );
        if previous.is_some() {
            debug!(field = %identity, "replaced registered field");
        }
        handle
    }

    #[must_use]
    pub fn get(&self, identity: impl Into<FieldIdentity>) -> Option<FieldHandle> {
        self.inner.field(identity.into())
    }

    #[must_use]
    pub fn contains(&self, identity: impl Into<FieldIdentity>) -> bool {
        self.inner.fields.borrow().contains_key(&identity.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.fields.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.fields.borrow().is_empty()
    }

    /// Registered identities, in identity order.
    #[must_use]
    pub fn identities(&self) -> Vec<FieldIdentity> {
        self.inner.fields.borrow().keys().copied().collect()
    }

    /// Fields declared as `data_type`, in the order they were added.
    #[must_use]
    pub fn fields_of_type(&self, data_type: DataType) -> Vec<FieldHandle> {
        let fields = self.inner.fields.borrow();
        let mut matching: Vec<&Slot> = fields
            .values()
            .filter(|slot| slot.handle.data_type() == data_type)
            .collect();
        matching.sort_by_key(|slot| slot.seq);
        matching.into_iter().map(|slot| slot.handle.clone()).collect()
    }

    // ========================================================================
    // Populate
    // ========================================================================

    /// Populate the field at `identity`. `None` if this panel has no such
    /// field.
    pub fn populate(
        &self,
        identity: impl Into<FieldIdentity>,
        input: impl Into<FieldInput>,
    ) -> Option<Populated> {
        let identity = identity.into();
        match self.inner.field(identity) {
            Some(field) => Some(field.populate(input)),
            None => {
                trace!(field = %identity, "populate skipped; field not on this panel");
                None
            }
        }
    }

    pub fn populate_boolean_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<bool>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_integer_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<i64>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_double_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<f64>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_text_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<&str>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    /// Select an option of a combo-box style field.
    pub fn populate_combo_box_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<&str>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    /// Accepts a [`Colour`], a `#RRGGBB` string or an expression.
    pub fn populate_colour_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: impl Into<FieldInput>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_font_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<Font>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_colour_map_field(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<ColourMap>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    pub fn populate_field_type_constraint(
        &self,
        identity: impl Into<FieldIdentity>,
        value: Option<Vec<FeatureTypeConstraint>>,
    ) -> Option<Populated> {
        self.populate(identity, value)
    }

    /// Populate from a document expression; `None` or [`Expr::Nil`] reverts
    /// to the default.
    pub fn populate_field(
        &self,
        identity: impl Into<FieldIdentity>,
        expression: Option<Expr>,
    ) -> Option<Populated> {
        self.populate(identity, expression)
    }

    // ========================================================================
    // Readers
    // ========================================================================

    fn read<T>(
        &self,
        identity: impl Into<FieldIdentity>,
        zero: impl FnOnce() -> T,
        read: impl FnOnce(&FieldHandle) -> Result<T>,
    ) -> Result<T> {
        match self.inner.field(identity.into()) {
            Some(field) => read(&field),
            None => Ok(zero()),
        }
    }

    /// `false` for an unknown identity.
    pub fn get_boolean(&self, identity: impl Into<FieldIdentity>) -> Result<bool> {
        self.read(identity, || false, FieldHandle::bool_value)
    }

    pub fn get_integer(&self, identity: impl Into<FieldIdentity>) -> Result<i64> {
        self.read(identity, || 0, FieldHandle::int_value)
    }

    pub fn get_double(&self, identity: impl Into<FieldIdentity>) -> Result<f64> {
        self.read(identity, || 0.0, FieldHandle::double_value)
    }

    pub fn get_text(&self, identity: impl Into<FieldIdentity>) -> Result<String> {
        self.read(identity, String::new, FieldHandle::string_value)
    }

    pub fn get_colour(&self, identity: impl Into<FieldIdentity>) -> Result<Colour> {
        self.read(identity, || Colour::BLACK, FieldHandle::colour_value)
    }

    pub fn get_font(&self, identity: impl Into<FieldIdentity>) -> Result<Font> {
        self.read(identity, Font::default, FieldHandle::font_value)
    }

    pub fn get_colour_map(&self, identity: impl Into<FieldIdentity>) -> Result<ColourMap> {
        self.read(identity, ColourMap::default, FieldHandle::colour_map_value)
    }

    pub fn get_feature_type_constraints(
        &self,
        identity: impl Into<FieldIdentity>,
    ) -> Result<Vec<FeatureTypeConstraint>> {
        self.read(identity, Vec::new, FieldHandle::feature_type_constraints)
    }

    /// The emitted expression, or `None` for an unknown or unticked field.
    #[must_use]
    pub fn get_expression(&self, identity: impl Into<FieldIdentity>) -> Option<Expr> {
        self.inner
            .field(identity.into())
            .and_then(|field| field.expression())
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    #[must_use]
    pub fn is_tree_data_updated(&self) -> bool {
        self.inner.dirty.is_tree_data_updated()
    }

    pub fn reset_tree_data_updated(&self) {
        self.inner.dirty.reset();
    }

    #[must_use]
    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.inner.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use styleform_core::{FieldKind, Scalar};

    fn registry() -> (UndoContext, FieldRegistry) {
        let ctx = UndoContext::new();
        let registry = FieldRegistry::new(&ctx);
        (ctx, registry)
    }

    #[test]
    fn unknown_identity_is_silent() {
        let (ctx, registry) = registry();
        assert_eq!(registry.get_boolean(FieldKind::DefaultStyle), Ok(false));
        assert_eq!(registry.get_integer(FieldKind::Size), Ok(0));
        assert_eq!(registry.get_text(FieldKind::Name), Ok(String::new()));
        assert_eq!(registry.get_expression(FieldKind::Name), None);
        assert_eq!(registry.populate_boolean_field(FieldKind::DefaultStyle, Some(true)), None);
        assert_eq!(ctx.undo_list_size(), 0);
        assert!(!registry.is_tree_data_updated());
    }

    #[test]
    fn add_replaces_existing_identity() {
        let (_, registry) = registry();
        registry.add(FieldKind::Name, Field::new(DataType::String));
        registry.add(FieldKind::Name, Field::new(DataType::Integer));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(FieldKind::Name).map(|f| f.data_type()),
            Some(DataType::Integer)
        );
    }

    #[test]
    fn bound_field_takes_registry_identity() {
        let (_, registry) = registry();
        let id = FieldIdentity::indexed(FieldKind::Size, 2);
        let handle = registry.add(id, Field::new(DataType::Double));
        assert_eq!(handle.identity(), id);
        assert!(registry.contains(id));
        assert!(!registry.contains(FieldKind::Size));
    }

    #[test]
    fn fields_of_type_keep_insertion_order() {
        let (_, registry) = registry();
        registry.add(FieldKind::StrokeColour, Field::new(DataType::Colour));
        registry.add(FieldKind::Size, Field::new(DataType::Double));
        registry.add(FieldKind::FillColour, Field::new(DataType::Colour));

        let colours: Vec<_> = registry
            .fields_of_type(DataType::Colour)
            .iter()
            .map(FieldHandle::identity)
            .collect();
        assert_eq!(
            colours,
            vec![
                FieldIdentity::new(FieldKind::StrokeColour),
                FieldIdentity::new(FieldKind::FillColour),
            ]
        );
    }

    #[test]
    fn typed_populate_and_read_back() {
        let (_, registry) = registry();
        registry.add(FieldKind::FillColour, Field::new(DataType::Colour));
        registry.add(FieldKind::Size, Field::new(DataType::Integer));
        registry.add(FieldKind::WellKnownName, Field::new(DataType::Enum));

        registry.populate_colour_field(FieldKind::FillColour, "#ff0000");
        registry.populate_integer_field(FieldKind::Size, Some(12));
        registry.populate_combo_box_field(FieldKind::WellKnownName, Some("circle"));

        assert_eq!(registry.get_colour(FieldKind::FillColour), Ok(Colour::rgb(255, 0, 0)));
        assert_eq!(registry.get_integer(FieldKind::Size), Ok(12));
        assert_eq!(
            registry.get_text(FieldKind::WellKnownName),
            Ok("circle".to_string())
        );
        assert!(registry.is_tree_data_updated());
        registry.reset_tree_data_updated();
        assert!(!registry.is_tree_data_updated());
    }

    #[test]
    fn wrong_type_read_is_an_error() {
        let (_, registry) = registry();
        registry.add(FieldKind::Size, Field::new(DataType::Double));
        assert!(registry.get_boolean(FieldKind::Size).is_err());
    }

    #[test]
    fn populate_field_with_nil_reverts() {
        let (_, registry) = registry();
        registry.add(
            FieldKind::Opacity,
            Field::new(DataType::Double).with_default(1.0),
        );
        registry.populate_double_field(FieldKind::Opacity, Some(0.25));
        registry.populate_field(FieldKind::Opacity, Some(Expr::Nil));
        assert_eq!(
            registry.get(FieldKind::Opacity).map(|f| f.value()),
            Some(styleform_core::ValueModel::Constant(Scalar::Double(1.0)))
        );
    }
}
