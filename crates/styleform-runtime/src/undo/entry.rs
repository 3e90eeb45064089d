#![forbid(unsafe_code)]

//! The unit of undo: one field's before/after value.

use std::fmt;
use std::rc::{Rc, Weak};

use styleform_core::{FieldIdentity, ValueModel};

use crate::registry::RegistryInner;

/// Immutable record of a single committed field change.
///
/// The registry link is weak: an entry never keeps its panel alive. Once the
/// owning registry is dropped the entry is stale and replaying it is a no-op.
#[derive(Clone)]
pub struct UndoEntry {
    target: FieldIdentity,
    before: ValueModel,
    after: ValueModel,
    description: String,
    registry: Weak<RegistryInner>,
}

impl fmt::Debug for UndoEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoEntry")
            .field("target", &self.target)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("stale", &(self.registry.strong_count() == 0))
            .finish()
    }
}

impl UndoEntry {
    /// Create an entry not yet tied to any registry.
    #[must_use]
    pub fn new(target: FieldIdentity, before: ValueModel, after: ValueModel) -> Self {
        Self {
            target,
            before,
            after,
            description: format!("Change {target}"),
            registry: Weak::new(),
        }
    }

    pub(crate) fn bound_to(mut self, registry: Weak<RegistryInner>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn target(&self) -> FieldIdentity {
        self.target
    }

    #[must_use]
    pub fn before(&self) -> &ValueModel {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &ValueModel {
        &self.after
    }

    /// Menu label, e.g. `"Change stroke_width"`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the owning registry is gone.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.registry.strong_count() == 0
    }

    pub(crate) fn registry(&self) -> Option<Rc<RegistryInner>> {
        self.registry.upgrade()
    }

    /// Size in bytes for history budgeting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.description.len()
            + self.before.size_bytes()
            + self.after.size_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use styleform_core::{FieldKind, Scalar};

    #[test]
    fn detached_entry_is_stale() {
        let entry = UndoEntry::new(
            FieldIdentity::new(FieldKind::StrokeWidth),
            ValueModel::Constant(Scalar::Double(1.0)),
            ValueModel::Constant(Scalar::Double(2.0)),
        );
        assert!(entry.is_stale());
        assert!(entry.registry().is_none());
        assert_eq!(entry.description(), "Change stroke_width");
    }

    #[test]
    fn size_grows_with_payload() {
        let id = FieldIdentity::new(FieldKind::Label);
        let short = UndoEntry::new(
            id,
            ValueModel::Constant("a".into()),
            ValueModel::Constant("b".into()),
        );
        let long = UndoEntry::new(
            id,
            ValueModel::Constant("a".repeat(100).into()),
            ValueModel::Constant("b".into()),
        );
        assert!(long.size_bytes() > short.size_bytes());
    }
}
