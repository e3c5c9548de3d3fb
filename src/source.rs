//! Value source: the form-state manager seam.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a restored value is written back into the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValueOpts {
    /// Run the field's validation after setting.
    pub validate: bool,
    /// Mark the field dirty.
    pub dirty: bool,
    /// Mark the field touched.
    pub touch: bool,
}

/// Field-level write access to the live form state.
///
/// The push side of the form (notifying the engine of value changes) is
/// the host calling [`FormPersist::values_changed`] (or the emitter wiring
/// behind the `emitter` feature), so this trait only needs the write-back
/// operation used during restore.
///
/// [`FormPersist::values_changed`]: crate::FormPersist::values_changed
pub trait ValueSource: Send + Sync {
    /// Set a single field's value.
    fn set_value(&self, field: &str, value: Value, opts: SetValueOpts);
}
