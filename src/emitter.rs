//! EventEmitter wiring for push-based value sources.
//!
//! Hosts with an event-emitter style form layer can register a binding as a
//! listener instead of calling `values_changed` by hand. Snapshots travel as
//! JSON-encoded strings, which every emitter payload format can carry:
//!
//! ```ignore
//! let mut emitter = EventEmitter::new();
//! let listener = watch_values(&persist, &mut emitter, "values_changed");
//!
//! // The form layer emits the current snapshot on every change:
//! emitter.emit("values_changed", serde_json::to_string(&snapshot).unwrap());
//!
//! // Detach when the form unmounts:
//! emitter.remove_listener(&listener);
//! ```

use event_emitter_rs::EventEmitter;

use crate::persist::FormPersist;
use crate::snapshot::Snapshot;
use crate::source::ValueSource;
use crate::storage::Storage;

/// Register `persist` as a listener for snapshot payloads on `event`.
///
/// The listener holds only a weak handle: once the last strong handle is
/// dropped, emitted events are ignored. Returns the listener id for
/// `EventEmitter::remove_listener`. Payloads that fail to parse as a JSON
/// object are dropped, matching the engine's treatment of unusable data.
pub fn watch_values<S, V>(
    persist: &FormPersist<S, V>,
    emitter: &mut EventEmitter,
    event: &str,
) -> String
where
    S: Storage + 'static,
    V: ValueSource + 'static,
{
    let weak = persist.downgrade();
    emitter.on(event, move |raw: String| {
        let persist = match weak.upgrade() {
            Some(persist) => persist,
            None => return,
        };
        if let Ok(snapshot) = serde_json::from_str::<Snapshot>(&raw) {
            let _ = persist.values_changed(snapshot);
        }
    })
}
