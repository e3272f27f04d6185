/// In-process change notifications emitted after a successful shared-state
/// write. Cross-context consumers have no notification channel and must
/// re-read the store instead; this only serves renderers living in the same
/// process as the writer. Subscribers re-fetch rather than diffing a payload,
/// since another context may have changed unrelated properties in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    ItemsChanged,
}
