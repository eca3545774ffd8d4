use schannel_shared::account::{NodeId, SsrInfo};

/// Works out which node should be selected given the latest node list.
///
/// Keeps `current` if it is still offered, otherwise falls back to the first
/// node (or nothing when the list is empty)
pub(crate) fn reconcile_selection(current: Option<&NodeId>, info: &SsrInfo) -> Option<NodeId> {
    match current {
        Some(id) if info.contains(id) => Some(id.clone()),
        _ => info.first().map(|node| node.id.clone()),
    }
}
