//! Sync event listeners

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use super::preview::SyncPreview;
use crate::history::SyncOperation;

/// Something listeners are told about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SyncEvent {
    /// A fresh smart preview from [`super::SyncEngine::refresh`]
    PreviewRefreshed { preview: Box<SyncPreview> },
    /// An operation was appended to history, completed or failed
    OperationRecorded { operation: Box<SyncOperation> },
    /// Stores were restored from rollback points
    #[serde(rename_all = "camelCase")]
    HistoryRestored { rollback_point_ids: Vec<Uuid> },
}

pub type SyncListener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Handle returned on registration, used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, SyncListener)>>,
}

impl ListenerRegistry {
    pub fn add(&self, listener: SyncListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Call every listener. The list is copied first so a listener may
    /// register or remove listeners without deadlocking.
    pub fn notify(&self, event: &SyncEvent) {
        let snapshot: Vec<SyncListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn restored() -> SyncEvent {
        SyncEvent::HistoryRestored {
            rollback_point_ids: vec![],
        }
    }

    #[test]
    fn notifies_until_removed() {
        let registry = ListenerRegistry::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = registry.add(Arc::new(move |_: &SyncEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.notify(&restored());
        assert!(registry.remove(id));
        registry.notify(&restored());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!registry.remove(id));
    }

    #[test]
    fn ids_are_unique() {
        let registry = ListenerRegistry::default();
        let a = registry.add(Arc::new(|_: &SyncEvent| {}));
        let b = registry.add(Arc::new(|_: &SyncEvent| {}));
        assert_ne!(a, b);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn events_serialize_with_tag() {
        let value = serde_json::to_value(restored()).unwrap();
        assert_eq!(value["event"], "historyRestored");
        assert!(value["rollbackPointIds"].is_array());
    }
}
