//! Change notification fan-out.
//!
//! Observers receive the full current snapshot on every fetch, never a diff.
//! Callbacks run on whichever thread performed the fetch (the caller for
//! groups, the background queue for todos); UI adapters must re-dispatch.

use crate::store::error::StoreResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer<T> = Arc<dyn Fn(&StoreResult<Vec<T>>) + Send + Sync>;

pub(crate) struct ObserverList<T> {
    next_id: AtomicU64,
    observers: Mutex<Vec<(SubscriptionId, Observer<T>)>>,
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
        }
    }
}

impl<T> ObserverList<T> {
    pub(crate) fn subscribe(
        &self,
        observer: impl Fn(&StoreResult<Vec<T>>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Delivers one snapshot to every observer registered at call time.
    pub(crate) fn notify(&self, snapshot: &StoreResult<Vec<T>>) {
        // Copy out so observers may (un)subscribe from inside the callback.
        let observers: Vec<Observer<T>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObserverList;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn notify_reaches_subscribers_until_they_unsubscribe() {
        let list = ObserverList::<i64>::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = list.subscribe(move |snapshot| {
            assert_eq!(snapshot.as_ref().map(Vec::len).unwrap_or(0), 2);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        list.notify(&Ok(vec![1, 2]));
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        list.notify(&Ok(vec![1, 2]));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn observer_may_unsubscribe_itself_during_notify() {
        let list = Arc::new(ObserverList::<i64>::default());
        let inner = Arc::clone(&list);
        let id = Arc::new(parking_lot::Mutex::new(None));
        let own_id = Arc::clone(&id);
        let subscribed = list.subscribe(move |_| {
            if let Some(id) = own_id.lock().take() {
                inner.unsubscribe(id);
            }
        });
        *id.lock() = Some(subscribed);

        list.notify(&Ok(Vec::new()));
        assert_eq!(list.len(), 0);
    }
}
