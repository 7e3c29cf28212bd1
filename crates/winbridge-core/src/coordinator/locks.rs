use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use winbridge_common::Label;

/// One async mutex per label. Holding the guard makes a lookup-then-act
/// sequence on that label atomic with respect to other holders.
#[derive(Default)]
pub(crate) struct LabelLocks {
    locks: Mutex<HashMap<Label, Arc<tokio::sync::Mutex<()>>>>,
}

impl LabelLocks {
    pub(crate) async fn acquire(&self, label: &Label) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries referenced only by the map are idle.
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(label.clone()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
