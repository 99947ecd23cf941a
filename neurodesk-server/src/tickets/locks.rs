//! Per-ticket write serialization
//!
//! Ticket writes are read-modify-write cycles over a whole row (the
//! audit trail is an embedded list). Two concurrent updates to the same
//! ticket would otherwise race and lose audit entries, so every
//! lifecycle operation takes the ticket's mutex before reading the row.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Registry of per-ticket-id mutexes.
///
/// Entries are created on first use and kept for the process lifetime;
/// one `Arc<Mutex>` per ticket ever written is cheap at this scale.
#[derive(Clone, Default)]
pub struct TicketLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the mutex for a ticket id
    pub fn for_ticket(&self, id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_yields_same_mutex() {
        let locks = TicketLocks::new();
        let a = locks.for_ticket(1);
        let b = locks.for_ticket(1);
        assert!(Arc::ptr_eq(&a, &b));

        let other = locks.for_ticket(2);
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn lock_serializes_critical_sections() {
        let locks = TicketLocks::new();
        let lock = locks.for_ticket(7);

        let guard = lock.lock().await;
        assert!(locks.for_ticket(7).try_lock().is_err());
        drop(guard);
        assert!(locks.for_ticket(7).try_lock().is_ok());
    }
}
