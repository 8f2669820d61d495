use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use companion_agents::BookingSession;
use companion_core::BookingState;
use parking_lot::RwLock;
use tracing::info;

struct TrackedBooking {
    session: BookingSession,
    touched: Instant,
}

/// Live booking sessions keyed by id, bounded by `capacity`.
///
/// Confirmed sessions and sessions untouched for `idle_ttl` are evicted when
/// room is needed. Evicted sessions are closed so their countdown stops.
#[derive(Clone)]
pub struct BookingRegistry {
    entries: Arc<RwLock<HashMap<String, TrackedBooking>>>,
    capacity: usize,
    idle_ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryFull {
    pub capacity: usize,
}

impl BookingRegistry {
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity,
            idle_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn insert(&self, session: BookingSession) -> Result<(), RegistryFull> {
        self.insert_at(session, Instant::now())
    }

    pub fn get(&self, id: &str) -> Option<BookingSession> {
        self.get_at(id, Instant::now())
    }

    pub fn remove(&self, id: &str) -> Option<BookingSession> {
        self.entries.write().remove(id).map(|entry| entry.session)
    }

    fn insert_at(&self, session: BookingSession, now: Instant) -> Result<(), RegistryFull> {
        let mut entries = self.entries.write();

        if entries.len() >= self.capacity {
            let evicted = self.evict(&mut entries, now);
            if evicted > 0 {
                info!(evicted, remaining = entries.len(), "stale bookings evicted");
            }
        }
        if entries.len() >= self.capacity {
            return Err(RegistryFull {
                capacity: self.capacity,
            });
        }

        entries.insert(
            session.id().to_string(),
            TrackedBooking {
                session,
                touched: now,
            },
        );
        Ok(())
    }

    fn get_at(&self, id: &str, now: Instant) -> Option<BookingSession> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(id)?;
        entry.touched = now;
        Some(entry.session.clone())
    }

    fn evict(&self, entries: &mut HashMap<String, TrackedBooking>, now: Instant) -> usize {
        let stale = entries
            .iter()
            .filter(|(_, entry)| {
                entry.session.state() == BookingState::Success
                    || now.saturating_duration_since(entry.touched) >= self.idle_ttl
            })
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();

        for id in &stale {
            if let Some(entry) = entries.remove(id) {
                entry.session.close();
            }
        }
        stale.len()
    }
}
