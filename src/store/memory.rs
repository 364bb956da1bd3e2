//! In-memory punch store for tests.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::punch::{NewPunch, PunchEvent};
use crate::store::{PunchStore, StoreError, StoreResult};

pub struct InMemoryPunchStore {
    events: RwLock<Vec<PunchEvent>>,
    companies: RwLock<HashMap<u64, String>>,
    available: AtomicBool,
}

impl InMemoryPunchStore {
    pub fn new() -> Self {
        Self::with_events(Vec::new())
    }

    pub fn with_events(events: Vec<PunchEvent>) -> Self {
        Self {
            events: RwLock::new(events),
            companies: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Records `user_id` as a member of `company_code`.
    pub fn add_user(&self, user_id: u64, company_code: &str) {
        self.companies
            .write()
            .unwrap()
            .insert(user_id, company_code.to_string());
    }

    /// Simulates an outage: every call fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl PunchStore for InMemoryPunchStore {
    async fn fetch_events(
        &self,
        user_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PunchEvent>> {
        self.check_available()?;

        Ok(self
            .events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| from.is_none_or(|f| e.timestamp >= f))
            .filter(|e| to.is_none_or(|t| e.timestamp < t))
            .cloned()
            .collect())
    }

    async fn fetch_latest(&self, user_id: u64, limit: usize) -> StoreResult<Vec<PunchEvent>> {
        let mut events = self.fetch_events(user_id, None, None).await?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }

    async fn company_of(&self, user_id: u64) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self.companies.read().unwrap().get(&user_id).cloned())
    }

    async fn append_event(&self, punch: NewPunch) -> StoreResult<PunchEvent> {
        self.check_available()?;

        let mut events = self.events.write().unwrap();
        let event = PunchEvent {
            id: format!("punch-{}", events.len() + 1),
            kind: punch.kind,
            timestamp: punch.timestamp,
            location: punch.location,
            user_id: punch.user_id,
        };
        events.push(event.clone());
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::punch::{Coordinates, Location, PunchKind};
    use chrono::{TimeZone, Timelike};

    fn new_punch(user_id: u64, hour: u32) -> NewPunch {
        NewPunch {
            user_id,
            kind: PunchKind::CheckedIn,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, hour, 0, 0).unwrap(),
            location: Location {
                coords: Coordinates {
                    latitude: 0.0,
                    longitude: 0.0,
                },
                address: None,
            },
        }
    }

    #[actix_web::test]
    async fn filters_by_user_and_half_open_range() {
        let store = InMemoryPunchStore::new();
        for hour in [8, 9, 10] {
            store.append_event(new_punch(1, hour)).await.unwrap();
        }
        store.append_event(new_punch(2, 9)).await.unwrap();

        let from = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();

        let events = store.fetch_events(1, Some(from), Some(to)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, from);

        assert_eq!(store.fetch_events(1, None, None).await.unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn latest_is_newest_first_and_bounded() {
        let store = InMemoryPunchStore::new();
        for hour in [9, 7, 11, 8] {
            store.append_event(new_punch(1, hour)).await.unwrap();
        }

        let latest = store.fetch_latest(1, 2).await.unwrap();
        let hours: Vec<u32> = latest.iter().map(|e| e.timestamp.hour()).collect();
        assert_eq!(hours, vec![11, 9]);
    }

    #[actix_web::test]
    async fn company_lookup_knows_registered_users_only() {
        let store = InMemoryPunchStore::new();
        store.add_user(1, "DPWORLD");

        assert_eq!(store.company_of(1).await.unwrap().as_deref(), Some("DPWORLD"));
        assert_eq!(store.company_of(2).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn offline_store_fails_every_call() {
        let store = InMemoryPunchStore::new();
        store.set_available(false);

        assert!(matches!(
            store.fetch_events(1, None, None).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.fetch_latest(1, 5).await.is_err());
        assert!(store.company_of(1).await.is_err());
        assert!(store.append_event(new_punch(1, 9)).await.is_err());
        assert_eq!(store.len(), 0);
    }
}
