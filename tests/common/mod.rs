#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use venue_discovery::core::geo::EARTH_RADIUS_KM;
use venue_discovery::domain::model::{BoundingBox, GeoPoint, Venue, VenueFilter};
use venue_discovery::domain::ports::{FixedClock, VenueStore};
use venue_discovery::{DiscoveryConfig, DiscoveryError, InMemoryVenueStore, Result};

pub const MANILA: GeoPoint = GeoPoint {
    lat: 14.5995,
    lng: 120.9842,
};

/// 2024-01-01（星期一）馬尼拉時間 10:00
pub fn monday_morning() -> Arc<FixedClock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()))
}

/// 正北方 km 公里的座標
pub fn north_of(center: &GeoPoint, km: f64) -> (f64, f64) {
    (center.lat + (km / EARTH_RADIUS_KM).to_degrees(), center.lng)
}

pub fn venue(slug: &str, coords: Option<(f64, f64)>, rating: f64) -> Venue {
    serde_json::from_value(serde_json::json!({
        "id": format!("id-{}", slug),
        "name": slug,
        "slug": slug,
        "city": "manila",
        "latitude": coords.map(|c| c.0),
        "longitude": coords.map(|c| c.1),
        "rating": rating,
        "status": "active",
        "opening_hours": [
            { "day": "Monday", "open_time": "08:00", "close_time": "17:00" }
        ]
    }))
    .unwrap()
}

pub fn seeded_config(seed: u64) -> DiscoveryConfig {
    let mut config = DiscoveryConfig::default();
    config.suggest.seed = Some(seed);
    config
}

/// 記錄呼叫次數的 store，可以模擬失敗與延遲
#[derive(Clone)]
pub struct CountingStore {
    inner: InMemoryVenueStore,
    pub fetches: Arc<AtomicUsize>,
    pub counts: Arc<AtomicUsize>,
    pub slug_lookups: Arc<AtomicUsize>,
    fail: bool,
    delay: Option<Duration>,
}

impl CountingStore {
    pub fn new(venues: Vec<Venue>) -> Self {
        Self {
            inner: InMemoryVenueStore::new(venues).unwrap(),
            fetches: Arc::new(AtomicUsize::new(0)),
            counts: Arc::new(AtomicUsize::new(0)),
            slug_lookups: Arc::new(AtomicUsize::new(0)),
            fail: false,
            delay: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn before_call(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DiscoveryError::store("connection refused (db:5432)"));
        }
        Ok(())
    }
}

#[async_trait]
impl VenueStore for CountingStore {
    async fn fetch_venues(
        &self,
        filter: &VenueFilter,
        bounding_box: Option<&BoundingBox>,
    ) -> Result<Vec<Venue>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.fetch_venues(filter, bounding_box).await
    }

    async fn count_venues(&self, filter: &VenueFilter) -> Result<u64> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.count_venues(filter).await
    }

    async fn fetch_venue_by_slug(&self, slug: &str) -> Result<Option<Venue>> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        self.before_call().await?;
        self.inner.fetch_venue_by_slug(slug).await
    }
}
