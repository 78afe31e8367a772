use crate::domain::model::{BoundingBox, Venue, VenueFilter};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::time::Duration;

/// 店家資料的唯一來源，背後可能是關聯式資料庫、文件庫或遠端服務
#[async_trait]
pub trait VenueStore: Send + Sync {
    async fn fetch_venues(
        &self,
        filter: &VenueFilter,
        bounding_box: Option<&BoundingBox>,
    ) -> Result<Vec<Venue>>;

    async fn count_venues(&self, filter: &VenueFilter) -> Result<u64>;

    async fn fetch_venue_by_slug(&self, slug: &str) -> Result<Option<Venue>>;
}

pub trait ConfigProvider: Send + Sync {
    fn utc_offset(&self) -> FixedOffset;
    fn default_page_size(&self) -> usize;
    fn max_page_size(&self) -> usize;
    fn store_timeout(&self) -> Duration;
    fn cache_ttl(&self) -> Duration;
    fn cache_capacity(&self) -> u64;
    fn rating_epsilon(&self) -> f64;
    fn default_suggest_count(&self) -> usize;
    fn sampler_seed(&self) -> Option<u64>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時間，測試營業時間判斷用
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
