use crate::domain::model::{BoundingBox, Venue, VenueFilter};
use crate::domain::ports::VenueStore;
use crate::utils::error::{DiscoveryError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// 記憶體內的店家資料，過濾語意與正式資料庫相同
#[derive(Debug, Clone, Default)]
pub struct InMemoryVenueStore {
    venues: Vec<Venue>,
}

impl InMemoryVenueStore {
    pub fn new(venues: Vec<Venue>) -> Result<Self> {
        let mut slugs = HashSet::new();
        for venue in &venues {
            if !slugs.insert(venue.slug.as_str()) {
                return Err(DiscoveryError::ValidationError {
                    field: "slug".to_string(),
                    message: format!("duplicate slug '{}'", venue.slug),
                });
            }
            if !(0.0..=5.0).contains(&venue.rating) {
                return Err(DiscoveryError::ValidationError {
                    field: "rating".to_string(),
                    message: format!("rating {} of '{}' is outside 0..=5", venue.rating, venue.slug),
                });
            }
        }
        Ok(Self { venues })
    }

    /// 從 JSON 檔案載入店家陣列
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let store = Self::from_json_str(&content)?;
        tracing::debug!(
            "Loaded {} venues from {}",
            store.len(),
            path.as_ref().display()
        );
        Ok(store)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let venues: Vec<Venue> = serde_json::from_str(content)?;
        Self::new(venues)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    fn matching<'a>(
        &'a self,
        filter: &'a VenueFilter,
        bounding_box: Option<&'a BoundingBox>,
    ) -> impl Iterator<Item = &'a Venue> + 'a {
        self.venues.iter().filter(move |venue| {
            if !filter.matches(venue) {
                return false;
            }
            // 沒有座標的店家不受矩形限制
            match (bounding_box, venue.coordinates()) {
                (Some(bbox), Some(point)) => bbox.contains(&point),
                _ => true,
            }
        })
    }
}

#[async_trait]
impl VenueStore for InMemoryVenueStore {
    async fn fetch_venues(
        &self,
        filter: &VenueFilter,
        bounding_box: Option<&BoundingBox>,
    ) -> Result<Vec<Venue>> {
        let matching = self.matching(filter, bounding_box);
        let venues: Vec<Venue> = match filter.window {
            Some(window) => matching
                .skip(window.offset)
                .take(window.limit)
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        };
        Ok(venues)
    }

    async fn count_venues(&self, filter: &VenueFilter) -> Result<u64> {
        Ok(self.matching(filter, None).count() as u64)
    }

    async fn fetch_venue_by_slug(&self, slug: &str) -> Result<Option<Venue>> {
        Ok(self.venues.iter().find(|v| v.slug == slug).cloned())
    }
}
