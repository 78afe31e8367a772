use crate::core::cache::ResultCache;
use crate::core::formatter::{
    format_detail, format_summary, OpenContext, PageInfo, SearchResult, VenueDetail, VenueSummary,
};
use crate::core::geo::{annotate_and_filter, bounding_box, DistancedVenue};
use crate::core::query::{QueryNormalizer, RawParams, VenueQuery};
use crate::core::sampler::{Candidate, RankingSampler};
use crate::domain::model::{GeoPoint, Venue};
use crate::domain::ports::{Clock, ConfigProvider, SystemClock, VenueStore};
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::validate_non_empty_string;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// 快取內容：列表查詢結果或單一店家
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum CachedPayload {
    Search(SearchResult),
    Venue(VenueDetail),
}

struct SuggestCandidate {
    venue: Venue,
    distance_km: Option<Option<f64>>,
}

impl Candidate for SuggestCandidate {
    fn identity(&self) -> &str {
        &self.venue.id
    }

    fn rating(&self) -> f64 {
        self.venue.rating
    }
}

/// 店家搜尋與推薦引擎
pub struct DiscoveryService<S: VenueStore, C: ConfigProvider> {
    store: S,
    config: C,
    normalizer: QueryNormalizer,
    cache: Arc<ResultCache<CachedPayload>>,
    sampler: Mutex<RankingSampler>,
    clock: Arc<dyn Clock>,
}

impl<S: VenueStore, C: ConfigProvider> DiscoveryService<S, C> {
    pub fn new(store: S, config: C) -> Self {
        let normalizer = QueryNormalizer::from_config(&config);
        let cache = Arc::new(ResultCache::with_capacity(
            config.cache_ttl(),
            config.cache_capacity(),
        ));
        let sampler = match config.sampler_seed() {
            Some(seed) => RankingSampler::seeded(seed, config.rating_epsilon()),
            None => RankingSampler::new(config.rating_epsilon()),
        };

        Self {
            store,
            config,
            normalizer,
            cache,
            sampler: Mutex::new(sampler),
            clock: Arc::new(SystemClock),
        }
    }

    /// 注入共用的快取實例
    pub fn with_cache(mut self, cache: Arc<ResultCache<CachedPayload>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sampler(mut self, sampler: RankingSampler) -> Self {
        self.sampler = Mutex::new(sampler);
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache<CachedPayload>> {
        &self.cache
    }

    pub fn normalizer(&self) -> &QueryNormalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn open_context(&self) -> OpenContext {
        OpenContext::at(self.clock.now(), self.config.utc_offset())
    }

    /// 儲存層呼叫加上逾時；呼叫端放棄 future 時進行中的請求一併取消
    async fn guarded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!("Venue store {} failed: {}", operation, e);
                Err(e)
            }
            Err(_) => {
                tracing::warn!("Venue store {} timed out after {:?}", operation, timeout);
                Err(DiscoveryError::StoreTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    pub async fn search_params(&self, params: &RawParams) -> Result<SearchResult> {
        let query = self.normalizer.normalize(params);
        self.search(&query).await
    }

    pub async fn search(&self, query: &VenueQuery) -> Result<SearchResult> {
        let cache_key = query.cache_key();
        if let Some(key) = &cache_key {
            if let Some(CachedPayload::Search(hit)) = self.cache.get(key) {
                return Ok(hit);
            }
        }

        let result = match query.center {
            Some(center) => self.search_near(query, center).await?,
            None => self.search_paged(query).await?,
        };

        tracing::info!(
            "🔎 Search returned {} of {} venues (page {}/{})",
            result.items.len(),
            result.page_info.total,
            result.page_info.page,
            result.page_info.total_pages
        );

        // 地理查詢沒有 key，不會寫入
        if let Some(key) = cache_key {
            self.cache.insert(key, CachedPayload::Search(result.clone()));
        }
        Ok(result)
    }

    async fn search_paged(&self, query: &VenueQuery) -> Result<SearchResult> {
        let mut filter = query.to_filter();
        let total = self.guarded("count", self.store.count_venues(&filter)).await?;

        filter.window = Some(query.page_window());
        let venues = self
            .guarded("fetch", self.store.fetch_venues(&filter, None))
            .await?;

        let ctx = self.open_context();
        let items = venues
            .iter()
            .map(|venue| format_summary(venue, &ctx, None, &query.include))
            .collect();

        Ok(SearchResult {
            items,
            page_info: PageInfo::new(total, query.page, query.page_size),
        })
    }

    async fn search_near(&self, query: &VenueQuery, center: GeoPoint) -> Result<SearchResult> {
        let annotated = self.fetch_near(query, center, query.radius_km).await?;
        let total = annotated.len() as u64;
        let window = query.page_window();

        let ctx = self.open_context();
        let items = annotated
            .iter()
            .skip(window.offset)
            .take(window.limit)
            .map(|item| format_summary(&item.venue, &ctx, Some(item.distance_km), &query.include))
            .collect();

        Ok(SearchResult {
            items,
            page_info: PageInfo::new(total, query.page, query.page_size),
        })
    }

    async fn fetch_near(
        &self,
        query: &VenueQuery,
        center: GeoPoint,
        radius_km: Option<f64>,
    ) -> Result<Vec<DistancedVenue>> {
        let filter = query.to_filter();
        let bbox = radius_km.map(|radius| bounding_box(&center, radius));
        let venues = self
            .guarded("fetch", self.store.fetch_venues(&filter, bbox.as_ref()))
            .await?;

        let fetched = venues.len();
        let annotated = annotate_and_filter(venues, &center, radius_km);
        tracing::debug!(
            "Geo query kept {} of {} candidates (radius {:?} km)",
            annotated.len(),
            fetched,
            radius_km
        );
        Ok(annotated)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<VenueDetail> {
        validate_non_empty_string("slug", slug)?;
        let slug = slug.trim();

        let cache_key = format!("venue:{}", slug);
        if let Some(CachedPayload::Venue(hit)) = self.cache.get(&cache_key) {
            return Ok(hit);
        }

        let venue = self
            .guarded("fetch_by_slug", self.store.fetch_venue_by_slug(slug))
            .await?
            .ok_or_else(|| DiscoveryError::not_found(slug))?;

        let detail = format_detail(&venue, &self.open_context());
        self.cache.insert(cache_key, CachedPayload::Venue(detail.clone()));
        Ok(detail)
    }

    /// 依評分加權隨機推薦，最多回傳 `count` 間。
    ///
    /// 只向儲存層要一次只保留城市條件的寬鬆結果，再在本地分成符合完整條件的主要池
    /// 與只符合城市的備用池；主要池不夠時才從備用池補。
    pub async fn suggest(&self, query: &VenueQuery, count: usize) -> Result<Vec<VenueSummary>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let filter = query.to_filter();
        let wide = filter.widened();
        let bbox = match (query.center, query.radius_km) {
            (Some(center), Some(radius)) => Some(bounding_box(&center, radius)),
            _ => None,
        };
        let venues = self
            .guarded("fetch", self.store.fetch_venues(&wide, bbox.as_ref()))
            .await?;

        let candidates: Vec<SuggestCandidate> = match query.center {
            Some(center) => annotate_and_filter(venues, &center, query.radius_km)
                .into_iter()
                .map(|item| SuggestCandidate {
                    venue: item.venue,
                    distance_km: Some(item.distance_km),
                })
                .collect(),
            None => venues
                .into_iter()
                .map(|venue| SuggestCandidate {
                    venue,
                    distance_km: None,
                })
                .collect(),
        };

        let (primary, fallback): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| filter.matches(&candidate.venue));
        tracing::debug!(
            "Suggest pools: {} primary, {} fallback, want {}",
            primary.len(),
            fallback.len(),
            count
        );

        let picked = {
            let mut sampler = self
                .sampler
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sampler.sample(primary, fallback, count)
        };

        let ctx = self.open_context();
        let suggestions: Vec<VenueSummary> = picked
            .iter()
            .map(|c| format_summary(&c.venue, &ctx, c.distance_km, &query.include))
            .collect();

        tracing::info!("✨ Suggested {} venues", suggestions.len());
        Ok(suggestions)
    }

    pub async fn suggest_params(&self, params: &RawParams, count: Option<usize>) -> Result<Vec<VenueSummary>> {
        let query = self.normalizer.normalize(params);
        let count = count.unwrap_or_else(|| self.config.default_suggest_count());
        self.suggest(&query, count).await
    }

    /// 兩個位置中點附近的店家，依距離中點由近到遠
    pub async fn near_midpoint(
        &self,
        first: GeoPoint,
        second: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<VenueSummary>> {
        for (field, point) in [("first", &first), ("second", &second)] {
            if !(point.lat.is_finite()
                && point.lng.is_finite()
                && (-90.0..=90.0).contains(&point.lat)
                && (-180.0..=180.0).contains(&point.lng))
            {
                return Err(DiscoveryError::ValidationError {
                    field: field.to_string(),
                    message: format!("invalid coordinates ({}, {})", point.lat, point.lng),
                });
            }
        }
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(DiscoveryError::ValidationError {
                field: "radius_km".to_string(),
                message: format!("radius must be a positive number, got {}", radius_km),
            });
        }

        let center = first.midpoint(&second);
        let query = VenueQuery::near(center, Some(radius_km));
        let annotated = self.fetch_near(&query, center, Some(radius_km)).await?;

        let ctx = self.open_context();
        Ok(annotated
            .iter()
            .map(|item| format_summary(&item.venue, &ctx, Some(item.distance_km), &query.include))
            .collect())
    }
}
