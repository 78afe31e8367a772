use moka::sync::Cache;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// 固定 TTL 的結果快取。
///
/// 過期項目在讀取時就不會再回傳，並由 moka 的背景維護在寫入時一併清掉；
/// 寫入店家資料不會讓快取失效，最長會有一個 TTL 的過時視窗。
pub struct ResultCache<V> {
    entries: Cache<String, V>,
    ttl: Duration,
}

impl<V> ResultCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
            ttl,
        }
    }

    /// TTL 為 0 時快取停用
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }

        let hit = self.entries.get(key);
        if hit.is_some() {
            tracing::debug!("📦 Cache hit for '{}'", key);
        }
        hit
    }

    pub fn insert(&self, key: impl Into<String>, payload: V) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(key.into(), payload);
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    /// 立即執行維護工作，回傳清掉的過期項目數
    pub fn purge_expired(&self) -> u64 {
        let before = self.entries.entry_count();
        self.entries.run_pending_tasks();
        let after = self.entries.entry_count();
        let purged = before.saturating_sub(after);
        if purged > 0 {
            tracing::debug!("Purged {} expired cache entries", purged);
        }
        purged
    }

    /// 實際保存的項目數（先做完維護，過期的不算）
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for ResultCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl<V> fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
