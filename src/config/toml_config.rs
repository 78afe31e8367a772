use crate::core::cache::DEFAULT_CACHE_CAPACITY;
use crate::core::sampler::DEFAULT_RATING_EPSILON;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, Validate,
};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 馬尼拉 UTC+8，沒有日光節約時間
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

pub const MAX_CACHE_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub suggest: SuggestConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub utc_offset_minutes: i32,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub store_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            default_page_size: 20,
            max_page_size: 100,
            store_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 60,
            max_entries: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub default_count: usize,
    pub rating_epsilon: f64,
    pub seed: Option<u64>,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            default_count: 6,
            rating_epsilon: DEFAULT_RATING_EPSILON,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub venues_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            venues_file: "./data/venues.json".to_string(),
        }
    }
}

impl DiscoveryConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiscoveryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiscoveryError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VENUES_FILE})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscoveryError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 時區偏移 -12:00 ~ +14:00
        validate_range(
            "service.utc_offset_minutes",
            self.service.utc_offset_minutes,
            -12 * 60,
            14 * 60,
        )?;
        validate_positive_number("service.max_page_size", self.service.max_page_size, 1)?;
        validate_range(
            "service.default_page_size",
            self.service.default_page_size,
            1,
            self.service.max_page_size,
        )?;
        validate_range(
            "service.store_timeout_ms",
            self.service.store_timeout_ms,
            1,
            120_000,
        )?;
        // 最長一天
        validate_range("cache.ttl_seconds", self.cache.ttl_seconds, 0, MAX_CACHE_TTL_SECONDS)?;
        validate_range("cache.max_entries", self.cache.max_entries, 1, 1_000_000)?;
        // ε 必須為正，零評分的店家才抽得到
        validate_range("suggest.rating_epsilon", self.suggest.rating_epsilon, 1e-6, 5.0)?;
        validate_path("store.venues_file", &self.store.venues_file)?;
        Ok(())
    }
}

impl ConfigProvider for DiscoveryConfig {
    fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.service.utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(
                "Invalid utc offset {} minutes, falling back to UTC",
                self.service.utc_offset_minutes
            );
            Utc.fix()
        })
    }

    fn default_page_size(&self) -> usize {
        self.service.default_page_size
    }

    fn max_page_size(&self) -> usize {
        self.service.max_page_size
    }

    fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.service.store_timeout_ms)
    }

    fn cache_ttl(&self) -> Duration {
        if self.cache.enabled {
            Duration::from_secs(self.cache.ttl_seconds.min(MAX_CACHE_TTL_SECONDS))
        } else {
            Duration::ZERO
        }
    }

    fn cache_capacity(&self) -> u64 {
        self.cache.max_entries
    }

    fn rating_epsilon(&self) -> f64 {
        self.suggest.rating_epsilon
    }

    fn default_suggest_count(&self) -> usize {
        self.suggest.default_count
    }

    fn sampler_seed(&self) -> Option<u64> {
        self.suggest.seed
    }
}

impl Validate for DiscoveryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
