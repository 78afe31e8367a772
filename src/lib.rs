pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};
pub use config::toml_config::DiscoveryConfig;

pub use adapters::InMemoryVenueStore;
pub use core::{
    cache::ResultCache,
    discovery::{CachedPayload, DiscoveryService},
    formatter::{ApiResponse, PageInfo, SearchResult, VenueDetail, VenueSummary},
    query::{QueryNormalizer, RawParams, VenueQuery},
    sampler::RankingSampler,
};
pub use utils::error::{DiscoveryError, Result};
