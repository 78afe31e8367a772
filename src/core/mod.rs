pub mod cache;
pub mod discovery;
pub mod formatter;
pub mod geo;
pub mod opening_hours;
pub mod query;
pub mod sampler;

pub use crate::domain::model::{GeoPoint, Venue, VenueFilter};
pub use crate::domain::ports::{Clock, ConfigProvider, VenueStore};
pub use crate::utils::error::Result;
