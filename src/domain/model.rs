use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// 兩點的算術中點（不是大圓中點）
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }
}

/// 粗略的經緯度矩形，交給儲存層先做範圍過濾
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lon
            && point.lng <= self.max_lon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    #[default]
    Pending,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// 設施或氛圍標籤：value 用來過濾，name 用來顯示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub value: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Tag {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub day: DayOfWeek,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

impl ScheduleEntry {
    pub fn open(day: DayOfWeek, open_time: &str, close_time: &str) -> Self {
        Self {
            day,
            open_time: Some(open_time.to_string()),
            close_time: Some(close_time.to_string()),
            is_closed: false,
        }
    }

    pub fn closed(day: DayOfWeek) -> Self {
        Self {
            day,
            open_time: None,
            close_time: None,
            is_closed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub city: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub status: VenueStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub founded: Option<NaiveDate>,
    #[serde(default)]
    pub amenities: Vec<Tag>,
    #[serde(default)]
    pub vibes: Vec<Tag>,
    #[serde(default)]
    pub opening_hours: Vec<ScheduleEntry>,
    #[serde(default)]
    pub payment_methods: Vec<String>,
}

impl Venue {
    /// 只有經緯度都存在時才算有座標
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }

    pub fn schedule_for(&self, day: DayOfWeek) -> Option<&ScheduleEntry> {
        self.opening_hours.iter().find(|entry| entry.day == day)
    }

    pub fn has_any_amenity(&self, wanted: &BTreeSet<String>) -> bool {
        has_any_tag(&self.amenities, wanted)
    }

    pub fn has_any_vibe(&self, wanted: &BTreeSet<String>) -> bool {
        has_any_tag(&self.vibes, wanted)
    }
}

fn has_any_tag(tags: &[Tag], wanted: &BTreeSet<String>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    tags.iter()
        .any(|tag| wanted.contains(&tag.value.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

/// 交給儲存層的非地理過濾條件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueFilter {
    pub search: Option<String>,
    pub city: Option<String>,
    pub min_rating: Option<f64>,
    pub amenities: BTreeSet<String>,
    pub vibes: BTreeSet<String>,
    pub status: Option<VenueStatus>,
    pub window: Option<PageWindow>,
}

impl VenueFilter {
    /// 標籤過濾採用 any-of：店家只要有任一個指定標籤就算符合
    pub fn matches(&self, venue: &Venue) -> bool {
        if let Some(search) = &self.search {
            if !venue.name.to_lowercase().contains(search.as_str()) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if venue.city != *city {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if venue.rating < min_rating {
                return false;
            }
        }
        if let Some(status) = self.status {
            if venue.status != status {
                return false;
            }
        }
        venue.has_any_amenity(&self.amenities) && venue.has_any_vibe(&self.vibes)
    }

    /// 推薦用的寬鬆條件：只保留城市與狀態
    pub fn widened(&self) -> VenueFilter {
        VenueFilter {
            city: self.city.clone(),
            status: self.status,
            ..VenueFilter::default()
        }
    }
}
