use crate::core::opening_hours::{evaluate, parse_time_of_day, TimeOfDay};
use crate::core::query::{IncludeSet, Relation};
use crate::domain::model::{DayOfWeek, ScheduleEntry, Tag, Venue};
use crate::utils::error::DiscoveryError;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use serde::Serialize;

/// 「現在」在參考時區下的星期與時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenContext {
    pub today: DayOfWeek,
    pub now: TimeOfDay,
}

impl OpenContext {
    pub fn at(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = instant.with_timezone(&offset);
        Self {
            today: DayOfWeek::from(local.weekday()),
            now: TimeOfDay::from_time(&local.time()),
        }
    }

    pub fn is_open(&self, venue: &Venue) -> bool {
        evaluate(venue.schedule_for(self.today), self.now).is_open()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHoursView {
    pub day: DayOfWeek,
    pub open: Option<String>,
    pub close: Option<String>,
    pub is_closed: bool,
}

/// 列表裡的標籤：預設只有 value，要求 `_meta` 時附上顯示名稱
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagView {
    Value(String),
    Meta { value: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub address: Option<String>,
    pub city: String,
    pub rating: f64,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<TagView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibes: Option<Vec<TagView>>,
    pub is_open: bool,
    /// 只有地理查詢才有；店家沒有座標時為 null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<OpeningHoursView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueDetail {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rating: f64,
    pub image_url: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub review_count: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_methods: Vec<String>,
    pub founded: Option<String>,
    pub opening_hours: Vec<OpeningHoursView>,
    pub amenities: Vec<String>,
    pub vibes: Vec<String>,
    pub is_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(total: u64, page: usize, page_size: usize) -> Self {
        let size = page_size.max(1) as u64;
        Self {
            total,
            page,
            page_size,
            total_pages: total.div_ceil(size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub items: Vec<VenueSummary>,
    pub page_info: PageInfo,
}

pub fn format_summary(
    venue: &Venue,
    ctx: &OpenContext,
    distance_km: Option<Option<f64>>,
    include: &IncludeSet,
) -> VenueSummary {
    VenueSummary {
        id: venue.id.clone(),
        name: venue.name.clone(),
        slug: venue.slug.clone(),
        address: venue.address.clone(),
        city: venue.city.clone(),
        rating: venue.rating,
        image_url: venue.image_url.clone(),
        amenities: tag_views(
            &venue.amenities,
            include,
            Relation::Amenities,
            Relation::AmenitiesMeta,
        ),
        vibes: tag_views(&venue.vibes, include, Relation::Vibes, Relation::VibesMeta),
        is_open: ctx.is_open(venue),
        distance_km,
        opening_hours: include
            .includes(Relation::OpeningHours)
            .then(|| venue.opening_hours.iter().map(format_schedule_entry).collect()),
        payment_methods: include
            .includes(Relation::PaymentMethods)
            .then(|| venue.payment_methods.iter().map(|pm| title_case(pm)).collect()),
    }
}

pub fn format_detail(venue: &Venue, ctx: &OpenContext) -> VenueDetail {
    VenueDetail {
        id: venue.id.clone(),
        name: venue.name.clone(),
        slug: venue.slug.clone(),
        description: venue.description.clone(),
        address: venue.address.clone(),
        city: venue.city.clone(),
        email: venue.email.clone(),
        phone: venue.phone.clone(),
        rating: venue.rating,
        image_url: venue.image_url.clone(),
        facebook: venue.facebook.clone(),
        instagram: venue.instagram.clone(),
        review_count: venue.review_count,
        latitude: venue.latitude,
        longitude: venue.longitude,
        payment_methods: venue.payment_methods.iter().map(|pm| title_case(pm)).collect(),
        founded: venue.founded.map(|d| d.format("%B %-d, %Y").to_string()),
        opening_hours: venue.opening_hours.iter().map(format_schedule_entry).collect(),
        amenities: venue.amenities.iter().map(|t| t.display_name().to_string()).collect(),
        vibes: venue.vibes.iter().map(|t| t.display_name().to_string()).collect(),
        is_open: ctx.is_open(venue),
    }
}

fn tag_views(
    tags: &[Tag],
    include: &IncludeSet,
    list: Relation,
    meta: Relation,
) -> Option<Vec<TagView>> {
    if include.includes(meta) {
        Some(
            tags.iter()
                .map(|tag| TagView::Meta {
                    value: tag.value.clone(),
                    name: tag.display_name().to_string(),
                })
                .collect(),
        )
    } else if include.includes(list) {
        Some(tags.iter().map(|tag| TagView::Value(tag.value.clone())).collect())
    } else {
        None
    }
}

fn format_schedule_entry(entry: &ScheduleEntry) -> OpeningHoursView {
    OpeningHoursView {
        day: entry.day,
        open: entry.open_time.as_deref().map(display_time),
        close: entry.close_time.as_deref().map(display_time),
        is_closed: entry.is_closed,
    }
}

/// 能解析就轉成 12 小時制，不能解析就原樣顯示
fn display_time(raw: &str) -> String {
    parse_time_of_day(raw)
        .map(|t| t.to_12_hour())
        .unwrap_or_else(|_| raw.to_string())
}

/// "gcash wallet" -> "Gcash Wallet"
pub fn title_case(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// 對外回應的外層包裝
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub is_success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    #[serde(skip)]
    pub status_code: u16,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            message: message.into(),
            data: Some(data),
            page_info: None,
            status_code: 200,
        }
    }

    pub fn with_page_info(mut self, page_info: PageInfo) -> Self {
        self.page_info = Some(page_info);
        self
    }

    pub fn error(err: &DiscoveryError) -> Self {
        Self {
            is_success: false,
            message: err.user_friendly_message(),
            data: None,
            page_info: None,
            status_code: err.status_code(),
        }
    }
}

impl ApiResponse<Vec<VenueSummary>> {
    pub fn from_search(result: SearchResult) -> Self {
        Self::success(result.items, "Venues fetched successfully").with_page_info(result.page_info)
    }
}
