use crate::domain::model::{GeoPoint, PageWindow, VenueFilter, VenueStatus};
use crate::domain::ports::ConfigProvider;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// 原始查詢參數，key 一律小寫
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParams(BTreeMap<String, String>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K: AsRef<str>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value);
        }
        params
    }

    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.as_ref().trim().to_lowercase(), value.into());
    }

    /// 依序找第一個存在的別名
    pub fn get_any<'a>(&'a self, aliases: &[&'a str]) -> Option<(&'a str, &'a str)> {
        aliases
            .iter()
            .find_map(|alias| self.0.get(*alias).map(|v| (*alias, v.as_str())))
    }

    /// 表單邊界轉換：值可能是純量、陣列或 `{ "value": x }` 包裝
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut params = Self::new();
        if let serde_json::Value::Object(map) = value {
            for (key, raw) in map {
                if let Some(text) = flatten_form_value(raw) {
                    params.insert(key, text);
                }
            }
        }
        params
    }
}

fn flatten_form_value(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_form_value).collect();
            Some(parts.join(","))
        }
        Value::Object(map) => map.get("value").and_then(flatten_form_value),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Amenities,
    AmenitiesMeta,
    Vibes,
    VibesMeta,
    OpeningHours,
    PaymentMethods,
    All,
}

impl Relation {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "amenities" => Some(Self::Amenities),
            "amenities_meta" => Some(Self::AmenitiesMeta),
            "vibes" => Some(Self::Vibes),
            "vibes_meta" => Some(Self::VibesMeta),
            "opening_hours" | "openinghours" => Some(Self::OpeningHours),
            "payment_methods" | "paymentmethods" | "payment" => {
                Some(Self::PaymentMethods)
            }
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// 需要額外帶出的關聯資料
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSet(BTreeSet<Relation>);

impl IncludeSet {
    pub fn of(relations: &[Relation]) -> Self {
        Self(relations.iter().copied().collect())
    }

    pub fn includes(&self, relation: Relation) -> bool {
        self.0.contains(&Relation::All) || self.0.contains(&relation)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, relation: Relation) {
        self.0.insert(relation);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub value: String,
    pub reason: String,
}

/// 正規化後的查詢條件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub min_rating: Option<f64>,
    pub amenities: BTreeSet<String>,
    pub vibes: BTreeSet<String>,
    pub center: Option<GeoPoint>,
    pub radius_km: Option<f64>,
    pub page: usize,
    pub page_size: usize,
    pub include: IncludeSet,
    /// 被默默降級為「未提供」的欄位，不會回報給呼叫端
    #[serde(skip)]
    pub issues: Vec<ValidationIssue>,
}

impl Default for VenueQuery {
    fn default() -> Self {
        Self {
            search: None,
            city: None,
            min_rating: None,
            amenities: BTreeSet::new(),
            vibes: BTreeSet::new(),
            center: None,
            radius_km: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            include: IncludeSet::default(),
            issues: Vec::new(),
        }
    }
}

#[derive(Serialize)]
struct CacheKeyView<'a> {
    search: &'a Option<String>,
    city: &'a Option<String>,
    min_rating: &'a Option<f64>,
    amenities: &'a BTreeSet<String>,
    vibes: &'a BTreeSet<String>,
    page: usize,
    page_size: usize,
    include: &'a IncludeSet,
}

impl VenueQuery {
    pub fn near(center: GeoPoint, radius_km: Option<f64>) -> Self {
        Self {
            center: Some(center),
            radius_km,
            ..Self::default()
        }
    }

    pub fn is_geo(&self) -> bool {
        self.center.is_some()
    }

    /// 地理查詢不進快取，回傳 None
    pub fn cache_key(&self) -> Option<String> {
        if self.is_geo() {
            return None;
        }

        let view = CacheKeyView {
            search: &self.search,
            city: &self.city,
            min_rating: &self.min_rating,
            amenities: &self.amenities,
            vibes: &self.vibes,
            page: self.page,
            page_size: self.page_size,
            include: &self.include,
        };
        serde_json::to_string(&view)
            .ok()
            .map(|json| format!("search:{}", json))
    }

    /// 公開讀取路徑只看得到已上架的店家
    pub fn to_filter(&self) -> VenueFilter {
        VenueFilter {
            search: self.search.clone(),
            city: self.city.clone(),
            min_rating: self.min_rating,
            amenities: self.amenities.clone(),
            vibes: self.vibes.clone(),
            status: Some(VenueStatus::Active),
            window: None,
        }
    }

    pub fn page_window(&self) -> PageWindow {
        PageWindow {
            offset: (self.page.saturating_sub(1)).saturating_mul(self.page_size),
            limit: self.page_size,
        }
    }
}

/// 把原始參數轉成有預設值的查詢條件。
///
/// 數值解析失敗時不回錯誤，而是當作沒有提供並記在 `issues`。
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    default_page_size: usize,
    max_page_size: usize,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_MAX_PAGE_SIZE)
    }
}

impl QueryNormalizer {
    pub fn new(default_page_size: usize, max_page_size: usize) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.default_page_size(), config.max_page_size())
    }

    pub fn normalize(&self, params: &RawParams) -> VenueQuery {
        let mut issues = Vec::new();

        let search = params
            .get_any(&["search", "q"])
            .map(|(_, v)| v.trim().to_lowercase())
            .filter(|v| !v.is_empty());

        let city = params
            .get_any(&["city"])
            .map(|(_, v)| normalize_city(v))
            .filter(|v| !v.is_empty());

        let min_rating = parse_number(params, &["minrating", "min_rating"], &mut issues, |r| {
            (0.0..=5.0).contains(&r)
        });

        let amenities = params
            .get_any(&["amenities", "amenity"])
            .map(|(_, v)| split_list(v))
            .unwrap_or_default();
        let vibes = params
            .get_any(&["vibes", "vibe"])
            .map(|(_, v)| split_list(v))
            .unwrap_or_default();

        let lat = parse_number(params, &["lat", "latitude"], &mut issues, |v| {
            (-90.0..=90.0).contains(&v)
        });
        let lng = parse_number(params, &["lng", "lon", "longitude"], &mut issues, |v| {
            (-180.0..=180.0).contains(&v)
        });
        let center = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        let radius = parse_number(
            params,
            &["radiuskm", "radius_km", "radius"],
            &mut issues,
            |r| r > 0.0,
        );
        // 沒有中心點時半徑沒有意義
        let radius_km = center.and(radius);

        let page = parse_positive(params, &["page"], &mut issues).unwrap_or(1);
        let page_size = parse_positive(params, &["limit", "pagesize", "page_size"], &mut issues)
            .map(|size| size.min(self.max_page_size))
            .unwrap_or(self.default_page_size);

        let mut include = parse_include(params, &mut issues);
        // 有用標籤過濾時一併帶出該標籤列表
        if !amenities.is_empty() {
            include.insert(Relation::Amenities);
        }
        if !vibes.is_empty() {
            include.insert(Relation::Vibes);
        }

        for issue in &issues {
            tracing::debug!(
                "Ignoring query parameter {}='{}': {}",
                issue.field,
                issue.value,
                issue.reason
            );
        }

        VenueQuery {
            search,
            city,
            min_rating,
            amenities,
            vibes,
            center,
            radius_km,
            page,
            page_size,
            include,
            issues,
        }
    }
}

/// "Quezon City " -> "quezon_city"
pub fn normalize_city(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn split_list(raw: &str) -> BTreeSet<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    trimmed
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number(
    params: &RawParams,
    aliases: &[&str],
    issues: &mut Vec<ValidationIssue>,
    accept: impl Fn(f64) -> bool,
) -> Option<f64> {
    let (field, raw) = params.get_any(aliases)?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && accept(n) => Some(n),
        Ok(_) => {
            issues.push(issue(field, value, "out of range"));
            None
        }
        Err(_) => {
            issues.push(issue(field, value, "not a number"));
            None
        }
    }
}

fn parse_positive(
    params: &RawParams,
    aliases: &[&str],
    issues: &mut Vec<ValidationIssue>,
) -> Option<usize> {
    let (field, raw) = params.get_any(aliases)?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            issues.push(issue(field, raw, "not a positive integer"));
            None
        }
    }
}

fn parse_include(params: &RawParams, issues: &mut Vec<ValidationIssue>) -> IncludeSet {
    let Some((field, raw)) = params.get_any(&["include"]) else {
        return IncludeSet::default();
    };

    let mut relations = BTreeSet::new();
    for part in split_list(raw) {
        match Relation::parse(&part) {
            Some(relation) => {
                relations.insert(relation);
            }
            None => issues.push(issue(field, &part, "unknown relation")),
        }
    }
    IncludeSet(relations)
}

fn issue(field: &str, value: &str, reason: &str) -> ValidationIssue {
    ValidationIssue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
