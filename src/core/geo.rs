use crate::domain::model::{BoundingBox, GeoPoint, Venue};
use std::cmp::Ordering;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// 每一緯度約 111.32 公里
pub const KM_PER_DEGREE: f64 = 111.32;

pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// 以中心點與半徑算出粗略矩形。
///
/// 靠近極點時 cos(lat) 趨近 0，經度範圍直接放寬到全域；
/// 不處理換日線，跨越 ±180 的矩形會漏掉另一側的店家。
pub fn bounding_box(center: &GeoPoint, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let cos_lat = center.lat.to_radians().cos();

    let (min_lon, max_lon) = if cos_lat.abs() < 1e-9 {
        (-180.0, 180.0)
    } else {
        let lon_delta = radius_km / (KM_PER_DEGREE * cos_lat);
        (center.lng - lon_delta, center.lng + lon_delta)
    };

    BoundingBox {
        min_lat: center.lat - lat_delta,
        max_lat: center.lat + lat_delta,
        min_lon,
        max_lon,
    }
}

#[derive(Debug, Clone)]
pub struct DistancedVenue {
    pub venue: Venue,
    pub distance_km: Option<f64>,
}

/// 計算每間店與中心的距離，有半徑時剔除超出範圍的店家，然後依距離排序。
///
/// 沒有座標的店家距離為 None，不會被半徑剔除，排在所有已知距離之後。
pub fn annotate_and_filter(
    venues: Vec<Venue>,
    center: &GeoPoint,
    radius_km: Option<f64>,
) -> Vec<DistancedVenue> {
    let mut annotated: Vec<DistancedVenue> = venues
        .into_iter()
        .map(|venue| {
            let distance_km = venue.coordinates().map(|point| haversine_km(center, &point));
            DistancedVenue { venue, distance_km }
        })
        .filter(|item| match (radius_km, item.distance_km) {
            (Some(radius), Some(distance)) => distance <= radius,
            _ => true,
        })
        .collect();

    annotated.sort_by(compare_by_distance);
    annotated
}

fn compare_by_distance(a: &DistancedVenue, b: &DistancedVenue) -> Ordering {
    let by_distance = match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    // 同距離：評分高者優先，再依名稱、slug
    by_distance
        .then_with(|| b.venue.rating.total_cmp(&a.venue.rating))
        .then_with(|| a.venue.name.cmp(&b.venue.name))
        .then_with(|| a.venue.slug.cmp(&b.venue.slug))
}
