mod common;

use common::{monday_morning, north_of, seeded_config, venue, CountingStore, MANILA};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;
use venue_discovery::core::geo::haversine_km;
use venue_discovery::domain::model::{GeoPoint, Tag, VenueStatus};
use venue_discovery::{ApiResponse, DiscoveryConfig, DiscoveryError, DiscoveryService, RawParams};

fn geo_params(center: &GeoPoint, radius_km: Option<&str>) -> RawParams {
    let mut params = RawParams::from_pairs([
        ("lat", center.lat.to_string()),
        ("lng", center.lng.to_string()),
    ]);
    if let Some(radius) = radius_km {
        params.insert("radiusKm", radius);
    }
    params
}

#[tokio::test]
async fn test_manila_radius_search() {
    let mut a = venue("near-a", Some(north_of(&MANILA, 1.0)), 4.5);
    a.name = "A".to_string();
    let b = venue("far-b", Some(north_of(&MANILA, 5.0)), 4.9);

    let store = CountingStore::new(vec![a, b]);
    let service =
        DiscoveryService::new(store, DiscoveryConfig::default()).with_clock(monday_morning());

    let result = service.search_params(&geo_params(&MANILA, Some("3"))).await.unwrap();

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.page_info.total, 1);
    let item = &result.items[0];
    assert_eq!(item.slug, "near-a");
    let distance = item.distance_km.flatten().unwrap();
    assert!((distance - 1.0).abs() < 0.01, "distance was {}", distance);
    // 星期一 08:00-17:00，馬尼拉時間 10:00
    assert!(item.is_open);
}

#[tokio::test]
async fn test_geo_results_are_ordered_and_unknown_location_last() {
    let venues = vec![
        venue("two-km", Some(north_of(&MANILA, 2.0)), 3.0),
        venue("unknown", None, 5.0),
        venue("half-km", Some(north_of(&MANILA, 0.5)), 4.0),
        venue("one-km", Some(north_of(&MANILA, 1.0)), 2.0),
    ];
    let service = DiscoveryService::new(CountingStore::new(venues), DiscoveryConfig::default());

    let result = service.search_params(&geo_params(&MANILA, Some("10"))).await.unwrap();
    let slugs: Vec<&str> = result.items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["half-km", "one-km", "two-km", "unknown"]);

    let distances: Vec<f64> = result.items[..3]
        .iter()
        .map(|i| i.distance_km.flatten().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));

    let json = serde_json::to_value(&result.items[3]).unwrap();
    assert!(json["distanceKm"].is_null());
    assert!(json.as_object().unwrap().contains_key("distanceKm"));
}

#[tokio::test]
async fn test_distance_matches_haversine() {
    let coords = (14.6091, 121.0223);
    let service = DiscoveryService::new(
        CountingStore::new(vec![venue("cubao", Some(coords), 4.0)]),
        DiscoveryConfig::default(),
    );

    let result = service.search_params(&geo_params(&MANILA, None)).await.unwrap();
    let expected = haversine_km(&MANILA, &GeoPoint::new(coords.0, coords.1));
    let actual = result.items[0].distance_km.flatten().unwrap();
    assert!((actual - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_non_geo_search_paginates_and_hides_pending() {
    let mut venues: Vec<_> = (0..5)
        .map(|i| venue(&format!("shop-{}", i), None, 4.0))
        .collect();
    let mut pending = venue("secret", None, 5.0);
    pending.status = VenueStatus::Pending;
    venues.push(pending);

    let store = CountingStore::new(venues);
    let service = DiscoveryService::new(store.clone(), DiscoveryConfig::default());

    let params = RawParams::from_pairs([("page", "2"), ("limit", "2")]);
    let result = service.search_params(&params).await.unwrap();

    assert_eq!(result.page_info.total, 5);
    assert_eq!(result.page_info.total_pages, 3);
    assert_eq!(result.items.len(), 2);
    assert!(result.items.iter().all(|i| i.distance_km.is_none()));
    assert!(result.items.iter().all(|i| i.slug != "secret"));
    assert_eq!(store.counts.load(Ordering::SeqCst), 1);
    assert_eq!(store.fetch_count(), 1);

    let response = ApiResponse::from_search(result);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["isSuccess"], true);
    assert_eq!(json["pageInfo"]["page"], 2);
}

#[tokio::test]
async fn test_invalid_params_are_downgraded_not_rejected() {
    let venues = vec![venue("a", None, 4.0), venue("b", None, 2.0)];
    let service = DiscoveryService::new(CountingStore::new(venues), DiscoveryConfig::default());

    let params = RawParams::from_pairs([
        ("minRating", "abc"),
        ("lat", "999"),
        ("lng", "120.9"),
        ("page", "-3"),
    ]);
    let result = service.search_params(&params).await.unwrap();

    // 無效評分被忽略，無效緯度讓整個地理條件失效
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.page_info.page, 1);
    assert!(result.items.iter().all(|i| i.distance_km.is_none()));
}

#[tokio::test]
async fn test_amenity_filter_is_any_of() {
    let mut wifi = venue("wifi-only", None, 4.0);
    wifi.amenities = vec![Tag::new("wifi")];
    let mut parking = venue("parking-only", None, 4.0);
    parking.amenities = vec![Tag::new("parking")];
    let plain = venue("plain", None, 4.0);

    let service = DiscoveryService::new(
        CountingStore::new(vec![wifi, parking, plain]),
        DiscoveryConfig::default(),
    );

    let params = RawParams::from_pairs([("amenities", "WiFi, parking")]);
    let result = service.search_params(&params).await.unwrap();
    let mut slugs: Vec<&str> = result.items.iter().map(|i| i.slug.as_str()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["parking-only", "wifi-only"]);

    // 用設施過濾時列表會帶出設施 value
    let json = serde_json::to_value(&result.items).unwrap();
    for item in json.as_array().unwrap() {
        assert_eq!(item["amenities"].as_array().unwrap().len(), 1);
        assert!(item.get("vibes").is_none());
    }
}

#[tokio::test]
async fn test_include_selector_controls_relations() {
    let mut v = venue("kape", None, 4.0);
    v.payment_methods = vec!["gcash".to_string()];
    let service = DiscoveryService::new(CountingStore::new(vec![v]), DiscoveryConfig::default());

    let plain = service.search_params(&RawParams::new()).await.unwrap();
    assert!(plain.items[0].opening_hours.is_none());
    assert!(plain.items[0].payment_methods.is_none());
    assert!(plain.items[0].amenities.is_none());

    let city = service
        .search_params(&RawParams::from_pairs([("include", "city")]))
        .await
        .unwrap();
    assert_eq!(city, plain);

    let params = RawParams::from_pairs([("include", "openingHours,paymentMethods")]);
    let rich = service.search_params(&params).await.unwrap();
    assert_eq!(rich.items[0].payment_methods.as_deref(), Some(&["Gcash".to_string()][..]));
    let hours = rich.items[0].opening_hours.as_ref().unwrap();
    assert_eq!(hours[0].open.as_deref(), Some("8:00 AM"));
}

#[tokio::test]
async fn test_get_by_slug() {
    let mut pending = venue("quiet-corner", Some((14.6, 121.0)), 3.5);
    pending.status = VenueStatus::Pending;
    let service = DiscoveryService::new(
        CountingStore::new(vec![pending]),
        DiscoveryConfig::default(),
    )
    .with_clock(monday_morning());

    // 單筆查詢不看狀態
    let detail = service.get_by_slug("quiet-corner").await.unwrap();
    assert_eq!(detail.latitude, Some(14.6));
    assert!(detail.is_open);

    let err = service.get_by_slug("nowhere").await.unwrap_err();
    assert!(matches!(err, DiscoveryError::NotFound { .. }));
    assert_eq!(err.status_code(), 404);

    let err = service.get_by_slug("   ").await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_store_failure_surfaces_and_is_not_cached() {
    let store = CountingStore::new(vec![venue("a", None, 4.0)]).failing();
    let service = DiscoveryService::new(store, DiscoveryConfig::default());

    let err = service.search_params(&RawParams::new()).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Store { .. }));
    assert_eq!(err.status_code(), 500);
    // 不洩漏內部細節
    assert!(!err.user_friendly_message().contains("5432"));
    assert!(service.cache().is_empty());

    let err = service.get_by_slug("a").await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(service.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let mut config = DiscoveryConfig::default();
    config.service.store_timeout_ms = 50;
    let store = CountingStore::new(vec![venue("a", None, 4.0)]).slow(Duration::from_secs(1));
    let service = DiscoveryService::new(store, config);

    let err = service.search_params(&RawParams::new()).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::StoreTimeout { timeout_ms: 50 }));
    assert_eq!(err.status_code(), 504);

    let err = service
        .suggest_params(&RawParams::new(), Some(3))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_suggest_edge_counts() {
    let venues = vec![
        venue("a", None, 4.0),
        venue("b", None, 3.0),
        venue("c", None, 0.0),
    ];
    let store = CountingStore::new(venues);
    let service = DiscoveryService::new(store.clone(), seeded_config(7));

    let none = service.suggest_params(&RawParams::new(), Some(0)).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(store.fetch_count(), 0);

    let all = service.suggest_params(&RawParams::new(), Some(10)).await.unwrap();
    let mut slugs: Vec<&str> = all.iter().map(|s| s.slug.as_str()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["a", "b", "c"]);

    // 預設數量 6 大於候選數
    let defaulted = service.suggest_params(&RawParams::new(), None).await.unwrap();
    assert_eq!(defaulted.len(), 3);
}

#[tokio::test]
async fn test_suggest_fills_from_city_fallback() {
    let mut wifi = venue("wifi-spot", None, 4.0);
    wifi.amenities = vec![Tag::new("wifi")];
    let other = venue("plain-spot", None, 3.0);
    let mut elsewhere = venue("cebu-spot", None, 5.0);
    elsewhere.city = "cebu".to_string();
    let mut pending = venue("pending-spot", None, 5.0);
    pending.status = VenueStatus::Pending;

    let store = CountingStore::new(vec![wifi, other, elsewhere, pending]);
    let service = DiscoveryService::new(store.clone(), seeded_config(11));

    let params = RawParams::from_pairs([("city", "Manila"), ("amenities", "wifi")]);
    let picks = service.suggest_params(&params, Some(3)).await.unwrap();

    let slugs: Vec<&str> = picks.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs.len(), 2);
    assert_eq!(slugs[0], "wifi-spot");
    assert_eq!(slugs[1], "plain-spot");
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_suggest_prefers_higher_rating() {
    let venues = vec![venue("high", None, 5.0), venue("low", None, 1.0)];
    let service = DiscoveryService::new(CountingStore::new(venues), seeded_config(42));

    let mut seen: HashMap<String, usize> = HashMap::new();
    for _ in 0..2000 {
        let picks = service.suggest_params(&RawParams::new(), Some(1)).await.unwrap();
        *seen.entry(picks[0].slug.clone()).or_default() += 1;
    }

    let high = seen["high"] as f64 / 2000.0;
    // 期望值 5.1 / 6.2 ≈ 0.82
    assert!((0.75..0.90).contains(&high), "high picked {:.3}", high);
    assert!(seen["low"] > 0);
}

#[tokio::test]
async fn test_near_midpoint() {
    let first = GeoPoint::new(14.55, 120.98);
    let second = GeoPoint::new(14.65, 120.98);
    let center = first.midpoint(&second);

    let venues = vec![
        venue("middle", Some(north_of(&center, 0.2)), 3.0),
        venue("edge", Some(north_of(&center, 1.5)), 5.0),
        venue("too-far", Some(north_of(&center, 8.0)), 5.0),
    ];
    let service = DiscoveryService::new(CountingStore::new(venues), DiscoveryConfig::default());

    let picks = service.near_midpoint(first, second, 2.0).await.unwrap();
    let slugs: Vec<&str> = picks.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(slugs, vec!["middle", "edge"]);

    let err = service
        .near_midpoint(GeoPoint::new(95.0, 0.0), second, 2.0)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = service.near_midpoint(first, second, 0.0).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_bundled_catalogue_and_config_load() {
    let root = env!("CARGO_MANIFEST_DIR");
    let config = DiscoveryConfig::from_file(format!("{}/config/discovery.toml", root)).unwrap();
    let store =
        venue_discovery::InMemoryVenueStore::from_file(format!("{}/data/venues.json", root))
            .unwrap();
    assert_eq!(store.len(), 4);

    let service = DiscoveryService::new(store, config).with_clock(monday_morning());
    let result = service
        .search_params(&RawParams::from_pairs([("amenities", "wifi")]))
        .await
        .unwrap();
    let slugs: Vec<&str> = result.items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["brew-lab", "kape-tayo"]);

    // 待審核的店家仍可用 slug 查到
    let detail = service.get_by_slug("soft-opening-cafe").await.unwrap();
    assert_eq!(detail.rating, 0.0);
}
