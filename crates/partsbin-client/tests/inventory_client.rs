//! Integration tests for `InventoryClient`.
//!
//! Each test stands up a wiremock server playing the inventory API (and, for
//! direct image fetches, a second server playing a remote image host).

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partsbin_client::{ClientError, FetchedImage, InventoryClient};
use partsbin_core::{ProxyPolicy, QuickAddRequest, SpecDataType};

/// No retries, always-proxy policy.
fn test_client(server: &MockServer) -> InventoryClient {
    InventoryClient::new(
        &format!("{}/api", server.uri()),
        5,
        "partsbin-test/0.1",
        0,
        0,
        ProxyPolicy::Always,
        &[],
    )
    .expect("failed to build test InventoryClient")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> InventoryClient {
    InventoryClient::new(
        &format!("{}/api", server.uri()),
        5,
        "partsbin-test/0.1",
        max_retries,
        0,
        ProxyPolicy::Always,
        &[],
    )
    .expect("failed to build test InventoryClient")
}

fn sample_request() -> QuickAddRequest {
    QuickAddRequest {
        part_number: "NE555P".to_string(),
        name: "Precision timer".to_string(),
        description: None,
        manufacturer: Some("Texas Instruments".to_string()),
        datasheet_url: None,
        specs: None,
        location_id: 3,
        quantity: 0,
        minimum_quantity: 1,
        unit_price: None,
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_parts_sends_query_and_parses_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .and(query_param("q", "555 timer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "mpn": "NE555P",
                "manufacturer": "Texas Instruments",
                "shortDescription": "Precision timer",
                "datasheetUrl": "https://www.ti.com/lit/ds/symlink/ne555.pdf",
                "category": "Timers",
                "specs": ["Supply Voltage: 4.5V to 16V", "Package: PDIP-8"]
            },
            { "mpn": "LM555CN", "specs": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = test_client(&server).search_parts("555 timer").await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].mpn, "NE555P");
    assert_eq!(candidates[0].specs[1], "Package: PDIP-8");
    assert!(candidates[1].short_description.is_none());
}

#[tokio::test]
async fn search_parts_surfaces_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({ "error": "Part search is temporarily unavailable" })),
        )
        .mount(&server)
        .await;

    let err = test_client(&server).search_parts("NE555").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 503, .. }), "got {err:?}");
    assert_eq!(err.to_string(), "Part search is temporarily unavailable");
}

#[tokio::test]
async fn search_parts_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "mpn": "BC547" }])))
        .mount(&server)
        .await;

    let candidates = test_client_with_retries(&server, 2)
        .search_parts("BC547")
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].mpn, "BC547");
}

#[tokio::test]
async fn rate_limit_carries_retry_after_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_json(json!({ "error": "Too many searches" })),
        )
        .mount(&server)
        .await;

    let err = test_client(&server).search_parts("NE555").await.unwrap_err();

    assert!(
        matches!(
            err,
            ClientError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(7)
        ),
        "got {err:?}"
    );
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.to_string(), "Too many searches");
}

#[tokio::test]
async fn rate_limited_search_waits_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "mpn": "LM358N" }])))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = test_client_with_retries(&server, 1)
        .search_parts("LM358")
        .await
        .unwrap();

    assert_eq!(candidates[0].mpn, "LM358N");
}

#[tokio::test]
async fn search_parts_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\":\"a list\"}"))
        .mount(&server)
        .await;

    let err = test_client(&server).search_parts("x").await.unwrap_err();
    assert!(matches!(err, ClientError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn search_images_parses_suggestions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parts-search/images"))
        .and(query_param("q", "NE555P"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "url": "https://upload.wikimedia.org/ne555.jpg",
                "thumbnailUrl": "https://upload.wikimedia.org/thumb/ne555.jpg",
                "description": "NE555 in DIP-8"
            },
            { "url": "https://example.com/chip.png" }
        ])))
        .mount(&server)
        .await;

    let images = test_client(&server).search_images("NE555P").await.unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(
        images[0].display_source(),
        "https://upload.wikimedia.org/thumb/ne555.jpg"
    );
    assert_eq!(images[1].display_source(), "https://example.com/chip.png");
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_locations_parses_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Drawer A1" },
            { "id": 2, "name": "Shelf B", "description": "Top shelf" }
        ])))
        .mount(&server)
        .await;

    let locations = test_client(&server).list_locations().await.unwrap();
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[1].description.as_deref(), Some("Top shelf"));
}

#[tokio::test]
async fn list_spec_definitions_sorts_by_display_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/spec-definitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "name": "Package", "dataType": "SELECT", "options": ["DIP-8", "SOIC-8"], "displayOrder": 2 },
            { "id": 1, "name": "Voltage", "dataType": "NUMBER", "unit": "V,mV", "displayOrder": 1 },
            { "id": 3, "name": "Automotive", "dataType": "BOOLEAN", "displayOrder": 2 }
        ])))
        .mount(&server)
        .await;

    let defs = test_client(&server).list_spec_definitions().await.unwrap();

    let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Voltage", "Automotive", "Package"]);
    assert_eq!(defs[0].data_type, SpecDataType::Number);
    assert_eq!(defs[2].options, vec!["DIP-8", "SOIC-8"]);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quick_add_posts_payload_with_null_price() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/parts/quick-add"))
        .and(body_json(json!({
            "partNumber": "NE555P",
            "name": "Precision timer",
            "manufacturer": "Texas Instruments",
            "locationId": 3,
            "quantity": 0,
            "minimumQuantity": 1,
            "unitPrice": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "part": { "id": 42, "partNumber": "NE555P", "name": "Precision timer", "createdAt": "2025-01-01T00:00:00" },
            "stockEntry": { "id": 7, "partId": 42, "locationId": 3, "quantity": 0, "minimumQuantity": 1, "lowStock": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = test_client(&server).quick_add(&sample_request()).await.unwrap();

    assert_eq!(created.part.id, 42);
    assert_eq!(created.stock_entry.id, 7);
}

#[tokio::test]
async fn quick_add_sends_price_as_number() {
    let server = MockServer::start().await;
    let mut request = sample_request();
    request.unit_price = Some(Decimal::from_str("1.5").unwrap());

    Mock::given(method("POST"))
        .and(path("/api/parts/quick-add"))
        .and(body_json(json!({
            "partNumber": "NE555P",
            "name": "Precision timer",
            "manufacturer": "Texas Instruments",
            "locationId": 3,
            "quantity": 0,
            "minimumQuantity": 1,
            "unitPrice": 1.5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "part": { "id": 1, "partNumber": "NE555P", "name": "Precision timer" },
            "stockEntry": { "id": 1, "partId": 1, "locationId": 3, "quantity": 0, "minimumQuantity": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server).quick_add(&request).await.unwrap();
}

#[tokio::test]
async fn quick_add_is_not_retried_and_reports_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/parts/quick-add"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "error": "Part number already exists: NE555P" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client_with_retries(&server, 3)
        .quick_add(&sample_request())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.to_string(), "Part number already exists: NE555P");
}

// ---------------------------------------------------------------------------
// Image fetch + upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_image_through_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/image-proxy"))
        .and(query_param("url", "https://upload.wikimedia.org/ne555.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let fetch_url = client
        .resolver()
        .resolve("https://upload.wikimedia.org/ne555.jpg");
    let image = client.fetch_image(&fetch_url).await.unwrap();

    assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(image.content_type, "image/jpeg");
}

#[tokio::test]
async fn fetch_image_direct_sends_browser_headers() {
    let api = MockServer::start().await;
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/chip.png"))
        .and(header("referer", format!("{}/", origin.uri()).as_str()))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .expect(1)
        .mount(&origin)
        .await;

    let image = test_client(&api)
        .fetch_image(&format!("{}/img/chip.png", origin.uri()))
        .await
        .unwrap();

    assert_eq!(image.content_type, "image/png");
    assert_eq!(image.bytes.len(), 4);
}

#[tokio::test]
async fn fetch_image_rejects_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/image-proxy"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let fetch_url = client.resolver().resolve("https://example.com/gone.png");
    let err = client.fetch_image(&fetch_url).await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyBody { .. }), "got {err:?}");
}

#[tokio::test]
async fn fetch_image_surfaces_proxy_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/image-proxy"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_json(json!({ "message": "Failed to fetch image: 403 Forbidden" })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let fetch_url = client.resolver().resolve("https://example.com/hotlink.png");
    let err = client.fetch_image(&fetch_url).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch image: 403 Forbidden");
}

#[tokio::test]
async fn upload_image_posts_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/parts/42/images"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5, "partId": 42, "displayOrder": 0, "createdAt": "2025-06-01T12:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stored = test_client(&server)
        .upload_image(
            42,
            FetchedImage {
                bytes: vec![1, 2, 3],
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(stored.id, 5);
    assert_eq!(stored.part_id, 42);

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(
        content_type.starts_with("multipart/form-data"),
        "expected multipart upload, got {content_type}"
    );
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""), "missing file field: {body}");
    assert!(body.contains("filename=\"image.png\""), "missing filename: {body}");
}

#[tokio::test]
async fn upload_image_reports_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/parts/42/images"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "error": "Maximum of 5 images per part" })),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .upload_image(
            42,
            FetchedImage {
                bytes: vec![1],
                content_type: "image/png".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Maximum of 5 images per part");
}
