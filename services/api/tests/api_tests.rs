//! Integration tests for the pantry API.
//!
//! The router is driven in-process with `oneshot`, backed by the in-memory
//! database and a stub label detector.

use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use pantry_core::domain::Label;
use pantry_core::memory::InMemoryDatabase;
use pantry_core::ports::{LabelDetectionService, PortError, PortResult};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "pantry-test-boundary";

//=========================================================================================
// Test Doubles
//=========================================================================================

/// Returns a fixed label list, or fails when told to.
struct StubVision {
    labels: Vec<(&'static str, f32)>,
    fail: AtomicBool,
    calls: AtomicUsize,
    last_image: std::sync::Mutex<Vec<u8>>,
}

impl StubVision {
    fn new(labels: Vec<(&'static str, f32)>) -> Self {
        Self {
            labels,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_image: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LabelDetectionService for StubVision {
    async fn detect_labels(&self, image: &[u8]) -> PortResult<Vec<Label>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image.lock().unwrap() = image.to_vec();
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("vision unavailable".to_string()));
        }
        Ok(self
            .labels
            .iter()
            .map(|(description, confidence)| Label {
                description: description.to_string(),
                confidence: *confidence,
            })
            .collect())
    }
}

struct TestApp {
    router: Router,
    db: Arc<InMemoryDatabase>,
    vision: Arc<StubVision>,
}

fn setup_app_in(upload_dir: &Path, labels: Vec<(&'static str, f32)>) -> TestApp {
    let upload_dir = upload_dir.to_string_lossy().to_string();
    let config = Config::from_lookup(|key| match key {
        "STORAGE_BACKEND" => Some("memory".to_string()),
        "VISION_API_KEY" => Some("test-key".to_string()),
        "UPLOAD_DIR" => Some(upload_dir.clone()),
        _ => None,
    })
    .expect("test config should be valid");

    let db = Arc::new(InMemoryDatabase::new());
    let vision = Arc::new(StubVision::new(labels));
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(config),
        vision: vision.clone(),
    });

    TestApp {
        router: build_router(state),
        db,
        vision,
    }
}

fn setup_app(labels: Vec<(&'static str, f32)>) -> TestApp {
    setup_app_in(&std::env::temp_dir(), labels)
}

//=========================================================================================
// Request Helpers
//=========================================================================================

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Should parse JSON")
}

/// Signs up a fresh account and returns its `session=...` cookie pair.
async fn sign_up(app: &TestApp, email: &str) -> String {
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({ "email": email, "password": "correct horse" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("signup should set a session cookie")
        .to_string()
}

async fn add_item(app: &TestApp, cookie: &str, item: Value) -> Response {
    app.router
        .clone()
        .oneshot(json_request("POST", "/api/inventory/items", item, Some(cookie)))
        .await
        .unwrap()
}

// =============================================================================
// Image Classification
// =============================================================================

#[tokio::test]
async fn classify_rejects_other_methods() {
    let app = setup_app(vec![]);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/classifyImage", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    assert_eq!(app.vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn classify_without_image_field_is_a_bad_request() {
    let app = setup_app(vec![("Fruit", 0.9)]);

    let body = multipart_body("photo", "image.png", b"not the image field");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/classifyImage", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await,
        json!({ "error": "Image file not found" })
    );
    assert_eq!(app.vision.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn classify_returns_labels_and_records_one_audit() {
    let app = setup_app(vec![("Fruit", 0.98), ("Apple", 0.95)]);

    let body = multipart_body("image", "image.png", b"\x89PNG fake bytes");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/classifyImage", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response).await,
        json!({ "labels": ["Fruit", "Apple"] })
    );

    let audit = app.db.audit_records().await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].labels, vec!["Fruit", "Apple"]);
    assert_eq!(
        app.vision.last_image.lock().unwrap().as_slice(),
        b"\x89PNG fake bytes"
    );
}

#[tokio::test]
async fn classify_failure_is_a_server_error_without_audit() {
    let app = setup_app(vec![("Fruit", 0.98)]);
    app.vision.fail.store(true, Ordering::SeqCst);

    let body = multipart_body("image", "image.png", b"bytes");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/classifyImage", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        extract_json(response).await,
        json!({ "error": "Error classifying image" })
    );
    assert!(app.db.audit_records().await.is_empty());
}

#[tokio::test]
async fn classify_survives_audit_failure() {
    let app = setup_app(vec![("Bread", 0.9)]);
    app.db.set_audit_unavailable(true);

    let body = multipart_body("image", "image.png", b"bytes");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/classifyImage", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await, json!({ "labels": ["Bread"] }));
}

#[tokio::test]
async fn classify_with_unparseable_body_is_a_server_error() {
    let app = setup_app(vec![("Fruit", 0.9)]);

    let request = Request::builder()
        .method("POST")
        .uri("/api/classifyImage")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("just text"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        extract_json(response).await,
        json!({ "error": "Error parsing the files" })
    );
}

#[tokio::test]
async fn classify_removes_the_spooled_upload() {
    let upload_dir = tempfile::tempdir().unwrap();
    let app = setup_app_in(upload_dir.path(), vec![("Fruit", 0.9)]);

    let body = multipart_body("image", "image.png", b"bytes");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/classifyImage", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(upload_dir.path()).unwrap().count(), 0);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn inventory_requires_a_session() {
    let app = setup_app(vec![]);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some("session=bogus")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = setup_app(vec![]);
    sign_up(&app, "dup@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            json!({ "email": "dup@example.com", "password": "another" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_and_logout() {
    let app = setup_app(vec![]);
    sign_up(&app, "cook@example.com").await;

    let wrong = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "cook@example.com", "password": "wrong" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": "cook@example.com", "password": "correct horse" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let cookie = ok
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();

    let listed = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);

    let logout = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/auth/logout", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let after = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn adding_twice_increments_quantity() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "apple@example.com").await;

    for _ in 0..2 {
        let response = add_item(&app, &cookie, json!({ "name": "apple", "category": "Food" })).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&cookie)))
        .await
        .unwrap();
    let page = extract_json(response).await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["name"], "apple");
    assert_eq!(page["items"][0]["category"], "Food");
    assert_eq!(page["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn adding_without_category_is_rejected() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "nocat@example.com").await;

    let response = add_item(&app, &cookie, json!({ "name": "thing", "category": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await,
        json!({ "error": "Category is required." })
    );

    let response = add_item(&app, &cookie, json!({ "name": "thing", "category": "Toys" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collections_are_private_to_each_user() {
    let app = setup_app(vec![]);
    let alice = sign_up(&app, "alice@example.com").await;
    let bob = sign_up(&app, "bob@example.com").await;

    add_item(&app, &alice, json!({ "name": "cheese", "category": "Food" })).await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&bob)))
        .await
        .unwrap();
    assert_eq!(extract_json(response).await["total_items"], 0);
}

#[tokio::test]
async fn search_and_category_filter() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "search@example.com").await;
    add_item(&app, &cookie, json!({ "name": "Milk", "category": "Beverage" })).await;
    add_item(&app, &cookie, json!({ "name": "Oatmeal", "category": "Food" })).await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory?search=milk", Some(&cookie)))
        .await
        .unwrap();
    let page = extract_json(response).await;
    assert_eq!(page["filtered_items"], 1);
    assert_eq!(page["total_items"], 2);
    assert_eq!(page["items"][0]["name"], "Milk");

    let response = app
        .router
        .clone()
        .oneshot(empty_request(
            "GET",
            "/api/inventory?category=Food",
            Some(&cookie),
        ))
        .await
        .unwrap();
    let page = extract_json(response).await;
    assert_eq!(page["filtered_items"], 1);
    assert_eq!(page["items"][0]["name"], "Oatmeal");
}

#[tokio::test]
async fn pages_hold_at_most_ten_items() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "pages@example.com").await;
    for i in 0..12 {
        add_item(&app, &cookie, json!({ "name": format!("item-{i:02}"), "category": "Other" })).await;
    }

    let first = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&cookie)))
        .await
        .unwrap();
    let first = extract_json(first).await;
    assert_eq!(first["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["total_pages"], 2);

    let second = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory?page=2", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(extract_json(second).await["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn decrement_and_delete() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "dec@example.com").await;
    add_item(&app, &cookie, json!({ "name": "eggs", "category": "Food" })).await;
    add_item(&app, &cookie, json!({ "name": "eggs", "category": "Food" })).await;
    add_item(&app, &cookie, json!({ "name": "rice", "category": "Food" })).await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/api/inventory/items/eggs/decrement", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = extract_json(response).await;
    assert_eq!(page["items"][0]["name"], "eggs");
    assert_eq!(page["items"][0]["quantity"], 1);

    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/api/inventory/items/eggs/decrement", Some(&cookie)))
        .await
        .unwrap();
    let page = extract_json(response).await;
    assert_eq!(page["total_items"], 1);
    assert_eq!(page["items"][0]["name"], "rice");

    let response = app
        .router
        .clone()
        .oneshot(empty_request("POST", "/api/inventory/items/ghost/decrement", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(empty_request("DELETE", "/api/inventory/items/rice", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(extract_json(response).await["total_items"], 0);
    }
}

#[tokio::test]
async fn edit_keeps_quantity() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "edit@example.com").await;
    for _ in 0..3 {
        add_item(&app, &cookie, json!({ "name": "soap", "category": "Other" })).await;
    }

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/inventory/items/soap",
            json!({
                "name": "soap",
                "category": "Personal Care",
                "description": "lavender",
                "price": "2.50",
                "supplier": "Market"
            }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = extract_json(response).await;
    assert_eq!(page["items"][0]["category"], "Personal Care");
    assert_eq!(page["items"][0]["description"], "lavender");
    assert_eq!(page["items"][0]["quantity"], 3);

    let missing = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/inventory/items/nothing",
            json!({ "name": "nothing", "category": "Other" }),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unavailable_store_rejects_sessions() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "down@example.com").await;

    app.db.set_unavailable(true);
    let response = add_item(&app, &cookie, json!({ "name": "salt", "category": "Food" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(extract_json(response).await, json!({ "error": "Not signed in" }));
}

#[tokio::test]
async fn export_csv_lists_every_item() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "csv@example.com").await;
    add_item(
        &app,
        &cookie,
        json!({ "name": "apple", "category": "Food", "description": "red, crisp", "price": "0.50", "supplier": "Farm" }),
    )
    .await;
    add_item(&app, &cookie, json!({ "name": "water", "category": "Beverage" })).await;

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory/export.csv", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("inventory.csv"));

    let csv = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(
        csv,
        "name,category,description,price,supplier,quantity\n\
         apple,Food,\"red, crisp\",0.50,Farm,1\n\
         water,Beverage,,,,1"
    );
}

#[tokio::test]
async fn capture_adds_item_from_labels() {
    let app = setup_app(vec![("Banana", 0.97), ("Food", 0.91)]);
    let cookie = sign_up(&app, "camera@example.com").await;

    for expected_quantity in 1..=2 {
        let body = multipart_body("image", "image.png", b"photo");
        let response = app
            .router
            .clone()
            .oneshot(multipart_request("/api/inventory/capture", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let capture = extract_json(response).await;
        assert_eq!(capture["labels"], json!(["Banana", "Food"]));
        assert_eq!(capture["item"]["name"], "Banana");
        assert_eq!(capture["item"]["category"], "Food");
        assert_eq!(capture["item"]["description"], "Detected via image capture");
        assert_eq!(capture["item"]["quantity"], expected_quantity);
    }

    assert_eq!(app.db.audit_records().await.len(), 2);
}

#[tokio::test]
async fn capture_with_no_labels_adds_nothing() {
    let app = setup_app(vec![]);
    let cookie = sign_up(&app, "blank@example.com").await;

    let body = multipart_body("image", "image.png", b"photo");
    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/inventory/capture", body, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let listed = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/inventory", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(extract_json(listed).await["total_items"], 0);
}
