// tests/api_tests.rs
use actix_web::{test, web, App};
use async_trait::async_trait;
use predict_console::api::{configure_routes, AppState};
use predict_console::collector::SurfaceKind;
use predict_console::config::AppConfig;
use predict_console::errors::{PredictError, Result};
use predict_console::models::{EncodedPayload, RawResult};
use predict_console::transport::PredictionTransport;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Answers every request with a canned body, or with a backend error.
struct CannedTransport {
    body: Option<Value>,
    calls: Mutex<Vec<EncodedPayload>>,
}

impl CannedTransport {
    fn answering(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn down() -> Arc<Self> {
        Arc::new(Self {
            body: None,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PredictionTransport for CannedTransport {
    async fn predict(&self, payload: &EncodedPayload) -> Result<(RawResult, u64)> {
        self.calls.lock().unwrap().push(payload.clone());
        match &self.body {
            Some(body) => Ok((RawResult::from(body.clone()), 1)),
            None => Err(PredictError::ApiError {
                status: 500,
                message: "model file missing".to_string(),
            }),
        }
    }
}

fn state_with(surface: SurfaceKind, transport: Arc<CannedTransport>) -> AppState {
    let mut config = AppConfig::default();
    config.form.surface = surface;
    AppState::with_transport(config, transport)
}

#[actix_rt::test]
async fn test_health() {
    let state = state_with(SurfaceKind::NumericGrid, CannedTransport::answering(json!({})));
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["busy"], false);
}

#[actix_rt::test]
async fn test_row_management_keeps_one_row() {
    let state = state_with(SurfaceKind::NumericGrid, CannedTransport::answering(json!({})));
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post().uri("/api/v1/rows").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["rows"][1][0], "");
    assert_eq!(body["rows"][0][0], "4.22");

    for _ in 0..3 {
        let req = test::TestRequest::delete().uri("/api/v1/rows/0").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    }
}

#[actix_rt::test]
async fn test_row_changes_keep_unsaved_values() {
    let state = state_with(SurfaceKind::NumericGrid, CannedTransport::answering(json!({})));
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/rows")
        .set_json(json!({"rows": [["9", "8"]]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "9");
    assert_eq!(rows[0][1], "8");
    assert_eq!(rows[0][2], "");
    assert_eq!(rows[1][0], "");

    let req = test::TestRequest::delete()
        .uri("/api/v1/rows/0")
        .set_json(json!({"rows": [["9", "8"], ["7"]]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0][0], "7");

    let req = test::TestRequest::get().uri("/api/v1/form").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rows"][0][0], "7");
}

/// Holds the first request until the test releases it.
struct HeldTransport {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl PredictionTransport for HeldTransport {
    async fn predict(&self, _payload: &EncodedPayload) -> Result<(RawResult, u64)> {
        self.started.notify_one();
        self.release.notified().await;
        Ok((RawResult::from(json!({"predicted_label": "1"})), 1))
    }
}

#[actix_rt::test]
async fn test_refused_submission_leaves_buffer_alone() {
    let transport = Arc::new(HeldTransport {
        started: Notify::new(),
        release: Notify::new(),
    });
    let mut config = AppConfig::default();
    config.form.surface = SurfaceKind::NumericGrid;
    let state = AppState::with_transport(config, transport.clone());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let first = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/predict")
            .set_json(json!({"rows": [["1", "2"]]}))
            .to_request(),
    );
    let second = async {
        transport.started.notified().await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/predict")
                .set_json(json!({"rows": [["7", "7"], ["7", "7"]]}))
                .to_request(),
        )
        .await;
        transport.release.notify_one();
        resp
    };

    let (first, second) = tokio::join!(first, second);
    assert!(first.status().is_success());
    assert_eq!(second.status().as_u16(), 409);

    let req = test::TestRequest::get().uri("/api/v1/form").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0][0], "1");
}

#[actix_rt::test]
async fn test_predict_numeric_grid() {
    let transport = CannedTransport::answering(json!({
        "predictions": ["No or mild OSA", "Moderate to severe OSA"],
        "results": [
            {"value": 0.31, "label": "No or mild OSA", "color": "#28a745"},
            {"value": 0.92, "label": "Moderate to severe OSA", "color": "#dc3545"}
        ],
        "n_rows": 2
    }));
    let state = state_with(SurfaceKind::NumericGrid, transport.clone());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(json!({"rows": [["1", "2"], ["x", "4"]]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["model"]["headline"], "No or mild OSA");
    assert_eq!(body["model"]["headline_class"], "negative");
    assert_eq!(body["view"]["lines"][1]["text"], "Row 2: 0.920 → Moderate to severe OSA");
    assert_eq!(body["view"]["summary"], "2 rows predicted");
    assert_eq!(body["view"]["visible"], true);

    let calls = transport.calls.lock().unwrap();
    let EncodedPayload::NumericMatrix(rows) = &calls[0] else {
        panic!("expected a numeric matrix, got {:?}", calls[0]);
    };
    assert_eq!(rows[0][..2], [1.0, 2.0]);
    assert_eq!(rows[1][0], 0.0);
    assert_eq!(rows[1].len(), 8);

    drop(calls);
    let req = test::TestRequest::get().uri("/api/v1/result").to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["badge_text"], "No or mild OSA");
}

#[actix_rt::test]
async fn test_empty_text_is_a_bad_request() {
    let transport = CannedTransport::answering(json!({}));
    let state = state_with(SurfaceKind::TextArea, transport.clone());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(json!({"text": "  \n "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No input data provided");
    assert!(transport.calls.lock().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/api/v1/result").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 204);
}

#[actix_rt::test]
async fn test_backend_failure_renders_error_view() {
    let state = state_with(SurfaceKind::CsvGrid, CannedTransport::down());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(json!({"rows": [["1,5", "2"]]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["model"]["is_error"], true);
    assert_eq!(body["view"]["subtitle"], "model file missing");
    assert_eq!(body["view"]["badge_text"], "--");
    assert_eq!(body["view"]["lines"].as_array().unwrap().len(), 0);
    assert_eq!(body["view"]["visible"], true);
}

#[actix_rt::test]
async fn test_form_fields_are_sent_as_map() {
    let transport = CannedTransport::answering(json!({"predicted": "positive", "score": 0.81}));
    let state = state_with(SurfaceKind::Form, transport.clone());
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/predict")
        .set_json(json!({"fields": {"Age": "21", "BMI": "23.4"}}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["model"]["headline"], "Abnormal");
    assert_eq!(body["model"]["subtitle"], "Score: 0.810");

    let calls = transport.calls.lock().unwrap();
    let EncodedPayload::FieldMap(fields) = &calls[0] else {
        panic!("expected a field map, got {:?}", calls[0]);
    };
    assert_eq!(fields.get("BMI").map(String::as_str), Some("23.4"));
}
