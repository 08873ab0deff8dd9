//! API integration tests.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use image::{Rgb, RgbImage};
use tower::ServiceExt;

use chrono::Utc;
use nscan_api::{create_router, ApiConfig, AppState};
use nscan_models::PatientRecord;
use nscan_classify::{ClassProbabilities, Classifier, ClassifyResult, TumorModel};
use nscan_store::RecordStore;

const BOUNDARY: &str = "nscan-test-boundary";

/// Stub model returning a fixed probability pair.
struct StubModel(ClassProbabilities);

impl TumorModel for StubModel {
    fn infer(&self, _region: &RgbImage) -> ClassifyResult<ClassProbabilities> {
        Ok(self.0)
    }
}

async fn test_app(negative: f32, positive: f32) -> Router {
    let (app, _store) = test_app_with_store(negative, positive).await;
    app
}

/// Like [`test_app`], but keeps a handle on the record store so a test can
/// manipulate it behind the handlers' backs.
async fn test_app_with_store(negative: f32, positive: f32) -> (Router, RecordStore) {
    let store = RecordStore::connect("sqlite::memory:").await.unwrap();
    let classifier = Classifier::new(Arc::new(StubModel(ClassProbabilities::new(
        negative, positive,
    ))));
    let state = AppState::with_parts(ApiConfig::default(), store.clone(), classifier);
    (create_router(state), store)
}

fn png_bytes(image: RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .unwrap();
    buf
}

fn black_scan() -> Vec<u8> {
    png_bytes(RgbImage::from_pixel(64, 64, Rgb([0, 0, 0])))
}

fn scan_with_bright_disc() -> Vec<u8> {
    let mut image = RgbImage::from_pixel(96, 96, Rgb([0, 0, 0]));
    for y in 0..96i32 {
        for x in 0..96i32 {
            let (dx, dy) = (x - 48, y - 48);
            if dx * dx + dy * dy <= 20 * 20 {
                image.put_pixel(x as u32, y as u32, Rgb([200, 200, 200]));
            }
        }
    }
    png_bytes(image)
}

fn full_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Jane Doe"),
        ("phn", "555-0100"),
        ("age", "42"),
        ("bloodType", "O+"),
    ]
}

fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Body {
    let mut body: Vec<u8> = Vec::new();
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn predict_request(body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Scenario A: an all-black scan has no candidate region and always gets
/// the fixed negative verdict, no matter what the model would say.
#[tokio::test]
async fn all_black_scan_is_negative_with_full_confidence() {
    // Model biased positive on purpose; it must never be consulted.
    let app = test_app(0.0, 1.0).await;

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["patient_id"], "P_01");
    assert_eq!(json["prediction"], "Tumor -ve");
    assert_eq!(json["confidence"], "100.00%");
    assert_eq!(json["name"], "Jane Doe");
    assert_eq!(json["phone"], "555-0100");
    assert_eq!(json["age"], "42");
    assert_eq!(json["blood_type"], "O+");
    assert!(json.get("warning").is_none());
}

/// Scenario B: missing file part.
#[tokio::test]
async fn missing_file_part_is_rejected() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(predict_request(multipart_body(None, &full_fields())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("", &black_scan())),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "No selected file");
}

/// Scenario C: blank metadata field.
#[tokio::test]
async fn blank_name_field_is_rejected() {
    let app = test_app(0.5, 0.5).await;

    let fields = [
        ("name", "   "),
        ("phn", "555-0100"),
        ("age", "42"),
        ("bloodType", "O+"),
    ];
    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &fields,
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "All patient information fields are required");
}

#[tokio::test]
async fn absent_metadata_field_is_rejected() {
    let app = test_app(0.5, 0.5).await;

    let fields = [("name", "Jane Doe"), ("phn", "555-0100"), ("age", "42")];
    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &fields,
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "All patient information fields are required");
}

/// Scenario D: bytes that do not decode as an image.
#[tokio::test]
async fn undecodable_upload_is_rejected() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", b"this is not an image")),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid image format");
}

/// Scenario E: a bright region is localized and the model's verdict is
/// returned.
#[tokio::test]
async fn bright_region_is_classified_by_the_model() {
    let app = test_app(0.2, 0.8).await;

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &scan_with_bright_disc())),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["prediction"], "Tumor +ve");
    assert_eq!(json["confidence"], "80.00%");
}

#[tokio::test]
async fn negative_majority_verdict_reports_negative_confidence() {
    let app = test_app(0.97, 0.03).await;

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &scan_with_bright_disc())),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["prediction"], "Tumor -ve");
    assert_eq!(json["confidence"], "97.00%");
}

#[tokio::test]
async fn identifiers_are_sequential_across_requests() {
    let app = test_app(0.5, 0.5).await;

    for expected in ["P_01", "P_02", "P_03"] {
        let response = app
            .clone()
            .oneshot(predict_request(multipart_body(
                Some(("scan.png", &black_scan())),
                &full_fields(),
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["patient_id"], expected);
    }
}

#[tokio::test]
async fn successful_prediction_is_persisted_and_fetchable() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .clone()
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &full_fields(),
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/patients/P_01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["patient_id"], "P_01");
    assert_eq!(json["name"], "Jane Doe");
    assert_eq!(json["age"], 42);
    assert_eq!(json["tumor_result"], "Tumor -ve");
    assert_eq!(json["confidence_score"], "100.00%");
}

/// A record that cannot be written must not fail the request: the verdict
/// still comes back with 200, flagged by the warning field.
#[tokio::test]
async fn persistence_failure_yields_verdict_with_warning() {
    let (app, store) = test_app_with_store(0.5, 0.5).await;

    // Occupy P_01 behind the handler's back so its insert collides.
    store
        .insert_record(&PatientRecord {
            patient_id: "P_01".to_string(),
            name: "Someone Else".to_string(),
            phone: "555-0199".to_string(),
            age: 30,
            blood_type: "A-".to_string(),
            tumor_result: "Tumor -ve".to_string(),
            confidence_score: "100.00%".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &full_fields(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["patient_id"], "P_01");
    assert_eq!(json["prediction"], "Tumor -ve");
    assert_eq!(
        json["warning"],
        "classification completed but record was not saved"
    );
}

#[tokio::test]
async fn unknown_patient_is_not_found() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/patients/P_404")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Patient not found");
}

/// The original pipeline treats a non-numeric age as an unanticipated
/// fault, not a validation error.
#[tokio::test]
async fn non_numeric_age_is_an_internal_error() {
    let app = test_app(0.5, 0.5).await;

    let fields = [
        ("name", "Jane Doe"),
        ("phn", "555-0100"),
        ("age", "forty-two"),
        ("bloodType", "O+"),
    ];
    let response = app
        .oneshot(predict_request(multipart_body(
            Some(("scan.png", &black_scan())),
            &fields,
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Internal server error");
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-Request-ID"));
    assert!(response.headers().contains_key("X-Content-Type-Options"));
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn ready_endpoint_pings_the_store() {
    let app = test_app(0.5, 0.5).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["database"], "ok");
}
