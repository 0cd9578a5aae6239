//! HttpBackend against stub endpoints served on an ephemeral port

use ag_client::{Backend, ClientConfig, FetchError, HttpBackend};
use ag_core::contract::{AnalysisStatus, AnalyzeImageRequest, PersistAnalysisRequest, SignInRequest};
use ag_core::{conform_insert, NewDiseaseReport, NewUserFeedback, ReportSeverity};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Seen = Arc<Mutex<Vec<(String, Value)>>>;

fn record(seen: &Seen, path: &str, body: Value) {
    seen.lock().unwrap().push((path.to_string(), body));
}

async fn sign_in(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/api/auth/signin", body);
    (
        [(header::SET_COOKIE, "aloeguard.sid=s3cret; Path=/")],
        Json(json!({ "id": 7, "username": "fern", "firstName": "Fern" })),
    )
}

async fn current_user(headers: HeaderMap) -> impl IntoResponse {
    let signed_in = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("aloeguard.sid=s3cret"))
        .unwrap_or(false);
    if signed_in {
        (StatusCode::OK, Json(json!({ "id": 7, "username": "fern" })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated" })),
        )
    }
}

async fn analyze(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    record(&seen, "/api/analyze-image", body);
    Json(json!({
        "diagnosis": "Aloe Rust",
        "confidence": 87.4,
        "status": "warning",
        "notes": "Remove affected leaves",
    }))
}

async fn persist(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/api/plant-analysis", body);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "database unavailable" })),
    )
}

async fn analyses(Path(user_id): Path<i64>) -> Json<Value> {
    Json(json!([{
        "id": 11,
        "userId": user_id,
        "imagePath": "aloe.jpg",
        "diagnosis": "Healthy",
        "confidence": 94,
        "isHealthy": true,
        "createdAt": "2024-06-11T09:00:00Z",
    }]))
}

async fn create_report(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/api/disease-reports", body.clone());
    match conform_insert::<NewDiseaseReport>(&body) {
        Ok(report) => (
            StatusCode::CREATED,
            Json(json!({
                "id": 3,
                "userId": report.user_id,
                "location": report.location,
                "disease": report.disease,
                "severity": report.severity,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        ),
    }
}

async fn list_reports() -> &'static str {
    "<html>not json</html>"
}

async fn feedback(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    record(&seen, "/api/feedback", body.clone());
    match conform_insert::<NewUserFeedback>(&body) {
        Ok(fb) => (
            StatusCode::OK,
            Json(json!({
                "id": 1,
                "userId": fb.user_id,
                "analysisId": fb.analysis_id,
                "rating": fb.rating,
                "comment": fb.comment,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        ),
    }
}

async fn stalled() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "{}"
}

async fn serve() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/user", get(current_user))
        .route("/api/auth/signout", post(stalled))
        .route("/api/analyze-image", post(analyze))
        .route("/api/plant-analysis", post(persist))
        .route("/api/plant-analysis/user/:user_id", get(analyses))
        .route("/api/disease-reports", get(list_reports).post(create_report))
        .route("/api/feedback", post(feedback))
        .with_state(Arc::clone(&seen));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

fn backend(base_url: &str, timeout_secs: u64) -> HttpBackend {
    HttpBackend::new(&ClientConfig {
        base_url: base_url.to_string(),
        timeout_secs,
        user_agent: "aloeguard-tests".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_sign_in_cookie_carries_session() {
    let (url, seen) = serve().await;
    let client = backend(&url, 5);

    assert!(client.current_user().await.unwrap_err().is_unauthorized());

    let request = SignInRequest {
        username: "fern".to_string(),
        password: "succulent".to_string(),
    };
    let profile = client.sign_in(&request).await.unwrap();
    assert_eq!(profile.id, 7);
    assert_eq!(profile.first_name.as_deref(), Some("Fern"));

    let (path, body) = seen.lock().unwrap()[0].clone();
    assert_eq!(path, "/api/auth/signin");
    assert_eq!(body, json!({ "username": "fern", "password": "succulent" }));

    assert_eq!(client.current_user().await.unwrap().username, "fern");
}

#[tokio::test]
async fn test_analyze_then_persist_failure() {
    let (url, seen) = serve().await;
    let client = backend(&url, 5);

    let analysis = client
        .analyze_image(&AnalyzeImageRequest {
            image_name: "aloe.jpg".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(analysis.status, AnalysisStatus::Warning);
    assert_eq!(analysis.rounded_confidence(), 87);

    let persist = PersistAnalysisRequest::from_diagnosis(7, "aloe.jpg", &analysis);
    match client.persist_analysis(&persist).await {
        Err(FetchError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {:?}", other),
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], ("/api/analyze-image".to_string(), json!({ "imageName": "aloe.jpg" })));
    assert_eq!(seen[1].0, "/api/plant-analysis");
    assert_eq!(seen[1].1["userId"], 7);
    assert_eq!(seen[1].1["imagePath"], "aloe.jpg");
    assert_eq!(seen[1].1["status"], "warning");
}

#[tokio::test]
async fn test_list_analyses_path() {
    let (url, _) = serve().await;
    let analyses = backend(&url, 5).list_analyses(42).await.unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].user_id, 42);
    assert!(analyses[0].is_healthy);
}

#[tokio::test]
async fn test_insert_bodies_conform() {
    let (url, _) = serve().await;
    let client = backend(&url, 5);

    let feedback = client
        .submit_feedback(&NewUserFeedback {
            user_id: 7,
            analysis_id: 11,
            rating: 5,
            comment: Some("Accurate".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(feedback.analysis_id, 11);
    assert_eq!(feedback.comment.as_deref(), Some("Accurate"));

    let report = client
        .create_disease_report(&NewDiseaseReport {
            user_id: 7,
            location: "Kitale".to_string(),
            disease: "Leaf Spot".to_string(),
            severity: ReportSeverity::Low,
            description: None,
            latitude: None,
            longitude: None,
        })
        .await
        .unwrap();
    assert_eq!(report.severity, ReportSeverity::Low);
}

#[tokio::test]
async fn test_undecodable_body() {
    let (url, _) = serve().await;
    assert!(matches!(
        backend(&url, 5).list_disease_reports().await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn test_stalled_server_times_out() {
    let (url, _) = serve().await;
    assert!(matches!(
        backend(&url, 1).sign_out().await,
        Err(FetchError::Timeout)
    ));
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(&format!("http://{}", addr), 5)
        .list_disease_reports()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
