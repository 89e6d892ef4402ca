#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tercih::app::{AppState, router};
use tercih::config::Config;
use tercih::source::{DataSource, sample_data};
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::default();
    let source = DataSource::in_memory(
        sample_data(&config.program_worksheet, &config.course_plan_worksheet),
        config.program_worksheet.clone(),
    );
    router(Arc::new(AppState::new(source, config).unwrap()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Method::GET, uri, None).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|r| r["Üniversite Adı"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn lists_programs_in_turkish_order() {
    let app = app();
    let (status, body) = get_json(&app, "/api/universiteler").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names(&body),
        vec!["Ankara Üniversitesi", "İstanbul Üniversitesi", "İzmir Üniversitesi"]
    );
    assert_eq!(body[0]["2024 YKS En Küçük Puanı"], json!(420.3));
    assert_eq!(body[0]["Kontenjan"], json!(80));
}

#[tokio::test]
async fn listing_accepts_search_filters_and_sorting() {
    let app = app();
    let uri = format!("/api/universiteler?search={}", urlencoding::encode("izmir"));
    let (_, body) = get_json(&app, &uri).await;
    assert_eq!(names(&body), vec!["İzmir Üniversitesi"]);

    let uri = format!(
        "/api/universiteler?sort_by={}&sort_order=desc",
        urlencoding::encode("Kontenjan")
    );
    let (_, body) = get_json(&app, &uri).await;
    assert_eq!(
        names(&body),
        vec!["İzmir Üniversitesi", "İstanbul Üniversitesi", "Ankara Üniversitesi"]
    );

    let (_, body) = get_json(&app, "/api/universiteler?grup=TM-2").await;
    assert_eq!(names(&body), vec!["Ankara Üniversitesi"]);
}

#[tokio::test]
async fn filters_endpoint_lists_distinct_values() {
    let (status, body) = get_json(&app(), "/api/filtreler").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ulkeler"], json!(["Türkiye"]));
    assert_eq!(body["sehirler"], json!(["Ankara", "İstanbul", "İzmir"]));
    assert_eq!(body["gruplar"], json!(["MF-3", "MF-4", "TM-2"]));
}

#[tokio::test]
async fn status_reports_sample_data() {
    let (status, body) = get_json(&app(), "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sheets_connected"], json!(false));
    assert_eq!(body["sheet_configured"], json!(false));
    assert_eq!(body["data_source"], json!("Sample Data"));
    assert_eq!(body["data_count"], json!(3));
    assert!(body["checked_at"].is_string());
}

#[tokio::test]
async fn single_program_lookup() {
    let app = app();
    let (status, body) = get_json(&app, "/api/universite/101110003").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Program Adı"], json!("Bilgisayar Mühendisliği"));

    let (status, body) = get_json(&app, "/api/universite/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Üniversite bulunamadı" }));
}

#[tokio::test]
async fn create_update_and_delete_round_trip() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/universite",
        Some(json!({
            "Üniversite Adı": "Bursa Uludağ Üniversitesi",
            "Program Kodu": "101110050",
            "Şehir": "Bursa",
            "Kontenjan": 40
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["Kontenjan"], json!(40));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/universite",
        Some(json!({ "Program Kodu": "101110050" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/universite/101110050",
        Some(json!({ "Kontenjan": "45" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated["Kontenjan"], json!(45));
    assert_eq!(updated["Şehir"], json!("Bursa"));

    let (_, listed) = get_json(&app, "/api/universiteler").await;
    assert_eq!(names(&listed)[1], "Bursa Uludağ Üniversitesi");

    let (status, body) = send(&app, Method::DELETE, "/api/universite/101110050", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "status": "ok" }));

    let (status, _) = send(&app, Method::DELETE, "/api/universite/101110050", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_without_program_code_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/universite",
        Some(json!({ "Şehir": "Sivas" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Program Kodu"));
}

#[tokio::test]
async fn course_plan_filters_use_fuzzy_matching() {
    let app = app();
    let uri = format!(
        "/api/ders-plani?universite={}&bolum={}",
        urlencoding::encode("İTÜ"),
        urlencoding::encode("Bil. Müh.")
    );
    let (status, body) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let courses: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Ders Adı"].as_str().unwrap())
        .collect();
    assert_eq!(courses, vec!["Bilgisayar Mühendisliğine Giriş"]);

    let (_, body) = get_json(&app, "/api/ders-plani/filtreler").await;
    assert_eq!(body["universiteler"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn detail_page_renders_program_fields() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/detay/101110002", None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Ankara Üniversitesi"));
    assert!(html.contains("Hukuk"));
    assert!(html.contains("420.3"));

    let (status, body) = send(&app, Method::GET, "/detay/0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().contains("Üniversite bulunamadı"));
}

#[tokio::test]
async fn pages_are_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("programs.js"));

    let (status, body) = send(&app, Method::GET, "/ders-plani", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("course_plan.js"));
}
