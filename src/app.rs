#![cfg(feature = "web")]

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use handlebars::Handlebars;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::catalog;
use crate::config::Config;
use crate::course_plan::{self, CoursePlanOptions, CoursePlanQuery};
use crate::error::AppError;
use crate::listing::{self, FilterOptions, ListingQuery, UNIVERSITY};
use crate::loader::{Record, value_text};
use crate::source::{DataSource, Origin};

const DETAIL_TEMPLATE: &str = "detail";

pub struct AppState {
    pub source: DataSource,
    pub config: Config,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(source: DataSource, config: Config) -> Result<Self, handlebars::TemplateError> {
        let mut templates = Handlebars::new();
        templates.register_template_string(DETAIL_TEMPLATE, include_str!("./static/detail.hbs"))?;
        Ok(AppState {
            source,
            config,
            templates,
        })
    }
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = DataSource::from_config(&config)?;
    if let Some(sheets) = source.sheets() {
        info!("Using Google Sheets spreadsheet {}", sheets.spreadsheet_id());
    }
    info!(
        "Data source: primary backend {:?}, program worksheet '{}', course plan worksheet '{}'",
        source.primary(),
        config.program_worksheet,
        config.course_plan_worksheet
    );

    let address = config.bind_address();
    let state = Arc::new(AppState::new(source, config)?);
    let app = router(state);

    // Start server
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(serve_index))
        .route("/ders-plani", get(serve_course_plan))
        .route("/detay/:program_kodu", get(serve_detail))
        .route("/api/status", get(get_status))
        .route("/api/universiteler", get(list_programs))
        .route("/api/filtreler", get(get_filters))
        .route("/api/universite", axum::routing::post(create_program))
        .route(
            "/api/universite/:program_kodu",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route("/api/ders-plani", get(list_course_plan))
        .route("/api/ders-plani/filtreler", get(get_course_plan_filters))
        .nest_service("/static", static_dir)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn serve_course_plan() -> Html<&'static str> {
    Html(include_str!("./static/course_plan.html"))
}

async fn serve_detail(
    Path(program_kodu): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let (_, table) = catalog::load(&state.source, &state.config.program_worksheet).await?;

    let (status, data) = match catalog::find(&table, &program_kodu) {
        Some(record) => (StatusCode::OK, detail_context(record)),
        None => (
            StatusCode::NOT_FOUND,
            json!({ "found": false, "message": catalog::PROGRAM_NOT_FOUND }),
        ),
    };

    let page = state
        .templates
        .render(DETAIL_TEMPLATE, &data)
        .map_err(|e| AppError::Template(e.to_string()))?;
    Ok((status, Html(page)).into_response())
}

fn detail_context(record: &Record) -> Value {
    let fields: Vec<Value> = record
        .fields
        .iter()
        .map(|(label, value)| json!({ "label": label, "value": value_text(value) }))
        .collect();
    json!({
        "found": true,
        "title": record.text(UNIVERSITY),
        "program_kodu": record.text(listing::PROGRAM_CODE),
        "fields": fields,
    })
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let loaded = catalog::load(&state.source, &state.config.program_worksheet).await;
    let (data_source, data_count) = match loaded {
        Ok((origin, table)) => (Some(origin), table.records.len()),
        Err(e) => {
            warn!("Status check could not load programs: {}", e);
            (None, 0)
        }
    };

    let sheet_title = match (state.source.sheets(), data_source) {
        (Some(sheets), Some(Origin::GoogleSheets)) => sheets.title().await.ok(),
        _ => None,
    };

    Json(json!({
        "sheets_connected": data_source == Some(Origin::GoogleSheets),
        "sheet_configured": state.source.sheets_configured(),
        "sheet_title": sheet_title,
        "data_source": data_source,
        "data_count": data_count,
        "checked_at": chrono::Utc::now(),
    }))
}

async fn list_programs(
    Query(query): Query<ListingQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let (origin, table) = catalog::load(&state.source, &state.config.program_worksheet).await?;
    let records = listing::apply(&table, &query);
    debug!(
        "Listing {} of {} programs from {:?}",
        records.len(),
        table.records.len(),
        origin
    );
    Ok(Json(records))
}

async fn get_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FilterOptions>, AppError> {
    let (_, table) = catalog::load(&state.source, &state.config.program_worksheet).await?;
    Ok(Json(listing::filter_options(&table)))
}

async fn get_program(
    Path(program_kodu): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Record>, AppError> {
    let (_, table) = catalog::load(&state.source, &state.config.program_worksheet).await?;
    catalog::find(&table, &program_kodu)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(catalog::PROGRAM_NOT_FOUND.to_string()))
}

async fn create_program(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let record = catalog::create(&state.source, &state.config.program_worksheet, &payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_program(
    Path(program_kodu): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<Record>, AppError> {
    let record = catalog::update(
        &state.source,
        &state.config.program_worksheet,
        &program_kodu,
        &payload,
    )
    .await?;
    Ok(Json(record))
}

async fn delete_program(
    Path(program_kodu): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    catalog::delete(&state.source, &state.config.program_worksheet, &program_kodu).await?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn list_course_plan(
    Query(query): Query<CoursePlanQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, AppError> {
    let table = course_plan::load(&state.source, &state.config.course_plan_worksheet).await?;
    Ok(Json(course_plan::apply(&table, &query)))
}

async fn get_course_plan_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CoursePlanOptions>, AppError> {
    let table = course_plan::load(&state.source, &state.config.course_plan_worksheet).await?;
    Ok(Json(course_plan::options(&table)))
}
