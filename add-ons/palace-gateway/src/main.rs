//! Mental Palace gateway: questionnaire, palace sessions, courses and study plans over HTTP.

mod error;
mod handlers;
mod state;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use palace_core::{EmptyPlanGenerator, LlmPlanGenerator, PalaceConfig, RecordStore, StudyPlanGenerator};
use state::AppState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(target: "palace::gateway", error = %e, "Gateway stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = PalaceConfig::load()?;
    let records = RecordStore::open(config.records_path())?;

    let generator: Arc<dyn StudyPlanGenerator> = match LlmPlanGenerator::from_config(&config) {
        Some(g) => Arc::new(g),
        None => {
            tracing::warn!(
                target: "palace::gateway",
                "No model API key (PALACE_LLM_API_KEY / LLM_API_KEY); study plans will be empty"
            );
            Arc::new(EmptyPlanGenerator)
        }
    };

    let addr = config.bind_addr();
    tracing::info!(
        target: "palace::gateway",
        app = %config.app_name,
        %addr,
        version = palace_core::version(),
        "Starting gateway"
    );

    let state = AppState::new(config, records, generator);
    spawn_session_sweeper(state.clone());
    let records = Arc::clone(&state.records);

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    records.flush()?;
    tracing::info!(target: "palace::gateway", "Record store flushed; bye");
    Ok(())
}

/// Periodically drop palace sessions idle longer than `session_idle_secs`.
fn spawn_session_sweeper(state: AppState) {
    let max_idle = state.session_idle_timeout();
    let period = (max_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            state.evict_idle_sessions(max_idle);
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "palace::gateway", error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!(target: "palace::gateway", "Shutdown signal received");
}

fn build_app(state: AppState) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let s = origin.to_str().unwrap_or("");
                s.starts_with("http://localhost:") || s.starts_with("http://127.0.0.1:")
            }))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .route("/health", get(health))
        // Questionnaire and profiles
        .route("/api/v1/vark/questions", get(handlers::vark::questions))
        .route("/api/v1/vark/score", post(handlers::vark::score_answers))
        .route("/api/v1/vark/submit", post(handlers::vark::submit))
        .route("/api/v1/profiles/:user_id", get(handlers::vark::get_profile))
        .route("/api/v1/profiles/:user_id/role", post(handlers::vark::set_role))
        .route(
            "/api/v1/profiles/:user_id/enrollments",
            get(handlers::vark::enrollments),
        )
        // Palace sessions
        .route("/api/v1/palace/:session", get(handlers::palace::snapshot))
        .route("/api/v1/palace/:session/select", post(handlers::palace::select))
        .route(
            "/api/v1/palace/:session/assistant/toggle",
            post(handlers::palace::toggle_assistant),
        )
        .route(
            "/api/v1/palace/:session/assistant/message",
            post(handlers::palace::set_message),
        )
        .route(
            "/api/v1/palace/:session/items/:item_id/complete",
            post(handlers::palace::complete_item),
        )
        .route("/api/v1/palace/:session/tasks", post(handlers::palace::add_task))
        // Courses
        .route(
            "/api/v1/courses",
            get(handlers::courses::list).post(handlers::courses::create),
        )
        .route("/api/v1/courses/:course_id/modules", get(handlers::courses::modules))
        .route("/api/v1/courses/:course_id/furniture", get(handlers::courses::furniture))
        .route("/api/v1/courses/:course_id/enroll", post(handlers::courses::enroll))
        .route("/api/v1/courses/:course_id/materials", post(handlers::courses::materials))
        .route(
            "/api/v1/courses/:course_id/study-plans",
            post(handlers::courses::study_plans),
        )
        // Single-module generation
        .route("/api/v1/study-plan", post(handlers::study_plan::generate))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(cors)
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "palace::gateway",
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": palace_core::version() }))
}
