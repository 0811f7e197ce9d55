mod api;
mod page;
mod session;
mod telemetry;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use nutrition_core::{create_client_from_env, MealAnalyzer, SessionConfig, SessionStore};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Default listen address, overridable with NUTRITION_BIND_ADDR.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// How often expired sessions are swept.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Everything handlers need, built once at startup.
#[derive(Debug)]
pub struct AppContext {
    pub analyzer: MealAnalyzer,
    pub sessions: SessionStore,
}

/// Application state shared across all handlers
pub type AppState = Arc<AppContext>;

/// Assemble the router with tracing around every request.
pub fn build_app(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .route("/", get(page::index))
        .nest("/api/test", api::testing::router())
        .nest("/api/sessions", api::sessions::router())
        .nest("/api/analyze", api::analyze::router())
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Don't create a span at all for noisy endpoints
                    if matched_path == "/api/test/unauthed-ping" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                ),
        )
}

/// Periodically tear down sessions past their expiry.
fn spawn_session_reaper(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = state.sessions.purge_expired();
            if purged > 0 {
                tracing::debug!(
                    purged,
                    live = state.sessions.len(),
                    "Purged expired sessions"
                );
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI spec")?;
        println!("{}", spec);
        return Ok(());
    }

    dotenvy::dotenv().ok();
    telemetry::init_telemetry();

    // Fail at startup, not on the first request, if the credential is missing
    let (client, ai_config) =
        create_client_from_env().context("Failed to configure inference client")?;
    let session_config = SessionConfig::from_env().context("Invalid session configuration")?;

    tracing::info!(
        query_limit = session_config.query_limit,
        session_ttl_secs = session_config.ttl.as_secs(),
        "Session limits configured"
    );

    let state: AppState = Arc::new(AppContext {
        analyzer: MealAnalyzer::from_config(client, &ai_config),
        sessions: SessionStore::new(session_config),
    });

    spawn_session_reaper(state.clone());

    let app = build_app(state);

    let bind_addr = env::var("NUTRITION_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
