//! The upload page served at `/`.

use axum::extract::State;
use axum::response::Html;

use crate::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(
        state.analyzer.model_name(),
        state.sessions.config().query_limit,
    ))
}

fn render_index(model: &str, query_limit: u32) -> String {
    INDEX_HTML
        .replace("{{model}}", &escape_html(model))
        .replace("{{query_limit}}", &query_limit.to_string())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
