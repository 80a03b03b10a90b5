//! Server-rendered device page

use axum::{extract::State, response::Html};

use crate::api::AppState;
use crate::view::LoadState;

/// GET / - Device list, or an error banner when the pipeline fails
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    let mut load = LoadState::default();
    load.begin();

    let result = state.pipeline.run().await;
    if let Err(e) = &result {
        tracing::error!("Device page fetch failed: {}", e);
    }
    load.finish(result);

    Html(load.page().to_html())
}
