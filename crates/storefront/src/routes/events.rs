//! Server-sent events announcing catalog and settings changes.
//!
//! Pages subscribe with the HTMX SSE extension and re-fetch the affected
//! fragment on `catalog`, `categories` or `settings`.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::{Stream, StreamExt, stream};

use crate::state::AppState;

fn named(name: &'static str) -> Result<Event, Infallible> {
    Ok(Event::default().event(name).data("refresh"))
}

/// Stream change notifications for as long as the client stays connected.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let catalog = state.products().updates().map(|_| named("catalog"));
    let categories = state.categories().updates().map(|_| named("categories"));
    let settings = state.settings_mirror().updates().map(|_| named("settings"));

    tracing::debug!("Event stream opened");
    Sse::new(stream::select(catalog, stream::select(categories, settings)))
        .keep_alive(KeepAlive::default())
}
