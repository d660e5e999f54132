//! Server-sent events announcing changes to the dashboard's data.
//!
//! Pages re-fetch the affected section on `orders`, `products`,
//! `categories` or `settings`.

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
    let orders = state.orders().updates().map(|_| named("orders"));
    let products = state.products().updates().map(|_| named("products"));
    let categories = state.categories().updates().map(|_| named("categories"));
    let settings = state.settings_mirror().updates().map(|_| named("settings"));

    Sse::new(stream::select(
        stream::select(orders, products),
        stream::select(categories, settings),
    ))
    .keep_alive(KeepAlive::default())
}
