//! Shop settings route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::Html,
    routing::get,
};
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::settings::{SETTINGS_SAVED, SettingsForm, SettingsView, save};
use crate::state::AppState;

use super::render;

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub current_path: String,
    pub settings: SettingsView,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(settings_page).post(save_settings))
}

/// Render the settings form from the live settings document.
///
/// GET /settings
#[instrument(skip(state))]
async fn settings_page(State(state): State<AppState>) -> Html<String> {
    render(&SettingsTemplate {
        current_path: "/settings".to_string(),
        settings: SettingsView::from(&state.settings()),
        success_message: None,
        error_message: None,
    })
}

/// Merge-write the closed flag, delivery charge and support number.
///
/// POST /settings
#[instrument(skip(state, form))]
async fn save_settings(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Html<String> {
    let update = form.to_update();

    let (success_message, error_message) = match save(state.store(), &update).await {
        Ok(()) => {
            add_breadcrumb("settings", "Settings saved", &[]);
            (Some(SETTINGS_SAVED.to_string()), None)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save settings");
            (None, Some(format!("Error: {e}")))
        }
    };

    render(&SettingsTemplate {
        current_path: "/settings".to_string(),
        settings: SettingsView::from(&update),
        success_message,
        error_message,
    })
}
