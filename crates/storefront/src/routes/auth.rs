//! Authentication route handlers.
//!
//! One form serves both sign-in and registration; the identity service's
//! error message is shown back to the customer verbatim.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::routes::{ConfirmTemplate, PageChrome};
use crate::services::auth::{SessionError, SessionManager};
use crate::state::AppState;

/// Login and registration form data.
#[derive(Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: PageChrome,
    pub error: Option<String>,
    /// Email to re-fill after a failed attempt.
    pub email: String,
}

/// Display the login page; signed-in customers go back to the catalog.
#[instrument(skip(state, session, customer))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    if customer.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        chrome: PageChrome::load(&state, &session, None).await,
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let result = SessionManager::new(&state, &session)
        .sign_in(&form.email, &SecretString::from(form.password))
        .await;
    finish(&state, &session, form.email, result).await
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let result = SessionManager::new(&state, &session)
        .register(&form.email, &SecretString::from(form.password))
        .await;
    finish(&state, &session, form.email, result).await
}

async fn finish<T>(
    state: &AppState,
    session: &Session,
    email: String,
    result: Result<T, SessionError>,
) -> Result<Response, AppError> {
    match result {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(SessionError::Auth(e)) => {
            tracing::info!(error = %e, "Sign-in refused");
            Ok(LoginTemplate {
                chrome: PageChrome::load(state, session, None).await,
                error: Some(e.to_string()),
                email,
            }
            .into_response())
        }
        Err(SessionError::Session(e)) => Err(AppError::Session(e)),
    }
}

/// Ask before signing out.
#[instrument(skip(state, session, customer))]
pub async fn logout_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> ConfirmTemplate {
    ConfirmTemplate {
        chrome: PageChrome::load(&state, &session, Some(&customer)).await,
        title: "Logout".to_string(),
        prompt: "Are you sure logout?".to_string(),
        action: "/auth/logout".to_string(),
        confirm_label: "Logout".to_string(),
        back: "/".to_string(),
    }
}

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    SessionManager::new(&state, &session)
        .sign_out()
        .await
        .map_err(|e| match e {
            SessionError::Session(e) => AppError::Session(e),
            SessionError::Auth(e) => AppError::Internal(e.to_string()),
        })?;
    Ok(Redirect::to("/"))
}
