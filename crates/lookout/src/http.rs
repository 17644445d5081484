//! HTTP surface: the setup page and the landing page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use tracing::warn;

use crate::bootstrap::{Bootstrap, SetupOutcome, SetupPage};
use crate::config::SetupForm;
use crate::session::SessionKeys;
use crate::view::{render_setup_page, render_status_page};

pub const SETUP_PATH: &str = "/setup";

/// Build the router around a shared [`Bootstrap`].
pub fn router(bootstrap: Arc<Bootstrap>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(SETUP_PATH, get(setup_page).post(submit_setup))
        .with_state(bootstrap)
}

async fn index(State(bootstrap): State<Arc<Bootstrap>>) -> Response {
    if !bootstrap.is_initialized() {
        return Redirect::to(SETUP_PATH).into_response();
    }
    let Some(db) = bootstrap.database() else {
        return Redirect::to(SETUP_PATH).into_response();
    };

    let core = match db.core().await {
        Ok(core) => core,
        Err(err) => {
            warn!(error = %err, "Failed to read project info");
            None
        }
    };
    let services = match db.service_count().await {
        Ok(n) => n,
        Err(err) => {
            warn!(error = %err, "Failed to count services");
            0
        }
    };
    Html(render_status_page(core.as_ref(), services)).into_response()
}

async fn setup_page(State(bootstrap): State<Arc<Bootstrap>>) -> Response {
    match bootstrap.render_setup() {
        SetupPage::Redirect => Redirect::to("/").into_response(),
        SetupPage::Form(view) => Html(render_setup_page(&view)).into_response(),
    }
}

async fn submit_setup(
    State(bootstrap): State<Arc<Bootstrap>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = SetupForm::from_pairs(pairs);
    match bootstrap.process_setup(form).await {
        SetupOutcome::AlreadyConfigured => Redirect::to("/").into_response(),
        SetupOutcome::Completed => (
            [(SET_COOKIE, SessionKeys::expired_cookie())],
            Redirect::to("/"),
        )
            .into_response(),
        SetupOutcome::Failed(view) => Html(render_setup_page(&view)).into_response(),
    }
}
