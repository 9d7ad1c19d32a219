use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::session::SessionStore;
use crate::todo::web::create_todo_router;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let sessions = SessionStore::new(config.session_cookie_name.clone());
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// A path parameter did not resolve to an existing todo list or todo.
    #[error("Not found.")]
    NotFound,
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebError::NotFound => {
                tracing::error!("{}", self);
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            WebError::Template(_) => {
                tracing::error!(error = %self, "template rendering failed");
                let user_facing_error_message =
                    "An unexpected error occurred while processing your request. Please try again later.";
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(format!(
                        "<h1>Internal Server Error</h1><p>{}</p>",
                        user_facing_error_message
                    )),
                )
                    .into_response()
            }
        }
    }
}

/// Builds the application router with all routes and layers.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .route("/", axum::routing::get(root_handler))
        .merge(create_todo_router(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Todos server running on http://{}", server_address);

    let state = AppState::new(config);
    let app = create_app(state);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// The start page just redirects to the todo list overview.
#[tracing::instrument]
pub async fn root_handler() -> Redirect {
    Redirect::to("/lists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn not_found_maps_to_404_with_raw_message() {
        let response = axum::response::IntoResponse::into_response(WebError::NotFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "Not found.");
    }

    #[tokio::test]
    async fn template_error_maps_to_internal_server_error() {
        let template_error = askama::Error::Custom("simulated rendering failure".into());
        let response =
            axum::response::IntoResponse::into_response(WebError::Template(template_error));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();
        assert!(body_text.contains("Internal Server Error"));
    }
}
