//! The same-origin proxy in front of GitHub's user search.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, RawQuery, State},
    http::{
        header::{CONTENT_TYPE, LOCATION},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::{redirect, Client, Url};
use serde::Deserialize;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::api_utils::UNEXPECTED_SERVER_ERROR;
use crate::config::Config;
use crate::error::{FinderError, Result};
use crate::find_client::FIND_PATH;
use crate::github_searcher::GitHubSearcher;
use crate::models::{FindResponse, GithubUserSearchError, RateLimit};
use crate::thumbnail::{encode_png, resize_and_mask_rgba};

pub const AVATAR_PATH: &str = "/api/avatar";

pub struct AppState {
    pub searcher: GitHubSearcher,
    /// Avatar fetches; redirects are not followed so they stay on `avatar_host`.
    pub client: Client,
    pub avatar_host: String,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            searcher: GitHubSearcher::new(config)?,
            client: Client::builder()
                .user_agent("github-user-finder")
                .redirect(redirect::Policy::none())
                .build()?,
            avatar_host: config.avatar_host.clone(),
        }))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(FIND_PATH, get(find_handler))
        .route(AVATAR_PATH, get(avatar_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(state)
}

/// Forwards the query string to GitHub. The reshaped body is always JSON; the
/// HTTP status mirrors the envelope's status.
pub async fn find_handler(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let response = match state.searcher.search_users(query.as_deref()).await {
        Ok(response) => response,
        Err(e) => {
            error!("Search request to GitHub failed: {}", e);
            FindResponse::Failure(GithubUserSearchError::new(
                500,
                UNEXPECTED_SERVER_ERROR,
                RateLimit::default(),
            ))
        }
    };

    let rate = response.rate();
    debug!(
        "Answering /api/find with {} (rate limit {}/{})",
        response.status(),
        rate.rate_limit_remaining,
        rate.rate_limit
    );

    let status = match &response {
        FindResponse::Success(_) => StatusCode::OK,
        FindResponse::Failure(err) => {
            StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    (status, Json(response)).into_response()
}

#[derive(Deserialize)]
pub struct AvatarParams {
    url: String,
}

/// Serves the 40x40 circular thumbnail of an avatar as PNG.
pub async fn avatar_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvatarParams>,
) -> std::result::Result<Response, FinderError> {
    let url = Url::parse(&params.url)
        .map_err(|e| FinderError::BadAvatarUrl(format!("{}: {e}", params.url)))?;
    if url.host_str() != Some(state.avatar_host.as_str()) {
        return Err(FinderError::AvatarHost(url.host_str().unwrap_or_default().to_string()));
    }

    let response = state.client.get(url.as_str()).send().await?;
    if response.status().is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        return Err(FinderError::AvatarHost(format!("redirect to {location}")));
    }
    let bytes = response.error_for_status()?.bytes().await?.to_vec();
    let png = tokio::task::spawn_blocking(move || resize_and_mask_rgba(&bytes).and_then(encode_png))
        .await
        .map_err(|e| FinderError::Io(std::io::Error::other(e)))??;

    Ok((
        [(CONTENT_TYPE, HeaderValue::from_static("image/png"))],
        png,
    )
        .into_response())
}

pub async fn start_server(config: &Config) -> Result<()> {
    info!("Initializing state...");
    let state = AppState::new(config)?;
    let app = router(state);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
