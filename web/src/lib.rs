//! HTTP and WebSocket surface of the platform.
//!
//! [`init_server`] binds the configured interface and serves the router built in
//! [`router::define_routes`]. Every authenticated route resolves the caller's
//! [`domain::identity::Identity`] once in [`middleware::auth::require_auth`]; permission
//! checks live in [`protect`].

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use domain::identity::TokenAuthority;
use domain::time::Tz;
use events::EventPublisher;
use hub::lifecycle::LifecycleSettings;
use hub::HubHandle;
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use error::{Error, Result};

mod controller;
mod error;
mod extractors;
pub mod middleware;
mod params;
mod protect;
mod response;
pub mod router;

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub hub: HubHandle,
    pub events: EventPublisher,
    pub token_authority: TokenAuthority,
    pub lifecycle: LifecycleSettings,
    pub display_timezone: Tz,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        hub: HubHandle,
        events: EventPublisher,
        token_authority: TokenAuthority,
        display_timezone: Tz,
    ) -> Self {
        let config = &service_state.config;
        let lifecycle = LifecycleSettings::new(
            config.ws_pong_wait(),
            config.ws_write_wait(),
            config.ws_max_message_size,
            config.subscriber_outbound_capacity,
        );

        Self {
            service_state,
            hub,
            events,
            token_authority,
            lifecycle,
            display_timezone,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config().clone();
    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let server_url = format!("{host}:{}", config.port);
    let listener = TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");

    let cors_layer = cors_layer(&config);
    let hub = app_state.hub.clone();

    axum::serve(
        listener,
        router::define_routes(app_state).layer(cors_layer),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        // Closing the hub ends every WebSocket lifecycle so the server can drain
        hub.shutdown().await;
    })
    .await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid allowed origin: {origin}");
                None
            }
        })
        .collect();
    debug!("CORS allowed origins: {origins:?}");

    CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for the shutdown signal: {e}"),
    }
}
