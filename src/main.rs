use domain::identity::TokenAuthority;
use events::EventPublisher;
use hub::domain_event_handler::HubDomainEventHandler;
use hub::queue_state::StoreSource;
use hub::Hub;
use log::*;
use service::{config::Config, logging::Logger};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting up FIFO Platform API server (environment: {:?})",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = migration::run(db.as_ref()).await {
        error!("Failed to run database migrations: {e}");
        process::exit(1);
    }

    if let Err(e) = entity_api::seed::run(db.as_ref(), &config).await {
        error!("Failed to seed roles and permissions: {e:?}");
        process::exit(1);
    }

    let token_authority = match TokenAuthority::from_config(&config) {
        Ok(authority) => authority,
        Err(_) => {
            error!("JWT_SECRET must be set to issue and verify access tokens");
            process::exit(1);
        }
    };

    let display_timezone = match domain::time::display_timezone(&config.display_timezone) {
        Ok(tz) => tz,
        Err(_) => {
            error!("DISPLAY_TIMEZONE is not a valid IANA time zone");
            process::exit(1);
        }
    };

    let (hub, hub_handle) = Hub::new(StoreSource::new(&db), config.hub_command_capacity);
    let hub_task = hub.spawn();

    // Committed package changes trigger a coalesced queue_update to every subscriber
    let events = EventPublisher::new().with_handler(Arc::new(HubDomainEventHandler::new(
        hub_handle.clone(),
    )));

    let app_state = web::AppState::new(
        service::AppState::new(config, &db),
        hub_handle,
        events,
        token_authority,
        display_timezone,
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
    }

    if let Err(e) = hub_task.await {
        error!("Hub task ended abnormally: {e}");
    }

    info!("FIFO Platform API server stopped");
}
