//! Fills a development database with demo users and a handful of queued packages.

use domain::identity;
use domain::package::{self, EntryParams};
use domain::user::{self, CreateParams};
use events::EventPublisher;
use log::{error, info, warn};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "fifo-demo";

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    if config.is_production() {
        error!("Refusing to seed demo data into a production database");
        std::process::exit(1);
    }

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migration::run(db.as_ref()).await {
        error!("Failed to run database migrations: {e}");
        std::process::exit(1);
    }
    if let Err(e) = entity_api::seed::run(db.as_ref(), &config).await {
        error!("Failed to seed roles and permissions: {e:?}");
        std::process::exit(1);
    }

    for (username, full_name, role, department) in [
        ("leader.demo", "Lia Demo", "leader", "Outbound"),
        ("fifo.demo", "Caio Demo", "fifo", "Inbound"),
    ] {
        let params = CreateParams {
            username: username.to_owned(),
            full_name: full_name.to_owned(),
            password: DEMO_PASSWORD.to_owned(),
            role: role.to_owned(),
            department: department.to_owned(),
        };
        match user::create(db.as_ref(), params).await {
            Ok(user) => info!("Created demo user {} ({role})", user.username),
            Err(e) => warn!("Skipping demo user {username}: {e}"),
        }
    }

    // Entries are recorded as the demo operator so the audit log reads naturally
    let operator = match entity_api::user::find_by_username(db.as_ref(), "fifo.demo").await {
        Ok(Some(user)) => match identity::load(db.as_ref(), &user).await {
            Ok(identity) => identity,
            Err(e) => {
                error!("Failed to load the demo operator: {e}");
                std::process::exit(1);
            }
        },
        _ => {
            error!("Demo operator is missing");
            std::process::exit(1);
        }
    };

    // No hub runs here, so nothing listens for the events
    let events = EventPublisher::new();
    for (code, buffer, location, profile) in [
        ("CG000001", "RTS", "R-01", Some("P")),
        ("CG000002", "RTS", "R-02", Some("M")),
        ("CG000003", "EHA", "E-01", Some("G")),
        ("CG000004", "SAL", "S-01", None),
    ] {
        let params = EntryParams {
            tracking_id: code.to_owned(),
            buffer: buffer.to_owned(),
            location: location.to_owned(),
            profile: profile.map(str::to_owned),
        };
        match package::enter(db.as_ref(), &events, &operator, params).await {
            Ok(package) => info!("Queued {} in {buffer}", package.tracking_id),
            Err(e) => warn!("Skipping {code}: {e}"),
        }
    }

    info!("Demo data ready. Demo users log in with password '{DEMO_PASSWORD}'");
}
