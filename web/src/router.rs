use crate::{
    controller::health_check_controller, middleware::auth::require_auth, params, protect,
    response, AppState,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};

use crate::controller::{
    management, package_controller, queue_controller, subscribe_controller, time_controller,
    tracking_code_controller, user, user_session_controller,
};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "FIFO Platform API"
        ),
        paths(
            health_check_controller::health_check,
            user_session_controller::login,
            time_controller::server_time,
            queue_controller::fifo_queue,
            queue_controller::backlog_count,
            queue_controller::buffer_counts,
            package_controller::entry,
            package_controller::exit,
            package_controller::move_package,
            tracking_code_controller::generate,
            tracking_code_controller::confirm,
            tracking_code_controller::read,
            management::role_controller::index,
            management::user_controller::create,
            management::user_controller::index,
            management::user_controller::update,
            management::user_controller::reset_password,
            management::audit_log_controller::index,
            user::password_controller::change_password,
            subscribe_controller::subscribe,
        ),
        components(
            schemas(
                domain::packages::Model,
                domain::audit_logs::Model,
                domain::roles::Model,
                domain::users::Model,
                domain::buffer::Buffer,
                params::user_session::Credentials,
                params::package::EntryParams,
                params::package::ExitParams,
                params::package::MoveParams,
                params::tracking_code::GenerateParams,
                params::tracking_code::ConfirmParams,
                params::user::CreateParams,
                params::user::UpdateParams,
                params::user::ResetPasswordParams,
                params::user::ChangePasswordParams,
                response::queue::BacklogCount,
                response::queue::BufferCounts,
                response::queue::QueuedPackage,
                response::time::ServerTime,
                response::user_session::LoginResponse,
                response::user_session::SessionUser,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "fifo_platform", description = "Warehouse FIFO package tracking API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our bearer token authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token returned from a successful POST /login",
                        ))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(public_routes(app_state.clone()))
        .merge(queue_routes(app_state.clone()))
        .merge(package_routes(app_state.clone()))
        .merge(tracking_code_routes(app_state.clone()))
        .merge(management_routes(app_state.clone()))
        .merge(user_password_routes(app_state.clone()))
        .merge(subscribe_routes(app_state))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(user_session_controller::login))
        .with_state(app_state)
}

// Read-only views for the warehouse wall displays, no login required
fn public_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/public/time", get(time_controller::server_time))
        .route("/public/fifo-queue", get(queue_controller::fifo_queue))
        .route("/public/backlog-count", get(queue_controller::backlog_count))
        .route("/public/buffer-counts", get(queue_controller::buffer_counts))
        .with_state(app_state)
}

fn queue_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/fifo-queue", get(queue_controller::fifo_queue))
        .route("/api/backlog-count", get(queue_controller::backlog_count))
        .route("/api/buffer-counts", get(queue_controller::buffer_counts))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn package_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(
            // POST /api/entry and POST /api/exit
            Router::new()
                .route("/api/entry", post(package_controller::entry))
                .route("/api/exit", post(package_controller::exit))
                .route_layer(from_fn(protect::packages::manage_fifo)),
        )
        .merge(
            // PUT /api/packages/{id}/move
            Router::new()
                .route(
                    "/api/packages/{id}/move",
                    put(package_controller::move_package),
                )
                .route_layer(from_fn(protect::packages::move_package)),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn tracking_code_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/tracking-codes/generate",
            post(tracking_code_controller::generate),
        )
        .route(
            "/api/tracking-codes/confirm",
            post(tracking_code_controller::confirm),
        )
        .route(
            "/api/tracking-codes/{tracking_id}",
            get(tracking_code_controller::read),
        )
        .route_layer(from_fn(protect::tracking_codes::generate_qr_codes))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn management_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(
            // GET /api/management/roles and PUT /api/management/users/{id}
            Router::new()
                .route(
                    "/api/management/roles",
                    get(management::role_controller::index),
                )
                .route(
                    "/api/management/users/{id}",
                    put(management::user_controller::update),
                )
                .route_layer(from_fn(protect::management::edit_user)),
        )
        .merge(
            // POST /api/management/users
            Router::new()
                .route(
                    "/api/management/users",
                    post(management::user_controller::create),
                )
                .route_layer(from_fn(protect::management::create_user)),
        )
        .merge(
            // GET /api/management/users
            Router::new()
                .route(
                    "/api/management/users",
                    get(management::user_controller::index),
                )
                .route_layer(from_fn(protect::management::view_users)),
        )
        .merge(
            // PUT /api/management/users/{id}/reset-password
            Router::new()
                .route(
                    "/api/management/users/{id}/reset-password",
                    put(management::user_controller::reset_password),
                )
                .route_layer(from_fn(protect::management::reset_password)),
        )
        .merge(
            // GET /api/management/logs
            Router::new()
                .route(
                    "/api/management/logs",
                    get(management::audit_log_controller::index),
                )
                .route_layer(from_fn(protect::management::view_logs)),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn user_password_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/user/change-password",
            put(user::password_controller::change_password),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn subscribe_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/ws", get(subscribe_controller::subscribe))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}
