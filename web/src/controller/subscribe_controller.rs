use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use axum::extract::{ws::WebSocketUpgrade, State};
use axum::response::IntoResponse;
use domain::identity::Identity;
use hub::connection::Presence;
use hub::lifecycle;
use log::*;

/// Upgrades an authenticated request to a WebSocket subscribed to live queue updates.
///
/// The first message is always a full `queue_update` snapshot. Admins and leaders also
/// receive `online_users` whenever someone connects or disconnects.
#[utoipa::path(
    get,
    path = "/api/ws",
    params(
        ("token" = Option<String>, Query, description = "Access token, for clients that cannot set the Authorization header")
    ),
    responses(
        (status = 101, description = "Switching protocols"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    debug!("Establishing WebSocket connection for {}", identity.username);

    let presence = presence_of(identity);
    let hub = app_state.hub.clone();
    let settings = app_state.lifecycle;

    ws.max_message_size(settings.max_message_size)
        .on_upgrade(move |socket| async move {
            lifecycle::serve(socket, presence, hub, settings).await;
        })
}

fn presence_of(identity: Identity) -> Presence {
    Presence {
        user_id: identity.user_id,
        full_name: identity.full_name,
        username: identity.username,
        role: identity.role,
        department: identity.department,
    }
}
