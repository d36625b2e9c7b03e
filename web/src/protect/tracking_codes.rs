use super::authorize;
use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::{extract::Request, middleware::Next, response::Response};
use domain::permissions::Permission;

// checks:
// - that the caller may generate, confirm and reprint tracking codes
pub(crate) async fn generate_qr_codes(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::GenerateQrCodes, request, next).await
}
