use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub username: String,
    pub full_name: String,
    pub password: String,
    /// Role name, e.g. `fifo`.
    pub role: String,
    pub department: String,
}

impl From<CreateParams> for domain::user::CreateParams {
    fn from(params: CreateParams) -> Self {
        Self {
            username: params.username,
            full_name: params.full_name,
            password: params.password,
            role: params.role,
            department: params.department,
        }
    }
}

/// Fields left out, or blank, are not changed.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    pub full_name: Option<String>,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub role_id: Option<Id>,
    pub department: Option<String>,
}

impl From<UpdateParams> for domain::user::UpdateParams {
    fn from(params: UpdateParams) -> Self {
        Self {
            full_name: params.full_name,
            role_id: params.role_id,
            department: params.department,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordParams {
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordParams {
    pub old_password: String,
    pub new_password: String,
}
