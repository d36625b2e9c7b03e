use serde::Deserialize;
use utoipa::IntoParams;

/// Query string of `GET /api/management/logs`. Every filter is optional.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IndexParams {
    /// Case-insensitive substring of the actor's username.
    pub username: Option<String>,
    /// Case-insensitive substring of the actor's full name.
    #[serde(rename = "fullname")]
    pub full_name: Option<String>,
    /// `ENTRY`, `EXIT` or `MOVE`.
    pub action: Option<String>,
    /// `YYYY-MM-DD`, applied together with `endDate`.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive of the whole day.
    pub end_date: Option<String>,
}

impl From<IndexParams> for domain::audit_log::LogQuery {
    fn from(params: IndexParams) -> Self {
        Self {
            username: params.username,
            full_name: params.full_name,
            action: params.action,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}
