use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /api/entry`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryParams {
    pub tracking_id: String,
    /// `RTS`, `EHA` or `SAL`.
    pub buffer: String,
    pub location: String,
    /// `P`, `M` or `G`. Required for RTS and EHA, ignored for SAL.
    #[serde(default)]
    pub profile: Option<String>,
}

impl From<EntryParams> for domain::package::EntryParams {
    fn from(params: EntryParams) -> Self {
        Self {
            tracking_id: params.tracking_id,
            buffer: params.buffer,
            location: params.location,
            profile: params.profile,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitParams {
    pub tracking_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveParams {
    pub location: String,
}
