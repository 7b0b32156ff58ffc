use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
};

use crate::{AppState, error::AppError};

use super::model::IpQuery;

#[axum::debug_handler]
pub async fn lookup_ip(
    State(state): State<AppState>,
    Query(query): Query<IpQuery>,
) -> Result<impl IntoResponse, AppError> {
    let raw_ip = query.ip.unwrap_or_default();

    match state.enrichment.lookup(&raw_ip).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            tracing::debug!("IP lookup for {:?} rejected: {}", raw_ip, e);
            Err(AppError::from(e))
        }
    }
}
