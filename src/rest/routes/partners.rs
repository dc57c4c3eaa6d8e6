use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::rest::error::ApiError;
use crate::storage::PartnerRow;
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct CreatePartnerRequest {
    pub name: String,
    pub identifier: String,
}

pub async fn create_partner(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreatePartnerRequest>,
) -> Result<Json<PartnerRow>, ApiError> {
    if body.name.is_empty() || body.identifier.is_empty() {
        return Err(ApiError::BadRequest(
            "name and identifier must be non-empty".to_string(),
        ));
    }
    match ctx.storage.create_partner(&body.name, &body.identifier).await {
        Ok(partner) => Ok(Json(partner)),
        // The identifier column is UNIQUE — a collision is the caller's fault.
        Err(e) if format!("{e:#}").contains("UNIQUE constraint failed") => Err(
            ApiError::BadRequest(format!("identifier '{}' already exists", body.identifier)),
        ),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPartnersParams {
    pub search: Option<String>,
}

pub async fn list_partners(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<ListPartnersParams>,
) -> Result<Json<Vec<PartnerRow>>, ApiError> {
    let partners = ctx.storage.list_partners(params.search.as_deref()).await?;
    Ok(Json(partners))
}
