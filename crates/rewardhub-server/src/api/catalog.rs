use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use rewardhub_catalog::{assemble_overview, CatalogError, OverviewFilter};
use rewardhub_core::{RewardKind, RewardStatus};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Set on overview responses whose `catalogs` lists are empty because the
/// membership lookup failed.
pub(super) const MEMBERSHIPS_HEADER: &str = "x-catalog-memberships";

#[derive(Debug, Default, Deserialize)]
pub(super) struct OverviewQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl OverviewQuery {
    fn into_filter(self) -> Result<OverviewFilter, String> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("giftcard") => Some(RewardKind::GiftCard),
            Some("offer") => Some(RewardKind::Offer),
            Some(other) => return Err(format!("unknown kind '{other}'")),
        };

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                Some(RewardStatus::parse(raw).ok_or_else(|| format!("unknown status '{raw}'"))?)
            }
        };

        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err("min_value must not exceed max_value".to_string());
            }
        }

        Ok(OverviewFilter {
            kind,
            status,
            search: self.q.filter(|q| !q.trim().is_empty()),
            min_value: self.min_value,
            max_value: self.max_value,
        })
    }
}

pub(super) fn map_catalog_error(request_id: String, error: &CatalogError) -> ApiError {
    tracing::error!(error = %error, "catalog overview failed");
    ApiError::new(request_id, "internal_error", "could not load catalog overview")
}

pub(super) async fn get_catalog_overview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(tenant_id): Path<String>,
    Query(query): Query<OverviewQuery>,
) -> Result<Response, ApiError> {
    let tenant_id: i64 = tenant_id.trim().parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("invalid tenant id '{tenant_id}'"),
        )
    })?;

    let filter = query
        .into_filter()
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    let overview = assemble_overview(
        &state.store,
        &state.providers,
        tenant_id,
        &filter,
        Utc::now(),
    )
    .await
    .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    let mut response = Json(ApiResponse {
        data: overview.rewards,
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response();

    if overview.memberships_degraded {
        response.headers_mut().insert(
            HeaderName::from_static(MEMBERSHIPS_HEADER),
            HeaderValue::from_static("degraded"),
        );
    }

    Ok(response)
}
