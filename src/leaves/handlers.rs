use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    leaves::{
        dto::{ApplyLeaveRequest, LeaveListResponse, LeaveQuery},
        repo::Leave,
        service,
    },
    response::{envelope, messages, Envelope},
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn apply_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ApplyLeaveRequest>,
) -> Result<(StatusCode, Json<Envelope<Leave>>), ApiError> {
    let (Some(leave_type), Some(start_date), Some(end_date)) =
        (&payload.leave_type, &payload.start_date, &payload.end_date)
    else {
        warn!(user_id = %auth.id, "leave application with missing fields");
        return Err(ApiError::InvalidInput("Missing required fields.".into()));
    };

    info!(
        user_id = %auth.id,
        leave_type = %leave_type,
        start_date = %start_date,
        end_date = %end_date,
        "leave application received"
    );

    let leave = service::apply_leave(
        &state.db,
        auth.id,
        leave_type,
        start_date,
        end_date,
        payload.reason.as_deref(),
    )
    .await?;

    info!(user_id = %auth.id, leave_id = %leave.id, "leave applied");
    Ok((
        StatusCode::CREATED,
        Json(envelope(messages::APPLICATION_SUBMITTED, leave)),
    ))
}

#[instrument(skip(state))]
pub async fn list_leaves(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LeaveQuery>,
) -> Result<Json<Envelope<LeaveListResponse>>, ApiError> {
    let leave_type = query
        .leave_type
        .as_deref()
        .map(service::parse_leave_type)
        .transpose()?;
    let plan = service::page_plan(query.page, query.limit);

    let leaves = Leave::list_page(&state.db, auth.id, leave_type, plan.limit, plan.offset).await?;
    let total = Leave::count_for_user(&state.db, auth.id, leave_type).await?;

    info!(user_id = %auth.id, count = leaves.len(), total, page = plan.page, "leaves fetched");
    Ok(Json(envelope(
        messages::APPLICATION_SUBMITTED,
        LeaveListResponse {
            leaves,
            total,
            page: plan.page,
            pages: service::pages_for(total, plan.limit),
        },
    )))
}

#[instrument(skip(state))]
pub async fn get_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(leave_id): Path<Uuid>,
) -> Result<Json<Envelope<Leave>>, ApiError> {
    let leave = Leave::find_for_user(&state.db, leave_id, auth.id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %auth.id, %leave_id, "leave not found");
            ApiError::NotFound("Resource not found.".into())
        })?;

    info!(user_id = %auth.id, %leave_id, "leave retrieved");
    Ok(Json(envelope(messages::APPLICATION_SUBMITTED, leave)))
}
