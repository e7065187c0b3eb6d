//! Ticket API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use marquee_core::{NewTicket, RequestType, Ticket, TicketAction, TicketStatus};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Request body for a customer purchase
#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    pub user_id: i64,
    pub session_id: i64,
    pub seat_number: u32,
}

/// Request body for staff ticket creation and rewrite
#[derive(Debug, Deserialize)]
pub struct StaffTicketBody {
    pub user_id: i64,
    pub session_id: i64,
    pub seat_number: u32,
    pub status: TicketStatus,
    pub request_type: RequestType,
}

impl From<StaffTicketBody> for NewTicket {
    fn from(body: StaffTicketBody) -> Self {
        Self {
            user_id: body.user_id,
            session_id: body.session_id,
            seat_number: body.seat_number,
            status: body.status,
            request_type: body.request_type,
        }
    }
}

/// Query parameters for listing tickets
#[derive(Debug, Deserialize)]
pub struct ListTicketsParams {
    pub session_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Request body for a customer return request
#[derive(Debug, Deserialize)]
pub struct ReturnBody {
    /// Must be the ticket's owner
    pub user_id: i64,
}

/// Request body for a staff lifecycle action
#[derive(Debug, Deserialize)]
pub struct ActionBody {
    /// One of `confirm`, `approve_return`, `cancel`
    pub action: String,
}

pub async fn purchase_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PurchaseBody>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let ticket = state
        .coordinator()
        .purchase(body.user_id, body.session_id, body.seat_number)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StaffTicketBody>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let ticket = state.coordinator().staff_add(body.into())?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTicketsParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = match (params.session_id, params.user_id) {
        (Some(session_id), _) => state.coordinator().list_by_session(session_id)?,
        (None, Some(user_id)) => state.coordinator().list_by_user(user_id)?,
        (None, None) => state.coordinator().list()?,
    };
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.coordinator().get(id)?))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<StaffTicketBody>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.coordinator().staff_update(id, body.into())?))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.coordinator().staff_delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn return_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ReturnBody>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.coordinator().request_return(id, body.user_id)?))
}

pub async fn ticket_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ActionBody>,
) -> Result<Json<Ticket>, ApiError> {
    let action = TicketAction::parse(&body.action)?;
    Ok(Json(state.coordinator().staff_action(id, action)?))
}
