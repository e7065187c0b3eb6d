//! User API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use marquee_core::{BookingError, NewUser, Role, Ticket, User};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Request body for registering a user
#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub username: String,
    pub role: Role,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users().create(NewUser {
        username: body.username,
        role: body.role,
    })?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users().list()?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users()
        .get(id)?
        .ok_or_else(|| BookingError::NotFound(format!("user {}", id)))?;
    Ok(Json(user))
}

pub async fn user_tickets(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    state
        .users()
        .get(id)?
        .ok_or_else(|| BookingError::NotFound(format!("user {}", id)))?;
    Ok(Json(state.coordinator().list_by_user(id)?))
}
