//! Showing schedule API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use marquee_core::{NewShowing, SeatView, Showing};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

/// Request body for creating or rescheduling a showing
#[derive(Debug, Deserialize)]
pub struct ShowingBody {
    pub movie_title: String,
    pub date: NaiveDate,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub capacity: u32,
    pub price: f64,
}

impl From<ShowingBody> for NewShowing {
    fn from(body: ShowingBody) -> Self {
        Self {
            movie_title: body.movie_title,
            date: body.date,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            capacity: body.capacity,
            price: body.price,
        }
    }
}

/// Query parameters for listing showings
#[derive(Debug, Deserialize)]
pub struct ListSessionsParams {
    /// Restrict to one date
    pub date: Option<NaiveDate>,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ShowingBody>,
) -> Result<(StatusCode, Json<Showing>), ApiError> {
    let showing = state.catalog().create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(showing)))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<Vec<Showing>>, ApiError> {
    let showings = match params.date {
        Some(date) => state.catalog().find_by_date(date)?,
        None => state.catalog().list()?,
    };
    Ok(Json(showings))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Showing>, ApiError> {
    Ok(Json(state.catalog().get(id)?))
}

pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ShowingBody>,
) -> Result<Json<Showing>, ApiError> {
    let showing = state.catalog().update(id, body.into()).await?;
    Ok(Json(showing))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SeatView>, ApiError> {
    Ok(Json(state.ledger().view(id)?))
}
