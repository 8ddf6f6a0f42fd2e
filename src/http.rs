use crate::error::BookingError;
use crate::storage::Storage;
use crate::types::{Appointment, Service};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotsQuery {
    date: NaiveDate,
    duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserQuery {
    user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookRequest {
    user_id: i64,
    user_name: String,
    service_id: Uuid,
    date: NaiveDate,
    /// "HH:MM", one of the values returned by the slots endpoint.
    time: String,
    duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookResponse {
    appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CancelRequest {
    appointment_id: Uuid,
    user_id: i64,
}

pub async fn start_server<S: Storage>(state: AppState<S>, listener: TcpListener) {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/services", get(get_services))
        .route("/slots", get(get_slots))
        .route("/book", post(book_appointment))
        .route("/cancel", post(cancel_appointment))
        .route("/appointments", get(get_user_appointments))
        .with_state(state)
        .layer(cors);

    axum::serve(listener, app).await.unwrap();
}

/// Upper bound on a single appointment; anything longer than a day is a
/// malformed request, not a bookable service.
const MAX_DURATION_MINUTES: i64 = 24 * 60;

fn validate_duration(duration_minutes: i64) -> Result<(), (StatusCode, String)> {
    if !(1..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("invalid duration {duration_minutes}"),
        ));
    }
    Ok(())
}

fn error_response(err: BookingError) -> (StatusCode, String) {
    let status = match err {
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::NotOwner(_) => StatusCode::FORBIDDEN,
        BookingError::SlotConflict(_) => StatusCode::CONFLICT,
        BookingError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, err.to_string())
}

async fn get_services<S: Storage>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Service>>, (StatusCode, String)> {
    state.booking.services().map(Json).map_err(error_response)
}

async fn get_slots<S: Storage>(
    State(state): State<AppState<S>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    validate_duration(query.duration)?;
    let slots = state
        .booking
        .available_slots(query.date, query.duration)
        .map_err(error_response)?;
    Ok(Json(
        slots
            .iter()
            .map(|slot| slot.format("%H:%M").to_string())
            .collect(),
    ))
}

async fn book_appointment<S: Storage>(
    State(state): State<AppState<S>>,
    Json(booking): Json<BookRequest>,
) -> Result<Json<BookResponse>, (StatusCode, String)> {
    validate_duration(booking.duration_minutes)?;
    let time = NaiveTime::parse_from_str(&booking.time, "%H:%M")
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("invalid time '{}'", booking.time)))?;

    let appointment_id = state
        .booking
        .confirm_booking(
            booking.user_id,
            &booking.user_name,
            booking.service_id,
            booking.date,
            time,
            booking.duration_minutes,
        )
        .map_err(error_response)?;
    Ok(Json(BookResponse { appointment_id }))
}

async fn cancel_appointment<S: Storage>(
    State(state): State<AppState<S>>,
    Json(cancel): Json<CancelRequest>,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    state
        .booking
        .cancel_appointment(cancel.appointment_id, cancel.user_id)
        .map_err(error_response)?;
    Ok((StatusCode::OK, "Appointment cancelled".to_string()))
}

async fn get_user_appointments<S: Storage>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Appointment>>, (StatusCode, String)> {
    state
        .booking
        .user_appointments(query.user_id)
        .map(Json)
        .map_err(error_response)
}
