use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::event::{timeline_window, Event, EventInput, EventUpdate, TimelineQuery},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::NaiveDate;
use sqlx::PgPool;
use validator::Validate;

const EVENT_COLUMNS: &str = "id, title, description, event_date, created_at, updated_at, user_id";

/// Retrieves all events for the authenticated user, ordered by event date
/// ascending.
#[get("")]
pub async fn list_events(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE user_id = $1 ORDER BY event_date ASC",
        EVENT_COLUMNS
    ))
    .bind(user.0)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(events))
}

/// Retrieves the authenticated user's events within ±7 days of the given
/// pivot date, ordered by event date ascending.
///
/// ## Query Parameters:
/// - `date`: Pivot date in `YYYY-MM-DD` format (required).
///
/// ## Responses:
/// - `200 OK`: JSON array of `Event` objects inside the window.
/// - `400 Bad Request`: If `date` is missing or malformed.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("/timeline")]
pub async fn timeline(
    pool: web::Data<PgPool>,
    query: web::Query<TimelineQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let pivot = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format, expected YYYY-MM-DD".into()))?;
    let (start, end) = timeline_window(pivot);

    let events = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events \
         WHERE user_id = $1 AND event_date BETWEEN $2 AND $3 \
         ORDER BY event_date ASC",
        EVENT_COLUMNS
    ))
    .bind(user.0)
    .bind(start)
    .bind(end)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(events))
}

/// Creates a new event for the authenticated user.
#[post("")]
pub async fn create_event(
    pool: web::Data<PgPool>,
    event_data: web::Json<EventInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    event_data.validate()?;

    let event = sqlx::query_as::<_, Event>(&format!(
        "INSERT INTO events (title, description, event_date, user_id) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        EVENT_COLUMNS
    ))
    .bind(&event_data.title)
    .bind(&event_data.description)
    .bind(event_data.event_date)
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(event))
}

/// Retrieves a specific event by its ID. Owner-scoped; a foreign event is
/// reported as not found.
#[get("/{id}")]
pub async fn get_event(
    pool: web::Data<PgPool>,
    event_id: web::Path<i32>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE id = $1 AND user_id = $2",
        EVENT_COLUMNS
    ))
    .bind(event_id.into_inner())
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    match event {
        Some(event) => Ok(HttpResponse::Ok().json(event)),
        None => Err(AppError::NotFound("Event not found".into())),
    }
}

/// Updates an existing event with a partial field merge. Absent fields keep
/// their current values; `updated_at` is bumped. Owner-scoped.
#[put("/{id}")]
pub async fn update_event(
    pool: web::Data<PgPool>,
    event_id: web::Path<i32>,
    event_data: web::Json<EventUpdate>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    event_data.validate()?;
    let event_id = event_id.into_inner();

    let current = sqlx::query_as::<_, Event>(&format!(
        "SELECT {} FROM events WHERE id = $1 AND user_id = $2",
        EVENT_COLUMNS
    ))
    .bind(event_id)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?;

    let current = match current {
        Some(event) => event,
        None => return Err(AppError::NotFound("Event not found".into())),
    };

    let title = event_data.title.clone().unwrap_or(current.title);
    let description = event_data.description.clone().or(current.description);
    let event_date = event_data.event_date.unwrap_or(current.event_date);

    let updated = sqlx::query_as::<_, Event>(&format!(
        "UPDATE events SET title = $1, description = $2, event_date = $3, updated_at = NOW() \
         WHERE id = $4 AND user_id = $5 RETURNING {}",
        EVENT_COLUMNS
    ))
    .bind(&title)
    .bind(&description)
    .bind(event_date)
    .bind(event_id)
    .bind(user.0)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes an event by its ID. Owner-scoped.
#[delete("/{id}")]
pub async fn delete_event(
    pool: web::Data<PgPool>,
    event_id: web::Path<i32>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
        .bind(event_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
