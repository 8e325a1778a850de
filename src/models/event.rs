use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Number of days either side of the pivot date covered by a timeline query.
pub const TIMELINE_WINDOW_DAYS: i64 = 7;

/// Represents a calendar event as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Unique identifier for the event.
    pub id: i32,
    /// The title of the event.
    pub title: String,
    /// An optional free-text description.
    pub description: Option<String>,
    /// The calendar date the event takes place on.
    pub event_date: NaiveDate,
    /// Timestamp of when the event was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the event.
    pub updated_at: DateTime<Utc>,
    /// Identifier of the user who owns the event.
    pub user_id: i32,
}

/// Input structure for creating an event.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EventInput {
    /// The title of the event. Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// An optional description, up to 2000 characters.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// The event date as an ISO `YYYY-MM-DD` string.
    pub event_date: NaiveDate,
}

/// Partial-update payload for an event. Absent fields keep their current values.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EventUpdate {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
}

/// Query parameters for the timeline endpoint. The date is kept as a string
/// so a malformed value produces a controlled 400 rather than a framework
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub date: String,
}

/// Computes the inclusive `[pivot - 7 days, pivot + 7 days]` window for a
/// timeline query.
pub fn timeline_window(pivot: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        pivot - Duration::days(TIMELINE_WINDOW_DAYS),
        pivot + Duration::days(TIMELINE_WINDOW_DAYS),
    )
}
