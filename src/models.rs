use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/**
 * A group of users planning one festival together
 *
 * The creator is enrolled as a member at creation time; everybody else joins
 * with the `join_code`.
 */
#[derive(Clone, Debug, FromRow, Serialize)]
pub struct Crew {
    pub id: Uuid,
    pub name: String,
    pub festival: String,
    pub join_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One row of a crew's shared packing checklist.
#[derive(Clone, Debug, FromRow, Serialize)]
pub struct PackingItem {
    pub id: Uuid,
    pub crew_id: Uuid,
    pub label: String,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
}

/**
 * A member's standing rideshare offer or request
 *
 * At most one per (crew, user); saving again overwrites the previous entry.
 */
#[derive(Clone, Debug, FromRow, Serialize)]
pub struct RideshareEntry {
    pub id: Uuid,
    pub crew_id: Uuid,
    pub user_id: Uuid,
    pub is_driver: bool,
    pub seats: i32,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/**
 * A two-option artist set-conflict poll
 *
 * Options are positional (1 and 2), never a dynamic list. `crew_id` and
 * `creator_id` are immutable after creation; only the creator may edit or
 * delete the poll.
 */
#[derive(Clone, Debug, FromRow, Serialize)]
pub struct Poll {
    pub id: Uuid,
    pub crew_id: Uuid,
    pub creator_id: Uuid,
    pub title: Option<String>,
    pub artist_1_name: String,
    pub artist_1_time: String,
    pub artist_1_stage: String,
    pub artist_2_name: String,
    pub artist_2_time: String,
    pub artist_2_stage: String,
    pub created_at: DateTime<Utc>,
}

/// One voter's current choice for one poll, unique per (poll, voter).
#[derive(Clone, Debug, FromRow, Serialize)]
pub struct Vote {
    pub id: i32,
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub choice: i32,
    pub created_at: DateTime<Utc>,
}
