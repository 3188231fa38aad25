/*!
 * The json request and response stubs for the /api/v1 routes
 *
 * Row types from `models` are serialized directly where they already match
 * the wire shape.
 */
use serde::{Deserialize, Serialize};

use crate::models::{Crew, Poll};
use crate::voting::{CastOutcome, Tally};

#[derive(Debug, Deserialize)]
pub struct CrewRequest {
    pub name: String,
    pub festival: String,
}

/// Join a crew by its six character invite code.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct CrewResponse {
    pub crew: Crew,
    pub members: i64,
}

#[derive(Debug, Deserialize)]
pub struct PackingItemRequest {
    pub label: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RideshareRole {
    Driver,
    Passenger,
}

/// Body for saving the caller's rideshare entry; also the shape of the
/// HTML form post.
#[derive(Debug, Deserialize)]
pub struct RideshareForm {
    pub role: RideshareRole,
    pub seats: i32,
    #[serde(default)]
    pub note: String,
}

/// Query-string filter for the rideshare board, e.g. `?role=driver`.
#[derive(Debug, Default, Deserialize)]
pub struct RideshareFilter {
    pub role: Option<RideshareRole>,
}

/// One of the two artist slots on a poll form.
#[derive(Debug, Deserialize)]
pub struct ArtistSlot {
    pub name: String,
    pub time: String,
    pub stage: String,
}

/// User-provided details to create or edit a poll.
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub artist_1: ArtistSlot,
    pub artist_2: ArtistSlot,
}

/// User-provided ballot: which of the two sets the voter wants.
#[derive(Debug, Deserialize)]
pub struct BallotRequest {
    pub choice: i32,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub poll: Poll,
    /// The viewer's current choice (1 or 2), if any.
    pub own_vote: Option<i32>,
    pub tally: Tally,
    pub can_modify: bool,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub outcome: CastOutcome,
    pub own_vote: Option<i32>,
    pub tally: Tally,
}
