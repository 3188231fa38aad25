/*!
 * Every table round trip lives here: one query, one function. Handlers and
 * the voting session never build SQL themselves.
 *
 * Reads propagate as `AppError::Database`; writes are tagged
 * `AppError::WriteFailure` so callers can keep the no-partial-state rule.
 */
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::api_models::ArtistSlot;
use crate::errors::AppError;
use crate::models::{Crew, PackingItem, Poll, RideshareEntry, Vote};
use crate::voting::Choice;

/*
 * Crews and membership
 */

/// Insert the crew and enroll its creator as the first member, atomically.
pub async fn create_crew(
    pool: &PgPool,
    name: &str,
    festival: &str,
    join_code: &str,
    created_by: Uuid,
) -> Result<Crew, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::WriteFailure)?;

    let crew = sqlx::query_as::<_, Crew>(
        "INSERT INTO crews (id, name, festival, join_code, created_by)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(festival)
    .bind(join_code)
    .bind(created_by)
    .fetch_one(&mut tx)
    .await
    .map_err(AppError::WriteFailure)?;

    sqlx::query("INSERT INTO crew_members (crew_id, user_id) VALUES ($1, $2)")
        .bind(crew.id)
        .bind(created_by)
        .execute(&mut tx)
        .await
        .map_err(AppError::WriteFailure)?;

    tx.commit().await.map_err(AppError::WriteFailure)?;
    Ok(crew)
}

pub async fn select_crew(pool: &PgPool, crew_id: Uuid) -> Result<Option<Crew>, AppError> {
    let crew = sqlx::query_as::<_, Crew>("SELECT * FROM crews WHERE id = $1")
        .bind(crew_id)
        .fetch_optional(pool)
        .await?;
    Ok(crew)
}

pub async fn select_crew_by_join_code(
    pool: &PgPool,
    join_code: &str,
) -> Result<Option<Crew>, AppError> {
    let crew = sqlx::query_as::<_, Crew>("SELECT * FROM crews WHERE join_code = $1")
        .bind(join_code)
        .fetch_optional(pool)
        .await?;
    Ok(crew)
}

/// The crews the user belongs to, for the dashboard.
pub async fn crews_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Crew>, AppError> {
    let crews = sqlx::query_as::<_, Crew>(
        "SELECT c.* FROM crews c
         JOIN crew_members m ON m.crew_id = c.id
         WHERE m.user_id = $1
         ORDER BY c.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(crews)
}

pub async fn update_crew(
    pool: &PgPool,
    crew_id: Uuid,
    name: &str,
    festival: &str,
) -> Result<Crew, AppError> {
    sqlx::query_as::<_, Crew>(
        "UPDATE crews SET name = $2, festival = $3 WHERE id = $1 RETURNING *",
    )
    .bind(crew_id)
    .bind(name)
    .bind(festival)
    .fetch_optional(pool)
    .await
    .map_err(AppError::WriteFailure)?
    .ok_or(AppError::NotFound("crew"))
}

pub async fn is_member(pool: &PgPool, crew_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
    let (member,) = sqlx::query_as::<_, (bool,)>(
        "SELECT EXISTS (SELECT 1 FROM crew_members WHERE crew_id = $1 AND user_id = $2)",
    )
    .bind(crew_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(member)
}

pub async fn member_count(pool: &PgPool, crew_id: Uuid) -> Result<i64, AppError> {
    let (count,) =
        sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM crew_members WHERE crew_id = $1")
            .bind(crew_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn join_crew(pool: &PgPool, crew_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query("INSERT INTO crew_members (crew_id, user_id) VALUES ($1, $2)")
        .bind(crew_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::WriteFailure)?;
    Ok(())
}

/*
 * Packing checklist
 */

/// Checklist rows in insertion order, the way the page renders them.
pub async fn packing_items(pool: &PgPool, crew_id: Uuid) -> Result<Vec<PackingItem>, AppError> {
    let items = sqlx::query_as::<_, PackingItem>(
        "SELECT * FROM packing_items WHERE crew_id = $1 ORDER BY created_at ASC",
    )
    .bind(crew_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn select_packing_item(
    pool: &PgPool,
    item_id: Uuid,
) -> Result<Option<PackingItem>, AppError> {
    let item = sqlx::query_as::<_, PackingItem>("SELECT * FROM packing_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}

pub async fn add_packing_item(
    pool: &PgPool,
    crew_id: Uuid,
    label: &str,
) -> Result<PackingItem, AppError> {
    sqlx::query_as::<_, PackingItem>(
        "INSERT INTO packing_items (id, crew_id, label) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(crew_id)
    .bind(label)
    .fetch_one(pool)
    .await
    .map_err(AppError::WriteFailure)
}

pub async fn toggle_packing_item(pool: &PgPool, item_id: Uuid) -> Result<PackingItem, AppError> {
    sqlx::query_as::<_, PackingItem>(
        "UPDATE packing_items SET checked = NOT checked WHERE id = $1 RETURNING *",
    )
    .bind(item_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::WriteFailure)?
    .ok_or(AppError::NotFound("packing item"))
}

/*
 * Rideshare board
 */

pub async fn rideshares(
    pool: &PgPool,
    crew_id: Uuid,
    is_driver: Option<bool>,
) -> Result<Vec<RideshareEntry>, AppError> {
    let entries = sqlx::query_as::<_, RideshareEntry>(
        "SELECT * FROM rideshares
         WHERE crew_id = $1 AND ($2::BOOLEAN IS NULL OR is_driver = $2)
         ORDER BY created_at ASC",
    )
    .bind(crew_id)
    .bind(is_driver)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Insert-or-overwrite the member's single entry for the crew.
pub async fn upsert_rideshare(
    pool: &PgPool,
    crew_id: Uuid,
    user_id: Uuid,
    is_driver: bool,
    seats: i32,
    note: &str,
) -> Result<RideshareEntry, AppError> {
    sqlx::query_as::<_, RideshareEntry>(
        "INSERT INTO rideshares (id, crew_id, user_id, is_driver, seats, note)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (crew_id, user_id)
         DO UPDATE SET is_driver = EXCLUDED.is_driver,
                       seats = EXCLUDED.seats,
                       note = EXCLUDED.note
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(crew_id)
    .bind(user_id)
    .bind(is_driver)
    .bind(seats)
    .bind(note)
    .fetch_one(pool)
    .await
    .map_err(AppError::WriteFailure)
}

pub async fn delete_rideshare(
    pool: &PgPool,
    entry_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let entry = sqlx::query_as::<_, RideshareEntry>("SELECT * FROM rideshares WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("rideshare entry"))?;

    if entry.user_id != user_id {
        return Err(AppError::Forbidden("only the entry's owner can remove it"));
    }

    sqlx::query("DELETE FROM rideshares WHERE id = $1")
        .bind(entry_id)
        .execute(pool)
        .await
        .map_err(AppError::WriteFailure)?;
    Ok(())
}

/*
 * Polls and votes
 */

pub async fn create_poll(
    pool: &PgPool,
    crew_id: Uuid,
    creator_id: Uuid,
    title: Option<&str>,
    artist_1: &ArtistSlot,
    artist_2: &ArtistSlot,
) -> Result<Poll, AppError> {
    sqlx::query_as::<_, Poll>(
        "INSERT INTO polls (id, crew_id, creator_id, title,
                            artist_1_name, artist_1_time, artist_1_stage,
                            artist_2_name, artist_2_time, artist_2_stage)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(crew_id)
    .bind(creator_id)
    .bind(title)
    .bind(&artist_1.name)
    .bind(&artist_1.time)
    .bind(&artist_1.stage)
    .bind(&artist_2.name)
    .bind(&artist_2.time)
    .bind(&artist_2.stage)
    .fetch_one(pool)
    .await
    .map_err(AppError::WriteFailure)
}

/// Polls for a crew, newest first.
pub async fn polls_for_crew(pool: &PgPool, crew_id: Uuid) -> Result<Vec<Poll>, AppError> {
    let polls = sqlx::query_as::<_, Poll>(
        "SELECT * FROM polls WHERE crew_id = $1 ORDER BY created_at DESC",
    )
    .bind(crew_id)
    .fetch_all(pool)
    .await?;
    Ok(polls)
}

pub async fn select_poll(pool: &PgPool, poll_id: Uuid) -> Result<Option<Poll>, AppError> {
    let poll = sqlx::query_as::<_, Poll>("SELECT * FROM polls WHERE id = $1")
        .bind(poll_id)
        .fetch_optional(pool)
        .await?;
    Ok(poll)
}

/// Title and options are the only mutable columns; crew and creator never move.
pub async fn update_poll(
    pool: &PgPool,
    poll_id: Uuid,
    title: Option<&str>,
    artist_1: &ArtistSlot,
    artist_2: &ArtistSlot,
) -> Result<Poll, AppError> {
    sqlx::query_as::<_, Poll>(
        "UPDATE polls
         SET title = $2,
             artist_1_name = $3, artist_1_time = $4, artist_1_stage = $5,
             artist_2_name = $6, artist_2_time = $7, artist_2_stage = $8
         WHERE id = $1
         RETURNING *",
    )
    .bind(poll_id)
    .bind(title)
    .bind(&artist_1.name)
    .bind(&artist_1.time)
    .bind(&artist_1.stage)
    .bind(&artist_2.name)
    .bind(&artist_2.time)
    .bind(&artist_2.stage)
    .fetch_optional(pool)
    .await
    .map_err(AppError::WriteFailure)?
    .ok_or(AppError::NotFound("poll"))
}

pub async fn select_votes(pool: &PgPool, poll_id: Uuid) -> Result<Vec<Vote>, AppError> {
    let votes = sqlx::query_as::<_, Vote>("SELECT * FROM votes WHERE poll_id = $1")
        .bind(poll_id)
        .fetch_all(pool)
        .await?;
    Ok(votes)
}

pub async fn select_own_vote(
    pool: &PgPool,
    poll_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Vote>, AppError> {
    let vote = sqlx::query_as::<_, Vote>(
        "SELECT * FROM votes WHERE poll_id = $1 AND user_id = $2",
    )
    .bind(poll_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(vote)
}

/**
 * Insert-if-absent, else update in place
 *
 * The unique constraint on (poll_id, user_id) is the only serialization for
 * concurrent casts from one voter; the last write wins. Never reimplemented
 * application-side.
 */
pub async fn upsert_vote(
    pool: &PgPool,
    poll_id: Uuid,
    user_id: Uuid,
    choice: Choice,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO votes (poll_id, user_id, choice) VALUES ($1, $2, $3)
         ON CONFLICT (poll_id, user_id) DO UPDATE SET choice = EXCLUDED.choice",
    )
    .bind(poll_id)
    .bind(user_id)
    .bind(i32::from(choice))
    .execute(pool)
    .await
    .map_err(AppError::WriteFailure)?;
    Ok(())
}

/// Vote rows go with the poll via ON DELETE CASCADE.
pub async fn delete_poll(pool: &PgPool, poll_id: Uuid) -> Result<(), AppError> {
    sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(poll_id)
        .execute(pool)
        .await
        .map_err(AppError::WriteFailure)?;
    Ok(())
}

/**
 * The storage primitives the voting session depends on
 *
 * A seam so the session's state machine can run against an in-memory store
 * in tests. The PostgreSQL implementation simply delegates to the query
 * functions above.
 */
#[async_trait]
pub trait VoteStore {
    async fn select_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, AppError>;
    async fn select_votes(&self, poll_id: Uuid) -> Result<Vec<Vote>, AppError>;
    async fn select_own_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, AppError>;
    async fn upsert_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        choice: Choice,
    ) -> Result<(), AppError>;
    async fn delete_poll(&self, poll_id: Uuid) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn select_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, AppError> {
        select_poll(&self.pool, poll_id).await
    }

    async fn select_votes(&self, poll_id: Uuid) -> Result<Vec<Vote>, AppError> {
        select_votes(&self.pool, poll_id).await
    }

    async fn select_own_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Vote>, AppError> {
        select_own_vote(&self.pool, poll_id, user_id).await
    }

    async fn upsert_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        choice: Choice,
    ) -> Result<(), AppError> {
        upsert_vote(&self.pool, poll_id, user_id, choice).await
    }

    async fn delete_poll(&self, poll_id: Uuid) -> Result<(), AppError> {
        delete_poll(&self.pool, poll_id).await
    }
}
