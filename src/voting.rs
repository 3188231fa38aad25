/*!
 * The poll voting core: tally computation, the per-viewer voting session,
 * and the creator-only modification rule.
 *
 * Everything here works against the `VoteStore` seam rather than a concrete
 * database so the state machine can be exercised without PostgreSQL.
 */
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Poll, Vote};
use crate::store::VoteStore;

/// One of the two positional options on a poll.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Choice {
    First,
    Second,
}

impl Choice {
    /// Parse a wire/database value. Anything outside {1, 2} is rejected.
    pub fn from_i32(raw: i32) -> Result<Self, AppError> {
        match raw {
            1 => Ok(Choice::First),
            2 => Ok(Choice::Second),
            other => Err(AppError::Invalid(format!(
                "choice must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl From<Choice> for i32 {
    fn from(choice: Choice) -> i32 {
        match choice {
            Choice::First => 1,
            Choice::Second => 2,
        }
    }
}

/// Aggregate counts per option. Derived, never stored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Tally {
    pub option_1: u32,
    pub option_2: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.option_1 + self.option_2
    }
}

/**
 * Count every vote row for a poll
 *
 * Always a full recount over the current rows; there are no incrementally
 * maintained counters to drift. A row carrying a choice outside {1, 2}
 * increments neither counter.
 */
pub fn tally<'a, I>(votes: I) -> Tally
where
    I: IntoIterator<Item = &'a Vote>,
{
    let mut counts = Tally::default();
    for vote in votes {
        match vote.choice {
            1 => counts.option_1 += 1,
            2 => counts.option_2 += 1,
            _ => {}
        }
    }
    counts
}

/// Whether the viewer currently has a recorded choice on the poll.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteState {
    NoVote,
    Voted(Choice),
}

/// What a cast attempt did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CastOutcome {
    /// First vote, recorded as a new row.
    Recorded,
    /// Existing vote switched to the other option, in place.
    Changed,
    /// The viewer re-picked their current choice; nothing was written.
    Unchanged,
    /// No authenticated viewer; nothing was written.
    Declined,
}

/**
 * Creator-only rule for poll edit/delete
 *
 * Rendering uses this to decide which affordances to show, and every
 * mutating handler re-checks it. The database's own access rules remain the
 * final authority either way.
 */
pub fn can_modify(poll: &Poll, viewer: Option<Uuid>) -> bool {
    viewer == Some(poll.creator_id)
}

/**
 * Per-(poll, viewer) runtime state: the viewer's identity, the poll, the
 * viewer's current choice, and the current tallies
 *
 * Pages and API handlers are thin views over this object; they never patch
 * vote state themselves.
 */
pub struct VotingSession<S> {
    store: S,
    poll: Poll,
    viewer: Option<Uuid>,
    state: VoteState,
    tally: Tally,
}

impl<S: VoteStore> VotingSession<S> {
    /// Fetch the poll, the viewer's own vote, and a fresh tally. A missing
    /// poll is a routine `NotFound`, not a failure.
    pub async fn open(
        store: S,
        poll_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let poll = store
            .select_poll(poll_id)
            .await?
            .ok_or(AppError::NotFound("poll"))?;

        let state = match viewer {
            Some(user) => match store.select_own_vote(poll_id, user).await? {
                Some(vote) => Choice::from_i32(vote.choice)
                    .map(VoteState::Voted)
                    .unwrap_or(VoteState::NoVote),
                None => VoteState::NoVote,
            },
            None => VoteState::NoVote,
        };

        let counts = tally(&store.select_votes(poll_id).await?);

        Ok(Self {
            store,
            poll,
            viewer,
            state,
            tally: counts,
        })
    }

    pub fn poll(&self) -> &Poll {
        &self.poll
    }

    pub fn state(&self) -> VoteState {
        self.state
    }

    pub fn own_choice(&self) -> Option<Choice> {
        match self.state() {
            VoteState::Voted(choice) => Some(choice),
            VoteState::NoVote => None,
        }
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn can_modify(&self) -> bool {
        can_modify(&self.poll, self.viewer)
    }

    /**
     * The single state transition
     *
     * An anonymous viewer declines without touching anything. Re-picking the
     * current choice is an idempotent no-op. Otherwise the choice is written
     * through one durable upsert, and only after that write succeeds are the
     * vote rows re-fetched and the tally recomputed. A failed write leaves
     * the session exactly as it was.
     */
    pub async fn cast_or_change(&mut self, choice: Choice) -> Result<CastOutcome, AppError> {
        let viewer = match self.viewer {
            Some(user) => user,
            None => return Ok(CastOutcome::Declined),
        };

        if self.state == VoteState::Voted(choice) {
            return Ok(CastOutcome::Unchanged);
        }

        self.store
            .upsert_vote(self.poll.id, viewer, choice)
            .await?;

        let previous = self.state;
        self.state = VoteState::Voted(choice);
        self.tally = tally(&self.store.select_votes(self.poll.id).await?);

        Ok(match previous {
            VoteState::NoVote => CastOutcome::Recorded,
            VoteState::Voted(_) => CastOutcome::Changed,
        })
    }

    /// Creator-only deletion. Vote rows disappear through the storage
    /// layer's referential policy, not through application code.
    pub async fn delete_poll(&self) -> Result<(), AppError> {
        if self.viewer.is_none() {
            return Err(AppError::Unauthenticated);
        }
        if !self.can_modify() {
            return Err(AppError::Forbidden("only the poll's creator can delete it"));
        }
        self.store.delete_poll(self.poll.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    /// In-memory stand-in for the vote tables, with a switch to make every
    /// write fail and a counter to observe write traffic.
    #[derive(Default)]
    struct MemoryStore {
        polls: Mutex<HashMap<Uuid, Poll>>,
        votes: Mutex<Vec<Vote>>,
        writes: Mutex<u32>,
        fail_writes: Mutex<bool>,
    }

    impl MemoryStore {
        fn with_poll(poll: Poll) -> Arc<Self> {
            let store = MemoryStore::default();
            store.polls.lock().unwrap().insert(poll.id, poll);
            Arc::new(store)
        }

        fn rows_for(&self, poll_id: Uuid) -> Vec<Vote> {
            self.votes
                .lock()
                .unwrap()
                .iter()
                .filter(|v| v.poll_id == poll_id)
                .cloned()
                .collect()
        }

        fn write_count(&self) -> u32 {
            *self.writes.lock().unwrap()
        }

        fn fail_next_writes(&self, fail: bool) {
            *self.fail_writes.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl VoteStore for Arc<MemoryStore> {
        async fn select_poll(&self, poll_id: Uuid) -> Result<Option<Poll>, AppError> {
            Ok(self.polls.lock().unwrap().get(&poll_id).cloned())
        }

        async fn select_votes(&self, poll_id: Uuid) -> Result<Vec<Vote>, AppError> {
            Ok(self.rows_for(poll_id))
        }

        async fn select_own_vote(
            &self,
            poll_id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<Vote>, AppError> {
            Ok(self
                .votes
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.poll_id == poll_id && v.user_id == user_id)
                .cloned())
        }

        async fn upsert_vote(
            &self,
            poll_id: Uuid,
            user_id: Uuid,
            choice: Choice,
        ) -> Result<(), AppError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::WriteFailure(sqlx::Error::PoolClosed));
            }
            *self.writes.lock().unwrap() += 1;

            let mut votes = self.votes.lock().unwrap();
            if let Some(existing) = votes
                .iter_mut()
                .find(|v| v.poll_id == poll_id && v.user_id == user_id)
            {
                existing.choice = i32::from(choice);
            } else {
                let id = votes.len() as i32 + 1;
                votes.push(Vote {
                    id,
                    poll_id,
                    user_id,
                    choice: i32::from(choice),
                    created_at: Utc::now(),
                });
            }
            Ok(())
        }

        async fn delete_poll(&self, poll_id: Uuid) -> Result<(), AppError> {
            if *self.fail_writes.lock().unwrap() {
                return Err(AppError::WriteFailure(sqlx::Error::PoolClosed));
            }
            self.polls.lock().unwrap().remove(&poll_id);
            self.votes.lock().unwrap().retain(|v| v.poll_id != poll_id);
            Ok(())
        }
    }

    fn poll_created_by(creator: Uuid) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            crew_id: Uuid::new_v4(),
            creator_id: creator,
            title: Some("Who are we seeing Friday night?".to_string()),
            artist_1_name: "Four Tet".to_string(),
            artist_1_time: "9:30-11:00".to_string(),
            artist_1_stage: "Main Stage".to_string(),
            artist_2_name: "Jamie xx".to_string(),
            artist_2_time: "9:45-10:45".to_string(),
            artist_2_stage: "The Grove".to_string(),
            created_at: Utc::now(),
        }
    }

    fn vote_row(poll_id: Uuid, choice: i32) -> Vote {
        Vote {
            id: 0,
            poll_id,
            user_id: Uuid::new_v4(),
            choice,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tally_counts_each_option_and_sums_to_row_count() {
        let poll_id = Uuid::new_v4();
        let votes = vec![
            vote_row(poll_id, 1),
            vote_row(poll_id, 2),
            vote_row(poll_id, 1),
            vote_row(poll_id, 1),
        ];

        let counts = tally(&votes);
        assert_eq!(counts.option_1, 3);
        assert_eq!(counts.option_2, 1);
        assert_eq!(counts.total(), votes.len() as u32);
    }

    #[test]
    fn tally_ignores_out_of_range_choices() {
        let poll_id = Uuid::new_v4();
        let votes = vec![
            vote_row(poll_id, 1),
            vote_row(poll_id, 7),
            vote_row(poll_id, 0),
            vote_row(poll_id, 2),
        ];

        let counts = tally(&votes);
        assert_eq!(counts.option_1, 1);
        assert_eq!(counts.option_2, 1);
    }

    #[test]
    fn choice_parse_rejects_out_of_range() {
        assert!(matches!(Choice::from_i32(1), Ok(Choice::First)));
        assert!(matches!(Choice::from_i32(2), Ok(Choice::Second)));
        assert!(matches!(Choice::from_i32(0), Err(AppError::Invalid(_))));
        assert!(matches!(Choice::from_i32(3), Err(AppError::Invalid(_))));
    }

    #[async_std::test]
    async fn first_cast_records_a_vote() {
        let voter = Uuid::new_v4();
        let poll = poll_created_by(Uuid::new_v4());
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut session = VotingSession::open(store.clone(), poll_id, Some(voter))
            .await
            .unwrap();
        assert_eq!(session.state(), VoteState::NoVote);

        let outcome = session.cast_or_change(Choice::First).await.unwrap();
        assert_eq!(outcome, CastOutcome::Recorded);
        assert_eq!(session.state(), VoteState::Voted(Choice::First));
        assert_eq!(session.tally(), Tally { option_1: 1, option_2: 0 });
        assert_eq!(store.rows_for(poll_id).len(), 1);
    }

    #[async_std::test]
    async fn change_of_mind_keeps_a_single_row() {
        let voter = Uuid::new_v4();
        let poll = poll_created_by(Uuid::new_v4());
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut session = VotingSession::open(store.clone(), poll_id, Some(voter))
            .await
            .unwrap();

        for (choice, expected) in [
            (Choice::First, 1),
            (Choice::Second, 2),
            (Choice::First, 1),
        ]
        .iter()
        {
            session.cast_or_change(*choice).await.unwrap();
            let rows = store.rows_for(poll_id);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].choice, *expected);
        }
    }

    #[async_std::test]
    async fn recasting_the_same_choice_writes_nothing() {
        let voter = Uuid::new_v4();
        let poll = poll_created_by(Uuid::new_v4());
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut session = VotingSession::open(store.clone(), poll_id, Some(voter))
            .await
            .unwrap();

        session.cast_or_change(Choice::Second).await.unwrap();
        let writes_before = store.write_count();
        let tally_before = session.tally();

        let outcome = session.cast_or_change(Choice::Second).await.unwrap();
        assert_eq!(outcome, CastOutcome::Unchanged);
        assert_eq!(store.write_count(), writes_before);
        assert_eq!(session.tally(), tally_before);
    }

    #[async_std::test]
    async fn anonymous_cast_declines_without_writing() {
        let poll = poll_created_by(Uuid::new_v4());
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut session = VotingSession::open(store.clone(), poll_id, None)
            .await
            .unwrap();

        let outcome = session.cast_or_change(Choice::First).await.unwrap();
        assert_eq!(outcome, CastOutcome::Declined);
        assert_eq!(session.state(), VoteState::NoVote);
        assert_eq!(store.write_count(), 0);
        assert!(store.rows_for(poll_id).is_empty());
    }

    #[async_std::test]
    async fn failed_write_leaves_the_session_untouched() {
        let voter = Uuid::new_v4();
        let poll = poll_created_by(Uuid::new_v4());
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut session = VotingSession::open(store.clone(), poll_id, Some(voter))
            .await
            .unwrap();
        store.fail_next_writes(true);

        let result = session.cast_or_change(Choice::First).await;
        assert!(matches!(result, Err(AppError::WriteFailure(_))));
        assert_eq!(session.state(), VoteState::NoVote);
        assert_eq!(session.tally(), Tally::default());
        assert!(store.rows_for(poll_id).is_empty());
    }

    #[async_std::test]
    async fn only_the_creator_can_modify() {
        let creator = Uuid::new_v4();
        let voter = Uuid::new_v4();
        let poll = poll_created_by(creator);
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll.clone());

        assert!(can_modify(&poll, Some(creator)));
        assert!(!can_modify(&poll, Some(voter)));
        assert!(!can_modify(&poll, None));

        // Having voted grants no edit rights.
        let mut session = VotingSession::open(store.clone(), poll_id, Some(voter))
            .await
            .unwrap();
        session.cast_or_change(Choice::First).await.unwrap();
        assert!(!session.can_modify());

        let result = session.delete_poll().await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let anonymous = VotingSession::open(store.clone(), poll_id, None)
            .await
            .unwrap();
        assert!(matches!(
            anonymous.delete_poll().await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[async_std::test]
    async fn tallies_converge_and_the_creator_deletes() {
        let creator = Uuid::new_v4();
        let second_voter = Uuid::new_v4();
        let third_voter = Uuid::new_v4();
        let poll = poll_created_by(creator);
        let poll_id = poll.id;
        let store = MemoryStore::with_poll(poll);

        let mut second = VotingSession::open(store.clone(), poll_id, Some(second_voter))
            .await
            .unwrap();
        second.cast_or_change(Choice::First).await.unwrap();
        assert_eq!(second.tally(), Tally { option_1: 1, option_2: 0 });

        let mut third = VotingSession::open(store.clone(), poll_id, Some(third_voter))
            .await
            .unwrap();
        third.cast_or_change(Choice::Second).await.unwrap();
        assert_eq!(third.tally(), Tally { option_1: 1, option_2: 1 });

        let outcome = second.cast_or_change(Choice::Second).await.unwrap();
        assert_eq!(outcome, CastOutcome::Changed);
        assert_eq!(second.tally(), Tally { option_1: 0, option_2: 2 });

        let owner = VotingSession::open(store.clone(), poll_id, Some(creator))
            .await
            .unwrap();
        owner.delete_poll().await.unwrap();

        let reopened = VotingSession::open(store.clone(), poll_id, Some(creator)).await;
        assert!(matches!(reopened, Err(AppError::NotFound(_))));
        assert!(store.rows_for(poll_id).is_empty());
    }
}
