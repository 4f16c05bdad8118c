//! Capability traits for the directory and pull request persistence.
//!
//! The services only talk to these traits, so the same engine runs on
//! Postgres (`crate::db::PgStore`) and on the in-memory store used by tests
//! and by `storage.backend = "memory"`.
//!
//! Every write method is one atomic unit: it either applies completely or
//! leaves the stored state untouched.

pub mod memory;

pub use memory::InMemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prr_id::{PullRequestId, TeamName, UserId};
use thiserror::Error;

use crate::db::DbError;
use crate::domain::{
    AssignmentStatsPage, Member, NewMember, PullRequest, PullRequestSummary, Team, TeamUpsert,
    User,
};

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("team {0} not found")]
    TeamNotFound(TeamName),

    #[error("pull request {0} not found")]
    PullRequestNotFound(PullRequestId),

    #[error("pull request {0} already exists")]
    PullRequestExists(PullRequestId),

    #[error("pull request {0} is merged")]
    PullRequestMerged(PullRequestId),

    /// The reviewer set changed between read and write.
    #[error("reviewers of pull request {0} changed concurrently")]
    ReviewersChanged(PullRequestId),

    #[error("user {user} already belongs to team {team}")]
    UserInOtherTeam { user: UserId, team: TeamName },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Input for creating a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub id: PullRequestId,
    pub title: String,
    pub author_id: UserId,
}

/// Result of a merge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// State after the call.
    pub pull_request: PullRequest,
    /// False when the pull request was already merged and nothing was written.
    pub transitioned: bool,
}

/// Read and update users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user with their team affiliation.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Set the active flag. Returns `None` if the user does not exist.
    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<Option<User>, StoreError>;
}

/// Read and update team rosters.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Team with members ordered by username, then id.
    async fn get_team(&self, name: &TeamName) -> Result<Option<Team>, StoreError>;

    /// Members of a team with their load as of read time, same order as `get_team`.
    ///
    /// Fails with `TeamNotFound` for an unknown team.
    async fn roster(&self, name: &TeamName) -> Result<Vec<Member>, StoreError>;

    /// Create the team or replace its roster, upserting every member as a user.
    ///
    /// Fails with `UserInOtherTeam` if a member belongs to a different team.
    async fn upsert_team(
        &self,
        name: &TeamName,
        members: &[NewMember],
    ) -> Result<TeamUpsert, StoreError>;
}

/// Persist pull requests and their reviewer sets.
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Pull request with reviewers in slot order.
    async fn get(&self, id: &PullRequestId) -> Result<Option<PullRequest>, StoreError>;

    /// Insert an open pull request together with its reviewers.
    ///
    /// Fails with `PullRequestExists` if the id is taken.
    async fn create_with_reviewers(
        &self,
        pr: &NewPullRequest,
        reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError>;

    /// Transition to merged unless already merged.
    ///
    /// The status check, the update and the snapshot read share one transaction.
    async fn merge(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<MergeOutcome, StoreError>;

    /// Overwrite the reviewer set if it still equals `expected`.
    ///
    /// Fails with `PullRequestMerged` if the pull request was merged and with
    /// `ReviewersChanged` if another writer replaced the set first.
    async fn replace_reviewers(
        &self,
        id: &PullRequestId,
        expected: &[UserId],
        reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError>;

    /// Pull requests the user currently reviews.
    async fn reviews_for_user(&self, user: &UserId) -> Result<Vec<PullRequestSummary>, StoreError>;
}

/// Read-only assignment statistics.
#[async_trait]
pub trait StatisticsReader: Send + Sync {
    /// Users ranked by assignment count, descending.
    async fn assignment_stats(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<AssignmentStatsPage, StoreError>;
}

/// Handles to every capability, usually backed by the same store.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub teams: Arc<dyn TeamDirectory>,
    pub pull_requests: Arc<dyn PullRequestStore>,
    pub statistics: Arc<dyn StatisticsReader>,
}

impl Stores {
    /// Use one backend for all capabilities.
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: UserDirectory + TeamDirectory + PullRequestStore + StatisticsReader + 'static,
    {
        Self {
            users: backend.clone(),
            teams: backend.clone(),
            pull_requests: backend.clone(),
            statistics: backend,
        }
    }
}

/// Compare reviewer sets regardless of slot order.
pub(crate) fn same_reviewers(a: &[UserId], b: &[UserId]) -> bool {
    let mut a: Vec<&UserId> = a.iter().collect();
    let mut b: Vec<&UserId> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}
