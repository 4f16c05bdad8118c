//! Application services.
//!
//! Services own the decision logic and talk to storage only through the
//! capability traits in [`crate::store`]. Every error they return carries a
//! stable symbolic code (see [`ServiceError::code`]).

mod pull_requests;
mod statistics;
mod teams;
mod users;

pub use pull_requests::{AssignmentPolicy, Reassigned, ReviewService};
pub use statistics::{StatsService, DEFAULT_STATS_LIMIT, MAX_STATS_LIMIT};
pub use teams::TeamService;
pub use users::UserService;

use std::fmt;

use prr_id::{PullRequestId, TeamName, UserId};
use thiserror::Error;

use crate::store::{StoreError, Stores};

/// Kind of entity a `NotFound` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    User(UserId),
    Team(TeamName),
    PullRequest(PullRequestId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Team(name) => write!(f, "team {name}"),
            Self::PullRequest(id) => write!(f, "pull request {id}"),
        }
    }
}

/// Errors returned by the services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Entity),

    /// The author (or the reviewer being replaced) has no team to pick from.
    #[error("user {0} is not a member of any team")]
    TeamRequired(UserId),

    #[error("pull request {0} already exists")]
    AlreadyExists(PullRequestId),

    #[error("pull request {0} is already merged")]
    PrMerged(PullRequestId),

    #[error("user {user} is not assigned to pull request {pr}")]
    NotAssigned { pr: PullRequestId, user: UserId },

    #[error("no active replacement candidate for pull request {0}")]
    NoCandidates(PullRequestId),

    #[error("user {user} already belongs to team {team}")]
    UserInOtherTeam { user: UserId, team: TeamName },

    #[error("reviewers of pull request {0} changed concurrently, retry")]
    ReviewersChanged(PullRequestId),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("storage failure")]
    Internal(#[source] StoreError),
}

impl ServiceError {
    /// Stable symbolic code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::TeamRequired(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "PR_EXISTS",
            Self::PrMerged(_) => "PR_MERGED",
            Self::NotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidates(_) => "NO_CANDIDATE",
            Self::UserInOtherTeam { .. } => "TEAMS_CONFLICT",
            Self::ReviewersChanged(_) => "REVIEWERS_CHANGED",
            Self::Invalid(_) => "INVALID_FIELD",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReviewersChanged(_) | Self::Internal(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => Self::NotFound(Entity::User(id)),
            StoreError::TeamNotFound(name) => Self::NotFound(Entity::Team(name)),
            StoreError::PullRequestNotFound(id) => Self::NotFound(Entity::PullRequest(id)),
            StoreError::PullRequestExists(id) => Self::AlreadyExists(id),
            StoreError::PullRequestMerged(id) => Self::PrMerged(id),
            StoreError::ReviewersChanged(id) => Self::ReviewersChanged(id),
            StoreError::UserInOtherTeam { user, team } => Self::UserInOtherTeam { user, team },
            e @ StoreError::Db(_) => Self::Internal(e),
        }
    }
}

/// All services, built over one set of stores.
#[derive(Clone)]
pub struct Services {
    pub reviews: ReviewService,
    pub teams: TeamService,
    pub users: UserService,
    pub stats: StatsService,
}

impl Services {
    pub fn new(stores: Stores, policy: AssignmentPolicy) -> Self {
        Self {
            reviews: ReviewService::new(
                stores.users.clone(),
                stores.teams.clone(),
                stores.pull_requests.clone(),
                policy,
            ),
            teams: TeamService::new(stores.teams.clone()),
            users: UserService::new(stores.users.clone(), stores.pull_requests.clone()),
            stats: StatsService::new(stores.statistics),
        }
    }
}
