//! Domain model shared by the stores, services and API.

use std::fmt;

use chrono::{DateTime, Utc};
use prr_id::{PullRequestId, TeamName, UserId};
use serde::{Deserialize, Serialize};

/// A directory user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Team the user belongs to, if any.
    pub team: Option<TeamName>,
    pub is_active: bool,
}

/// A team member as seen by the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
    /// Open pull requests this member currently reviews.
    pub open_reviews: u32,
}

/// A team with its members in canonical order (username, then id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: TeamName,
    pub members: Vec<Member>,
}

/// Member entry of a team add/update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

/// Whether a team upsert created the team or replaced its roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamUpsert {
    Created,
    Updated,
}

/// Wire-level lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            _ => None,
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state. The merge timestamp only exists in the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Merged { merged_at: DateTime<Utc> },
}

impl PullRequestState {
    pub fn status(&self) -> PullRequestStatus {
        match self {
            Self::Open => PullRequestStatus::Open,
            Self::Merged { .. } => PullRequestStatus::Merged,
        }
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Open => None,
            Self::Merged { merged_at } => Some(*merged_at),
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// A pull request together with its assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: PullRequestId,
    pub title: String,
    pub author_id: UserId,
    pub state: PullRequestState,
    /// Assigned reviewers in slot order.
    pub reviewers: Vec<UserId>,
}

impl PullRequest {
    pub fn summary(&self) -> PullRequestSummary {
        PullRequestSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            author_id: self.author_id.clone(),
            status: self.state.status(),
        }
    }
}

/// Pull request without its reviewer set, as listed for a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub id: PullRequestId,
    pub title: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
}

/// Assignment count for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStat {
    pub user_id: UserId,
    pub username: String,
    pub assignments: u64,
}

/// One page of assignment statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStatsPage {
    pub items: Vec<AssignmentStat>,
    /// Number of users with at least one assignment.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}
