//! Row types and their conversion into domain values.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use prr_id::{IdError, PullRequestId, UserId};
use sqlx::{postgres::PgRow, Row};

use super::DbError;
use crate::domain::{
    AssignmentStat, Member, PullRequestState, PullRequestStatus, PullRequestSummary, User,
};

/// Parse a stored key, reporting a corrupt row instead of panicking.
pub(super) fn key<K>(table: &'static str, raw: &str) -> Result<K, DbError>
where
    K: FromStr<Err = IdError>,
{
    raw.parse().map_err(|e: IdError| DbError::Corrupt {
        table,
        message: e.to_string(),
    })
}

fn count(table: &'static str, raw: i64) -> Result<u32, DbError> {
    u32::try_from(raw).map_err(|_| DbError::Corrupt {
        table,
        message: format!("count out of range: {raw}"),
    })
}

#[derive(Debug)]
pub(super) struct UserRow {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub team_name: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            team_name: row.try_get("team_name")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: key("users", &row.id)?,
            username: row.name,
            team: row
                .team_name
                .as_deref()
                .map(|name| key("teams", name))
                .transpose()?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug)]
pub(super) struct MemberRow {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub open_reviews: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for MemberRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            open_reviews: row.try_get("open_reviews")?,
        })
    }
}

impl TryFrom<MemberRow> for Member {
    type Error = DbError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: key("users", &row.id)?,
            username: row.name,
            is_active: row.is_active,
            open_reviews: count("pr_reviewers", row.open_reviews)?,
        })
    }
}

#[derive(Debug)]
pub(super) struct PullRequestRow {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub status: String,
    pub merged_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for PullRequestRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            status: row.try_get("status")?,
            merged_at: row.try_get("merged_at")?,
        })
    }
}

impl PullRequestRow {
    pub fn state(&self) -> Result<PullRequestState, DbError> {
        match (PullRequestStatus::parse(&self.status), self.merged_at) {
            (Some(PullRequestStatus::Open), None) => Ok(PullRequestState::Open),
            (Some(PullRequestStatus::Merged), Some(merged_at)) => {
                Ok(PullRequestState::Merged { merged_at })
            }
            (status, merged_at) => Err(DbError::Corrupt {
                table: "pull_requests",
                message: format!(
                    "pull request {} has status {:?} with merged_at {:?}",
                    self.id, status, merged_at
                ),
            }),
        }
    }

    pub fn summary(&self) -> Result<PullRequestSummary, DbError> {
        Ok(PullRequestSummary {
            id: key::<PullRequestId>("pull_requests", &self.id)?,
            title: self.title.clone(),
            author_id: key::<UserId>("pull_requests", &self.author_id)?,
            status: self.state()?.status(),
        })
    }
}

#[derive(Debug)]
pub(super) struct StatRow {
    pub user_id: String,
    pub name: Option<String>,
    pub assignments_count: i64,
    pub total_count: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for StatRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            assignments_count: row.try_get("assignments_count")?,
            total_count: row.try_get("total_count")?,
        })
    }
}

impl TryFrom<StatRow> for AssignmentStat {
    type Error = DbError;

    fn try_from(row: StatRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: key("pr_reviewers", &row.user_id)?,
            username: row.name.unwrap_or_default(),
            assignments: u64::try_from(row.assignments_count).unwrap_or(0),
        })
    }
}
