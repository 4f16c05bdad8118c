//! Pull request store on Postgres.
//!
//! Every write runs in a single transaction. The pull request row is locked
//! with `FOR UPDATE` before any status or reviewer change, which serializes
//! concurrent merges and reassignments of the same pull request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prr_id::{PullRequestId, UserId};
use sqlx::PgConnection;

use super::error::is_unique_violation;
use super::rows::{key, PullRequestRow};
use super::{DbError, PgStore};
use crate::domain::{PullRequest, PullRequestSummary};
use crate::store::{
    same_reviewers, MergeOutcome, NewPullRequest, PullRequestStore, StoreError,
};

/// SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

const SELECT_PR: &str = r#"
    SELECT id, title, author_id, status, merged_at
    FROM pull_requests
    WHERE id = $1
"#;

const SELECT_PR_FOR_UPDATE: &str = r#"
    SELECT id, title, author_id, status, merged_at
    FROM pull_requests
    WHERE id = $1
    FOR UPDATE
"#;

async fn reviewers(conn: &mut PgConnection, id: &PullRequestId) -> Result<Vec<UserId>, DbError> {
    let rows: Vec<String> =
        sqlx::query_scalar("SELECT user_id FROM pr_reviewers WHERE pr_id = $1 ORDER BY slot")
            .bind(id.as_str())
            .fetch_all(&mut *conn)
            .await?;

    rows.iter().map(|raw| key("pr_reviewers", raw)).collect()
}

fn assemble(row: PullRequestRow, reviewers: Vec<UserId>) -> Result<PullRequest, DbError> {
    let state = row.state()?;
    Ok(PullRequest {
        id: key("pull_requests", &row.id)?,
        author_id: key("pull_requests", &row.author_id)?,
        title: row.title,
        state,
        reviewers,
    })
}

async fn load(conn: &mut PgConnection, id: &PullRequestId) -> Result<Option<PullRequest>, DbError> {
    let Some(row) = sqlx::query_as::<_, PullRequestRow>(SELECT_PR)
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let reviewers = reviewers(conn, id).await?;
    assemble(row, reviewers).map(Some)
}

async fn insert_reviewers(
    conn: &mut PgConnection,
    id: &PullRequestId,
    reviewers: &[UserId],
) -> Result<(), DbError> {
    for (slot, reviewer) in reviewers.iter().enumerate() {
        sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id, slot) VALUES ($1, $2, $3)")
            .bind(id.as_str())
            .bind(reviewer.as_str())
            .bind(slot as i16)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PullRequestStore for PgStore {
    async fn get(&self, id: &PullRequestId) -> Result<Option<PullRequest>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;
        let pr = load(&mut tx, id).await?;
        tx.commit().await.map_err(DbError::Query)?;
        Ok(pr)
    }

    async fn create_with_reviewers(
        &self,
        pr: &NewPullRequest,
        reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pull_requests (id, title, author_id, status)
            VALUES ($1, $2, $3, 'OPEN')
            "#,
        )
        .bind(pr.id.as_str())
        .bind(&pr.title)
        .bind(pr.author_id.as_str())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e, "pull_requests_pkey") {
                return Err(StoreError::PullRequestExists(pr.id.clone()));
            }
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    return Err(StoreError::UserNotFound(pr.author_id.clone()));
                }
            }
            return Err(DbError::Query(e).into());
        }

        insert_reviewers(&mut tx, &pr.id, reviewers).await?;

        let created = load(&mut tx, &pr.id)
            .await?
            .ok_or_else(|| StoreError::PullRequestNotFound(pr.id.clone()))?;

        tx.commit().await.map_err(DbError::Query)?;

        Ok(created)
    }

    async fn merge(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<MergeOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let row = sqlx::query_as::<_, PullRequestRow>(SELECT_PR_FOR_UPDATE)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::Query)?
            .ok_or_else(|| StoreError::PullRequestNotFound(id.clone()))?;

        let transitioned = !row.state()?.is_merged();
        if transitioned {
            sqlx::query(
                r#"
                UPDATE pull_requests
                SET status = 'MERGED', merged_at = $2
                WHERE id = $1
                "#,
            )
            .bind(id.as_str())
            .bind(merged_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;
        }

        let pull_request = load(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::PullRequestNotFound(id.clone()))?;

        tx.commit().await.map_err(DbError::Query)?;

        Ok(MergeOutcome {
            pull_request,
            transitioned,
        })
    }

    async fn replace_reviewers(
        &self,
        id: &PullRequestId,
        expected: &[UserId],
        new_reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let row = sqlx::query_as::<_, PullRequestRow>(SELECT_PR_FOR_UPDATE)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::Query)?
            .ok_or_else(|| StoreError::PullRequestNotFound(id.clone()))?;

        if row.state()?.is_merged() {
            return Err(StoreError::PullRequestMerged(id.clone()));
        }

        let current = reviewers(&mut tx, id).await?;
        if !same_reviewers(&current, expected) {
            return Err(StoreError::ReviewersChanged(id.clone()));
        }

        sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;

        insert_reviewers(&mut tx, id, new_reviewers).await?;

        let updated = assemble(row, reviewers(&mut tx, id).await?)?;

        tx.commit().await.map_err(DbError::Query)?;

        Ok(updated)
    }

    async fn reviews_for_user(&self, user: &UserId) -> Result<Vec<PullRequestSummary>, StoreError> {
        let rows = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT p.id, p.title, p.author_id, p.status, p.merged_at
            FROM pr_reviewers r
            JOIN pull_requests p ON p.id = r.pr_id
            WHERE r.user_id = $1
            ORDER BY p.id COLLATE "C"
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok(rows
            .iter()
            .map(PullRequestRow::summary)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
