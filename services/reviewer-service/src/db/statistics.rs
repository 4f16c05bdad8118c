//! Assignment statistics on Postgres.

use async_trait::async_trait;

use super::rows::StatRow;
use super::{DbError, PgStore};
use crate::domain::{AssignmentStat, AssignmentStatsPage};
use crate::store::{StatisticsReader, StoreError};

#[async_trait]
impl StatisticsReader for PgStore {
    async fn assignment_stats(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<AssignmentStatsPage, StoreError> {
        if limit == 0 {
            return Ok(AssignmentStatsPage {
                items: Vec::new(),
                total: 0,
                limit,
                offset,
            });
        }

        let rows = sqlx::query_as::<_, StatRow>(
            r#"
            WITH stats AS (
                SELECT r.user_id, u.name, COUNT(*) AS assignments_count
                FROM pr_reviewers r
                LEFT JOIN users u ON u.id = r.user_id
                GROUP BY r.user_id, u.name
            )
            SELECT
                stats.user_id,
                stats.name,
                stats.assignments_count,
                COUNT(*) OVER () AS total_count
            FROM stats
            ORDER BY stats.assignments_count DESC, stats.user_id COLLATE "C" ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)?;

        // The window count is computed before LIMIT/OFFSET, so any row carries it.
        let mut total = rows
            .first()
            .map(|r| u64::try_from(r.total_count).unwrap_or(0))
            .unwrap_or(0);

        if rows.is_empty() && offset > 0 {
            // Past the last page there is no row to carry the total.
            let count: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM pr_reviewers")
                .fetch_one(&self.pool)
                .await
                .map_err(DbError::Query)?;
            total = u64::try_from(count).unwrap_or(0);
        }

        let items = rows
            .into_iter()
            .map(AssignmentStat::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AssignmentStatsPage {
            items,
            total,
            limit,
            offset,
        })
    }
}
