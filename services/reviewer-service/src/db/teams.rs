//! Team directory on Postgres.

use async_trait::async_trait;
use prr_id::{TeamName, UserId};
use sqlx::Row;

use super::error::is_unique_violation;
use super::rows::{key, MemberRow};
use super::{DbError, PgStore};
use crate::domain::{Member, NewMember, Team, TeamUpsert};
use crate::store::{StoreError, TeamDirectory};

// Load counts open pull requests only. Members are ordered by username, then
// id, byte-wise so the order does not depend on the database locale.
const SELECT_MEMBERS: &str = r#"
    SELECT
        u.id,
        u.name,
        u.is_active,
        (
            SELECT COUNT(*)
            FROM pr_reviewers r
            JOIN pull_requests p ON p.id = r.pr_id
            WHERE r.user_id = u.id AND p.status = 'OPEN'
        ) AS open_reviews
    FROM team_members tm
    JOIN users u ON u.id = tm.user_id
    WHERE tm.team_id = $1
    ORDER BY u.name COLLATE "C", u.id COLLATE "C"
"#;

impl PgStore {
    async fn team_id(&self, name: &TeamName) -> Result<Option<i64>, DbError> {
        let id = sqlx::query_scalar("SELECT id FROM teams WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn members(&self, team_id: i64) -> Result<Vec<Member>, DbError> {
        let rows = sqlx::query_as::<_, MemberRow>(SELECT_MEMBERS)
            .bind(team_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Member::try_from).collect()
    }

    /// Team currently holding `user`, if any.
    async fn team_of(&self, user: &UserId) -> Result<Option<TeamName>, DbError> {
        let name: Option<String> = sqlx::query_scalar(
            r#"
            SELECT t.name
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE tm.user_id = $1
            "#,
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        name.as_deref().map(|n| key("teams", n)).transpose()
    }
}

#[async_trait]
impl TeamDirectory for PgStore {
    async fn get_team(&self, name: &TeamName) -> Result<Option<Team>, StoreError> {
        let Some(team_id) = self.team_id(name).await? else {
            return Ok(None);
        };

        Ok(Some(Team {
            name: name.clone(),
            members: self.members(team_id).await?,
        }))
    }

    async fn roster(&self, name: &TeamName) -> Result<Vec<Member>, StoreError> {
        let team_id = self
            .team_id(name)
            .await?
            .ok_or_else(|| StoreError::TeamNotFound(name.clone()))?;

        Ok(self.members(team_id).await?)
    }

    async fn upsert_team(
        &self,
        name: &TeamName,
        members: &[NewMember],
    ) -> Result<TeamUpsert, StoreError> {
        let member_ids: Vec<String> = members.iter().map(|m| m.user_id.to_string()).collect();

        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO teams (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        let (team_id, outcome) = match inserted {
            Some(id) => (id, TeamUpsert::Created),
            None => {
                // Lock the team row so concurrent roster updates serialize.
                let id: i64 = sqlx::query_scalar("SELECT id FROM teams WHERE name = $1 FOR UPDATE")
                    .bind(name.as_str())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(DbError::Query)?;
                (id, TeamUpsert::Updated)
            }
        };

        let foreign = sqlx::query(
            r#"
            SELECT tm.user_id, t.name
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE tm.user_id = ANY($1) AND tm.team_id <> $2
            ORDER BY tm.user_id
            LIMIT 1
            "#,
        )
        .bind(&member_ids)
        .bind(team_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        if let Some(row) = foreign {
            let user: String = row.try_get("user_id").map_err(DbError::Query)?;
            let team: String = row.try_get("name").map_err(DbError::Query)?;
            return Err(StoreError::UserInOtherTeam {
                user: key("team_members", &user)?,
                team: key("teams", &team)?,
            });
        }

        for member in members {
            sqlx::query(
                r#"
                INSERT INTO users (id, name, is_active)
                VALUES ($1, $2, $3)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    is_active = EXCLUDED.is_active,
                    updated_at = now()
                "#,
            )
            .bind(member.user_id.as_str())
            .bind(&member.username)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;
        }

        sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND NOT (user_id = ANY($2))")
            .bind(team_id)
            .bind(&member_ids)
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;

        for member in members {
            let result = sqlx::query(
                r#"
                INSERT INTO team_members (team_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (team_id, user_id) DO NOTHING
                "#,
            )
            .bind(team_id)
            .bind(member.user_id.as_str())
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                if is_unique_violation(&e, "team_members_user_id_key") {
                    // Another roster update claimed the user after our check.
                    drop(tx);
                    let team = self
                        .team_of(&member.user_id)
                        .await?
                        .unwrap_or_else(|| name.clone());
                    return Err(StoreError::UserInOtherTeam {
                        user: member.user_id.clone(),
                        team,
                    });
                }
                return Err(DbError::Query(e).into());
            }
        }

        tx.commit().await.map_err(DbError::Query)?;

        Ok(outcome)
    }
}
