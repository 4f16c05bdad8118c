//! User directory on Postgres.

use async_trait::async_trait;
use prr_id::UserId;

use super::rows::UserRow;
use super::{DbError, PgStore};
use crate::domain::User;
use crate::store::{StoreError, UserDirectory};

const SELECT_USER: &str = r#"
    SELECT u.id, u.name, u.is_active, t.name AS team_name
    FROM users u
    LEFT JOIN team_members tm ON tm.user_id = u.id
    LEFT JOIN teams t ON t.id = tm.team_id
    WHERE u.id = $1
"#;

#[async_trait]
impl UserDirectory for PgStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        Ok(row.map(User::try_from).transpose()?)
    }

    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(is_active)
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::Query)?;

        tx.commit().await.map_err(DbError::Query)?;

        Ok(Some(User::try_from(row)?))
    }
}
