//! User flag updates and review listings.

use std::sync::Arc;

use prr_id::UserId;
use tracing::info;

use super::{Entity, ServiceError};
use crate::domain::{PullRequestSummary, User};
use crate::store::{PullRequestStore, UserDirectory};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserDirectory>,
    pull_requests: Arc<dyn PullRequestStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserDirectory>, pull_requests: Arc<dyn PullRequestStore>) -> Self {
        Self {
            users,
            pull_requests,
        }
    }

    pub async fn set_is_active(&self, id: &UserId, is_active: bool) -> Result<User, ServiceError> {
        let user = self
            .users
            .set_active(id, is_active)
            .await?
            .ok_or_else(|| ServiceError::NotFound(Entity::User(id.clone())))?;

        info!(user_id = %id, is_active, "user activity updated");
        Ok(user)
    }

    /// Pull requests the user reviews, open or merged.
    pub async fn reviews(&self, id: &UserId) -> Result<Vec<PullRequestSummary>, ServiceError> {
        Ok(self.pull_requests.reviews_for_user(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewMember;
    use crate::store::{InMemoryStore, Stores, TeamDirectory as _};
    use prr_id::TeamName;

    #[tokio::test]
    async fn test_set_is_active_round_trips_team() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_team(
                &TeamName::parse("core").unwrap(),
                &[NewMember {
                    user_id: UserId::parse("u1").unwrap(),
                    username: "alice".into(),
                    is_active: true,
                }],
            )
            .await
            .unwrap();
        let stores = Stores::from_backend(store);
        let svc = UserService::new(stores.users, stores.pull_requests);

        let user = svc
            .set_is_active(&UserId::parse("u1").unwrap(), false)
            .await
            .unwrap();
        assert!(!user.is_active);
        assert_eq!(user.team.as_ref().map(TeamName::as_str), Some("core"));

        let err = svc
            .set_is_active(&UserId::parse("ghost").unwrap(), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
