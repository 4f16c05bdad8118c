//! Team roster management.

use std::collections::BTreeSet;
use std::sync::Arc;

use prr_id::TeamName;
use tracing::info;

use super::{Entity, ServiceError};
use crate::domain::{NewMember, Team, TeamUpsert};
use crate::store::TeamDirectory;

#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamDirectory>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamDirectory>) -> Self {
        Self { teams }
    }

    /// Create the team or replace its roster, then return it as stored.
    pub async fn add_team(
        &self,
        name: TeamName,
        members: Vec<NewMember>,
    ) -> Result<(TeamUpsert, Team), ServiceError> {
        let mut seen = BTreeSet::new();
        for member in &members {
            if !seen.insert(&member.user_id) {
                return Err(ServiceError::Invalid(format!(
                    "member {} is listed more than once",
                    member.user_id
                )));
            }
        }

        let outcome = self.teams.upsert_team(&name, &members).await?;
        info!(team = %name, members = members.len(), ?outcome, "team saved");

        let team = self.get_team(&name).await?;
        Ok((outcome, team))
    }

    pub async fn get_team(&self, name: &TeamName) -> Result<Team, ServiceError> {
        self.teams
            .get_team(name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(Entity::Team(name.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use prr_id::UserId;

    fn member(id: &str, username: &str) -> NewMember {
        NewMember {
            user_id: UserId::parse(id).unwrap(),
            username: username.to_string(),
            is_active: true,
        }
    }

    fn team(s: &str) -> TeamName {
        TeamName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_update_roster() {
        let svc = TeamService::new(Arc::new(InMemoryStore::new()));

        let (outcome, created) = svc
            .add_team(team("core"), vec![member("u2", "bob"), member("u1", "alice")])
            .await
            .unwrap();
        assert_eq!(outcome, TeamUpsert::Created);
        let names: Vec<&str> = created.members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);

        let (outcome, updated) = svc
            .add_team(team("core"), vec![member("u1", "alice"), member("u3", "carol")])
            .await
            .unwrap();
        assert_eq!(outcome, TeamUpsert::Updated);
        let ids: Vec<&str> = updated.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, ["u1", "u3"]);
    }

    #[tokio::test]
    async fn test_member_of_other_team_conflicts() {
        let svc = TeamService::new(Arc::new(InMemoryStore::new()));
        svc.add_team(team("core"), vec![member("u1", "alice")])
            .await
            .unwrap();

        let err = svc
            .add_team(team("ops"), vec![member("u1", "alice")])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TEAMS_CONFLICT");

        let err = svc.get_team(&team("ops")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_duplicate_member_is_rejected() {
        let svc = TeamService::new(Arc::new(InMemoryStore::new()));

        let err = svc
            .add_team(team("core"), vec![member("u1", "alice"), member("u1", "alias")])
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_FIELD");
        assert!(svc.get_team(&team("core")).await.is_err());
    }
}
