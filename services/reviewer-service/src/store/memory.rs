//! In-memory implementation of the store traits.
//!
//! All state lives behind one `RwLock`, and each trait method holds the lock
//! for its whole duration, so every write is atomic with respect to other
//! callers. All state is lost on restart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prr_id::{PullRequestId, TeamName, UserId};
use tokio::sync::RwLock;

use super::{
    same_reviewers, MergeOutcome, NewPullRequest, PullRequestStore, StatisticsReader, StoreError,
    TeamDirectory, UserDirectory,
};
use crate::domain::{
    AssignmentStat, AssignmentStatsPage, Member, NewMember, PullRequest, PullRequestState,
    PullRequestSummary, Team, TeamUpsert, User,
};

#[derive(Debug, Clone)]
struct UserRecord {
    username: String,
    is_active: bool,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    teams: BTreeSet<TeamName>,
    memberships: HashMap<UserId, TeamName>,
    pull_requests: BTreeMap<PullRequestId, PullRequest>,
}

impl Inner {
    fn user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|record| User {
            id: id.clone(),
            username: record.username.clone(),
            team: self.memberships.get(id).cloned(),
            is_active: record.is_active,
        })
    }

    fn open_reviews(&self, user: &UserId) -> u32 {
        let count = self
            .pull_requests
            .values()
            .filter(|pr| !pr.state.is_merged() && pr.reviewers.contains(user))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn members(&self, team: &TeamName) -> Vec<Member> {
        let mut members: Vec<Member> = self
            .memberships
            .iter()
            .filter(|(_, t)| *t == team)
            .filter_map(|(id, _)| {
                self.users.get(id).map(|record| Member {
                    user_id: id.clone(),
                    username: record.username.clone(),
                    is_active: record.is_active,
                    open_reviews: self.open_reviews(id),
                })
            })
            .collect();

        // Same order as the Postgres roster query.
        members.sort_by(|a, b| {
            a.username
                .cmp(&b.username)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        members
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.user(id))
    }

    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.users.get_mut(id) else {
            return Ok(None);
        };
        record.is_active = is_active;
        Ok(inner.user(id))
    }
}

#[async_trait]
impl TeamDirectory for InMemoryStore {
    async fn get_team(&self, name: &TeamName) -> Result<Option<Team>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.teams.contains(name) {
            return Ok(None);
        }
        Ok(Some(Team {
            name: name.clone(),
            members: inner.members(name),
        }))
    }

    async fn roster(&self, name: &TeamName) -> Result<Vec<Member>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.teams.contains(name) {
            return Err(StoreError::TeamNotFound(name.clone()));
        }
        Ok(inner.members(name))
    }

    async fn upsert_team(
        &self,
        name: &TeamName,
        members: &[NewMember],
    ) -> Result<TeamUpsert, StoreError> {
        let mut inner = self.inner.write().await;

        // Validate everything before the first mutation.
        for member in members {
            if let Some(team) = inner.memberships.get(&member.user_id) {
                if team != name {
                    return Err(StoreError::UserInOtherTeam {
                        user: member.user_id.clone(),
                        team: team.clone(),
                    });
                }
            }
        }

        let outcome = if inner.teams.insert(name.clone()) {
            TeamUpsert::Created
        } else {
            TeamUpsert::Updated
        };

        let desired: BTreeSet<&UserId> = members.iter().map(|m| &m.user_id).collect();
        inner
            .memberships
            .retain(|id, team| team != name || desired.contains(id));

        for member in members {
            inner.users.insert(
                member.user_id.clone(),
                UserRecord {
                    username: member.username.clone(),
                    is_active: member.is_active,
                },
            );
            inner
                .memberships
                .insert(member.user_id.clone(), name.clone());
        }

        Ok(outcome)
    }
}

#[async_trait]
impl PullRequestStore for InMemoryStore {
    async fn get(&self, id: &PullRequestId) -> Result<Option<PullRequest>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.pull_requests.get(id).cloned())
    }

    async fn create_with_reviewers(
        &self,
        pr: &NewPullRequest,
        reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.pull_requests.contains_key(&pr.id) {
            return Err(StoreError::PullRequestExists(pr.id.clone()));
        }
        if !inner.users.contains_key(&pr.author_id) {
            return Err(StoreError::UserNotFound(pr.author_id.clone()));
        }

        let created = PullRequest {
            id: pr.id.clone(),
            title: pr.title.clone(),
            author_id: pr.author_id.clone(),
            state: PullRequestState::Open,
            reviewers: reviewers.to_vec(),
        };
        inner.pull_requests.insert(pr.id.clone(), created.clone());
        Ok(created)
    }

    async fn merge(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<MergeOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let pr = inner
            .pull_requests
            .get_mut(id)
            .ok_or_else(|| StoreError::PullRequestNotFound(id.clone()))?;

        let transitioned = !pr.state.is_merged();
        if transitioned {
            pr.state = PullRequestState::Merged { merged_at };
        }

        Ok(MergeOutcome {
            pull_request: pr.clone(),
            transitioned,
        })
    }

    async fn replace_reviewers(
        &self,
        id: &PullRequestId,
        expected: &[UserId],
        reviewers: &[UserId],
    ) -> Result<PullRequest, StoreError> {
        let mut inner = self.inner.write().await;
        let pr = inner
            .pull_requests
            .get_mut(id)
            .ok_or_else(|| StoreError::PullRequestNotFound(id.clone()))?;

        if pr.state.is_merged() {
            return Err(StoreError::PullRequestMerged(id.clone()));
        }
        if !same_reviewers(&pr.reviewers, expected) {
            return Err(StoreError::ReviewersChanged(id.clone()));
        }

        pr.reviewers = reviewers.to_vec();
        Ok(pr.clone())
    }

    async fn reviews_for_user(&self, user: &UserId) -> Result<Vec<PullRequestSummary>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .pull_requests
            .values()
            .filter(|pr| pr.reviewers.contains(user))
            .map(PullRequest::summary)
            .collect())
    }
}

#[async_trait]
impl StatisticsReader for InMemoryStore {
    async fn assignment_stats(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<AssignmentStatsPage, StoreError> {
        let inner = self.inner.read().await;

        let mut counts: BTreeMap<&UserId, u64> = BTreeMap::new();
        for pr in inner.pull_requests.values() {
            for reviewer in &pr.reviewers {
                *counts.entry(reviewer).or_default() += 1;
            }
        }

        let mut stats: Vec<AssignmentStat> = counts
            .into_iter()
            .map(|(id, assignments)| AssignmentStat {
                user_id: id.clone(),
                username: inner
                    .users
                    .get(id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                assignments,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.assignments
                .cmp(&a.assignments)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let total = stats.len() as u64;
        let items = stats
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(AssignmentStatsPage {
            items,
            total,
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn member(id: &str, name: &str) -> NewMember {
        NewMember {
            user_id: uid(id),
            username: name.to_string(),
            is_active: true,
        }
    }

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            id: PullRequestId::parse(id).unwrap(),
            title: format!("title {id}"),
            author_id: uid(author),
        }
    }

    #[tokio::test]
    async fn test_roster_is_ordered_by_username_with_open_loads() {
        let store = InMemoryStore::new();
        let team = TeamName::parse("core").unwrap();
        store
            .upsert_team(&team, &[member("u3", "carol"), member("u1", "alice"), member("u2", "bob")])
            .await
            .unwrap();

        store
            .create_with_reviewers(&new_pr("pr-1", "u1"), &[uid("u2"), uid("u3")])
            .await
            .unwrap();
        store
            .create_with_reviewers(&new_pr("pr-2", "u1"), &[uid("u3")])
            .await
            .unwrap();
        store
            .merge(&PullRequestId::parse("pr-2").unwrap(), Utc::now())
            .await
            .unwrap();

        let roster = store.roster(&team).await.unwrap();
        let view: Vec<(&str, u32)> = roster
            .iter()
            .map(|m| (m.username.as_str(), m.open_reviews))
            .collect();
        // Merged pr-2 no longer counts towards carol's load.
        assert_eq!(view, [("alice", 0), ("bob", 1), ("carol", 1)]);
    }

    #[tokio::test]
    async fn test_upsert_rejects_member_of_other_team_without_writing() {
        let store = InMemoryStore::new();
        let core = TeamName::parse("core").unwrap();
        let infra = TeamName::parse("infra").unwrap();
        store.upsert_team(&core, &[member("u1", "alice")]).await.unwrap();

        let err = store
            .upsert_team(&infra, &[member("u2", "bob"), member("u1", "alice")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UserInOtherTeam { .. }));

        assert!(store.get_team(&infra).await.unwrap().is_none());
        assert!(store.get_user(&uid("u2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_roster() {
        let store = InMemoryStore::new();
        let core = TeamName::parse("core").unwrap();
        let first = store
            .upsert_team(&core, &[member("u1", "alice"), member("u2", "bob")])
            .await
            .unwrap();
        assert_eq!(first, TeamUpsert::Created);

        let second = store
            .upsert_team(&core, &[member("u1", "alice"), member("u3", "carol")])
            .await
            .unwrap();
        assert_eq!(second, TeamUpsert::Updated);

        let team = store.get_team(&core).await.unwrap().unwrap();
        let names: Vec<&str> = team.members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, ["alice", "carol"]);

        // bob left the team but stays in the directory, teamless.
        let bob = store.get_user(&uid("u2")).await.unwrap().unwrap();
        assert_eq!(bob.team, None);
    }

    #[tokio::test]
    async fn test_replace_reviewers_compares_expected_set() {
        let store = InMemoryStore::new();
        let core = TeamName::parse("core").unwrap();
        store
            .upsert_team(&core, &[member("u1", "alice"), member("u2", "bob"), member("u3", "carol")])
            .await
            .unwrap();
        let id = PullRequestId::parse("pr-1").unwrap();
        store
            .create_with_reviewers(&new_pr("pr-1", "u1"), &[uid("u2")])
            .await
            .unwrap();

        let err = store
            .replace_reviewers(&id, &[uid("u3")], &[uid("u2"), uid("u3")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReviewersChanged(_)));

        let pr = store
            .replace_reviewers(&id, &[uid("u2")], &[uid("u3")])
            .await
            .unwrap();
        assert_eq!(pr.reviewers, [uid("u3")]);
    }
}
