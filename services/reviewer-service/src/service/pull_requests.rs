//! Pull request lifecycle: create with reviewers, merge, reassign.

use std::sync::Arc;

use chrono::Utc;
use prr_assign::{plan_assignment, plan_reassignment, Candidate, REVIEWER_QUOTA};
use prr_id::{PullRequestId, TeamName, UserId};
use tracing::{debug, info, warn};

use super::{Entity, ServiceError};
use crate::domain::{Member, PullRequest, PullRequestSummary};
use crate::store::{NewPullRequest, PullRequestStore, StoreError, TeamDirectory, UserDirectory};

/// Knobs for building the candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentPolicy {
    /// Drop inactive members before ranking.
    pub exclude_inactive: bool,
}

impl AssignmentPolicy {
    fn candidates(&self, roster: &[Member]) -> Vec<Candidate> {
        roster
            .iter()
            .filter(|m| !self.exclude_inactive || m.is_active)
            .map(|m| Candidate::new(m.user_id.clone(), m.open_reviews))
            .collect()
    }
}

/// Result of a successful reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassigned {
    pub pull_request: PullRequest,
    /// User who took the vacated slot.
    pub replaced_by: UserId,
}

#[derive(Clone)]
pub struct ReviewService {
    users: Arc<dyn UserDirectory>,
    teams: Arc<dyn TeamDirectory>,
    pull_requests: Arc<dyn PullRequestStore>,
    policy: AssignmentPolicy,
}

impl ReviewService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        teams: Arc<dyn TeamDirectory>,
        pull_requests: Arc<dyn PullRequestStore>,
        policy: AssignmentPolicy,
    ) -> Self {
        Self {
            users,
            teams,
            pull_requests,
            policy,
        }
    }

    /// Create an open pull request and assign up to two reviewers from the
    /// author's team.
    ///
    /// The pull request row and its reviewers are written together, so a
    /// failure leaves nothing behind.
    pub async fn create(
        &self,
        id: PullRequestId,
        title: String,
        author_id: UserId,
    ) -> Result<PullRequest, ServiceError> {
        let team = self.team_of(&author_id).await?;

        if self.pull_requests.get(&id).await?.is_some() {
            return Err(ServiceError::AlreadyExists(id));
        }

        let roster = self.roster(&author_id, &team).await?;
        let reviewers = plan_assignment(&author_id, &self.policy.candidates(&roster));

        let new = NewPullRequest {
            id,
            title,
            author_id,
        };
        let pr = self
            .pull_requests
            .create_with_reviewers(&new, &reviewers)
            .await?;

        if pr.reviewers.is_empty() {
            warn!(pr_id = %pr.id, author_id = %pr.author_id, team = %team, "no reviewers available");
        }
        info!(
            pr_id = %pr.id,
            author_id = %pr.author_id,
            reviewers = ?ids(&pr.reviewers),
            "pull request created"
        );

        Ok(pr)
    }

    /// Mark the pull request merged. Calling it again returns the stored
    /// state unchanged.
    pub async fn merge(&self, id: &PullRequestId) -> Result<PullRequest, ServiceError> {
        let outcome = self.pull_requests.merge(id, Utc::now()).await?;

        if outcome.transitioned {
            info!(pr_id = %id, "pull request merged");
        } else {
            debug!(pr_id = %id, "pull request already merged");
        }

        Ok(outcome.pull_request)
    }

    /// Replace `old` with the least loaded eligible member of the author's team.
    pub async fn reassign(
        &self,
        id: &PullRequestId,
        old: &UserId,
    ) -> Result<Reassigned, ServiceError> {
        let pr = self
            .pull_requests
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(Entity::PullRequest(id.clone())))?;

        if self.users.get_user(old).await?.is_none() {
            return Err(ServiceError::NotFound(Entity::User(old.clone())));
        }

        if !pr.reviewers.contains(old) {
            return Err(ServiceError::NotAssigned {
                pr: id.clone(),
                user: old.clone(),
            });
        }

        if pr.state.is_merged() {
            return Err(ServiceError::PrMerged(id.clone()));
        }

        let team = self.team_of(&pr.author_id).await?;
        let roster = self.roster(&pr.author_id, &team).await?;

        let plan = plan_reassignment(
            &pr.reviewers,
            old,
            &pr.author_id,
            &self.policy.candidates(&roster),
            REVIEWER_QUOTA,
        )
        .ok_or_else(|| ServiceError::NoCandidates(id.clone()))?;

        let replaced_by = plan.replaced_by().clone();
        let updated = self
            .pull_requests
            .replace_reviewers(id, &pr.reviewers, &plan.reviewers)
            .await?;

        info!(
            pr_id = %id,
            old_reviewer = %old,
            replaced_by = %replaced_by,
            reviewers = ?ids(&updated.reviewers),
            "reviewer reassigned"
        );

        Ok(Reassigned {
            pull_request: updated,
            replaced_by,
        })
    }

    /// Pull requests the user currently reviews. Unknown users have none.
    pub async fn reviews_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<PullRequestSummary>, ServiceError> {
        Ok(self.pull_requests.reviews_for_user(user).await?)
    }

    async fn team_of(&self, user: &UserId) -> Result<TeamName, ServiceError> {
        let user = self
            .users
            .get_user(user)
            .await?
            .ok_or_else(|| ServiceError::NotFound(Entity::User(user.clone())))?;

        user.team.ok_or(ServiceError::TeamRequired(user.id))
    }

    async fn roster(&self, user: &UserId, team: &TeamName) -> Result<Vec<Member>, ServiceError> {
        match self.teams.roster(team).await {
            Ok(roster) => Ok(roster),
            // The membership was removed between the two reads.
            Err(StoreError::TeamNotFound(_)) => Err(ServiceError::TeamRequired(user.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

fn ids(users: &[UserId]) -> Vec<&str> {
    users.iter().map(UserId::as_str).collect()
}
