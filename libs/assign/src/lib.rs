//! Reviewer selection policy.
//!
//! This library decides who reviews a pull request. It works on an explicit
//! snapshot of the author's team, so the same snapshot always yields the same
//! reviewers. Key concepts:
//!
//! - **Candidate**: a team member together with their load at read time.
//! - **Load**: number of open pull requests the member currently reviews.
//! - **Retained set**: reviewers kept across a reassignment.
//!
//! # Invariants
//!
//! - Selection never performs I/O and never fails
//! - Candidates are ranked by ascending load; ties keep input order
//! - Excluded users (author, replaced reviewer, retained reviewers) are never selected
//! - At most `quota` reviewers are produced

use std::collections::BTreeSet;

use prr_id::UserId;

/// Maximum number of reviewers assigned to a pull request.
pub const REVIEWER_QUOTA: usize = 2;

/// A team member eligible for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Member id.
    pub user_id: UserId,

    /// Open reviews currently assigned to the member.
    pub load: u32,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(user_id: UserId, load: u32) -> Self {
        Self { user_id, load }
    }
}

/// Pick up to `quota` reviewers from `candidates`, lowest load first.
///
/// Ties are broken by position in `candidates`, so callers must pass the
/// roster in its canonical order (by username). A user listed twice is only
/// picked once.
pub fn select(candidates: &[Candidate], exclude: &BTreeSet<UserId>, quota: usize) -> Vec<UserId> {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    // `sort_by_key` is stable, which is what keeps ties in roster order.
    ranked.sort_by_key(|c| c.load);

    let mut picked: Vec<UserId> = Vec::with_capacity(quota.min(ranked.len()));
    for candidate in ranked {
        if picked.len() >= quota {
            break;
        }
        if exclude.contains(&candidate.user_id) || picked.contains(&candidate.user_id) {
            continue;
        }
        picked.push(candidate.user_id.clone());
    }

    picked
}

/// Reviewers for a freshly created pull request.
///
/// An empty result is valid: the author may be alone in their team.
pub fn plan_assignment(author: &UserId, candidates: &[Candidate]) -> Vec<UserId> {
    let exclude = BTreeSet::from([author.clone()]);
    select(candidates, &exclude, REVIEWER_QUOTA)
}

/// Outcome of replacing a single reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Full reviewer set to persist: retained reviewers first, then new ones.
    pub reviewers: Vec<UserId>,

    /// Reviewers that were not on the pull request before.
    pub added: Vec<UserId>,
}

impl Reassignment {
    /// The user who took the replaced reviewer's slot.
    pub fn replaced_by(&self) -> &UserId {
        // `plan_reassignment` never builds a Reassignment with nothing added.
        &self.added[0]
    }
}

/// Replace `old` among `current` reviewers.
///
/// Returns `None` when no candidate outside `{old, author} ∪ retained` exists;
/// the caller must then leave the stored reviewer set untouched.
pub fn plan_reassignment(
    current: &[UserId],
    old: &UserId,
    author: &UserId,
    candidates: &[Candidate],
    quota: usize,
) -> Option<Reassignment> {
    let retained: Vec<UserId> = current.iter().filter(|id| *id != old).cloned().collect();

    let mut exclude: BTreeSet<UserId> = retained.iter().cloned().collect();
    exclude.insert(old.clone());
    exclude.insert(author.clone());

    let added = select(candidates, &exclude, quota.saturating_sub(retained.len()));
    if added.is_empty() {
        return None;
    }

    let mut reviewers = retained;
    reviewers.extend(added.iter().cloned());

    Some(Reassignment { reviewers, added })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn roster(members: &[(&str, u32)]) -> Vec<Candidate> {
        members
            .iter()
            .map(|(id, load)| Candidate::new(uid(id), *load))
            .collect()
    }

    fn ids(list: &[UserId]) -> Vec<&str> {
        list.iter().map(UserId::as_str).collect()
    }

    #[test]
    fn test_assignment_skips_author_and_ranks_by_load() {
        let team = roster(&[("alice", 0), ("bob", 1), ("carol", 3)]);
        let picked = plan_assignment(&uid("alice"), &team);
        assert_eq!(ids(&picked), ["bob", "carol"]);
    }

    #[rstest]
    #[case::ties_keep_roster_order(&[("a", 1), ("b", 1), ("c", 1)], &["b", "c"])]
    #[case::lowest_load_first(&[("a", 0), ("b", 5), ("c", 2), ("d", 0)], &["d", "c"])]
    #[case::author_alone(&[("a", 0)], &[])]
    #[case::single_teammate(&[("a", 9), ("b", 4)], &["b"])]
    fn test_assignment_cases(#[case] members: &[(&str, u32)], #[case] expected: &[&str]) {
        let picked = plan_assignment(&uid("a"), &roster(members));
        assert_eq!(ids(&picked), expected);
    }

    #[test]
    fn test_select_respects_quota_and_duplicates() {
        let team = roster(&[("x", 0), ("x", 0), ("y", 1), ("z", 2)]);
        let picked = select(&team, &BTreeSet::new(), 2);
        assert_eq!(ids(&picked), ["x", "y"]);

        assert!(select(&team, &BTreeSet::new(), 0).is_empty());
    }

    #[test]
    fn test_reassignment_fills_vacated_slot() {
        // bob is replaced, carol stays, dave is the least loaded outsider.
        let team = roster(&[("alice", 0), ("bob", 2), ("carol", 3), ("dave", 0)]);
        let current = [uid("bob"), uid("carol")];

        let plan = plan_reassignment(&current, &uid("bob"), &uid("alice"), &team, REVIEWER_QUOTA)
            .expect("dave is eligible");

        assert_eq!(ids(&plan.reviewers), ["carol", "dave"]);
        assert_eq!(plan.replaced_by().as_str(), "dave");
    }

    #[test]
    fn test_reassignment_without_candidates() {
        let team = roster(&[("alice", 0), ("bob", 2), ("carol", 3)]);
        let current = [uid("bob"), uid("carol")];

        let plan = plan_reassignment(&current, &uid("bob"), &uid("alice"), &team, REVIEWER_QUOTA);
        assert_eq!(plan, None);
    }

    #[test]
    fn test_reassignment_of_sole_reviewer_can_fill_both_slots() {
        let team = roster(&[("a", 0), ("b", 0), ("c", 1), ("d", 2)]);
        let current = [uid("b")];

        let plan = plan_reassignment(&current, &uid("b"), &uid("a"), &team, REVIEWER_QUOTA).unwrap();
        assert_eq!(ids(&plan.reviewers), ["c", "d"]);
        assert_eq!(plan.replaced_by().as_str(), "c");
    }

    fn arb_roster() -> impl Strategy<Value = Vec<Candidate>> {
        prop::collection::vec(("[a-h]", 0u32..6), 0..10).prop_map(|members| {
            members
                .into_iter()
                .map(|(id, load)| Candidate::new(uid(&id), load))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_assignment_never_picks_author(team in arb_roster(), author in "[a-h]") {
            let author = uid(&author);
            let picked = plan_assignment(&author, &team);

            prop_assert!(!picked.contains(&author));
            prop_assert!(picked.len() <= REVIEWER_QUOTA);

            let unique: BTreeSet<&UserId> = picked.iter().collect();
            prop_assert_eq!(unique.len(), picked.len());
        }

        #[test]
        fn prop_selection_is_deterministic(team in arb_roster(), author in "[a-h]") {
            let author = uid(&author);
            prop_assert_eq!(plan_assignment(&author, &team), plan_assignment(&author, &team));
        }

        #[test]
        fn prop_skipped_members_are_not_less_loaded(team in arb_roster(), author in "[a-h]") {
            let author = uid(&author);
            let picked = plan_assignment(&author, &team);
            if picked.len() == REVIEWER_QUOTA {
                // A member listed twice ranks by their lightest entry.
                let heaviest_pick = picked
                    .iter()
                    .filter_map(|id| team.iter().filter(|c| &c.user_id == id).map(|c| c.load).min())
                    .max()
                    .unwrap_or(0);
                for c in team.iter().filter(|c| c.user_id != author && !picked.contains(&c.user_id)) {
                    prop_assert!(c.load >= heaviest_pick);
                }
            }
        }

        #[test]
        fn prop_reassignment_excludes_old_author_and_retained(
            team in arb_roster(),
            author in "[a-h]",
            current in prop::collection::btree_set("[a-h]", 1..=2),
        ) {
            let author = uid(&author);
            let current: Vec<UserId> = current.iter().map(|s| uid(s)).filter(|id| *id != author).collect();
            prop_assume!(!current.is_empty());
            let old = current[0].clone();

            if let Some(plan) = plan_reassignment(&current, &old, &author, &team, REVIEWER_QUOTA) {
                prop_assert!(!plan.reviewers.contains(&old));
                prop_assert!(!plan.reviewers.contains(&author));
                prop_assert!(plan.reviewers.len() <= REVIEWER_QUOTA);
                prop_assert!(plan.reviewers.len() >= current.len());

                let retained: Vec<&UserId> = current.iter().filter(|id| **id != old).collect();
                prop_assert!(!retained.contains(&plan.replaced_by()));
                for id in &retained {
                    prop_assert!(plan.reviewers.contains(id));
                }
            }
        }
    }
}
