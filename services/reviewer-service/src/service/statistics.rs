//! Assignment statistics.

use std::sync::Arc;

use super::ServiceError;
use crate::domain::AssignmentStatsPage;
use crate::store::StatisticsReader;

pub const DEFAULT_STATS_LIMIT: u32 = 50;
pub const MAX_STATS_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct StatsService {
    statistics: Arc<dyn StatisticsReader>,
}

impl StatsService {
    pub fn new(statistics: Arc<dyn StatisticsReader>) -> Self {
        Self { statistics }
    }

    /// One page of per-user assignment counts.
    ///
    /// A missing or non-positive limit falls back to the default, larger
    /// limits are capped and negative offsets start from zero.
    pub async fn user_assignment_stats(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<AssignmentStatsPage, ServiceError> {
        let (limit, offset) = page_bounds(limit, offset);
        Ok(self.statistics.assignment_stats(limit, offset).await?)
    }
}

fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (u32, u32) {
    let limit = match limit {
        Some(l) if l > 0 => {
            u32::try_from(l.min(i64::from(MAX_STATS_LIMIT))).unwrap_or(MAX_STATS_LIMIT)
        }
        _ => DEFAULT_STATS_LIMIT,
    };
    let offset = offset
        .map(|o| u32::try_from(o.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::defaults(None, None, (50, 0))]
    #[case::zero_limit(Some(0), Some(5), (50, 5))]
    #[case::negative(Some(-3), Some(-7), (50, 0))]
    #[case::capped(Some(1000), Some(10), (100, 10))]
    #[case::in_range(Some(20), Some(40), (20, 40))]
    fn test_page_bounds(
        #[case] limit: Option<i64>,
        #[case] offset: Option<i64>,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(page_bounds(limit, offset), expected);
    }
}
