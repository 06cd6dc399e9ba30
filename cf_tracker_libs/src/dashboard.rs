use crate::{
    codeforces::client::JudgeApi,
    store::{NewSubmission, RecordStore, TrackedProblem, TrackedUser},
};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::time::{self, Duration};

/// Resolves which of the tracked problems a handle has solved.
#[async_trait]
pub trait SolvedLookup: Send + Sync {
    async fn fetch_solved(&self, handle: &str, tracked: &HashSet<String>)
        -> Result<HashSet<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatus {
    pub problem_id: String,
    pub solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStanding {
    #[serde(flatten)]
    pub user: TrackedUser,
    pub solved_count: usize,
    pub total_problems: usize,
    pub solve_rate: u32,
    pub problem_status: Vec<ProblemStatus>,
}

impl UserStanding {
    pub fn new(user: TrackedUser, problem_ids: &[String], solved: &HashSet<String>) -> Self {
        let problem_status: Vec<ProblemStatus> = problem_ids
            .iter()
            .map(|problem_id| ProblemStatus {
                problem_id: problem_id.clone(),
                solved: solved.contains(problem_id),
            })
            .collect();
        let solved_count = problem_status.iter().filter(|status| status.solved).count();
        let total_problems = problem_ids.len();

        Self {
            user,
            solved_count,
            total_problems,
            solve_rate: solve_rate(solved_count, total_problems),
            problem_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub users: Vec<UserStanding>,
    pub problems: Vec<TrackedProblem>,
    pub total_users: usize,
    pub total_problems: usize,
    pub total_solved: usize,
    pub average_rate: u32,
}

impl DashboardSnapshot {
    /// Ranks the standings by solved count, keeping input order among ties.
    pub fn new(mut users: Vec<UserStanding>, problems: Vec<TrackedProblem>) -> Self {
        users.sort_by(|a, b| b.solved_count.cmp(&a.solved_count));

        let total_solved = users.iter().map(|user| user.solved_count).sum();
        let rates: Vec<u32> = users.iter().map(|user| user.solve_rate).collect();

        Self {
            total_users: users.len(),
            total_problems: problems.len(),
            total_solved,
            average_rate: average_rate(&rates),
            users,
            problems,
        }
    }
}

/// Integer division rounding half up, `numerator / denominator` with `denominator > 0`.
fn round_half_up(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// `round(100 * solved / total)`, or 0 when nothing is tracked.
pub fn solve_rate(solved: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    round_half_up(100 * solved as u64, total as u64) as u32
}

/// `round(mean(rates))`, or 0 for an empty list.
pub fn average_rate(rates: &[u32]) -> u32 {
    if rates.is_empty() {
        return 0;
    }
    let sum: u64 = rates.iter().map(|&rate| rate as u64).sum();
    round_half_up(sum, rates.len() as u64) as u32
}

/// Computes dashboard snapshots from tracked users and problems.
///
/// A lookup that fails or exceeds `timeout` counts as zero solved for that
/// user only; the rest of the dashboard is unaffected.
#[derive(Debug, Clone)]
pub struct Aggregator {
    concurrency: usize,
    timeout: Option<Duration>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            concurrency: 1,
            timeout: None,
        }
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lookups allowed in flight at once. Values below 1 are treated as 1.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn compute<L>(
        &self,
        users: Vec<TrackedUser>,
        problems: Vec<TrackedProblem>,
        lookup: &L,
    ) -> DashboardSnapshot
    where
        L: SolvedLookup + ?Sized,
    {
        let problem_ids: Vec<String> = problems
            .iter()
            .map(|problem| problem.problem_id.clone())
            .collect();
        let tracked: HashSet<String> = problem_ids.iter().cloned().collect();

        tracing::info!(
            "Start to aggregate {} users over {} problems",
            users.len(),
            problem_ids.len()
        );

        // `buffered` yields in input order, so the result does not depend on completion order.
        let standings: Vec<UserStanding> = stream::iter(users)
            .map(|user| {
                let tracked = &tracked;
                let problem_ids = &problem_ids;
                async move {
                    let solved = self.solved_or_empty(&user.handle, tracked, lookup).await;
                    UserStanding::new(user, problem_ids, &solved)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        DashboardSnapshot::new(standings, problems)
    }

    async fn solved_or_empty<L>(
        &self,
        handle: &str,
        tracked: &HashSet<String>,
        lookup: &L,
    ) -> HashSet<String>
    where
        L: SolvedLookup + ?Sized,
    {
        let result = match self.timeout {
            Some(timeout) => match time::timeout(timeout, lookup.fetch_solved(handle, tracked)).await
            {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("lookup timed out after {:?}", timeout)),
            },
            None => lookup.fetch_solved(handle, tracked).await,
        };

        match result {
            Ok(solved) => solved,
            Err(e) => {
                tracing::warn!(
                    "failed to fetch solved problems of {}, counted as none solved: {:?}",
                    handle,
                    e
                );
                HashSet::new()
            }
        }
    }
}

/// Solved lookup backed by the judge's submission history.
///
/// Accepted submissions on tracked problems are also cached in the record store.
pub struct JudgeSolvedLookup<'a> {
    judge: &'a dyn JudgeApi,
    store: &'a RecordStore,
    count: u32,
}

impl<'a> JudgeSolvedLookup<'a> {
    pub fn new(judge: &'a dyn JudgeApi, store: &'a RecordStore, count: u32) -> Self {
        Self {
            judge,
            store,
            count,
        }
    }
}

#[async_trait]
impl<'a> SolvedLookup for JudgeSolvedLookup<'a> {
    async fn fetch_solved(
        &self,
        handle: &str,
        tracked: &HashSet<String>,
    ) -> Result<HashSet<String>> {
        let submissions = self.judge.user_status(handle, 1, self.count).await?;

        let mut solved = HashSet::new();
        for submission in submissions.iter().filter(|s| s.is_accepted()) {
            let problem_id = match submission.problem.problem_id() {
                Some(problem_id) if tracked.contains(&problem_id) => problem_id,
                _ => continue,
            };

            if solved.insert(problem_id.clone()) {
                self.store.record_submission(NewSubmission {
                    handle: handle.to_string(),
                    problem_id,
                    verdict: submission.verdict.clone().unwrap_or_default(),
                    submission_id: submission.id,
                });
            }
        }

        tracing::debug!("{} solved {} tracked problems", handle, solved.len());

        Ok(solved)
    }
}
