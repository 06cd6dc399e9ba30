use crate::store::model::*;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },
}

#[derive(Default)]
struct Tables {
    users: IndexMap<String, TrackedUser>,
    problems: IndexMap<String, TrackedProblem>,
    submissions: IndexMap<(String, String), CachedSubmission>,
    next_user_id: u32,
    next_problem_id: u32,
    next_submission_id: u32,
}

impl Tables {
    fn issue(counter: &mut u32) -> u32 {
        *counter += 1;
        *counter
    }
}

/// In-memory record store for tracked users, tracked problems and cached submissions.
///
/// Created once at start-up and shared behind an `Arc`. Every operation takes the
/// lock exactly once, so each call is atomic on its own; nothing spans calls.
/// Listing order is insertion order.
#[derive(Default)]
pub struct RecordStore {
    tables: RwLock<Tables>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> Vec<TrackedUser> {
        self.tables.read().users.values().cloned().collect()
    }

    pub fn user(&self, handle: &str) -> Option<TrackedUser> {
        self.tables.read().users.get(handle).cloned()
    }

    pub fn create_user(&self, user: NewUser) -> Result<TrackedUser, StoreError> {
        let mut tables = self.tables.write();
        if tables.users.contains_key(&user.handle) {
            return Err(StoreError::AlreadyExists {
                kind: "handle",
                key: user.handle,
            });
        }

        let user = TrackedUser {
            id: Tables::issue(&mut tables.next_user_id),
            handle: user.handle,
            rating: user.rating,
            max_rating: user.max_rating,
            rank: user.rank,
            max_rank: user.max_rank,
            avatar: user.avatar,
            first_name: user.first_name,
            last_name: user.last_name,
            country: user.country,
            city: user.city,
            organization: user.organization,
            created_at: Utc::now().timestamp_millis(),
        };
        tables.users.insert(user.handle.clone(), user.clone());

        Ok(user)
    }

    pub fn update_user(&self, handle: &str, patch: UserPatch) -> Option<TrackedUser> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(handle)?;
        patch.apply(user);

        Some(user.clone())
    }

    /// Removes the user together with every submission cached under its handle.
    pub fn delete_user(&self, handle: &str) -> bool {
        let mut tables = self.tables.write();
        tables
            .submissions
            .retain(|(owner, _), _| owner.as_str() != handle);

        tables.users.shift_remove(handle).is_some()
    }

    pub fn problems(&self) -> Vec<TrackedProblem> {
        self.tables.read().problems.values().cloned().collect()
    }

    pub fn problem(&self, problem_id: &str) -> Option<TrackedProblem> {
        self.tables.read().problems.get(problem_id).cloned()
    }

    pub fn create_problem(&self, problem: NewProblem) -> Result<TrackedProblem, StoreError> {
        let mut tables = self.tables.write();
        if tables.problems.contains_key(&problem.problem_id) {
            return Err(StoreError::AlreadyExists {
                kind: "problem",
                key: problem.problem_id,
            });
        }

        let problem = TrackedProblem {
            id: Tables::issue(&mut tables.next_problem_id),
            problem_id: problem.problem_id,
            name: problem.name,
            contest_id: problem.contest_id,
            index: problem.index,
            rating: problem.rating,
            tags: problem.tags,
            created_at: Utc::now().timestamp_millis(),
        };
        tables
            .problems
            .insert(problem.problem_id.clone(), problem.clone());

        Ok(problem)
    }

    pub fn delete_problem(&self, problem_id: &str) -> bool {
        self.tables
            .write()
            .problems
            .shift_remove(problem_id)
            .is_some()
    }

    pub fn submissions(&self) -> Vec<CachedSubmission> {
        self.tables.read().submissions.values().cloned().collect()
    }

    pub fn submissions_by_handle(&self, handle: &str) -> Vec<CachedSubmission> {
        self.tables
            .read()
            .submissions
            .values()
            .filter(|submission| submission.handle == handle)
            .cloned()
            .collect()
    }

    pub fn submissions_by_problem(&self, problem_id: &str) -> Vec<CachedSubmission> {
        self.tables
            .read()
            .submissions
            .values()
            .filter(|submission| submission.problem_id == problem_id)
            .cloned()
            .collect()
    }

    /// Caches a submission under `(handle, problem_id)`, replacing any previous entry for the pair.
    ///
    /// Returns `None` without caching when the handle is not tracked.
    pub fn record_submission(&self, submission: NewSubmission) -> Option<CachedSubmission> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&submission.handle) {
            return None;
        }

        let submission = CachedSubmission {
            id: Tables::issue(&mut tables.next_submission_id),
            handle: submission.handle,
            problem_id: submission.problem_id,
            verdict: submission.verdict,
            submission_id: submission.submission_id,
            created_at: Utc::now().timestamp_millis(),
        };
        let key = (submission.handle.clone(), submission.problem_id.clone());
        tables.submissions.insert(key, submission.clone());

        Some(submission)
    }

    pub fn delete_submissions_by_handle(&self, handle: &str) -> bool {
        let mut tables = self.tables.write();
        let before = tables.submissions.len();
        tables
            .submissions
            .retain(|(owner, _), _| owner.as_str() != handle);

        tables.submissions.len() != before
    }
}
