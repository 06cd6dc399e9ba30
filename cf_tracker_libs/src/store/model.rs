use crate::codeforces::model::{Problem, ProblemId, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedUser {
    pub id: u32,
    pub handle: String,
    pub rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub rank: Option<String>,
    pub max_rank: Option<String>,
    pub avatar: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Insert shape of [`TrackedUser`]; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub handle: String,
    pub rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub rank: Option<String>,
    pub max_rank: Option<String>,
    pub avatar: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
}

impl NewUser {
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            ..Default::default()
        }
    }
}

impl From<User> for NewUser {
    fn from(value: User) -> Self {
        Self {
            handle: value.handle,
            rating: value.rating,
            max_rating: value.max_rating,
            rank: value.rank,
            max_rank: value.max_rank,
            avatar: value.avatar,
            first_name: value.first_name,
            last_name: value.last_name,
            country: value.country,
            city: value.city,
            organization: value.organization,
        }
    }
}

/// Partial update of a tracked user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub rank: Option<String>,
    pub max_rank: Option<String>,
    pub avatar: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
}

impl UserPatch {
    pub fn apply(self, user: &mut TrackedUser) {
        fn merge<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        merge(&mut user.rating, self.rating);
        merge(&mut user.max_rating, self.max_rating);
        merge(&mut user.rank, self.rank);
        merge(&mut user.max_rank, self.max_rank);
        merge(&mut user.avatar, self.avatar);
        merge(&mut user.first_name, self.first_name);
        merge(&mut user.last_name, self.last_name);
        merge(&mut user.country, self.country);
        merge(&mut user.city, self.city);
        merge(&mut user.organization, self.organization);
    }
}

impl From<User> for UserPatch {
    fn from(value: User) -> Self {
        Self {
            rating: value.rating,
            max_rating: value.max_rating,
            rank: value.rank,
            max_rank: value.max_rank,
            avatar: value.avatar,
            first_name: value.first_name,
            last_name: value.last_name,
            country: value.country,
            city: value.city,
            organization: value.organization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProblem {
    pub id: u32,
    pub problem_id: String,
    pub name: Option<String>,
    pub contest_id: Option<u32>,
    pub index: Option<String>,
    pub rating: Option<i32>,
    pub tags: Option<Vec<String>>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProblem {
    pub problem_id: String,
    pub name: Option<String>,
    pub contest_id: Option<u32>,
    pub index: Option<String>,
    pub rating: Option<i32>,
    pub tags: Option<Vec<String>>,
}

impl NewProblem {
    pub fn with_id(problem_id: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            ..Default::default()
        }
    }

    /// Builds the insert shape from the judge's description of `problem_id`.
    pub fn from_judge(problem_id: &ProblemId, problem: Problem) -> Self {
        Self {
            problem_id: problem_id.to_string(),
            name: Some(problem.name),
            contest_id: Some(problem_id.contest_id),
            index: Some(problem_id.index.clone()),
            rating: problem.rating,
            tags: Some(problem.tags),
        }
    }
}

/// Accepted submission remembered for a tracked `(handle, problem)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSubmission {
    pub id: u32,
    pub handle: String,
    pub problem_id: String,
    pub verdict: String,
    pub submission_id: u64,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub handle: String,
    pub problem_id: String,
    pub verdict: String,
    pub submission_id: u64,
}
