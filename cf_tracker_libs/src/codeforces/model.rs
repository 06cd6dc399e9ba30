use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

static PROBLEM_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([A-Z]\d*)$").expect("problem id pattern must compile"));

/// Response envelope returned by every method of the judge API.
///
/// The judge answers `{"status":"OK","result":...}` on success and
/// `{"status":"FAILED","comment":"..."}` otherwise.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "status")]
pub enum CodeforcesResponse<T> {
    #[serde(rename = "OK")]
    Ok { result: T },
    #[serde(rename = "FAILED")]
    Failed {
        #[serde(default)]
        comment: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub handle: String,
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    #[serde(default)]
    pub contribution: i32,
    pub rank: Option<String>,
    pub rating: Option<i32>,
    #[serde(alias = "maxRank")]
    pub max_rank: Option<String>,
    #[serde(alias = "maxRating")]
    pub max_rating: Option<i32>,
    #[serde(default, alias = "lastOnlineTimeSeconds")]
    pub last_online_time_seconds: i64,
    #[serde(default, alias = "registrationTimeSeconds")]
    pub registration_time_seconds: i64,
    #[serde(default, alias = "friendOfCount")]
    pub friend_of_count: u32,
    pub avatar: Option<String>,
    #[serde(alias = "titlePhoto")]
    pub title_photo: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Problem {
    #[serde(alias = "contestId")]
    pub contest_id: Option<u32>,
    #[serde(alias = "problemsetName")]
    pub problemset_name: Option<String>,
    pub index: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "type")]
    pub problem_type: String,
    pub points: Option<f64>,
    pub rating: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Problem {
    /// Natural key of the problem, e.g. `1500A`. Problems outside a contest have none.
    pub fn problem_id(&self) -> Option<String> {
        self.contest_id
            .map(|contest_id| format!("{}{}", contest_id, self.index))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Member {
    pub handle: String,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Party {
    #[serde(alias = "contestId")]
    pub contest_id: Option<u32>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default, alias = "participantType")]
    pub participant_type: String,
    #[serde(default)]
    pub ghost: bool,
    #[serde(alias = "startTimeSeconds")]
    pub start_time_seconds: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Submission {
    pub id: u64,
    #[serde(alias = "contestId")]
    pub contest_id: Option<u32>,
    #[serde(default, alias = "creationTimeSeconds")]
    pub creation_time_seconds: i64,
    #[serde(default, alias = "relativeTimeSeconds")]
    pub relative_time_seconds: i64,
    pub problem: Problem,
    pub author: Party,
    #[serde(default, alias = "programmingLanguage")]
    pub programming_language: String,
    pub verdict: Option<String>,
    #[serde(default)]
    pub testset: String,
    #[serde(default, alias = "passedTestCount")]
    pub passed_test_count: u32,
    #[serde(default, alias = "timeConsumedMillis")]
    pub time_consumed_millis: u64,
    #[serde(default, alias = "memoryConsumedBytes")]
    pub memory_consumed_bytes: u64,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.verdict.as_deref() == Some("OK")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Contest {
    pub id: u32,
    pub name: String,
    #[serde(default, alias = "type")]
    pub contest_type: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default, alias = "durationSeconds")]
    pub duration_seconds: i64,
    #[serde(alias = "startTimeSeconds")]
    pub start_time_seconds: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ContestStandings {
    pub contest: Contest,
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid problem id [{0}]")]
pub struct InvalidProblemId(pub String);

/// Tracked problem key in the form `<contestId><index>`, e.g. `1500A` or `1520F2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemId {
    pub contest_id: u32,
    pub index: String,
}

impl FromStr for ProblemId {
    type Err = InvalidProblemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = PROBLEM_ID_PATTERN
            .captures(s)
            .ok_or_else(|| InvalidProblemId(s.to_string()))?;

        let contest_id = captures[1]
            .parse::<u32>()
            .map_err(|_| InvalidProblemId(s.to_string()))?;

        Ok(ProblemId {
            contest_id,
            index: captures[2].to_string(),
        })
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.contest_id, self.index)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_user_info_response() {
        let raw = r#"
        {
            "status": "OK",
            "result": [
                {
                    "lastName": "Korotkevich",
                    "country": "Belarus",
                    "lastOnlineTimeSeconds": 1700000000,
                    "city": "Gomel",
                    "rating": 3800,
                    "friendOfCount": 70000,
                    "titlePhoto": "https://userpic.codeforces.org/422/title/50a270ed4a722867.jpg",
                    "handle": "tourist",
                    "avatar": "https://userpic.codeforces.org/422/avatar/2b5dbe87f0d859a2.jpg",
                    "firstName": "Gennady",
                    "contribution": 0,
                    "organization": "ITMO University",
                    "rank": "legendary grandmaster",
                    "maxRating": 4000,
                    "registrationTimeSeconds": 1265987288,
                    "maxRank": "tourist"
                }
            ]
        }
        "#;

        let response: CodeforcesResponse<Vec<User>> = serde_json::from_str(raw).unwrap();
        let users = match response {
            CodeforcesResponse::Ok { result } => result,
            CodeforcesResponse::Failed { comment } => panic!("unexpected failure: {}", comment),
        };

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].handle, "tourist");
        assert_eq!(users[0].rating, Some(3800));
        assert_eq!(users[0].max_rank.as_deref(), Some("tourist"));
        assert_eq!(users[0].first_name.as_deref(), Some("Gennady"));
    }

    #[test]
    fn deserialize_unrated_user() {
        let raw = r#"{"handle":"newbie","contribution":0,"avatar":"a.jpg","titlePhoto":"t.jpg"}"#;
        let user: User = serde_json::from_str(raw).unwrap();

        assert_eq!(user.rating, None);
        assert_eq!(user.rank, None);
        assert_eq!(user.organization, None);
    }

    #[test]
    fn deserialize_failed_response() {
        let raw = r#"{"status":"FAILED","comment":"handles: User with handle nobody not found"}"#;
        let response: CodeforcesResponse<Vec<User>> = serde_json::from_str(raw).unwrap();

        match response {
            CodeforcesResponse::Failed { comment } => {
                assert_eq!(comment, "handles: User with handle nobody not found")
            }
            CodeforcesResponse::Ok { .. } => panic!("expected FAILED envelope"),
        }
    }

    #[test]
    fn deserialize_submission() {
        let raw = r#"
        {
            "id": 115000000,
            "contestId": 1500,
            "creationTimeSeconds": 1620000000,
            "relativeTimeSeconds": 2147483647,
            "problem": {
                "contestId": 1500,
                "index": "A",
                "name": "Going Home",
                "type": "PROGRAMMING",
                "points": 500.0,
                "rating": 1800,
                "tags": ["brute force", "hashing"]
            },
            "author": {
                "contestId": 1500,
                "members": [{"handle": "tourist"}],
                "participantType": "PRACTICE",
                "ghost": false
            },
            "programmingLanguage": "GNU C++17",
            "verdict": "OK",
            "testset": "TESTS",
            "passedTestCount": 60,
            "timeConsumedMillis": 300,
            "memoryConsumedBytes": 102400
        }
        "#;

        let submission: Submission = serde_json::from_str(raw).unwrap();

        assert!(submission.is_accepted());
        assert_eq!(submission.problem.problem_id(), Some(String::from("1500A")));
        assert_eq!(submission.problem.problem_type, "PROGRAMMING");
        assert_eq!(submission.author.members[0].handle, "tourist");
    }

    #[test]
    fn submission_in_testing_is_not_accepted() {
        let raw = r#"
        {
            "id": 1,
            "problem": {"index": "A", "name": "Acmsguru"},
            "author": {"members": []}
        }
        "#;

        let submission: Submission = serde_json::from_str(raw).unwrap();

        assert!(!submission.is_accepted());
        assert_eq!(submission.problem.problem_id(), None);
    }

    #[test]
    fn parse_problem_id() {
        let id: ProblemId = "1500A".parse().unwrap();
        assert_eq!(id.contest_id, 1500);
        assert_eq!(id.index, "A");
        assert_eq!(id.to_string(), "1500A");

        let id: ProblemId = "1520F2".parse().unwrap();
        assert_eq!(id.contest_id, 1520);
        assert_eq!(id.index, "F2");
    }

    #[test]
    fn reject_malformed_problem_id() {
        for raw in ["", "A", "1500", "1500a", "1500AB", " 1500A", "1500A-", "99999999999A"] {
            assert_eq!(
                raw.parse::<ProblemId>(),
                Err(InvalidProblemId(raw.to_string())),
                "{} must be rejected",
                raw
            );
        }
    }
}
