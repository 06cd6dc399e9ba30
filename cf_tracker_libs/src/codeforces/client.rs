use crate::codeforces::model::*;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::Duration;

type Result<T> = std::result::Result<T, CodeforcesError>;

#[derive(Debug, Error)]
pub enum CodeforcesError {
    #[error("failed to request to the judge")]
    RequestError(#[from] reqwest::Error),
    #[error("failed to deserialize JSON data")]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid judge url given")]
    InvalidUrlError(#[from] url::ParseError),
    #[error("judge rejected the request: {0}")]
    Failed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    UnexpectedError(String),
}

/// Narrow view of the judge API the tracker depends on.
#[async_trait]
pub trait JudgeApi: Send + Sync {
    async fn user_info(&self, handle: &str) -> Result<User>;
    async fn problem(&self, problem_id: &ProblemId) -> Result<Problem>;
    async fn user_status(&self, handle: &str, from: u32, count: u32) -> Result<Vec<Submission>>;
}

pub struct CodeforcesClient {
    user_info_url: Url,
    user_status_url: Url,
    standings_url: Url,
    client: Client,
}

impl CodeforcesClient {
    pub fn new(api_url: &str) -> Result<Self> {
        let mut api_url = Url::parse(api_url)?;
        api_url.set_path("");
        let base_url = api_url;
        let user_info_url = base_url.join("api/user.info")?;
        let user_status_url = base_url.join("api/user.status")?;
        let standings_url = base_url.join("api/contest.standings")?;

        let client = Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(CodeforcesClient {
            user_info_url,
            user_status_url,
            standings_url,
            client,
        })
    }

    /// Sends a GET request and unwraps the judge's response envelope.
    ///
    /// The judge answers FAILED with a non-2xx status, so the body is decoded
    /// regardless of the status code.
    async fn call<T>(&self, url: &Url, params: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let res = self.client.get(url.clone()).query(params).send().await?;
        let status = res.status();
        let body = res.text().await?;

        match serde_json::from_str::<CodeforcesResponse<T>>(&body) {
            Ok(CodeforcesResponse::Ok { result }) => Ok(result),
            Ok(CodeforcesResponse::Failed { comment }) => {
                tracing::warn!("judge returned FAILED for {}: {}", url.path(), comment);
                Err(CodeforcesError::Failed(comment))
            }
            Err(e) if status.is_success() => Err(CodeforcesError::DeserializeError(e)),
            Err(_) => Err(CodeforcesError::UnexpectedError(format!(
                "unexpected error [{}] from {}",
                status,
                url.path()
            ))),
        }
    }
}

#[async_trait]
impl JudgeApi for CodeforcesClient {
    async fn user_info(&self, handle: &str) -> Result<User> {
        let users: Vec<User> = self
            .call(&self.user_info_url, &[("handles", handle.to_string())])
            .await?;

        users
            .into_iter()
            .next()
            .ok_or_else(|| CodeforcesError::NotFound(format!("user {}", handle)))
    }

    async fn problem(&self, problem_id: &ProblemId) -> Result<Problem> {
        let standings: ContestStandings = self
            .call(
                &self.standings_url,
                &[
                    ("contestId", problem_id.contest_id.to_string()),
                    ("from", String::from("1")),
                    ("count", String::from("1")),
                ],
            )
            .await?;

        standings
            .problems
            .into_iter()
            .find(|problem| problem.index == problem_id.index)
            .ok_or_else(|| CodeforcesError::NotFound(format!("problem {}", problem_id)))
    }

    async fn user_status(&self, handle: &str, from: u32, count: u32) -> Result<Vec<Submission>> {
        self.call(
            &self.user_status_url,
            &[
                ("handle", handle.to_string()),
                ("from", from.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }
}
