pub mod dashboard;
pub mod server;

use crate::modules::handlers::dashboard::DashboardSettings;
use anyhow::{Context, Result};
use cf_tracker_libs::{codeforces::CodeforcesClient, Aggregator};
use clap::Args;
use std::env;
use tokio::time::Duration;

/// Flags shared by every command that runs the aggregation.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Seconds before a single handle's submission lookup is abandoned
    #[arg(long, default_value_t = 15)]
    lookup_timeout: u64,
    /// Number of handles looked up at the same time
    #[arg(long, default_value_t = 1)]
    lookup_concurrency: usize,
    /// Number of most recent submissions fetched per handle
    #[arg(long, default_value_t = 10000)]
    submission_count: u32,
}

impl LookupArgs {
    pub fn settings(&self) -> DashboardSettings {
        let aggregator = Aggregator::new()
            .concurrency(self.lookup_concurrency)
            .timeout(Duration::from_secs(self.lookup_timeout));

        DashboardSettings {
            aggregator,
            submission_count: self.submission_count,
        }
    }
}

pub fn create_client() -> Result<CodeforcesClient> {
    let api_url = env::var("CODEFORCES_API_URL").unwrap_or_else(|_| {
        tracing::warn!("CODEFORCES_API_URL environment variable is not set. Default value `https://codeforces.com` will be used.");
        String::from("https://codeforces.com")
    });

    tracing::info!("Use judge API at {}", api_url);
    CodeforcesClient::new(&api_url).with_context(|| {
        let message = "couldn't create judge API client. check the value of CODEFORCES_API_URL environment variable.";
        tracing::error!(message);
        message
    })
}
