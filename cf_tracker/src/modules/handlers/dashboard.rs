use axum::{extract::Extension, Json};
use cf_tracker_libs::{
    codeforces::JudgeApi, Aggregator, DashboardSnapshot, JudgeSolvedLookup, RecordStore,
};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub aggregator: Aggregator,
    /// Size of the single `user.status` page fetched per handle.
    pub submission_count: u32,
}

pub async fn dashboard(
    Extension(store): Extension<Arc<RecordStore>>,
    Extension(judge): Extension<Arc<dyn JudgeApi>>,
    Extension(settings): Extension<DashboardSettings>,
) -> Json<DashboardSnapshot> {
    let start_process = Instant::now();

    let lookup = JudgeSolvedLookup::new(judge.as_ref(), store.as_ref(), settings.submission_count);
    let snapshot = settings
        .aggregator
        .compute(store.users(), store.problems(), &lookup)
        .await;

    let time: u128 = Instant::now().duration_since(start_process).as_millis();
    tracing::info!(
        target: "dashboard",
        "elapsed_time={} users={} problems={} solved={}",
        time, snapshot.total_users, snapshot.total_problems, snapshot.total_solved
    );

    Json(snapshot)
}
