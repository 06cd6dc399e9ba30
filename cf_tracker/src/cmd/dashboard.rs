use crate::cmd::{create_client, LookupArgs};
use anyhow::{Context, Result};
use cf_tracker_libs::{
    codeforces::{JudgeApi, ProblemId},
    store::{NewProblem, NewUser},
    DashboardSnapshot, JudgeSolvedLookup, RecordStore,
};
use clap::Args;

/// Computes a dashboard once for the given handles and problems and prints it as JSON.
#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Codeforces handle to include (repeatable)
    #[arg(long = "handle")]
    handles: Vec<String>,
    /// Problem ID such as 1500A to include (repeatable)
    #[arg(long = "problem")]
    problems: Vec<String>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
    #[command(flatten)]
    lookup: LookupArgs,
}

pub async fn run(args: DashboardArgs) -> Result<()> {
    let judge = create_client()?;
    let store = RecordStore::new();
    let settings = args.lookup.settings();

    register(&judge, &store, &args.handles, &args.problems).await;

    let lookup = JudgeSolvedLookup::new(&judge, &store, settings.submission_count);
    let snapshot = settings
        .aggregator
        .compute(store.users(), store.problems(), &lookup)
        .await;

    println!("{}", render(&snapshot, args.pretty)?);
    Ok(())
}

/// Fills `store` with whatever the judge confirms; unknown or duplicate entries are skipped.
async fn register(judge: &dyn JudgeApi, store: &RecordStore, handles: &[String], problems: &[String]) {
    for handle in handles.iter().map(|handle| handle.trim()) {
        if handle.is_empty() {
            continue;
        }
        match judge.user_info(handle).await {
            Ok(info) => {
                if let Err(e) = store.create_user(NewUser::from(info)) {
                    tracing::warn!("skip handle {}: {}", handle, e);
                }
            }
            Err(e) => tracing::warn!("skip handle {}: {:?}", handle, e),
        }
    }

    for problem in problems.iter().map(|problem| problem.trim()) {
        let problem_id: ProblemId = match problem.parse() {
            Ok(problem_id) => problem_id,
            Err(e) => {
                tracing::warn!("skip problem: {}", e);
                continue;
            }
        };
        match judge.problem(&problem_id).await {
            Ok(info) => {
                if let Err(e) = store.create_problem(NewProblem::from_judge(&problem_id, info)) {
                    tracing::warn!("skip problem {}: {}", problem_id, e);
                }
            }
            Err(e) => tracing::warn!("skip problem {}: {:?}", problem_id, e),
        }
    }
}

fn render(snapshot: &DashboardSnapshot, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    };

    rendered.context("failed to serialize dashboard")
}
