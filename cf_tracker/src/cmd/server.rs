use crate::{
    cmd::{create_client, LookupArgs},
    modules::{
        error::ApiError,
        handlers::{
            dashboard::{dashboard, DashboardSettings},
            handle::{add_handle, delete_handle, handle_submissions, list_handles, refresh_handle},
            liveness, method_not_allowed, not_found, options,
            problem::{add_problem, delete_problem, list_problems, problem_submissions},
        },
    },
};
use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    response::{IntoResponse, Response},
    routing, Router, Server,
};
use cf_tracker_libs::{codeforces::JudgeApi, RecordStore};
use clap::Args;
use std::{any::Any, env, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
    #[command(flatten)]
    lookup: LookupArgs,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let judge: Arc<dyn JudgeApi> = Arc::new(create_client()?);
    let store = Arc::new(RecordStore::new());
    let app = create_router(store, judge, args.lookup.settings());

    let port = match args.port.or_else(|| env::var("PORT").ok()?.parse().ok()) {
        Some(port) => port,
        None => {
            tracing::warn!("API server will be launched at default port number 8000");
            8000u16
        }
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| {
            let message = format!("server at port {} stopped unexpectedly", port);
            tracing::error!(message);
            message
        })?;

    tracing::info!("Server stopped; tracked records are discarded.");
    Ok(())
}

pub fn create_router(
    store: Arc<RecordStore>,
    judge: Arc<dyn JudgeApi>,
    settings: DashboardSettings,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route(
            "/api/handles",
            routing::get(list_handles)
                .post(add_handle)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/handles/:handle",
            routing::delete(delete_handle)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/handles/:handle/refresh",
            routing::post(refresh_handle)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/handles/:handle/submissions",
            routing::get(handle_submissions)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/problems",
            routing::get(list_problems)
                .post(add_problem)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/problems/:problem_id",
            routing::delete(delete_problem)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/problems/:problem_id/submissions",
            routing::get(problem_submissions)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/dashboard",
            routing::get(dashboard)
                .options(options)
                .fallback(method_not_allowed),
        )
        .route("/api/liveness", routing::get(liveness))
        .fallback(not_found)
        .layer(Extension(store))
        .layer(Extension(judge))
        .layer(Extension(settings))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors),
        )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        String::from("handler panicked")
    };

    ApiError::Internal(detail).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown.");
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use cf_tracker_libs::{
        codeforces::{
            model::{Problem, ProblemId, Submission, User},
            CodeforcesError,
        },
        store::NewUser,
        Aggregator,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeJudge {
        users: HashMap<String, Value>,
        problems: HashMap<String, Value>,
        history: HashMap<String, Value>,
    }

    impl FakeJudge {
        fn user(mut self, handle: &str, rating: i32) -> Self {
            self.users.insert(
                handle.to_lowercase(),
                json!({"handle": handle, "rating": rating, "rank": "expert", "contribution": 0}),
            );
            self
        }

        fn problem(mut self, contest_id: u32, index: &str, name: &str) -> Self {
            self.problems.insert(
                format!("{}{}", contest_id, index),
                json!({"contestId": contest_id, "index": index, "name": name, "rating": 1500, "tags": ["math"]}),
            );
            self
        }

        fn solved(mut self, handle: &str, problem_ids: &[(u32, &str)]) -> Self {
            let submissions: Vec<Value> = problem_ids
                .iter()
                .enumerate()
                .map(|(i, (contest_id, index))| {
                    json!({
                        "id": i as u64 + 1,
                        "contestId": contest_id,
                        "problem": {"contestId": contest_id, "index": index, "name": ""},
                        "author": {"members": [{"handle": handle}]},
                        "verdict": "OK"
                    })
                })
                .collect();
            self.history.insert(handle.to_string(), Value::from(submissions));
            self
        }
    }

    #[async_trait]
    impl JudgeApi for FakeJudge {
        async fn user_info(&self, handle: &str) -> Result<User, CodeforcesError> {
            let user = self
                .users
                .get(&handle.to_lowercase())
                .ok_or_else(|| CodeforcesError::Failed(format!("handles: User with handle {} not found", handle)))?;
            Ok(serde_json::from_value(user.clone())?)
        }

        async fn problem(&self, problem_id: &ProblemId) -> Result<Problem, CodeforcesError> {
            let problem = self
                .problems
                .get(&problem_id.to_string())
                .ok_or_else(|| CodeforcesError::NotFound(problem_id.to_string()))?;
            Ok(serde_json::from_value(problem.clone())?)
        }

        async fn user_status(
            &self,
            handle: &str,
            _from: u32,
            _count: u32,
        ) -> Result<Vec<Submission>, CodeforcesError> {
            let history = self
                .history
                .get(handle)
                .ok_or_else(|| CodeforcesError::UnexpectedError(String::from("connection reset")))?;
            Ok(serde_json::from_value(history.clone())?)
        }
    }

    fn app_with(judge: FakeJudge) -> (Router, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::new());
        let settings = DashboardSettings {
            aggregator: Aggregator::new(),
            submission_count: 10000,
        };
        let app = create_router(store.clone(), Arc::new(judge), settings);
        (app, store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    #[tokio::test]
    async fn add_and_list_handles() {
        let (app, _) = app_with(FakeJudge::default().user("tourist", 3800));

        let (status, body) = send(&app, Method::POST, "/api/handles", Some(json!({"handle": " Tourist "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["handle"], "tourist");
        assert_eq!(body["rating"], 3800);
        assert_eq!(body["maxRating"], Value::Null);
        assert_eq!(body["id"], 1);

        let (status, body) = send(&app, Method::GET, "/api/handles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["handle"], "tourist");
    }

    #[tokio::test]
    async fn reject_duplicate_and_unknown_handles() {
        let (app, store) = app_with(FakeJudge::default().user("tourist", 3800));

        send(&app, Method::POST, "/api/handles", Some(json!({"handle": "tourist"}))).await;
        let (status, body) = send(&app, Method::POST, "/api/handles", Some(json!({"handle": "tourist"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Handle already exists");

        let (status, body) = send(&app, Method::POST, "/api/handles", Some(json!({"handle": "nobody"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid Codeforces handle");

        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn reject_invalid_request_bodies() {
        let (app, _) = app_with(FakeJudge::default());

        let (status, body) = send(&app, Method::POST, "/api/handles", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Handle is required");

        let (status, body) = send(&app, Method::POST, "/api/handles", Some(json!({"handle": 42}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request data");

        let (status, body) = send(&app, Method::POST, "/api/problems", Some(json!({"problemId": "abc"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid problem ID format");
    }

    #[tokio::test]
    async fn add_and_delete_problems() {
        let (app, _) = app_with(FakeJudge::default().problem(1500, "A", "Going Home"));

        let (status, body) = send(&app, Method::POST, "/api/problems", Some(json!({"problemId": "1500A"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["problemId"], "1500A");
        assert_eq!(body["name"], "Going Home");
        assert_eq!(body["contestId"], 1500);
        assert_eq!(body["index"], "A");
        assert_eq!(body["tags"], json!(["math"]));

        let (status, body) = send(&app, Method::POST, "/api/problems", Some(json!({"problemId": "1500A"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Problem already exists");

        let (status, body) = send(&app, Method::POST, "/api/problems", Some(json!({"problemId": "1500B"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid problem ID");

        let (status, body) = send(&app, Method::DELETE, "/api/problems/1500A", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Problem deleted successfully");

        let (status, body) = send(&app, Method::DELETE, "/api/problems/1500A", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Problem not found");
    }

    #[tokio::test]
    async fn dashboard_ranks_users_and_tolerates_failed_lookups() {
        let judge = FakeJudge::default()
            .user("low", 1200)
            .user("high", 2400)
            .user("offline", 1500)
            .problem(1, "A", "")
            .problem(2, "B", "")
            .problem(3, "C", "")
            .problem(4, "D", "")
            .solved("low", &[(1, "A")])
            .solved("high", &[(1, "A"), (2, "B"), (3, "C"), (99, "Z")]);
        let (app, _) = app_with(judge);

        for handle in ["low", "offline", "high"] {
            send(&app, Method::POST, "/api/handles", Some(json!({ "handle": handle }))).await;
        }
        for problem_id in ["1A", "2B", "3C", "4D"] {
            send(&app, Method::POST, "/api/problems", Some(json!({ "problemId": problem_id }))).await;
        }

        let (status, body) = send(&app, Method::GET, "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);

        let ranking: Vec<&str> = body["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|user| user["handle"].as_str().unwrap())
            .collect();
        assert_eq!(ranking, vec!["high", "low", "offline"]);

        assert_eq!(body["users"][0]["solvedCount"], 3);
        assert_eq!(body["users"][0]["totalProblems"], 4);
        assert_eq!(body["users"][0]["solveRate"], 75);
        assert_eq!(body["users"][0]["rating"], 2400);
        assert_eq!(
            body["users"][1]["problemStatus"],
            json!([
                {"problemId": "1A", "solved": true},
                {"problemId": "2B", "solved": false},
                {"problemId": "3C", "solved": false},
                {"problemId": "4D", "solved": false}
            ])
        );
        assert_eq!(body["users"][2]["solvedCount"], 0);
        assert_eq!(body["users"][2]["solveRate"], 0);

        assert_eq!(body["problems"].as_array().unwrap().len(), 4);
        assert_eq!(body["totalUsers"], 3);
        assert_eq!(body["totalProblems"], 4);
        assert_eq!(body["totalSolved"], 4);
        // round((75 + 25 + 0) / 3)
        assert_eq!(body["averageRate"], 33);
    }

    #[tokio::test]
    async fn deleting_handle_removes_cached_submissions() {
        let judge = FakeJudge::default()
            .user("alice", 1500)
            .problem(1500, "A", "Going Home")
            .solved("alice", &[(1500, "A")]);
        let (app, store) = app_with(judge);
        send(&app, Method::POST, "/api/handles", Some(json!({"handle": "alice"}))).await;
        send(&app, Method::POST, "/api/problems", Some(json!({"problemId": "1500A"}))).await;
        send(&app, Method::GET, "/api/dashboard", None).await;

        let (status, body) = send(&app, Method::GET, "/api/handles/alice/submissions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["problemId"], "1500A");
        assert_eq!(body[0]["verdict"], "OK");

        let (status, body) = send(&app, Method::DELETE, "/api/handles/alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Handle deleted successfully");
        assert!(store.submissions().is_empty());

        let (status, body) = send(&app, Method::GET, "/api/problems/1500A/submissions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, Method::DELETE, "/api/handles/alice", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Handle not found");

        let (status, _) = send(&app, Method::GET, "/api/handles/alice/submissions", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_applies_latest_profile() {
        let (app, store) = app_with(FakeJudge::default().user("tourist", 3800));
        store.create_user(NewUser::with_handle("tourist")).unwrap();

        let (status, body) = send(&app, Method::POST, "/api/handles/tourist/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rating"], 3800);
        assert_eq!(body["rank"], "expert");
        assert_eq!(store.user("tourist").unwrap().rating, Some(3800));

        let (status, _) = send(&app, Method::POST, "/api/handles/petr/refresh", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn options_method_and_unknown_routes() {
        let (app, _) = app_with(FakeJudge::default());

        let (status, body) = send(&app, Method::OPTIONS, "/api/handles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, Method::PUT, "/api/handles", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "Method not allowed");

        let (status, _) = send(&app, Method::POST, "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, body) = send(&app, Method::GET, "/api/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not found");

        let (status, _) = send(&app, Method::GET, "/api/liveness", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_is_open_to_any_origin() {
        let (app, _) = app_with(FakeJudge::default());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/handles")
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/problems")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(preflight).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("DELETE"));
    }
}
