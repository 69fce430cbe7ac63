//! API route handlers for the gateway.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bazaar_core::{BazaarError, TaskToken};

use super::server::AppState;

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "bazaar-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Landing page of a confirmation link. Each link works once.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> (StatusCode, &'static str) {
    let Ok(token) = raw.parse::<TaskToken>() else {
        return (StatusCode::BAD_REQUEST, "malformed link");
    };
    match state.executor.dispatch(&token, &state.ctx).await {
        Ok(_) => (StatusCode::OK, "confirmed"),
        Err(BazaarError::TokenNotFound(_)) => (StatusCode::NOT_FOUND, "link is invalid or expired"),
        Err(e) if e.is_user_facing() => (StatusCode::CONFLICT, "could not confirm"),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bazaar_accounts::{
        AccountsContext, Argon2Hasher, MemoryGoodRepo, MemoryUserRepo, build_executor,
    };
    use bazaar_core::{TaskArgs, User};
    use bazaar_scheduler::MemoryTaskStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::server::{AppState, build_router};

    fn state() -> AppState {
        let executor = build_executor(Arc::new(MemoryTaskStore::new())).unwrap();
        let ctx = Arc::new(AccountsContext {
            users: Arc::new(MemoryUserRepo::new()),
            goods: Arc::new(MemoryGoodRepo::new()),
            hasher: Arc::new(Argon2Hasher),
            mail: None,
            telegram: None,
        });
        AppState::new(executor, ctx)
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, String) {
        let resp = build_router(state.clone())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn pending_user(state: &AppState) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: "pat".into(),
            hashed_password: "x".into(),
            active: false,
            active_time: None,
            email: Some("pat@example.com".into()),
            telegram: None,
        };
        state.ctx.users.add_nonactive(user).await.unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&state(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_confirm_runs_action_once() {
        let state = state();
        let user = pending_user(&state).await;
        let token = state
            .executor
            .enqueue(TaskArgs::ActivateUser { user_id: user.id })
            .await
            .unwrap();

        let uri = format!("/confirm/{token}");
        assert_eq!(get(&state, &uri).await, (StatusCode::OK, "confirmed".into()));
        assert!(state.ctx.users.get_user(user.id).await.unwrap().active);

        let (status, body) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "link is invalid or expired");
    }

    #[tokio::test]
    async fn test_confirm_malformed_token() {
        let (status, _) = get(&state(), "/confirm/not-a-token").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_confirm_unknown_token() {
        let uri = format!("/confirm/{}", Uuid::new_v4());
        let (status, _) = get(&state(), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handler_failure_consumes_link() {
        let state = state();
        let token = state
            .executor
            .enqueue(TaskArgs::ActivateUser { user_id: Uuid::new_v4() })
            .await
            .unwrap();
        let uri = format!("/confirm/{token}");
        let (status, body) = get(&state, &uri).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "could not confirm");
        assert_eq!(get(&state, &uri).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_channel_is_server_error() {
        let state = state();
        let user = pending_user(&state).await;
        let token = state
            .executor
            .enqueue(TaskArgs::ResetPassword { user })
            .await
            .unwrap();
        let (status, body) = get(&state, &format!("/confirm/{token}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "something went wrong");
    }
}
