use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, users};

#[derive(Debug, Serialize)]
struct HomeResponse {
    message: &'static str,
    status: bool,
}

async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Hello, world!",
        status: true,
    })
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(|| async { "ok" }))
        .merge(auth::router())
        .merge(users::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // in-flight store calls give up instead of holding the drain open
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn signup(app: &Router, email: &str, password: &str) {
        let (status, body) = send(
            app,
            post_json(
                "/auth/singin",
                json!({"firstName": "ada", "lastName": "lovelace", "email": email, "password": password}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    #[tokio::test]
    async fn home_and_health() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], true);

        let res = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signup_login_and_me() {
        let app = build_app(AppState::fake());

        let (status, body) = send(
            &app,
            post_json(
                "/auth/singin",
                json!({"firstName": "ada", "lastName": "lovelace", "email": "ada@example.com", "password": "engine"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["status"], true);
        assert_eq!(body["email"], "ada@example.com");

        let (status, body) = send(
            &app,
            post_json("/auth/login", json!({"email": "ada@example.com", "password": "engine"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "ADA LOVELACE");
        let token = body["token"].as_str().unwrap().to_string();

        let req = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn login_failures_map_to_status_codes() {
        let app = build_app(AppState::fake());
        signup(&app, "known@example.com", "secret").await;

        let (status, body) = send(
            &app,
            post_json("/auth/login", json!({"email": "not-an-email", "password": "abcde"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body["errors"].as_array().unwrap();
        assert!(errors[0].as_str().unwrap().contains("email"));

        let (status, _) = send(
            &app,
            post_json("/auth/login", json!({"email": "ghost@example.com", "password": "abcde"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            post_json("/auth/login", json!({"email": "known@example.com", "password": "wrong!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method("POST")
            .uri("/auth/singin")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn duplicate_signup_is_server_error() {
        let app = build_app(AppState::fake());
        signup(&app, "dup@example.com", "abcde").await;
        let (status, _) = send(
            &app,
            post_json(
                "/auth/singin",
                json!({"firstName": "x", "lastName": "y", "email": "dup@example.com", "password": "abcde"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn list_and_get_users() {
        let app = build_app(AppState::fake());
        for i in 1..=3 {
            signup(&app, &format!("u{i}@example.com"), "abcde").await;
        }

        let (status, body) = send(&app, get("/user?limit=2&offset=0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["users"][0]["id"], 3);
        assert_eq!(body["users"][1]["id"], 2);

        let (status, body) = send(&app, get("/user")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);

        let (status, body) = send(&app, get("/user/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "u1@example.com");
        assert_eq!(body["firstName"], "ADA");
        assert!(body.get("password").is_none());

        let (status, _) = send(&app, get("/user/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get("/user/99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn negative_or_oversized_id_is_bad_request() {
        let app = build_app(AppState::fake());
        signup(&app, "only@example.com", "abcde").await;

        for uri in ["/user/-1", "/user/18446744073709551615", "/user/1.5"] {
            let (status, body) = send(&app, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn unreadable_pagination_falls_back_to_defaults() {
        let app = build_app(AppState::fake());
        for i in 1..=2 {
            signup(&app, &format!("p{i}@example.com"), "abcde").await;
        }

        for uri in ["/user?limit=1&limit=2", "/user?limit=-4&offset=x"] {
            let (status, body) = send(&app, get(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["count"], 2, "{uri}");
        }
    }

    #[tokio::test]
    async fn me_requires_a_valid_token() {
        let app = build_app(AppState::fake());
        let res = app.clone().oneshot(get("/me")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
