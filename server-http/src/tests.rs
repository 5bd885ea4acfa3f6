use crate::{build_app, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use reel::auth::{
    AccountService, AuthError, AuthService, MokaSessionRepository, ResetNotifier,
    ResetTokenStore, SessionStore, SledUserRepository, User, UserRepository,
};
use reel::catalog::CatalogService;
use reel::domain::{Genre, MovieItem, UpstreamPage};
use reel::ports::MovieProvider;
use serde_json::{json, Value};
use shared::config::Config;
use shared::{Error, UpstreamFailure};
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use storage_engine::MokaQueryCache;
use tempfile::TempDir;
use tower::ServiceExt;

/// Provider returning 20 numbered items per page (200 results, 10 pages)
#[derive(Default)]
struct FakeTmdb {
    calls: AtomicUsize,
    failure: Mutex<Option<UpstreamFailure>>,
}

impl FakeTmdb {
    fn fail_with(&self, failure: Option<UpstreamFailure>) {
        *self.failure.lock() = failure;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self) -> shared::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().clone() {
            Some(failure) => Err(Error::upstream(failure)),
            None => Ok(()),
        }
    }

    fn page(label: &str, page: u32) -> UpstreamPage {
        UpstreamPage {
            total_results: 200,
            total_pages: 10,
            results: (0..20)
                .map(|i| json!({ "id": page * 100 + i, "title": format!("{label} {i}") }))
                .collect(),
        }
    }
}

#[async_trait]
impl MovieProvider for FakeTmdb {
    async fn search(&self, query: &str, page: u32) -> shared::Result<UpstreamPage> {
        self.answer()?;
        Ok(Self::page(query, page))
    }

    async fn trending(&self, page: u32) -> shared::Result<UpstreamPage> {
        self.answer()?;
        Ok(Self::page("trending", page))
    }

    async fn genres(&self) -> shared::Result<Vec<Genre>> {
        self.answer()?;
        Ok(vec![Genre {
            id: 18,
            name: "Drama".to_string(),
        }])
    }

    async fn details(&self, id: u64) -> shared::Result<MovieItem> {
        self.answer()?;
        if id == 404 {
            return Err(Error::upstream(UpstreamFailure::Status(404)));
        }
        Ok(json!({ "id": id, "title": "Casablanca" }))
    }

    async fn recommendations(&self, _id: u64, page: u32) -> shared::Result<UpstreamPage> {
        self.answer()?;
        Ok(Self::page("recommended", page))
    }

    async fn similar(&self, _id: u64, page: u32) -> shared::Result<UpstreamPage> {
        self.answer()?;
        Ok(Self::page("similar", page))
    }
}

#[derive(Default)]
struct CapturingNotifier {
    token: Mutex<Option<String>>,
}

#[async_trait]
impl ResetNotifier for CapturingNotifier {
    async fn send_reset_token(&self, _user: &User, token: &str) -> Result<(), AuthError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }
}

struct TestApp {
    state: AppState,
    config: Config,
    tmdb: Arc<FakeTmdb>,
    notifier: Arc<CapturingNotifier>,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_lookup(|_| None);

        let tmdb = Arc::new(FakeTmdb::default());
        let catalog = CatalogService::new(
            tmdb.clone(),
            Arc::new(MokaQueryCache::new_unbounded()),
            Duration::from_secs(600),
        );

        let user_repo = Arc::new(
            SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap(),
        ) as Arc<dyn UserRepository>;
        let notifier = Arc::new(CapturingNotifier::default());
        let accounts = AccountService::new(
            user_repo.clone(),
            ResetTokenStore::new(Duration::from_secs(60)),
            notifier.clone(),
        );
        let session_store = SessionStore::new(
            Arc::new(MokaSessionRepository::with_defaults()),
            3_600_000,
        );

        let state = AppState::new(
            catalog,
            Arc::new(AuthService::new(user_repo)),
            Arc::new(accounts),
            Arc::new(session_store),
        );

        Self {
            state,
            config,
            tmdb,
            notifier,
            _dir: temp_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_app(self.state.clone(), &self.config)
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn authed_get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register `rick` and return a session token
    async fn login_rick(&self) -> String {
        let (status, _) = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                json!({ "username": "rick", "email": "rick@casablanca.ma", "password": "louis1942" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                json!({ "username": "rick", "password": "louis1942" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_reports_cached_queries() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
    assert_eq!(body["cached_queries"], 0);
}

#[tokio::test]
async fn test_search_is_sliced_and_cached() {
    let app = TestApp::new();

    let (status, body) = app
        .get("/api/movies/search?query=casablanca&page=1&limit=5")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["totalPages"], 10);
    assert_eq!(body["totalResults"], 200);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert_eq!(body["results"][0]["title"], "casablanca 0");

    let (status, again) = app
        .get("/api/movies/search?query=casablanca&page=1&limit=5")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, body);
    assert_eq!(app.tmdb.calls(), 1);

    // A different limit is a different query
    app.get("/api/movies/search?query=casablanca&page=1&limit=6")
        .await;
    assert_eq!(app.tmdb.calls(), 2);
}

#[tokio::test]
async fn test_search_validation() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/movies/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (status, _) = app.get("/api/movies/search?query=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/movies/search?query=heat&page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/movies/trending?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.tmdb.calls(), 0);
}

#[tokio::test]
async fn test_oversized_limit_returns_whole_page() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/movies/trending?limit=5000000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_trending_defaults() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/movies/trending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_upstream_failures_map_to_gateway_errors() {
    let app = TestApp::new();

    app.tmdb
        .fail_with(Some(UpstreamFailure::Transport("refused".to_string())));
    let (status, body) = app.get("/api/movies/search?query=heat").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Error fetching movies");

    app.tmdb.fail_with(Some(UpstreamFailure::Timeout));
    let (status, body) = app.get("/api/movies/trending").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["message"], "Error fetching trending movies");

    // Nothing was cached
    let (_, health) = app.get("/health").await;
    assert_eq!(health["cached_queries"], 0);

    app.tmdb.fail_with(None);
    let (status, _) = app.get("/api/movies/search?query=heat").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_details_and_related_lists() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/movies/289").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Casablanca");

    let (status, body) = app.get("/api/movies/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie not found");

    let (status, _) = app.get("/api/movies/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/movies/recommendations/289?limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);

    let (status, body) = app.get("/api/movies/similar/289?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);

    // Details and related lists always go upstream
    app.get("/api/movies/289").await;
    assert_eq!(app.tmdb.calls(), 5);
}

#[tokio::test]
async fn test_genres_and_trailing_slash() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/movies/genres/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 18, "name": "Drama" }]));

    app.get("/api/movies/genres").await;
    assert_eq!(app.tmdb.calls(), 1);
}

#[tokio::test]
async fn test_user_routes_require_session() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/users/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, _) = app.authed_get("/api/users/profile", "bogus").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    app.login_rick().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": "rick", "email": "other@casablanca.ma", "password": "louis1942" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already taken");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": "ilsa", "email": "ilsa", "password": "louis1942" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A username shaped like rick's email would shadow his email login
    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            json!({ "username": "rick@casablanca.ma", "email": "renault@casablanca.ma", "password": "louis1942" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username cannot contain '@'");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "email": "rick@casablanca.ma", "password": "louis1942" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "username": "rick", "password": "wrong1234" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_with_basic_auth_and_email() {
    let app = TestApp::new();
    app.login_rick().await;

    let request = Request::post("/api/auth/login")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("Rick@Casablanca.ma:louis1942")),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "rick");
    assert_eq!(body["token"].as_str().unwrap().len(), 64);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_profile_preferences_and_watchlist() {
    let app = TestApp::new();
    let token = app.login_rick().await;

    let (status, body) = app.authed_get("/api/users/profile", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "rick@casablanca.ma");

    let (status, body) = app
        .json(
            Method::PATCH,
            "/api/users/preferences",
            Some(&token),
            json!({ "preferences": "Drama" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Preferences should be an array");

    let (status, body) = app
        .json(
            Method::PATCH,
            "/api/users/preferences",
            Some(&token),
            json!({ "preferences": ["Drama", "Romance"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"], json!(["Drama", "Romance"]));

    let (status, body) = app
        .json(Method::POST, "/api/users/watchlist", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Movie ID is required");

    for movie_id in [289, 629, 289] {
        let (status, _) = app
            .json(
                Method::POST,
                "/api/users/watchlist",
                Some(&token),
                json!({ "movieId": movie_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.authed_get("/api/users/watchlist", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([289, 629]));
}

#[tokio::test]
async fn test_update_details() {
    let app = TestApp::new();
    let token = app.login_rick().await;

    let (status, body) = app
        .json(
            Method::PATCH,
            "/api/users",
            Some(&token),
            json!({ "email": "rick@americain.ma" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and username are required");

    let (status, body) = app
        .json(
            Method::PATCH,
            "/api/users",
            Some(&token),
            json!({ "email": "Rick@Americain.ma", "username": "richard" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "richard");
    assert_eq!(body["email"], "rick@americain.ma");

    // The open session sees the change
    let (_, body) = app.authed_get("/api/users/profile", &token).await;
    assert_eq!(body["username"], "richard");
}

#[tokio::test]
async fn test_logout_and_password_change_end_sessions() {
    let app = TestApp::new();
    let first = app.login_rick().await;

    let (status, _) = app
        .json(Method::POST, "/api/auth/logout", Some(&first), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.authed_get("/api/users/profile", &first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "login": "rick", "password": "louis1942" }),
        )
        .await;
    let second = body["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .json(
            Method::POST,
            "/api/users/password",
            Some(&second),
            json!({ "old_password": "louis1942", "new_password": "sam4ever1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.authed_get("/api/users/profile", &second).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/login",
            None,
            json!({ "username": "rick", "password": "sam4ever1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    let token = app.login_rick().await;

    let (status, unknown) = app
        .json(
            Method::POST,
            "/api/auth/request-reset",
            None,
            json!({ "email": "nobody@casablanca.ma" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.notifier.token.lock().is_none());

    let (status, known) = app
        .json(
            Method::POST,
            "/api/auth/request-reset",
            None,
            json!({ "email": "rick@casablanca.ma" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, known);

    let reset_token = app.notifier.token.lock().clone().unwrap();

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/reset-password",
            None,
            json!({ "token": reset_token, "new_password": "playitagain9" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Old sessions are gone and the token is spent
    let (status, _) = app.authed_get("/api/users/profile", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/reset-password",
            None,
            json!({ "token": reset_token, "new_password": "playitagain10" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");
}
