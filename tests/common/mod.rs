#![allow(dead_code)]

use axum::{
    Json, Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use base64::Engine;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};
use sqlx::SqlitePool;
use tower::ServiceExt;
use url::Url;
use villain_forge::{
    ForgeError, ForgeState,
    api::GenerationClient,
    config::Config,
    db::Storage,
    forge_router,
    service::CodeSender,
};

pub const ADMIN_KEY: &str = "admin-key-for-tests";
pub const HOOK_SECRET: &str = "hook-secret-for-tests";
pub const UPLOAD_LIMIT: usize = 1024;

/// Smallest PNG header the service accepts as an image.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-image-data";

pub const VILLAIN_REPLY: &str = r#"Here is your villain:
{"gender":"female","name":"Dr. ava stone","alias":"Gridlock","power":"Gravity wells",
 "weakness":"Static","nemesis":"Captain Dawn","lair":"Orbital foundry",
 "catchphrase":"Mind the gap.","crimes":["Stole a moon","Rerouted tides",],
 "threat_level":"high","faction":"The Pull",
 "origin":"Ava was an engineer. She built a well that pulled back.",}"#;

pub const ORIGIN_TEXT: &str = "Ava Stone mapped every fault line under the city and decided to pull.";

pub fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "villain-forge-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

#[derive(Default)]
pub struct RecordingSender {
    codes: Mutex<HashMap<String, String>>,
}

impl RecordingSender {
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).cloned()
    }
}

impl CodeSender for RecordingSender {
    fn send(&self, email: &str, code: &str) -> Result<(), ForgeError> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }
}

/// Switches and counters for the fake AI upstream.
#[derive(Clone, Default)]
pub struct Upstream {
    pub fail_text: Arc<AtomicBool>,
    pub fail_image: Arc<AtomicBool>,
    pub text_calls: Arc<AtomicUsize>,
    pub image_calls: Arc<AtomicUsize>,
}

async fn fake_chat(State(up): State<Upstream>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    up.text_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(
        headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
        Some("Bearer sk-test")
    );
    assert_eq!(body["response_format"]["type"], "json_object");
    if up.fail_text.load(Ordering::SeqCst) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": {"message": "quota", "type": "insufficient_quota", "code": "insufficient_quota"}})),
        );
    }
    let asks_for_origin = body["messages"][1]["content"]
        .as_str()
        .is_some_and(|c| c.contains("new origin story"));
    let content = if asks_for_origin {
        json!({ "origin": ORIGIN_TEXT }).to_string()
    } else {
        VILLAIN_REPLY.to_string()
    };
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })),
    )
}

async fn fake_image(State(up): State<Upstream>, Json(body): Json<Value>) -> impl IntoResponse {
    up.image_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["response_format"], "b64_json");
    if up.fail_image.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "image backend down", "type": "server_error"}})),
        );
    }
    let b64 = base64::engine::general_purpose::STANDARD.encode(PNG_BYTES);
    (
        StatusCode::OK,
        Json(json!({"data": [{"b64_json": b64, "revised_prompt": "a villain"}]})),
    )
}

async fn spawn_upstream(up: Upstream) -> Url {
    let app = Router::new()
        .route("/v1/chat/completions", post(fake_chat))
        .route("/v1/images/generations", post(fake_image))
        .with_state(up);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/v1")).expect("fake upstream url")
}

pub struct TestApp {
    pub app: Router,
    pub state: ForgeState,
    pub sender: Arc<RecordingSender>,
    pub upstream: Upstream,
    /// Side connection for inspecting or sabotaging the database.
    pub db: SqlitePool,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.db_path);
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body was not JSON")
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

impl TestApp {
    pub async fn spawn(tag: &str) -> Self {
        Self::spawn_with(tag, |_| {}).await
    }

    pub async fn spawn_with(tag: &str, tweak: impl FnOnce(&mut Config)) -> Self {
        let upstream = Upstream::default();
        let base_url = spawn_upstream(upstream.clone()).await;

        let db_path = temp_db_path(tag);
        let db_url = format!("sqlite:{}", db_path.display());
        let storage = Storage::connect(&db_url)
            .await
            .expect("open test database");
        let db = SqlitePool::connect(&db_url)
            .await
            .expect("open side connection");

        let mut cfg = Config::default();
        cfg.openai_api_key = "sk-test".to_string();
        cfg.openai_base_url = base_url;
        cfg.cookie_secret = "c".repeat(64);
        cfg.insecure_cookie = true;
        cfg.admin_key = ADMIN_KEY.to_string();
        cfg.support_webhook_secret = HOOK_SECRET.to_string();
        cfg.upload_limit_bytes = UPLOAD_LIMIT;
        cfg.request_timeout_secs = 10;
        tweak(&mut cfg);

        let client = GenerationClient::new(&cfg);
        let sender = Arc::new(RecordingSender::default());
        let state = ForgeState::new(storage, Arc::new(cfg), client, sender.clone());
        let app = forge_router(state.clone());

        Self {
            app,
            state,
            sender,
            upstream,
            db,
            db_path,
        }
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql)
            .execute(&self.db)
            .await
            .expect("test sql failed");
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql)
            .fetch_one(&self.db)
            .await
            .expect("test count failed");
        n
    }

    pub async fn support_statuses(&self) -> Vec<String> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM support_events ORDER BY id")
            .fetch_all(&self.db)
            .await
            .expect("read support events");
        rows.into_iter().map(|(s,)| s).collect()
    }

    /// Make every insert into `generations` fail from now on.
    pub async fn break_generation_inserts(&self) {
        self.exec(
            "CREATE TRIGGER refuse_generations BEFORE INSERT ON generations \
             BEGIN SELECT RAISE(ABORT, 'generations are read-only'); END",
        )
        .await;
    }

    pub async fn send(&self, req: Request<Body>) -> Reply {
        let resp = self.app.clone().oneshot(req).await.expect("request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        let req = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");
        self.send(req).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Value) -> Reply {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(req).await
    }

    pub async fn request_code(&self, email: &str) -> String {
        let reply = self
            .call("POST", "/api/auth/code", None, Some(json!({ "email": email })))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
        self.sender
            .last_code(&email.trim().to_lowercase())
            .expect("code was not delivered")
    }

    /// Full sign-in; returns the `Cookie` header value for later requests.
    pub async fn sign_in(&self, email: &str) -> String {
        let code = self.request_code(email).await;
        let reply = self
            .call(
                "POST",
                "/api/auth/verify",
                None,
                Some(json!({ "email": email, "code": code })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
        session_cookie(&reply.headers).expect("verify did not set a session cookie")
    }

    pub async fn credits(&self, cookie: &str) -> i64 {
        let reply = self.call("GET", "/api/account", Some(cookie), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.json()["credits"].as_i64().expect("credits field")
    }
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("villain_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
