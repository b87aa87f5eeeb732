#![allow(dead_code)]

use axum::{Router, http::StatusCode, routing::post};
use diesel::sqlite::SqliteConnection;
use headless_core_service::{
    DefaultAppState, Headless,
    config::{FrontendSettings, SiteUrls, TypeRegistry},
    create_app, create_service,
    db::establish_connection,
    revalidate::Revalidator,
    validation::validate_base_url,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BACKEND: &str = "https://cms.example";
pub const FRONTEND: &str = "https://app.example/";
pub const SECRET: &str = "s3cret";

pub fn establish_test_connection() -> SqliteConnection {
    establish_connection(":memory:").expect("Failed to create in-memory database")
}

pub fn headless(frontend: Option<&str>, token: Option<&str>) -> Headless {
    headless_with_timeout(frontend, token, Duration::from_secs(2))
}

pub fn headless_with_timeout(
    frontend: Option<&str>,
    token: Option<&str>,
    revalidate_timeout: Duration,
) -> Headless {
    Headless {
        frontend: FrontendSettings {
            base_url: frontend.map(|url| validate_base_url(url).expect("valid frontend URL")),
            preview_secret_token: token.map(String::from),
        },
        site: SiteUrls::new(validate_base_url(BACKEND).expect("valid backend URL")),
        types: TypeRegistry::parse("post=Post,page=Page"),
        revalidator: Revalidator::new(revalidate_timeout).expect("HTTP client"),
    }
}

pub fn create_test_app(headless: Headless) -> (Router, Arc<Mutex<SqliteConnection>>) {
    let db = Arc::new(Mutex::new(establish_test_connection()));
    let state = DefaultAppState::new(db.clone(), headless);
    (create_app(state), db)
}

pub mod server_utils {
    use super::*;
    use axum_test::TestServer;

    pub fn create_test_server(headless: Headless) -> TestServer {
        let (app, _db) = create_test_app(headless);
        TestServer::new(app).unwrap()
    }

    /// A server with the same tracing and timeout layers `main` serves with.
    pub fn create_layered_test_server(headless: Headless) -> TestServer {
        let db = Arc::new(Mutex::new(establish_test_connection()));
        let app = create_service(DefaultAppState::new(db, headless));
        TestServer::new(app).unwrap()
    }
}

/// Formatted log output collected in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route error-level events on this thread into a fresh buffer until the guard drops.
pub fn capture_errors() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// A stand-in frontend that records revalidation request bodies.
pub struct FakeFrontend {
    pub base_url: String,
    pub received: Arc<Mutex<Vec<String>>>,
}

impl FakeFrontend {
    pub async fn spawn(status: StatusCode) -> Self {
        Self::spawn_with_delay(status, Duration::ZERO).await
    }

    /// Records each body, then waits `delay` before answering.
    pub async fn spawn_with_delay(status: StatusCode, delay: Duration) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorder = received.clone();

        let app = Router::new().route(
            "/api/wordpress/revalidate",
            post(move |body: String| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    tokio::time::sleep(delay).await;
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/"),
            received,
        }
    }

    pub fn bodies(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}
