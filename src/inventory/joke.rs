//! 定时获取笑话的后台任务
//!
//! 任务按固定间隔运行，网络不可用时跳过本次运行；
//! 获取失败时按固定延迟重试，结果写入偏好存储。

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::preferences::{PreferenceError, PreferenceStore};

pub const DEFAULT_JOKE_API: &str = "https://official-joke-api.appspot.com";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JokeResponse {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub setup: Option<String>,
    pub punchline: Option<String>,
    pub joke: Option<String>,
}

impl JokeResponse {
    /// 单句笑话直接返回，否则拼接 setup 和 punchline
    pub fn text(&self) -> String {
        match &self.joke {
            Some(joke) => joke.clone(),
            None => format!(
                "{}\n{}",
                self.setup.as_deref().unwrap_or_default(),
                self.punchline.as_deref().unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JokeError {
    #[error("joke request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("joke service unavailable: {0}")]
    Unavailable(String),
    #[error("failed to store joke: {0}")]
    Store(#[from] PreferenceError),
}

#[async_trait]
pub trait JokeSource: Send + Sync {
    async fn random_joke(&self) -> Result<JokeResponse, JokeError>;
}

/// 基于 HTTP 的笑话来源，请求 `GET {base_url}/random_joke`
pub struct HttpJokeSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpJokeSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, JokeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl JokeSource for HttpJokeSource {
    async fn random_joke(&self) -> Result<JokeResponse, JokeError> {
        let response = self
            .client
            .get(format!("{}/random_joke", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JokeError::Unavailable(format!("HTTP {}", status)));
        }
        Ok(response.json::<JokeResponse>().await?)
    }
}

/// 网络连接前置条件
pub trait Connectivity: Send + Sync {
    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct JokeJobConfig {
    pub interval: Duration,
    pub retry_delay: Duration,
    /// 单次运行的最多尝试次数
    pub max_attempts: u32,
}

impl Default for JokeJobConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            retry_delay: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

/// 单次运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Saved(String),
    Skipped,
    Failed { attempts: u32 },
}

pub struct JokeFetchJob {
    source: Arc<dyn JokeSource>,
    prefs: PreferenceStore,
    connectivity: Arc<dyn Connectivity>,
    config: JokeJobConfig,
}

impl JokeFetchJob {
    pub fn new(
        source: Arc<dyn JokeSource>,
        prefs: PreferenceStore,
        connectivity: Arc<dyn Connectivity>,
        config: JokeJobConfig,
    ) -> Self {
        Self {
            source,
            prefs,
            connectivity,
            config,
        }
    }

    async fn attempt(&self) -> Result<String, JokeError> {
        let text = self.source.random_joke().await?.text();
        self.prefs.save_joke(text.clone()).await?;
        Ok(text)
    }

    pub async fn run_once(&self) -> RunOutcome {
        if !self.connectivity.is_connected() {
            info!("No network connection, skipping joke fetch");
            return RunOutcome::Skipped;
        }

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.attempt().await {
                Ok(text) => return RunOutcome::Saved(text),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "joke fetch failed");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        RunOutcome::Failed {
            attempts: max_attempts,
        }
    }

    /// 在后台按固定间隔运行，第一次运行立即开始
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// 前若干次失败，之后返回固定笑话
    struct FlakySource {
        failures_left: AtomicU32,
        calls: AtomicU32,
        response: JokeResponse,
    }

    #[async_trait]
    impl JokeSource for FlakySource {
        async fn random_joke(&self) -> Result<JokeResponse, JokeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(JokeError::Unavailable("offline".to_string()));
            }
            Ok(self.response.clone())
        }
    }

    struct Toggle(AtomicBool);

    impl Connectivity for Toggle {
        fn is_connected(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn two_part() -> JokeResponse {
        JokeResponse {
            kind: Some("general".to_string()),
            setup: Some("Why?".to_string()),
            punchline: Some("Because.".to_string()),
            joke: None,
        }
    }

    fn job(source: Arc<FlakySource>, online: bool, prefs: PreferenceStore) -> JokeFetchJob {
        JokeFetchJob::new(
            source,
            prefs,
            Arc::new(Toggle(AtomicBool::new(online))),
            JokeJobConfig {
                interval: Duration::from_millis(50),
                retry_delay: Duration::from_millis(1),
                max_attempts: 3,
            },
        )
    }

    fn source(failures: u32) -> Arc<FlakySource> {
        Arc::new(FlakySource {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            response: two_part(),
        })
    }

    #[test]
    fn joke_text() {
        assert_eq!(two_part().text(), "Why?\nBecause.");
        let single = JokeResponse {
            joke: Some("One liner".to_string()),
            ..two_part()
        };
        assert_eq!(single.text(), "One liner");
    }

    #[test]
    fn parses_api_payload() {
        let joke: JokeResponse = serde_json::from_str(
            r#"{"type":"general","setup":"S","punchline":"P","id":42}"#,
        )
        .unwrap();
        assert_eq!(joke.kind.as_deref(), Some("general"));
        assert_eq!(joke.text(), "S\nP");
    }

    #[tokio::test]
    async fn saves_joke_into_preferences() {
        let prefs = PreferenceStore::in_memory();
        let outcome = job(source(0), true, prefs.clone()).run_once().await;
        assert_eq!(outcome, RunOutcome::Saved("Why?\nBecause.".to_string()));
        assert_eq!(prefs.snapshot().last_joke, "Why?\nBecause.");
    }

    #[tokio::test]
    async fn retries_after_failure() {
        let prefs = PreferenceStore::in_memory();
        let flaky = source(2);
        let outcome = job(flaky.clone(), true, prefs.clone()).run_once().await;
        assert!(matches!(outcome, RunOutcome::Saved(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let prefs = PreferenceStore::in_memory();
        let broken = source(10);
        let outcome = job(broken.clone(), true, prefs.clone()).run_once().await;
        assert_eq!(outcome, RunOutcome::Failed { attempts: 3 });
        assert_eq!(prefs.snapshot().last_joke, "");
    }

    #[tokio::test]
    async fn skipped_without_connectivity() {
        let prefs = PreferenceStore::in_memory();
        let src = source(0);
        let outcome = job(src.clone(), false, prefs).run_once().await;
        assert_eq!(outcome, RunOutcome::Skipped);
        assert_eq!(src.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn spawned_job_publishes_to_subscribers() {
        let prefs = PreferenceStore::in_memory();
        let mut rx = prefs.subscribe();
        let handle = job(source(0), true, prefs.clone()).spawn();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.borrow().last_joke, "Why?\nBecause.");
        handle.abort();
    }

    #[test]
    fn default_schedule_is_every_thirty_minutes() {
        let config = JokeJobConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1800));
        assert_eq!(config.max_attempts, 3);
    }

    #[tokio::test]
    async fn http_source_reports_server_errors() {
        use axum::{http::StatusCode, routing::get, Router};

        let app = Router::new().route(
            "/random_joke",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let source = HttpJokeSource::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let err = source.random_joke().await.unwrap_err();
        assert!(matches!(err, JokeError::Unavailable(_)));

        server.abort();
    }

    #[tokio::test]
    async fn http_source_fetches_random_joke() {
        use axum::{routing::get, Json, Router};

        let app = Router::new().route(
            "/random_joke",
            get(|| async {
                Json(serde_json::json!({
                    "type": "programming",
                    "setup": "Knock knock",
                    "punchline": "Race condition",
                    "id": 1
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let source = HttpJokeSource::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap();
        let joke = source.random_joke().await.unwrap();
        assert_eq!(joke.text(), "Knock knock\nRace condition");

        server.abort();
    }
}
