//! 用户偏好存储
//!
//! 读取通过 `subscribe()` 获得的接收端观察，每次写入都会通知所有订阅者。
//! 打开时指定文件路径则每次写入后持久化为 JSON。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub is_logged_in: bool,
    pub username: String,
    pub last_joke: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("preference file io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is corrupted: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct PreferenceStore {
    tx: Arc<watch::Sender<Preferences>>,
    path: Option<PathBuf>,
    /// 串行化写入，保证文件内容与最后一次提交一致
    write_lock: Arc<Mutex<()>>,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self::with_initial(Preferences::default(), None)
    }

    /// 打开文件持久化的偏好存储，文件不存在时使用默认值
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::with_initial(initial, Some(path)))
    }

    fn with_initial(initial: Preferences, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Preferences {
        self.tx.borrow().clone()
    }

    pub async fn set_logged_in(
        &self,
        is_logged_in: bool,
        username: impl Into<String>,
    ) -> Result<(), PreferenceError> {
        let username = username.into();
        self.edit(|prefs| {
            prefs.is_logged_in = is_logged_in;
            prefs.username = username;
        })
        .await
    }

    pub async fn login(&self, username: impl Into<String>) -> Result<(), PreferenceError> {
        self.set_logged_in(true, username).await
    }

    pub async fn logout(&self) -> Result<(), PreferenceError> {
        self.set_logged_in(false, "").await
    }

    pub async fn save_joke(&self, joke: impl Into<String>) -> Result<(), PreferenceError> {
        let joke = joke.into();
        self.edit(|prefs| prefs.last_joke = joke).await
    }

    async fn edit<F>(&self, apply: F) -> Result<(), PreferenceError>
    where
        F: FnOnce(&mut Preferences),
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        apply(&mut next);

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, serde_json::to_vec_pretty(&next)?).await?;
            debug!(path = %path.display(), "preferences persisted");
        }

        self.tx.send_replace(next);
        Ok(())
    }
}
