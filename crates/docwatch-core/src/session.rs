//! Persisted session and settings store.
//!
//! One JSON file holds the auth token and the handful of user preferences
//! the console keeps between runs (chat session, LLM provider selection,
//! node category overrides). Every consumer goes through the typed
//! accessors on [`SessionStore`]; there are no ad-hoc key/value reads.
//!
//! Writes are whole-file and last-writer-wins. That is acceptable here:
//! they are small, human-paced, and rarely concurrent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::defaults;
use crate::error::{Error, Result};

/// Environment variable naming the session file path.
pub const ENV_SESSION_FILE: &str = "DOCWATCH_SESSION_FILE";

/// One stored chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chat_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chat_messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    llm_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ollama_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ollama_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_interactions: Option<u32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    node_category_overrides: HashMap<String, String>,
}

/// Typed session/settings store backed by a single JSON file.
///
/// Shared behind `Arc` by every component that needs the token or a
/// preference; the store itself handles interior locking.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    data: RwLock<SessionData>,
}

impl SessionStore {
    /// Open the store at `path`, loading existing state if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::Config(format!("corrupt session file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionData::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "Session store opened");
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Open the store at the path named by `DOCWATCH_SESSION_FILE`,
    /// falling back to `~/.config/docwatch/session.json`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ENV_SESSION_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_path());
        Self::open(path)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    /// Current bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Store the token and role obtained from a login.
    pub fn set_credentials(&self, token: impl Into<String>, role: Option<String>) -> Result<()> {
        self.mutate(|d| {
            d.token = Some(token.into());
            d.user_role = role;
        })
    }

    /// Wipe token and role. Invoked centrally when any request comes back 401.
    pub fn clear_credentials(&self) -> Result<()> {
        self.mutate(|d| {
            d.token = None;
            d.user_role = None;
        })
    }

    pub fn user_role(&self) -> Option<String> {
        self.read().user_role.clone()
    }

    // ========================================================================
    // Chat session
    // ========================================================================

    /// Current chat session id, creating and persisting one if absent.
    pub fn ensure_chat_session(&self) -> Result<String> {
        if let Some(id) = self.read().chat_session_id.clone() {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        let assigned = id.clone();
        self.mutate(move |d| d.chat_session_id = Some(id))?;
        Ok(assigned)
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.read().chat_messages.clone()
    }

    /// Append a chat message, trimming history to the interaction cap.
    pub fn push_chat_message(&self, message: ChatMessage) -> Result<()> {
        let cap = self.max_interactions() as usize * 2;
        self.mutate(move |d| {
            d.chat_messages.push(message);
            let len = d.chat_messages.len();
            if len > cap {
                d.chat_messages.drain(..len - cap);
            }
        })
    }

    /// Drop chat history and session id.
    pub fn clear_chat(&self) -> Result<()> {
        self.mutate(|d| {
            d.chat_messages.clear();
            d.chat_session_id = None;
        })
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub fn llm_provider(&self) -> Option<String> {
        self.read().llm_provider.clone()
    }

    pub fn set_llm_provider(&self, provider: impl Into<String>) -> Result<()> {
        let provider = provider.into();
        self.mutate(move |d| d.llm_provider = Some(provider))
    }

    pub fn ollama_url(&self) -> Option<String> {
        self.read().ollama_url.clone()
    }

    pub fn set_ollama_url(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        self.mutate(move |d| d.ollama_url = Some(url))
    }

    pub fn ollama_model(&self) -> Option<String> {
        self.read().ollama_model.clone()
    }

    pub fn set_ollama_model(&self, model: impl Into<String>) -> Result<()> {
        let model = model.into();
        self.mutate(move |d| d.ollama_model = Some(model))
    }

    pub fn default_model(&self) -> Option<String> {
        self.read().default_model.clone()
    }

    pub fn set_default_model(&self, model: impl Into<String>) -> Result<()> {
        let model = model.into();
        self.mutate(move |d| d.default_model = Some(model))
    }

    pub fn max_interactions(&self) -> u32 {
        self.read()
            .max_interactions
            .unwrap_or(defaults::MAX_INTERACTIONS)
    }

    pub fn set_max_interactions(&self, max: u32) -> Result<()> {
        self.mutate(move |d| d.max_interactions = Some(max))
    }

    pub fn node_category_override(&self, node_type: &str) -> Option<String> {
        self.read().node_category_overrides.get(node_type).cloned()
    }

    pub fn set_node_category_override(
        &self,
        node_type: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<()> {
        let (node_type, category) = (node_type.into(), category.into());
        self.mutate(move |d| {
            d.node_category_overrides.insert(node_type, category);
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionData)) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        f(&mut data);
        self.save(&data)
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let raw = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// `~/.config/docwatch/session.json`, or a working-directory file when no
/// home directory can be determined.
fn default_session_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home)
            .join(".config")
            .join("docwatch")
            .join("session.json"),
        _ => {
            warn!("HOME not set, keeping session file in working directory");
            PathBuf::from("docwatch-session.json")
        }
    }
}
