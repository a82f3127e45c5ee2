use std::path::{Path, PathBuf};

use anyhow::Context;
use natter_api::{AuthToken, Author};

const SESSION_FILE: &str = "session.json";

/// What `login` remembers between invocations
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SavedSession {
    pub token: AuthToken,
    pub author: Author,
}

fn path(state_dir: &Path) -> PathBuf {
    state_dir.join(SESSION_FILE)
}

pub fn load(state_dir: &Path) -> anyhow::Result<Option<SavedSession>> {
    let path = path(state_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path).with_context(|| format!("reading {path:?}"))?;
    let session = serde_json::from_str(&data).with_context(|| format!("parsing {path:?}"))?;
    Ok(Some(session))
}

pub fn save(state_dir: &Path, session: &SavedSession) -> anyhow::Result<()> {
    let path = path(state_dir);
    let data = serde_json::to_string_pretty(session).context("serializing session")?;
    std::fs::write(&path, data).with_context(|| format!("writing {path:?}"))
}

/// Returns whether there was a session to forget
pub fn clear(state_dir: &Path) -> anyhow::Result<bool> {
    let path = path(state_dir);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path).with_context(|| format!("removing {path:?}"))?;
    Ok(true)
}

/// `NATTER_TOKEN` overrides the token of the saved session
pub fn token(saved: Option<&SavedSession>) -> Option<AuthToken> {
    std::env::var("NATTER_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .map(AuthToken)
        .or_else(|| saved.map(|s| s.token.clone()))
}
