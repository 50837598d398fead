// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Session identity provider.
//!
//! One JSON document at a fixed path records who is signed in. Creating a
//! session replaces the document (last write wins), reading a corrupt
//! document clears it and reports "not signed in". Sessions carry no expiry;
//! `logged_in_at` is informational.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserKey;
use crate::store::codec::truncate_to_seconds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserKey,
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionJson {
    user_id: String,
    username: String,
    logged_in_at: DateTime<Utc>,
}

fn session_to_json(session: &Session) -> SessionJson {
    SessionJson {
        user_id: session.user_id.as_str().to_owned(),
        username: session.username.clone(),
        logged_in_at: session.logged_in_at,
    }
}

fn session_from_json(json: SessionJson) -> Option<Session> {
    let user_id = UserKey::new(json.user_id).ok()?;
    Some(Session {
        user_id,
        username: json.username,
        logged_in_at: json.logged_in_at,
    })
}

#[derive(Debug)]
pub enum SessionError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces any existing session. The previous session is simply
    /// overwritten, signing in twice leaves only the second identity.
    pub fn create_session(
        &self,
        user_id: UserKey,
        username: impl Into<String>,
    ) -> Result<Session, SessionError> {
        let session = Session {
            user_id,
            username: username.into(),
            logged_in_at: truncate_to_seconds(Utc::now()),
        };

        let json = session_to_json(&session);
        let raw = serde_json::to_string_pretty(&json).map_err(|source| SessionError::Json {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, format!("{raw}\n").as_bytes())?;
        tracing::debug!(user_id = %session.user_id, "created session");
        Ok(session)
    }

    /// The current session, if any. A document that cannot be read or
    /// parsed is treated as signed-out and cleared; this never errors.
    pub fn get_session(&self) -> Option<Session> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "cannot read session file");
                return None;
            }
        };

        let parsed: Option<Session> = serde_json::from_str::<SessionJson>(&raw)
            .ok()
            .and_then(session_from_json);

        if parsed.is_none() {
            tracing::warn!(path = ?self.path, "clearing corrupt session file");
            let _ = fs::remove_file(&self.path);
        }

        parsed
    }

    pub fn clear_session(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_session().is_some()
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SessionError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(|source| SessionError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_owned());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = path.with_file_name(format!(".stillpath.tmp.{file_name}.{nanos}"));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| SessionError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| SessionError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SessionError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}
