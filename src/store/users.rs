// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Local user directory.
//!
//! Accounts live in the `users` partition, keyed by a deterministic id
//! derived from the username. Hashing exists to produce stable identities
//! and keep passwords out of plaintext; it is not a hardened credential
//! scheme and the crate makes no stronger claim.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::codec::truncate_to_seconds;
use crate::store::database::{Database, Partition, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum UserDirectoryError {
    InvalidInput,
    UsernameExists { username: String },
    UserNotFound { username: String },
    InvalidPassword,
    Store(StoreError),
}

impl fmt::Display for UserDirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => f.write_str("username and password must not be empty"),
            Self::UsernameExists { username } => {
                write!(f, "username {username:?} already exists")
            }
            Self::UserNotFound { username } => write!(f, "no user named {username:?}"),
            Self::InvalidPassword => f.write_str("invalid password"),
            Self::Store(source) => write!(f, "user directory store error: {source}"),
        }
    }
}

impl std::error::Error for UserDirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(source) => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for UserDirectoryError {
    fn from(source: StoreError) -> Self {
        Self::Store(source)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// Deterministic user id: the first 32 hex chars of
/// `SHA-256("user:<lowercased username>")`. Stable across reinstalls, so a
/// returning user lands on the same stored snapshot.
pub fn derive_user_id(username: &str) -> String {
    let normalized = username.trim().to_lowercase();
    let digest = Sha256::digest(format!("user:{normalized}").as_bytes());
    let mut id = hex_encode(&digest);
    id.truncate(32);
    id
}

fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::digest(format!("{salt}:{password}").as_bytes());
    hex_encode(&digest)
}

#[derive(Debug)]
pub struct UserDirectory {
    db: Arc<Database>,
}

impl UserDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LocalUser, UserDirectoryError> {
        let normalized = username.trim().to_lowercase();
        if normalized.is_empty() || password.is_empty() {
            return Err(UserDirectoryError::InvalidInput);
        }

        if self.find_by_username(&normalized)?.is_some() {
            return Err(UserDirectoryError::UsernameExists {
                username: normalized,
            });
        }

        let user = LocalUser {
            id: derive_user_id(&normalized),
            password_hash: hash_password(&normalized, password),
            username: normalized,
            created_at: truncate_to_seconds(Utc::now()),
        };

        self.db.put(Partition::Users, &user.id, &user)?;
        tracing::debug!(username = %user.username, id = %user.id, "created user");
        Ok(user)
    }

    pub async fn validate_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LocalUser, UserDirectoryError> {
        let normalized = username.trim().to_lowercase();
        let Some(user) = self.find_by_username(&normalized)? else {
            return Err(UserDirectoryError::UserNotFound {
                username: normalized,
            });
        };

        if hash_password(&normalized, password) != user.password_hash {
            return Err(UserDirectoryError::InvalidPassword);
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<LocalUser>, StoreError> {
        self.db.get(Partition::Users, id)
    }

    pub async fn list_users(&self) -> Result<Vec<LocalUser>, StoreError> {
        let mut users: Vec<LocalUser> = self
            .db
            .get_all::<LocalUser>(Partition::Users)?
            .into_iter()
            .map(|(_, user)| user)
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn find_by_username(&self, normalized: &str) -> Result<Option<LocalUser>, StoreError> {
        // The deterministic id doubles as a username index.
        self.db.get(Partition::Users, &derive_user_id(normalized))
    }
}
