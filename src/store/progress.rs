// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Record-level progress service over the database partitions.
//!
//! One snapshot per user lives in the `progress` partition; activity logs and
//! journal entries are append-only granular records keyed by generated uuids.
//! Activity logging is best-effort and never fails the caller; journal writes
//! propagate their errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ids::UserKey;
use crate::store::codec::{truncate_to_seconds, ProgressRecord};
use crate::store::database::{Database, Partition, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Meditation,
    Task,
    Reflection,
    Mood,
}

/// One completed activity with the time actually spent on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub day: u32,
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: UserKey,
    pub kind: ActivityKind,
    pub day: u32,
    pub duration_seconds: u64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub day: u32,
    pub prompt: String,
    pub response: String,
    pub tags: Vec<String>,
    pub mood_snapshot: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalEntry {
    pub user_id: UserKey,
    pub day: u32,
    pub prompt: String,
    pub response: String,
    pub tags: Vec<String>,
    pub mood_snapshot: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub reminder_time: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPreferences {
    pub background_volume: f32,
    pub voice_volume: f32,
}

/// Per-user app settings, replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub theme: AppTheme,
    pub notifications: NotificationSettings,
    pub audio_preferences: AudioPreferences,
}

#[derive(Debug)]
pub struct ProgressStore {
    db: Arc<Database>,
    saves: AtomicU64,
}

impl ProgressStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            saves: AtomicU64::new(0),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Number of snapshot saves performed through this store. Diagnostic
    /// only; debounce tests assert on it.
    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Absence is a `None`, never an error.
    pub async fn get_progress(&self, key: &UserKey) -> Result<Option<ProgressRecord>, StoreError> {
        self.db.get(Partition::Progress, key.as_str())
    }

    /// Upserts the snapshot for `record.user_key`, refreshing `last_updated`.
    pub async fn save_progress(&self, mut record: ProgressRecord) -> Result<(), StoreError> {
        record.last_updated = truncate_to_seconds(Utc::now());
        self.db.put(Partition::Progress, &record.user_key, &record)?;
        self.saves.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(user_key = %record.user_key, "saved progress snapshot");
        Ok(())
    }

    /// Best-effort append. A failed write is logged and swallowed; activity
    /// history is advisory and must never break the session flow.
    pub async fn log_activity(&self, new: NewActivityLog) {
        let log = ActivityLog {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.as_str().to_owned(),
            kind: new.kind,
            day: new.day,
            duration_seconds: new.duration_seconds,
            completed_at: truncate_to_seconds(Utc::now()),
            metadata: new.metadata,
        };

        if let Err(err) = self.db.put(Partition::ActivityLogs, &log.id, &log) {
            tracing::warn!(user_id = %log.user_id, error = %err, "dropping activity log");
        }
    }

    /// Journal entries are user content; write failures propagate.
    pub async fn save_journal_entry(
        &self,
        new: NewJournalEntry,
    ) -> Result<JournalEntry, StoreError> {
        let entry = JournalEntry {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.as_str().to_owned(),
            day: new.day,
            prompt: new.prompt,
            response: new.response,
            tags: new.tags,
            mood_snapshot: new.mood_snapshot,
            created_at: truncate_to_seconds(Utc::now()),
        };

        self.db.put(Partition::JournalEntries, &entry.id, &entry)?;
        Ok(entry)
    }

    pub async fn update_settings(&self, settings: UserSettings) -> Result<(), StoreError> {
        self.db
            .put(Partition::UserSettings, &settings.user_id, &settings)
    }

    pub async fn get_settings(&self, key: &UserKey) -> Result<Option<UserSettings>, StoreError> {
        self.db.get(Partition::UserSettings, key.as_str())
    }

    /// Deletes the snapshot only. Activity logs and journal entries stay
    /// behind; callers that need a full purge must remove them explicitly.
    pub async fn clear_progress(&self, key: &UserKey) -> Result<(), StoreError> {
        self.db.delete(Partition::Progress, key.as_str())
    }

    /// Keys of every stored snapshot. Keys that do not parse as user keys
    /// are foreign files and get skipped.
    pub async fn list_users(&self) -> Result<Vec<UserKey>, StoreError> {
        let mut users = Vec::new();
        for key in self.db.list_keys(Partition::Progress)? {
            match UserKey::new(key) {
                Ok(user_key) => users.push(user_key),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping foreign key in progress partition");
                }
            }
        }
        Ok(users)
    }

    pub async fn activity_logs_for(&self, key: &UserKey) -> Result<Vec<ActivityLog>, StoreError> {
        let mut logs: Vec<ActivityLog> = self
            .db
            .get_all::<ActivityLog>(Partition::ActivityLogs)?
            .into_iter()
            .map(|(_, log)| log)
            .filter(|log| log.user_id == key.as_str())
            .collect();
        logs.sort_by_key(|log| log.completed_at);
        Ok(logs)
    }

    pub async fn journal_entries_for(&self, key: &UserKey) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self
            .db
            .get_all::<JournalEntry>(Partition::JournalEntries)?
            .into_iter()
            .map(|(_, entry)| entry)
            .filter(|entry| entry.user_id == key.as_str())
            .collect();
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }
}
