// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pure conversion between the in-memory [`UserState`] and its durable
//! snapshot [`ProgressRecord`].
//!
//! The record is the wire format: camelCase field names, RFC 3339 timestamps
//! at second precision, and a schema version. Fields introduced after schema
//! v1 carry `#[serde(default)]` so older snapshots decode with the documented
//! defaults; snapshots from a newer schema are refused rather than guessed at.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserKey;
use crate::model::state::{
    AvatarId, MoodEntry, Persona, ProgramTheme, ReflectionEntry, RoutineTime, SessionCompletion,
    SoundPreference, SubscriptionStatus, UserState,
};

/// Current snapshot schema version. v2 added `soundPreference` and
/// `unlockedAchievements`.
pub const PROGRESS_SCHEMA_VERSION: u32 = 2;

/// One user's durable progress snapshot, exactly one per user key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_key: String,
    pub name: String,
    pub persona: Option<Persona>,
    pub avatar: AvatarId,
    pub selected_theme: Option<ProgramTheme>,
    pub routine_time: RoutineTime,
    pub current_day: u32,
    pub program_start_date: Option<DateTime<Utc>>,
    pub mood_history: Vec<MoodEntry>,
    pub reflections: Vec<ReflectionEntry>,
    pub session_completions: Vec<SessionCompletion>,
    pub streak: u32,
    pub pause_tokens: u32,
    pub is_paused: bool,
    pub pause_expires_at: Option<DateTime<Utc>>,
    pub night_mode: bool,
    pub short_session_mode: bool,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub favorite_days: Vec<u32>,
    pub has_completed_onboarding: bool,
    pub last_updated: DateTime<Utc>,
    pub version: u32,
    #[serde(default)]
    pub sound_preference: SoundPreference,
    #[serde(default)]
    pub unlocked_achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "progress snapshot has schema version {found}, newest supported is {supported}"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

pub(crate) fn truncate_to_seconds(value: DateTime<Utc>) -> DateTime<Utc> {
    value.with_nanosecond(0).unwrap_or(value)
}

/// Builds the durable snapshot of `state`, stamping `last_updated = now` and
/// the current schema version. Timestamps are truncated to whole seconds so
/// a decoded snapshot compares equal at second granularity.
pub fn encode_progress(state: &UserState, user_key: &UserKey, now: DateTime<Utc>) -> ProgressRecord {
    ProgressRecord {
        user_key: user_key.as_str().to_owned(),
        name: state.name.clone(),
        persona: state.persona,
        avatar: state.avatar,
        selected_theme: state.selected_theme,
        routine_time: state.routine_time,
        current_day: state.current_day,
        program_start_date: state.program_start_date.map(truncate_to_seconds),
        mood_history: state
            .mood_history
            .iter()
            .map(|entry| MoodEntry {
                timestamp: truncate_to_seconds(entry.timestamp),
                ..entry.clone()
            })
            .collect(),
        reflections: state
            .reflections
            .iter()
            .map(|entry| ReflectionEntry {
                date: truncate_to_seconds(entry.date),
                ..entry.clone()
            })
            .collect(),
        session_completions: state
            .session_completions
            .iter()
            .map(|completion| SessionCompletion {
                timestamp: truncate_to_seconds(completion.timestamp),
                ..completion.clone()
            })
            .collect(),
        streak: state.streak,
        pause_tokens: state.pause_tokens,
        is_paused: state.is_paused,
        pause_expires_at: state.pause_expires_at.map(truncate_to_seconds),
        night_mode: state.night_mode,
        short_session_mode: state.short_session_mode,
        subscription_status: state.subscription_status,
        favorite_days: state.favorite_days.clone(),
        has_completed_onboarding: state.has_completed_onboarding,
        last_updated: truncate_to_seconds(now),
        version: PROGRESS_SCHEMA_VERSION,
        sound_preference: state.sound_preference,
        unlocked_achievements: state.unlocked_achievements.clone(),
    }
}

/// Rebuilds the in-memory state from a snapshot. Snapshot metadata
/// (`user_key`, `last_updated`, `version`) does not survive the trip; it is
/// re-stamped on the next encode.
pub fn decode_progress(record: &ProgressRecord) -> Result<UserState, DecodeError> {
    if record.version > PROGRESS_SCHEMA_VERSION {
        return Err(DecodeError::UnsupportedSchemaVersion {
            found: record.version,
            supported: PROGRESS_SCHEMA_VERSION,
        });
    }

    Ok(UserState {
        name: record.name.clone(),
        persona: record.persona,
        avatar: record.avatar,
        selected_theme: record.selected_theme,
        routine_time: record.routine_time,
        current_day: record.current_day,
        program_start_date: record.program_start_date,
        mood_history: record.mood_history.clone(),
        reflections: record.reflections.clone(),
        session_completions: record.session_completions.clone(),
        streak: record.streak,
        pause_tokens: record.pause_tokens,
        is_paused: record.is_paused,
        pause_expires_at: record.pause_expires_at,
        night_mode: record.night_mode,
        short_session_mode: record.short_session_mode,
        subscription_status: record.subscription_status,
        favorite_days: record.favorite_days.clone(),
        has_completed_onboarding: record.has_completed_onboarding,
        sound_preference: record.sound_preference,
        unlocked_achievements: record.unlocked_achievements.clone(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::{
        decode_progress, encode_progress, DecodeError, ProgressRecord, PROGRESS_SCHEMA_VERSION,
    };
    use crate::model::fixtures;
    use crate::model::state::{SoundPreference, SubscriptionStatus};

    #[test]
    fn round_trips_at_second_granularity() {
        let state = fixtures::midway_state();
        let key = fixtures::key("u1");
        let now = fixtures::ts("2026-02-12T08:00:00Z");

        let record = encode_progress(&state, &key, now);
        assert_eq!(record.user_key, "u1");
        assert_eq!(record.version, PROGRESS_SCHEMA_VERSION);
        assert_eq!(record.last_updated, now);

        let decoded = decode_progress(&record).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn encode_truncates_subsecond_precision() {
        let mut state = fixtures::midway_state();
        let start = fixtures::ts("2026-02-01T06:30:00Z") + Duration::milliseconds(750);
        state.program_start_date = Some(start);

        let record = encode_progress(&state, &fixtures::key("u1"), Utc::now());
        assert_eq!(
            record.program_start_date,
            Some(fixtures::ts("2026-02-01T06:30:00Z"))
        );

        let decoded = decode_progress(&record).unwrap();
        state.program_start_date = Some(fixtures::ts("2026-02-01T06:30:00Z"));
        assert_eq!(decoded, state);
    }

    #[test]
    fn v1_snapshot_decodes_with_documented_defaults() {
        let raw = json!({
            "userKey": "u1",
            "name": "Asha",
            "persona": "meera",
            "avatar": "avatar2",
            "selectedTheme": "focus",
            "routineTime": "morning",
            "currentDay": 9,
            "programStartDate": "2026-02-01T06:30:00Z",
            "moodHistory": [],
            "reflections": [],
            "sessionCompletions": [],
            "streak": 3,
            "pauseTokens": 1,
            "isPaused": false,
            "pauseExpiresAt": null,
            "nightMode": false,
            "shortSessionMode": false,
            "hasCompletedOnboarding": true,
            "lastUpdated": "2026-02-09T21:00:00Z",
            "version": 1
        });

        let record: ProgressRecord = serde_json::from_value(raw).unwrap();
        let state = decode_progress(&record).unwrap();

        assert_eq!(state.sound_preference(), SoundPreference::Nature);
        assert!(state.unlocked_achievements().is_empty());
        assert_eq!(state.subscription_status(), SubscriptionStatus::Free);
        assert!(state.favorite_days().is_empty());
        assert_eq!(state.current_day(), 9);
    }

    #[test]
    fn newer_schema_versions_are_refused() {
        let mut record = encode_progress(
            &fixtures::midway_state(),
            &fixtures::key("u1"),
            Utc::now(),
        );
        record.version = PROGRESS_SCHEMA_VERSION + 1;

        let err = decode_progress(&record).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnsupportedSchemaVersion {
                found: PROGRESS_SCHEMA_VERSION + 1,
                supported: PROGRESS_SCHEMA_VERSION,
            }
        );
    }

    #[test]
    fn wire_format_uses_camel_case_names() {
        let record = encode_progress(
            &fixtures::midway_state(),
            &fixtures::key("u1"),
            fixtures::ts("2026-02-12T08:00:00Z"),
        );
        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get("userKey").is_some());
        assert!(value.get("currentDay").is_some());
        assert!(value.get("soundPreference").is_some());
        assert!(value.get("user_key").is_none());
    }
}
