// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration, Utc};
use stillpath::store::ProgressRecord;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut path = std::env::temp_dir();
        path.push(format!("stillpath_bench_{prefix}_{pid}_{nanos}_{counter}"));
        std::fs::create_dir_all(&path).expect("create temp dir");

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn base_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-01T06:30:00Z")
        .expect("fixture timestamp")
        .with_timezone(&Utc)
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// A few days into the program.
    ProgressSmall,
    /// A completed 30-day journey with daily moods and reflections.
    ProgressFull,
}

pub fn progress_record(case: Case, user_key: &str) -> ProgressRecord {
    let days = match case {
        Case::ProgressSmall => 4,
        Case::ProgressFull => 30,
    };
    let start = base_instant();

    let raw = serde_json::json!({
        "userKey": user_key,
        "name": "Asha",
        "persona": "meera",
        "avatar": "avatar3",
        "selectedTheme": "focus",
        "routineTime": "morning",
        "currentDay": days,
        "programStartDate": start.to_rfc3339(),
        "moodHistory": (1..=days).map(|day| serde_json::json!({
            "day": day,
            "mood": (day % 5) + 1,
            "emotion": "steady",
            "timestamp": (start + Duration::days(day as i64)).to_rfc3339(),
        })).collect::<Vec<_>>(),
        "reflections": (1..=days).map(|day| serde_json::json!({
            "day": day,
            "journal": format!("Day {day}: ten slow breaths before the list of things to do."),
            "date": (start + Duration::days(day as i64)).to_rfc3339(),
        })).collect::<Vec<_>>(),
        "sessionCompletions": (1..=days).map(|day| serde_json::json!({
            "day": day,
            "meditation": true,
            "reflection": true,
            "task": true,
            "moodCheckin": day % 2 == 0,
            "timestamp": (start + Duration::days(day as i64)).to_rfc3339(),
        })).collect::<Vec<_>>(),
        "streak": days.saturating_sub(1),
        "pauseTokens": 1,
        "isPaused": false,
        "pauseExpiresAt": null,
        "nightMode": false,
        "shortSessionMode": false,
        "subscriptionStatus": "free",
        "favoriteDays": [3, 7, 21],
        "hasCompletedOnboarding": true,
        "lastUpdated": (start + Duration::days(days as i64)).to_rfc3339(),
        "version": 2,
        "soundPreference": "nature",
        "unlockedAchievements": ["first-session", "week-streak"],
    });

    serde_json::from_value(raw).expect("valid fixture record")
}
