// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![cfg(test)]

use chrono::{DateTime, Utc};

use super::ids::UserKey;
use super::state::{
    MoodEntry, Persona, ProgramTheme, ReflectionEntry, SessionCompletion, UserState,
};

pub(crate) fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("fixture timestamp")
        .with_timezone(&Utc)
}

pub(crate) fn key(value: &str) -> UserKey {
    UserKey::new(value).expect("fixture user key")
}

/// A user twelve days in, with enough history to exercise every codec field.
pub(crate) fn midway_state() -> UserState {
    let mut state = UserState::for_new_user("Asha");
    state.persona = Some(Persona::Meera);
    state.selected_theme = Some(ProgramTheme::Focus);
    state.has_completed_onboarding = true;
    state.current_day = 12;
    state.streak = 4;
    state.program_start_date = Some(ts("2026-02-01T06:30:00Z"));
    state.favorite_days = vec![3, 7];

    for day in 8..12 {
        state.session_completions.push(SessionCompletion {
            day,
            meditation: true,
            reflection: true,
            task: true,
            mood_checkin: day % 2 == 0,
            timestamp: ts("2026-02-10T07:00:00Z"),
        });
        state.mood_history.push(MoodEntry {
            day,
            mood: 4,
            emotion: Some("calm".to_owned()),
            timestamp: ts("2026-02-10T07:05:00Z"),
        });
    }

    state.reflections.push(ReflectionEntry {
        day: 11,
        mood: Some("settled".to_owned()),
        journal: "Breath felt easier today.".to_owned(),
        date: ts("2026-02-11T21:00:00Z"),
    });

    state
}

/// Day 29 with meditation and task done: one reflection away from the
/// final-day advance.
pub(crate) fn penultimate_day_state() -> UserState {
    let mut state = midway_state();
    state.current_day = 29;
    state.streak = 20;
    state.session_completions.push(SessionCompletion {
        day: 29,
        meditation: true,
        reflection: false,
        task: true,
        mood_checkin: false,
        timestamp: ts("2026-03-01T07:00:00Z"),
    });
    state
}
