// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pure derived reads over [`UserState`]. Nothing here mutates or touches
//! storage; presentation layers call these on a cloned state.

use chrono::{DateTime, Utc};

use crate::model::state::{MoodEntry, SessionCompletion, UserState, FINAL_DAY};

/// The program runs in three 10-day blocks.
pub fn current_block(day: u32) -> u32 {
    let day = day.clamp(1, FINAL_DAY);
    (day - 1) / 10 + 1
}

/// 1-based position of `day` inside its block.
pub fn day_in_block(day: u32) -> u32 {
    let day = day.clamp(1, FINAL_DAY);
    (day - 1) % 10 + 1
}

/// Mean of the trailing seven mood entries. An empty history reads as a
/// neutral 3.0 rather than an absence the caller has to special-case.
pub fn weekly_mood_average(history: &[MoodEntry]) -> f64 {
    if history.is_empty() {
        return 3.0;
    }

    let recent = &history[history.len().saturating_sub(7)..];
    let sum: u32 = recent.iter().map(|entry| u32::from(entry.mood)).sum();
    f64::from(sum) / recent.len() as f64
}

pub fn today_completion(state: &UserState) -> Option<&SessionCompletion> {
    state.completion_for(state.current_day())
}

/// Whether an active pause has outlived its 24h window. Nothing enforces
/// this on a timer; it is a presentation-side check.
pub fn pause_expired(state: &UserState, now: DateTime<Utc>) -> bool {
    state.is_paused()
        && state
            .pause_expires_at()
            .is_some_and(|expires_at| now >= expires_at)
}

#[cfg(test)]
mod tests {
    use super::{current_block, day_in_block, pause_expired, today_completion, weekly_mood_average};
    use crate::model::fixtures;
    use crate::model::state::MoodEntry;

    fn mood(day: u32, mood: u8) -> MoodEntry {
        MoodEntry {
            day,
            mood,
            emotion: None,
            timestamp: fixtures::ts("2026-02-10T07:05:00Z"),
        }
    }

    #[test]
    fn blocks_split_the_program_into_tens() {
        assert_eq!(current_block(1), 1);
        assert_eq!(current_block(10), 1);
        assert_eq!(current_block(11), 2);
        assert_eq!(current_block(30), 3);
        assert_eq!(current_block(99), 3);

        assert_eq!(day_in_block(1), 1);
        assert_eq!(day_in_block(10), 10);
        assert_eq!(day_in_block(11), 1);
        assert_eq!(day_in_block(30), 10);
    }

    #[test]
    fn mood_average_is_neutral_when_empty_and_trailing_seven_otherwise() {
        assert_eq!(weekly_mood_average(&[]), 3.0);

        let history: Vec<MoodEntry> = (1..=10).map(|day| mood(day, 1)).collect();
        let mut history = history;
        for entry in history.iter_mut().skip(3) {
            entry.mood = 5;
        }
        // Last seven entries are all 5s; the early 1s fall out of the window.
        assert_eq!(weekly_mood_average(&history), 5.0);

        let short = vec![mood(1, 2), mood(2, 4)];
        assert_eq!(weekly_mood_average(&short), 3.0);
    }

    #[test]
    fn today_completion_looks_up_the_current_day() {
        let state = fixtures::penultimate_day_state();
        let completion = today_completion(&state).unwrap();
        assert_eq!(completion.day, 29);
        assert!(completion.meditation);
        assert!(!completion.reflection);

        let fresh = crate::model::state::UserState::for_new_user("Asha");
        assert!(today_completion(&fresh).is_none());
    }

    #[test]
    fn pause_expiry_is_a_pure_check() {
        let mut state = fixtures::midway_state();
        assert!(!pause_expired(&state, fixtures::ts("2026-02-12T08:00:00Z")));

        state.is_paused = true;
        state.pause_expires_at = Some(fixtures::ts("2026-02-13T08:00:00Z"));
        assert!(!pause_expired(&state, fixtures::ts("2026-02-13T07:59:59Z")));
        assert!(pause_expired(&state, fixtures::ts("2026-02-13T08:00:00Z")));
    }
}
