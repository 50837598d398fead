// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The program is a fixed 30-day journey; `current_day` never exceeds this.
pub const FINAL_DAY: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    Arjun,
    Meera,
    Rohan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramTheme {
    Anxiety,
    Focus,
    Emotional,
    Sleep,
    Confidence,
    Lifestyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineTime {
    Morning,
    Midday,
    Night,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarId {
    Avatar1,
    Avatar2,
    Avatar3,
    Avatar4,
    Avatar5,
    Avatar6,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPreference {
    #[default]
    Nature,
    Ambient,
    Voice,
    Silent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
}

/// One mood check-in. `mood` is clamped to 1..=5 before it gets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub day: u32,
    pub mood: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionEntry {
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    pub journal: String,
    pub date: DateTime<Utc>,
}

/// Per-day activity flags. At most one of these exists per day; repeated
/// completions merge into the existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCompletion {
    pub day: u32,
    pub meditation: bool,
    pub reflection: bool,
    pub task: bool,
    pub mood_checkin: bool,
    pub timestamp: DateTime<Utc>,
}

impl SessionCompletion {
    pub fn empty(day: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            day,
            meditation: false,
            reflection: false,
            task: false,
            mood_checkin: false,
            timestamp,
        }
    }

    /// All three program activities done (mood check-in does not count).
    pub fn is_day_complete(&self) -> bool {
        self.meditation && self.task && self.reflection
    }
}

/// The in-memory state of one user's journey. Mutation goes through the
/// reconciliation controller; everything else reads through the accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub(crate) name: String,
    pub(crate) persona: Option<Persona>,
    pub(crate) avatar: AvatarId,
    pub(crate) selected_theme: Option<ProgramTheme>,
    pub(crate) routine_time: RoutineTime,
    pub(crate) current_day: u32,
    pub(crate) program_start_date: Option<DateTime<Utc>>,
    pub(crate) mood_history: Vec<MoodEntry>,
    pub(crate) reflections: Vec<ReflectionEntry>,
    pub(crate) session_completions: Vec<SessionCompletion>,
    pub(crate) streak: u32,
    pub(crate) pause_tokens: u32,
    pub(crate) is_paused: bool,
    pub(crate) pause_expires_at: Option<DateTime<Utc>>,
    pub(crate) night_mode: bool,
    pub(crate) short_session_mode: bool,
    pub(crate) subscription_status: SubscriptionStatus,
    pub(crate) favorite_days: Vec<u32>,
    pub(crate) has_completed_onboarding: bool,
    pub(crate) sound_preference: SoundPreference,
    pub(crate) unlocked_achievements: Vec<String>,
}

impl UserState {
    /// The state a freshly onboarded (or recovered-from-corruption) user
    /// starts from. One pause token, day one, nothing completed.
    pub fn for_new_user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: None,
            avatar: AvatarId::Avatar1,
            selected_theme: None,
            routine_time: RoutineTime::Flexible,
            current_day: 1,
            program_start_date: None,
            mood_history: Vec::new(),
            reflections: Vec::new(),
            session_completions: Vec::new(),
            streak: 0,
            pause_tokens: 1,
            is_paused: false,
            pause_expires_at: None,
            night_mode: false,
            short_session_mode: false,
            subscription_status: SubscriptionStatus::Free,
            favorite_days: Vec::new(),
            has_completed_onboarding: false,
            sound_preference: SoundPreference::Nature,
            unlocked_achievements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn persona(&self) -> Option<Persona> {
        self.persona
    }

    pub fn avatar(&self) -> AvatarId {
        self.avatar
    }

    pub fn selected_theme(&self) -> Option<ProgramTheme> {
        self.selected_theme
    }

    pub fn routine_time(&self) -> RoutineTime {
        self.routine_time
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn program_start_date(&self) -> Option<DateTime<Utc>> {
        self.program_start_date
    }

    pub fn mood_history(&self) -> &[MoodEntry] {
        &self.mood_history
    }

    pub fn reflections(&self) -> &[ReflectionEntry] {
        &self.reflections
    }

    pub fn session_completions(&self) -> &[SessionCompletion] {
        &self.session_completions
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn pause_tokens(&self) -> u32 {
        self.pause_tokens
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn pause_expires_at(&self) -> Option<DateTime<Utc>> {
        self.pause_expires_at
    }

    pub fn night_mode(&self) -> bool {
        self.night_mode
    }

    pub fn short_session_mode(&self) -> bool {
        self.short_session_mode
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        self.subscription_status
    }

    pub fn favorite_days(&self) -> &[u32] {
        &self.favorite_days
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.has_completed_onboarding
    }

    pub fn sound_preference(&self) -> SoundPreference {
        self.sound_preference
    }

    pub fn unlocked_achievements(&self) -> &[String] {
        &self.unlocked_achievements
    }

    pub fn completion_for(&self, day: u32) -> Option<&SessionCompletion> {
        self.session_completions.iter().find(|c| c.day == day)
    }

    pub(crate) fn completion_for_mut(&mut self, day: u32) -> Option<&mut SessionCompletion> {
        self.session_completions.iter_mut().find(|c| c.day == day)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionCompletion, UserState};
    use chrono::Utc;

    #[test]
    fn new_user_starts_on_day_one_with_a_pause_token() {
        let state = UserState::for_new_user("Asha");
        assert_eq!(state.current_day(), 1);
        assert_eq!(state.streak(), 0);
        assert_eq!(state.pause_tokens(), 1);
        assert!(!state.has_completed_onboarding());
        assert!(state.session_completions().is_empty());
    }

    #[test]
    fn day_complete_ignores_mood_checkin() {
        let mut completion = SessionCompletion::empty(3, Utc::now());
        completion.meditation = true;
        completion.task = true;
        completion.mood_checkin = true;
        assert!(!completion.is_day_complete());

        completion.reflection = true;
        assert!(completion.is_day_complete());
    }
}
