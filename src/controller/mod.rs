// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! State reconciliation controller.
//!
//! [`UserController`] owns the live [`UserState`] for the bound session and
//! trails it to disk. Every mutating action reschedules a single debounced
//! flush; rapid edits collapse into one snapshot save. Completing the last
//! of the day's three activities schedules a delayed day advance. Timers are
//! abortable tokio tasks, so rebinding or dropping the controller cancels
//! anything still pending.
//!
//! Mutating actions spawn tasks and therefore require a tokio runtime.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::model::ids::UserKey;
use crate::model::state::{
    AvatarId, MoodEntry, Persona, ProgramTheme, ReflectionEntry, RoutineTime, SessionCompletion,
    SoundPreference, SubscriptionStatus, UserState, FINAL_DAY,
};
use crate::query;
use crate::session::{Session, SessionError, SessionStore};
use crate::store::codec::{decode_progress, encode_progress};
use crate::store::database::StoreError;
use crate::store::progress::ProgressStore;

/// Achievement ids as they appear in `unlocked_achievements`.
pub mod achievements {
    pub const FIRST_SESSION: &str = "first-session";
    pub const WEEK_STREAK: &str = "week-streak";
    pub const TEN_SESSIONS: &str = "ten-sessions";
    pub const FULL_JOURNEY: &str = "full-journey";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Quiet window between the last mutation and the snapshot save.
    pub flush_debounce: Duration,
    /// Pause between finishing the day's last activity and the advance.
    pub advance_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            flush_debounce: Duration::from_millis(400),
            advance_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseError {
    NoTokensAvailable,
}

impl fmt::Display for PauseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTokensAvailable => f.write_str("no pause tokens available"),
        }
    }
}

impl std::error::Error for PauseError {}

#[derive(Debug)]
pub enum LogoutError {
    Session(SessionError),
    Store(StoreError),
}

impl fmt::Display for LogoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(source) => write!(f, "cannot clear session: {source}"),
            Self::Store(source) => write!(f, "cannot clear stored progress: {source}"),
        }
    }
}

impl std::error::Error for LogoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(source) => Some(source),
            Self::Store(source) => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CompletionSlot {
    Meditation,
    Task,
    Reflection,
}

#[derive(Debug)]
struct ControllerState {
    session: Option<Session>,
    user: UserState,
    pending_flush: Option<JoinHandle<()>>,
    pending_advance: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct ControllerInner {
    store: Arc<ProgressStore>,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
}

/// The single owner of live user state. Not `Clone`; hosts share it behind
/// their own `Arc` if needed.
#[derive(Debug)]
pub struct UserController {
    inner: Arc<ControllerInner>,
}

impl UserController {
    pub fn new(store: Arc<ProgressStore>) -> Self {
        Self::with_config(store, ControllerConfig::default())
    }

    pub fn with_config(store: Arc<ProgressStore>, config: ControllerConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                store,
                config,
                state: Mutex::new(ControllerState {
                    session: None,
                    user: UserState::for_new_user(""),
                    pending_flush: None,
                    pending_advance: None,
                }),
            }),
        }
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.inner.store
    }

    /// Switches the controller to `session`, cancelling pending timers and
    /// loading the stored snapshot. A missing or unreadable snapshot
    /// degrades to fresh state seeded with the session username; binding
    /// `None` resets to fresh anonymous state.
    pub async fn bind_session(&self, session: Option<Session>) {
        self.cancel_pending();

        let loaded = match session.as_ref() {
            None => UserState::for_new_user(""),
            Some(session) => self.load_state_for(session).await,
        };

        let mut state = self.lock_state();
        state.session = session;
        state.user = loaded;
    }

    /// Re-runs the snapshot load for the bound session. Required after
    /// diagnostic operations wrote to the store behind the controller's back.
    pub async fn reload(&self) {
        let session = self.session();
        self.bind_session(session).await;
    }

    async fn load_state_for(&self, session: &Session) -> UserState {
        match self.inner.store.get_progress(&session.user_id).await {
            Ok(Some(record)) => match decode_progress(&record) {
                Ok(user) => user,
                Err(err) => {
                    tracing::warn!(
                        user_id = %session.user_id,
                        error = %err,
                        "cannot decode stored progress, starting fresh"
                    );
                    UserState::for_new_user(&session.username)
                }
            },
            Ok(None) => UserState::for_new_user(&session.username),
            Err(err) => {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %err,
                    "cannot load stored progress, starting fresh"
                );
                UserState::for_new_user(&session.username)
            }
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.lock_state().session.clone()
    }

    pub fn state(&self) -> UserState {
        self.lock_state().user.clone()
    }

    // Profile and settings actions.

    pub fn set_name(&self, name: impl Into<String>) {
        self.mutate(|user| user.name = name.into());
    }

    pub fn set_persona(&self, persona: Option<Persona>) {
        self.mutate(|user| user.persona = persona);
    }

    pub fn set_avatar(&self, avatar: AvatarId) {
        self.mutate(|user| user.avatar = avatar);
    }

    pub fn set_routine_time(&self, routine_time: RoutineTime) {
        self.mutate(|user| user.routine_time = routine_time);
    }

    pub fn complete_onboarding(&self) {
        self.mutate(|user| user.has_completed_onboarding = true);
    }

    pub fn toggle_night_mode(&self) {
        self.mutate(|user| user.night_mode = !user.night_mode);
    }

    pub fn toggle_short_session(&self) {
        self.mutate(|user| user.short_session_mode = !user.short_session_mode);
    }

    pub fn set_sound_preference(&self, preference: SoundPreference) {
        self.mutate(|user| user.sound_preference = preference);
    }

    pub fn set_subscription_status(&self, status: SubscriptionStatus) {
        self.mutate(|user| user.subscription_status = status);
    }

    pub fn toggle_favorite_day(&self, day: u32) {
        self.mutate(|user| {
            if let Some(index) = user.favorite_days.iter().position(|&d| d == day) {
                user.favorite_days.remove(index);
            } else {
                user.favorite_days.push(day);
            }
        });
    }

    /// Picking a theme restarts the program: day one, fresh streak and
    /// histories. Reflections are journal content and survive the restart.
    pub fn select_theme(&self, theme: ProgramTheme) {
        let mut state = self.lock_state();
        if let Some(handle) = state.pending_advance.take() {
            handle.abort();
        }
        state.user.selected_theme = Some(theme);
        state.user.current_day = 1;
        state.user.program_start_date = Some(Utc::now());
        state.user.streak = 0;
        state.user.mood_history.clear();
        state.user.session_completions.clear();
        self.schedule_flush(&mut state);
    }

    // Daily activities.

    pub fn complete_meditation(&self) {
        self.complete_slot(CompletionSlot::Meditation);
    }

    pub fn complete_task(&self) {
        self.complete_slot(CompletionSlot::Task);
    }

    pub fn complete_reflection(&self) {
        self.complete_slot(CompletionSlot::Reflection);
    }

    /// Records a mood entry and marks today's check-in. Mood check-ins never
    /// contribute to day completion and never trigger the day advance.
    pub fn complete_mood_checkin(&self, mood: u8, emotion: Option<String>) {
        let mood = mood.clamp(1, 5);
        let mut state = self.lock_state();
        let now = Utc::now();
        let day = state.user.current_day;

        state.user.mood_history.push(MoodEntry {
            day,
            mood,
            emotion,
            timestamp: now,
        });

        if state.user.completion_for(day).is_none() {
            state
                .user
                .session_completions
                .push(SessionCompletion::empty(day, now));
        }
        if let Some(completion) = state.user.completion_for_mut(day) {
            completion.mood_checkin = true;
        }

        evaluate_achievements(&mut state.user);
        self.schedule_flush(&mut state);
    }

    pub fn save_reflection(&self, entry: ReflectionEntry) {
        self.mutate(|user| user.reflections.push(entry));
    }

    /// Advances without credit toward the streak. Capped at the final day.
    pub fn skip_day(&self) {
        let mut state = self.lock_state();
        if let Some(handle) = state.pending_advance.take() {
            handle.abort();
        }
        state.user.current_day = (state.user.current_day + 1).min(FINAL_DAY);
        evaluate_achievements(&mut state.user);
        self.schedule_flush(&mut state);
    }

    /// Immediate day advance with streak credit. The scheduled auto-advance
    /// runs through the same path.
    pub fn advance_day(&self) {
        let mut state = self.lock_state();
        if let Some(handle) = state.pending_advance.take() {
            handle.abort();
        }
        advance_day_in(&mut state.user);
        self.schedule_flush(&mut state);
    }

    /// Spends a pause token: 24 hours of grace, no streak loss.
    pub fn activate_pause(&self) -> Result<(), PauseError> {
        let mut state = self.lock_state();
        if state.user.pause_tokens == 0 {
            return Err(PauseError::NoTokensAvailable);
        }

        state.user.pause_tokens -= 1;
        state.user.is_paused = true;
        state.user.pause_expires_at = Some(Utc::now() + chrono::Duration::hours(24));
        self.schedule_flush(&mut state);
        Ok(())
    }

    // Session teardown.

    /// Signs out, keeping the stored snapshot. Pending changes are flushed
    /// first so nothing typed in the last debounce window is lost.
    pub async fn logout(&self, sessions: &SessionStore) -> Result<(), LogoutError> {
        self.cancel_pending();
        ControllerInner::flush_now(self.inner.clone()).await;

        sessions.clear_session().map_err(LogoutError::Session)?;

        let mut state = self.lock_state();
        state.session = None;
        state.user = UserState::for_new_user("");
        Ok(())
    }

    /// Signs out and deletes the snapshot. Granular records (activity logs,
    /// journal entries) are left in place.
    pub async fn logout_and_clear(&self, sessions: &SessionStore) -> Result<(), LogoutError> {
        self.cancel_pending();

        let key = self.session().map(|session| session.user_id);
        if let Some(key) = key {
            self.inner
                .store
                .clear_progress(&key)
                .await
                .map_err(LogoutError::Store)?;
        }

        sessions.clear_session().map_err(LogoutError::Session)?;

        let mut state = self.lock_state();
        state.session = None;
        state.user = UserState::for_new_user("");
        Ok(())
    }

    /// Saves the current state immediately, cancelling the pending debounce.
    pub async fn flush(&self) {
        self.cancel_pending_flush();
        ControllerInner::flush_now(self.inner.clone()).await;
    }

    // Derived reads over a consistent snapshot of the live state.

    pub fn current_block(&self) -> u32 {
        query::current_block(self.lock_state().user.current_day)
    }

    pub fn weekly_mood_average(&self) -> f64 {
        query::weekly_mood_average(&self.lock_state().user.mood_history)
    }

    pub fn today_completion(&self) -> Option<SessionCompletion> {
        let state = self.lock_state();
        query::today_completion(&state.user).cloned()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.inner.state.lock().expect("controller state lock poisoned")
    }

    fn mutate(&self, apply: impl FnOnce(&mut UserState)) {
        let mut state = self.lock_state();
        apply(&mut state.user);
        self.schedule_flush(&mut state);
    }

    fn complete_slot(&self, slot: CompletionSlot) {
        let mut state = self.lock_state();
        let now = Utc::now();
        let day = state.user.current_day;

        if state.user.completion_for(day).is_none() {
            state
                .user
                .session_completions
                .push(SessionCompletion::empty(day, now));
        }

        let mut flipped = false;
        let mut day_complete = false;
        if let Some(completion) = state.user.completion_for_mut(day) {
            let flag = match slot {
                CompletionSlot::Meditation => &mut completion.meditation,
                CompletionSlot::Task => &mut completion.task,
                CompletionSlot::Reflection => &mut completion.reflection,
            };
            flipped = !*flag;
            *flag = true;
            day_complete = completion.is_day_complete();
        }

        evaluate_achievements(&mut state.user);

        // Evaluated on the post-update state; only a fresh false-to-true flip
        // that completes the current day arms the advance, and only one
        // advance may be in flight.
        if flipped && day_complete && state.pending_advance.is_none() {
            self.schedule_advance(&mut state);
        }

        self.schedule_flush(&mut state);
    }

    fn schedule_flush(&self, state: &mut ControllerState) {
        if let Some(handle) = state.pending_flush.take() {
            handle.abort();
        }
        if state.session.is_none() {
            return;
        }

        let inner = self.inner.clone();
        let debounce = self.inner.config.flush_debounce;
        state.pending_flush = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            ControllerInner::flush_now(inner).await;
        }));
    }

    fn schedule_advance(&self, state: &mut ControllerState) {
        let inner = self.inner.clone();
        let delay = self.inner.config.advance_delay;
        state.pending_advance = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut state = inner.state.lock().expect("controller state lock poisoned");
                state.pending_advance = None;
                advance_day_in(&mut state.user);
            }
            ControllerInner::flush_now(inner).await;
        }));
    }

    fn cancel_pending(&self) {
        let mut state = self.lock_state();
        if let Some(handle) = state.pending_flush.take() {
            handle.abort();
        }
        if let Some(handle) = state.pending_advance.take() {
            handle.abort();
        }
    }

    fn cancel_pending_flush(&self) {
        let mut state = self.lock_state();
        if let Some(handle) = state.pending_flush.take() {
            handle.abort();
        }
    }
}

impl Drop for UserController {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.state.lock() {
            if let Some(handle) = state.pending_flush.take() {
                handle.abort();
            }
            if let Some(handle) = state.pending_advance.take() {
                handle.abort();
            }
        }
    }
}

impl ControllerInner {
    /// Encodes the live state as of now and saves it. Autosave failures are
    /// logged and swallowed; the next mutation schedules a retry naturally.
    async fn flush_now(inner: Arc<ControllerInner>) {
        let snapshot = {
            let state = inner.state.lock().expect("controller state lock poisoned");
            state
                .session
                .as_ref()
                .map(|session| encode_progress(&state.user, &session.user_id, Utc::now()))
        };

        let Some(record) = snapshot else {
            return;
        };

        if let Err(err) = inner.store.save_progress(record).await {
            tracing::warn!(error = %err, "autosave failed, keeping state in memory");
        }
    }
}

fn advance_day_in(user: &mut UserState) {
    user.current_day = (user.current_day + 1).min(FINAL_DAY);
    user.streak += 1;
    evaluate_achievements(user);
}

fn unlock(user: &mut UserState, id: &str) {
    if !user.unlocked_achievements.iter().any(|a| a == id) {
        user.unlocked_achievements.push(id.to_owned());
    }
}

fn evaluate_achievements(user: &mut UserState) {
    let completions = user.session_completions.len();
    if completions >= 1 {
        unlock(user, achievements::FIRST_SESSION);
    }
    if user.streak >= 7 {
        unlock(user, achievements::WEEK_STREAK);
    }
    if completions >= 10 {
        unlock(user, achievements::TEN_SESSIONS);
    }
    if user.current_day >= FINAL_DAY {
        unlock(user, achievements::FULL_JOURNEY);
    }
}
