// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! `UserState` is the in-memory shape of one user's journey through the
//! 30-day program; the durable form lives in `store::codec`.

pub(crate) mod fixtures;
pub mod ids;
pub mod state;

pub use ids::{Id, IdError, UserKey};
pub use state::{
    AvatarId, MoodEntry, Persona, ProgramTheme, ReflectionEntry, RoutineTime, SessionCompletion,
    SoundPreference, SubscriptionStatus, UserState, FINAL_DAY,
};
