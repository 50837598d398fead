// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Durable storage: the partitioned on-disk database, the progress codec,
//! and the record-level services built on top of them.

pub mod codec;
pub mod database;
pub mod progress;
pub mod users;

pub use codec::{decode_progress, encode_progress, DecodeError, ProgressRecord};
pub use database::{Database, Partition, StoreError, WriteDurability};
pub use progress::{
    ActivityKind, ActivityLog, JournalEntry, NewActivityLog, NewJournalEntry, ProgressStore,
    UserSettings,
};
pub use users::{LocalUser, UserDirectory, UserDirectoryError};
