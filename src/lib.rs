// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stillpath — local-first progress persistence and session reconciliation.
//!
//! The crate is the storage core of a 30-day mindfulness program: a
//! partitioned on-disk key/value database, a pure codec between in-memory
//! user state and its durable snapshot, a session identity provider, and a
//! reconciliation controller that owns the live state and trails it to disk
//! through a debounced single-flight flush.

pub mod admin;
pub mod controller;
pub mod model;
pub mod query;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
