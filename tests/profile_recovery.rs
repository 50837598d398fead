// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end recovery flow: a profile stored under a stale key is listed,
//! restored onto the active account, and repaired, with the controller
//! reloaded after each diagnostic write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use stillpath::admin;
use stillpath::controller::UserController;
use stillpath::model::UserKey;
use stillpath::session::SessionStore;
use stillpath::store::{Database, ProgressStore, UserDirectory};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("stillpath-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[tokio::test]
async fn orphaned_profile_is_restored_and_repaired() {
    let tmp = TempDir::new("recovery");
    let db = Database::open(tmp.path().join("db")).unwrap();
    let store = Arc::new(ProgressStore::new(db.clone()));
    let sessions = SessionStore::new(tmp.path().join("session.json"));
    let controller = UserController::new(store.clone());

    // A returning user left progress under a key the app no longer derives.
    let legacy_key = UserKey::new("legacy-profile").unwrap();
    let legacy_session = sessions.create_session(legacy_key.clone(), "asha").unwrap();
    controller.bind_session(Some(legacy_session)).await;

    controller.complete_meditation();
    controller.complete_task();
    controller.complete_reflection();
    controller.advance_day();
    controller.flush().await;
    controller.logout(&sessions).await.unwrap();

    // The user signs up again; the account directory derives a fresh id.
    let users = UserDirectory::new(db);
    let account = users.create_user("asha", "secret").await.unwrap();
    let active_key = UserKey::new(account.id.clone()).unwrap();
    let active_session = sessions
        .create_session(active_key.clone(), &account.username)
        .unwrap();
    controller.bind_session(Some(active_session)).await;

    // Fresh state: the history is still under the legacy key.
    assert!(controller.state().session_completions().is_empty());
    let profiles = admin::list_profiles(&store).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].user_key, "legacy-profile");

    // Restore onto the active key, then reload the controller to see it.
    admin::restore_profile(&store, &legacy_key, &active_key).await.unwrap();
    controller.reload().await;

    let state = controller.state();
    assert_eq!(state.session_completions().len(), 1);
    assert!(state.completion_for(1).unwrap().meditation);
    assert_eq!(state.current_day(), 2);

    // Counter drift gets repaired from the completion evidence.
    admin::repair_progress(&store, &active_key).await.unwrap();
    controller.reload().await;

    let state = controller.state();
    assert_eq!(state.current_day(), 2);
    assert_eq!(state.streak(), 1);
}
