// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagnostic operations over stored snapshots.
//!
//! These write directly through the [`ProgressStore`], bypassing any live
//! [`UserController`](crate::controller::UserController). After a restore or
//! repair the host must rebind or `reload()` the controller; there is no
//! change notification.

use std::fmt;

use crate::model::ids::UserKey;
use crate::store::codec::ProgressRecord;
use crate::store::database::StoreError;
use crate::store::progress::ProgressStore;

#[derive(Debug)]
pub enum AdminError {
    ProfileNotFound { key: String },
    Store(StoreError),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfileNotFound { key } => write!(f, "no stored profile for key {key:?}"),
            Self::Store(source) => write!(f, "admin store error: {source}"),
        }
    }
}

impl std::error::Error for AdminError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProfileNotFound { .. } => None,
            Self::Store(source) => Some(source),
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(source: StoreError) -> Self {
        Self::Store(source)
    }
}

/// Every stored snapshot, for inspection.
pub async fn list_profiles(store: &ProgressStore) -> Result<Vec<ProgressRecord>, StoreError> {
    let mut profiles = Vec::new();
    for key in store.list_users().await? {
        if let Some(record) = store.get_progress(&key).await? {
            profiles.push(record);
        }
    }
    Ok(profiles)
}

/// Copies the snapshot stored under `source` onto `target`, histories
/// intact, refreshing `last_updated`. Used to hand an orphaned profile to
/// the active account. The `source` snapshot stays in place.
pub async fn restore_profile(
    store: &ProgressStore,
    source: &UserKey,
    target: &UserKey,
) -> Result<ProgressRecord, AdminError> {
    let Some(mut record) = store.get_progress(source).await? else {
        return Err(AdminError::ProfileNotFound {
            key: source.as_str().to_owned(),
        });
    };

    record.user_key = target.as_str().to_owned();
    store.save_progress(record).await?;

    let restored = store.get_progress(target).await?;
    restored.ok_or_else(|| AdminError::ProfileNotFound {
        key: target.as_str().to_owned(),
    })
}

/// Recomputes `current_day` and `streak` from the completion history, for
/// snapshots where the counters drifted from the evidence.
pub async fn repair_progress(
    store: &ProgressStore,
    key: &UserKey,
) -> Result<ProgressRecord, AdminError> {
    let Some(mut record) = store.get_progress(key).await? else {
        return Err(AdminError::ProfileNotFound {
            key: key.as_str().to_owned(),
        });
    };

    let completions = record.session_completions.len() as u32;
    record.current_day = (completions + 1).min(crate::model::state::FINAL_DAY);
    record.streak = completions;
    store.save_progress(record).await?;

    let repaired = store.get_progress(key).await?;
    repaired.ok_or_else(|| AdminError::ProfileNotFound {
        key: key.as_str().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::{list_profiles, repair_progress, restore_profile, AdminError};
    use crate::model::fixtures;
    use crate::store::codec::encode_progress;
    use crate::store::database::Database;
    use crate::store::progress::ProgressStore;

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos =
                SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
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

    struct AdminTestCtx {
        tmp: TempDir,
        store: ProgressStore,
    }

    #[fixture]
    fn ctx() -> AdminTestCtx {
        let tmp = TempDir::new("admin");
        let db = Database::open(tmp.path().join("db")).unwrap();
        let store = ProgressStore::new(db);
        AdminTestCtx { tmp, store }
    }

    #[rstest]
    #[tokio::test]
    async fn restore_rekeys_a_snapshot_with_history_intact(ctx: AdminTestCtx) {
        let orphan = fixtures::key("orphan");
        let record = encode_progress(&fixtures::midway_state(), &orphan, Utc::now());
        ctx.store.save_progress(record).await.unwrap();

        let active = fixtures::key("active");
        let restored = restore_profile(&ctx.store, &orphan, &active).await.unwrap();

        assert_eq!(restored.user_key, "active");
        assert_eq!(restored.current_day, 12);
        assert_eq!(restored.session_completions.len(), 4);

        // The orphaned copy is not removed.
        assert!(ctx.store.get_progress(&orphan).await.unwrap().is_some());
        assert_eq!(list_profiles(&ctx.store).await.unwrap().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn restore_of_a_missing_source_fails(ctx: AdminTestCtx) {
        let err = restore_profile(&ctx.store, &fixtures::key("ghost"), &fixtures::key("active"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::ProfileNotFound { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn repair_recomputes_counters_from_completions(ctx: AdminTestCtx) {
        let key = fixtures::key("u1");
        let mut state = fixtures::midway_state();
        // Drifted counters: the 4 completion entries are the evidence.
        state.current_day = 25;
        state.streak = 19;
        ctx.store
            .save_progress(encode_progress(&state, &key, Utc::now()))
            .await
            .unwrap();

        let repaired = repair_progress(&ctx.store, &key).await.unwrap();
        assert_eq!(repaired.current_day, 5);
        assert_eq!(repaired.streak, 4);
    }

    #[rstest]
    #[tokio::test]
    async fn repair_caps_the_day_at_the_final_day(ctx: AdminTestCtx) {
        let key = fixtures::key("u1");
        let mut state = fixtures::midway_state();
        for day in 1..=35 {
            state.session_completions.push(
                crate::model::state::SessionCompletion::empty(
                    day + 100,
                    fixtures::ts("2026-03-01T07:00:00Z"),
                ),
            );
        }
        ctx.store
            .save_progress(encode_progress(&state, &key, Utc::now()))
            .await
            .unwrap();

        let repaired = repair_progress(&ctx.store, &key).await.unwrap();
        assert_eq!(repaired.current_day, 30);
        assert_eq!(repaired.streak, 39);
    }
}
