// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Stillpath-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stillpath and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DB_META_FILENAME: &str = "stillpath.db.json";

/// On-disk layout version. Bumped whenever a partition is added; upgrades are
/// additive only and never rewrite existing records.
const DB_LAYOUT_VERSION: u32 = 5;

#[derive(Debug)]
pub enum StoreError {
    /// The database root cannot be created or is not usable as a directory.
    Unavailable {
        path: PathBuf,
        source: io::Error,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The directory was written by a newer build of the program.
    UnsupportedDatabaseVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { path, source } => {
                write!(f, "storage unavailable at {path:?}: {source}")
            }
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::UnsupportedDatabaseVersion {
                path,
                found,
                supported,
            } => write!(
                f,
                "database at {path:?} has layout version {found}, newest supported is {supported}"
            ),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::UnsupportedDatabaseVersion { .. } => None,
            Self::SymlinkRefused { .. } => None,
        }
    }
}

/// The record partitions of the database. One directory per partition, one
/// JSON document per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Users,
    Progress,
    ActivityLogs,
    JournalEntries,
    UserSettings,
}

impl Partition {
    pub const ALL: [Partition; 5] = [
        Partition::Users,
        Partition::Progress,
        Partition::ActivityLogs,
        Partition::JournalEntries,
        Partition::UserSettings,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Progress => "progress",
            Self::ActivityLogs => "activity_logs",
            Self::JournalEntries => "journal_entries",
            Self::UserSettings => "user_settings",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

#[derive(Debug, Serialize, Deserialize)]
struct DbMetaJson {
    version: u32,
}

/// Partitioned key/value database rooted at one directory.
///
/// `open` is idempotent: every caller that opens the same root receives the
/// same `Arc<Database>` for as long as at least one handle is alive.
#[derive(Debug)]
pub struct Database {
    root: PathBuf,
    durability: WriteDurability,
}

static OPEN_DATABASES: OnceLock<Mutex<HashMap<PathBuf, Weak<Database>>>> = OnceLock::new();

fn open_databases() -> &'static Mutex<HashMap<PathBuf, Weak<Database>>> {
    OPEN_DATABASES.get_or_init(|| Mutex::new(HashMap::new()))
}

impl Database {
    pub fn open(root: impl AsRef<Path>) -> Result<Arc<Self>, StoreError> {
        Self::open_with(root, WriteDurability::default())
    }

    /// Opens (or joins) the database at `root`. If another handle for the
    /// same root is already alive, its durability setting wins.
    pub fn open_with(
        root: impl AsRef<Path>,
        durability: WriteDurability,
    ) -> Result<Arc<Self>, StoreError> {
        let root = root.as_ref();

        fs::create_dir_all(root).map_err(|source| StoreError::Unavailable {
            path: root.to_path_buf(),
            source,
        })?;
        let root = root
            .canonicalize()
            .map_err(|source| StoreError::Unavailable {
                path: root.to_path_buf(),
                source,
            })?;

        let mut registry = open_databases().lock().expect("database registry poisoned");
        if let Some(db) = registry.get(&root).and_then(Weak::upgrade) {
            return Ok(db);
        }

        // Entries whose last handle was dropped are dead; sweep them here so
        // the registry stays bounded by the number of live databases.
        registry.retain(|_, weak| weak.strong_count() > 0);

        let db = Arc::new(Self {
            root: root.clone(),
            durability,
        });
        db.init()?;
        registry.insert(root, Arc::downgrade(&db));
        Ok(db)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join(DB_META_FILENAME)
    }

    /// Reads or creates the layout meta file and ensures every partition
    /// directory exists. Existing records are never touched.
    fn init(&self) -> Result<(), StoreError> {
        let meta_path = self.meta_path();
        let stored_version = match fs::read_to_string(&meta_path) {
            Ok(meta_str) => {
                let meta: DbMetaJson =
                    serde_json::from_str(&meta_str).map_err(|source| StoreError::Json {
                        path: meta_path.clone(),
                        source,
                    })?;
                Some(meta.version)
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StoreError::Io {
                    path: meta_path,
                    source,
                });
            }
        };

        if let Some(found) = stored_version {
            if found > DB_LAYOUT_VERSION {
                return Err(StoreError::UnsupportedDatabaseVersion {
                    path: meta_path,
                    found,
                    supported: DB_LAYOUT_VERSION,
                });
            }
        }

        for partition in Partition::ALL {
            create_dir_all_safe(&self.root, Path::new(partition.dir_name()))?;
        }

        if stored_version != Some(DB_LAYOUT_VERSION) {
            let meta_str = serde_json::to_string_pretty(&DbMetaJson {
                version: DB_LAYOUT_VERSION,
            })
            .map_err(|source| StoreError::Json {
                path: meta_path.clone(),
                source,
            })?;
            write_atomic_in_root(
                &self.root,
                &meta_path,
                format!("{meta_str}\n").as_bytes(),
                self.durability,
            )?;
        }

        Ok(())
    }

    fn record_path(&self, partition: Partition, key: &str) -> PathBuf {
        let file_stem = encode_record_key_segment(key);
        self.root
            .join(partition.dir_name())
            .join(format!("{file_stem}.json"))
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        partition: Partition,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let path = self.record_path(partition, key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let value = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        Ok(Some(value))
    }

    pub fn put<T: Serialize>(
        &self,
        partition: Partition,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(partition, key);
        let raw = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        write_atomic_in_root(
            &self.root,
            &path,
            format!("{raw}\n").as_bytes(),
            self.durability,
        )
    }

    pub fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError> {
        let path = self.record_path(partition, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Lists the decoded record keys of a partition, sorted. Files that are
    /// not records of ours (wrong extension, undecodable stem) are skipped.
    pub fn list_keys(&self, partition: Partition) -> Result<Vec<String>, StoreError> {
        let dir = self.root.join(partition.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut keys = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(file_stem) = file_name.strip_suffix(".json") else {
                continue;
            };
            if let Some(key) = decode_record_key_segment(file_stem) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    pub fn get_all<T: DeserializeOwned>(
        &self,
        partition: Partition,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let mut records = Vec::new();
        for key in self.list_keys(partition)? {
            if let Some(value) = self.get(partition, &key)? {
                records.push((key, value));
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
fn registry_tracks_root(root: &Path) -> bool {
    open_databases()
        .lock()
        .expect("database registry poisoned")
        .contains_key(root)
}

// Extracted filename encoding and safe filesystem write helpers.
include!("database/helpers.rs");
