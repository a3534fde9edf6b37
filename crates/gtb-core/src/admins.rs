//! Admin allow-list store.
//!
//! A simple keyed store persisted as a JSON file, seeded from `ADMIN_IDS` on
//! first load. Every command surface is gated on membership here.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminEntry {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub added_by: Option<i64>,
    pub added_at: String,
}

pub struct AdminStore {
    path: PathBuf,
    entries: Mutex<Vec<AdminEntry>>,
}

impl AdminStore {
    /// Load the store from disk, creating it with the seed ids if absent.
    pub fn load(path: impl Into<PathBuf>, seed_ids: &[i64]) -> Result<Self> {
        let path = path.into();
        let mut entries: Vec<AdminEntry> = match fs::read_to_string(&path) {
            Ok(txt) => serde_json::from_str(&txt)?,
            Err(_) => Vec::new(),
        };

        let mut seeded = false;
        for &id in seed_ids {
            if entries.iter().any(|e| e.user_id == id) {
                continue;
            }
            entries.push(AdminEntry {
                user_id: id,
                username: Some("default_admin".to_string()),
                first_name: Some("Default Admin".to_string()),
                added_by: Some(id),
                added_at: now_stamp(),
            });
            seeded = true;
        }

        let store = Self {
            path,
            entries: Mutex::new(entries),
        };
        if seeded {
            store.save()?;
        }
        Ok(store)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.guard().iter().any(|e| e.user_id == user_id)
    }

    /// Insert or replace an admin entry.
    pub fn add(
        &self,
        user_id: i64,
        username: Option<String>,
        first_name: Option<String>,
        added_by: Option<i64>,
    ) -> Result<()> {
        {
            let mut entries = self.guard();
            entries.retain(|e| e.user_id != user_id);
            entries.push(AdminEntry {
                user_id,
                username,
                first_name,
                added_by,
                added_at: now_stamp(),
            });
        }
        self.save()
    }

    /// Remove an admin. Returns false if the id was not in the store.
    pub fn remove(&self, user_id: i64) -> Result<bool> {
        let removed = {
            let mut entries = self.guard();
            let before = entries.len();
            entries.retain(|e| e.user_id != user_id);
            entries.len() != before
        };
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// All admins in insertion order.
    pub fn list(&self) -> Vec<AdminEntry> {
        self.guard().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let entries = self.guard();
        let json = serde_json::to_string_pretty(&*entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AdminEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
