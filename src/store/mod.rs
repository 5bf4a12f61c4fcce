// mod.rs - Persistent contact history: master VCF, snapshots, JSON history

use crate::data::contact::Contact;
use crate::data::event::EventOccurrence;
use crate::error::ConvertError;
use crate::output::vcard::{format_vcard, parse_vcards, write_vcf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MASTER_FILE: &str = "master_contacts.vcf";
pub const HISTORY_FILE: &str = "processing_history.json";

/// Processing-history artifact: which source files have already been merged.
/// Supports idempotent re-runs and prevents double-merging the same export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingHistory {
    pub version: String,
    pub created: String,
    pub last_update: Option<String>,
    #[serde(default)]
    pub processed_files: Vec<String>,
    #[serde(default)]
    pub processed_snapshots: Vec<String>,
}

impl Default for ProcessingHistory {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            last_update: None,
            processed_files: Vec::new(),
            processed_snapshots: Vec::new(),
        }
    }
}

/// A non-approved row, reported separately instead of merged.
#[derive(Debug, Clone)]
pub struct DeclinedContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
}

/// The master contact database plus processing history for one run.
///
/// Loaded at process start, mutated in memory while rows merge, written back
/// only after the whole batch succeeded. Single-writer by assumption;
/// concurrent runs against the same directory are undefined behavior.
#[derive(Debug)]
pub struct HistoryStore {
    dir: PathBuf,
    pub contacts: BTreeMap<String, Contact>,
    pub history: ProcessingHistory,
}

impl HistoryStore {
    /// Load persisted state from the snapshot directory.
    ///
    /// Missing files mean a first run and yield an empty store; files that
    /// exist but cannot be parsed fail fast so prior history is never
    /// silently discarded.
    pub fn load(dir: &Path) -> Result<Self, ConvertError> {
        let master_path = dir.join(MASTER_FILE);
        let mut contacts = BTreeMap::new();
        if master_path.exists() {
            let text =
                fs::read_to_string(&master_path).map_err(|e| ConvertError::HistoryLoad {
                    path: master_path.display().to_string(),
                    reason: e.to_string(),
                })?;
            for contact in parse_vcards(&text).map_err(|e| ConvertError::HistoryLoad {
                path: master_path.display().to_string(),
                reason: e,
            })? {
                contacts.insert(contact.key(), contact);
            }
            log::debug!(
                "loaded {} contacts from {}",
                contacts.len(),
                master_path.display()
            );
        }

        let history_path = dir.join(HISTORY_FILE);
        let history = if history_path.exists() {
            let text =
                fs::read_to_string(&history_path).map_err(|e| ConvertError::HistoryLoad {
                    path: history_path.display().to_string(),
                    reason: e.to_string(),
                })?;
            serde_json::from_str(&text).map_err(|e| ConvertError::HistoryLoad {
                path: history_path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            ProcessingHistory::default()
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            contacts,
            history,
        })
    }

    /// True if this source file was already merged in a previous run.
    pub fn is_processed(&self, filename: &str) -> bool {
        self.history
            .processed_files
            .iter()
            .any(|f| f.as_str() == filename)
    }

    /// Snapshot filename for an event occurrence, e.g.
    /// `2025-01-19_WY_snapshot.vcf`.
    pub fn snapshot_path(&self, event: &EventOccurrence) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_snapshot.vcf",
            event.date.format("%Y-%m-%d"),
            event.code
        ))
    }

    /// Persist the outcome of a successful run: the per-event snapshot, the
    /// declined report, the cumulative master VCF and the updated history.
    ///
    /// Master and history use write-temp-then-rename so an interrupted run
    /// leaves the previous state intact. This is the last action of a run.
    pub fn save_run(
        &mut self,
        event: &EventOccurrence,
        touched: &[String],
        declined: &[DeclinedContact],
    ) -> Result<(), ConvertError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ConvertError::io(
                format!("failed to create directory '{}'", self.dir.display()),
                e,
            )
        })?;

        let snapshot_path = self.snapshot_path(event);
        let snapshot_contacts: Vec<&Contact> = touched
            .iter()
            .filter_map(|key| self.contacts.get(key))
            .collect();
        write_vcf(&snapshot_path, snapshot_contacts)?;
        println!(
            "📸 Snapshot written: {} ({} contacts)",
            snapshot_path.display(),
            touched.len()
        );

        if !declined.is_empty() {
            let declined_path = self.dir.join(format!(
                "{}{}_declined.txt",
                event.date.format("%m-%d-%Y"),
                event.code
            ));
            let mut report = String::new();
            for d in declined {
                let name = if d.name.is_empty() { "No Name" } else { &d.name };
                let email = if d.email.is_empty() { "No Email" } else { &d.email };
                let phone = if d.phone.is_empty() { "No Phone" } else { &d.phone };
                report.push_str(&format!(
                    "{}, {}, {}, {}\n",
                    name,
                    email,
                    phone,
                    d.status.to_uppercase()
                ));
            }
            fs::write(&declined_path, report).map_err(|e| {
                ConvertError::io(
                    format!("failed to write '{}'", declined_path.display()),
                    e,
                )
            })?;
            println!(
                "📋 Declined/pending report written: {} ({} rows)",
                declined_path.display(),
                declined.len()
            );
        }

        let mut master = String::new();
        for contact in self.contacts.values() {
            master.push_str(&format_vcard(contact));
            master.push_str("\n\n");
        }
        let master_path = self.dir.join(MASTER_FILE);
        atomic_write(&master_path, &master)?;
        println!(
            "💾 Master file updated: {} ({} contacts)",
            master_path.display(),
            self.contacts.len()
        );

        let source = event.source_file.clone();
        if !self.history.processed_files.contains(&source) {
            self.history.processed_files.push(source);
        }
        let snapshot_name = snapshot_path.display().to_string();
        if !self.history.processed_snapshots.contains(&snapshot_name) {
            self.history.processed_snapshots.push(snapshot_name);
        }
        self.history.last_update = Some(chrono::Utc::now().to_rfc3339());

        let history_json = serde_json::to_string_pretty(&self.history)
            .map_err(|e| ConvertError::HistoryLoad {
                path: HISTORY_FILE.to_string(),
                reason: format!("failed to serialize history: {}", e),
            })?;
        atomic_write(&self.dir.join(HISTORY_FILE), &history_json)?;

        Ok(())
    }
}

/// Write a file atomically: temp file in the same directory, then rename.
fn atomic_write(path: &Path, content: &str) -> Result<(), ConvertError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)
        .map_err(|e| ConvertError::io(format!("failed to write '{}'", tmp.display()), e))?;
    fs::rename(&tmp, path).map_err(|e| {
        ConvertError::io(
            format!("failed to replace '{}' atomically", path.display()),
            e,
        )
    })?;
    Ok(())
}
