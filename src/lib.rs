// lib.rs - csv2vcf library root

//! # csv2vcf - CSV event-registration exports to vCard contacts
//!
//! Converts CSV files exported from event-registration forms into vCard
//! (VCF) contact records, merging each run into a persistent master contact
//! list and tracking per-contact attendance across events.
//!
//! The interesting parts are identity resolution (matching incoming rows to
//! existing contacts by email, phone, or fuzzy name) and note merging
//! (combining per-event answers into structured, deduplicated sections).
//! Everything else is batch-tool plumbing: config loading, CSV reading,
//! vCard serialization and the on-disk history store.
//!
//! ## Basic usage
//!
//! ```rust,no_run
//! use csv2vcf::prelude::*;
//!
//! let config = Config::from_file("question_config.toml")?;
//! let event = identify_event("Wine Yard Jan 19 2025.csv", &config)?;
//! let mut store = HistoryStore::load(std::path::Path::new(&config.directories.snapshots))?;
//!
//! for row in read_rows(std::path::Path::new("Wine Yard Jan 19 2025.csv"))? {
//!     let incoming = IncomingRow::from_csv(&row, &config, config.event("WY").unwrap());
//!     match resolve(&incoming.identity, &store.contacts, &config.matching) {
//!         Resolution::Existing(key) => {
//!             merge_row(store.contacts.get_mut(&key).unwrap(), &incoming, &event)
//!         }
//!         _ => { /* create a new contact */ }
//!     }
//! }
//! # Ok::<(), csv2vcf::error::ConvertError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod output;
pub mod store;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::config::{Config, Matching};
    pub use crate::core::{merge_row, resolve, IncomingRow, Resolution, RowIdentity};
    pub use crate::data::{identify_event, read_rows, Attendance, Contact, EventOccurrence};
    pub use crate::error::ConvertError;
    pub use crate::output::{format_vcard, parse_vcards, write_vcf};
    pub use crate::store::HistoryStore;
}

// Re-export main types at the root level for convenience
pub use config::Config;
pub use data::{Contact, EventOccurrence};
pub use error::ConvertError;
pub use store::HistoryStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
