// contact.rs - Contact record and identity key

use crate::core::normalize::{normalize_email, normalize_name, normalize_phone};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One event-attendance record: which event, on which date, from which file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    pub event_code: String,
    pub date: NaiveDate,
    pub source_file: String,
}

impl Attendance {
    /// Display form, e.g. `WY-2025-01-19`.
    pub fn display_code(&self) -> String {
        format!("{}-{}", self.event_code, self.date.format("%Y-%m-%d"))
    }
}

/// A contact merged across one or more events.
///
/// `sections` maps section header -> ordered distinct answers; no two
/// entries in a section are equal after normalization. `attendance` holds
/// at most one entry per (event code, date). `extras` carries vCard
/// properties this tool does not manage, re-emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub sections: BTreeMap<String, Vec<String>>,
    pub attendance: Vec<Attendance>,
    pub extras: Vec<String>,
}

impl Contact {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    pub fn last_name(&self) -> &str {
        match self.name.trim().split_once(' ') {
            Some((_, rest)) => rest.trim(),
            None => "",
        }
    }

    /// Identity key: normalized email when present, otherwise normalized
    /// name + phone. Pure function of the contact's identity fields.
    pub fn key(&self) -> String {
        contact_key(&self.name, &self.email, &self.phone)
    }

    /// True if the (code, date) pair is already recorded.
    pub fn has_attended(&self, event_code: &str, date: NaiveDate) -> bool {
        self.attendance
            .iter()
            .any(|a| a.event_code == event_code && a.date == date)
    }
}

/// Derive the identity key from raw identity fields.
pub fn contact_key(name: &str, email: &str, phone: &str) -> String {
    let email = normalize_email(email);
    if !email.is_empty() {
        email
    } else {
        format!("{}|{}", normalize_name(name), normalize_phone(phone))
    }
}
