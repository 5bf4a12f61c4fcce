// resolve.rs - Identity resolution: map an incoming row to a contact

use crate::config::Matching;
use crate::core::normalize::{normalize_email, normalize_name, normalize_phone};
use crate::data::contact::Contact;
use std::collections::BTreeMap;
use strsim::jaro_winkler;

/// Identity fields extracted from one CSV row, as written.
#[derive(Debug, Clone, Default)]
pub struct RowIdentity {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Outcome of resolving a row against the current contact set.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Merge into the contact stored under this key.
    Existing(String),
    /// No plausible match; create a new contact.
    New,
    /// Two candidates scored within the ambiguity window. The caller logs
    /// this and creates a new contact rather than risking a wrong merge.
    Ambiguous {
        best: String,
        runner_up: String,
        score: f64,
    },
}

/// Resolve a row to an existing contact or signal "new contact".
///
/// Pure function of (identity, contact set, matching parameters). Match
/// priority: exact normalized email, exact normalized phone, fuzzy name.
/// Contacts are scanned in key order, so the outcome is deterministic for
/// identical inputs.
pub fn resolve(
    identity: &RowIdentity,
    contacts: &BTreeMap<String, Contact>,
    matching: &Matching,
) -> Resolution {
    let email = normalize_email(&identity.email);
    if !email.is_empty() {
        for (key, contact) in contacts {
            if normalize_email(&contact.email) == email {
                return Resolution::Existing(key.clone());
            }
        }
    }

    let phone = normalize_phone(&identity.phone);
    if !phone.is_empty() {
        for (key, contact) in contacts {
            if normalize_phone(&contact.phone) == phone {
                return Resolution::Existing(key.clone());
            }
        }
    }

    let name = normalize_name(&identity.name);
    if name.is_empty() {
        return Resolution::New;
    }

    let mut best: Option<(&String, f64)> = None;
    let mut runner_up: Option<(&String, f64)> = None;
    for (key, contact) in contacts {
        let candidate = normalize_name(&contact.name);
        if candidate.is_empty() {
            continue;
        }
        let score = jaro_winkler(&name, &candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {
                if runner_up.map_or(true, |(_, s)| score > s) {
                    runner_up = Some((key, score));
                }
            }
            _ => {
                runner_up = best;
                best = Some((key, score));
            }
        }
    }

    match best {
        Some((key, score)) if score >= matching.name_threshold => {
            if let Some((other, other_score)) = runner_up {
                if other_score >= matching.name_threshold
                    && (score - other_score) <= matching.ambiguity_epsilon
                {
                    return Resolution::Ambiguous {
                        best: key.clone(),
                        runner_up: other.clone(),
                        score,
                    };
                }
            }
            Resolution::Existing(key.clone())
        }
        _ => Resolution::New,
    }
}
