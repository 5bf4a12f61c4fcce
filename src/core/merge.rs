// merge.rs - Answer extraction and note merging

use crate::config::Config;
use crate::core::normalize::{collapse_whitespace, normalize_answer};
use crate::core::resolve::RowIdentity;
use crate::data::contact::{Attendance, Contact};
use crate::data::event::{EventDef, EventOccurrence};
use crate::data::rows::CsvRow;

/// Everything extracted from one CSV row before merging: identity fields,
/// LinkedIn URL, and the ordered (section, answer) pairs.
#[derive(Debug, Clone, Default)]
pub struct IncomingRow {
    pub identity: RowIdentity,
    pub linkedin: String,
    pub answers: Vec<(String, String)>,
}

impl IncomingRow {
    /// Extract identity fields and section answers from a raw row.
    ///
    /// Sections are walked in config order, questions in config order, so
    /// answers append left-to-right as declared. The event's
    /// `default_questions` list, when non-empty, restricts which question
    /// columns are read. Comma-separated answers are split into individual
    /// entries.
    pub fn from_csv(row: &CsvRow, config: &Config, event_def: &EventDef) -> Self {
        let identity = RowIdentity {
            name: row.get(&config.fields.name).to_string(),
            email: row.get(&config.fields.email).to_string(),
            phone: row.get(&config.fields.phone).to_string(),
        };

        let raw_linkedin = row.get(&config.fields.linkedin);
        let linkedin = if is_linkedin_url(raw_linkedin) {
            raw_linkedin.to_string()
        } else {
            if !raw_linkedin.is_empty() {
                log::debug!(
                    "row {}: discarding non-LinkedIn URL '{}'",
                    row.line,
                    raw_linkedin
                );
            }
            String::new()
        };

        let mut answers = Vec::new();
        for section in &config.sections {
            for question in &section.questions {
                if question == &config.fields.linkedin {
                    continue;
                }
                if !event_def.default_questions.is_empty()
                    && !event_def.default_questions.contains(question)
                {
                    continue;
                }
                let value = row.get(question);
                if value.is_empty() {
                    continue;
                }
                for part in value.split(',') {
                    let part = collapse_whitespace(part);
                    if !part.is_empty() {
                        answers.push((section.header.clone(), part));
                    }
                }
            }
        }

        Self {
            identity,
            linkedin,
            answers,
        }
    }
}

/// Names of the configured required fields a row leaves blank. A non-empty
/// result means the row is malformed: the caller logs it, counts it in the
/// run summary and moves on to the next row.
pub fn missing_required_fields(identity: &RowIdentity, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|field| match field.as_str() {
            "name" => identity.name.trim().is_empty(),
            "email" => identity.email.trim().is_empty(),
            "phone" => identity.phone.trim().is_empty(),
            _ => false,
        })
        .cloned()
        .collect()
}

/// Merge one extracted row into a contact.
///
/// Answers append only when no existing answer in the section matches after
/// normalization; original casing is stored. Attendance is recorded at most
/// once per (code, date), independent of whether any note text was added.
/// Identity fields fill in only where the contact's are empty, so merging
/// the same row twice is a no-op after the first application.
pub fn merge_row(contact: &mut Contact, incoming: &IncomingRow, event: &EventOccurrence) {
    if contact.name.trim().is_empty() {
        contact.name = collapse_whitespace(&incoming.identity.name);
    }
    if contact.email.trim().is_empty() {
        contact.email = incoming.identity.email.trim().to_string();
    }
    if contact.phone.trim().is_empty() {
        contact.phone = incoming.identity.phone.trim().to_string();
    }
    if contact.linkedin.trim().is_empty() {
        contact.linkedin = incoming.linkedin.clone();
    }

    for (section, answer) in &incoming.answers {
        let answer = collapse_whitespace(answer);
        if answer.is_empty() {
            continue;
        }
        let entries = contact.sections.entry(section.clone()).or_default();
        let normalized = normalize_answer(&answer);
        if !entries.iter().any(|e| normalize_answer(e) == normalized) {
            entries.push(answer);
        }
    }

    if !contact.has_attended(&event.code, event.date) {
        contact.attendance.push(Attendance {
            event_code: event.code.clone(),
            date: event.date,
            source_file: event.source_file.clone(),
        });
    }
}

/// A LinkedIn URL in the loose form registration answers carry.
fn is_linkedin_url(url: &str) -> bool {
    let url = url.to_lowercase();
    url.starts_with("http") && (url.contains("linkedin.com") || url.contains("linked.in"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event() -> EventOccurrence {
        EventOccurrence {
            code: "WY".to_string(),
            name: "Wine Yard".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 19).unwrap(),
            source_file: "Wine Yard Jan 19 2025.csv".to_string(),
        }
    }

    fn incoming(answers: Vec<(&str, &str)>) -> IncomingRow {
        IncomingRow {
            identity: RowIdentity {
                name: "Jane Doe".to_string(),
                email: "jane@x.com".to_string(),
                phone: "555-1234".to_string(),
            },
            linkedin: String::new(),
            answers: answers
                .into_iter()
                .map(|(s, a)| (s.to_string(), a.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut contact = Contact::default();
        let row = incoming(vec![("GOALS", "Raise a seed round")]);
        merge_row(&mut contact, &row, &event());
        let after_first = contact.clone();
        merge_row(&mut contact, &row, &event());
        assert_eq!(contact, after_first);
        assert_eq!(contact.attendance.len(), 1);
    }

    #[test]
    fn test_dedup_ignores_case_and_spacing() {
        let mut contact = Contact::default();
        merge_row(&mut contact, &incoming(vec![("GOALS", "Raise a  seed round")]), &event());
        merge_row(&mut contact, &incoming(vec![("GOALS", "raise a seed ROUND")]), &event());
        assert_eq!(contact.sections["GOALS"].len(), 1);
        // First-seen casing wins
        assert_eq!(contact.sections["GOALS"][0], "Raise a seed round");
    }

    #[test]
    fn test_blank_answers_discarded() {
        let mut contact = Contact::default();
        merge_row(&mut contact, &incoming(vec![("GOALS", "   ")]), &event());
        assert!(contact.sections.get("GOALS").map_or(true, |v| v.is_empty()));
    }

    #[test]
    fn test_existing_identity_fields_kept() {
        let mut contact = Contact {
            name: "Jane van Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: "999".to_string(),
            ..Default::default()
        };
        merge_row(&mut contact, &incoming(vec![]), &event());
        assert_eq!(contact.name, "Jane van Doe");
        assert_eq!(contact.phone, "999");
    }

    #[test]
    fn test_attendance_independent_of_notes() {
        let mut contact = Contact::default();
        merge_row(&mut contact, &incoming(vec![]), &event());
        assert_eq!(contact.attendance.len(), 1);
        assert_eq!(contact.attendance[0].display_code(), "WY-2025-01-19");
    }

    #[test]
    fn test_second_event_appends_attendance() {
        let mut contact = Contact::default();
        merge_row(&mut contact, &incoming(vec![]), &event());
        let mut later = event();
        later.code = "YS".to_string();
        later.date = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        merge_row(&mut contact, &incoming(vec![]), &later);
        assert_eq!(contact.attendance.len(), 2);
    }

    #[test]
    fn test_extract_answers_order_and_splitting() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        let mut fields = std::collections::HashMap::new();
        fields.insert("name".to_string(), "Jane Doe".to_string());
        fields.insert("email".to_string(), "jane@x.com".to_string());
        fields.insert(
            "What company do you work for?".to_string(),
            "Acme Corp".to_string(),
        );
        fields.insert(
            "What can we help you with?".to_string(),
            "Fundraising, Hiring".to_string(),
        );
        let row = CsvRow { line: 2, fields };
        let event_def = config.event("WY").unwrap();
        let extracted = IncomingRow::from_csv(&row, &config, event_def);

        assert_eq!(
            extracted.answers,
            vec![
                ("PROFESSIONAL".to_string(), "Acme Corp".to_string()),
                ("NEEDS".to_string(), "Fundraising".to_string()),
                ("NEEDS".to_string(), "Hiring".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_required_fields_reported() {
        let required = vec!["name".to_string(), "email".to_string()];
        let complete = RowIdentity {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: String::new(),
        };
        assert!(missing_required_fields(&complete, &required).is_empty());

        let no_email = RowIdentity {
            name: "John Roe".to_string(),
            email: "   ".to_string(),
            phone: String::new(),
        };
        assert_eq!(missing_required_fields(&no_email, &required), vec!["email"]);
    }

    #[test]
    fn test_malformed_rows_skipped_batch_continues() {
        let required = vec!["name".to_string()];
        let rows = vec![
            incoming(vec![("GOALS", "Raise a seed round")]),
            IncomingRow::default(), // blank identity, must be skipped
            incoming(vec![("NEEDS", "Hiring")]),
        ];

        let mut contact = Contact::default();
        let mut skipped = 0;
        for row in &rows {
            if !missing_required_fields(&row.identity, &required).is_empty() {
                skipped += 1;
                continue;
            }
            merge_row(&mut contact, row, &event());
        }

        assert_eq!(skipped, 1);
        assert_eq!(contact.sections["GOALS"], vec!["Raise a seed round"]);
        assert_eq!(contact.sections["NEEDS"], vec!["Hiring"]);
    }

    #[test]
    fn test_linkedin_validation() {
        assert!(is_linkedin_url("https://linkedin.com/in/jane"));
        assert!(is_linkedin_url("http://www.linked.in/jane"));
        assert!(!is_linkedin_url("linkedin.com/in/jane"));
        assert!(!is_linkedin_url("https://example.com"));
    }
}
