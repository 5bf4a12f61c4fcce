// event.rs - Event definitions and filename-based event inference

use crate::config::Config;
use crate::error::ConvertError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An event type as declared in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventDef {
    /// Short code, e.g. "WY".
    pub code: String,
    /// Display name, e.g. "Wine Yard".
    pub name: String,
    /// Lowercase substrings matched against the input filename.
    pub identifiers: Vec<String>,
    /// When non-empty, restricts extraction to these question headers.
    #[serde(default)]
    pub default_questions: Vec<String>,
}

/// A concrete occurrence of an event, resolved from an input filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOccurrence {
    pub code: String,
    pub name: String,
    pub date: NaiveDate,
    pub source_file: String,
}

impl EventOccurrence {
    /// Standardized code, e.g. `WY-2025-01-19`.
    pub fn display_code(&self) -> String {
        format!("{}-{}", self.code, self.date.format("%Y-%m-%d"))
    }
}

/// Identify the event type and date from an input filename.
///
/// Identifier matching is case-insensitive substring search; the date is
/// extracted with the configured patterns, first match wins. No match on
/// either axis is a hard failure - never a best-effort guess.
pub fn identify_event(filename: &str, config: &Config) -> Result<EventOccurrence, ConvertError> {
    let lowered = filename.to_lowercase();

    let event = config
        .events
        .iter()
        .find(|event| {
            event
                .identifiers
                .iter()
                .any(|id| lowered.contains(&id.to_lowercase()))
        })
        .ok_or_else(|| ConvertError::UnknownEvent {
            filename: filename.to_string(),
            reason: "no configured event identifier matches".to_string(),
        })?;

    let date = extract_date(filename, config).ok_or_else(|| ConvertError::UnknownEvent {
        filename: filename.to_string(),
        reason: "no configured date pattern matches".to_string(),
    })?;

    Ok(EventOccurrence {
        code: event.code.clone(),
        name: event.name.clone(),
        date,
        source_file: filename.to_string(),
    })
}

/// Extract the event date from a filename using the configured grammars.
/// Patterns are compiled once by `Config::validate`.
fn extract_date(filename: &str, config: &Config) -> Option<NaiveDate> {
    let stem = filename.rsplit_once('.').map_or(filename, |(s, _)| s);

    for dp in &config.filename.date_patterns {
        if let Some(re) = dp.compiled.as_ref() {
            if let Some(m) = re.find(stem) {
                if let Ok(date) = NaiveDate::parse_from_str(m.as_str(), &dp.format) {
                    return Some(date);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_identify_event_month_name() {
        let config = test_config();
        let event = identify_event("Wine Yard The Gathering Guests Jan 19 2025.csv", &config).unwrap();
        assert_eq!(event.code, "WY");
        assert_eq!(event.name, "Wine Yard");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 19).unwrap());
        assert_eq!(event.display_code(), "WY-2025-01-19");
    }

    #[test]
    fn test_identify_event_numeric_date() {
        let config = test_config();
        let event = identify_event("yacht social 01-31-2025.csv", &config).unwrap();
        assert_eq!(event.code, "YS");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    }

    #[test]
    fn test_unrecognized_filename_fails() {
        let config = test_config();
        let err = identify_event("randomfile.csv", &config).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownEvent { .. }));
    }

    #[test]
    fn test_identifier_without_date_fails() {
        let config = test_config();
        let err = identify_event("Wine Yard Guests.csv", &config).unwrap_err();
        match err {
            ConvertError::UnknownEvent { reason, .. } => {
                assert!(reason.contains("date pattern"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
