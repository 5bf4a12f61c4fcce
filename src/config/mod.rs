// mod.rs - TOML configuration: sections, events, matching parameters

use crate::data::event::EventDef;
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Output directory layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Directories {
    /// Directory for snapshots, the master VCF and the history artifact.
    #[serde(default = "default_snapshot_dir")]
    pub snapshots: String,
}

fn default_snapshot_dir() -> String {
    "Contact Snapshots".to_string()
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            snapshots: default_snapshot_dir(),
        }
    }
}

/// Fuzzy-matching parameters for the identity resolver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Matching {
    /// Minimum Jaro-Winkler score (0.0-1.0) for a fuzzy name match.
    #[serde(default = "default_name_threshold")]
    pub name_threshold: f64,
    /// Two candidates scoring within this window of each other are ambiguous.
    #[serde(default = "default_ambiguity_epsilon")]
    pub ambiguity_epsilon: f64,
}

fn default_name_threshold() -> f64 {
    0.85
}

fn default_ambiguity_epsilon() -> f64 {
    0.02
}

impl Default for Matching {
    fn default() -> Self {
        Self {
            name_threshold: default_name_threshold(),
            ambiguity_epsilon: default_ambiguity_epsilon(),
        }
    }
}

/// CSV column names for the identity fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Fields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    /// Optional approval-status column; when absent every row is approved.
    #[serde(default)]
    pub approval: Option<String>,
    /// Logical fields a row must carry to be processed: any of
    /// "name", "email", "phone".
    #[serde(default = "default_required")]
    pub required: Vec<String>,
}

fn default_required() -> Vec<String> {
    // Email stays optional: contacts without one are keyed by name+phone.
    vec!["name".to_string()]
}

/// One notes section: display header plus the ordered CSV column headers
/// whose answers land in it. Question text is routed by exact column match,
/// never guessed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SectionDef {
    pub header: String,
    pub questions: Vec<String>,
}

/// A declared filename date grammar: regex locating the date substring plus
/// the chrono format that parses it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatePattern {
    pub pattern: String,
    pub format: String,
    /// Compiled form of `pattern`, populated by `Config::validate`.
    #[serde(skip)]
    pub compiled: Option<regex::Regex>,
}

/// Filename parsing rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilenameRules {
    pub date_patterns: Vec<DatePattern>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub directories: Directories,
    #[serde(default)]
    pub matching: Matching,
    pub fields: Fields,
    pub sections: Vec<SectionDef>,
    pub events: Vec<EventDef>,
    pub filename: FilenameRules,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| {
            ConvertError::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate semantic constraints the TOML shape cannot express, and
    /// compile the filename date patterns for later use.
    pub fn validate(&mut self) -> Result<(), ConvertError> {
        if !(0.0..=1.0).contains(&self.matching.name_threshold) {
            return Err(ConvertError::Config(
                "matching.name_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.matching.ambiguity_epsilon < 0.0 {
            return Err(ConvertError::Config(
                "matching.ambiguity_epsilon must not be negative".to_string(),
            ));
        }

        for field in &self.fields.required {
            if !matches!(field.as_str(), "name" | "email" | "phone") {
                return Err(ConvertError::Config(format!(
                    "fields.required entry '{}' is not one of: name, email, phone",
                    field
                )));
            }
        }

        if self.sections.is_empty() {
            return Err(ConvertError::Config(
                "at least one [[sections]] entry is required".to_string(),
            ));
        }
        let mut headers = HashSet::new();
        for section in &self.sections {
            if section.header.trim().is_empty() {
                return Err(ConvertError::Config(
                    "section header must not be empty".to_string(),
                ));
            }
            if section.header.eq_ignore_ascii_case("EVENTS") {
                return Err(ConvertError::Config(
                    "section header 'EVENTS' is reserved for attendance".to_string(),
                ));
            }
            if !headers.insert(section.header.to_uppercase()) {
                return Err(ConvertError::Config(format!(
                    "duplicate section header '{}'",
                    section.header
                )));
            }
        }

        if self.events.is_empty() {
            return Err(ConvertError::Config(
                "at least one [[events]] entry is required".to_string(),
            ));
        }
        let mut codes = HashSet::new();
        for event in &self.events {
            if event.code.trim().is_empty() {
                return Err(ConvertError::Config(
                    "event code must not be empty".to_string(),
                ));
            }
            if !codes.insert(event.code.clone()) {
                return Err(ConvertError::Config(format!(
                    "duplicate event code '{}'",
                    event.code
                )));
            }
            if event.identifiers.is_empty() {
                return Err(ConvertError::Config(format!(
                    "event '{}' has no filename identifiers",
                    event.code
                )));
            }
        }

        if self.filename.date_patterns.is_empty() {
            return Err(ConvertError::Config(
                "at least one filename.date_patterns entry is required".to_string(),
            ));
        }
        for dp in &mut self.filename.date_patterns {
            let re = regex::Regex::new(&dp.pattern).map_err(|e| {
                ConvertError::Config(format!("invalid date pattern '{}': {}", dp.pattern, e))
            })?;
            let has_error = chrono::format::StrftimeItems::new(&dp.format)
                .any(|item| matches!(item, chrono::format::Item::Error));
            if has_error {
                return Err(ConvertError::Config(format!(
                    "invalid date format '{}'",
                    dp.format
                )));
            }
            dp.compiled = Some(re);
        }

        Ok(())
    }

    /// Look up an event definition by code.
    pub fn event(&self, code: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.code == code)
    }

    /// Generate a commented sample configuration file.
    pub fn generate_sample() -> String {
        r#"# question_config.toml - Configuration file for csv2vcf
# Column headers must match the CSV export exactly; mismatches are reported,
# never guessed.

[directories]
# Directory for snapshots, the master VCF and the processing history
snapshots = "Contact Snapshots"

[matching]
# Minimum Jaro-Winkler similarity (0.0-1.0) to accept a fuzzy name match
name_threshold = 0.85
# Two candidates scoring within this window of each other are treated as
# ambiguous and a new contact is created instead of guessing
ambiguity_epsilon = 0.02

[fields]
# CSV column names for the identity fields
name = "name"
email = "email"
phone = "phone_number"
linkedin = "What is your LinkedIn profile?"
# Optional approval-status column; omit to treat every row as approved
approval = "approval_status"
# A row missing any of these is skipped and counted in the summary
# (email is deliberately not required: contacts without one are keyed
# by name + phone)
required = ["name"]

# Notes sections, in output order. Answers to the listed questions are
# collected under the section header, deduplicated across events.
[[sections]]
header = "PROFESSIONAL"
questions = ["What company do you work for?", "What is your role?"]

[[sections]]
header = "GOALS"
questions = ["What are your goals for this year?"]

[[sections]]
header = "NEEDS"
questions = ["What can we help you with?"]

# Event types, detected from the input filename.
[[events]]
code = "WY"
name = "Wine Yard"
identifiers = ["wine yard", "wineyard"]
# Restrict extraction to these questions for this event type (empty = all)
default_questions = []

[[events]]
code = "YS"
name = "Yacht Social"
identifiers = ["yacht"]
default_questions = []

# Date grammars tried against the filename, in order. First match wins.
[[filename.date_patterns]]
pattern = '(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}\s+\d{4}'
format = "%b %d %Y"

[[filename.date_patterns]]
pattern = '\d{2}-\d{2}-\d{4}'
format = "%m-%d-%Y"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sections.len(), 3);
        assert_eq!(config.events.len(), 2);
        assert!((config.matching.name_threshold - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_validate_compiles_date_patterns() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert!(config.filename.date_patterns.iter().all(|dp| dp.compiled.is_none()));
        config.validate().unwrap();
        assert!(config.filename.date_patterns.iter().all(|dp| dp.compiled.is_some()));
    }

    #[test]
    fn test_duplicate_event_code_rejected() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        let dup = config.events[0].clone();
        config.events.push(dup);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate event code"));
    }

    #[test]
    fn test_duplicate_section_header_rejected() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.sections.push(SectionDef {
            header: "goals".to_string(),
            questions: Vec::new(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate section header"));
    }

    #[test]
    fn test_reserved_events_header_rejected() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.sections[0].header = "Events".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_range_checked() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.matching.name_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_date_pattern_rejected() {
        let mut config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        config.filename.date_patterns[0].pattern = "(".to_string();
        assert!(config.validate().is_err());
    }
}
