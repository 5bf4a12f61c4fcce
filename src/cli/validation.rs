// validation.rs - Pre-flight input validation

use crate::cli::args::Args;
use crate::config::Config;
use crate::data::event::{identify_event, EventDef, EventOccurrence};
use crate::error::ConvertError;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ValidationResult {
    pub input: PathBuf,
    pub event: EventOccurrence,
    pub event_def: EventDef,
}

/// Validate arguments against the loaded configuration: the input file must
/// exist and its filename must resolve to a configured event type before any
/// contact state is touched.
pub fn validate_args(args: &Args, config: &Config) -> Result<ValidationResult, ConvertError> {
    let input = args
        .input
        .as_ref()
        .ok_or_else(|| ConvertError::Config("an input CSV file is required".to_string()))?;
    let input = PathBuf::from(input);

    if !input.is_file() {
        return Err(ConvertError::InputNotFound(input));
    }

    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConvertError::UnknownEvent {
            filename: input.display().to_string(),
            reason: "filename is not valid UTF-8".to_string(),
        })?;

    let event = identify_event(filename, config)?;
    let event_def = config
        .event(&event.code)
        .cloned()
        .ok_or_else(|| ConvertError::Config(format!("event '{}' vanished from config", event.code)))?;

    Ok(ValidationResult {
        input,
        event,
        event_def,
    })
}
