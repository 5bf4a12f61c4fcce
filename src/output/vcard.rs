// vcard.rs - vCard 3.0 writer and parser

use crate::data::contact::{Attendance, Contact};
use crate::error::ConvertError;
use chrono::NaiveDate;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Escape a property value per vCard rules.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of `escape_value`.
fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a compound property value on unescaped semicolons. Components are
/// returned still escaped.
fn split_components(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Build the structured NOTE body (unescaped, real newlines).
///
/// Layout: a reserved `== EVENTS ==` block listing attendance, then one
/// `== HEADER ==` block per non-empty section with `- ` bullets. The parser
/// reconstructs sections and attendance from exactly this layout.
fn format_note(contact: &Contact) -> String {
    let mut lines = Vec::new();

    if !contact.attendance.is_empty() {
        lines.push("== EVENTS ==".to_string());
        for a in &contact.attendance {
            lines.push(format!(
                "- {} {} ({})",
                a.event_code,
                a.date.format("%Y-%m-%d"),
                a.source_file
            ));
        }
    }

    for (header, entries) in &contact.sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(format!("== {} ==", header));
        for entry in entries {
            lines.push(format!("- {}", entry));
        }
    }

    lines.join("\n")
}

/// Parse a NOTE body back into (sections, attendance).
fn parse_note(note: &str, contact: &mut Contact) -> Result<(), String> {
    let mut current: Option<String> = None;
    for line in note.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line
            .strip_prefix("== ")
            .and_then(|rest| rest.strip_suffix(" =="))
        {
            current = Some(header.to_string());
            continue;
        }
        let entry = match line.strip_prefix("- ") {
            Some(e) => e,
            None => return Err(format!("unrecognized note line '{}'", line)),
        };
        match current.as_deref() {
            Some("EVENTS") => {
                contact.attendance.push(parse_attendance(entry)?);
            }
            Some(section) => {
                contact
                    .sections
                    .entry(section.to_string())
                    .or_default()
                    .push(entry.to_string());
            }
            None => return Err(format!("note entry '{}' outside any section", entry)),
        }
    }
    Ok(())
}

/// Parse one attendance bullet: `CODE YYYY-MM-DD (source file)`.
///
/// Parsed left to right: code, date, then the parenthesized remainder. The
/// source filename may itself contain parentheses.
fn parse_attendance(entry: &str) -> Result<Attendance, String> {
    let malformed = || format!("malformed attendance entry '{}'", entry);
    let (code, rest) = entry.split_once(' ').ok_or_else(malformed)?;
    let (date_str, rest) = rest.split_once(' ').ok_or_else(malformed)?;
    let source_file = rest
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(malformed)?
        .to_string();
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| format!("bad attendance date in '{}': {}", entry, e))?;
    Ok(Attendance {
        event_code: code.to_string(),
        date,
        source_file,
    })
}

/// Serialize one contact as a vCard 3.0 entry (no trailing blank line).
pub fn format_vcard(contact: &Contact) -> String {
    let mut lines = Vec::new();
    lines.push("BEGIN:VCARD".to_string());
    lines.push("VERSION:3.0".to_string());
    lines.push(format!(
        "N:{};{};;;",
        escape_value(contact.last_name()),
        escape_value(contact.first_name())
    ));
    lines.push(format!("FN:{}", escape_value(&contact.name)));
    if !contact.email.is_empty() {
        lines.push(format!("EMAIL:{}", escape_value(&contact.email)));
    }
    if !contact.phone.is_empty() {
        lines.push(format!("TEL:{}", escape_value(&contact.phone)));
    }
    if !contact.linkedin.is_empty() {
        lines.push(format!("URL;TYPE=WORK:{}", escape_value(&contact.linkedin)));
    }
    let note = format_note(contact);
    if !note.is_empty() {
        lines.push(format!("NOTE:{}", escape_value(&note)));
    }
    for extra in &contact.extras {
        lines.push(extra.clone());
    }
    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

/// Parse vCard text into contacts.
///
/// Folded continuation lines (leading space or tab) are unfolded first, so
/// externally-edited files survive. Properties this tool does not manage are
/// kept verbatim in `extras` and re-emitted unchanged by `format_vcard`.
pub fn parse_vcards(text: &str) -> Result<Vec<Contact>, String> {
    let mut unfolded: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(cont) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            match unfolded.last_mut() {
                Some(prev) => prev.push_str(cont),
                None => return Err("continuation line at start of file".to_string()),
            }
        } else {
            unfolded.push(line.to_string());
        }
    }

    let mut contacts = Vec::new();
    let mut current: Option<Contact> = None;
    let mut pending_n: Option<String> = None;

    for (idx, line) in unfolded.iter().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("BEGIN:VCARD") {
            if current.is_some() {
                return Err(format!("line {}: nested BEGIN:VCARD", idx + 1));
            }
            current = Some(Contact::default());
            pending_n = None;
            continue;
        }
        if line.eq_ignore_ascii_case("END:VCARD") {
            let mut contact = current
                .take()
                .ok_or_else(|| format!("line {}: END:VCARD without BEGIN", idx + 1))?;
            // FN wins; fall back to reassembling from N for foreign cards.
            if contact.name.is_empty() {
                if let Some(n) = pending_n.take() {
                    let parts = split_components(&n);
                    let last = parts.first().map(|s| unescape_value(s)).unwrap_or_default();
                    let first = parts.get(1).map(|s| unescape_value(s)).unwrap_or_default();
                    contact.name = format!("{} {}", first, last).trim().to_string();
                }
            }
            contacts.push(contact);
            continue;
        }

        let contact = match current.as_mut() {
            Some(c) => c,
            None => continue, // preamble outside any card
        };
        let (prop, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => return Err(format!("line {}: missing ':' in '{}'", idx + 1, line)),
        };
        let name = prop.split(';').next().unwrap_or("").to_uppercase();

        match name.as_str() {
            "VERSION" => {}
            "N" => pending_n = Some(value.to_string()),
            "FN" => contact.name = unescape_value(value),
            "EMAIL" => contact.email = unescape_value(value),
            "TEL" => contact.phone = unescape_value(value),
            "URL" => contact.linkedin = unescape_value(value),
            "NOTE" => {
                let note = unescape_value(value);
                parse_note(&note, contact)
                    .map_err(|e| format!("line {}: {}", idx + 1, e))?;
            }
            _ => contact.extras.push(line.to_string()),
        }
    }

    if current.is_some() {
        return Err("unterminated vCard (missing END:VCARD)".to_string());
    }
    Ok(contacts)
}

/// Write a sequence of contacts to a VCF file, creating parent directories.
pub fn write_vcf<'a, I>(path: &Path, contacts: I) -> Result<(), ConvertError>
where
    I: IntoIterator<Item = &'a Contact>,
{
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(|e| {
            ConvertError::io(
                format!("failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }
    let file = File::create(path).map_err(|e| {
        ConvertError::io(format!("failed to create '{}'", path.display()), e)
    })?;
    let mut writer = BufWriter::new(file);
    for contact in contacts {
        writeln!(writer, "{}\n", format_vcard(contact))
            .map_err(|e| ConvertError::io(format!("failed to write '{}'", path.display()), e))?;
    }
    writer
        .flush()
        .map_err(|e| ConvertError::io(format!("failed to write '{}'", path.display()), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_contact() -> Contact {
        let mut sections = BTreeMap::new();
        sections.insert(
            "GOALS".to_string(),
            vec!["Raise a seed round".to_string(), "Hire, carefully".to_string()],
        );
        sections.insert(
            "PROFESSIONAL".to_string(),
            vec!["ROLE: Founder".to_string()],
        );
        Contact {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: "555-1234".to_string(),
            linkedin: "https://linkedin.com/in/janedoe".to_string(),
            sections,
            attendance: vec![Attendance {
                event_code: "WY".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 19).unwrap(),
                source_file: "Wine Yard Jan 19 2025.csv".to_string(),
            }],
            extras: Vec::new(),
        }
    }

    #[test]
    fn test_round_trip() {
        let contact = sample_contact();
        let text = format_vcard(&contact);
        let parsed = parse_vcards(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], contact);
    }

    #[test]
    fn test_round_trip_minimal_contact() {
        let contact = Contact {
            name: "Cher".to_string(),
            email: "cher@x.com".to_string(),
            ..Default::default()
        };
        let parsed = parse_vcards(&format_vcard(&contact)).unwrap();
        assert_eq!(parsed[0], contact);
    }

    #[test]
    fn test_escaping_commas_and_newlines() {
        let contact = sample_contact();
        let text = format_vcard(&contact);
        // The comma inside an answer must be escaped in the serialized form
        assert!(text.contains("Hire\\, carefully"));
        assert!(text.contains("\\n"));
        let parsed = parse_vcards(&text).unwrap();
        assert_eq!(parsed[0].sections["GOALS"][1], "Hire, carefully");
    }

    #[test]
    fn test_unrecognized_properties_pass_through() {
        let text = "BEGIN:VCARD\nVERSION:3.0\nFN:Jane Doe\nEMAIL:jane@x.com\nX-MANAGED-ELSEWHERE:keep me\nBDAY:1990-04-01\nEND:VCARD\n";
        let parsed = parse_vcards(text).unwrap();
        assert_eq!(
            parsed[0].extras,
            vec!["X-MANAGED-ELSEWHERE:keep me".to_string(), "BDAY:1990-04-01".to_string()]
        );
        let reserialized = format_vcard(&parsed[0]);
        assert!(reserialized.contains("X-MANAGED-ELSEWHERE:keep me"));
        assert!(reserialized.contains("BDAY:1990-04-01"));
        // And the extras survive another parse unchanged
        let again = parse_vcards(&reserialized).unwrap();
        assert_eq!(again[0], parsed[0]);
    }

    #[test]
    fn test_unfolds_continuation_lines() {
        let text = "BEGIN:VCARD\nVERSION:3.0\nFN:Jane\n  Doe\nEMAIL:jane@x.com\nEND:VCARD\n";
        let parsed = parse_vcards(text).unwrap();
        assert_eq!(parsed[0].name, "Jane Doe");
    }

    #[test]
    fn test_round_trip_with_parenthesized_source_file() {
        let mut contact = sample_contact();
        contact.attendance[0].source_file = "Wine Yard (VIP) Jan 19 2025.csv".to_string();
        let parsed = parse_vcards(&format_vcard(&contact)).unwrap();
        assert_eq!(parsed[0], contact);
        assert_eq!(
            parsed[0].attendance[0].source_file,
            "Wine Yard (VIP) Jan 19 2025.csv"
        );
    }

    #[test]
    fn test_n_fallback_unescapes_components() {
        let text =
            "BEGIN:VCARD\nVERSION:3.0\nN:Doe\\, Jr;Jane;;;\nEMAIL:jane@x.com\nEND:VCARD\n";
        let parsed = parse_vcards(text).unwrap();
        assert_eq!(parsed[0].name, "Jane Doe, Jr");
    }

    #[test]
    fn test_name_falls_back_to_n_property() {
        let text = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane;;;\nEMAIL:jane@x.com\nEND:VCARD\n";
        let parsed = parse_vcards(text).unwrap();
        assert_eq!(parsed[0].name, "Jane Doe");
    }

    #[test]
    fn test_unterminated_card_is_error() {
        let text = "BEGIN:VCARD\nVERSION:3.0\nFN:Jane Doe\n";
        assert!(parse_vcards(text).is_err());
    }

    #[test]
    fn test_garbled_note_is_error() {
        let text = "BEGIN:VCARD\nVERSION:3.0\nFN:Jane\nNOTE:free-form text\nEND:VCARD\n";
        assert!(parse_vcards(text).is_err());
    }

    #[test]
    fn test_multiple_cards() {
        let a = sample_contact();
        let mut b = sample_contact();
        b.email = "other@x.com".to_string();
        let text = format!("{}\n\n{}\n", format_vcard(&a), format_vcard(&b));
        let parsed = parse_vcards(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].email, "other@x.com");
    }
}
