// main.rs - CLI entry point

use csv2vcf::cli::{validate_args, Args};
use csv2vcf::config::Config;
use csv2vcf::core::{merge_row, missing_required_fields, resolve, IncomingRow, Resolution};
use csv2vcf::data::{contact_key, read_rows, Contact};
use csv2vcf::error::ConvertError;
use csv2vcf::store::{DeclinedContact, HistoryStore};
use std::path::Path;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

/// Per-run counters for the final summary.
#[derive(Debug, Default)]
struct RunSummary {
    rows: usize,
    new_contacts: usize,
    merged: usize,
    ambiguous: usize,
    declined: usize,
    skipped: Vec<(usize, String)>,
}

fn run_main() -> Result<(), ConvertError> {
    let args: Args = argh::from_env();

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    println!("🚀 csv2vcf v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_file(&args.config)?;
    let validation = validate_args(&args, &config)?;
    let event = validation.event;
    println!("🎫 Event: {} ({})", event.display_code(), event.name);

    let snapshot_dir = Path::new(&config.directories.snapshots);
    let mut store = HistoryStore::load(snapshot_dir)?;
    println!(
        "📂 History loaded: {} contacts, {} files previously processed",
        store.contacts.len(),
        store.history.processed_files.len()
    );

    if store.is_processed(&event.source_file) {
        println!(
            "📌 '{}' was already processed - nothing to do",
            event.source_file
        );
        return Ok(());
    }

    let rows = read_rows(&validation.input)?;
    println!("📋 Read {} rows from {}", rows.len(), validation.input.display());

    if args.dry_run {
        println!("✅ Dry run completed successfully - no files written");
        return Ok(());
    }

    let mut summary = RunSummary::default();
    let mut touched: Vec<String> = Vec::new();
    let mut declined: Vec<DeclinedContact> = Vec::new();

    for row in &rows {
        summary.rows += 1;
        let incoming = IncomingRow::from_csv(row, &config, &validation.event_def);

        let missing = missing_required_fields(&incoming.identity, &config.fields.required);
        if !missing.is_empty() {
            let reason = format!("missing required field(s): {}", missing.join(", "));
            log::warn!("row {} skipped: {}", row.line, reason);
            summary.skipped.push((row.line, reason));
            continue;
        }

        if contact_key(
            &incoming.identity.name,
            &incoming.identity.email,
            &incoming.identity.phone,
        ) == "|"
        {
            let reason = "no usable identity fields".to_string();
            log::warn!("row {} skipped: {}", row.line, reason);
            summary.skipped.push((row.line, reason));
            continue;
        }

        if let Some(approval_col) = &config.fields.approval {
            let status = row.get(approval_col).to_lowercase();
            let status = if status.is_empty() {
                "pending".to_string()
            } else {
                status
            };
            if status != "approved" {
                log::debug!("row {}: status '{}', not merged", row.line, status);
                declined.push(DeclinedContact {
                    name: incoming.identity.name.clone(),
                    email: incoming.identity.email.clone(),
                    phone: incoming.identity.phone.clone(),
                    status,
                });
                summary.declined += 1;
                continue;
            }
        }

        let resolution = resolve(&incoming.identity, &store.contacts, &config.matching);
        let key = match resolution {
            Resolution::Existing(key) => {
                log::debug!("row {}: merging into existing contact '{}'", row.line, key);
                key
            }
            Resolution::Ambiguous {
                best,
                runner_up,
                score,
            } => {
                log::warn!(
                    "row {}: ambiguous match for '{}' (candidates '{}' and '{}', score {:.3}) - creating new contact",
                    row.line,
                    incoming.identity.name,
                    best,
                    runner_up,
                    score
                );
                summary.ambiguous += 1;
                contact_key(
                    &incoming.identity.name,
                    &incoming.identity.email,
                    &incoming.identity.phone,
                )
            }
            Resolution::New => contact_key(
                &incoming.identity.name,
                &incoming.identity.email,
                &incoming.identity.phone,
            ),
        };

        if store.contacts.contains_key(&key) {
            summary.merged += 1;
        } else {
            summary.new_contacts += 1;
        }
        let contact = store.contacts.entry(key.clone()).or_insert_with(Contact::default);
        merge_row(contact, &incoming, &event);
        if !touched.contains(&key) {
            touched.push(key);
        }
    }

    // All rows processed without fatal error - now, and only now, write.
    store.save_run(&event, &touched, &declined)?;

    println!("\n🎉 === RUN COMPLETED ===");
    println!("📋 Rows processed: {}", summary.rows);
    println!("🆕 New contacts: {}", summary.new_contacts);
    println!("🔗 Merged into existing: {}", summary.merged);
    if summary.ambiguous > 0 {
        println!(
            "⚠️  Ambiguous matches (created as new): {}",
            summary.ambiguous
        );
    }
    if summary.declined > 0 {
        println!("📋 Declined/pending rows: {}", summary.declined);
    }
    if !summary.skipped.is_empty() {
        println!("⏭️  Skipped rows: {}", summary.skipped.len());
        for (line, reason) in &summary.skipped {
            println!("   - line {}: {}", line, reason);
        }
    }
    println!("📁 Outputs in: {}", snapshot_dir.display());

    Ok(())
}
