// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// csv2vcf - Convert event-registration CSV exports to vCard contacts
pub struct Args {
    /// input CSV file exported from the registration platform
    #[argh(positional)]
    pub input: Option<String>,

    /// path to TOML configuration file (default: question_config.toml)
    #[argh(option, default = "String::from(\"question_config.toml\")")]
    pub config: String,

    /// enable verbose diagnostic logging (no behavior change)
    #[argh(switch)]
    pub verbose: bool,

    /// validate config, filename and history without writing anything
    #[argh(switch)]
    pub dry_run: bool,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
