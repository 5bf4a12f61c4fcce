// mod.rs - Output formats

pub mod vcard;

pub use vcard::{format_vcard, parse_vcards, write_vcf};
