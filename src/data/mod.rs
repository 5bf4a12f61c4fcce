// mod.rs - Data model: contacts, events, CSV rows

pub mod contact;
pub mod event;
pub mod rows;

pub use contact::{contact_key, Attendance, Contact};
pub use event::{identify_event, EventDef, EventOccurrence};
pub use rows::{read_rows, CsvRow};
