// mod.rs - Core merge/dedup logic

pub mod merge;
pub mod normalize;
pub mod resolve;

pub use merge::{merge_row, missing_required_fields, IncomingRow};
pub use resolve::{resolve, Resolution, RowIdentity};
