//! Archive - ZIP の組み立て

pub mod builder;
pub mod names;

pub use self::builder::ArchiveBuilder;
pub use self::names::{sanitize_entry_name, unique_entry_names};
