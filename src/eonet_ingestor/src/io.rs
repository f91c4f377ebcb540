//! On-disk persistence: CSV tables and the raw payload archive.

pub mod raw;
pub mod table;

pub use raw::{archive_path, write_raw_archive};
pub use table::{read_table, write_table};
