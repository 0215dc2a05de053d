//! Plan/result envelopes on stdout and CSV tables on disk.

pub mod config;
pub mod presenter;
pub mod table;
pub mod types;

pub use table::{TableWritten, out_dir, write_table};
