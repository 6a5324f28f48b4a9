//! Input helpers: column-file ingest (`ingest`).

pub mod ingest;

pub use ingest::*;
