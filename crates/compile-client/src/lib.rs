//! Client for the compile service.
//!
//! Sends a generated POJO together with its runtime JAR as a multipart
//! request and writes the returned `.jar` or `.war` next to the POJO.

pub mod client;
pub mod error;
mod package;

pub use client::CompileClient;
pub use error::CompileError;
pub use package::output_file_name;
