//! IASC Assistant core: a bilingual (English/Arabic) university FAQ assistant.
//!
//! Each question goes through hand-written rules first, then Jaccard retrieval
//! over the dataset's example phrases, and lands on the fallback intent when
//! neither matches. The same session can instead forward questions to a remote
//! chat API.

pub mod attachment;
pub mod backend;
pub mod brain;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fs_manager;
pub mod preflight;
pub mod session;
pub mod telemetry;
pub mod transcript;

#[cfg(test)]
mod tests;

pub use error::{AppError, Result};
