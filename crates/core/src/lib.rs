//! Print broker domain logic.
//!
//! Upload persistence, the in-process file registry, preview resolution and
//! spooler-backed printing. Nothing here knows about HTTP.

pub mod error;
pub mod filename;
pub mod media;
pub mod preview;
pub mod printing;
pub mod registry;
pub mod spooler;
pub mod types;
pub mod uploads;
