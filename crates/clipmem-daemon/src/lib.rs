//! clipmem daemon support
//!
//! Shared by the `clipmemd` daemon and the `clipmem` CLI:
//! - `source`: a clipboard source that shells out to a platform command
//! - `logging`: tracing subscriber setup
//! - `settings`: settings resolution from flags, file and environment

pub mod logging;
pub mod settings;
pub mod source;
