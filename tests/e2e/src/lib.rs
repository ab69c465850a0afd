//! End-to-end test support for clipmem
//!
//! - `harness`: isolated pipelines over temporary databases
//! - `mocks`: realistic clipboard payloads and scripted sources

pub mod harness;
pub mod mocks;
