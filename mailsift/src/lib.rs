//! Bulk email list validation
//!
//! [`config`] loads the settings; [`controller`] wires the verification
//! pipeline to the command-line and HTTP front-ends.

pub mod config;
pub mod controller;
