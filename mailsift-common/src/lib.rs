//! Types shared by every mailsift crate.
//!
//! - [`address`]: the well-formedness gate every candidate address passes
//!   through before it may reach the verification service
//! - [`logging`]: subscriber initialisation and the span-wrapping log macros
//! - [`Signal`]: the process-wide shutdown broadcast payload

pub mod address;
pub mod error;
pub mod logging;

pub use address::{Address, parse_address_list};
pub use error::AddressError;
pub use tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}
