//! Subcommand implementations.

pub mod extract;
pub mod validate;

/// At least one package is not conformant.
pub const EXIT_NON_CONFORMANT: u8 = 1;

/// The command itself could not run.
pub const EXIT_FAILURE: u8 = 2;
