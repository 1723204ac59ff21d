//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod refresh;
pub mod request;
pub mod whoami;
