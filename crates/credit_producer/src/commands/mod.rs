//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod inspect;
pub mod profiles;
pub mod run;
