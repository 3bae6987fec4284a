//! Command-line commands of the `repo-pulse` binary.
//!
//! - **fetch**: run one fetch and render it to the terminal, a JSON file or CSV tables
//! - **init**: write a commented default configuration file

mod common;
mod fetch;
mod init;

pub use fetch::{FetchArgs, fetch};
pub use init::{InitArgs, init_config};
