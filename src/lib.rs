//! RosterBot
//!
//! Host side of the enrollment assistant: configuration, the WebDriver
//! client, login, operator prompts and the command line around the
//! workspace crates that do the actual carry-over.

pub mod cli;
pub mod config;
pub mod prompt;
pub mod report;
pub mod session;
pub mod webdriver;

pub use config::Config;
