#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod deposits;
pub mod entities;
pub mod framework;
pub mod ledger;
pub mod matcher;
pub mod processor;
pub mod utils;
