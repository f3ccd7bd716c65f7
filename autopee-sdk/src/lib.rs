//! Shared request/response types for the Autopee wallet API.
//!
//! Both the server and any HTTP client depend on this crate, so nothing in
//! here touches the database.

pub mod auth;
pub mod objects;
