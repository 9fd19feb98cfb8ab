//! Data models for the ServiceNow Table API.
//!
//! This module contains the record shapes returned by the tables the tool
//! layer touches (incidents, change requests, users) plus the shared
//! encoded-query builder and field representation.

mod change;
mod common;
mod incident;
mod user;

pub use change::*;
pub use common::*;
pub use incident::*;
pub use user::*;
