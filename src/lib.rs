//! # Frost
//!
//! Frost is an MCP (Model Context Protocol) server for the ServiceNow ITSM
//! platform.
//!
//! It exposes ServiceNow Table API operations as MCP tools so an assistant
//! can work with incidents, change requests and users through natural
//! language.
//!
//! ## Features
//!
//! - **Three auth modes**: Basic, OAuth (password grant, token cached in
//!   memory and re-fetched before it expires) and API key
//! - **Forgiving argument handling**: parameters wrapped in a `params`
//!   envelope or credential/config arguments passed in swapped order are
//!   accepted
//! - **Uniform responses**: every tool answers `{success, message, data}`
//! - **Security**: credentials are never logged or exposed in error messages
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`auth`] - Header production for the three auth modes
//! - [`resolve`] - Parameter and role resolution for tool calls
//! - [`client`] - HTTP client for the ServiceNow Table API
//! - [`error`] - Error types with security-conscious message sanitization
//! - [`models`] - Record shapes returned by the Table API
//! - [`tools`] - Tool implementations and their parameter structs
//! - [`server`] - MCP server implementation with tool routing
//!
//! ## Configuration
//!
//! Required:
//! - `SERVICENOW_INSTANCE_URL`: Base URL of your instance
//!
//! Optional:
//! - `SERVICENOW_AUTH_TYPE`: `basic` (default), `oauth` or `api_key`
//! - `SERVICENOW_TIMEOUT`, `SERVICENOW_DEBUG`
//! - `RUST_LOG`: Log level (e.g., `frost=debug`)
//!
//! ## Example
//!
//! Calling a tool directly:
//!
//! ```ignore
//! use std::sync::Arc;
//! use frost::auth::CredentialProvider;
//! use frost::config::Config;
//! use frost::resolve::ToolArg;
//!
//! async fn example() -> Result<(), frost::error::FrostError> {
//!     let config = Config::from_env()?;
//!     let credentials = Arc::new(CredentialProvider::new(config.auth, &config.destination)?);
//!     let destination = Arc::new(config.destination);
//!
//!     let response = frost::tools::list_incidents(
//!         ToolArg::from(credentials),
//!         ToolArg::from(destination),
//!         serde_json::json!({"state": "1", "limit": 5}),
//!     )
//!     .await;
//!     println!("{}", response.message);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resolve;
pub mod server;
pub mod tools;
