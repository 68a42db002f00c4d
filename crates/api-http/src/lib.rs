//! `reqwest` backend for the dxfs platform API.
//!
//! This crate provides an `ApiClient` implementation that talks to the real
//! platform over HTTPS: authenticated JSON calls to the API server and plain
//! ranged GETs against pre-signed download URLs.
//!
//! # Example
//!
//! ```ignore
//! use dxfs_api::ApiSettings;
//! use dxfs_api_http::HttpApiClient;
//!
//! let settings = ApiSettings::from_env()?;
//! let client = HttpApiClient::new(settings)?;
//! ```

mod client;
mod error;

pub use client::HttpApiClient;
pub use error::HttpError;
