//! Platform API abstraction for dxfs.
//!
//! This crate describes the two remote collaborators the filesystem talks to,
//! without committing to an HTTP stack:
//!
//! - **Platform API** - authenticated JSON calls (`<objectId>/download`) that
//!   issue time-limited access locators
//! - **Object HTTP endpoint** - plain GETs against a locator URL, restricted to
//!   a byte range
//!
//! The `ApiClient` trait covers both. `dxfs-api-http` provides the `reqwest`
//! backend; tests provide in-memory ones.
//!
//! # Configuration
//!
//! `ApiSettings` locates the API server and carries the bearer token. It is
//! normally built from the `DX_*` environment variables.

mod error;
mod settings;
mod traits;
mod types;

pub use error::ApiError;
pub use settings::{
    ApiSettings, DEFAULT_API_HOST, DEFAULT_API_PORT, DEFAULT_API_PROTOCOL, ENV_API_HOST,
    ENV_API_PORT, ENV_API_PROTOCOL, ENV_AUTH_TOKEN, ENV_SECURITY_CONTEXT,
};
pub use traits::ApiClient;
pub use types::{download_route, DownloadUrl, LocatorRequest, RANGE_HEADER};
