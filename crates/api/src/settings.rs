//! API server location and credentials.

use std::fmt;

use serde::Deserialize;

use crate::error::ApiError;

/// Environment variable holding the API server protocol.
pub const ENV_API_PROTOCOL: &str = "DX_APISERVER_PROTOCOL";
/// Environment variable holding the API server host.
pub const ENV_API_HOST: &str = "DX_APISERVER_HOST";
/// Environment variable holding the API server port.
pub const ENV_API_PORT: &str = "DX_APISERVER_PORT";
/// Environment variable holding the JSON security context.
pub const ENV_SECURITY_CONTEXT: &str = "DX_SECURITY_CONTEXT";
/// Environment variable holding a bare bearer token.
pub const ENV_AUTH_TOKEN: &str = "DX_AUTH_TOKEN";

/// Default API server protocol.
pub const DEFAULT_API_PROTOCOL: &str = "https";
/// Default API server host.
pub const DEFAULT_API_HOST: &str = "api.dnanexus.com";
/// Default API server port.
pub const DEFAULT_API_PORT: u16 = 443;

/// Security context as stored in `DX_SECURITY_CONTEXT`.
#[derive(Debug, Deserialize)]
struct SecurityContext {
    #[serde(default = "default_token_type")]
    auth_token_type: String,
    auth_token: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Connection settings for the platform API.
#[derive(Clone)]
pub struct ApiSettings {
    /// `http` or `https`.
    pub protocol: String,
    /// API server host name.
    pub host: String,
    /// API server port.
    pub port: u16,
    /// Authorization scheme, usually `Bearer`.
    pub auth_token_type: String,
    /// Secret token. Never logged.
    pub auth_token: String,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_API_PROTOCOL.into(),
            host: DEFAULT_API_HOST.into(),
            port: DEFAULT_API_PORT,
            auth_token_type: default_token_type(),
            auth_token: String::new(),
            user_agent: concat!("dxfs/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_token_type", &self.auth_token_type)
            .field("auth_token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ApiSettings {
    /// Build settings from the process environment.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidConfig` if no token is configured or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, or `None` if unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings: ApiSettings = ApiSettings::default();

        if let Some(protocol) = lookup(ENV_API_PROTOCOL) {
            settings.protocol = protocol;
        }
        if let Some(host) = lookup(ENV_API_HOST) {
            settings.host = host;
        }
        if let Some(port) = lookup(ENV_API_PORT) {
            settings.port = port.trim().parse().map_err(|_| ApiError::InvalidConfig {
                message: format!("{} is not a valid port: {}", ENV_API_PORT, port),
            })?;
        }

        if let Some(raw) = lookup(ENV_SECURITY_CONTEXT) {
            let ctx: SecurityContext =
                serde_json::from_str(&raw).map_err(|e| ApiError::InvalidConfig {
                    message: format!("{} is not valid JSON: {}", ENV_SECURITY_CONTEXT, e),
                })?;
            settings.auth_token_type = ctx.auth_token_type;
            settings.auth_token = ctx.auth_token;
        } else if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            settings.auth_token = token;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Replace the token.
    ///
    /// # Arguments
    /// * `token` - Bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Replace the server location.
    ///
    /// # Arguments
    /// * `protocol` - `http` or `https`
    /// * `host` - Host name
    /// * `port` - Port
    pub fn with_server(
        mut self,
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        self.protocol = protocol.into();
        self.host = host.into();
        self.port = port;
        self
    }

    /// Check that the settings can be used to make calls.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ApiError::InvalidConfig {
                message: format!("unsupported protocol: {}", self.protocol),
            });
        }
        if self.host.is_empty() {
            return Err(ApiError::InvalidConfig {
                message: "API server host is empty".into(),
            });
        }
        if self.auth_token.is_empty() {
            return Err(ApiError::InvalidConfig {
                message: format!(
                    "no API token: set {} or {}",
                    ENV_SECURITY_CONTEXT, ENV_AUTH_TOKEN
                ),
            });
        }
        Ok(())
    }

    /// Absolute URL of an API route.
    ///
    /// # Arguments
    /// * `route` - Route such as `file-xxxx/download`
    ///
    /// # Returns
    /// `<protocol>://<host>:<port>/<route>`
    pub fn api_url(&self, route: &str) -> String {
        format!(
            "{}://{}:{}/{}",
            self.protocol,
            self.host,
            self.port,
            route.trim_start_matches('/')
        )
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.auth_token_type, self.auth_token)
    }
}
