//! dxfs: mount a catalog of remote platform objects as a read-only directory.
//!
//! The catalog is a JSON object mapping file names to object metadata:
//!
//! ```json
//! {
//!   "reads.fastq": {"id": "file-xxxx", "project": "project-yyyy",
//!                   "size": 1024, "created": 1600000000000, "modified": 1600000000000}
//! }
//! ```
//!
//! API credentials come from `DX_SECURITY_CONTEXT` / `DX_AUTH_TOKEN` and the
//! server location from `DX_APISERVER_*`, each overridable on the command
//! line.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dxfs_api::{
    ApiSettings, ENV_API_HOST, ENV_API_PORT, ENV_API_PROTOCOL, ENV_AUTH_TOKEN, ENV_SECURITY_CONTEXT,
};
use dxfs_api_http::HttpApiClient;
use dxfs_common::{DEFAULT_LOCATOR_DURATION_SECS, DEFAULT_MAX_READAHEAD};
use dxfs_vfs::{
    Catalog, FsContext, KernelCacheOptions, LocatorOptions, MountOptions, ObjectMeta,
    ReadAheadOptions, VfsOptions,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dxfs", version, about)]
struct Args {
    /// Mount point for the filesystem
    mount_point: PathBuf,

    /// Catalog file (JSON object of name -> object metadata)
    #[arg(short, long)]
    catalog: PathBuf,

    /// API server host
    #[arg(long, env = ENV_API_HOST)]
    api_host: Option<String>,

    /// API server port
    #[arg(long, env = ENV_API_PORT)]
    api_port: Option<u16>,

    /// API server protocol (http or https)
    #[arg(long, env = ENV_API_PROTOCOL)]
    api_protocol: Option<String>,

    /// API token; takes precedence over the security context
    #[arg(long)]
    token: Option<String>,

    /// Do not allow other users to access the filesystem
    #[arg(long)]
    no_allow_other: bool,

    /// Do not unmount automatically when the process exits
    #[arg(long)]
    no_auto_unmount: bool,

    /// Do not keep file contents in the kernel page cache across opens
    #[arg(long)]
    no_page_cache: bool,

    /// Largest readahead advertised to the kernel, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_READAHEAD)]
    max_readahead: u32,

    /// Validity requested for each access locator, in seconds
    #[arg(long, default_value_t = DEFAULT_LOCATOR_DURATION_SECS)]
    locator_duration: u64,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Look up an API setting, preferring command-line values.
    ///
    /// # Arguments
    /// * `key` - Environment variable name
    fn setting(&self, key: &str) -> Option<String> {
        let flag: Option<String> = match key {
            ENV_API_HOST => self.api_host.clone(),
            ENV_API_PORT => self.api_port.map(|p| p.to_string()),
            ENV_API_PROTOCOL => self.api_protocol.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }

    fn api_settings(&self) -> Result<ApiSettings> {
        let settings: ApiSettings = match &self.token {
            Some(token) => ApiSettings::from_lookup(|key| {
                if key == ENV_AUTH_TOKEN {
                    Some(token.clone())
                } else if key == ENV_SECURITY_CONTEXT {
                    None
                } else {
                    self.setting(key)
                }
            }),
            None => ApiSettings::from_lookup(|key| self.setting(key)),
        }
        .context("invalid API configuration")?;
        Ok(settings)
    }

    fn vfs_options(&self) -> VfsOptions {
        let kernel_cache: KernelCacheOptions = if self.no_page_cache {
            KernelCacheOptions {
                enable_page_cache: false,
                ..KernelCacheOptions::default()
            }
        } else {
            KernelCacheOptions::default()
        };
        let mount = MountOptions {
            allow_other: !self.no_allow_other,
            auto_unmount: !self.no_auto_unmount,
            ..MountOptions::default()
        };
        VfsOptions::default()
            .with_kernel_cache(kernel_cache)
            .with_read_ahead(ReadAheadOptions::default().with_max_readahead(self.max_readahead))
            .with_mount(mount)
            .with_locator(LocatorOptions {
                duration_secs: self.locator_duration,
            })
    }

    fn log_filter(&self) -> EnvFilter {
        let level: &str = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    }
}

/// Load a catalog file.
///
/// Entries are read in name order, so inode assignment is the same on every
/// mount of the same file.
///
/// # Arguments
/// * `path` - JSON catalog file
fn load_catalog(path: &Path) -> Result<Catalog> {
    let content: String = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let objects: BTreeMap<String, ObjectMeta> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    Ok(Catalog::build(objects))
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter(args.log_filter()).init();

    info!("Starting dxfs");
    info!("Mount point: {}", args.mount_point.display());

    let catalog: Catalog = load_catalog(&args.catalog)?;
    info!(
        "Catalog loaded: {} files, {} bytes",
        catalog.len(),
        catalog.total_size()
    );

    let settings: ApiSettings = args.api_settings()?;
    info!("API server: {}", settings.api_url(""));
    let client = HttpApiClient::new(settings).context("failed to create API client")?;
    let options: VfsOptions = args.vfs_options();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let ctx = Arc::new(FsContext::new(Arc::new(catalog), Arc::new(client), options));

    #[cfg(feature = "fuse")]
    {
        let vfs = dxfs_vfs::DxVfs::with_runtime(ctx, runtime.handle().clone());
        dxfs_vfs::mount(vfs, &args.mount_point)?;
        info!("dxfs unmounted");
    }

    #[cfg(not(feature = "fuse"))]
    {
        tracing::warn!("FUSE support not compiled in; nothing to mount");
        info!("Filesystem context ready: {:?}", ctx);
    }

    drop(runtime);
    Ok(())
}
