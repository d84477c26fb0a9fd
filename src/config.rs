//! Runtime configuration
//!
//! Every option comes from a command-line flag or its environment variable.
//! A `Config` is built once at startup and handed to whatever needs it.

use clap::{Args, ValueEnum};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::FailurePolicy;
use crate::cache::{CacheStore, FileStore, NullStore, DEFAULT_TTL};
use crate::error::ConfigError;

/// Share count providers that can be enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Provider {
    Facebook,
    Pinterest,
    Linkedin,
}

impl Provider {
    /// Key used for this provider in the `share` object
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Facebook => "facebook",
            Provider::Pinterest => "pinterest",
            Provider::Linkedin => "linkedin",
        }
    }
}

/// Command-line names for the builder's failure policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProviderErrorPolicy {
    /// Fail the whole request
    #[default]
    Fail,
    /// Report the failing provider as 0
    Zero,
}

impl From<ProviderErrorPolicy> for FailurePolicy {
    fn from(policy: ProviderErrorPolicy) -> Self {
        match policy {
            ProviderErrorPolicy::Fail => FailurePolicy::FailFast,
            ProviderErrorPolicy::Zero => FailurePolicy::ZeroOnError,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Directory holding cached responses (defaults to the user cache directory)
    #[arg(long, global = true, env = "SHARECOUNT_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Disable response caching
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Seconds a cached response stays fresh
    #[arg(
        long = "ttl",
        global = true,
        env = "SHARECOUNT_CACHE_TTL",
        value_name = "SECONDS",
        default_value_t = DEFAULT_TTL.as_secs()
    )]
    pub ttl_secs: u64,

    /// Providers to query, in output order
    #[arg(
        long,
        global = true,
        env = "SHARECOUNT_PROVIDERS",
        value_enum,
        value_delimiter = ',',
        default_value = "facebook"
    )]
    pub providers: Vec<Provider>,

    /// Facebook application ID
    #[arg(long, global = true, env = "FACEBOOK_APP_ID", hide_env_values = true)]
    pub facebook_app_id: Option<String>,

    /// Facebook application secret
    #[arg(long, global = true, env = "FACEBOOK_APP_SECRET", hide_env_values = true)]
    pub facebook_app_secret: Option<String>,

    /// What to do when one provider fails
    #[arg(
        long,
        global = true,
        env = "SHARECOUNT_ON_PROVIDER_ERROR",
        value_enum,
        default_value_t = ProviderErrorPolicy::Fail
    )]
    pub on_provider_error: ProviderErrorPolicy,
}

impl Config {
    /// Checks the settings that do not touch the filesystem
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::new("At least one provider must be enabled."));
        }
        if self.ttl_secs == 0 {
            return Err(ConfigError::new("The cache TTL must be greater than zero."));
        }
        if self.providers.contains(&Provider::Facebook) {
            self.facebook_credentials()?;
        }
        Ok(())
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.on_provider_error.into()
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the Facebook app ID and secret, both non-empty
    pub fn facebook_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let app_id = self.facebook_app_id.as_deref().unwrap_or_default();
        let app_secret = self.facebook_app_secret.as_deref().unwrap_or_default();
        if app_id.trim().is_empty() || app_secret.trim().is_empty() {
            return Err(ConfigError::new(
                "You must specify the Facebook App ID and app secret.",
            ));
        }
        Ok((app_id, app_secret))
    }

    /// Opens the configured cache store
    ///
    /// An explicit `--cache-dir` must already exist. The default directory is
    /// created on first use.
    pub fn cache_store(&self) -> Result<Arc<dyn CacheStore>, ConfigError> {
        if self.no_cache {
            return Ok(Arc::new(NullStore));
        }

        let root = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir()?,
        };
        let store = FileStore::open(root)?.with_default_ttl(self.ttl());
        Ok(Arc::new(store))
    }
}

/// XDG-compliant cache directory (`~/.cache/sharecount` on Linux), created if missing
fn default_cache_dir() -> Result<PathBuf, ConfigError> {
    let project_dirs = ProjectDirs::from("", "", "sharecount")
        .ok_or_else(|| ConfigError::new("The cache directory is not specified."))?;
    let dir = project_dirs.cache_dir().to_path_buf();
    fs::create_dir_all(&dir).map_err(|e| {
        ConfigError::new(format!(
            "Could not create the cache directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(dir)
}
