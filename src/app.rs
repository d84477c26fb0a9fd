//! Wires fetchers, cache and builders from a `Config`

use std::sync::Arc;
use tracing::info;

use crate::builder::{CachedResponseBuilder, ResponseBuilder, ShareResponseBuilder};
use crate::config::{Config, Provider};
use crate::error::ConfigError;
use crate::fetch::{FacebookFetcher, Fetcher, HttpTransport, LinkedinFetcher, PinterestFetcher};

/// Builder chain used by both the server and the one-shot command
pub type AppBuilder = CachedResponseBuilder<ShareResponseBuilder>;

/// Creates the fetcher for one provider
pub fn fetcher_for(
    provider: Provider,
    config: &Config,
    transport: Arc<dyn HttpTransport>,
) -> Result<Arc<dyn Fetcher>, ConfigError> {
    Ok(match provider {
        Provider::Facebook => {
            let (app_id, app_secret) = config.facebook_credentials()?;
            Arc::new(FacebookFetcher::new(transport, app_id, app_secret))
        }
        Provider::Pinterest => Arc::new(PinterestFetcher::new(transport)),
        Provider::Linkedin => Arc::new(LinkedinFetcher::new(transport)),
    })
}

/// Validates `config` and assembles the cached builder chain
///
/// # Errors
/// Returns `ConfigError` for invalid settings or an unusable cache directory,
/// before any upstream is contacted.
pub fn build(config: &Config, transport: Arc<dyn HttpTransport>) -> Result<AppBuilder, ConfigError> {
    config.validate()?;

    let mut plain = ShareResponseBuilder::new().with_policy(config.failure_policy());
    for &provider in &config.providers {
        plain.register_fetcher(provider.name(), fetcher_for(provider, config, transport.clone())?);
    }

    let store = config.cache_store()?;
    info!(
        providers = ?plain.fetcher_names().collect::<Vec<_>>(),
        cache = ?store,
        "Share count pipeline ready"
    );

    Ok(CachedResponseBuilder::new(plain, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FailurePolicy;
    use crate::cli::Cli;
    use crate::fetch::ReqwestTransport;
    use clap::Parser;
    use tempfile::TempDir;

    fn config_from(args: &[&str]) -> Config {
        let mut argv = vec!["sharecount"];
        argv.extend_from_slice(args);
        argv.push("fetch");
        Cli::try_parse_from(argv).expect("Arguments should parse").config
    }

    fn transport() -> Arc<dyn HttpTransport> {
        Arc::new(ReqwestTransport::new())
    }

    #[test]
    fn test_build_registers_providers_in_order() {
        let config = config_from(&[
            "--no-cache",
            "--providers",
            "linkedin,facebook,pinterest",
            "--facebook-app-id",
            "id",
            "--facebook-app-secret",
            "secret",
        ]);

        let builder = build(&config, transport()).unwrap();

        assert_eq!(
            builder.inner().fetcher_names().collect::<Vec<_>>(),
            vec!["linkedin", "facebook", "pinterest"]
        );
    }

    #[test]
    fn test_build_applies_failure_policy() {
        let config = config_from(&["--no-cache", "--providers", "pinterest", "--on-provider-error", "zero"]);
        let builder = build(&config, transport()).unwrap();
        assert_eq!(builder.inner().policy(), FailurePolicy::ZeroOnError);
    }

    #[test]
    fn test_build_fails_without_facebook_credentials() {
        let config = config_from(&["--no-cache", "--providers", "facebook"]);
        let err = build(&config, transport()).unwrap_err();
        assert!(err.to_string().contains("Facebook"));
    }

    #[test]
    fn test_build_fails_for_missing_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let config = config_from(&[
            "--providers",
            "pinterest",
            "--cache-dir",
            missing.to_str().unwrap(),
        ]);

        assert!(build(&config, transport()).is_err());
    }

    #[test]
    fn test_build_with_cache_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_from(&[
            "--providers",
            "pinterest",
            "--cache-dir",
            temp_dir.path().to_str().unwrap(),
        ]);

        let builder = build(&config, transport()).unwrap();
        builder.store().set_default("k", "v").unwrap();
        assert_eq!(builder.store().get("k").as_deref(), Some("v"));
    }
}
