use super::ConfigError;
use super::models::Config;
use config::{Environment, File};
use std::env;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "LOGSINK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/logsink.toml";
const ENV_PREFIX: &str = "LOGSINK";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. `LOGSINK__*` environment variables
/// 5. Plain deployment variables (`DB_HOST`, `APP_PORT`, ...) (highest priority)
///
/// An explicit `config_path` takes precedence over `LOGSINK_CONFIG`.
pub fn load(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = config_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    apply_env_overrides(&mut config, |key| env::var(key).ok())?;

    Ok(config)
}

/// Apply the plain variables the service has always been deployed with.
///
/// `lookup` abstracts the environment so tests need not mutate it.
/// `DB_PASSWORD` is the only way to set the password.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("DB_PORT") {
        config.database.port = parse_port("DB_PORT", &port)?;
    }
    if let Some(username) = lookup("DB_USERNAME") {
        config.database.username = username;
    }
    if let Some(password) = lookup("DB_PASSWORD") {
        config.database.password = Some(password);
    }

    let app_host = lookup("APP_HOST");
    let app_port = lookup("APP_PORT");
    if app_host.is_some() || app_port.is_some() {
        let port = match app_port {
            Some(port) => parse_port("APP_PORT", &port)?,
            None => config.server.bind_addr.port(),
        };
        config.server.bind_addr = match app_host {
            Some(host) => resolve_bind_addr("APP_HOST", &host, port)?,
            None => (config.server.bind_addr.ip(), port).into(),
        };
    }

    Ok(())
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// IP literal or hostname; hostnames are resolved once, preferring IPv4
fn resolve_bind_addr(var: &'static str, host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let invalid = || ConfigError::InvalidEnv {
        var,
        value: host.to_string(),
    };

    let host = host.trim();
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok((ip, port).into());
    }

    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().map_err(|_| invalid())?.collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(invalid)
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // LOGSINK__DATABASE__HOST -> database.host
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    Ok(config.try_deserialize()?)
}
