use std::path::Path;

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;

use crate::{logger::LoggerFormat, Args};

const SITEMINDER_OVERRIDE_ENV: &str = "ALLOW_SITEMINDER_OVERRIDE";

#[derive(Deserialize, Debug)]
pub(crate) struct ApplicationConfig {
    pub port: u16,
    pub log_format: LoggerFormat,
    pub database: DatabaseConfig,
    pub siteminder: SiteminderConfig,
    pub redirect: RedirectConfig,
    pub session: SessionConfig,
}

#[derive(Deserialize, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub username: String,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SiteminderConfig {
    pub allow_override: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RedirectConfig {
    pub success_path: String,
    pub error_path: String,
    pub invitation_error_path: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    /// Seconds a session stays valid after sign-in.
    pub max_age: u32,
}

pub(super) fn load_config(args: Args) -> anyhow::Result<ApplicationConfig> {
    let config_file_path = if let Some(path_override) = args.config {
        path_override
    } else {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("esm")?;

        let user_config_dir = xdg_dirs.get_config_home();
        if !user_config_dir.exists() {
            std::fs::create_dir_all(&user_config_dir)?;
        }

        let config_file_path = user_config_dir.join("backbone_config.toml");

        if !config_file_path.exists() {
            write_default_config_file(&config_file_path)?;
        }

        config_file_path
    };

    let config: ApplicationConfig = with_defaults(Config::builder())?
        .add_source(File::from(config_file_path).format(FileFormat::Toml))
        .add_source(Environment::with_prefix("ESM").separator("__"))
        .set_override_option("port", args.port.map(|port| port.to_string()))?
        .set_override_option("database.host", args.database_host)?
        .set_override_option("database.port", args.database_port)?
        .set_override_option("database.database_name", args.database_name)?
        .set_override_option("database.username", args.database_username)?
        .set_override_option("database.password", args.database_password)?
        .set_override_option("siteminder.allow_override", siteminder_override_from_env())?
        .build()?
        .try_deserialize()?;

    Ok(config)
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_default("port", 8080)?
        .set_default("log_format", "json")?
        .set_default("siteminder.allow_override", false)?
        .set_default("redirect.success_path", "/dashboard")?
        .set_default("redirect.error_path", "/smerr")?
        .set_default("redirect.invitation_error_path", "/smerr")?
        .set_default("session.cookie_name", "esm_session")?
        .set_default("session.secure", true)?
        .set_default("session.max_age", 28800)?)
}

/// Only the exact value `true` enables the override.
fn siteminder_override_from_env() -> Option<bool> {
    std::env::var(SITEMINDER_OVERRIDE_ENV).ok().map(|value| value == "true")
}

fn write_default_config_file(path: &Path) -> anyhow::Result<()> {
    let default_config_content = include_str!("../static/default_config.toml");
    std::fs::write(path, default_config_content)?;
    Ok(())
}
