#[cfg(test)]
#[path = "utils_test.rs"]
mod tests;

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::Local;
use eyre::{Context, Result};
use log::LevelFilter;
use regex::Regex;
use syntect::highlighting::{Theme, ThemeSet};

use super::{Configuration, LogConfig, ThemeConfig};

pub fn load_configuration(config_path: &str) -> Result<Configuration> {
    let raw = std::fs::read_to_string(config_path).wrap_err(format!("reading {config_path}"))?;
    toml::from_str(&raw).wrap_err("parsing configuration")
}

/// Logs go to a file; stdout and stderr belong to the terminal UI.
pub fn init_logger(config: &LogConfig) -> Result<()> {
    let path = resolve_path(&config.file.path)
        .wrap_err(format!("resolving log file path {}", config.file.path))?;
    if let Some(dir) = Path::new(&path).parent() {
        std::fs::create_dir_all(dir).wrap_err(format!("creating {}", dir.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.file.append)
        .open(&path)
        .wrap_err(format!("opening log file {path}"))?;

    let raw_level = config.level.as_deref().unwrap_or("info");
    let log_level = LevelFilter::from_str(raw_level)?;

    let mut builder = env_logger::Builder::new();
    for filter in config.filters.as_deref().unwrap_or_default() {
        let module_level = LevelFilter::from_str(filter.level.as_deref().unwrap_or(raw_level))
            .unwrap_or(log_level);
        builder.filter(filter.module.as_deref(), module_level);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}:{} - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log_level)
        .try_init()?;
    Ok(())
}

pub fn init_theme(config: &ThemeConfig) -> Result<Theme> {
    let themes = match config.folder_path.as_deref() {
        Some(path) => {
            ThemeSet::load_from_folder(path).wrap_err(format!("loading theme from {path}"))?
        }
        None => ThemeSet::load_defaults(),
    };

    let theme_name = config.name.as_deref().unwrap_or_default();
    themes
        .themes
        .get(theme_name)
        .cloned()
        .ok_or_else(|| eyre::eyre!("theme {} not found", theme_name))
}

/// Expands `$VAR` and `${VAR}` references (unset variables become empty)
/// and resolves the result to an absolute path.
pub fn resolve_path(path: &str) -> Result<String> {
    let re = Regex::new(r"\$\{?([A-Za-z_]+)\}?").wrap_err("compiling regex")?;
    let expanded = re.replace_all(path, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });

    let abs = std::path::absolute(expanded.as_ref())
        .wrap_err(format!("resolving path {expanded}"))?;
    Ok(abs.to_string_lossy().to_string())
}

/// Looks for a config file at:
/// * $XDG_CONFIG_HOME/cortex-chat/config.toml
/// * $HOME/.config/cortex-chat/config.toml
/// * $HOME/.cortex-chat.toml
pub fn lookup_config_path() -> Option<String> {
    [
        format!(
            "{}/cortex-chat/config.toml",
            env_or_current("XDG_CONFIG_HOME")
        ),
        format!("{}/.config/cortex-chat/config.toml", env_or_current("HOME")),
        format!("{}/.cortex-chat.toml", env_or_current("HOME")),
    ]
    .into_iter()
    .find(|path| Path::new(path).exists())
}

fn env_or_current(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| ".".to_string())
}
