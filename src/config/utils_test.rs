use crate::config::{ServerConfig, ServerMode, constants::LOG_FILE_PATH};

use super::*;

#[test]
fn test_load_configuration() {
    let config = load_configuration("./testdata/config.toml").expect("failed to load config");

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("debug"));
    let log_filters = log.filters.as_deref().unwrap_or_default();
    assert_eq!(log_filters.len(), 1);
    assert_eq!(log_filters[0].module.as_deref(), Some("backend"));

    let log_file = &log.file;
    assert_eq!(log_file.path, "/var/logs/cortex-chat.log");
    assert_eq!(log_file.append, true);

    assert_eq!(config.theme.name.as_deref(), Some("dark"));
    assert_eq!(
        config.theme.folder_path.as_deref(),
        Some("/etc/cortex-chat/theme")
    );

    let server = &config.server;
    assert_eq!(server.endpoint, "https://analyst.example.com");
    assert_eq!(server.timeout_secs, Some(60));
    assert_eq!(server.mode, ServerMode::Chat);

    assert_eq!(config.general.hello_message.as_deref(), Some("Hi there!"));
}

#[test]
fn test_load_configuration_with_some_default_fields() {
    let config =
        load_configuration("./testdata/config_with_default.toml").expect("failed to load config");

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("info"));
    assert_eq!(log.file.path, LOG_FILE_PATH);

    let server = &config.server;
    assert_eq!(server.endpoint, "http://localhost:9000");
    assert_eq!(server.timeout_secs, Some(50));
    assert_eq!(server.mode, ServerMode::Analyst);
}

#[test]
fn test_timeout_zero_disables() {
    let mut server = ServerConfig::default();
    assert!(server.timeout().is_some());
    server.timeout_secs = Some(0);
    assert!(server.timeout().is_none());
}

#[test]
fn test_resolve_path_expands_env_vars() {
    // Unset variables expand to the empty string
    let ret = resolve_path("$CORTEX_LOG_DIR/${CORTEX_LOG_NAME}/app.log")
        .expect("failed to resolve path");
    assert_eq!(ret, "//app.log");

    unsafe {
        std::env::set_var("CORTEX_LOG_DIR", "/var/log");
        std::env::set_var("CORTEX_LOG_NAME", "cortex");
    }
    let ret = resolve_path("$CORTEX_LOG_DIR/${CORTEX_LOG_NAME}/app.log")
        .expect("failed to resolve path");
    assert_eq!(ret, "/var/log/cortex/app.log");
}
