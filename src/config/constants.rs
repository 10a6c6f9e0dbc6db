/// Default proxy endpoint when no configuration is provided
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Request timeout, matches the upstream Analyst API timeout (50s)
pub const API_TIMEOUT_SECS: u64 = 50;

pub const HELLO_MESSAGE: &str =
    "Hello! Ask me anything about your data and I'll do my best to answer. 📊";

pub const LOG_FILE_PATH: &str = "/tmp/cortex-chat.log";

pub const BUBBLE_WIDTH_PERCENT: usize = 60; // 60% of the screen width

pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(100);
