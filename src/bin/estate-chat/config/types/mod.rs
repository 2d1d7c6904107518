mod app;
mod backend;
mod capture;
mod logging;
mod ui;

const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 5;
const DEFAULT_MAX_RECORD_SECONDS: u32 = 60;
const DEFAULT_HISTORY_PREVIEW_CHARS: usize = 40;

pub use app::AppConfig;
pub use backend::BackendConfig;
pub use capture::CaptureConfig;
pub use logging::LoggingConfig;
pub use ui::UiConfig;
