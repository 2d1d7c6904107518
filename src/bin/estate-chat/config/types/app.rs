use serde::{Deserialize, Serialize};

use super::{BackendConfig, CaptureConfig, LoggingConfig, UiConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}
