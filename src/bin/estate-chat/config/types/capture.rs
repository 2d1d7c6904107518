use serde::{Deserialize, Serialize};

use super::DEFAULT_MAX_RECORD_SECONDS;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recording stops accumulating samples after this many seconds.
    pub max_record_seconds: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_record_seconds: DEFAULT_MAX_RECORD_SECONDS,
        }
    }
}
