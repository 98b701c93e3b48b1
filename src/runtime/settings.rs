use std::path::PathBuf;

use crate::config;

/// Load settings, falling back to defaults when the file is unreadable or
/// invalid. Returns the warning to report once logging is up.
pub fn load_settings(explicit_path: Option<PathBuf>) -> (config::Settings, Option<String>) {
    match config::Settings::load(explicit_path) {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                (
                    config::Settings::default(),
                    Some(format!("invalid config, using defaults: {msg}")),
                )
            } else {
                (s, None)
            }
        }
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}
