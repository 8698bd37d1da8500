use std::{path::PathBuf, time::Duration};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::paths;

pub static CONF: Lazy<Mutex<SettingsBuilder>> = Lazy::new(|| Mutex::new(SettingsBuilder::default()));

#[derive(Clone, Debug)]
pub struct SettingsBuilder {
    /// The Steam endpoint listing every application
    pub catalog_url: String,
    /// Where the SteamCMD archive is downloaded from
    pub steamcmd_url: String,
    /// The folder SteamCMD is extracted to and run from
    pub steamcmd_dir: PathBuf,
    /// The folder the SteamCMD archive is downloaded to before extraction
    pub download_dir: PathBuf,
    /// How much the progress bar moves per animation tick, in percent
    pub animation_step: f32,
    /// The delay between animation ticks
    pub animation_interval: Duration,
}

impl SettingsBuilder {
    /// Create a new [SettingsBuilder](SettingsBuilder) off of the default struct values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [SettingsBuilder](SettingsBuilder) from the current values
    #[must_use]
    pub fn from_current() -> Self {
        CONF.lock().clone()
    }

    /// Set the catalog endpoint
    #[must_use]
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    /// Set the SteamCMD archive location
    #[must_use]
    pub fn steamcmd_url(mut self, url: impl Into<String>) -> Self {
        self.steamcmd_url = url.into();
        self
    }

    /// Set the SteamCMD installation folder
    #[must_use]
    pub fn steamcmd_dir(mut self, path: PathBuf) -> Self {
        self.steamcmd_dir = path;
        self
    }

    /// Set the folder the archive is downloaded to
    #[must_use]
    pub fn download_dir(mut self, path: PathBuf) -> Self {
        self.download_dir = path;
        self
    }

    /// Set the progress animation step and tick interval
    #[must_use]
    pub fn animation(mut self, step: f32, interval: Duration) -> Self {
        self.animation_step = step;
        self.animation_interval = interval;
        self
    }

    /// Override the endpoints and SteamCMD folder with whatever `lookup` finds under
    /// `ADSI_CATALOG_URL`, `ADSI_STEAMCMD_URL` and `ADSI_STEAMCMD_DIR`
    #[must_use]
    pub fn overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("ADSI_CATALOG_URL") {
            self.catalog_url = url;
        }
        if let Some(url) = lookup("ADSI_STEAMCMD_URL") {
            self.steamcmd_url = url;
        }
        if let Some(dir) = lookup("ADSI_STEAMCMD_DIR") {
            self.steamcmd_dir = PathBuf::from(dir);
        }
        self
    }

    /// Apply the configuration
    pub fn apply(self) {
        let mut changer = CONF.lock();
        *changer = self;
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            catalog_url: paths::DEFAULT_CATALOG_URL.to_string(),
            steamcmd_url: paths::DEFAULT_STEAMCMD_URL.to_string(),
            steamcmd_dir: paths::default_steamcmd_dir(),
            download_dir: std::env::temp_dir(),
            animation_step: 0.2,
            animation_interval: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn overrides_replace_only_what_is_set() {
        let vars = HashMap::from([
            ("ADSI_STEAMCMD_DIR", "/opt/steamcmd"),
            ("ADSI_CATALOG_URL", "http://localhost:8080/apps"),
        ]);

        let settings = SettingsBuilder::new().overrides(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(settings.steamcmd_dir, PathBuf::from("/opt/steamcmd"));
        assert_eq!(settings.catalog_url, "http://localhost:8080/apps");
        assert_eq!(settings.steamcmd_url, paths::DEFAULT_STEAMCMD_URL);
    }

    #[test]
    fn applied_settings_are_current() {
        SettingsBuilder::from_current().animation(0.5, Duration::from_millis(50)).apply();

        let current = SettingsBuilder::from_current();
        assert_eq!(current.animation_step, 0.5);
        assert_eq!(current.animation_interval, Duration::from_millis(50));
    }
}
