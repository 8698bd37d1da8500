use std::path::PathBuf;

#[cfg(not(target_os = "windows"))]
use once_cell::sync::Lazy;
use tracing::instrument;

#[cfg(not(target_os = "windows"))]
static BASE_DIRS: Lazy<Option<directories::BaseDirs>> = Lazy::new(directories::BaseDirs::new);

#[cfg(target_os = "windows")]
#[instrument(level = "trace")]
pub fn default_steamcmd_dir() -> PathBuf {
    PathBuf::from(r"C:\SteamCMD")
}

#[cfg(not(target_os = "windows"))]
#[instrument(level = "trace")]
pub fn default_steamcmd_dir() -> PathBuf {
    BASE_DIRS
        .as_ref()
        .map_or_else(std::env::temp_dir, |dirs| dirs.data_local_dir().to_owned())
        .join("adsi")
        .join("steamcmd")
}

#[cfg(target_os = "windows")]
pub const STEAMCMD_EXECUTABLE: &str = "steamcmd.exe";

#[cfg(not(target_os = "windows"))]
pub const STEAMCMD_EXECUTABLE: &str = "steamcmd.sh";

#[cfg(target_os = "windows")]
pub const DEFAULT_STEAMCMD_URL: &str = "https://steamcdn-a.akamaihd.net/client/installer/steamcmd.zip";

#[cfg(target_os = "linux")]
pub const DEFAULT_STEAMCMD_URL: &str = "https://steamcdn-a.akamaihd.net/client/installer/steamcmd_linux.tar.gz";

#[cfg(target_os = "macos")]
pub const DEFAULT_STEAMCMD_URL: &str = "https://steamcdn-a.akamaihd.net/client/installer/steamcmd_osx.tar.gz";

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
pub const DEFAULT_STEAMCMD_URL: &str = "https://steamcdn-a.akamaihd.net/client/installer/steamcmd_linux.tar.gz";

pub const DEFAULT_CATALOG_URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";
