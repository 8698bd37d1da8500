use std::path::{Path, PathBuf};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use self::archive::ArchiveFormat;
use crate::{
    error::{Error, LibResult},
    paths,
    process::{self, ProcessOutput},
    progress::{self, Phase, ProgressSink},
    settings::SettingsBuilder,
};

pub mod archive;
pub mod download;

/// SteamCMD exits with 7 after a successful first-run self update
pub const BOOTSTRAP_SUCCESS_CODES: [i32; 2] = [0, 7];

const DOWNLOAD_PHASE: Phase = Phase::new("download", 0.0, 60.0);
const EXTRACT_PHASE: Phase = Phase::new("extract", 60.0, 70.0);
const BOOTSTRAP_PHASE: Phase = Phase::new("bootstrap", 70.0, 100.0);

/// A SteamCMD installation on disk
#[derive(Debug, Clone)]
pub struct SteamCmd {
    dir: PathBuf,
}

impl SteamCmd {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &SettingsBuilder) -> Self {
        Self::new(&settings.steamcmd_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn executable(&self) -> PathBuf {
        self.dir.join(paths::STEAMCMD_EXECUTABLE)
    }

    pub fn is_installed(&self) -> bool {
        self.executable().is_file()
    }

    /// A command running SteamCMD from within its own folder
    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(self.executable());
        command.current_dir(&self.dir);
        command
    }

    /// Run SteamCMD with `args`, feeding its output to `on_line`
    pub(crate) async fn run<I, S>(&self, args: I, on_line: impl FnMut(&str)) -> LibResult<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        if !self.is_installed() {
            return Err(Error::SteamCmdMissing(self.executable()));
        }

        let mut command = self.command();
        command.args(args);

        process::run_streaming(command, on_line).await
    }
}

/// The file name the archive at `url` is saved under, taken from the last path segment
fn archive_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()?
                .next_back()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "steamcmd.zip".to_string())
}

/// A downloaded archive, removed from disk however the install ends
struct TempArchive(PathBuf);

impl Drop for TempArchive {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => debug!(archive = %self.0.display(), "Removed the downloaded archive"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => warn!(%error, archive = %self.0.display(), "Could not remove the downloaded archive"),
        }
    }
}

/// Download SteamCMD, extract it and let it update itself once
#[instrument(skip_all, fields(url = %settings.steamcmd_url, dir = %settings.steamcmd_dir.display()))]
pub async fn install(
    client: &reqwest::Client,
    settings: &SettingsBuilder,
    sink: &ProgressSink,
    stop: &CancellationToken,
) -> LibResult<()> {
    let url = settings.steamcmd_url.as_str();
    let file_name = archive_file_name(url);

    let format = ArchiveFormat::from_name(&file_name).map_err(|source| Error::Extract {
        path: PathBuf::from(&file_name),
        source,
    })?;

    tokio::fs::create_dir_all(&settings.download_dir).await?;
    let temp_archive = TempArchive(settings.download_dir.join(&file_name));
    let archive_path = temp_archive.0.as_path();

    sink.reset();

    download::download_to_file(client, url, archive_path, |downloaded, total| {
        if let Some(total) = total {
            sink.set_phase(&DOWNLOAD_PHASE, downloaded as f32 / total as f32);
        }
    })
    .await
    .map_err(|source| Error::Download {
        url: url.to_string(),
        source,
    })?;

    info!(archive = %archive_path.display(), "Downloaded SteamCMD");
    sink.set(DOWNLOAD_PHASE.end);

    let steamcmd = SteamCmd::from_settings(settings);
    {
        let archive_path = archive_path.to_owned();
        let dest_dir = steamcmd.dir().to_owned();
        let sink = sink.clone();

        tokio::task::spawn_blocking(move || {
            archive::extract(&archive_path, &dest_dir, format, |done, total| {
                if total > 0 {
                    sink.set_phase(&EXTRACT_PHASE, done as f32 / total as f32);
                }
            })
            .map_err(|source| Error::Extract {
                path: archive_path.clone(),
                source,
            })
        })
        .await??;
    }

    info!(dir = %steamcmd.dir().display(), "Extracted SteamCMD");
    drop(temp_archive);

    // Nothing measurable happens while SteamCMD updates itself
    let animation_stop = stop.child_token();
    tokio::spawn(progress::animate(
        sink.clone(),
        BOOTSTRAP_PHASE.animation_target(),
        animation_stop.clone(),
        settings.animation_step,
        settings.animation_interval,
    ));

    let result = steamcmd.run(["+quit"], |_| {}).await;
    animation_stop.cancel();

    let code = result?.check("SteamCMD", &BOOTSTRAP_SUCCESS_CODES)?;
    info!(code, "SteamCMD installed");

    sink.complete();

    Ok(())
}
