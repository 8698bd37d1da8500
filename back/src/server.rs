use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    error::LibResult,
    progress::{self, Phase, ProgressSink},
    settings::SettingsBuilder,
    steamcmd::SteamCmd,
};

/// SteamCMD exits with 1 for some benign warnings after a finished update
pub const INSTALL_SUCCESS_CODES: [i32; 2] = [0, 1];

const PREPARE_PHASE: Phase = Phase::new("prepare", 0.0, 5.0);
const LAUNCH_PHASE: Phase = Phase::new("launch", 5.0, 10.0);
const DOWNLOAD_PHASE: Phase = Phase::new("download", 10.0, 100.0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub app_id: u32,
    pub install_dir: PathBuf,
}

impl InstallRequest {
    pub fn new(app_id: u32, install_dir: impl AsRef<Path>) -> Self {
        Self {
            app_id,
            install_dir: normalize_path(install_dir.as_ref()),
        }
    }

    /// The SteamCMD arguments installing and validating this app
    pub fn arguments(&self) -> Vec<OsString> {
        vec![
            "+login".into(),
            "anonymous".into(),
            "+force_install_dir".into(),
            self.install_dir.clone().into_os_string(),
            "+app_update".into(),
            self.app_id.to_string().into(),
            "validate".into(),
            "+quit".into(),
        ]
    }
}

/// Lexically clean up a path: drop `.` components and fold `..` into their parent where possible
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }

    normalized
}

/// Pull the percentage out of SteamCMD lines like `Update state (0x61) downloading, progress: 45.67 (123 / 456)`
pub fn parse_progress(line: &str) -> Option<f32> {
    let (_, rest) = line.split_once("progress: ")?;
    let number = rest.split_whitespace().next()?;

    number.parse::<f32>().ok().filter(|value| (0.0..=100.0).contains(value))
}

#[instrument(skip(steamcmd, settings, sink, stop, on_line))]
pub async fn install(
    steamcmd: &SteamCmd,
    request: &InstallRequest,
    settings: &SettingsBuilder,
    sink: &ProgressSink,
    stop: &CancellationToken,
    mut on_line: impl FnMut(&str),
) -> LibResult<()> {
    sink.reset();

    tokio::fs::create_dir_all(&request.install_dir).await?;
    sink.set(PREPARE_PHASE.end);

    let arguments = request.arguments();
    debug!(?arguments, "Running SteamCMD");
    sink.set(LAUNCH_PHASE.end);

    // SteamCMD only prints real progress once the depot download starts, animate until then
    let animation_stop = stop.child_token();
    tokio::spawn(progress::animate(
        sink.clone(),
        DOWNLOAD_PHASE.animation_target(),
        animation_stop.clone(),
        settings.animation_step,
        settings.animation_interval,
    ));

    let result = steamcmd
        .run(arguments, |line| {
            if let Some(percent) = parse_progress(line) {
                animation_stop.cancel();
                sink.set_phase(&DOWNLOAD_PHASE, percent / 100.0 * progress::ANIMATION_CEILING);
            }

            on_line(line);
        })
        .await;
    animation_stop.cancel();

    let code = result?.check("SteamCMD", &INSTALL_SUCCESS_CODES)?;
    info!(code, app_id = request.app_id, "Server installed");

    sink.complete();

    Ok(())
}


#[cfg(all(test, unix))]
mod process_tests {
    use std::{fs, os::unix::fs::PermissionsExt, time::Duration};

    use tempfile::TempDir;

    use super::*;
    use crate::{
        error::{Error, ErrorKind},
        messages::{Frontend, TaskKind},
        paths,
    };

    /// A stand-in SteamCMD that records its arguments and runs `body`
    fn fake_steamcmd(tmp: &TempDir, body: &str) -> SteamCmd {
        let dir = tmp.path().join("SteamCMD");
        fs::create_dir_all(&dir).unwrap();

        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\n{}\n",
            tmp.path().join("args.txt").display(),
            body
        );
        let executable = dir.join(paths::STEAMCMD_EXECUTABLE);
        fs::write(&executable, script).unwrap();
        fs::set_permissions(&executable, fs::Permissions::from_mode(0o755)).unwrap();

        SteamCmd::new(dir)
    }

    fn sink() -> ProgressSink {
        let (tx, _rx) = crossbeam_channel::unbounded();
        ProgressSink::new(TaskKind::ServerInstall, Frontend::new(tx, None))
    }

    fn settings() -> SettingsBuilder {
        SettingsBuilder::new().animation(5.0, Duration::from_millis(5))
    }

    async fn run(steamcmd: &SteamCmd, request: &InstallRequest, sink: &ProgressSink) -> LibResult<Vec<String>> {
        let mut lines = Vec::new();
        install(steamcmd, request, &settings(), sink, &CancellationToken::new(), |line| {
            lines.push(line.to_string())
        })
        .await?;
        Ok(lines)
    }

    #[tokio::test]
    async fn exit_codes_zero_and_one_succeed() {
        for code in [0, 1] {
            let tmp = TempDir::new().unwrap();
            let steamcmd = fake_steamcmd(&tmp, &format!("exit {code}"));
            let request = InstallRequest::new(90, tmp.path().join("server"));
            let sink = sink();

            run(&steamcmd, &request, &sink).await.unwrap();

            assert_eq!(sink.get(), 100.0);
            assert!(request.install_dir.is_dir());

            let recorded = fs::read_to_string(tmp.path().join("args.txt")).unwrap();
            let recorded: Vec<&str> = recorded.lines().collect();
            assert_eq!(recorded[3], request.install_dir.display().to_string());
            assert_eq!(recorded[5], "90");
        }
    }

    #[tokio::test]
    async fn other_exit_codes_fail_with_output() {
        let tmp = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd(&tmp, "echo \"Error! App '90' state is 0x202 after update job.\"\nexit 8");
        let request = InstallRequest::new(90, tmp.path().join("server"));
        let sink = sink();

        let error = run(&steamcmd, &request, &sink).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Process);
        assert!(error.output().unwrap().contains("0x202"));
        assert!(sink.get() < 100.0);
    }

    #[tokio::test]
    async fn missing_steamcmd_is_reported() {
        let tmp = TempDir::new().unwrap();
        let steamcmd = SteamCmd::new(tmp.path().join("nowhere"));
        let request = InstallRequest::new(90, tmp.path().join("server"));

        let error = run(&steamcmd, &request, &sink()).await.unwrap_err();

        assert!(matches!(error, Error::SteamCmdMissing(_)));
    }

    #[tokio::test]
    async fn progress_is_not_complete_before_the_process_exits() {
        let tmp = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd(&tmp, "sleep 1\nexit 0");
        let request = InstallRequest::new(90, tmp.path().join("server"));
        let sink = sink();

        let handle = {
            let steamcmd = steamcmd.clone();
            let request = request.clone();
            let sink = sink.clone();
            tokio::spawn(async move { run(&steamcmd, &request, &sink).await })
        };

        // Long enough for the animation to run into its target
        tokio::time::sleep(Duration::from_millis(500)).await;
        let during = sink.get();
        assert!(during > LAUNCH_PHASE.end);
        assert!(during < 100.0);

        handle.await.unwrap().unwrap();
        assert_eq!(sink.get(), 100.0);
    }

    #[tokio::test]
    async fn real_progress_lines_drive_the_bar() {
        let tmp = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd(
            &tmp,
            "echo ' Update state (0x61) downloading, progress: 50.00 (1 / 2)'\nexit 0",
        );
        let request = InstallRequest::new(90, tmp.path().join("server"));

        let lines = run(&steamcmd, &request, &sink()).await.unwrap();

        assert_eq!(lines, vec!["Update state (0x61) downloading, progress: 50.00 (1 / 2)"]);
    }

    #[tokio::test]
    async fn non_utf8_output_does_not_fail_the_install() {
        let tmp = TempDir::new().unwrap();
        let steamcmd = fake_steamcmd(&tmp, "printf 'Loading \\377 user\\n'\nsleep 0.3\necho Success\nexit 0");
        let request = InstallRequest::new(90, tmp.path().join("server"));
        let sink = sink();

        let lines = run(&steamcmd, &request, &sink).await.unwrap();

        assert_eq!(lines, vec!["Loading \u{FFFD} user", "Success"]);
        assert_eq!(sink.get(), 100.0);
    }
}
