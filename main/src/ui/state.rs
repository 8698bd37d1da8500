use std::{
    collections::{HashMap, HashSet, VecDeque},
    path::PathBuf,
};

use back::{
    messages::{Outcome, TaskKind, ToFrontend},
    server::InstallRequest,
    Catalog, ErrorKind,
};

pub const SERVER_PLACEHOLDER: &str = "Choose a game server";
pub const DIRECTORY_PLACEHOLDER: &str = "Choose server installation directory";

/// Where the shell currently stands, derived from what has been loaded and chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPhase {
    ServersLoading,
    ChoosingServer,
    ServerChosen,
    PathChosen,
    ReadyToInstall,
    Installing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message shown to the user in a modal dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    pub details: Option<String>,
    /// Look for SteamCMD again once this is dismissed
    pub recheck_steamcmd: bool,
}

impl Notice {
    fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            details: None,
            recheck_steamcmd: false,
        }
    }
}

/// Everything the window shows, only ever touched from the UI thread
#[derive(Default)]
pub struct ShellState {
    catalog: Option<Catalog>,
    catalog_failed: bool,
    selected_server: Option<String>,
    pub install_dir_buf: String,
    pub search_buf: String,
    steamcmd_installed: Option<bool>,
    running: HashSet<TaskKind>,
    progress: HashMap<TaskKind, f32>,
    status_lines: HashMap<TaskKind, String>,
    notices: VecDeque<Notice>,
}

impl ShellState {
    pub fn apply(&mut self, message: ToFrontend) {
        match message {
            ToFrontend::SetCatalog { catalog } => {
                self.catalog_failed = false;
                self.catalog = Some(catalog);
                self.select_server(None);
            }

            ToFrontend::SteamCmdStatus { installed } => self.steamcmd_installed = Some(installed),

            ToFrontend::TaskStarted { task } => {
                self.running.insert(task);
                self.progress.remove(&task);
                self.status_lines.remove(&task);
            }

            ToFrontend::TaskProgress { task, value } => {
                self.progress.insert(task, value);
            }

            ToFrontend::TaskOutput { task, line } => {
                self.status_lines.insert(task, line);
            }

            ToFrontend::TaskFinished { task, outcome } => {
                self.running.remove(&task);
                self.progress.remove(&task);
                self.status_lines.remove(&task);
                self.finish(task, outcome);
            }

            ToFrontend::BackendError { error } => {
                let mut notice = Notice::new(NoticeLevel::Error, "Error", error.message);
                notice.details = Some(error.error.to_string());
                self.notices.push_back(notice);
            }
        }
    }

    fn finish(&mut self, task: TaskKind, outcome: Outcome) {
        let title = match task {
            TaskKind::CatalogFetch => "API Error",
            TaskKind::SteamCmdInstall => "SteamCMD Installation",
            TaskKind::ServerInstall => "Server Installation",
        };

        match outcome {
            Outcome::Completed => match task {
                TaskKind::CatalogFetch => {}
                TaskKind::SteamCmdInstall => {
                    self.notices
                        .push_back(Notice::new(NoticeLevel::Info, title, "SteamCMD installed successfully."));
                }
                TaskKind::ServerInstall => {
                    self.notices
                        .push_back(Notice::new(NoticeLevel::Info, title, "Server installed successfully."));
                }
            },

            Outcome::Cancelled => {
                if task != TaskKind::CatalogFetch {
                    self.notices
                        .push_back(Notice::new(NoticeLevel::Warning, title, "The installation was cancelled."));
                }
            }

            Outcome::Failed(error) => {
                if task == TaskKind::CatalogFetch {
                    self.catalog_failed = true;
                }

                let steamcmd_missing = matches!(error.error, back::Error::SteamCmdMissing(_));
                let message = match error.error.kind() {
                    ErrorKind::Process if steamcmd_missing => {
                        self.steamcmd_installed = Some(false);
                        "SteamCMD is not installed. Use the button on the bottom left to install SteamCMD".to_string()
                    }
                    _ => format!("{}: {}", error.message, error.error),
                };

                let mut notice = Notice::new(NoticeLevel::Error, title, message);
                notice.details = error.error.output().map(str::to_string);
                notice.recheck_steamcmd = steamcmd_missing;
                self.notices.push_back(notice);
            }
        }
    }

    pub fn phase(&self) -> ShellPhase {
        if self.is_running(TaskKind::ServerInstall) {
            return ShellPhase::Installing;
        }

        if self.catalog.is_none() {
            return ShellPhase::ServersLoading;
        }

        match (self.selected_server.is_some(), self.install_dir().is_some()) {
            (true, true) => ShellPhase::ReadyToInstall,
            (true, false) => ShellPhase::ServerChosen,
            (false, true) => ShellPhase::PathChosen,
            (false, false) => ShellPhase::ChoosingServer,
        }
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn catalog_failed(&self) -> bool {
        self.catalog_failed && !self.is_running(TaskKind::CatalogFetch)
    }

    /// The catalog names matching the search box
    pub fn visible_servers(&self) -> Vec<&str> {
        let needle = self.search_buf.trim().to_lowercase();

        self.catalog
            .iter()
            .flat_map(Catalog::names)
            .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn selected_server(&self) -> Option<&str> {
        self.selected_server.as_deref()
    }

    /// Select a server by name, `None` or an unknown name clears the selection
    pub fn select_server(&mut self, name: Option<String>) {
        self.selected_server = name.filter(|name| self.catalog.as_ref().is_some_and(|catalog| catalog.contains(name)));
    }

    pub fn selected_app_id(&self) -> Option<u32> {
        let name = self.selected_server.as_deref()?;
        self.catalog.as_ref()?.app_id(name)
    }

    pub fn app_id_label(&self) -> String {
        self.selected_app_id()
            .map(|app_id| format!("Server App ID: {app_id}"))
            .unwrap_or_default()
    }

    pub fn server_combo_text(&self) -> &str {
        match (&self.catalog, &self.selected_server) {
            (None, _) => "Loading servers...",
            (Some(_), Some(name)) => name.as_str(),
            (Some(_), None) => SERVER_PLACEHOLDER,
        }
    }

    pub fn set_install_dir(&mut self, path: PathBuf) {
        self.install_dir_buf = path.display().to_string();
    }

    pub fn install_dir(&self) -> Option<PathBuf> {
        let trimmed = self.install_dir_buf.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    pub fn is_running(&self, task: TaskKind) -> bool {
        self.running.contains(&task)
    }

    pub fn can_install(&self) -> bool {
        self.phase() == ShellPhase::ReadyToInstall
    }

    /// Build the request for the current choices, or the warning explaining what is missing
    pub fn install_request(&self) -> Result<InstallRequest, Notice> {
        let Some(app_id) = self.selected_app_id() else {
            return Err(Notice::new(
                NoticeLevel::Warning,
                "Server not chosen",
                "Please choose a game server.",
            ));
        };

        let Some(install_dir) = self.install_dir() else {
            return Err(Notice::new(
                NoticeLevel::Warning,
                "Path not chosen",
                "Please choose an installation path.",
            ));
        };

        Ok(InstallRequest::new(app_id, install_dir))
    }

    pub fn install_tooltip(&self) -> String {
        let mut missing = Vec::new();

        if self.steamcmd_installed != Some(true) {
            missing.push("SteamCMD");
        }
        if self.selected_server.is_none() {
            missing.push("game server");
        }
        if self.install_dir().is_none() {
            missing.push("directory");
        }

        if missing.is_empty() {
            "You may proceed with the installation".to_string()
        } else {
            format!("Please select {}", missing.join(", "))
        }
    }

    pub fn can_install_steamcmd(&self) -> bool {
        self.steamcmd_installed == Some(false) && !self.is_running(TaskKind::SteamCmdInstall)
    }

    pub fn steamcmd_tooltip(&self) -> &'static str {
        match self.steamcmd_installed {
            Some(true) => "SteamCMD is already installed",
            Some(false) if self.is_running(TaskKind::SteamCmdInstall) => "SteamCMD is being installed",
            Some(false) => "Please install SteamCMD",
            None => "Checking for SteamCMD",
        }
    }

    /// The task whose progress the bar shows, if any
    pub fn active_install(&self) -> Option<TaskKind> {
        [TaskKind::ServerInstall, TaskKind::SteamCmdInstall]
            .into_iter()
            .find(|task| self.is_running(*task))
    }

    /// Progress of the task shown by the bar, in percent
    pub fn progress(&self) -> f32 {
        self.active_install()
            .and_then(|task| self.progress.get(&task))
            .copied()
            .unwrap_or_default()
    }

    pub fn status_line(&self) -> &str {
        self.active_install()
            .and_then(|task| self.status_lines.get(&task))
            .map_or("", String::as_str)
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }
}
