use std::fmt;

use crossbeam_channel::Sender;
use tracing::debug;

use crate::{catalog::Catalog, error::Error, server::InstallRequest};

pub enum ToBackend {
    /// Fetch the catalog and check whether SteamCMD is installed
    Startup,

    FetchCatalog,

    CheckSteamCmd,

    InstallSteamCmd,

    InstallServer { request: InstallRequest },

    Cancel { task: TaskKind },

    Shutdown,
}

pub enum ToFrontend {
    SetCatalog { catalog: Catalog },

    SteamCmdStatus { installed: bool },

    TaskStarted { task: TaskKind },

    TaskProgress { task: TaskKind, value: f32 },

    TaskOutput { task: TaskKind, line: String },

    TaskFinished { task: TaskKind, outcome: Outcome },

    BackendError { error: BackendError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    CatalogFetch,
    SteamCmdInstall,
    ServerInstall,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CatalogFetch => "catalog fetch",
            Self::SteamCmdInstall => "SteamCMD installation",
            Self::ServerInstall => "server installation",
        };

        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed(BackendError),
}

#[derive(Debug)]
pub struct BackendError {
    // What the user is shown
    pub message: String,

    // The underlying cause
    pub error: Error,
}

impl BackendError {
    pub fn new(message: impl Into<String>, error: impl Into<Error>) -> Self {
        Self {
            message: message.into(),
            error: error.into(),
        }
    }
}

/// Sending half of the back-end → UI channel, paired with the egui context so every message triggers a repaint
#[derive(Clone)]
pub struct Frontend {
    back_tx: Sender<ToFrontend>,
    egui_context: Option<egui::Context>,
}

impl Frontend {
    pub fn new(back_tx: Sender<ToFrontend>, egui_context: Option<egui::Context>) -> Self {
        Self { back_tx, egui_context }
    }

    pub fn send(&self, message: ToFrontend) {
        // The only reason this fails is the UI having shut down, at which point nobody is listening anyway
        if self.back_tx.send(message).is_err() {
            debug!("Frontend channel closed, dropping message");
        }

        if let Some(context) = &self.egui_context {
            context.request_repaint();
        }
    }
}
