use std::{io, path::PathBuf};

use thiserror::Error;

use crate::messages::TaskKind;

pub type LibResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    // Catalog errors
    #[error("The Steam API at {url} answered with status {status}")]
    CatalogStatus { url: String, status: u16 },

    #[error("Could not parse the Steam API response: {0}")]
    CatalogParse(#[source] serde_json::Error),

    // SteamCMD errors
    #[error("Could not download {url}")]
    Download {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error("Could not extract {}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("SteamCMD is not installed at {}", .0.display())]
    SteamCmdMissing(PathBuf),

    #[error("{program} exited with {}", .code.map_or("no exit code".to_string(), |code| format!("code {code}")))]
    UnexpectedExitCode {
        program: String,
        code: Option<i32>,
        output: String,
    },

    // Task handling errors
    #[error("The operation was cancelled")]
    Cancelled,

    #[error("A {0} task is already running")]
    TaskAlreadyRunning(TaskKind),

    #[error("Error while managing asynchronous tasks")]
    TaskJoinError(#[from] tokio::task::JoinError),

    // Shared errors
    #[error("Encountered an I/O error: {}", .0)]
    IoError(#[from] io::Error),

    #[error("Unable to fetch {item}")]
    ReqwestError { inner: reqwest::Error, item: String },
}

/// The broad class an [`Error`] belongs to, used to pick dialog titles and in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Download,
    Extract,
    Process,
    Io,
    Cancelled,
    Busy,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CatalogStatus { .. } | Self::ReqwestError { .. } => ErrorKind::Network,
            Self::CatalogParse(_) => ErrorKind::Parse,
            Self::Download { .. } => ErrorKind::Download,
            Self::Extract { .. } => ErrorKind::Extract,
            Self::SteamCmdMissing(_) | Self::UnexpectedExitCode { .. } => ErrorKind::Process,
            Self::IoError(_) | Self::TaskJoinError(_) => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::TaskAlreadyRunning(_) => ErrorKind::Busy,
        }
    }

    /// Captured process output, if the error carries any
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::UnexpectedExitCode { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let item = err.url().map_or("Unknown".to_string(), |url| url.as_str().to_string());
        Self::ReqwestError { inner: err, item }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("the server answered with status {0}")]
    Status(u16),

    #[error("the transfer failed")]
    Request(#[from] reqwest::Error),

    #[error("could not write the archive to disk")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unsupported archive format: {0}")]
    Unsupported(String),

    #[error("could not read the zip file")]
    Zip(#[from] zip::result::ZipError),

    #[error("could not write the extracted files")]
    Io(#[from] io::Error),
}
