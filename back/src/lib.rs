use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use messages::{BackendError, Frontend, Outcome, TaskKind, ToBackend, ToFrontend};
use parking_lot::Mutex;
use progress::ProgressSink;
use server::InstallRequest;
use settings::SettingsBuilder;
use steamcmd::SteamCmd;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub mod catalog;
pub mod error;
pub mod messages;
pub mod paths;
mod process;
pub mod progress;
pub mod server;
pub mod settings;
pub mod steamcmd;

pub use catalog::Catalog;
pub use error::{Error, ErrorKind};

type RunningTasks = Arc<Mutex<HashMap<TaskKind, CancellationToken>>>;

pub struct Back {
    settings: Arc<SettingsBuilder>,
    client: reqwest::Client,
    frontend: Frontend,
    front_rx: Receiver<ToBackend>,
    shutdown: CancellationToken,
    running: RunningTasks,
}

impl Back {
    pub fn new(
        settings: SettingsBuilder,
        back_tx: Sender<ToFrontend>,
        front_rx: Receiver<ToBackend>,
        egui_context: Option<egui::Context>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            client: reqwest::Client::new(),
            frontend: Frontend::new(back_tx, egui_context),
            front_rx,
            shutdown: CancellationToken::new(),
            running: RunningTasks::default(),
        }
    }

    /// Process messages from the frontend until it shuts down, blocking the calling thread
    pub fn init(self) {
        info!("Initializing backend");

        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(error) => {
                error!(%error, "Could not create the async runtime");
                self.frontend.send(ToFrontend::BackendError {
                    error: BackendError::new("Could not start the background worker", error),
                });
                return;
            }
        };
        debug!("Runtime created");

        loop {
            match self.front_rx.recv() {
                Ok(ToBackend::Startup) => {
                    self.check_steamcmd();
                    self.fetch_catalog(&rt);
                }

                Ok(ToBackend::FetchCatalog) => self.fetch_catalog(&rt),

                Ok(ToBackend::CheckSteamCmd) => self.check_steamcmd(),

                Ok(ToBackend::InstallSteamCmd) => self.install_steamcmd(&rt),

                Ok(ToBackend::InstallServer { request }) => self.install_server(&rt, request),

                Ok(ToBackend::Cancel { task }) => {
                    if let Some(token) = self.running.lock().get(&task) {
                        info!(%task, "Cancelling task");
                        token.cancel();
                    }
                }

                Ok(ToBackend::Shutdown) => {
                    info!("Shutting down backend");
                    break;
                }

                // The sender is gone, meaning the UI closed without saying goodbye
                Err(error) => {
                    warn!(%error, "Frontend channel closed");
                    break;
                }
            }
        }

        self.shutdown.cancel();
        rt.shutdown_timeout(Duration::from_secs(2));
    }

    fn check_steamcmd(&self) {
        let steamcmd = SteamCmd::from_settings(&self.settings);
        let installed = steamcmd.is_installed();
        debug!(installed, executable = %steamcmd.executable().display(), "Checked for SteamCMD");

        self.frontend.send(ToFrontend::SteamCmdStatus { installed });
    }

    fn fetch_catalog(&self, rt: &Runtime) {
        let client = self.client.clone();
        let settings = Arc::clone(&self.settings);
        let frontend = self.frontend.clone();

        self.spawn_task(
            rt,
            TaskKind::CatalogFetch,
            "There was an error contacting the Steam API",
            |_, _| async move {
                let catalog = catalog::fetch_dedicated_servers(&client, &settings.catalog_url).await?;
                frontend.send(ToFrontend::SetCatalog { catalog });
                Ok(())
            },
        );
    }

    fn install_steamcmd(&self, rt: &Runtime) {
        let client = self.client.clone();
        let settings = Arc::clone(&self.settings);
        let frontend = self.frontend.clone();

        self.spawn_task(
            rt,
            TaskKind::SteamCmdInstall,
            "There was an error installing SteamCMD",
            |sink, token| async move {
                let result = steamcmd::install(&client, &settings, &sink, &token).await;

                let installed = SteamCmd::from_settings(&settings).is_installed();
                frontend.send(ToFrontend::SteamCmdStatus { installed });

                result
            },
        );
    }

    fn install_server(&self, rt: &Runtime, request: InstallRequest) {
        let settings = Arc::clone(&self.settings);
        let frontend = self.frontend.clone();

        self.spawn_task(
            rt,
            TaskKind::ServerInstall,
            "There was an error installing the server",
            |sink, token| async move {
                let steamcmd = SteamCmd::from_settings(&settings);

                server::install(&steamcmd, &request, &settings, &sink, &token, |line| {
                    frontend.send(ToFrontend::TaskOutput {
                        task: TaskKind::ServerInstall,
                        line: line.to_string(),
                    });
                })
                .await
            },
        );
    }

    /// Run `operation` on the runtime as a cancellable task, reporting its lifecycle to the frontend
    fn spawn_task<F, Fut>(&self, rt: &Runtime, task: TaskKind, failure_message: &'static str, operation: F)
    where
        F: FnOnce(ProgressSink, CancellationToken) -> Fut,
        Fut: Future<Output = error::LibResult<()>> + Send + 'static,
    {
        let token = {
            let mut running = self.running.lock();
            if running.contains_key(&task) {
                warn!(%task, "Task is already running");
                self.frontend.send(ToFrontend::BackendError {
                    error: BackendError::new(
                        format!("A {task} is already in progress"),
                        Error::TaskAlreadyRunning(task),
                    ),
                });
                return;
            }

            let token = self.shutdown.child_token();
            running.insert(task, token.clone());
            token
        };

        let sink = ProgressSink::new(task, self.frontend.clone());
        let operation = operation(sink, token.clone());
        let frontend = self.frontend.clone();
        let running = Arc::clone(&self.running);

        rt.spawn(async move {
            info!(%task, "Task started");
            frontend.send(ToFrontend::TaskStarted { task });

            let result = tokio::select! {
                () = token.cancelled() => Err(Error::Cancelled),
                result = operation => result,
            };

            running.lock().remove(&task);

            let outcome = match result {
                Ok(()) => {
                    info!(%task, "Task completed");
                    Outcome::Completed
                }
                Err(Error::Cancelled) => {
                    info!(%task, "Task cancelled");
                    Outcome::Cancelled
                }
                Err(error) => {
                    error!(%task, %error, "Task failed");
                    Outcome::Failed(BackendError::new(failure_message, error))
                }
            };

            frontend.send(ToFrontend::TaskFinished { task, outcome });
        });
    }
}
