use std::thread;

use back::{
    messages::{TaskKind, ToBackend, ToFrontend},
    settings::SettingsBuilder,
    Back,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::{
    egui::{
        style::DebugOptions, Align, Button, CentralPanel, ComboBox, Context, Layout, ProgressBar, RichText,
        ScrollArea, Spinner, Style, TextEdit, TopBottomPanel, Ui, Vec2, Widget,
    },
    CreationContext,
};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use self::{
    app_theme::AppTheme,
    state::{ShellState, DIRECTORY_PLACEHOLDER, SERVER_PLACEHOLDER},
    widgets::screen_prompt::ScreenPrompt,
};

mod app_theme;
mod state;
mod widgets;

static THEME: Lazy<AppTheme> = Lazy::new(AppTheme::default);

const SERVER_COMBO_WIDTH: f32 = 320.0;

pub struct AdsiApp {
    state: ShellState,

    // Data transferring
    front_tx: Sender<ToBackend>,
    back_rx: Receiver<ToFrontend>,
}

impl AdsiApp {
    pub fn new(cc: &CreationContext) -> Self {
        let (front_tx, front_rx) = crossbeam_channel::unbounded();
        let (back_tx, back_rx) = crossbeam_channel::unbounded();

        let settings = SettingsBuilder::from_current();
        let frame_clone = cc.egui_ctx.clone();
        thread::spawn(move || {
            Back::new(settings, back_tx, front_rx, Some(frame_clone)).init();
        });

        Self::configure_style(&cc.egui_ctx);

        let new_app = Self {
            state: ShellState::default(),
            front_tx,
            back_rx,
        };

        new_app.send(ToBackend::Startup);

        new_app
    }

    fn send(&self, message: ToBackend) {
        if self.front_tx.send(message).is_err() {
            warn!("Backend is gone, dropping message");
        }
    }
}

impl eframe::App for AdsiApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        for message in self.back_rx.try_iter() {
            self.state.apply(message);
        }

        self.render_footer(ctx);

        self.render_central_panel(ctx);

        self.render_notice(ctx);
    }
}

impl Drop for AdsiApp {
    fn drop(&mut self) {
        debug!("Window closed, shutting down backend");
        self.send(ToBackend::Shutdown);
    }
}

impl AdsiApp {
    fn render_central_panel(&mut self, ctx: &Context) {
        CentralPanel::default()
            .frame(THEME.default_panel_frame)
            .show(ctx, |ui| {
                ui.style_mut().spacing.item_spacing = THEME.spacing.widget_spacing;

                ui.vertical_centered(|ui| {
                    ui.heading("Auto Dedicated Server Installer");
                });

                ui.add_space(THEME.spacing.large);

                self.render_server_choice(ui);

                ui.label(RichText::new(self.state.app_id_label()).color(THEME.colors.lighter_gray));

                ui.add_space(THEME.spacing.large);

                self.render_directory_choice(ui);

                ui.add_space(THEME.spacing.large);

                self.render_install(ui);
            });
    }

    fn render_server_choice(&mut self, ui: &mut Ui) {
        ui.label("Game Server");

        let installing = self.state.is_running(TaskKind::ServerInstall);
        let loaded = self.state.catalog().is_some();

        ui.horizontal(|ui| {
            let edit = TextEdit::singleline(&mut self.state.search_buf)
                .hint_text(RichText::new("Search servers").color(THEME.colors.lighter_gray))
                .desired_width(SERVER_COMBO_WIDTH);
            ui.add_enabled(loaded && !installing, edit);
        });

        ui.horizontal(|ui| {
            let mut choice = None;

            ui.add_enabled_ui(loaded && !installing, |ui| {
                ComboBox::from_id_salt("server-combo")
                    .width(SERVER_COMBO_WIDTH)
                    .selected_text(self.state.server_combo_text())
                    .show_ui(ui, |ui| {
                        if ui
                            .selectable_label(self.state.selected_server().is_none(), SERVER_PLACEHOLDER)
                            .clicked()
                        {
                            choice = Some(None);
                        }

                        let selected = self.state.selected_server();
                        for name in self.state.visible_servers() {
                            if ui.selectable_label(selected == Some(name), name).clicked() {
                                choice = Some(Some(name.to_string()));
                            }
                        }
                    });
            });

            if let Some(choice) = choice {
                self.state.select_server(choice);
            }

            if self.state.is_running(TaskKind::CatalogFetch) {
                Spinner::new().size(14.0).ui(ui);
            } else if self.state.catalog_failed() && ui.button("Retry").clicked() {
                self.send(ToBackend::FetchCatalog);
            }
        });
    }

    fn render_directory_choice(&mut self, ui: &mut Ui) {
        ui.label("Installation Directory");

        let installing = self.state.is_running(TaskKind::ServerInstall);

        ui.horizontal(|ui| {
            let edit = TextEdit::singleline(&mut self.state.install_dir_buf)
                .hint_text(RichText::new(DIRECTORY_PLACEHOLDER).color(THEME.colors.lighter_gray))
                .desired_width(SERVER_COMBO_WIDTH);
            ui.add_enabled(!installing, edit);

            if ui.add_enabled(!installing, Button::new("Browse")).clicked() {
                if let Some(path) = rfd::FileDialog::new().set_title(DIRECTORY_PLACEHOLDER).pick_folder() {
                    self.state.set_install_dir(path);
                }
            }
        });
    }

    fn render_install(&mut self, ui: &mut Ui) {
        let tooltip = self.state.install_tooltip();

        let install_res = ui
            .add_enabled(self.state.can_install(), Button::new("Install Server").min_size(Vec2::new(140.0, 28.0)))
            .on_hover_text(&tooltip)
            .on_disabled_hover_text(&tooltip);

        if install_res.clicked() {
            match self.state.install_request() {
                Ok(request) => self.send(ToBackend::InstallServer { request }),
                Err(notice) => self.state.push_notice(notice),
            }
        }

        if let Some(task) = self.state.active_install() {
            ui.horizontal(|ui| {
                let bar = ProgressBar::new(self.state.progress() / 100.0)
                    .show_percentage()
                    .desired_width(SERVER_COMBO_WIDTH);
                ui.add(bar);

                if ui.button("Cancel").clicked() {
                    self.send(ToBackend::Cancel { task });
                }
            });

            if !self.state.status_line().is_empty() {
                ui.label(RichText::new(self.state.status_line()).small().color(THEME.colors.lighter_gray));
            }
        }
    }

    fn render_footer(&mut self, ctx: &Context) {
        TopBottomPanel::bottom("footer")
            .frame(THEME.default_panel_frame)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    let tooltip = self.state.steamcmd_tooltip();

                    let button_res = ui
                        .add_enabled(self.state.can_install_steamcmd(), Button::new("Install SteamCMD"))
                        .on_hover_text(tooltip)
                        .on_disabled_hover_text(tooltip);

                    if button_res.clicked() {
                        self.send(ToBackend::InstallSteamCmd);
                    }
                });
            });
    }

    fn render_notice(&mut self, ctx: &Context) {
        let Some(notice) = self.state.current_notice() else {
            return;
        };

        let dismissed = ScreenPrompt::new("notice").show(ctx, |ui| {
            ui.label(
                RichText::new(&notice.title)
                    .heading()
                    .color(THEME.notice_color(notice.level)),
            );
            ui.label(&notice.message);

            if let Some(details) = &notice.details {
                ui.collapsing("Details", |ui| {
                    ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                        ui.monospace(details);
                    });
                });
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| ui.button("OK").clicked())
                .inner
        });

        if dismissed {
            let recheck = self.state.dismiss_notice().is_some_and(|notice| notice.recheck_steamcmd);
            if recheck {
                self.send(ToBackend::CheckSteamCmd);
            }
        }
    }
}

impl AdsiApp {
    fn configure_style(ctx: &Context) {
        let style = Style {
            visuals: THEME.visuals.clone(),
            debug: DebugOptions::default(),
            ..Style::default()
        };

        ctx.set_style(style);
    }
}
