use color_eyre::{eyre::eyre, Report};

use back::settings::SettingsBuilder;
use tracing_subscriber::EnvFilter;
use ui::AdsiApp;

use eframe::egui::ViewportBuilder;

mod ui;

fn main() -> Result<(), Report> {
    setup_logging()?;

    SettingsBuilder::from_current()
        .overrides(|key| std::env::var(key).ok())
        .apply();

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("ADSI - Auto Dedicated Server Installer")
            .with_inner_size([520.0, 420.0])
            .with_min_inner_size([420.0, 360.0]),
        ..eframe::NativeOptions::default()
    };

    eframe::run_native(
        "ADSI - Auto Dedicated Server Installer",
        native_options,
        Box::new(|cc| Ok(Box::new(AdsiApp::new(cc)))),
    )
    .map_err(|err| eyre!("Failed to run the window: {err}"))
}

fn setup_logging() -> Result<(), Report> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }
    color_eyre::install()?;

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    let env_filter = EnvFilter::try_from_default_env()?
        .add_directive("back=info".parse()?)
        .add_directive("steamcmd=info".parse()?);

    let subscriber_config = tracing_subscriber::fmt::fmt().with_env_filter(env_filter);

    // Log extra stuff if it's a debug build
    #[cfg(debug_assertions)]
    use tracing_subscriber::fmt::format::FmtSpan;

    #[cfg(debug_assertions)]
    let subscriber_config = subscriber_config
        .with_thread_ids(true)
        .with_span_events(FmtSpan::ENTER);

    subscriber_config.init();

    Ok(())
}
