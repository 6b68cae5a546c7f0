use std::process::ExitCode;

use clap::Parser;
use ssdown::{
    command::Cli,
    config::AppConfig,
    error::AppResult,
    handler,
    service::Language,
    state::AppState,
};
use tokio_util::sync::CancellationToken;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            let language = match AppState::get() {
                Ok(state) => state.services.language.current().await,
                Err(_) => Language::default(),
            };
            let alert = e.alert(language);
            eprintln!("{}: {}", alert.title, alert.message);
            if alert.offer_settings {
                if let Ok(state) = AppState::get() {
                    if let Err(e) = state.services.download.open_settings().await {
                        warn!("Failed to open settings: {}", e);
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let command = Cli::parse().command;

    let config = AppConfig::from_env()?;
    AppConfig::set_global(config.clone())?;
    AppState::init(config).await?;
    let state = AppState::get()?;

    rust_i18n::set_locale(state.services.language.current().await.code());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            on_ctrl_c.cancel();
        }
    });

    if let Some(prompt) = handler::on_launch(&state, &command).await {
        print_lines(&prompt);
        return Ok(());
    }

    let lines = handler::execute(&state, command, &cancel).await?;
    print_lines(&lines);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
