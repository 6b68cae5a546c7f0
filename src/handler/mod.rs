mod download;
mod gallery;
mod settings;

use tokio_util::sync::CancellationToken;

use crate::{
    command::Command,
    error::AppResult,
    service::{language::StartupRoute, Language},
    state::AppState,
};

/// Runs one command and returns the lines to show the user.
pub async fn execute(state: &AppState, command: Command, cancel: &CancellationToken) -> AppResult<Vec<String>> {
    info!("Executing {:?}", command);

    match command {
        Command::Fetch { url } => download::handle_fetch(state, &url, cancel).await,
        Command::Download { url, variant } => download::handle_download(state, &url, variant, cancel).await,
        Command::List => gallery::handle_list(state).await,
        Command::WifiOnly { enabled } => settings::handle_wifi_only(state, enabled).await,
        Command::Language { language } => settings::handle_language(state, language).await,
        Command::Status => settings::handle_status(state).await,
    }
}

/// App launch: resolves the startup route, warms up the media permission and
/// gives the app-open ad its chance. Returns the language prompt when the
/// user has to pick a language before anything else.
pub async fn on_launch(state: &AppState, command: &Command) -> Option<Vec<String>> {
    let route = state.services.language.startup_route().await;
    if route == StartupRoute::LanguageSelection && !matches!(command, Command::Language { language: Some(_) }) {
        info!("No language chosen yet, routing to language selection");
        return Some(settings::language_menu(None));
    }

    state.services.download.warm_up_permission().await;

    if let Err(e) = state.services.app_open_ad.on_foreground().await {
        warn!("App-open ad failed: {}", e);
    }

    None
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::{build_config, AppConfig},
        service::{ad::NoAds, device::ConnectionType, Collaborators},
        storage::MemoryStore,
        utils::test::{FakeHttpClient, FakeMediaLibrary, FakeNetwork, FakePermissions, FakeShareSheet},
    };

    pub(crate) struct Harness {
        pub state: AppState,
        pub http: Arc<FakeHttpClient>,
        pub library: Arc<FakeMediaLibrary>,
        _temp: tempfile::TempDir,
    }

    pub(crate) async fn harness(http: FakeHttpClient, first_run: &str) -> Harness {
        let temp = tempfile::tempdir().unwrap();
        let temp_dir = temp.path().join("temp").to_string_lossy().into_owned();
        let first_run = first_run.to_string();
        let config: AppConfig = build_config(|key| match key {
            "SSDOWN_TEMP_DIR" => Some(temp_dir.clone()),
            "SSDOWN_LANGUAGE_FIRST_RUN" => Some(first_run.clone()),
            _ => None,
        })
        .unwrap();

        let http = Arc::new(http);
        let library = Arc::new(FakeMediaLibrary::new());
        let deps = Collaborators {
            http: http.clone(),
            store: Arc::new(MemoryStore::new()),
            network: Arc::new(FakeNetwork::new(ConnectionType::Cellular)),
            permissions: Arc::new(FakePermissions::granted()),
            library: library.clone(),
            share_sheet: Arc::new(FakeShareSheet::unavailable()),
            ads: Arc::new(NoAds),
        };

        Harness {
            state: AppState::new(config, deps).await,
            http,
            library,
            _temp: temp,
        }
    }

    #[tokio::test]
    async fn test_first_launch_prompts_for_language() {
        let h = harness(FakeHttpClient::new(), "prompt").await;

        let prompt = on_launch(&h.state, &Command::Status).await.unwrap();
        assert_eq!(prompt.len(), 1 + Language::ALL.len());

        // picking a language is allowed through
        let pick = Command::Language {
            language: Some(Language::French),
        };
        assert!(on_launch(&h.state, &pick).await.is_none());
        execute(&h.state, pick, &CancellationToken::new()).await.unwrap();
        assert!(on_launch(&h.state, &Command::Status).await.is_none());
    }

    #[tokio::test]
    async fn test_default_english_skips_prompt() {
        let h = harness(FakeHttpClient::new(), "default_english").await;
        assert!(on_launch(&h.state, &Command::List).await.is_none());
        // the app-open ad had no fill, so the cooldown was not started
        assert!(h.state.services.cooldown.last_shown().await.unwrap().is_none());
    }
}
