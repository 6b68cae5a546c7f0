use crate::{error::AppResult, service::Language, state::AppState};

pub(super) async fn handle_wifi_only(state: &AppState, enabled: bool) -> AppResult<Vec<String>> {
    state.services.settings.set_wifi_only(enabled).await?;
    Ok(vec![wifi_only_line(enabled)])
}

pub(super) async fn handle_language(state: &AppState, language: Option<Language>) -> AppResult<Vec<String>> {
    match language {
        None => Ok(language_menu(state.services.language.get_language().await)),
        Some(language) => {
            state.services.language.set_language(language).await?;
            Ok(vec![t!(
                "messages.language_set",
                locale = language.code(),
                language = language.label()
            )
            .to_string()])
        }
    }
}

pub(super) async fn handle_status(state: &AppState) -> AppResult<Vec<String>> {
    let services = &state.services;
    let language = services.language.current().await;

    let mut lines = vec![
        wifi_only_line(services.settings.wifi_only()),
        t!(
            "messages.language_current",
            language = format!("{} ({})", language.label(), language.code())
        )
        .to_string(),
    ];

    match services.download.permission_status().await {
        Ok(response) => {
            let status = format!("{:?}", response.status).to_lowercase();
            lines.push(t!("messages.permission_status", status = status).to_string());
        }
        Err(e) => warn!("Failed to read permission status: {}", e),
    }

    let count = services.gallery.video_count().await?;
    lines.push(t!("messages.video_count", count = count).to_string());
    Ok(lines)
}

/// The language picker, the current choice marked with `*`.
pub(super) fn language_menu(current: Option<Language>) -> Vec<String> {
    let mut lines = vec![t!("messages.choose_language").to_string()];
    lines.extend(Language::ALL.iter().map(|language| {
        let marker = if Some(*language) == current { "*" } else { " " };
        format!("{} {}  {}", marker, language.code(), language.label())
    }));
    lines
}

fn wifi_only_line(enabled: bool) -> String {
    if enabled {
        t!("messages.wifi_only_on").to_string()
    } else {
        t!("messages.wifi_only_off").to_string()
    }
}
