use crate::{
    error::AppResult,
    service::gallery::{format_asset_date, format_duration},
    state::AppState,
};

pub(super) async fn handle_list(state: &AppState) -> AppResult<Vec<String>> {
    let videos = state.services.gallery.list_videos().await?;
    if videos.is_empty() {
        return Ok(vec![t!("messages.no_videos").to_string()]);
    }

    Ok(videos
        .iter()
        .map(|asset| {
            let duration = asset.duration_secs.map(format_duration).unwrap_or_default();
            format!(
                "{}  {}  {}",
                asset.filename,
                duration,
                format_asset_date(asset.created_at_ms)
            )
            .trim_end()
            .to_string()
        })
        .collect())
}
