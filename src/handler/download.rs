use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    platform::{MediaMetadata, StatKind},
    service::{ad::GateOutcome, gallery::SaveOutcome},
    state::AppState,
};

pub(super) async fn handle_fetch(state: &AppState, url: &str, cancel: &CancellationToken) -> AppResult<Vec<String>> {
    let metadata = state.services.metadata.fetch(url, cancel).await?;
    Ok(describe(&metadata))
}

pub(super) async fn handle_download(
    state: &AppState,
    url: &str,
    index: usize,
    cancel: &CancellationToken,
) -> AppResult<Vec<String>> {
    let metadata = state.services.metadata.fetch(url, cancel).await?;

    if metadata.variants.is_empty() {
        return Ok(vec![t!("messages.no_variants").to_string()]);
    }
    let variant = metadata.variants.get(index).cloned().ok_or_else(|| {
        AppError::Usage(format!(
            "variant {} not found, {} available",
            index,
            metadata.variants.len()
        ))
    })?;

    let variant = match state.services.rewarded_gate.run(variant, cancel).await? {
        GateOutcome::Download { pending, .. } => pending,
        GateOutcome::Cancelled { reason, .. } => {
            info!("Download of {} dropped by ad gate: {:?}", index, reason);
            return Ok(vec![t!("messages.ad_cancelled").to_string()]);
        }
    };

    let mut lines = vec![t!("messages.downloading", label = variant.label).to_string()];
    let saved = state.services.download.download(&metadata, &variant, cancel).await?;

    lines.push(match saved.outcome {
        SaveOutcome::SavedToAlbum { album, .. } => t!("messages.saved_to_album", album = album).to_string(),
        SaveOutcome::Shared { .. } => t!("messages.shared").to_string(),
        SaveOutcome::PathReported { path } => t!("messages.path_reported", path = path.display()).to_string(),
    });
    Ok(lines)
}

fn describe(metadata: &MediaMetadata) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", metadata.author.name, metadata.author.handle),
        format!("{} · {}", metadata.platform, metadata.date),
    ];

    if let Some(tag) = &metadata.tag {
        lines.push(tag.clone());
    }

    let stats = [
        (StatKind::Views, "views"),
        (StatKind::Likes, "likes"),
        (StatKind::Comments, "comments"),
        (StatKind::Shares, "shares"),
    ]
    .iter()
    .filter_map(|(kind, name)| metadata.stat(*kind).map(|value| format!("{} {}", value, name)))
    .collect::<Vec<_>>();
    if !stats.is_empty() {
        lines.push(stats.join("  "));
    }

    if metadata.variants.is_empty() {
        lines.push(t!("messages.no_variants").to_string());
    }
    for (index, variant) in metadata.variants.iter().enumerate() {
        lines.push(format!("[{}] {}", index, variant.label));
    }
    lines
}
