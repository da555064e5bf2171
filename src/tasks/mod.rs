// Background maintenance tasks
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const MAX_TEMP_AGE_MS: u128 = 24 * 60 * 60 * 1000;

/// Run the orphaned-upload sweeper forever. Spawned once at startup.
pub async fn run_temp_cleanup() {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = sweep_temp_uploads().await {
            tracing::warn!("Temp upload sweep failed: {}", e);
        }
    }
}

/// Delete temp uploads older than 24 hours. Upload file names carry their
/// creation time as an `_<epoch ms>` suffix; files that don't parse are
/// foreign to the upload flow and are deleted too.
pub async fn sweep_temp_uploads() -> std::io::Result<()> {
    let temp_dir = Path::new(&config::config().upload.dir).join("temp");
    if !temp_dir.exists() {
        return Ok(());
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    let mut expired: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(&temp_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match created_at_ms(&path) {
            Some(ms) if now_ms.saturating_sub(ms) <= MAX_TEMP_AGE_MS => {}
            _ => expired.push(path),
        }
    }

    if expired.is_empty() {
        return Ok(());
    }

    tracing::info!("Sweeping {} expired temp upload(s)", expired.len());
    let results = join_all(expired.iter().map(tokio::fs::remove_file)).await;
    for (path, result) in expired.iter().zip(results) {
        if let Err(e) = result {
            tracing::warn!("Failed to delete {}: {}", path.display(), e);
        }
    }
    Ok(())
}

/// Extract the epoch-millisecond suffix from `<uuid>_<epoch ms>.<ext>`.
fn created_at_ms(path: &Path) -> Option<u128> {
    let stem = path.file_stem()?.to_str()?;
    let (_, ms) = stem.rsplit_once('_')?;
    ms.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_suffix() {
        let path = Path::new("public/temp/5ab1c2_1700000000000.mp4");
        assert_eq!(created_at_ms(path), Some(1700000000000));
    }

    #[test]
    fn rejects_foreign_file_names() {
        assert_eq!(created_at_ms(Path::new("public/temp/readme.txt")), None);
        assert_eq!(created_at_ms(Path::new("public/temp/movie_final.mp4")), None);
    }
}
