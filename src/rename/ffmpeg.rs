//! FFmpeg subprocess wrapper.
//!
//! Stamps metadata tags onto a media file without re-encoding
//! (`-map 0 -c copy`).

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::database::MediaMeta;

use super::RenameError;

/// Copy `input` to `output` with the user's metadata tags applied.
///
/// Streams are copied, never transcoded, so this is I/O bound and fast.
pub async fn stamp_metadata(
    input: &Path,
    output: &Path,
    meta: &MediaMeta,
) -> Result<(), RenameError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-map")
        .arg("0")
        .arg("-c")
        .arg("copy");

    for (tag, value) in meta.tags() {
        cmd.arg("-metadata").arg(format!("{}={}", tag, value));
    }

    cmd.arg("-y").arg(output);

    debug!("Running ffmpeg for {:?}", input);
    let result = cmd
        .output()
        .await
        .map_err(|e| RenameError::Ffmpeg(format!("failed to spawn ffmpeg: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(RenameError::Ffmpeg(stderr.trim().to_string()));
    }

    Ok(())
}
