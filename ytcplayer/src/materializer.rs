//! Turning a clip selection into a playable resource.

use crate::{Error, PlayableResource, Result, TempFileResource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;
use ytccatalog::ClipSelection;

/// Produces a ready-to-play resource for a selection.
#[async_trait]
pub trait ResourceMaterializer: Send + Sync {
    async fn materialize(&self, selection: &ClipSelection) -> Result<Box<dyn PlayableResource>>;
}

/// Cuts clips out of the cached `<media_dir>/<id>.opus` files with ffmpeg.
///
/// The clip is re-encoded to Ogg/Opus with the configured volume applied and
/// written to `output_dir`; the resulting file is deleted after playback.
#[derive(Debug, Clone)]
pub struct FfmpegMaterializer {
    media_dir: PathBuf,
    output_dir: PathBuf,
    volume: f64,
    ffmpeg: PathBuf,
}

impl FfmpegMaterializer {
    pub fn new(media_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, volume: f64) -> Self {
        Self {
            media_dir: media_dir.into(),
            output_dir: output_dir.into(),
            volume,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }

    /// Uses another ffmpeg binary than the one on `PATH`.
    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    pub fn source_path(&self, selection: &ClipSelection) -> PathBuf {
        self.media_dir.join(format!("{}.opus", selection.item.id))
    }

    /// `<id>-<start>-<length>-<tag>.ogg`; the tag keeps two identical
    /// draws from sharing (and deleting) the same file.
    pub fn output_path(&self, selection: &ClipSelection) -> PathBuf {
        let tag = Uuid::new_v4().simple().to_string();
        self.output_dir.join(format!(
            "{}-{}-{}-{}.ogg",
            selection.item.id,
            selection.start_offset_secs,
            selection.actual_length_secs,
            &tag[..8]
        ))
    }

    pub fn build_args(&self, input: &Path, output: &Path, selection: &ClipSelection) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-ss".to_string(),
            selection.start_offset_secs.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-t".to_string(),
            selection.actual_length_secs.to_string(),
            "-af".to_string(),
            format!("volume={}", self.volume),
            "-c:a".to_string(),
            "libopus".to_string(),
            "-f".to_string(),
            "ogg".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl ResourceMaterializer for FfmpegMaterializer {
    async fn materialize(&self, selection: &ClipSelection) -> Result<Box<dyn PlayableResource>> {
        let input = self.source_path(selection);
        if !tokio::fs::try_exists(&input).await.unwrap_or(false) {
            return Err(Error::Materialization(format!(
                "source file missing: {}",
                input.display()
            )));
        }

        let output = self.output_path(selection);
        let args = self.build_args(&input, &output, selection);
        debug!(item = %selection.item.id, output = %output.display(), "Running ffmpeg");

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Materialization(format!("cannot run ffmpeg: {}", e)))?;

        if !result.status.success() {
            // Fichier partiel éventuel
            if let Err(e) = tokio::fs::remove_file(&output).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(output = %output.display(), "Failed to remove partial clip: {}", e);
                }
            }
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Materialization(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(Box::new(TempFileResource::new(output)))
    }
}
