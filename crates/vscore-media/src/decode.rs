//! Segment frame decoding through the FFmpeg CLI.
//!
//! Each call spawns its own FFmpeg process that seeks to the segment start and
//! pipes `rgb24` rawvideo to stdout, so concurrent segments never share a
//! decoder.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::probe::{probe_video, VideoInfo};

/// A source of decoded segment frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Stream facts needed to plan segments.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Decode up to `num_frames` frames starting at `start_frame`.
    ///
    /// Returns fewer frames when the stream ends early.
    async fn read_segment(
        &self,
        path: &Path,
        info: &VideoInfo,
        start_frame: u64,
        num_frames: usize,
    ) -> MediaResult<Vec<Frame>>;
}

/// Output size when downscaling to `target_width`, keeping aspect and an even
/// height. Sources narrower than the target keep their size.
pub fn analysis_dimensions(width: u32, height: u32, target_width: Option<u32>) -> (u32, u32) {
    match target_width {
        Some(target) if target > 0 && target < width => {
            let scaled = height as f64 * target as f64 / width as f64;
            let even = ((scaled / 2.0).round() as u32 * 2).max(2);
            (target, even)
        }
        _ => (width, height),
    }
}

/// FFmpeg-backed [`FrameSource`].
///
/// FFmpeg applies the stream's display rotation while decoding, so frames of
/// a stream rotated by a quarter turn come out with width and height swapped
/// relative to the coded size.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSource {
    /// Downscale frames to this width before analysis
    analysis_width: Option<u32>,
}

impl FfmpegSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analysis_width(mut self, width: Option<u32>) -> Self {
        self.analysis_width = width;
        self
    }

    pub fn analysis_width(&self) -> Option<u32> {
        self.analysis_width
    }

    fn build_command(
        &self,
        path: &Path,
        info: &VideoInfo,
        start_frame: u64,
        num_frames: usize,
    ) -> Command {
        let (display_width, display_height) = info.display_dimensions();
        let (width, height) = analysis_dimensions(display_width, display_height, self.analysis_width);
        let start_time = start_frame as f64 / info.fps;

        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-ss",
            &format!("{:.6}", start_time),
            "-i",
        ])
        .arg(path)
        .args(["-frames:v", &num_frames.to_string()]);
        if (width, height) != (display_width, display_height) {
            cmd.args(["-vf", &format!("scale={}:{}", width, height)]);
        }
        cmd.args(["-pix_fmt", "rgb24", "-f", "rawvideo", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl FrameSource for FfmpegSource {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        let info = probe_video(path).await?;
        info.validate()?;
        Ok(info)
    }

    async fn read_segment(
        &self,
        path: &Path,
        info: &VideoInfo,
        start_frame: u64,
        num_frames: usize,
    ) -> MediaResult<Vec<Frame>> {
        if num_frames == 0 {
            return Ok(Vec::new());
        }
        info.validate()?;
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let (display_width, display_height) = info.display_dimensions();
        let (width, height) = analysis_dimensions(display_width, display_height, self.analysis_width);
        let mut cmd = self.build_command(path, info, start_frame, num_frames);

        debug!(
            path = %path.display(),
            start_frame,
            num_frames,
            width,
            height,
            rotation = info.rotation,
            "Decoding segment"
        );

        let output = cmd.output().await.map_err(|e| {
            MediaError::ffmpeg_failed(format!("Failed to run FFmpeg: {}", e), None, None)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if output.stdout.is_empty() {
                return Err(MediaError::ffmpeg_failed(
                    "FFmpeg decode failed",
                    Some(stderr),
                    output.status.code(),
                ));
            }
            warn!(
                path = %path.display(),
                exit_code = ?output.status.code(),
                "FFmpeg returned non-zero status after producing frames"
            );
        }

        let frames = split_frames(output.stdout, width, height, start_frame)?;
        debug!(frames = frames.len(), "Segment decoded");
        Ok(frames)
    }
}

/// Split a packed `rgb24` stream into frames; a trailing partial frame is dropped.
fn split_frames(buffer: Vec<u8>, width: u32, height: u32, start_frame: u64) -> MediaResult<Vec<Frame>> {
    let bytes_per_frame = width as usize * height as usize * 3;
    if bytes_per_frame == 0 {
        return Err(MediaError::InvalidFrame("zero-sized frame".to_string()));
    }
    let count = buffer.len() / bytes_per_frame;
    let mut frames = Vec::with_capacity(count);
    for (i, chunk) in buffer.chunks_exact(bytes_per_frame).enumerate() {
        let frame = Frame::from_rgb24(i, width, height, chunk.to_vec()).map_err(|e| {
            MediaError::InvalidFrame(format!("frame {}: {}", start_frame + i as u64, e))
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            duration: 3.0,
            width,
            height,
            fps: 30.0,
            total_frames: 90,
            codec: "h264".to_string(),
            rotation: 0,
        }
    }

    #[test]
    fn test_analysis_dimensions() {
        assert_eq!(analysis_dimensions(1920, 1080, Some(640)), (640, 360));
        assert_eq!(analysis_dimensions(1920, 1080, None), (1920, 1080));
        assert_eq!(analysis_dimensions(320, 240, Some(640)), (320, 240));
        // 1000x563 at 500 -> 281.5 -> even 282
        assert_eq!(analysis_dimensions(1000, 563, Some(500)), (500, 282));
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_command_seeks_and_scales() {
        let source = FfmpegSource::new().with_analysis_width(Some(640));
        let cmd = source.build_command(Path::new("clip.mp4"), &info(1920, 1080), 45, 30);
        let joined = args(&cmd).join(" ");
        assert!(joined.contains("-i clip.mp4"));
        assert!(joined.contains("-ss 1.500000"));
        assert!(joined.contains("-frames:v 30"));
        assert!(joined.contains("scale=640:360"));
        assert!(joined.ends_with("-pix_fmt rgb24 -f rawvideo -"));
    }

    #[test]
    fn test_command_without_scaling() {
        let cmd = FfmpegSource::new().build_command(Path::new("clip.mp4"), &info(320, 240), 0, 30);
        assert!(!args(&cmd).iter().any(|a| a == "-vf"));
    }

    #[test]
    fn test_rotated_stream_scales_display_size() {
        let portrait = VideoInfo {
            rotation: 90,
            ..info(1920, 1080)
        };
        let source = FfmpegSource::new().with_analysis_width(Some(540));
        let joined = args(&source.build_command(Path::new("clip.mp4"), &portrait, 0, 30)).join(" ");
        assert!(joined.contains("scale=540:960"), "{}", joined);

        // no downscale requested, no scale filter needed
        let cmd = FfmpegSource::new().build_command(Path::new("clip.mp4"), &portrait, 0, 30);
        assert!(!args(&cmd).iter().any(|a| a == "-vf"));
    }

    #[test]
    fn test_rotated_frames_split_at_display_size() {
        let portrait = VideoInfo {
            rotation: 270,
            ..info(4, 2)
        };
        let (width, height) = portrait.display_dimensions();
        let buffer = vec![0u8; 4 * 2 * 3 * 2];
        let frames = split_frames(buffer, width, height, 0).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].width(), frames[0].height()), (2, 4));
    }

    #[test]
    fn test_split_frames_drops_partial_tail() {
        let bytes_per_frame = 4 * 2 * 3;
        let buffer = vec![7u8; bytes_per_frame * 2 + 5];
        let frames = split_frames(buffer, 4, 2, 10).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].index(), 1);
        assert_eq!(frames[0].rgb().get_pixel(0, 0).0, [7, 7, 7]);
    }

    #[tokio::test]
    async fn test_zero_frames_is_empty() {
        let frames = FfmpegSource::new()
            .read_segment(Path::new("/nonexistent.mp4"), &info(64, 48), 0, 0)
            .await
            .unwrap();
        assert!(frames.is_empty());
    }
}
