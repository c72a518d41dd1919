//! Index builder.
//!
//! Videos are indexed one after another. Within a video every segment is
//! decoded by its own FFmpeg process and scored on the blocking pool, with a
//! semaphore bounding how many segments are in flight. A failing segment is
//! skipped; a failing video is recorded with `indexed = false`. Neither stops
//! the run.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use vscore_media::{
    plan_segments, FeatureExtractor, FfmpegSource, FrameSource, SegmentProcessor, SegmentSpan,
    VideoInfo,
};
use vscore_models::{VideoIndex, VideoMetadata, VideoSegment};

use crate::config::IndexerConfig;
use crate::discovery::discover_videos;
use crate::error::{IndexerError, IndexerResult};
use crate::logging::VideoLogger;
use crate::metrics;

/// One video's indexing outcome.
#[derive(Debug, Clone)]
pub struct IndexedVideo {
    pub metadata: VideoMetadata,
    pub segments: Vec<VideoSegment>,
}

/// Builds a [`VideoIndex`] from a folder of videos.
pub struct VideoIndexer<S = FfmpegSource> {
    config: IndexerConfig,
    source: S,
    processor: SegmentProcessor,
    segment_permits: Arc<Semaphore>,
    run_id: String,
}

impl VideoIndexer<FfmpegSource> {
    /// Indexer decoding through FFmpeg with the configured extractor.
    pub fn new(config: IndexerConfig) -> IndexerResult<Self> {
        let source = FfmpegSource::new().with_analysis_width(config.analysis_width);
        Self::with_source(config, source)
    }
}

impl<S: FrameSource> VideoIndexer<S> {
    pub fn with_source(config: IndexerConfig, source: S) -> IndexerResult<Self> {
        config.validate()?;
        let extractor = config.extractor.build()?;
        Self::with_extractor(config, source, extractor)
    }

    pub fn with_extractor(
        config: IndexerConfig,
        source: S,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> IndexerResult<Self> {
        config.validate()?;
        let processor = SegmentProcessor::new(&config.analysis, extractor);
        Ok(Self {
            segment_permits: Arc::new(Semaphore::new(config.max_parallel_segments)),
            config,
            source,
            processor,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Index every video in `input_folder` and write the result to `output`.
    pub async fn run(
        &self,
        input_folder: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> IndexerResult<VideoIndex> {
        let index = self.build_index(input_folder).await?;
        write_index(&index, output).await?;
        Ok(index)
    }

    /// Index every video in `input_folder`.
    pub async fn build_index(&self, input_folder: impl AsRef<Path>) -> IndexerResult<VideoIndex> {
        let input_folder = input_folder.as_ref();
        let videos = discover_videos(input_folder).await?;
        let started = Instant::now();

        info!(
            run_id = %self.run_id,
            started_at = %Utc::now().to_rfc3339(),
            folder = %input_folder.display(),
            videos = videos.len(),
            extractor = self.processor.extractor_name(),
            segment_duration = self.config.segment_duration,
            "Indexing run started"
        );

        let mut metadata = BTreeMap::new();
        let mut segments = Vec::new();
        for path in &videos {
            let outcome = self.index_video(path).await;
            metadata.insert(file_name(path), outcome.metadata);
            segments.extend(outcome.segments);
        }

        let index = VideoIndex::new(
            self.config.segment_duration,
            Some(self.config.analysis.sampling.info()),
            metadata,
            segments,
        );
        info!(
            run_id = %self.run_id,
            videos = index.metadata.total_videos,
            indexed = index.metadata.indexed_videos,
            segments = index.metadata.total_segments,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Indexing run complete"
        );
        Ok(index)
    }

    /// Index one video. Failures are folded into the returned metadata.
    pub async fn index_video(&self, path: &Path) -> IndexedVideo {
        let name = file_name(path);
        let logger = VideoLogger::new(&self.run_id, &name);
        let started = Instant::now();

        let result = self
            .index_segments(path, &name, &logger)
            .instrument(logger.create_span())
            .await;

        match result {
            Ok((info, segments)) => {
                metrics::record_segments_indexed(segments.len());
                logger.log_completion(segments.len(), started.elapsed().as_secs_f64());
                IndexedVideo {
                    metadata: VideoMetadata::indexed(path.display().to_string(), segments.len())
                        .with_probe(info.duration, info.fps, info.width, info.height),
                    segments,
                }
            }
            Err(e) => {
                metrics::record_video_failed();
                logger.log_error(&e.to_string());
                IndexedVideo {
                    metadata: VideoMetadata::failed(path.display().to_string(), e.to_string()),
                    segments: Vec::new(),
                }
            }
        }
    }

    async fn index_segments(
        &self,
        path: &Path,
        video_file: &str,
        logger: &VideoLogger,
    ) -> IndexerResult<(VideoInfo, Vec<VideoSegment>)> {
        logger.log_start(&path.display().to_string());
        let info = self.source.probe(path).await?;
        info.validate()?;

        let spans = plan_segments(&info, self.config.segment_duration);
        logger.log_progress(&format!(
            "{} segments over {:.2}s at {:.2} fps ({}x{})",
            spans.len(),
            info.duration,
            info.fps,
            info.width,
            info.height
        ));

        let tasks = spans
            .into_iter()
            .map(|span| self.index_segment(path, &info, video_file, span, logger));
        let segments = join_all(tasks).await.into_iter().flatten().collect();

        Ok((info, segments))
    }

    /// Score one segment, logging and dropping it on failure.
    async fn index_segment(
        &self,
        path: &Path,
        info: &VideoInfo,
        video_file: &str,
        span: SegmentSpan,
        logger: &VideoLogger,
    ) -> Option<VideoSegment> {
        match self.score_segment(path, info, video_file, span).await {
            Ok(Some(segment)) => Some(segment),
            Ok(None) => {
                debug!(segment = span.index, "Short tail segment dropped");
                None
            }
            Err(e) => {
                metrics::record_segment_failed(failure_reason(&e));
                logger.log_segment_skipped(span.index, &e.to_string());
                None
            }
        }
    }

    async fn score_segment(
        &self,
        path: &Path,
        info: &VideoInfo,
        video_file: &str,
        span: SegmentSpan,
    ) -> IndexerResult<Option<VideoSegment>> {
        let _permit = self
            .segment_permits
            .acquire()
            .await
            .map_err(|_| IndexerError::segment_failed(span.index, "Failed to acquire segment permit"))?;

        let frames = self
            .source
            .read_segment(path, info, span.start_frame, span.num_frames)
            .await?;
        let Some(end_time) = span.end_time_for(frames.len(), info.fps) else {
            return Ok(None);
        };

        // Scoring is CPU-bound; keep it off the async workers
        let processor = self.processor.clone();
        let scores = tokio::task::spawn_blocking(move || processor.process(frames))
            .await
            .map_err(|e| {
                IndexerError::segment_failed(span.index, format!("Blocking task join error: {}", e))
            })?;
        scores.validate()?;

        debug!(
            segment = span.index,
            start_time = span.start_time,
            end_time,
            "Segment scored"
        );
        Ok(Some(VideoSegment::from_bounds(
            video_file,
            span.start_time,
            end_time,
            scores,
        )?))
    }
}

fn failure_reason(error: &IndexerError) -> &'static str {
    match error {
        IndexerError::Media(_) => "decode",
        IndexerError::Model(_) => "invalid_scores",
        _ => "scoring",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write `index` as pretty-printed JSON, creating parent directories.
pub async fn write_index(index: &VideoIndex, path: impl AsRef<Path>) -> IndexerResult<()> {
    let path = path.as_ref();
    let write_failed = |source| IndexerError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json).await.map_err(write_failed)?;

    info!(
        path = %path.display(),
        segments = index.metadata.total_segments,
        "Index written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vscore_media::extractor::{
        AffineMotion, BoundingBox, ChannelStats, ColorSpace, Correspondence, EdgeAnalysis,
        FlowParams, FlowStats, Histogram, SharpnessMap, ValueBands,
    };
    use vscore_media::{Frame, MediaError, MediaResult, RasterExtractor};
    use vscore_models::{CameraMovement, ExposureClass};

    use crate::config::ExtractorKind;

    /// Black 32x24 stream at 30 fps; files whose name starts with `bad`
    /// fail to probe.
    struct BlackSource {
        total_frames: u64,
    }

    #[async_trait]
    impl FrameSource for BlackSource {
        async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
            if file_name(path).starts_with("bad") {
                return Err(MediaError::InvalidVideo("unreadable container".to_string()));
            }
            Ok(VideoInfo {
                duration: self.total_frames as f64 / 30.0,
                width: 32,
                height: 24,
                fps: 30.0,
                total_frames: self.total_frames,
                codec: "rawvideo".to_string(),
                rotation: 0,
            })
        }

        async fn read_segment(
            &self,
            _path: &Path,
            info: &VideoInfo,
            start_frame: u64,
            num_frames: usize,
        ) -> MediaResult<Vec<Frame>> {
            let available = info.total_frames.saturating_sub(start_frame) as usize;
            Ok((0..num_frames.min(available))
                .map(|i| Frame::solid(i, info.width, info.height, [0, 0, 0]))
                .collect())
        }
    }

    /// Raster statistics plus a detector that always sees one person in the
    /// middle of the frame.
    struct CenteredPerson(RasterExtractor);

    impl FeatureExtractor for CenteredPerson {
        fn name(&self) -> &'static str {
            "centered-person"
        }

        fn compute_flow(
            &self,
            frame: &Frame,
            prev: &Frame,
            params: &FlowParams,
        ) -> MediaResult<FlowStats> {
            self.0.compute_flow(frame, prev, params)
        }

        fn track_features(&self, prev: &Frame, frame: &Frame) -> MediaResult<Option<AffineMotion>> {
            self.0.track_features(prev, frame)
        }

        fn track_correspondences(
            &self,
            prev: &Frame,
            frame: &Frame,
        ) -> MediaResult<Vec<Correspondence>> {
            self.0.track_correspondences(prev, frame)
        }

        fn detect_persons(&self, frame: &Frame) -> MediaResult<Vec<BoundingBox>> {
            let (w, h) = (frame.width() as f64, frame.height() as f64);
            Ok(vec![BoundingBox::new(w / 4.0, h / 8.0, w / 2.0, h * 3.0 / 4.0)])
        }

        fn channel_stats(&self, frame: &Frame, space: ColorSpace) -> MediaResult<ChannelStats> {
            self.0.channel_stats(frame, space)
        }

        fn histogram(
            &self,
            frame: &Frame,
            space: ColorSpace,
            channel: usize,
        ) -> MediaResult<Histogram> {
            self.0.histogram(frame, space, channel)
        }

        fn value_bands(&self, frame: &Frame, low: u8, high: u8) -> MediaResult<ValueBands> {
            self.0.value_bands(frame, low, high)
        }

        fn sharpness(&self, frame: &Frame) -> MediaResult<f64> {
            self.0.sharpness(frame)
        }

        fn sharpness_map(&self, frame: &Frame, grid: usize) -> MediaResult<SharpnessMap> {
            self.0.sharpness_map(frame, grid)
        }

        fn edges_and_contours(&self, frame: &Frame) -> MediaResult<EdgeAnalysis> {
            self.0.edges_and_contours(frame)
        }
    }

    fn indexer(total_frames: u64) -> VideoIndexer<BlackSource> {
        let config = IndexerConfig::default().with_extractor(ExtractorKind::Raster);
        VideoIndexer::with_source(config, BlackSource { total_frames }).unwrap()
    }

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[tokio::test]
    async fn test_index_video_segments() {
        let outcome = indexer(90).index_video(Path::new("/videos/black.mp4")).await;
        assert!(outcome.metadata.indexed);
        assert_eq!(outcome.metadata.segment_count, 3);
        assert_eq!(outcome.metadata.fps, Some(30.0));

        let starts: Vec<f64> = outcome.segments.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![0.0, 1.0, 2.0]);
        for segment in &outcome.segments {
            assert_eq!(segment.video_file, "black.mp4");
            assert!((segment.duration - 1.0).abs() < 1e-9);
            assert!(segment.metrics.brightness.abs() < 1e-9);
            assert_eq!(segment.metrics.camera_movement_type, CameraMovement::Static);
            assert_eq!(segment.metrics.exposure_quality, ExposureClass::Underexposed);
        }
    }

    #[tokio::test]
    async fn test_detected_person_reaches_segment_scores() {
        let extractor: Arc<dyn FeatureExtractor> = Arc::new(CenteredPerson(RasterExtractor::new()));
        let indexer = VideoIndexer::with_extractor(
            IndexerConfig::default(),
            BlackSource { total_frames: 60 },
            extractor,
        )
        .unwrap();

        let outcome = indexer.index_video(Path::new("person.mp4")).await;
        assert_eq!(outcome.segments.len(), 2);
        for segment in &outcome.segments {
            // a centered box covering 37.5% of the frame
            assert!((segment.metrics.person_score - 1.0).abs() < 1e-9);
            assert!((segment.metrics.center_focus_score - 1.0).abs() < 1e-9);
            assert!(segment.metrics.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn test_partial_tail_segment() {
        // 100 frames: three full segments and a 10-frame tail that is dropped
        let outcome = indexer(100).index_video(Path::new("tail.mp4")).await;
        assert_eq!(outcome.segments.len(), 3);

        // 45 frames: one full segment and a 15-frame tail that is kept
        let outcome = indexer(45).index_video(Path::new("tail.mp4")).await;
        assert_eq!(outcome.segments.len(), 2);
        assert!((outcome.segments[1].duration - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_video_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a.mp4", "bad.mov", "notes.txt"]);

        let index = indexer(60).build_index(dir.path()).await.unwrap();
        assert_eq!(index.metadata.total_videos, 2);
        assert_eq!(index.metadata.indexed_videos, 1);
        assert_eq!(index.metadata.total_segments, 2);

        let bad = &index.videos["bad.mov"];
        assert!(!bad.indexed);
        assert_eq!(bad.segment_count, 0);
        assert!(bad.error.as_deref().unwrap_or("").contains("unreadable"));
        assert!(index.videos["a.mp4"].indexed);
    }

    #[tokio::test]
    async fn test_run_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        touch(&input, &["clip.mkv"]);
        let output = dir.path().join("out").join("nested").join("index.json");

        let index = indexer(30).run(&input, &output).await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains('\n'));
        let parsed: VideoIndex = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.metadata.total_segments, index.metadata.total_segments);
        assert_eq!(parsed.metadata.sampling.map(|s| s.scalar_stride), Some(3));
    }

    #[tokio::test]
    async fn test_missing_input_folder_is_fatal() {
        let err = indexer(30).build_index("/nonexistent/input").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_bogus_file_with_ffmpeg_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bogus.mp4"), b"not a video").unwrap();

        let config = IndexerConfig::default().with_extractor(ExtractorKind::Raster);
        let indexer = VideoIndexer::new(config).unwrap();
        let index = indexer.build_index(dir.path()).await.unwrap();
        assert!(!index.videos["bogus.mp4"].indexed);
        assert!(index.segments.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = IndexerConfig::default().with_segment_duration(0.0);
        assert!(VideoIndexer::new(config).is_err());
    }
}
