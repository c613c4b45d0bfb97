//! Runs whole sequences: frames in, record files out.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{DetectorError, PipelineError};
use crate::tracker::TrackerConfig;

use super::frame_source::ImageDirectory;
use super::sink::RecordWriter;
use super::{DetectionSource, TrackerPipeline};

/// Timing of one processed sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SequenceStats {
    pub frames: u32,
    /// Time spent in detection and tracking only; decoding and writing are
    /// excluded.
    pub duration: Duration,
}

impl SequenceStats {
    /// Frames per second, 0 when no time was measured.
    pub fn fps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOutcome {
    Processed(SequenceStats),
    /// Output already existed; nothing was read or written.
    Skipped { output: PathBuf },
}

/// Outcome of a batch of sequences.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(PathBuf, SequenceOutcome)>,
    /// Sum over processed sequences.
    pub total: SequenceStats,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SequenceOutcome::Processed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

/// Processes sequences laid out as
/// `<data_dir>/<sequence>/images/*` into
/// `<data_dir>/results/<sequence>/<model_type>/track.txt`.
///
/// Every sequence gets a fresh tracker; nothing carries over between them.
#[derive(Debug, Clone)]
pub struct SequenceRunner {
    data_dir: PathBuf,
    model_type: String,
    config: TrackerConfig,
}

impl SequenceRunner {
    pub fn new(data_dir: impl Into<PathBuf>, model_type: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_type: model_type.into(),
            config: TrackerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn input_dir(&self, sequence: &Path) -> PathBuf {
        self.data_dir.join(sequence).join("images")
    }

    pub fn output_path(&self, sequence: &Path) -> PathBuf {
        self.data_dir
            .join("results")
            .join(sequence)
            .join(&self.model_type)
            .join("track.txt")
    }

    /// Track one sequence.
    ///
    /// A missing input directory is an error; an existing output file turns
    /// the call into a no-op returning [`SequenceOutcome::Skipped`]. When a
    /// frame fails, the partial output is removed before the error returns.
    pub fn run_sequence<D>(
        &self,
        detector: &mut D,
        sequence: &Path,
    ) -> Result<SequenceOutcome, PipelineError>
    where
        D: DetectionSource,
        D::Error: Into<DetectorError>,
    {
        self.config.validate()?;
        let frames = ImageDirectory::open(&self.input_dir(sequence))?;

        let output = self.output_path(sequence);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PipelineError::FileOpenFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let writer = match RecordWriter::create(&output) {
            Ok(writer) => writer,
            Err(PipelineError::OutputAlreadyExists(output)) => {
                tracing::warn!(output = %output.display(), "output file already exists; don't overwrite");
                return Ok(SequenceOutcome::Skipped { output });
            }
            Err(err) => return Err(err),
        };

        let stats = match self.track_frames(detector, frames, writer) {
            Ok(stats) => stats,
            Err(err) => {
                if let Err(remove) = std::fs::remove_file(&output) {
                    tracing::warn!(
                        output = %output.display(),
                        "could not remove partial output: {remove}"
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            sequence = %sequence.display(),
            frames = stats.frames,
            duration_ms = stats.duration.as_millis() as u64,
            fps = stats.fps(),
            "sequence done"
        );
        Ok(SequenceOutcome::Processed(stats))
    }

    fn track_frames<D>(
        &self,
        detector: &mut D,
        frames: ImageDirectory,
        mut writer: RecordWriter,
    ) -> Result<SequenceStats, PipelineError>
    where
        D: DetectionSource,
        D::Error: Into<DetectorError>,
    {
        let mut pipeline = TrackerPipeline::new(detector, self.config.clone());
        let mut stats = SequenceStats::default();
        for frame in frames {
            let frame = frame?;
            let start = Instant::now();
            let records = pipeline
                .process(&frame)
                .map_err(|e| PipelineError::Detector(e.into()))?;
            stats.duration += start.elapsed();
            stats.frames += 1;
            writer.write_all(&records)?;
        }
        writer.finish()?;
        Ok(stats)
    }

    /// Track each sequence in turn, stopping at the first error.
    pub fn run_all<D>(
        &self,
        detector: &mut D,
        sequences: &[PathBuf],
    ) -> Result<RunSummary, PipelineError>
    where
        D: DetectionSource,
        D::Error: Into<DetectorError>,
    {
        let mut summary = RunSummary::default();
        for sequence in sequences {
            tracing::info!(sequence = %sequence.display(), "processing sequence");
            let outcome = self.run_sequence(detector, sequence)?;
            if let SequenceOutcome::Processed(stats) = &outcome {
                summary.total.frames += stats.frames;
                summary.total.duration += stats.duration;
            }
            summary.outcomes.push((sequence.clone(), outcome));
        }

        tracing::info!(
            processed = summary.processed(),
            skipped = summary.skipped(),
            duration_ms = summary.total.duration.as_millis() as u64,
            fps = summary.total.fps(),
            "all sequences done"
        );
        Ok(summary)
    }
}

/// Read a sequence list: one sequence path per line, blank lines ignored.
pub fn read_sequence_list(path: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| PipelineError::FileOpenFailure {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}
