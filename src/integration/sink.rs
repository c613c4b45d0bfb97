//! Append-only writer for tracking records.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::tracker::TrackingRecord;

/// Writes one line per record:
/// `frame,label,id,x,y,width,height,1,-1,-1,-1`.
///
/// The trailing fields are constant fill in the MOTChallenge layout
/// (confidence and world coordinates).
pub struct RecordWriter {
    path: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

impl RecordWriter {
    /// Create the output file. An existing file is never overwritten.
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => PipelineError::OutputAlreadyExists(path.to_path_buf()),
                _ => PipelineError::FileOpenFailure {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, record: &TrackingRecord) -> Result<(), PipelineError> {
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},1,-1,-1,-1",
            record.frame_index,
            record.label,
            record.track_id,
            record.bbox.x,
            record.bbox.y,
            record.bbox.width,
            record.bbox.height,
        )?;
        self.written += 1;
        Ok(())
    }

    pub fn write_all(&mut self, records: &[TrackingRecord]) -> Result<(), PipelineError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Flush buffered lines to disk.
    pub fn finish(mut self) -> Result<usize, PipelineError> {
        self.out.flush()?;
        Ok(self.written)
    }
}
