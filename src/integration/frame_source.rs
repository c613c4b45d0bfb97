//! Ordered image frames read from a sequence directory.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 0-based position of the frame in the sequence
    pub index: u32,
    pub path: PathBuf,
    /// Interleaved RGB8 pixels, row-major
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Frames of a sequence directory, in lexicographic file-name order.
///
/// The order defines which frame follows which and therefore track
/// continuity. Images are decoded lazily, one per iteration.
#[derive(Debug)]
pub struct ImageDirectory {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirectory {
    /// List the files of `dir`. Subdirectories are ignored.
    pub fn open(dir: &Path) -> Result<Self, PipelineError> {
        if !dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(Self { paths, next: 0 })
    }

    /// All frame paths, in processing order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Iterator for ImageDirectory {
    type Item = Result<Frame, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.get(self.next)?.clone();
        let index = self.next as u32;
        self.next += 1;
        Some(decode(index, path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.paths.len() - self.next;
        (remaining, Some(remaining))
    }
}

fn decode(index: u32, path: PathBuf) -> Result<Frame, PipelineError> {
    let image = match image::open(&path) {
        Ok(image) => image.to_rgb8(),
        Err(source) => return Err(PipelineError::ImageDecode { path, source }),
    };
    let (width, height) = image.dimensions();
    Ok(Frame {
        index,
        path,
        data: image.into_raw(),
        width,
        height,
    })
}
