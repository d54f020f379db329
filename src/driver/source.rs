use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DetectError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "ppm", "webp"];

/// Supplies frames on demand. `Ok(None)` marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Go back to the first frame
    fn rewind(&mut self) -> Result<()>;

    /// Number of frames in one pass over the source
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Frames {
    /// Still images decoded when they are reached
    Files(Vec<PathBuf>),
    /// Frames already in memory (animated GIF, synthetic input)
    Decoded(Vec<RgbImage>),
}

/// A finite, rewindable sequence of frames
pub struct ImageSequence {
    frames: Frames,
    position: usize,
}

impl ImageSequence {
    /// Open a directory of images, an animated GIF, or a single image
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DetectError::SourceUnavailable(format!(
                "{}: no such file or directory",
                path.display()
            )));
        }

        let frames = if path.is_dir() {
            Frames::Files(list_images(path)?)
        } else if has_extension(path, "gif") {
            Frames::Decoded(decode_gif(path)?)
        } else {
            Frames::Files(vec![path.to_path_buf()])
        };

        let sequence = Self { frames, position: 0 };
        if sequence.is_empty() {
            return Err(DetectError::EmptySource);
        }
        debug!(source = %path.display(), frames = sequence.len(), "opened frame source");
        Ok(sequence)
    }

    pub fn from_frames(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: Frames::Decoded(frames),
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame = match &self.frames {
            Frames::Files(paths) => match paths.get(self.position) {
                Some(path) => Some(image::open(path)?.to_rgb8()),
                None => None,
            },
            Frames::Decoded(frames) => frames.get(self.position).cloned(),
        };
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn len(&self) -> usize {
        match &self.frames {
            Frames::Files(paths) => paths.len(),
            Frames::Decoded(frames) => frames.len(),
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && IMAGE_EXTENSIONS.iter().any(|ext| has_extension(&path, ext)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn decode_gif(path: &Path) -> Result<Vec<RgbImage>> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
    let frames = decoder.into_frames().collect_frames()?;
    Ok(frames
        .into_iter()
        .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8())
        .collect())
}
