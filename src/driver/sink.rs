use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;

/// Consumes the images produced for each input frame
pub trait DisplaySink {
    fn show(&mut self, window: &str, frame_index: u64, image: &DynamicImage) -> Result<()>;
}

/// Writes every shown image to `<root>/<window>/<frame>.png`
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn frame_path(&self, window: &str, frame_index: u64) -> PathBuf {
        self.root.join(window).join(format!("{:06}.png", frame_index))
    }
}

impl DisplaySink for DirectorySink {
    fn show(&mut self, window: &str, frame_index: u64, image: &DynamicImage) -> Result<()> {
        let path = self.frame_path(window, frame_index);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        image.save(&path)?;
        debug!(path = %path.display(), "frame written");
        Ok(())
    }
}

/// Logs and counts what was shown per window without storing pixels
#[derive(Debug, Default)]
pub struct LogSink {
    pub shown: BTreeMap<String, u64>,
}

impl LogSink {
    pub fn count(&self, window: &str) -> u64 {
        self.shown.get(window).copied().unwrap_or(0)
    }
}

impl DisplaySink for LogSink {
    fn show(&mut self, window: &str, frame_index: u64, image: &DynamicImage) -> Result<()> {
        debug!(window, frame_index, width = image.width(), height = image.height(), "show");
        *self.shown.entry(window.to_string()).or_insert(0) += 1;
        Ok(())
    }
}
