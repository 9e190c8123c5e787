use std::collections::HashMap;
use std::sync::Arc;

/// A loaded sprite file, shared between every agent part that draws from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    name: String,
    /// Number of frames in the file, when the loader knows it.
    frame_count: Option<u32>,
}

impl SpriteImage {
    pub fn new(name: impl Into<String>, frame_count: Option<u32>) -> Self {
        Self { name: name.into(), frame_count }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_count(&self) -> Option<u32> {
        self.frame_count
    }
}

/// The boundary between the world and asset storage.
pub trait ImageLoader: Send {
    /// Load the named sprite file. Errors are human-readable reasons.
    fn load(&self, name: &str) -> Result<Arc<SpriteImage>, String>;
}

/// Accepts any non-empty name without touching storage. Frame counts are
/// unknown, so frame ranges are not checked. Default when no loader is
/// configured.
pub struct NameOnlyLoader;

impl ImageLoader for NameOnlyLoader {
    fn load(&self, name: &str) -> Result<Arc<SpriteImage>, String> {
        if name.trim().is_empty() {
            return Err("empty sprite file name".to_string());
        }
        Ok(Arc::new(SpriteImage::new(name, None)))
    }
}

/// A fixed set of known sprite files with their frame counts.
/// Names are matched case-insensitively.
#[derive(Debug, Default)]
pub struct SpriteCatalog {
    images: HashMap<String, Arc<SpriteImage>>,
}

impl SpriteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sprite(mut self, name: &str, frame_count: u32) -> Self {
        self.insert(name, frame_count);
        self
    }

    pub fn insert(&mut self, name: &str, frame_count: u32) {
        self.images.insert(
            name.to_ascii_lowercase(),
            Arc::new(SpriteImage::new(name, Some(frame_count))),
        );
    }
}

impl ImageLoader for SpriteCatalog {
    fn load(&self, name: &str) -> Result<Arc<SpriteImage>, String> {
        self.images
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| format!("sprite file '{}' not found", name))
    }
}
