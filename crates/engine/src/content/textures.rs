use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::warn;

use crate::render::{PixelGrid, Texture, TILE_HEIGHT, TILE_WIDTH};

use super::error::ContentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureKeyError {
    #[error("texture key must not be empty")]
    Empty,
    #[error("texture key must not start with '/'")]
    LeadingSlash,
    #[error("texture key must not contain '\\\\'")]
    Backslash,
    #[error("texture key must not contain '..'")]
    ParentTraversal,
    #[error("texture key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are relative paths without the `.png` suffix, e.g. `tiles/grass`.
pub fn validate_texture_key(key: &str) -> Result<(), TextureKeyError> {
    if key.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(TextureKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(TextureKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(TextureKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(TextureKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Lazily decoded PNG textures under one directory. A key that fails to load maps to
/// [`Texture::placeholder`] from then on and is reported once.
#[derive(Debug)]
pub struct TextureCache {
    root: PathBuf,
    cache: HashMap<String, Texture>,
    warned_keys: HashSet<String>,
}

impl TextureCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registers an in-memory texture under `key`, replacing any cached entry.
    pub fn insert(&mut self, key: impl Into<String>, texture: Texture) {
        self.cache.insert(key.into(), texture);
    }

    pub fn get(&mut self, key: &str) -> Texture {
        if let Some(texture) = self.cache.get(key) {
            return texture.clone();
        }
        let texture = match self.load(key) {
            Ok(texture) => texture,
            Err(error) => {
                self.warn_once(key, &error);
                Texture::placeholder()
            }
        };
        self.cache.insert(key.to_string(), texture.clone());
        texture
    }

    /// Draws `keys` on top of each other, the first key topmost, onto a canvas at
    /// least one tile large.
    pub fn layered(&mut self, keys: &[String]) -> Texture {
        let layers: Vec<Texture> = keys.iter().map(|key| self.get(key)).collect();
        let width = layers
            .iter()
            .map(|layer| layer.width())
            .fold(TILE_WIDTH, u32::max);
        let height = layers
            .iter()
            .map(|layer| layer.height())
            .fold(TILE_HEIGHT, u32::max);
        let mut canvas = PixelGrid::new(width, height);
        for layer in layers.iter().rev() {
            for (y, row) in layer.rows().enumerate() {
                for (x, color) in row.iter().enumerate() {
                    canvas.blend_pixel(x as i32, y as i32, *color);
                }
            }
        }
        Texture::from_grid(canvas)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn path_of(&self, key: &str) -> Result<PathBuf, ContentError> {
        validate_texture_key(key).map_err(|source| ContentError::TextureKey {
            key: key.to_string(),
            source,
        })?;
        Ok(self.root.join(format!("{key}.png")))
    }

    fn load(&self, key: &str) -> Result<Texture, ContentError> {
        let path = self.path_of(key)?;
        let reader = ImageReader::open(&path).map_err(|source| ContentError::Io {
            path: path.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| ContentError::Image {
            path: path.clone(),
            source,
        })?;
        let image = decoded.to_rgba8();
        let (width, height) = (image.width(), image.height());
        Texture::from_rgba(width, height, image.as_raw())
            .map_err(|source| ContentError::Texture { path, source })
    }

    fn warn_once(&mut self, key: &str, error: &ContentError) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        warn!(
            texture_key = key,
            error = %error,
            "texture_load_failed_using_placeholder"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn accepts_valid_keys() {
        for key in ["player", "tiles/grass_1", "a-b/c_d", "ui/font.v2"] {
            assert!(validate_texture_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a", "..", "a/../b", r"a\b", "A", "a b"] {
            assert!(validate_texture_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn loads_png_and_caches_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("tiles")).expect("mkdir");
        let mut img = image::RgbaImage::new(2, 3);
        img.put_pixel(1, 2, image::Rgba([10, 20, 30, 255]));
        img.save(dir.path().join("tiles/dot.png")).expect("save png");

        let mut cache = TextureCache::new(dir.path());
        let texture = cache.get("tiles/dot");
        assert_eq!((texture.width(), texture.height()), (2, 3));
        assert_eq!(texture.pixel(1, 2), Some(Color::rgb(10, 20, 30)));
        assert!(cache.get("tiles/dot").ptr_eq(&texture));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_or_invalid_keys_fall_back_to_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = TextureCache::new(dir.path());
        assert!(cache.get("nope").ptr_eq(&Texture::placeholder()));
        assert!(cache.get("../escape").ptr_eq(&Texture::placeholder()));
        assert!(cache.get("nope").ptr_eq(&Texture::placeholder()));
        assert_eq!(cache.warned_keys.len(), 2);
    }

    #[test]
    fn layered_draws_first_key_on_top() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = TextureCache::new(dir.path());
        let mut top = PixelGrid::new(8, 8);
        top.set_pixel(0, 0, Color::RED);
        cache.insert("top", Texture::from_grid(top));
        cache.insert("bottom", Texture::solid(10, 8, Color::BLUE));

        let texture = cache.layered(&["top".to_string(), "bottom".to_string()]);
        assert_eq!((texture.width(), texture.height()), (10, 8));
        assert_eq!(texture.pixel(0, 0), Some(Color::RED));
        assert_eq!(texture.pixel(9, 7), Some(Color::BLUE));
    }
}
