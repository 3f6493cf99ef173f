use crate::render::{overlay_pixels, PixelAndTextGrid, Texture};

use super::GuiComponent;

/// Draws a texture at the component's top-left corner, clipped to its bounds.
#[derive(Debug, Clone)]
pub struct GuiImage {
    texture: Texture,
}

impl GuiImage {
    pub fn new(texture: Texture) -> Self {
        Self { texture }
    }

    pub fn set_texture(&mut self, texture: Texture) {
        self.texture = texture;
    }
}

impl GuiComponent for GuiImage {
    fn render(&mut self, target: &mut PixelAndTextGrid) {
        overlay_pixels(&self.texture, target, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;

    #[test]
    fn draws_from_the_top_left_and_clips() {
        let mut image = GuiImage::new(Texture::solid(4, 4, Color::GREEN));
        let mut target = PixelAndTextGrid::new(3, 2);
        image.render(&mut target);
        assert_eq!(target.pixel(0, 0), Some(Color::GREEN));
        assert_eq!(target.pixel(2, 1), Some(Color::GREEN));
        assert_eq!(target.pixel(3, 0), None);

        image.set_texture(Texture::empty());
        let mut target = PixelAndTextGrid::new(3, 2);
        image.render(&mut target);
        assert_eq!(target.pixel(0, 0), Some(Color::TRANSPARENT));
    }
}
