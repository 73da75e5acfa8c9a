//! # Cover Rendering
//!
//! Playlist collages and the placeholder icon, drawn with the `image` crate
//! and encoded as PNG.
//!
//! Collage layouts on a square canvas:
//!
//! | covers | layout |
//! |--------|--------|
//! | 1 | full frame |
//! | 2 | left and right halves |
//! | 3 | top half, two bottom quadrants |
//! | 4 | quadrants |

use crate::error::{MetadataError, Result};
use bytes::Bytes;
use core_library::{CoverRenderer, RenderedImage};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::{debug, warn};

/// Edge length of generated covers in pixels.
pub const COVER_SIZE: u32 = 200;

const COLLAGE_BACKGROUND: Rgba<u8> = Rgba([0x18, 0x18, 0x18, 0xff]);
const PLACEHOLDER_BACKGROUND: Rgba<u8> = Rgba([0x28, 0x28, 0x28, 0xff]);
const PLACEHOLDER_GLYPH: Rgba<u8> = Rgba([0x7a, 0x7a, 0x7a, 0xff]);

/// Pixel rectangle `(x, y, width, height)`.
type Rect = (u32, u32, u32, u32);

/// Renders collages and the placeholder cover.
#[derive(Debug, Clone, Copy)]
pub struct CollageRenderer {
    size: u32,
}

impl CollageRenderer {
    pub fn new() -> Self {
        Self { size: COVER_SIZE }
    }

    pub fn with_size(size: u32) -> Self {
        Self { size: size.max(2) }
    }

    /// Tile rectangles for `count` covers; at most four are used.
    pub fn layout(&self, count: usize) -> Vec<Rect> {
        let s = self.size;
        let h = s / 2;
        match count {
            0 => Vec::new(),
            1 => vec![(0, 0, s, s)],
            2 => vec![(0, 0, h, s), (h, 0, s - h, s)],
            3 => vec![(0, 0, s, h), (0, h, h, s - h), (h, h, s - h, s - h)],
            _ => vec![
                (0, 0, h, h),
                (h, 0, s - h, h),
                (0, h, h, s - h),
                (h, h, s - h, s - h),
            ],
        }
    }

    /// Draw up to four covers into one image.
    ///
    /// Covers that fail to decode leave their tile on the background; the
    /// render fails only when none decode.
    pub fn collage(&self, covers: &[Bytes]) -> Result<RgbaImage> {
        let rects = self.layout(covers.len());
        if rects.is_empty() {
            return Err(MetadataError::Artwork("No covers to render".to_string()));
        }

        let mut canvas = RgbaImage::from_pixel(self.size, self.size, COLLAGE_BACKGROUND);
        let mut drawn = 0;

        for (cover, (x, y, w, h)) in covers.iter().zip(rects) {
            match image::load_from_memory(cover) {
                Ok(img) => {
                    let tile = img.resize_to_fill(w, h, FilterType::Triangle).to_rgba8();
                    imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
                    drawn += 1;
                }
                Err(e) => warn!(error = %e, "Skipping undecodable cover tile"),
            }
        }

        if drawn == 0 {
            return Err(MetadataError::Artwork(
                "None of the covers could be decoded".to_string(),
            ));
        }
        debug!(tiles = drawn, "Rendered collage");
        Ok(canvas)
    }

    /// A music note on a dark background.
    pub fn placeholder_image(&self) -> RgbaImage {
        let s = self.size as f32;
        let mut img = RgbaImage::from_pixel(self.size, self.size, PLACEHOLDER_BACKGROUND);

        // Geometry in fractions of the canvas.
        let (head_cx, head_cy) = (0.42 * s, 0.66 * s);
        let (head_rx, head_ry) = (0.11 * s, 0.08 * s);
        let stem_x = (head_cx + head_rx - 0.04 * s, head_cx + head_rx);
        let stem_y = (0.28 * s, head_cy);
        let flag_x = (stem_x.1, stem_x.1 + 0.14 * s);
        let flag_y = (stem_y.0, stem_y.0 + 0.07 * s);

        for (px, py, pixel) in img.enumerate_pixels_mut() {
            let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
            let dx = (x - head_cx) / head_rx;
            let dy = (y - head_cy) / head_ry;
            let in_head = dx * dx + dy * dy <= 1.0;
            let in_stem = x >= stem_x.0 && x <= stem_x.1 && y >= stem_y.0 && y <= stem_y.1;
            let in_flag = x >= flag_x.0 && x <= flag_x.1 && y >= flag_y.0 && y <= flag_y.1;
            if in_head || in_stem || in_flag {
                *pixel = PLACEHOLDER_GLYPH;
            }
        }
        img
    }

    fn encode_png(&self, img: RgbaImage) -> Result<RenderedImage> {
        let (width, height) = img.dimensions();
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(RenderedImage {
            data: Bytes::from(buffer),
            mime_type: "image/png".to_string(),
            width,
            height,
        })
    }
}

impl Default for CollageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverRenderer for CollageRenderer {
    fn render_collage(&self, covers: &[Bytes]) -> core_library::Result<RenderedImage> {
        let img = self.collage(covers)?;
        Ok(self.encode_png(img)?)
    }

    fn placeholder(&self) -> core_library::Result<RenderedImage> {
        Ok(self.encode_png(self.placeholder_image())?)
    }

    fn inspect(&self, data: &Bytes) -> core_library::Result<RenderedImage> {
        let format = image::guess_format(data).map_err(MetadataError::from)?;
        let img = image::load_from_memory_with_format(data, format).map_err(MetadataError::from)?;
        Ok(RenderedImage {
            data: data.clone(),
            mime_type: format.to_mime_type().to_string(),
            width: img.width(),
            height: img.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_png(color: [u8; 3]) -> Bytes {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(32, 32, Rgb(color)));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer)
    }

    fn rgb(img: &RgbaImage, x: u32, y: u32) -> [u8; 3] {
        let p = img.get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    #[test]
    fn test_layouts_cover_canvas() {
        let renderer = CollageRenderer::new();
        for count in 1..=4 {
            let area: u32 = renderer.layout(count).iter().map(|r| r.2 * r.3).sum();
            assert_eq!(area, COVER_SIZE * COVER_SIZE, "layout for {count}");
        }
        assert_eq!(renderer.layout(7).len(), 4);
        assert!(renderer.layout(0).is_empty());
    }

    #[test]
    fn test_four_covers_make_quadrants() {
        let renderer = CollageRenderer::new();
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 0]];
        let covers: Vec<Bytes> = colors.iter().map(|c| solid_png(*c)).collect();

        let img = renderer.collage(&covers).unwrap();
        assert_eq!(rgb(&img, 50, 50), colors[0]);
        assert_eq!(rgb(&img, 150, 50), colors[1]);
        assert_eq!(rgb(&img, 50, 150), colors[2]);
        assert_eq!(rgb(&img, 150, 150), colors[3]);
    }

    #[test]
    fn test_three_covers_layout() {
        let renderer = CollageRenderer::new();
        let covers = vec![
            solid_png([255, 0, 0]),
            solid_png([0, 255, 0]),
            solid_png([0, 0, 255]),
        ];

        let img = renderer.collage(&covers).unwrap();
        assert_eq!(rgb(&img, 10, 10), [255, 0, 0]);
        assert_eq!(rgb(&img, 190, 90), [255, 0, 0]);
        assert_eq!(rgb(&img, 50, 150), [0, 255, 0]);
        assert_eq!(rgb(&img, 150, 150), [0, 0, 255]);
    }

    #[test]
    fn test_undecodable_tile_keeps_background() {
        let renderer = CollageRenderer::new();
        let covers = vec![solid_png([255, 0, 0]), Bytes::from_static(b"junk")];

        let img = renderer.collage(&covers).unwrap();
        assert_eq!(rgb(&img, 50, 100), [255, 0, 0]);
        assert_eq!(rgb(&img, 150, 100), [0x18, 0x18, 0x18]);

        assert!(renderer.collage(&[Bytes::from_static(b"junk")]).is_err());
        assert!(renderer.collage(&[]).is_err());
    }

    #[test]
    fn test_placeholder_has_glyph_on_background() {
        let renderer = CollageRenderer::new();
        let img = renderer.placeholder_image();
        assert_eq!(rgb(&img, 2, 2), [0x28, 0x28, 0x28]);
        // centre of the note head
        assert_eq!(rgb(&img, 84, 132), [0x7a, 0x7a, 0x7a]);

        let encoded = renderer.placeholder().unwrap();
        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!((encoded.width, encoded.height), (COVER_SIZE, COVER_SIZE));
    }

    #[test]
    fn test_inspect() {
        let renderer = CollageRenderer::new();
        let info = renderer.inspect(&solid_png([1, 2, 3])).unwrap();
        assert_eq!(info.mime_type, "image/png");
        assert_eq!((info.width, info.height), (32, 32));

        assert!(renderer.inspect(&Bytes::from_static(b"nope")).is_err());
    }
}
