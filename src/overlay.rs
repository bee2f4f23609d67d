//! Annotated overlay of the measurements on the source photo.
//!
//! Each row of [`SEGMENTS`] becomes a 2 px line in its own color with the
//! legend number printed beside it. The satisfaction score, when present, is
//! written in the top-left corner.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::measure::{FeatureResult, SEGMENTS};
use crate::types::{LandmarkSet, Point};

pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Label size for TrueType fonts, in pixels.
pub const FONT_SIZE: f32 = 14.0;

/// Top-left corner of the satisfaction annotation.
const SATISFACTION_ORIGIN: (i32, i32) = (10, 10);

/// Font used for labels.
///
/// A TrueType font is preferred; the builtin bitmap font is always available
/// so rendering never fails for lack of a font.
pub enum LabelFont {
    TrueType(FontVec),
    Builtin,
}

impl LabelFont {
    /// Load a TrueType/OpenType font file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let font = FontVec::try_from_vec(data).map_err(|e| Error::Font(e.to_string()))?;
        Ok(LabelFont::TrueType(font))
    }

    /// Load `path` if given, falling back to the builtin font on any failure.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return LabelFont::Builtin;
        };
        match Self::load(path) {
            Ok(font) => {
                debug!(path = %path.display(), "loaded label font");
                font
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "falling back to builtin label font");
                LabelFont::Builtin
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, LabelFont::Builtin)
    }

    fn draw(&self, img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            LabelFont::TrueType(font) => {
                draw_text_mut(img, color, x, y, PxScale::from(FONT_SIZE), font, text)
            }
            LabelFont::Builtin => draw_builtin_text(img, x, y, text, color),
        }
    }
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::TrueType(_) => f.write_str("LabelFont::TrueType"),
            LabelFont::Builtin => f.write_str("LabelFont::Builtin"),
        }
    }
}

/// Draw the measurement overlay onto a copy of `image`.
///
/// The input is left untouched; the annotated copy is returned.
pub fn render(
    image: &RgbImage,
    landmarks: &LandmarkSet,
    features: &FeatureResult,
    font: &LabelFont,
) -> RgbImage {
    let mut canvas = image.clone();

    for segment in &SEGMENTS {
        let (a, b) = segment.endpoints(landmarks);
        draw_thick_line(&mut canvas, a, b, Rgb(segment.color));

        let at = segment.label_position(landmarks);
        font.draw(&mut canvas, at.x as i32, at.y as i32, segment.label, TEXT_COLOR);
    }

    if let Some(satisfaction) = features.satisfaction {
        let (x, y) = SATISFACTION_ORIGIN;
        let text = format!("Satisfaction: {satisfaction:.1}");
        font.draw(&mut canvas, x, y, &text, TEXT_COLOR);
    }

    canvas
}

/// Two parallel 1 px segments, offset across the dominant direction.
fn draw_thick_line(img: &mut RgbImage, a: Point, b: Point, color: Rgb<u8>) {
    // Snap to whole pixels like the label positions.
    let (ax, ay) = (a.x as i32 as f32, a.y as i32 as f32);
    let (bx, by) = (b.x as i32 as f32, b.y as i32 as f32);

    draw_line_segment_mut(img, (ax, ay), (bx, by), color);
    if (bx - ax).abs() >= (by - ay).abs() {
        draw_line_segment_mut(img, (ax, ay + 1.0), (bx, by + 1.0), color);
    } else {
        draw_line_segment_mut(img, (ax + 1.0, ay), (bx + 1.0, by), color);
    }
}

// Builtin 3x5 bitmap font, drawn at 2x.

const GLYPH_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = 4 * GLYPH_SCALE;

fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        _ => [0b000, 0b000, 0b000, 0b000, 0b000],
    }
}

fn draw_builtin_char(img: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>) {
    let (img_w, img_h) = (img.width() as i32, img.height() as i32);

    for (row, bits) in glyph(ch).iter().enumerate() {
        for col in 0..3 {
            if (bits >> (2 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as i32 * GLYPH_SCALE + dy;
                    if px >= 0 && py >= 0 && px < img_w && py < img_h {
                        img.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

fn draw_builtin_text(img: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        draw_builtin_char(img, cursor_x, y, ch, color);
        cursor_x += GLYPH_ADVANCE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{extract, tests::synthetic_face};

    fn gray_canvas() -> RgbImage {
        RgbImage::from_pixel(200, 200, Rgb([40, 40, 40]))
    }

    #[test]
    fn render_leaves_input_untouched() {
        let image = gray_canvas();
        let before = image.clone();
        let face = synthetic_face();
        let features = extract(&face).unwrap().with_satisfaction(Some(8.5));

        let annotated = render(&image, &face, &features, &LabelFont::Builtin);

        assert_eq!(image, before);
        assert_eq!(annotated.dimensions(), image.dimensions());
        assert_ne!(annotated, image);
    }

    #[test]
    fn face_width_line_uses_its_color() {
        let face = synthetic_face();
        let features = extract(&face).unwrap();
        let annotated = render(&gray_canvas(), &face, &features, &LabelFont::Builtin);

        // Landmarks 1 and 15 share a row; x = 60 is clear of every other line.
        let y = face[1].y as u32;
        assert_eq!(*annotated.get_pixel(60, y), Rgb([238, 130, 238]));
        assert_eq!(*annotated.get_pixel(60, y + 1), Rgb([238, 130, 238]));
    }

    #[test]
    fn satisfaction_written_only_when_present() {
        let face = synthetic_face();
        let features = extract(&face).unwrap();
        let corner = |img: &RgbImage| {
            (0..30u32)
                .flat_map(|y| (0..120u32).map(move |x| (x, y)))
                .filter(|&(x, y)| *img.get_pixel(x, y) == TEXT_COLOR)
                .count()
        };

        let plain = render(&gray_canvas(), &face, &features, &LabelFont::Builtin);
        assert_eq!(corner(&plain), 0);

        let scored = render(
            &gray_canvas(),
            &face,
            &features.with_satisfaction(Some(7.0)),
            &LabelFont::Builtin,
        );
        assert!(corner(&scored) > 0);
    }

    #[test]
    fn missing_font_falls_back_to_builtin() {
        let font = LabelFont::load_or_builtin(Some(Path::new("/nonexistent/label-font.ttf")));
        assert!(font.is_builtin());
        assert!(LabelFont::load_or_builtin(None).is_builtin());
    }

    #[test]
    fn corrupt_font_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();

        assert!(matches!(LabelFont::load(&path), Err(Error::Font(_))));
        assert!(LabelFont::load_or_builtin(Some(&path)).is_builtin());
    }

    #[test]
    fn builtin_text_clips_at_image_edge() {
        let mut img = RgbImage::new(10, 10);
        draw_builtin_text(&mut img, 6, 6, "88", TEXT_COLOR);
        draw_builtin_text(&mut img, -20, -20, "8", TEXT_COLOR);
        assert_eq!(*img.get_pixel(6, 6), TEXT_COLOR);
    }
}
