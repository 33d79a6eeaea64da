//! Drawing reconstructed labels.
//!
//! A reconstruction is a white band with every merged box's text drawn at its
//! straightened position and chosen font size. It is pasted under the
//! original label crop so the two can be compared line by line.

use crate::core::{EnsembleError, EnsembleResult};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use ocr_ensemble_core::domain::MergedBox;
use ocr_ensemble_core::processors::{Arrangement, TextExtent, TextMeasure};
use std::path::Path;
use tracing::{debug, info, warn};

const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// The font reconstructions are drawn and measured with.
///
/// Loaded once per run and shared by reference with every worker.
pub struct LabelFont {
    font: FontVec,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl LabelFont {
    /// Loads a font file.
    pub fn from_path(font_path: &Path) -> EnsembleResult<Self> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data)
            .map_err(|e| EnsembleError::rendering(&format!("parsing font {}", font_path.display()), e))?;
        Ok(Self { font })
    }

    /// Tries common system font locations.
    pub fn from_system() -> Option<Self> {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(font_data) = std::fs::read(path)
                && let Ok(font) = FontVec::try_from_vec(font_data)
            {
                info!("Loaded system font: {}", path);
                return Some(Self { font });
            }
        }
        debug!("No system font found");
        None
    }

    /// Loads `font_path` when given, falling back to a system font.
    pub fn load(font_path: Option<&Path>) -> Option<Self> {
        match font_path {
            Some(path) => Self::from_path(path)
                .inspect(|_| info!("Using custom font: {}", path.display()))
                .inspect_err(|e| {
                    warn!(
                        "Failed to load font {}: {}. Falling back to system font.",
                        path.display(),
                        e
                    )
                })
                .ok()
                .or_else(Self::from_system),
            None => Self::from_system(),
        }
    }

    fn line_height(&self, scale: PxScale) -> f32 {
        let scaled = self.font.as_scaled(scale);
        scaled.ascent() - scaled.descent()
    }
}

impl TextMeasure for LabelFont {
    fn measure(&self, text: &str, font_size: u32) -> TextExtent {
        let scale = PxScale::from(font_size as f32);
        let scaled_font = self.font.as_scaled(scale);
        let mut width = 0.0;
        for ch in text.chars() {
            let glyph = scaled_font.scaled_glyph(ch);
            width += scaled_font.h_advance(glyph.id);
        }
        TextExtent {
            width: width.ceil().max(0.0) as u32,
            height: self.line_height(scale).ceil().max(0.0) as u32,
        }
    }
}

/// Draws every arranged box's text on a blank canvas sized to the arrangement.
pub fn render_reconstruction(
    merged: &[MergedBox],
    arrangement: &Arrangement,
    font: &LabelFont,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(
        arrangement.width.max(1),
        arrangement.height.max(1),
        BACKGROUND_COLOR,
    );
    for placed in &arrangement.boxes {
        let Some(merged_box) = merged.get(placed.index) else {
            continue;
        };
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            placed.new_left,
            placed.new_top,
            PxScale::from(placed.font_size as f32),
            &font.font,
            &merged_box.text,
        );
    }
    canvas
}

/// Stacks the original label crop above its reconstruction.
///
/// The result is as wide as the wider of the two; any uncovered area is
/// background.
pub fn compose_label_image(label: &RgbImage, reconstruction: &RgbImage) -> RgbImage {
    let width = label.width().max(reconstruction.width());
    let height = label.height() + reconstruction.height();
    let mut composed = RgbImage::new(width, height);

    let fill_rect = Rect::at(0, 0).of_size(width.max(1), height.max(1));
    draw_filled_rect_mut(&mut composed, fill_rect, BACKGROUND_COLOR);

    imageops::overlay(&mut composed, label, 0, 0);
    imageops::overlay(&mut composed, reconstruction, 0, label.height() as i64);
    composed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_stacks_images() {
        let label = RgbImage::from_pixel(30, 10, Rgb([1, 2, 3]));
        let recon = RgbImage::from_pixel(50, 20, Rgb([9, 9, 9]));
        let composed = compose_label_image(&label, &recon);
        assert_eq!(composed.dimensions(), (50, 30));
        assert_eq!(composed.get_pixel(0, 0), &Rgb([1, 2, 3]));
        assert_eq!(composed.get_pixel(40, 5), &BACKGROUND_COLOR);
        assert_eq!(composed.get_pixel(40, 15), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(LabelFont::from_path(Path::new("/no/such/font.ttf")).is_err());
    }

    #[test]
    fn test_system_font_measures_when_available() {
        let Some(font) = LabelFont::from_system() else {
            return;
        };
        let small = font.measure("Quercus", 17);
        let large = font.measure("Quercus", 42);
        assert!(large.width > small.width);
        assert!(large.height > small.height);
        assert_eq!(font.measure("", 20).width, 0);
    }

    #[test]
    fn test_render_empty_arrangement() {
        let Some(font) = LabelFont::from_system() else {
            return;
        };
        let arrangement = Arrangement {
            boxes: Vec::new(),
            width: 12,
            height: 12,
        };
        let canvas = render_reconstruction(&[], &arrangement, &font);
        assert_eq!(canvas.dimensions(), (12, 12));
    }
}
