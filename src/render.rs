//! Debug overlays for checking a reconstructed program against the photo it came from.

use std::path::Path;

use image::{DynamicImage, ImageError, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};

use crate::colors::sequence_colors;
use crate::detection::Detection;
use crate::error::{Error, Result};
use crate::rect::BoxRect;
use crate::sequence::Sequence;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Outline color for every detection.
    pub box_color: [u8; 3],
    /// Outline thickness in pixels, drawn inward from the box edge. Capped at the
    /// canvas size.
    pub stroke_width: u32,
    /// Join consecutive sequence members with a line through their centers.
    pub draw_path: bool,
    /// HSL saturation and lightness of the per-member palette, in `0.0..=1.0`.
    pub path_saturation: f32,
    pub path_lightness: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            box_color: [255, 0, 0],
            stroke_width: 4,
            draw_path: true,
            path_saturation: 0.9,
            path_lightness: 0.5,
        }
    }
}

fn draw_thick_rect_mut(canvas: &mut RgbImage, bbox: &BoxRect, stroke_width: u32, color: Rgb<u8>) {
    if ![bbox.left, bbox.top, bbox.right, bbox.bottom]
        .iter()
        .all(|v| v.is_finite())
    {
        return;
    }
    // Bounds the pass count for oversized configs.
    let stroke_width = stroke_width.clamp(1, canvas.width().max(canvas.height()).max(1));
    for k in 0..stroke_width {
        let k = k as f32;
        let inset = BoxRect::new(bbox.left + k, bbox.top + k, bbox.right - k, bbox.bottom - k);
        if !(inset.width() > 0.0 && inset.height() > 0.0) {
            break;
        }
        draw_hollow_rect_mut(canvas, inset.to_pixel_rect(), color);
    }
}

/// Outlines every detection with `options.box_color`.
pub fn draw_detections_mut(
    canvas: &mut RgbImage,
    detections: &[Detection],
    options: &RenderOptions,
) {
    let color = Rgb(options.box_color);
    for detection in detections {
        draw_thick_rect_mut(canvas, &detection.bbox, options.stroke_width, color);
    }
}

/// Outlines each sequence member in its own color and, if enabled, draws the path
/// from center to center in program order.
pub fn draw_sequence_mut(canvas: &mut RgbImage, sequence: &Sequence<'_>, options: &RenderOptions) {
    let colors = sequence_colors(sequence.len(), options.path_saturation, options.path_lightness);

    for (detection, color) in sequence.iter().zip(&colors) {
        draw_thick_rect_mut(canvas, &detection.bbox, options.stroke_width, *color);
    }

    if !options.draw_path {
        return;
    }
    let centers: Vec<_> = sequence.iter().map(|d| d.bbox.center()).collect();
    for (pair, color) in centers.windows(2).zip(&colors) {
        draw_line_segment_mut(canvas, (pair[0].x, pair[0].y), (pair[1].x, pair[1].y), *color);
    }
}

/// Returns a copy of `image` with all detections outlined and the sequence drawn on top.
pub fn render_overlay(
    image: &DynamicImage,
    detections: &[Detection],
    sequence: &Sequence<'_>,
    options: &RenderOptions,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    draw_detections_mut(&mut canvas, detections, options);
    draw_sequence_mut(&mut canvas, sequence, options);
    canvas
}

/// Reads `image_path`, draws the overlay and writes it to `output_path`.
///
/// The output format follows the extension of `output_path`.
pub fn write_overlay(
    image_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    detections: &[Detection],
    sequence: &Sequence<'_>,
    options: &RenderOptions,
) -> Result<()> {
    let (image_path, output_path) = (image_path.as_ref(), output_path.as_ref());
    let image = image::open(image_path).map_err(|e| image_error(image_path, e))?;
    let overlay = render_overlay(&image, detections, sequence, options);
    overlay
        .save(output_path)
        .map_err(|e| image_error(output_path, e))?;
    log::debug!("wrote overlay to {}", output_path.display());
    Ok(())
}

fn image_error(path: &Path, err: ImageError) -> Error {
    match err {
        ImageError::IoError(source) => Error::Io {
            path: path.to_path_buf(),
            source,
        },
        other => Error::Image(other),
    }
}
