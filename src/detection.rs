//! Detector output and its reduction to single-label [`Detection`]s.
//!
//! The detector itself is an external collaborator. It reports every box with a list of
//! scored categories; the sequence builder only needs one display label per box.

use std::path::Path;

use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rect::BoxRect;

/// Label prefix marking the block a program starts from.
pub const ANCHOR_PREFIX: &str = "run";

/// One recognized block with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoxRect,
    pub label: String,
}

impl Detection {
    pub fn new(bbox: BoxRect, label: impl Into<String>) -> Self {
        Self {
            bbox,
            label: label.into(),
        }
    }

    /// Whether this detection starts a program (case-sensitive `"run"` prefix).
    pub fn is_anchor(&self) -> bool {
        self.label.starts_with(ANCHOR_PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub score: f32,
}

/// Where the detector located a block.
///
/// In JSON this is either a box object or an array of `[x, y]` corners for detectors
/// that report rotated quads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Region {
    Rect(BoxRect),
    Polygon(Vec<[f32; 2]>),
}

impl Region {
    /// Axis-aligned box around the region; `None` for an empty or non-finite polygon.
    pub fn bounding_box(&self) -> Option<BoxRect> {
        match self {
            Region::Rect(bbox) => Some(*bbox),
            Region::Polygon(corners) => {
                let vertices: Vec<Point<f32>> =
                    corners.iter().map(|&[x, y]| Point::new(x, y)).collect();
                BoxRect::enclosing(&vertices)
            }
        }
    }
}

impl From<BoxRect> for Region {
    fn from(bbox: BoxRect) -> Self {
        Region::Rect(bbox)
    }
}

/// A detection as reported by the detector, before label reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: Region,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl RawDetection {
    /// Highest-scoring category; on ties the earliest one wins.
    pub fn top_category(&self) -> Option<&Category> {
        self.categories.iter().fold(None, |best, c| match best {
            Some(b) if b.score >= c.score => Some(b),
            _ => Some(c),
        })
    }

    /// Reduces to a [`Detection`] labeled with [`format_label`] of the top category.
    ///
    /// Returns `None` when the detector reported no categories for this box or its
    /// polygon has no usable corners.
    pub fn into_detection(self) -> Option<Detection> {
        let label = format_label(self.top_category()?);
        let Some(bbox) = self.bbox.bounding_box() else {
            log::debug!("dropping {label:?}: region has no finite corners");
            return None;
        };
        Some(Detection { bbox, label })
    }
}

/// Formats a category as `"<label>, <percent>%"`, truncating the percentage.
///
/// # Examples
///
/// ```
/// use block_sequence::detection::{Category, format_label};
///
/// let c = Category { label: "run".into(), score: 0.876 };
/// assert_eq!(format_label(&c), "run, 87%");
/// ```
pub fn format_label(category: &Category) -> String {
    format!("{}, {}%", category.label, (category.score * 100.0) as i32)
}

/// Result filtering applied to raw detector output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    pub max_results: usize,
    pub score_threshold: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_results: 50,
            score_threshold: 0.3,
        }
    }
}

impl DetectorOptions {
    /// Drops low-scoring and category-less boxes, caps the count at `max_results`,
    /// and reduces the survivors to [`Detection`]s. Input order is preserved.
    pub fn apply(&self, raw: Vec<RawDetection>) -> Vec<Detection> {
        let total = raw.len();
        let detections: Vec<Detection> = raw
            .into_iter()
            .filter(|r| {
                r.top_category()
                    .is_some_and(|c| c.score >= self.score_threshold)
            })
            .take(self.max_results)
            .filter_map(RawDetection::into_detection)
            .collect();

        log::debug!(
            "kept {} of {} raw detections (threshold {}, max {})",
            detections.len(),
            total,
            self.score_threshold,
            self.max_results
        );
        detections
    }
}

/// Reads a JSON array of [`RawDetection`] from `path`.
pub fn load_raw_detections(path: impl AsRef<Path>) -> Result<Vec<RawDetection>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
