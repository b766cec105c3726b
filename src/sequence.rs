//! Reconstruction of a block program from the spatial layout of its detections.
//!
//! A program starts at the block labeled `run`. Its first overlapping neighbor fixes the
//! direction of the program: the line through both centers. The chain then grows one
//! block at a time, from the last block appended, to any unclaimed block that overlaps it
//! and whose center stays within [`SEQUENCE_LINE_TOLERANCE`] of that line.
//!
//! Every scan is first-match in input order. This is a greedy walk, not a nearest-neighbor
//! search, so the same detections in a different order can produce a different program.

use imageproc::point::Point;

use crate::detection::Detection;

/// Maximum perpendicular distance, in pixels, between a chained block's center and the
/// reference line.
pub const SEQUENCE_LINE_TOLERANCE: f32 = 200.0;

/// The line through the anchor's center and the first link's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceLine {
    Sloped { anchor: Point<f32>, slope: f32 },
    /// Both centers share an `x`; the slope is undefined.
    Vertical { x: f32 },
}

impl ReferenceLine {
    pub fn through(anchor: Point<f32>, next: Point<f32>) -> Self {
        let slope = (next.y - anchor.y) / (next.x - anchor.x);
        if slope.is_finite() {
            ReferenceLine::Sloped { anchor, slope }
        } else {
            // Shared x, or so close that the slope overflows.
            ReferenceLine::Vertical { x: anchor.x }
        }
    }

    /// Perpendicular distance from `p` to the line.
    ///
    /// The sloped form is `|m*(px - lx) - (py - ly)| / sqrt(m^2 + 1)`, i.e. the line
    /// `m*x - y + (ly - m*lx) = 0`. `hypot` keeps the denominator finite for steep lines.
    pub fn distance_to(&self, p: Point<f32>) -> f32 {
        match *self {
            ReferenceLine::Sloped { anchor, slope } => {
                (slope * (p.x - anchor.x) - (p.y - anchor.y)).abs() / slope.hypot(1.0)
            }
            ReferenceLine::Vertical { x } => (p.x - x).abs(),
        }
    }

    /// NaN distances from non-finite centers never pass.
    pub fn within_tolerance(&self, p: Point<f32>) -> bool {
        self.distance_to(p) < SEQUENCE_LINE_TOLERANCE
    }
}

/// Where the build of a [`Sequence`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStage {
    SearchingAnchor,
    SearchingFirstLink,
    Chaining,
    Done,
}

/// An ordered program, borrowing the detections it was built from.
///
/// Members are tracked by their index in the input slice, so two detections with equal
/// boxes and labels are still distinct blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<'a> {
    detections: &'a [Detection],
    indices: Vec<usize>,
    line: Option<ReferenceLine>,
    stopped_at: SequenceStage,
}

impl<'a> Sequence<'a> {
    fn empty(detections: &'a [Detection]) -> Self {
        Self {
            detections,
            indices: Vec::new(),
            line: None,
            stopped_at: SequenceStage::SearchingAnchor,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Input indices of the members, in program order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Detection> + '_ {
        self.indices.iter().map(|&i| &self.detections[i])
    }

    pub fn labels(&self) -> Vec<&'a str> {
        self.iter().map(|d| d.label.as_str()).collect()
    }

    pub fn anchor(&self) -> Option<&'a Detection> {
        self.indices.first().map(|&i| &self.detections[i])
    }

    pub fn reference_line(&self) -> Option<ReferenceLine> {
        self.line
    }

    /// The stage that had no further match.
    ///
    /// `SearchingAnchor` means there was no `run` block, `SearchingFirstLink` means the
    /// anchor stands alone, and `Done` means at least one link was found.
    pub fn stage(&self) -> SequenceStage {
        self.stopped_at
    }

    fn push(&mut self, index: usize) {
        debug_assert!(!self.contains(index));
        self.indices.push(index);
    }

    fn last(&self) -> Option<&'a Detection> {
        self.indices.last().map(|&i| &self.detections[i])
    }
}

/// First unclaimed detection, in input order, that overlaps `from` and passes `accept`.
fn first_overlapping<F>(sequence: &Sequence<'_>, from: &Detection, accept: F) -> Option<usize>
where
    F: Fn(&Detection) -> bool,
{
    sequence
        .detections
        .iter()
        .enumerate()
        .find(|(i, d)| !sequence.contains(*i) && d.bbox.overlaps(&from.bbox) && accept(*d))
        .map(|(i, _)| i)
}

/// Builds the program sequence for one image's detections.
///
/// Returns an empty sequence when no label starts with `run`, and a one-block sequence
/// when nothing overlaps the anchor. Never fails and keeps no state between calls.
///
/// # Examples
///
/// ```
/// use block_sequence::detection::Detection;
/// use block_sequence::rect::BoxRect;
/// use block_sequence::sequence::build_sequence;
///
/// let detections = vec![
///     Detection::new(BoxRect::new(0.0, 0.0, 10.0, 10.0), "run"),
///     Detection::new(BoxRect::new(5.0, 5.0, 15.0, 15.0), "1"),
/// ];
///
/// let sequence = build_sequence(&detections);
/// assert_eq!(sequence.labels(), vec!["run", "1"]);
/// ```
pub fn build_sequence(detections: &[Detection]) -> Sequence<'_> {
    let mut sequence = Sequence::empty(detections);

    let Some(anchor_index) = detections.iter().position(Detection::is_anchor) else {
        log::debug!("no anchor among {} detections", detections.len());
        return sequence;
    };
    let anchor = &detections[anchor_index];
    sequence.push(anchor_index);
    sequence.stopped_at = SequenceStage::SearchingFirstLink;

    let Some(first_index) = first_overlapping(&sequence, anchor, |_| true) else {
        log::debug!("anchor {:?} has no overlapping neighbor", anchor.label);
        return sequence;
    };
    sequence.push(first_index);
    sequence.stopped_at = SequenceStage::Chaining;

    let line = ReferenceLine::through(anchor.bbox.center(), detections[first_index].bbox.center());
    if let ReferenceLine::Vertical { x } = line {
        log::debug!("reference line is vertical at x = {x}");
    }
    sequence.line = Some(line);

    while let Some(last) = sequence.last() {
        let next = first_overlapping(&sequence, last, |candidate| {
            let ok = line.within_tolerance(candidate.bbox.center());
            if !ok {
                log::trace!(
                    "rejecting {:?}: {} px from reference line",
                    candidate.label,
                    line.distance_to(candidate.bbox.center())
                );
            }
            ok
        });
        match next {
            Some(index) => sequence.push(index),
            None => break,
        }
    }

    sequence.stopped_at = SequenceStage::Done;
    log::debug!("built sequence of {} blocks", sequence.len());
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::BoxRect;

    fn det(left: f32, top: f32, right: f32, bottom: f32, label: &str) -> Detection {
        Detection::new(BoxRect::new(left, top, right, bottom), label)
    }

    fn assert_float_eq(a: f32, b: f32) {
        assert!(
            (a - b).abs() < 1e-4,
            "Assertion failed: expected {}, got {}",
            b,
            a
        );
    }

    #[test]
    fn test_reference_line_distance() {
        // y = x through the origin.
        let line = ReferenceLine::through(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert_eq!(
            line,
            ReferenceLine::Sloped {
                anchor: Point::new(0.0, 0.0),
                slope: 1.0
            }
        );
        assert_float_eq(line.distance_to(Point::new(5.0, 5.0)), 0.0);
        assert_float_eq(line.distance_to(Point::new(10.0, 0.0)), 50f32.sqrt());

        // Horizontal line y = 5.
        let flat = ReferenceLine::through(Point::new(5.0, 5.0), Point::new(15.0, 5.0));
        assert_float_eq(flat.distance_to(Point::new(25.0, 5.0)), 0.0);
        assert_float_eq(flat.distance_to(Point::new(25.0, 500.0)), 495.0);
    }

    #[test]
    fn test_reference_line_vertical() {
        let line = ReferenceLine::through(Point::new(5.0, 5.0), Point::new(5.0, 50.0));
        assert_eq!(line, ReferenceLine::Vertical { x: 5.0 });
        assert_float_eq(line.distance_to(Point::new(5.0, 1000.0)), 0.0);
        assert_float_eq(line.distance_to(Point::new(-45.0, 0.0)), 50.0);
        assert!(line.within_tolerance(Point::new(204.0, 0.0)));
        assert!(!line.within_tolerance(Point::new(205.0, 0.0)));
    }

    #[test]
    fn test_reference_line_steep_and_overflowing_slopes() {
        // Slope 5e30: squaring it would overflow f32.
        let steep = ReferenceLine::through(Point::new(0.0, 0.0), Point::new(1e-30, 5.0));
        assert!(matches!(steep, ReferenceLine::Sloped { .. }));
        assert!(steep.within_tolerance(Point::new(0.0, 100.0)));
        assert!((steep.distance_to(Point::new(300.0, 0.0)) - 300.0).abs() < 0.1);
        assert!(!steep.within_tolerance(Point::new(300.0, 0.0)));

        // Subnormal dx: the slope itself is infinite.
        let overflow = ReferenceLine::through(Point::new(0.0, 0.0), Point::new(1e-40, 5.0));
        assert_eq!(overflow, ReferenceLine::Vertical { x: 0.0 });
        assert!(!overflow.within_tolerance(Point::new(300.0, 0.0)));
    }

    #[test]
    fn test_tolerance_is_strict_and_rejects_nan() {
        let flat = ReferenceLine::through(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(flat.within_tolerance(Point::new(0.0, 199.9)));
        assert!(!flat.within_tolerance(Point::new(0.0, 200.0)));
        assert!(!flat.within_tolerance(Point::new(f32::NAN, 0.0)));
    }

    #[test]
    fn test_empty_input() {
        let sequence = build_sequence(&[]);
        assert!(sequence.is_empty());
        assert_eq!(sequence.stage(), SequenceStage::SearchingAnchor);
        assert!(sequence.anchor().is_none());
    }

    #[test]
    fn test_stage_reports_stop_point() {
        let lone = vec![det(0.0, 0.0, 10.0, 10.0, "run")];
        let sequence = build_sequence(&lone);
        assert_eq!(sequence.stage(), SequenceStage::SearchingFirstLink);
        assert!(sequence.reference_line().is_none());

        let pair = vec![
            det(0.0, 0.0, 10.0, 10.0, "run"),
            det(5.0, 0.0, 15.0, 10.0, "1"),
        ];
        let sequence = build_sequence(&pair);
        assert_eq!(sequence.stage(), SequenceStage::Done);
        assert_eq!(
            sequence.reference_line(),
            Some(ReferenceLine::Sloped {
                anchor: Point::new(5.0, 5.0),
                slope: 0.0
            })
        );
    }

    #[test]
    fn test_first_anchor_wins() {
        let detections = vec![
            det(100.0, 100.0, 110.0, 110.0, "1"),
            det(0.0, 0.0, 10.0, 10.0, "run, 80%"),
            det(500.0, 500.0, 510.0, 510.0, "run, 95%"),
        ];
        let sequence = build_sequence(&detections);
        assert_eq!(sequence.indices(), &[1]);
        assert_eq!(sequence.anchor().unwrap().label, "run, 80%");
    }

    #[test]
    fn test_first_link_only_needs_overlap() {
        let detections = vec![
            det(0.0, 0.0, 1000.0, 10.0, "run"),
            det(990.0, 0.0, 1000.0, 900.0, "tall"),
        ];
        let sequence = build_sequence(&detections);
        assert_eq!(sequence.labels(), vec!["run", "tall"]);
    }

    #[test]
    fn test_identical_detections_are_distinct_members() {
        let detections = vec![
            det(0.0, 0.0, 10.0, 10.0, "run"),
            det(5.0, 0.0, 15.0, 10.0, "move"),
            det(5.0, 0.0, 15.0, 10.0, "move"),
        ];
        let sequence = build_sequence(&detections);
        assert_eq!(sequence.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_mutual_overlap_terminates() {
        // Every box overlaps every other; membership alone stops the loop.
        let detections = vec![
            det(0.0, 0.0, 20.0, 20.0, "run"),
            det(1.0, 1.0, 21.0, 21.0, "a"),
            det(2.0, 2.0, 22.0, 22.0, "b"),
            det(3.0, 3.0, 23.0, 23.0, "c"),
        ];
        let sequence = build_sequence(&detections);
        assert_eq!(sequence.indices(), &[0, 1, 2, 3]);
    }
}
