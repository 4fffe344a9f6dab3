//! Immutable wave point sequences.

use std::ops::Deref;
use std::sync::Arc;

use glam::DVec2;

/// Ordered 2D points describing one wave's shape for one render tick.
///
/// The points are shared and never mutated. A new tick builds a new sequence
/// and swaps it in whole, so a renderer holding the previous one can still
/// interpolate from it.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePointSequence {
    points: Arc<[DVec2]>,
}

impl WavePointSequence {
    pub fn new(points: Vec<DVec2>) -> Self {
        Self {
            points: points.into(),
        }
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Same points flipped about the horizontal center line of a view
    pub fn mirrored(&self, height: f64) -> Vec<DVec2> {
        self.points
            .iter()
            .map(|p| DVec2::new(p.x, height - p.y))
            .collect()
    }

    /// Curve height at `x`, linearly interpolated between neighbouring points.
    ///
    /// Returns `None` for an empty sequence or when `x` lies outside the
    /// sequence's x extent.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if x < first.x || x > last.x {
            return None;
        }
        let idx = self.points.partition_point(|p| p.x < x);
        if idx == 0 {
            return Some(first.y);
        }
        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let span = b.x - a.x;
        if span <= 0.0 {
            return Some(b.y);
        }
        Some(a.y + (b.y - a.y) * (x - a.x) / span)
    }
}

impl Default for WavePointSequence {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Deref for WavePointSequence {
    type Target = [DVec2];

    fn deref(&self) -> &[DVec2] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_points() {
        let seq = WavePointSequence::new(vec![DVec2::new(0.0, 1.0), DVec2::new(2.0, 3.0)]);
        let copy = seq.clone();
        assert!(Arc::ptr_eq(&seq.points, &copy.points));
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_mirrored_flips_vertically() {
        let seq = WavePointSequence::new(vec![DVec2::new(1.0, 10.0), DVec2::new(2.0, 70.0)]);
        assert_eq!(
            seq.mirrored(100.0),
            vec![DVec2::new(1.0, 90.0), DVec2::new(2.0, 30.0)]
        );
    }

    #[test]
    fn test_y_at_interpolates() {
        let seq = WavePointSequence::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(20.0, 0.0),
        ]);
        assert_eq!(seq.y_at(0.0), Some(0.0));
        assert_eq!(seq.y_at(5.0), Some(5.0));
        assert_eq!(seq.y_at(15.0), Some(5.0));
        assert_eq!(seq.y_at(20.0), Some(0.0));
        assert_eq!(seq.y_at(21.0), None);
        assert_eq!(WavePointSequence::default().y_at(0.0), None);
    }
}
