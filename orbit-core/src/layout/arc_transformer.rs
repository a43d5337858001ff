// Arc coordinates -> ring coordinates.
//
// Slices work on a ring as if it were a straight line of `ring_span` pixels.
// The transformer bends that line around the ring. Arc position 0 is the
// seam where the two ends of the line meet; the seam is rotated so that it
// falls at the start of the first slice's arc rather than through the
// middle of a populated arc.
//
// One transformer serves one ring for one layout pass.

use super::{LayoutConfig, PointI};

#[derive(Debug, Clone)]
pub struct ArcTransformer {
    center: PointI,
    radius: f64,
    ring_span: i32,
    /// Arc position (in pixels from 3 o'clock) that arc coordinate 0 maps to.
    offset: f64,
}

impl ArcTransformer {
    pub fn new(center: PointI, radius: f64, ring_span: i32, first_arc_span: i32, cfg: &LayoutConfig) -> Self {
        let offset = cfg.first_arc_anchor * ring_span as f64 - first_arc_span as f64 / 2.0;
        Self { center, radius, ring_span, offset }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn ring_span(&self) -> i32 {
        self.ring_span
    }

    /// Point on the ring at `arc_position` pixels along the arc.
    pub fn point_at(&self, arc_position: i32) -> PointI {
        if self.ring_span <= 0 || self.radius <= 0.0 {
            return self.center;
        }
        let shifted = (arc_position as f64 + self.offset).rem_euclid(self.ring_span as f64);
        let theta = shifted / self.radius;
        PointI {
            x: self.center.x + (self.radius * theta.cos()) as i32,
            y: self.center.y + (self.radius * theta.sin()) as i32,
        }
    }

    /// Top-left corner of a canvas centered at `arc_position`.
    pub fn canvas_origin_at(&self, arc_position: i32, cfg: &LayoutConfig) -> PointI {
        let p = self.point_at(arc_position);
        cfg.center_canvas_at(p.x, p.y)
    }

    /// Where a group of children would ideally be centered on this ring: the
    /// parent's arc position scaled by the ratio of the two radii, so the
    /// group sits radially outward from the parent.
    pub fn ideal_position_for(&self, parent_arc_position: i32, parent_ring_radius: f64) -> f64 {
        if parent_ring_radius <= 0.0 {
            return parent_arc_position as f64;
        }
        (self.radius / parent_ring_radius) * parent_arc_position as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ring(radius: f64, first_arc_span: i32) -> ArcTransformer {
        let span = (2.0 * PI * radius) as i32;
        ArcTransformer::new(PointI::new(0, 0), radius, span, first_arc_span, &LayoutConfig::default())
    }

    #[test]
    fn test_seam_sits_at_first_arc_anchor() {
        // With an empty first arc, arc position 0 lands at 7/8 of the ring,
        // which is up and to the right of the center on screen.
        let t = ring(1000.0, 0);
        let p = t.point_at(0);
        assert!(p.x > 690 && p.x < 720, "x = {}", p.x);
        assert!(p.y < -690 && p.y > -720, "y = {}", p.y);
    }

    #[test]
    fn test_first_arc_is_centered_on_anchor() {
        let t = ring(1000.0, 400);
        // middle of the first arc
        let mid = t.point_at(200);
        let unshifted = ring(1000.0, 0).point_at(0);
        assert!((mid.x - unshifted.x).abs() <= 1);
        assert!((mid.y - unshifted.y).abs() <= 1);
    }

    #[test]
    fn test_points_stay_on_ring() {
        let t = ring(500.0, 100);
        for pos in [0, 250, 1000, 2500, 3100, -40] {
            let p = t.point_at(pos);
            let r = ((p.x * p.x + p.y * p.y) as f64).sqrt();
            assert!((r - 500.0).abs() < 2.0, "radius {} at {}", r, pos);
        }
    }

    #[test]
    fn test_ideal_position_scales_with_radius() {
        let t = ring(600.0, 0);
        assert_eq!(t.ideal_position_for(100, 300.0), 200.0);
        assert_eq!(t.ideal_position_for(100, 0.0), 100.0);
    }

    #[test]
    fn test_degenerate_ring_maps_to_center() {
        let t = ArcTransformer::new(PointI::new(5, 7), 0.0, 0, 0, &LayoutConfig::default());
        assert_eq!(t.point_at(123), PointI::new(5, 7));
    }
}
