//! Collision pass for the sibling groups of one arc.
//!
//! Groups are placed left to right at their ideal positions. When a group's
//! ideal left edge falls before the right edge of the previous group, it is
//! pushed right by exactly the overlap, and the push carries on to following
//! groups until one fits where it wants to be. Each such run of displaced
//! groups is one [`Collision`].
//!
//! If an arc ends up with more than one collision, or the displaced groups
//! would run past the end of the arc, ideal placement is abandoned and the
//! groups are packed together in the middle of the arc instead.

/// One group as seen by the collision pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupExtent {
    /// Where the middle of the group would ideally sit.
    pub ideal_center: f64,
    /// Arc length occupied by the group.
    pub span: f64,
}

/// A run of consecutive displaced groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Index of the group the run collided with (placed before the run).
    pub anchor: usize,
    /// `(group index, displacement)` for each displaced group, in arc order.
    pub displacements: Vec<(usize, f64)>,
}

impl Collision {
    pub fn total_displacement(&self) -> f64 {
        self.displacements.iter().map(|(_, d)| d).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArcPlacement {
    /// Left edge of every group: ideal position plus its displacement.
    Ideal {
        starts: Vec<f64>,
        collisions: Vec<Collision>,
    },
    /// All groups packed contiguously starting at `start`.
    Crowded {
        start: f64,
        collisions: Vec<Collision>,
    },
}

impl ArcPlacement {
    pub fn collisions(&self) -> &[Collision] {
        match self {
            ArcPlacement::Ideal { collisions, .. } | ArcPlacement::Crowded { collisions, .. } => collisions,
        }
    }

    pub fn is_crowded(&self) -> bool {
        matches!(self, ArcPlacement::Crowded { .. })
    }

    /// Left edge of every group, whichever strategy was chosen.
    pub fn group_starts(&self, spans: &[f64]) -> Vec<f64> {
        match self {
            ArcPlacement::Ideal { starts, .. } => starts.clone(),
            ArcPlacement::Crowded { start, .. } => {
                let mut x = *start;
                spans
                    .iter()
                    .map(|span| {
                        let s = x;
                        x += span;
                        s
                    })
                    .collect()
            }
        }
    }
}

/// Groups packed together and centered in `[arc_start, arc_end]`.
pub fn crowd(groups: &[GroupExtent], arc_start: f64, arc_end: f64) -> ArcPlacement {
    crowd_with(groups, arc_start, arc_end, Vec::new())
}

fn crowd_with(groups: &[GroupExtent], arc_start: f64, arc_end: f64, collisions: Vec<Collision>) -> ArcPlacement {
    let total: f64 = groups.iter().map(|g| g.span).sum();
    ArcPlacement::Crowded {
        start: arc_start + ((arc_end - arc_start) - total) / 2.0,
        collisions,
    }
}

/// Place `groups` (in arc order) within `[arc_start, arc_end]`.
pub fn resolve_collisions(groups: &[GroupExtent], arc_start: f64, arc_end: f64) -> ArcPlacement {
    let mut starts = Vec::with_capacity(groups.len());
    let mut collisions: Vec<Collision> = Vec::new();
    let mut open: Option<Collision> = None;
    let mut left_boundary = arc_start;

    for (i, group) in groups.iter().enumerate() {
        let ideal_start = group.ideal_center - group.span / 2.0;
        let mut start = ideal_start;

        if ideal_start < left_boundary {
            // Being pushed off the start of the arc is not a collision.
            if i > 0 {
                let overlap = left_boundary - ideal_start;
                match open.as_mut() {
                    Some(collision) => collision.displacements.push((i, overlap)),
                    None => {
                        open = Some(Collision {
                            anchor: i - 1,
                            displacements: vec![(i, overlap)],
                        })
                    }
                }
            }
            start = left_boundary;
        } else if let Some(collision) = open.take() {
            collisions.push(collision);
        }

        starts.push(start);
        left_boundary = start + group.span;
    }
    collisions.extend(open);

    // Tolerate float noise at the arc end.
    let overflows = left_boundary > arc_end + 1e-6;
    if collisions.len() > 1 || overflows {
        return crowd_with(groups, arc_start, arc_end, collisions);
    }
    ArcPlacement::Ideal { starts, collisions }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(center: f64, span: f64) -> GroupExtent {
        GroupExtent { ideal_center: center, span }
    }

    #[test]
    fn test_no_collision_keeps_ideal_positions() {
        let groups = [g(50.0, 40.0), g(150.0, 40.0), g(250.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        assert_eq!(
            placement,
            ArcPlacement::Ideal { starts: vec![30.0, 130.0, 230.0], collisions: vec![] }
        );
    }

    #[test]
    fn test_single_collision_displaces_by_overlap() {
        // second group wants [70, 110) but first ends at 80
        let groups = [g(60.0, 40.0), g(90.0, 40.0), g(300.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        match &placement {
            ArcPlacement::Ideal { starts, collisions } => {
                assert_eq!(starts, &vec![40.0, 80.0, 280.0]);
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].anchor, 0);
                assert_eq!(collisions[0].displacements, vec![(1, 10.0)]);
            }
            other => panic!("expected ideal placement, got {:?}", other),
        }
    }

    #[test]
    fn test_chain_propagates_to_following_groups() {
        let groups = [g(20.0, 40.0), g(30.0, 40.0), g(70.0, 40.0), g(300.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        let collisions = placement.collisions();
        assert!(!placement.is_crowded());
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].displacements, vec![(1, 30.0), (2, 30.0)]);
        assert_eq!(collisions[0].total_displacement(), 60.0);
    }

    #[test]
    fn test_two_chains_crowd_the_arc() {
        let groups = [g(20.0, 40.0), g(30.0, 40.0), g(200.0, 40.0), g(210.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        assert_eq!(placement.collisions().len(), 2);
        match placement {
            ArcPlacement::Crowded { start, .. } => assert_eq!(start, 120.0),
            other => panic!("expected crowded placement, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_past_arc_end_crowds() {
        let groups = [g(380.0, 40.0), g(390.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        assert!(placement.is_crowded());
        assert_eq!(placement.group_starts(&[40.0, 40.0]), vec![160.0, 200.0]);
    }

    #[test]
    fn test_clamp_to_arc_start_is_not_a_collision() {
        let groups = [g(-50.0, 40.0), g(100.0, 40.0)];
        let placement = resolve_collisions(&groups, 0.0, 400.0);
        assert_eq!(
            placement,
            ArcPlacement::Ideal { starts: vec![0.0, 80.0], collisions: vec![] }
        );
    }
}
