// "Graph paper" placement of measured clusters.
//
// Grid positions are visited column by column, top to bottom. Each one is
// stacked below the previous position of its column and pushed right of
// anything already placed on the unit rows it covers. `boundary[y]` is the
// first free x unit on unit row y.

#[derive(Debug, Clone, Default)]
pub struct UnitGraph {
    boundary: Vec<i32>,
    y_unit: i32,
}

impl UnitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.boundary.clear();
        self.y_unit = 0;
    }

    /// Start placing the next grid column from the top.
    pub fn next_column(&mut self) {
        self.y_unit = 0;
    }

    /// Place a footprint of `x_span` by `y_span` units below the previous
    /// one and return its `(x_unit, y_unit)`. Zero spans take no room.
    pub fn place(&mut self, x_span: i32, y_span: i32) -> (i32, i32) {
        let y_unit = self.y_unit;
        let x_unit = (0..y_span.max(1))
            .map(|dy| self.boundary_at(y_unit + dy))
            .max()
            .unwrap_or(0);

        for y in y_unit..y_unit + y_span {
            let edge = x_unit + x_span;
            let slot = self.slot(y);
            *slot = (*slot).max(edge);
        }

        self.y_unit += y_span;
        (x_unit, y_unit)
    }

    fn boundary_at(&self, y: i32) -> i32 {
        self.boundary.get(y as usize).copied().unwrap_or(0)
    }

    fn slot(&mut self, y: i32) -> &mut i32 {
        let y = y as usize;
        if self.boundary.len() <= y {
            self.boundary.resize(y + 1, 0);
        }
        &mut self.boundary[y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_stacks_downward() {
        let mut g = UnitGraph::new();
        assert_eq!(g.place(3, 2), (0, 0));
        assert_eq!(g.place(2, 4), (0, 2));
    }

    #[test]
    fn test_next_column_clears_taller_neighbours() {
        let mut g = UnitGraph::new();
        g.place(3, 2);
        g.place(5, 4);
        g.next_column();
        // covers unit rows 0..3, and row 2 is taken up to x = 5
        assert_eq!(g.place(1, 3), (5, 0));
        assert_eq!(g.place(1, 1), (5, 3));
    }

    #[test]
    fn test_empty_positions_take_no_room() {
        let mut g = UnitGraph::new();
        assert_eq!(g.place(0, 0), (0, 0));
        assert_eq!(g.place(2, 2), (0, 0));
        g.next_column();
        assert_eq!(g.place(0, 0), (2, 0));
        assert_eq!(g.place(1, 1), (2, 0));
    }

    #[test]
    fn test_clear_forgets_boundaries() {
        let mut g = UnitGraph::new();
        g.place(4, 4);
        g.clear();
        assert_eq!(g.place(1, 1), (0, 0));
    }
}
