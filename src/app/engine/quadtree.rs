use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_TREE_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };
        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        let right = point.x >= self.center.x;
        let lower = point.y >= self.center.y;
        (right as usize) | ((lower as usize) << 1)
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let dx = ((self.center.x - other.center.x).abs() - (self.half_extent + other.half_extent))
            .max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - (self.half_extent + other.half_extent))
            .max(0.0);
        (dx * dx) + (dy * dy)
    }

    fn distance_sq_to_point(self, point: Vec2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half_extent).max(0.0);
        let dy = ((point.y - self.center.y).abs() - self.half_extent).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

/// Point quadtree over one tick's position snapshot. Each aggregate carries a
/// charge-weighted barycenter so many-body repulsion can treat distant
/// subtrees as a single charge (Barnes-Hut).
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_charge: Vec2,
    pub(super) charge: f32,
    pub(super) items: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2], charges: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let items = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, items, positions, charges, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        items: Vec<usize>,
        positions: &[Vec2],
        charges: &[f32],
        depth: usize,
    ) -> Self {
        let mut charge = 0.0_f32;
        let mut center_of_charge = Vec2::ZERO;
        for &item in &items {
            let weight = charges.get(item).copied().unwrap_or(1.0);
            charge += weight;
            center_of_charge += positions[item] * weight;
        }
        if charge > 0.0 {
            center_of_charge /= charge;
        }

        let mut node = Self {
            bounds,
            center_of_charge,
            charge,
            items,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_TREE_DEPTH || node.items.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &item in &node.items {
            buckets[bounds.quadrant_for(positions[item])].push(item);
        }

        // All points in one quadrant means splitting cannot help (coincident
        // or near-coincident points); stay a leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::build_node(
                    bounds.child(quadrant),
                    bucket,
                    positions,
                    charges,
                    depth + 1,
                )));
            }
        }
        node.items.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    /// Collects every item within `radius` of `point`, pruning subtrees whose
    /// bounds lie entirely outside the query disk. Used by pointer
    /// hit-testing.
    pub(super) fn collect_within(
        &self,
        positions: &[Vec2],
        point: Vec2,
        radius: f32,
        out: &mut Vec<usize>,
    ) {
        if self.bounds.distance_sq_to_point(point) > radius * radius {
            return;
        }

        if self.is_leaf() {
            for &item in &self.items {
                if (positions[item] - point).length_sq() <= radius * radius {
                    out.push(item);
                }
            }
            return;
        }

        for child in self.children.iter().flatten() {
            child.collect_within(positions, point, radius, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_positions(side: usize, spacing: f32) -> Vec<Vec2> {
        let mut positions = Vec::new();
        for row in 0..side {
            for col in 0..side {
                positions.push(vec2(col as f32 * spacing, row as f32 * spacing));
            }
        }
        positions
    }

    #[test]
    fn build_returns_none_for_empty_or_non_finite_input() {
        assert!(QuadNode::build(&[], &[]).is_none());
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)], &[1.0]).is_none());
    }

    #[test]
    fn charge_is_conserved_across_the_tree() {
        let positions = grid_positions(6, 10.0);
        let charges = (0..positions.len())
            .map(|index| 1.0 + (index % 4) as f32)
            .collect::<Vec<_>>();
        let root = QuadNode::build(&positions, &charges).unwrap();

        let expected: f32 = charges.iter().sum();
        assert!((root.charge - expected).abs() < 1e-3);
    }

    #[test]
    fn radius_query_matches_linear_scan() {
        let positions = grid_positions(8, 7.0);
        let charges = vec![1.0; positions.len()];
        let root = QuadNode::build(&positions, &charges).unwrap();

        let point = vec2(20.0, 22.0);
        let radius = 15.0;
        let mut found = Vec::new();
        root.collect_within(&positions, point, radius, &mut found);
        found.sort_unstable();

        let expected = (0..positions.len())
            .filter(|&index| (positions[index] - point).length_sq() <= radius * radius)
            .collect::<Vec<_>>();
        assert_eq!(found, expected);
    }

    #[test]
    fn coincident_points_terminate_as_a_leaf() {
        let positions = vec![vec2(3.0, 3.0); 40];
        let charges = vec![1.0; 40];
        let root = QuadNode::build(&positions, &charges).unwrap();

        let mut found = Vec::new();
        root.collect_within(&positions, vec2(3.0, 3.0), 0.5, &mut found);
        assert_eq!(found.len(), 40);
    }
}
