use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
    pub(super) max_distance_sq: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
    pub(super) max_pair_distance_sq: f32,
}

fn separation_direction(delta: Vec2, distance: f32, a: usize, b: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        // Coincident nodes get a deterministic pseudo-random direction so
        // they break apart instead of stacking forever.
        let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// Barnes-Hut accumulation of many-body repulsion on one node. Aggregates
/// far enough away (side / distance < theta) act as a single charge;
/// anything beyond the interaction cap contributes nothing.
pub(super) fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.charge <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.items {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            let distance_sq = delta.length_sq();
            if distance_sq > params.max_distance_sq {
                continue;
            }
            let distance = distance_sq.sqrt();
            let direction = separation_direction(delta, distance, index, other);
            *force +=
                direction * (params.strength * charges[other] / (distance_sq + params.softening));
        }
        return;
    }

    let delta = point - node.center_of_charge;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate =
        !node.bounds.contains(point) && (node.bounds.side_length() / distance) < params.theta;

    if can_approximate {
        if distance_sq <= params.max_distance_sq {
            let direction = delta / distance;
            *force += direction * (params.strength * node.charge / (distance_sq + params.softening));
        }
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion(child, index, positions, charges, params, force);
    }
}

/// Dual-tree traversal accumulating pairwise overlap corrections. Each node
/// is a disk of visual radius plus padding; overlapping disks are pushed
/// apart proportionally to the overlap depth.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_pair_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        let mut resolve = |from: usize, to: usize| {
            let delta = positions[from] - positions[to];
            let distance_sq = delta.length_sq();
            let distance = distance_sq.sqrt();
            let min_distance = radii[from] + radii[to] + (params.padding * 2.0);
            if distance < min_distance {
                let direction = separation_direction(delta, distance, from, to);
                let push = (min_distance - distance) * params.strength;
                forces[from] += direction * push;
                forces[to] -= direction * push;
            }
        };

        if same_node {
            for i in 0..node_a.items.len() {
                for j in (i + 1)..node_a.items.len() {
                    resolve(node_a.items[i], node_a.items[j]);
                }
            }
        } else {
            for &from in &node_a.items {
                for &to in &node_b.items {
                    resolve(from, to);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };
            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);
            for second in (first + 1)..4 {
                if let Some(child_b) = node_a.children[second].as_ref() {
                    accumulate_collision_pairs(
                        child_a, child_b, false, positions, radii, params, forces,
                    );
                }
            }
        }
        return;
    }

    // Descend into the larger side so the recursion keeps shrinking.
    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_respects_the_interaction_cap() {
        let positions = vec![vec2(0.0, 0.0), vec2(1000.0, 0.0)];
        let charges = vec![10.0, 10.0];
        let root = QuadNode::build(&positions, &charges).unwrap();

        let params = RepulsionParams {
            strength: 1000.0,
            softening: 500.0,
            theta: 0.75,
            max_distance_sq: 400.0 * 400.0,
        };
        let mut force = Vec2::ZERO;
        accumulate_repulsion(&root, 0, &positions, &charges, params, &mut force);
        assert_eq!(force, Vec2::ZERO);

        let near = vec![vec2(0.0, 0.0), vec2(50.0, 0.0)];
        let root = QuadNode::build(&near, &charges).unwrap();
        let mut force = Vec2::ZERO;
        accumulate_repulsion(&root, 0, &near, &charges, params, &mut force);
        assert!(force.x < 0.0, "node 0 should be pushed away from node 1");
        assert!(force.y.abs() < 1e-4);
    }

    #[test]
    fn overlapping_disks_are_pushed_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(4.0, 0.0)];
        let radii = vec![10.0, 10.0];
        let charges = vec![1.0, 1.0];
        let root = QuadNode::build(&positions, &charges).unwrap();

        let params = CollisionParams {
            strength: 0.5,
            padding: 2.0,
            max_pair_distance_sq: 100.0 * 100.0,
        };
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_collision_pairs(&root, &root, true, &positions, &radii, params, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert!((forces[0].x + forces[1].x).abs() < 1e-4, "pushes are symmetric");
    }

    #[test]
    fn separated_disks_feel_no_collision_force() {
        let positions = vec![vec2(0.0, 0.0), vec2(60.0, 0.0)];
        let radii = vec![10.0, 10.0];
        let charges = vec![1.0, 1.0];
        let root = QuadNode::build(&positions, &charges).unwrap();

        let params = CollisionParams {
            strength: 0.5,
            padding: 2.0,
            max_pair_distance_sq: 100.0 * 100.0,
        };
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_collision_pairs(&root, &root, true, &positions, &radii, params, &mut forces);
        assert_eq!(forces, vec![Vec2::ZERO; 2]);
    }
}
