mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::notes::{NoteGraph, VisibleGraph};
use crate::util::stable_pair;

use forces::{CollisionParams, RepulsionParams, accumulate_collision_pairs, accumulate_repulsion};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.75;
const REPULSION_SOFTENING: f32 = 600.0;
const MAX_SPEED: f32 = 40.0;
const MOTION_EPSILON_SQ: f32 = 0.0001;

/// Tunables for one simulation context. Radial and centering strengths are
/// kept low relative to link/collision; raising them makes the layout orbit
/// instead of settling.
#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    pub link_strength: f32,
    pub link_base_distance: f32,
    pub link_radius_factor: f32,
    /// Applied to the preferred link distance when the endpoints differ in
    /// hierarchy depth by more than one level.
    pub link_depth_gap_factor: f32,
    pub repulsion_strength: f32,
    pub repulsion_max_distance: f32,
    /// Deeper nodes repel less: charge = radius / (1 + depth * falloff).
    pub repulsion_depth_falloff: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub center_strength: f32,
    pub radial_strength: f32,
    pub radial_ring_spacing: f32,
    /// Fraction of velocity retained each tick, independent of alpha.
    /// Without this damping a balanced link/repulsion pair cycles forever.
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            link_strength: 0.08,
            link_base_distance: 40.0,
            link_radius_factor: 1.2,
            link_depth_gap_factor: 1.6,
            repulsion_strength: 1100.0,
            repulsion_max_distance: 420.0,
            repulsion_depth_falloff: 0.15,
            collision_strength: 0.55,
            collision_padding: 2.0,
            center_strength: 0.02,
            radial_strength: 0.015,
            radial_ring_spacing: 130.0,
            velocity_decay: 0.6,
            alpha_decay: 0.028,
            alpha_min: 0.001,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub converged: bool,
    pub any_motion: bool,
}

/// The decaying-energy solver. One instance per graph view; `reheat` on any
/// perturbation (drag, pin change, model delta), drop to dispose.
pub struct Simulation {
    alpha: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self { alpha: 1.0 }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    pub fn converged(&self, config: &SimConfig) -> bool {
        self.alpha < config.alpha_min
    }

    /// One discrete step: all forces read the same position snapshot, the
    /// integration commits atomically at the end. Below the alpha floor (or
    /// with no nodes) the step is an exact no-op reporting convergence.
    pub fn step(&mut self, state: &mut LayoutState, config: &SimConfig) -> StepOutcome {
        if state.is_empty() || self.alpha < config.alpha_min {
            return StepOutcome {
                converged: true,
                any_motion: false,
            };
        }

        let n = state.positions.len();
        let alpha = self.alpha;
        let scratch = &mut state.scratch;
        scratch.snapshot.clear();
        scratch.snapshot.extend_from_slice(&state.positions);
        scratch.forces.clear();
        scratch.forces.resize(n, Vec2::ZERO);
        scratch.charges.clear();
        let mut max_radius = 0.0_f32;
        for index in 0..n {
            let radius = state.radii[index];
            max_radius = max_radius.max(radius);
            scratch
                .charges
                .push(radius / (1.0 + state.depths[index] as f32 * config.repulsion_depth_falloff));
        }

        let snapshot = &scratch.snapshot;
        let charges = &scratch.charges;
        let forces = &mut scratch.forces;

        // Spatial index is rebuilt from scratch every tick; positions move
        // little but in arbitrary directions, so incremental maintenance
        // buys nothing here.
        if let Some(tree) = QuadNode::build(snapshot, charges) {
            let repulsion = RepulsionParams {
                strength: config.repulsion_strength * alpha,
                softening: REPULSION_SOFTENING,
                theta: BARNES_HUT_THETA,
                max_distance_sq: config.repulsion_max_distance * config.repulsion_max_distance,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion(&tree, index, snapshot, charges, repulsion, force);
            }

            let max_pair = (max_radius * 2.0) + (config.collision_padding * 2.0);
            // Collision is deliberately not alpha-scaled; overlap correction
            // must stay effective while the rest of the system cools.
            let collision = CollisionParams {
                strength: config.collision_strength,
                padding: config.collision_padding,
                max_pair_distance_sq: max_pair * max_pair,
            };
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                snapshot,
                &state.radii,
                collision,
                forces,
            );
        }

        for &(a, b) in &state.links {
            let delta = snapshot[a] - snapshot[b];
            let distance_sq = delta.length_sq();
            if distance_sq <= 0.0001 * 0.0001 {
                continue;
            }
            let distance = distance_sq.sqrt();
            let direction = delta / distance;

            let mut preferred = (state.radii[a] + state.radii[b]) * 0.5 * config.link_radius_factor
                + config.link_base_distance;
            if state.depths[a].abs_diff(state.depths[b]) > 1 {
                preferred *= config.link_depth_gap_factor;
            }

            let spring = (distance - preferred) * config.link_strength * alpha;
            let relative = state.velocities[a] - state.velocities[b];
            let damping = relative.dot(direction) * 0.2;
            let correction = direction * (spring + damping);

            forces[a] -= correction;
            forces[b] += correction;
        }

        let mut centroid = Vec2::ZERO;
        for position in snapshot {
            centroid += *position;
        }
        centroid /= n as f32;
        let center_pull = centroid * (config.center_strength * alpha);

        for (index, force) in forces.iter_mut().enumerate() {
            *force -= center_pull;

            let position = snapshot[index];
            let radius = position.length();
            if radius > 0.0001 {
                let target = state.depths[index] as f32 * config.radial_ring_spacing;
                let error = radius - target;
                *force -= (position / radius) * (error * config.radial_strength * alpha);
            }
        }

        let mut any_motion = false;
        for index in 0..n {
            if let Some(pin) = state.pins[index] {
                state.positions[index] = pin;
                state.velocities[index] = Vec2::ZERO;
                continue;
            }

            let mut velocity = (state.velocities[index] + forces[index]) * config.velocity_decay;
            let speed_sq = velocity.length_sq();
            if speed_sq > MAX_SPEED * MAX_SPEED {
                velocity *= MAX_SPEED / speed_sq.sqrt();
            }

            state.velocities[index] = velocity;
            state.positions[index] += velocity;
            if velocity.length_sq() > MOTION_EPSILON_SQ {
                any_motion = true;
            }
        }

        self.alpha *= 1.0 - config.alpha_decay;
        StepOutcome {
            converged: self.alpha < config.alpha_min,
            any_motion,
        }
    }
}

/// Per-visible-node simulation state in parallel arrays, rebuilt from a
/// `VisibleGraph` whenever the model or filter changes. Surviving ids keep
/// their position, velocity, and pin across rebuilds.
#[derive(Default)]
pub struct LayoutState {
    ids: Vec<String>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    radii: Vec<f32>,
    depths: Vec<u32>,
    links: Vec<(usize, usize)>,
    index_of: HashMap<String, usize>,
    scratch: StepScratch,
}

#[derive(Default)]
struct StepScratch {
    forces: Vec<Vec2>,
    snapshot: Vec<Vec2>,
    charges: Vec<f32>,
}

impl LayoutState {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    pub fn position(&self, index: usize) -> Vec2 {
        self.positions[index]
    }

    pub fn radius(&self, index: usize) -> f32 {
        self.radii[index]
    }

    pub fn depth(&self, index: usize) -> u32 {
        self.depths[index]
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pins[index].is_some()
    }

    /// Pins take effect immediately so a drag is reflected even while the
    /// simulation is parked below its alpha floor.
    pub fn pin(&mut self, index: usize, world: Vec2) {
        self.pins[index] = Some(world);
        self.positions[index] = world;
        self.velocities[index] = Vec2::ZERO;
    }

    pub fn unpin(&mut self, index: usize) {
        self.pins[index] = None;
    }

    /// Rebuilds the state for a new visible snapshot. New nodes seed next to
    /// their visible parent when one exists, otherwise on a ring sized to
    /// the node count; both use id-stable jitter so layouts are repeatable.
    pub fn sync(
        &mut self,
        graph: &NoteGraph,
        visible: &VisibleGraph,
        radius_of: impl Fn(&crate::notes::NoteNode) -> f32,
    ) {
        let mut prior: HashMap<String, (Vec2, Vec2, Option<Vec2>)> = HashMap::new();
        for (index, id) in self.ids.iter().enumerate() {
            prior.insert(
                id.clone(),
                (
                    self.positions[index],
                    self.velocities[index],
                    self.pins[index],
                ),
            );
        }

        let n = visible.ids.len();
        let ring_radius = (n as f32).sqrt() * 40.0;

        self.positions.clear();
        self.velocities.clear();
        self.pins.clear();
        self.radii.clear();
        self.depths.clear();

        for (index, id) in visible.ids.iter().enumerate() {
            let node = graph.node(id);
            self.radii
                .push(node.map(&radius_of).unwrap_or(6.0).max(1.0));
            self.depths.push(node.map(|node| node.depth).unwrap_or(0));

            if let Some(&(position, velocity, pin)) = prior.get(id) {
                self.positions.push(position);
                self.velocities.push(velocity);
                self.pins.push(pin);
                continue;
            }

            let (jx, jy) = stable_pair(id);
            let parent_position = node
                .and_then(|node| node.parent_id.as_deref())
                .and_then(|parent| prior.get(parent).map(|(position, _, _)| *position))
                .or_else(|| {
                    node.and_then(|node| node.parent_id.as_deref())
                        .and_then(|parent| visible.index_of.get(parent))
                        .and_then(|&parent_index| self.positions.get(parent_index).copied())
                });

            let position = match parent_position {
                Some(parent) => parent + vec2(jx, jy) * 30.0,
                None => {
                    let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
                    vec2(angle.cos(), angle.sin()) * ring_radius + vec2(jx, jy) * 20.0
                }
            };
            self.positions.push(position);
            self.velocities.push(Vec2::ZERO);
            self.pins.push(None);
        }

        self.ids = visible.ids.clone();
        self.index_of = visible.index_of.clone();
        self.links = visible.links.clone();
    }

    /// All nodes whose centers lie within `radius` of `point`, via a radius
    /// query on a freshly built quadtree (rebuilt, never mutated). Used by
    /// pointer hit-testing.
    pub fn collect_within(&self, point: Vec2, radius: f32) -> Vec<usize> {
        let mut candidates = Vec::new();
        if let Some(tree) = QuadNode::build(&self.positions, &self.radii) {
            tree.collect_within(&self.positions, point, radius, &mut candidates);
        }
        candidates
    }

    pub fn clear_pins(&mut self) {
        self.pins.fill(None);
    }

    pub fn pinned_count(&self) -> usize {
        self.pins.iter().filter(|pin| pin.is_some()).count()
    }
}
