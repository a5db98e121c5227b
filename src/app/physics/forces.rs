use eframe::egui::{Vec2, vec2};

use super::quadtree::{QuadCell, QuadTree};

const BARNES_HUT_THETA_SQ: f32 = 0.81;
const MIN_DISTANCE_SQ: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    pub(super) strength: f32,
    pub(super) distance_max_sq: f32,
    pub(super) alpha: f32,
}

#[derive(Clone, Copy)]
pub(super) struct LinkSpring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    /// Share of the correction applied to the target; the source gets the rest.
    pub(super) bias: f32,
}

fn jiggle(index: usize) -> Vec2 {
    let angle = ((index as f32) * 0.618_034 + 0.37) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

fn charge_from(delta: Vec2, mass: f32, params: ChargeParams) -> Option<Vec2> {
    let distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return None;
    }
    let distance_sq = distance_sq.max(MIN_DISTANCE_SQ);
    Some(delta * (params.strength * mass * params.alpha / distance_sq))
}

fn accumulate_charge(
    tree: &QuadTree,
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.members {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() == 0.0 {
                delta = jiggle(index + other);
            }
            if let Some(change) = charge_from(delta, 1.0, params) {
                *velocity += change;
            }
        }
        return;
    }

    let delta = cell.center_of_mass - point;
    let side = cell.bounds.side_length();
    let far_enough = side * side / BARNES_HUT_THETA_SQ < delta.length_sq();
    if far_enough {
        if let Some(change) = charge_from(delta, cell.mass, params) {
            *velocity += change;
        }
        return;
    }

    for child in cell.children.iter().flatten() {
        accumulate_charge(tree, &tree.cells[*child], index, positions, params, velocity);
    }
}

pub(super) fn apply_charge(positions: &[Vec2], velocities: &mut [Vec2], params: ChargeParams) {
    let Some(tree) = QuadTree::build(positions) else {
        return;
    };
    let Some(root) = tree.root() else {
        return;
    };

    for (index, velocity) in velocities.iter_mut().enumerate() {
        accumulate_charge(&tree, root, index, positions, params, velocity);
    }
}

pub(super) fn apply_links(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    springs: &[LinkSpring],
    alpha: f32,
) {
    for spring in springs {
        let (source, target) = (spring.source, spring.target);
        if source == target || source >= positions.len() || target >= positions.len() {
            continue;
        }

        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() == 0.0 {
            delta = jiggle(source * 31 + target);
        }
        let length = delta.length();
        let correction = delta * ((length - spring.distance) / length * alpha * spring.strength);

        velocities[target] -= correction * spring.bias;
        velocities[source] += correction * (1.0 - spring.bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = vec![vec2(0.0, 0.0), vec2(200.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 2];
        let springs = [LinkSpring {
            source: 0,
            target: 1,
            distance: 50.0,
            strength: 0.5,
            bias: 0.5,
        }];

        apply_links(&positions, &mut velocities, &springs, 1.0);
        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
    }

    #[test]
    fn charge_pushes_nodes_apart_within_distance_max() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(5000.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO; 3];
        apply_charge(
            &positions,
            &mut velocities,
            ChargeParams {
                strength: -100.0,
                distance_max_sq: 400.0 * 400.0,
                alpha: 1.0,
            },
        );

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert_eq!(velocities[2], Vec2::ZERO);
    }
}
