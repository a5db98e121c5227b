mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::lightning::GraphSnapshot;
use crate::util::stable_pair;

use forces::{ChargeParams, LinkSpring, apply_charge, apply_links};

const OUR_LINK_DISTANCE: f32 = 45.0;
const OUR_LINK_STRENGTH: f32 = 0.7;
const GOSSIP_LINK_DISTANCE: f32 = 120.0;
const GOSSIP_LINK_STRENGTH: f32 = 0.12;
const CHARGE_STRENGTH: f32 = -160.0;
const CHARGE_DISTANCE_MAX: f32 = 450.0;
const CENTER_PULL: f32 = 0.002;
const VELOCITY_DECAY: f32 = 0.4;
const ALPHA_DECAY: f32 = 0.0228;
const ALPHA_MIN: f32 = 0.001;
pub(in crate::app) const REHEAT_ALPHA: f32 = 0.3;
const SEED_SPREAD: f32 = 30.0;

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct PhysicsConfig {
    pub link_scale: f32,
    pub repulsion_scale: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            link_scale: 1.0,
            repulsion_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutPosition {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub pinned: Option<Vec2>,
}

#[derive(Clone, Copy)]
struct LayoutLink {
    source: usize,
    target: usize,
    ours: bool,
}

pub(in crate::app) struct ForceLayout {
    positions: HashMap<String, LayoutPosition>,
    order: Vec<String>,
    links: Vec<LayoutLink>,
    degree: Vec<usize>,
    alpha: f32,
    ticks: u64,
    scratch_positions: Vec<Vec2>,
    scratch_velocities: Vec<Vec2>,
    scratch_springs: Vec<LinkSpring>,
}

impl ForceLayout {
    pub(in crate::app) fn new() -> Self {
        Self {
            positions: HashMap::new(),
            order: Vec::new(),
            links: Vec::new(),
            degree: Vec::new(),
            alpha: 1.0,
            ticks: 0,
            scratch_positions: Vec::new(),
            scratch_velocities: Vec::new(),
            scratch_springs: Vec::new(),
        }
    }

    pub(in crate::app) fn sync(&mut self, snapshot: &GraphSnapshot) {
        let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());
        self.order.clear();
        for (index, node) in snapshot.nodes.iter().enumerate() {
            index_by_id.insert(node.id.as_str(), index);
            self.order.push(node.id.clone());
        }

        self.links.clear();
        self.degree = vec![0; self.order.len()];
        for link in &snapshot.links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(link.source.as_str()),
                index_by_id.get(link.target.as_str()),
            ) else {
                continue;
            };
            self.degree[source] += 1;
            self.degree[target] += 1;
            self.links.push(LayoutLink {
                source,
                target,
                ours: link.is_our_channel,
            });
        }

        self.positions.retain(|id, _| index_by_id.contains_key(id.as_str()));

        let mut added = 0usize;
        for node in &snapshot.nodes {
            if self.positions.contains_key(&node.id) {
                continue;
            }

            let anchor = if node.is_our_node {
                Some(Vec2::ZERO)
            } else {
                snapshot
                    .neighbors_of(&node.id)
                    .find_map(|neighbor| self.positions.get(neighbor).map(|entry| entry.pos))
            };
            let (jx, jy) = stable_pair(&node.id);
            let jitter = vec2(jx, jy) * SEED_SPREAD;
            let pos = match anchor {
                Some(anchor) if node.is_our_node => anchor,
                Some(anchor) => anchor + jitter,
                None => jitter * (1.0 + node.hop as f32 * 2.0),
            };

            self.positions.insert(
                node.id.clone(),
                LayoutPosition {
                    pos,
                    velocity: Vec2::ZERO,
                    pinned: None,
                },
            );
            added += 1;
        }

        if added > 0 {
            self.reheat(REHEAT_ALPHA);
        }
    }

    pub(in crate::app) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn has_ticked(&self) -> bool {
        self.ticks > 0
    }

    pub(in crate::app) fn position(&self, id: &str) -> Option<Vec2> {
        self.positions
            .get(id)
            .map(|entry| entry.pos)
            .filter(|pos| pos.x.is_finite() && pos.y.is_finite())
    }

    pub(in crate::app) fn pin(&mut self, id: &str, pos: Vec2) {
        if let Some(entry) = self.positions.get_mut(id) {
            entry.pinned = Some(pos);
            entry.pos = pos;
            entry.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn unpin(&mut self, id: &str) {
        if let Some(entry) = self.positions.get_mut(id) {
            entry.pinned = None;
        }
    }

    pub(in crate::app) fn step(&mut self, config: PhysicsConfig) -> bool {
        let node_count = self.order.len();
        if node_count == 0 {
            return false;
        }

        self.ticks += 1;
        if self.alpha < ALPHA_MIN {
            self.hold_pins();
            return false;
        }
        self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;

        self.scratch_positions.clear();
        self.scratch_velocities.clear();
        for id in &self.order {
            let entry = self.positions.get(id).copied().unwrap_or(LayoutPosition {
                pos: Vec2::ZERO,
                velocity: Vec2::ZERO,
                pinned: None,
            });
            self.scratch_positions.push(entry.pos);
            self.scratch_velocities.push(entry.velocity);
        }

        let link_scale = config.link_scale.clamp(0.1, 3.0);
        self.scratch_springs.clear();
        for link in &self.links {
            let (distance, strength) = if link.ours {
                (OUR_LINK_DISTANCE, OUR_LINK_STRENGTH)
            } else {
                (GOSSIP_LINK_DISTANCE, GOSSIP_LINK_STRENGTH)
            };
            let source_degree = self.degree[link.source].max(1) as f32;
            let target_degree = self.degree[link.target].max(1) as f32;
            self.scratch_springs.push(LinkSpring {
                source: link.source,
                target: link.target,
                distance,
                strength: (strength * link_scale).min(1.0),
                bias: source_degree / (source_degree + target_degree),
            });
        }

        apply_links(
            &self.scratch_positions,
            &mut self.scratch_velocities,
            &self.scratch_springs,
            self.alpha,
        );
        apply_charge(
            &self.scratch_positions,
            &mut self.scratch_velocities,
            ChargeParams {
                strength: CHARGE_STRENGTH * config.repulsion_scale.clamp(0.1, 4.0),
                distance_max_sq: CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX,
                alpha: self.alpha,
            },
        );

        for (index, id) in self.order.iter().enumerate() {
            let Some(entry) = self.positions.get_mut(id) else {
                continue;
            };

            if let Some(pinned) = entry.pinned {
                entry.pos = pinned;
                entry.velocity = Vec2::ZERO;
                continue;
            }

            let pull = -self.scratch_positions[index] * CENTER_PULL * self.alpha;
            let velocity = (self.scratch_velocities[index] + pull) * (1.0 - VELOCITY_DECAY);
            entry.velocity = velocity;
            entry.pos += velocity;
        }

        true
    }

    fn hold_pins(&mut self) {
        for entry in self.positions.values_mut() {
            if let Some(pinned) = entry.pinned {
                entry.pos = pinned;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lightning::{DiscoveryProgress, GraphLink, GraphNode};

    use super::*;

    fn snapshot(nodes: &[(&str, u32)], links: &[(&str, &str, bool)]) -> GraphSnapshot {
        GraphSnapshot::new(
            "our-node".to_owned(),
            nodes
                .iter()
                .map(|(id, hop)| GraphNode::new((*id).to_owned(), *hop, *hop == 0, *hop <= 1))
                .collect(),
            links
                .iter()
                .map(|(source, target, ours)| GraphLink {
                    id: format!("{source}-{target}"),
                    source: (*source).to_owned(),
                    target: (*target).to_owned(),
                    capacity: 1_000_000,
                    is_our_channel: *ours,
                })
                .collect(),
            DiscoveryProgress::default(),
        )
    }

    fn distance(layout: &ForceLayout, a: &str, b: &str) -> f32 {
        (layout.position(a).unwrap() - layout.position(b).unwrap()).length()
    }

    #[test]
    fn sync_keeps_existing_positions_and_seeds_new_nodes() {
        let mut layout = ForceLayout::new();
        layout.sync(&snapshot(&[("our-node", 0), ("peer-1", 1)], &[("our-node", "peer-1", true)]));
        assert_eq!(layout.position("our-node"), Some(Vec2::ZERO));
        assert!(!layout.has_ticked());

        for _ in 0..10 {
            layout.step(PhysicsConfig::default());
        }
        let peer_before = layout.position("peer-1").unwrap();

        layout.sync(&snapshot(
            &[("our-node", 0), ("peer-1", 1), ("remote-1", 2)],
            &[("our-node", "peer-1", true), ("peer-1", "remote-1", false)],
        ));
        assert_eq!(layout.position("peer-1"), Some(peer_before));
        let remote = layout.position("remote-1").unwrap();
        assert!((remote - peer_before).length() <= SEED_SPREAD * 1.5);
        assert!(layout.alpha() >= REHEAT_ALPHA);
    }

    #[test]
    fn our_channels_settle_shorter_than_gossip_channels() {
        let mut layout = ForceLayout::new();
        layout.sync(&snapshot(
            &[("our-node", 0), ("peer-1", 1), ("remote-1", 2)],
            &[("our-node", "peer-1", true), ("peer-1", "remote-1", false)],
        ));
        for _ in 0..600 {
            layout.step(PhysicsConfig::default());
        }

        assert!(distance(&layout, "our-node", "peer-1") < distance(&layout, "peer-1", "remote-1"));
    }

    #[test]
    fn pinned_nodes_hold_position_until_released() {
        let mut layout = ForceLayout::new();
        layout.sync(&snapshot(&[("our-node", 0), ("peer-1", 1)], &[("our-node", "peer-1", true)]));
        let target = vec2(300.0, -40.0);
        layout.pin("peer-1", target);
        for _ in 0..20 {
            layout.step(PhysicsConfig::default());
        }
        assert_eq!(layout.position("peer-1"), Some(target));

        layout.unpin("peer-1");
        layout.reheat(REHEAT_ALPHA);
        for _ in 0..20 {
            layout.step(PhysicsConfig::default());
        }
        assert_ne!(layout.position("peer-1"), Some(target));
    }

    #[test]
    fn simulation_cools_down() {
        let mut layout = ForceLayout::new();
        layout.sync(&snapshot(&[("our-node", 0), ("peer-1", 1)], &[("our-node", "peer-1", true)]));
        let mut warm = true;
        for _ in 0..2_000 {
            warm = layout.step(PhysicsConfig::default());
        }
        assert!(!warm);
    }
}
