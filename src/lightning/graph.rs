use std::collections::HashMap;
use std::sync::Arc;

use eframe::egui::Color32;

use super::normalize::{hop_color, placeholder_alias};

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub alias: String,
    pub hop: u32,
    pub is_our_node: bool,
    pub has_channel: bool,
    pub color: Color32,
}

impl GraphNode {
    pub fn new(id: String, hop: u32, is_our_node: bool, has_channel: bool) -> Self {
        Self {
            alias: placeholder_alias(&id),
            id,
            hop,
            is_our_node,
            has_channel,
            color: hop_color(hop),
        }
    }

    pub fn has_placeholder_alias(&self) -> bool {
        self.alias == placeholder_alias(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub capacity: u64,
    pub is_our_channel: bool,
}

impl GraphLink {
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(self.target.as_str())
        } else if self.target == node_id {
            Some(self.source.as_str())
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryProgress {
    pub current_hop: u32,
    pub max_hop: u32,
    pub running: bool,
    pub failed_calls: usize,
}

#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub local_id: String,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub progress: DiscoveryProgress,
    index_by_id: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn new(
        local_id: String,
        nodes: Vec<GraphNode>,
        links: Vec<GraphLink>,
        progress: DiscoveryProgress,
    ) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        Self {
            local_id,
            nodes,
            links,
            progress,
            index_by_id,
        }
    }

    pub fn empty(local_id: String) -> Arc<Self> {
        Arc::new(Self::new(
            local_id,
            Vec::new(),
            Vec::new(),
            DiscoveryProgress::default(),
        ))
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn alias_of(&self, id: &str) -> String {
        self.node(id)
            .map(|node| node.alias.clone())
            .unwrap_or_else(|| placeholder_alias(id))
    }

    pub fn neighbors_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.links.iter().filter_map(move |link| link.other_end(id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalNode {
    pub pubkey: String,
    pub address: String,
    pub port: u16,
}

/// One channel from the node's own channel list; balances are in msat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalChannel {
    pub channel_id: String,
    pub remote_pubkey: String,
    pub local_balance_msat: u64,
    pub remote_balance_msat: u64,
    pub active: bool,
    pub status: String,
    pub private: bool,
}

impl LocalChannel {
    pub fn capacity_sats(&self) -> u64 {
        self.local_balance_msat
            .saturating_add(self.remote_balance_msat)
            / 1000
    }

    pub fn local_ratio(&self) -> f32 {
        let total = self.local_balance_msat.saturating_add(self.remote_balance_msat);
        if total == 0 {
            return 0.0;
        }
        (self.local_balance_msat as f64 / total as f64) as f32
    }
}
