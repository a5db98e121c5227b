use std::collections::{HashMap, HashSet};
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use eframe::egui::Context;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::alias::resolve_aliases;
use super::graph::{DiscoveryProgress, GraphLink, GraphNode, GraphSnapshot, LocalChannel, LocalNode};
use super::normalize::{capacity, channel_id, endpoints, node_alias, node_id};
use super::source::{AliasLookup, TopologySource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub max_hops: u32,
    pub max_nodes: usize,
    pub batch_size: usize,
    pub alias_backfill_limit: usize,
    pub secondary_lookup_limit: usize,
    pub secondary_lookup_max_hop: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_hops: 4,
            max_nodes: 600,
            batch_size: 20,
            alias_backfill_limit: 120,
            secondary_lookup_limit: 12,
            secondary_lookup_max_hop: 3,
        }
    }
}

impl DiscoveryConfig {
    /// Hop 2 is always produced by the hop-1 gossip query.
    fn effective_max_hops(&self) -> u32 {
        self.max_hops.max(2)
    }

    fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[derive(Clone)]
pub struct SnapshotPublisher {
    tx: Sender<Arc<GraphSnapshot>>,
    abort: Arc<AtomicBool>,
    repaint: Option<Context>,
}

impl SnapshotPublisher {
    pub fn new(tx: Sender<Arc<GraphSnapshot>>, abort: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            abort,
            repaint: None,
        }
    }

    pub fn with_repaint(mut self, ctx: Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    fn publish(&self, snapshot: GraphSnapshot) -> bool {
        if self.is_aborted() {
            return false;
        }

        if self.tx.send(Arc::new(snapshot)).is_err() {
            self.abort.store(true, Ordering::Release);
            return false;
        }

        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
        true
    }
}

#[derive(Debug, Default)]
struct MergeOutcome {
    new_endpoints: Vec<String>,
    truncated: bool,
}

struct DiscoveryState {
    local_id: String,
    nodes: Vec<GraphNode>,
    known_node_ids: HashMap<String, usize>,
    links: Vec<GraphLink>,
    known_channel_ids: HashSet<String>,
    frontier: Vec<String>,
    current_hop: u32,
    max_hop: u32,
    failed_calls: usize,
}

impl DiscoveryState {
    fn new(local_id: String, max_hop: u32) -> Self {
        Self {
            local_id,
            nodes: Vec::new(),
            known_node_ids: HashMap::new(),
            links: Vec::new(),
            known_channel_ids: HashSet::new(),
            frontier: Vec::new(),
            current_hop: 0,
            max_hop,
            failed_calls: 0,
        }
    }

    fn knows(&self, id: &str) -> bool {
        self.known_node_ids.contains_key(id)
    }

    fn insert_node(&mut self, id: &str, hop: u32, has_channel: bool) -> bool {
        if self.knows(id) {
            return false;
        }

        let is_our_node = id == self.local_id;
        self.known_node_ids.insert(id.to_owned(), self.nodes.len());
        self.nodes
            .push(GraphNode::new(id.to_owned(), hop, is_our_node, has_channel));
        true
    }

    fn insert_link(&mut self, link: GraphLink) -> bool {
        if link.source == link.target
            || !self.knows(&link.source)
            || !self.knows(&link.target)
            || self.known_channel_ids.contains(&link.id)
        {
            return false;
        }

        self.known_channel_ids.insert(link.id.clone());
        self.links.push(link);
        true
    }

    fn set_alias(&mut self, id: &str, alias: String) {
        if let Some(&index) = self.known_node_ids.get(id)
            && let Some(node) = self.nodes.get_mut(index)
        {
            node.alias = alias;
        }
    }

    fn apply_node_records(&mut self, records: &[Value], queried: &HashSet<&str>) {
        for record in records {
            let (Some(id), Some(alias)) = (node_id(record), node_alias(record)) else {
                continue;
            };
            let unresolved = self
                .known_node_ids
                .get(&id)
                .and_then(|&index| self.nodes.get(index))
                .is_some_and(GraphNode::has_placeholder_alias);
            if queried.contains(id.as_str()) && unresolved {
                self.set_alias(&id, alias);
            }
        }
    }

    fn merge_channels(
        &mut self,
        records: &[Value],
        hop: u32,
        direct_peers: &HashSet<String>,
        max_nodes: usize,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for record in records {
            let Some((first, second)) = endpoints(record) else {
                continue;
            };
            let id = channel_id(record);
            if self.known_channel_ids.contains(&id) {
                continue;
            }

            let missing = [&first, &second]
                .into_iter()
                .filter(|endpoint| !self.knows(endpoint))
                .cloned()
                .collect::<Vec<_>>();
            if self.nodes.len() + missing.len() > max_nodes {
                outcome.truncated = true;
                break;
            }
            for endpoint in missing {
                self.insert_node(&endpoint, hop, direct_peers.contains(&endpoint));
                outcome.new_endpoints.push(endpoint);
            }

            let is_our_channel = first == self.local_id || second == self.local_id;
            self.insert_link(GraphLink {
                id,
                capacity: capacity(record),
                source: first,
                target: second,
                is_our_channel,
            });
        }

        outcome
    }

    fn unresolved(&self, max_hop: u32) -> Vec<&GraphNode> {
        let mut unresolved = self
            .nodes
            .iter()
            .filter(|node| node.hop <= max_hop && node.has_placeholder_alias())
            .collect::<Vec<_>>();
        unresolved.sort_by_key(|node| node.hop);
        unresolved
    }

    fn progress(&self, running: bool) -> DiscoveryProgress {
        DiscoveryProgress {
            current_hop: self.current_hop,
            max_hop: self.max_hop,
            running,
            failed_calls: self.failed_calls,
        }
    }

    fn snapshot(&self, running: bool) -> GraphSnapshot {
        GraphSnapshot::new(
            self.local_id.clone(),
            self.nodes.clone(),
            self.links.clone(),
            self.progress(running),
        )
    }
}

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    local: LocalNode,
    local_channels: Vec<LocalChannel>,
    topology: Arc<dyn TopologySource>,
    alias_services: Vec<Arc<dyn AliasLookup>>,
    publisher: SnapshotPublisher,
}

impl DiscoveryEngine {
    pub fn new(
        config: DiscoveryConfig,
        local: LocalNode,
        local_channels: Vec<LocalChannel>,
        topology: Arc<dyn TopologySource>,
        alias_services: Vec<Arc<dyn AliasLookup>>,
        publisher: SnapshotPublisher,
    ) -> Self {
        Self {
            config,
            local,
            local_channels,
            topology,
            alias_services,
            publisher,
        }
    }

    fn publish(&self, state: &DiscoveryState, running: bool) -> bool {
        self.publisher.publish(state.snapshot(running))
    }

    /// `None` when the run was abandoned.
    pub async fn run(self) -> Option<DiscoveryProgress> {
        let max_hops = self.config.effective_max_hops();
        let local_id = self.local.pubkey.clone();
        let mut state = DiscoveryState::new(local_id.clone(), max_hops);
        info!(
            local_id = %local_id,
            channels = self.local_channels.len(),
            max_hops,
            max_nodes = self.config.max_nodes,
            "starting topology discovery"
        );

        state.insert_node(&local_id, 0, true);

        let direct_peers = self.merge_local_channels(&mut state);
        state.current_hop = 1;
        if !self.publish(&state, true) {
            return None;
        }

        if !direct_peers.is_empty() {
            self.augment_from_gossip(&mut state, &direct_peers).await?;
            if !self.publish(&state, true) {
                return None;
            }

            self.resolve_stragglers(&mut state, 1, usize::MAX).await?;
            if !self.publish(&state, true) {
                return None;
            }

            self.expand(&mut state, &direct_peers, max_hops).await?;
            self.backfill_aliases(&mut state).await?;
        }

        info!(
            nodes = state.nodes.len(),
            links = state.links.len(),
            failed_calls = state.failed_calls,
            "topology discovery finished"
        );
        if !self.publish(&state, false) {
            return None;
        }
        Some(state.progress(false))
    }

    fn merge_local_channels(&self, state: &mut DiscoveryState) -> HashSet<String> {
        let mut direct_peers = HashSet::new();

        for channel in &self.local_channels {
            let remote = channel.remote_pubkey.as_str();
            if remote == state.local_id {
                continue;
            }
            if !state.knows(remote) && state.nodes.len() >= self.config.max_nodes {
                continue;
            }

            state.insert_node(remote, 1, true);
            direct_peers.insert(remote.to_owned());
            state.insert_link(GraphLink {
                id: channel.channel_id.clone(),
                source: state.local_id.clone(),
                target: remote.to_owned(),
                capacity: channel.capacity_sats(),
                is_our_channel: true,
            });
        }

        direct_peers
    }

    async fn augment_from_gossip(
        &self,
        state: &mut DiscoveryState,
        direct_peers: &HashSet<String>,
    ) -> Option<()> {
        let peer_ids = state
            .nodes
            .iter()
            .filter(|node| node.hop == 1)
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();

        debug!(peers = peer_ids.len(), "querying gossip for direct peers");
        let response = self.topology.query(&peer_ids).await;
        if self.publisher.is_aborted() {
            return None;
        }

        state.current_hop = 2;
        match response {
            Ok(response) => {
                let queried = peer_ids.iter().map(String::as_str).collect::<HashSet<_>>();
                state.apply_node_records(&response.nodes, &queried);
                let outcome =
                    state.merge_channels(&response.channels, 2, direct_peers, self.config.max_nodes);
                debug!(
                    channels = response.channels.len(),
                    new_nodes = outcome.new_endpoints.len(),
                    "merged hop-1 gossip"
                );
                state.frontier = outcome.new_endpoints;
            }
            Err(error) => {
                warn!(%error, "hop-1 gossip query failed");
                state.failed_calls += 1;
            }
        }
        Some(())
    }

    async fn resolve_stragglers(
        &self,
        state: &mut DiscoveryState,
        max_hop: u32,
        limit: usize,
    ) -> Option<()> {
        if self.alias_services.is_empty() {
            return Some(());
        }

        let ids = state
            .unresolved(max_hop)
            .into_iter()
            .take(limit)
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        if ids.is_empty() {
            return Some(());
        }

        debug!(nodes = ids.len(), max_hop, "running alias lookup cascade");
        let outcome = resolve_aliases(&self.alias_services, &ids).await;
        if self.publisher.is_aborted() {
            return None;
        }

        state.failed_calls += outcome.failed_calls;
        for (id, alias) in outcome.resolved {
            state.set_alias(&id, alias);
        }
        Some(())
    }

    async fn expand(
        &self,
        state: &mut DiscoveryState,
        direct_peers: &HashSet<String>,
        max_hops: u32,
    ) -> Option<()> {
        let batch_size = self.config.effective_batch_size();

        for hop in 3..=max_hops {
            if state.frontier.is_empty() || state.nodes.len() >= self.config.max_nodes {
                break;
            }

            let frontier = mem::take(&mut state.frontier);
            let mut next_frontier = Vec::new();
            let mut truncated = false;
            info!(hop, frontier = frontier.len(), "expanding hop");

            for batch in frontier.chunks(batch_size) {
                if self.publisher.is_aborted() {
                    return None;
                }

                let response = self.topology.query(batch).await;
                if self.publisher.is_aborted() {
                    return None;
                }

                let response = match response {
                    Ok(response) => response,
                    Err(error) => {
                        warn!(hop, batch = batch.len(), %error, "gossip batch failed");
                        state.failed_calls += 1;
                        continue;
                    }
                };

                let queried = batch.iter().map(String::as_str).collect::<HashSet<_>>();
                state.apply_node_records(&response.nodes, &queried);
                let outcome =
                    state.merge_channels(&response.channels, hop, direct_peers, self.config.max_nodes);
                debug!(
                    hop,
                    channels = response.channels.len(),
                    new_nodes = outcome.new_endpoints.len(),
                    "merged gossip batch"
                );
                next_frontier.extend(outcome.new_endpoints);

                if outcome.truncated || state.nodes.len() >= self.config.max_nodes {
                    truncated = true;
                    break;
                }
            }

            state.current_hop = hop;
            state.frontier = next_frontier;
            if !self.publish(state, true) {
                return None;
            }

            if truncated {
                info!(hop, nodes = state.nodes.len(), "node cap reached");
                break;
            }
        }

        Some(())
    }

    async fn backfill_aliases(&self, state: &mut DiscoveryState) -> Option<()> {
        let candidates = state
            .unresolved(u32::MAX)
            .into_iter()
            .take(self.config.alias_backfill_limit)
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return Some(());
        }

        debug!(nodes = candidates.len(), "backfilling aliases from gossip");
        for batch in candidates.chunks(self.config.effective_batch_size()) {
            let response = self.topology.query(batch).await;
            if self.publisher.is_aborted() {
                return None;
            }

            match response {
                Ok(response) => {
                    let queried = batch.iter().map(String::as_str).collect::<HashSet<_>>();
                    state.apply_node_records(&response.nodes, &queried);
                }
                Err(error) => {
                    warn!(batch = batch.len(), %error, "alias backfill batch failed");
                    state.failed_calls += 1;
                }
            }
        }

        if !self.publish(state, true) {
            return None;
        }

        self.resolve_stragglers(
            state,
            self.config.secondary_lookup_max_hop,
            self.config.secondary_lookup_limit,
        )
        .await
    }
}
