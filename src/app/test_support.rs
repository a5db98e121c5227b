use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::lightning::{
    DiscoveryConfig, DiscoveryProgress, GraphLink, GraphNode, GraphSnapshot, LocalChannel,
    LocalNode,
};

use super::{ExplorerSettings, LocalState, ViewModel};

pub(super) fn reference_snapshot(running: bool) -> Arc<GraphSnapshot> {
    let mut peer = GraphNode::new("peer-1".to_owned(), 1, false, true);
    peer.alias = "Peer One".to_owned();

    Arc::new(GraphSnapshot::new(
        "our-node".to_owned(),
        vec![
            GraphNode::new("our-node".to_owned(), 0, true, true),
            peer,
            GraphNode::new("remote-1".to_owned(), 2, false, false),
        ],
        vec![
            GraphLink {
                id: "our-node-peer-1".to_owned(),
                source: "our-node".to_owned(),
                target: "peer-1".to_owned(),
                capacity: 1_000_000,
                is_our_channel: true,
            },
            GraphLink {
                id: "peer-1-remote-1".to_owned(),
                source: "peer-1".to_owned(),
                target: "remote-1".to_owned(),
                capacity: 500_000,
                is_our_channel: false,
            },
        ],
        DiscoveryProgress {
            current_hop: 2,
            max_hop: 4,
            running,
            failed_calls: 0,
        },
    ))
}

pub(super) fn local_channel_to_peer() -> LocalChannel {
    LocalChannel {
        channel_id: "812345x1x0".to_owned(),
        remote_pubkey: "peer-1".to_owned(),
        local_balance_msat: 600_000_000,
        remote_balance_msat: 400_000_000,
        active: true,
        status: "active".to_owned(),
        private: false,
    }
}

pub(super) fn test_view_model() -> ViewModel {
    let settings = Arc::new(ExplorerSettings {
        local_state_path: PathBuf::from("node.json"),
        topology_url: "http://127.0.0.1:9/topology".to_owned(),
        alias_services: Vec::new(),
        explorer_url_template: "https://explorer.test/node/{id}".to_owned(),
        discovery: DiscoveryConfig::default(),
        request_timeout: Duration::from_secs(5),
    });
    let local_state = LocalState {
        node: LocalNode {
            pubkey: "our-node".to_owned(),
            address: "127.0.0.1".to_owned(),
            port: 9735,
        },
        channels: vec![local_channel_to_peer()],
    };
    ViewModel::new(settings, local_state, 0.0)
}
