mod alias;
mod discovery;
mod graph;
mod http;
mod local;
mod normalize;
mod source;

pub use discovery::{DiscoveryConfig, DiscoveryEngine, SnapshotPublisher};
pub use graph::{DiscoveryProgress, GraphLink, GraphNode, GraphSnapshot, LocalChannel, LocalNode};
pub use http::{HttpAliasService, HttpTopologySource, build_client};
pub use local::load_local_state;
pub use normalize::hop_color;
pub use source::{AliasLookup, TopologySource};
