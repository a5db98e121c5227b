mod app;
mod lightning;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{AliasServiceSettings, ExplorerApp, ExplorerSettings};
use lightning::DiscoveryConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with the local node identity and its channel list.
    #[arg(long, default_value = "node.json")]
    node_file: PathBuf,

    /// Endpoint that answers batched channel/node topology queries.
    #[arg(long, default_value = "http://127.0.0.1:3010/v1/graph/query")]
    topology_url: String,

    #[arg(long, default_value = "https://mempool.space/api/v1/lightning/nodes/{id}")]
    primary_alias_url: String,

    #[arg(long, default_value = "/alias")]
    primary_alias_pointer: String,

    #[arg(long, default_value = "https://1ml.com/node/{id}/json")]
    secondary_alias_url: String,

    #[arg(long, default_value = "/alias")]
    secondary_alias_pointer: String,

    /// Public explorer page for a node; `{id}` is replaced by its public key.
    #[arg(long, default_value = "https://amboss.space/node/{id}")]
    explorer_url: String,

    #[arg(long, default_value_t = DiscoveryConfig::default().max_hops)]
    max_hops: u32,

    #[arg(long, default_value_t = DiscoveryConfig::default().max_nodes)]
    max_nodes: usize,

    #[arg(long, default_value_t = DiscoveryConfig::default().batch_size)]
    batch_size: usize,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 15)]
    request_timeout: u64,
}

impl Args {
    fn into_settings(self) -> ExplorerSettings {
        ExplorerSettings {
            local_state_path: self.node_file,
            topology_url: self.topology_url,
            alias_services: vec![
                AliasServiceSettings {
                    name: "primary".to_owned(),
                    url_template: self.primary_alias_url,
                    alias_pointer: self.primary_alias_pointer,
                },
                AliasServiceSettings {
                    name: "secondary".to_owned(),
                    url_template: self.secondary_alias_url,
                    alias_pointer: self.secondary_alias_pointer,
                },
            ],
            explorer_url_template: self.explorer_url,
            discovery: DiscoveryConfig {
                max_hops: self.max_hops,
                max_nodes: self.max_nodes,
                batch_size: self.batch_size,
                ..DiscoveryConfig::default()
            },
            request_timeout: Duration::from_secs(self.request_timeout.max(1)),
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ln_atlas=info")),
        )
        .init();

    let settings = Args::parse().into_settings();
    tracing::info!(
        node_file = %settings.local_state_path.display(),
        topology_url = %settings.topology_url,
        "starting ln-atlas"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ln-atlas",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, settings)))),
    )
}
