use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context, Vec2};
use tracing::{error, info};

use crate::lightning::{
    AliasLookup, DiscoveryConfig, DiscoveryEngine, GraphSnapshot, HttpAliasService,
    HttpTopologySource, LocalChannel, LocalNode, SnapshotPublisher, TopologySource, build_client,
    load_local_state,
};

mod camera;
mod graph;
mod health;
mod highlight;
mod physics;
mod render_utils;
#[cfg(test)]
mod test_support;
mod ui;

use camera::{Camera, InitialCentering};
use physics::{ForceLayout, PhysicsConfig};

#[derive(Clone, Debug)]
pub struct AliasServiceSettings {
    pub name: String,
    pub url_template: String,
    /// JSON pointer to the alias inside the response; empty means well-known fields.
    pub alias_pointer: String,
}

#[derive(Clone, Debug)]
pub struct ExplorerSettings {
    pub local_state_path: PathBuf,
    pub topology_url: String,
    pub alias_services: Vec<AliasServiceSettings>,
    pub explorer_url_template: String,
    pub discovery: DiscoveryConfig,
    pub request_timeout: Duration,
}

pub struct ExplorerApp {
    settings: Arc<ExplorerSettings>,
    state: AppState,
    reload_rx: Option<Receiver<Result<LocalState, String>>>,
}

struct LocalState {
    node: LocalNode,
    channels: Vec<LocalChannel>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LocalState, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// A running discovery worker. Dropping the handle abandons the run.
struct DiscoveryHandle {
    rx: Receiver<Arc<GraphSnapshot>>,
    abort: Arc<AtomicBool>,
}

impl Drop for DiscoveryHandle {
    fn drop(&mut self) {
        self.abort.store(true, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CameraCommand {
    FitSelection,
    Recenter,
}

#[derive(Clone, Copy, Debug)]
struct PendingCamera {
    command: CameraCommand,
    frames_left: u8,
}

struct ViewModel {
    settings: Arc<ExplorerSettings>,
    local: LocalNode,
    channels: Vec<LocalChannel>,
    health: u8,
    snapshot: Arc<GraphSnapshot>,
    snapshot_revision: u64,
    discovery: Option<DiscoveryHandle>,
    discovery_error: Option<String>,
    layout: ForceLayout,
    physics: PhysicsConfig,
    live_physics: bool,
    camera: Camera,
    centering: InitialCentering,
    pending_camera: Option<PendingCamera>,
    canvas_size: Option<Vec2>,
    selected: Option<String>,
    dragging: Option<String>,
    search: String,
    search_cache: Option<SearchCache>,
    details_cache: Option<DetailsCache>,
}

struct SearchCache {
    query: String,
    snapshot_revision: u64,
    matches: Vec<SearchMatch>,
}

#[derive(Clone, Debug, PartialEq)]
struct SearchMatch {
    id: String,
    alias: String,
    score: i64,
}

struct DetailsCache {
    selected_id: String,
    snapshot_revision: u64,
    details: ui::NodeDetails,
}

fn spawn_discovery(
    settings: &ExplorerSettings,
    local: LocalNode,
    channels: Vec<LocalChannel>,
    ctx: &Context,
) -> Result<DiscoveryHandle> {
    let http = build_client(settings.request_timeout)?;
    let topology: Arc<dyn TopologySource> = Arc::new(HttpTopologySource::new(
        http.clone(),
        settings.topology_url.clone(),
    ));
    let alias_services = settings
        .alias_services
        .iter()
        .map(|service| {
            Arc::new(HttpAliasService::new(
                service.name.clone(),
                http.clone(),
                service.url_template.clone(),
                service.alias_pointer.clone(),
            )) as Arc<dyn AliasLookup>
        })
        .collect::<Vec<_>>();

    let (tx, rx) = mpsc::channel();
    let abort = Arc::new(AtomicBool::new(false));
    let publisher = SnapshotPublisher::new(tx, Arc::clone(&abort)).with_repaint(ctx.clone());
    let engine = DiscoveryEngine::new(
        settings.discovery,
        local,
        channels,
        topology,
        alias_services,
        publisher,
    );

    thread::Builder::new()
        .name("discovery".to_owned())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    error!(%error, "failed to start discovery runtime");
                    return;
                }
            };

            match runtime.block_on(engine.run()) {
                Some(progress) => info!(
                    hop = progress.current_hop,
                    failed_calls = progress.failed_calls,
                    "discovery finished"
                ),
                None => info!("discovery abandoned"),
            }
        })
        .context("failed to spawn discovery worker")?;

    Ok(DiscoveryHandle { rx, abort })
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: ExplorerSettings) -> Self {
        let settings = Arc::new(settings);
        let state = Self::start_load(&settings);
        Self {
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(settings: &ExplorerSettings) -> Receiver<Result<LocalState, String>> {
        let (tx, rx) = mpsc::channel();
        let path = settings.local_state_path.clone();

        thread::spawn(move || {
            let result = load_local_state(&path)
                .map(|(node, channels)| LocalState { node, channels })
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(settings: &ExplorerSettings) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(settings),
        }
    }

    fn ready_state(&self, ctx: &Context, local_state: LocalState) -> AppState {
        let now = ctx.input(|input| input.time);
        let mut model = ViewModel::new(Arc::clone(&self.settings), local_state, now);
        model.start_discovery(ctx);
        AppState::Ready(Box::new(model))
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(local_state)) => transition = Some(self.ready_state(ctx, local_state)),
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error("Node file loader disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading local node...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the local node");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.settings));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.settings));
                }
            }
        }

        if let Some(rx) = self.reload_rx.take() {
            match rx.try_recv() {
                Ok(Ok(local_state)) => {
                    info!("reloaded local node file");
                    transition = Some(self.ready_state(ctx, local_state));
                }
                Ok(Err(error)) => transition = Some(AppState::Error(error)),
                Err(TryRecvError::Empty) => {
                    self.reload_rx = Some(rx);
                    ctx.request_repaint_after(Duration::from_millis(100));
                }
                Err(TryRecvError::Disconnected) => {
                    transition = Some(AppState::Error("Node file loader disconnected".to_owned()));
                }
            }
        }

        if matches!(self.state, AppState::Loading { .. }) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
