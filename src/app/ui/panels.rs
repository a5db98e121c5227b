use std::sync::Arc;

use eframe::egui::{self, Align, Color32, Context, Layout, ProgressBar, RichText};

use crate::lightning::{DiscoveryProgress, GraphSnapshot};
use crate::util::short_id;

use super::super::camera::{Camera, InitialCentering};
use super::super::health::health_score;
use super::super::physics::{ForceLayout, PhysicsConfig};
use super::super::{ExplorerSettings, LocalState, ViewModel};

pub(in crate::app) fn progress_text(
    progress: DiscoveryProgress,
    nodes: usize,
    links: usize,
) -> String {
    let phase = if progress.running {
        format!("exploring hop {}/{}", progress.current_hop, progress.max_hop)
    } else {
        "exploration complete".to_owned()
    };

    let mut text = format!("{phase}  |  {nodes} nodes  |  {links} channels");
    match progress.failed_calls {
        0 => {}
        1 => text.push_str("  |  1 failed call"),
        failed => text.push_str(&format!("  |  {failed} failed calls")),
    }
    text
}

fn health_color(score: u8) -> Color32 {
    match score {
        0..=39 => Color32::from_rgb(220, 110, 100),
        40..=69 => Color32::from_rgb(236, 190, 90),
        _ => Color32::from_rgb(120, 210, 140),
    }
}

impl ViewModel {
    pub(in crate::app) fn new(
        settings: Arc<ExplorerSettings>,
        local_state: LocalState,
        now: f64,
    ) -> Self {
        let LocalState { node, channels } = local_state;
        let health = health_score(&channels);

        Self {
            snapshot: GraphSnapshot::empty(node.pubkey.clone()),
            snapshot_revision: 0,
            settings,
            local: node,
            channels,
            health,
            discovery: None,
            discovery_error: None,
            layout: ForceLayout::new(),
            physics: PhysicsConfig::default(),
            live_physics: true,
            camera: Camera::default(),
            centering: InitialCentering::new(now),
            pending_camera: None,
            canvas_size: None,
            selected: None,
            dragging: None,
            search: String::new(),
            search_cache: None,
            details_cache: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        self.poll_discovery();

        let mut restart_requested = false;
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("ln-atlas");
                    ui.separator();
                    let local_alias = self.snapshot.alias_of(&self.local.pubkey);
                    ui.label(RichText::new(local_alias).strong())
                        .on_hover_text(self.local.pubkey.as_str());
                    ui.label(format!(
                        "{}  {}:{}",
                        short_id(&self.local.pubkey),
                        self.local.address,
                        self.local.port
                    ));
                    ui.separator();
                    ui.label("Health");
                    ui.add(
                        ProgressBar::new(f32::from(self.health) / 100.0)
                            .desired_width(120.0)
                            .fill(health_color(self.health))
                            .text(format!("{}/100", self.health)),
                    )
                    .on_hover_text(
                        "Capacity, balance symmetry, distinct peers and channel count, 25 points each.",
                    );

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let reload_button =
                            ui.add_enabled(!is_reloading, egui::Button::new("Reload node file"));
                        if reload_button.clicked() {
                            *reload_requested = true;
                        }
                        if ui.button("Restart discovery").clicked() {
                            restart_requested = true;
                        }
                        if self.discovery.is_some() {
                            ui.spinner();
                        }
                        ui.label(progress_text(
                            self.snapshot.progress,
                            self.snapshot.node_count(),
                            self.snapshot.links.len(),
                        ));
                    });
                });
                if let Some(error) = &self.discovery_error {
                    ui.colored_label(Color32::from_rgb(220, 110, 100), error.as_str());
                }
            });

        if restart_requested {
            self.restart_discovery(ctx);
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
