use std::sync::Arc;
use std::sync::mpsc::TryRecvError;

use eframe::egui::{Context, Vec2};
use tracing::{debug, error};

use crate::lightning::GraphSnapshot;

use super::super::camera::{
    CameraTarget, FIT_PADDING, InitialCentering, PANEL_WIDTH, fit_selection, selection_bounds,
};
use super::super::highlight::build_highlight_state;
use super::super::physics::ForceLayout;
use super::super::{CameraCommand, PendingCamera, ViewModel, spawn_discovery};

const CAMERA_DEFER_FRAMES: u8 = 1;
const RESIZE_EPSILON: f32 = 0.5;

impl ViewModel {
    pub(in crate::app) fn start_discovery(&mut self, ctx: &Context) {
        self.discovery = None;
        match spawn_discovery(&self.settings, self.local.clone(), self.channels.clone(), ctx) {
            Ok(handle) => {
                self.discovery = Some(handle);
                self.discovery_error = None;
            }
            Err(error) => {
                let message = format!("{error:#}");
                error!(error = %message, "could not start discovery");
                self.discovery_error = Some(message);
            }
        }
    }

    pub(in crate::app) fn restart_discovery(&mut self, ctx: &Context) {
        self.discovery = None;
        self.snapshot = GraphSnapshot::empty(self.local.pubkey.clone());
        self.snapshot_revision += 1;
        self.layout = ForceLayout::new();
        self.selected = None;
        self.dragging = None;
        self.pending_camera = None;
        self.centering = InitialCentering::new(ctx.input(|input| input.time));
        self.start_discovery(ctx);
    }

    pub(in crate::app) fn poll_discovery(&mut self) {
        let Some(handle) = &self.discovery else {
            return;
        };

        let mut latest = None;
        let mut finished = false;
        loop {
            match handle.rx.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if let Some(snapshot) = latest {
            self.apply_snapshot(snapshot);
        }
        if finished {
            debug!("discovery worker exited");
            self.discovery = None;
        }
    }

    pub(in crate::app) fn apply_snapshot(&mut self, snapshot: Arc<GraphSnapshot>) {
        let grew = snapshot.node_count() != self.snapshot.node_count();
        self.layout.sync(&snapshot);

        if let Some(selected) = &self.selected
            && snapshot.node(selected).is_none()
        {
            self.selected = None;
        }
        if let Some(dragging) = &self.dragging
            && snapshot.node(dragging).is_none()
        {
            self.dragging = None;
        }

        let running = snapshot.progress.running;
        self.snapshot = snapshot;
        self.snapshot_revision += 1;

        if grew && running && self.selected.is_none() && self.centering.is_done() {
            self.schedule_camera(CameraCommand::Recenter);
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }

        self.selected = selected;
        if self.selected.is_some() {
            self.schedule_camera(CameraCommand::FitSelection);
        }
    }

    pub(in crate::app) fn track_canvas_size(&mut self, size: Vec2) {
        let Some(previous) = self.canvas_size else {
            self.canvas_size = Some(size);
            return;
        };
        if (previous - size).length() <= RESIZE_EPSILON {
            return;
        }

        self.canvas_size = Some(size);
        if self.selected.is_some() {
            self.schedule_camera(CameraCommand::FitSelection);
        }
    }

    fn schedule_camera(&mut self, command: CameraCommand) {
        self.pending_camera = Some(PendingCamera {
            command,
            frames_left: CAMERA_DEFER_FRAMES,
        });
    }

    /// Runs a deferred camera command once its frame arrives; returns whether
    /// one is still waiting.
    pub(in crate::app) fn run_pending_camera(&mut self) -> bool {
        let Some(pending) = self.pending_camera else {
            return false;
        };

        if pending.frames_left > 0 {
            self.pending_camera = Some(PendingCamera {
                frames_left: pending.frames_left - 1,
                ..pending
            });
            return true;
        }

        self.pending_camera = None;
        match pending.command {
            CameraCommand::FitSelection => {
                if let Some(target) = self.selection_fit_target() {
                    self.camera.fly_to(target);
                }
            }
            CameraCommand::Recenter => {
                let center = self
                    .layout
                    .position(&self.snapshot.local_id)
                    .unwrap_or(Vec2::ZERO);
                self.camera.fly_to(CameraTarget {
                    center,
                    zoom: self.camera.zoom,
                });
            }
        }
        false
    }

    fn selection_fit_target(&self) -> Option<CameraTarget> {
        let selected = self.selected.as_deref()?;
        let viewport = self.canvas_size?;
        let highlight = build_highlight_state(&self.snapshot, selected)?;
        let bounds = selection_bounds(highlight.node_ids().map(|id| self.layout.position(id)));
        fit_selection(
            bounds,
            self.layout.position(selected),
            viewport,
            PANEL_WIDTH,
            FIT_PADDING,
        )
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::super::super::test_support::{reference_snapshot, test_view_model};
    use super::*;

    #[test]
    fn selection_fit_waits_one_frame() {
        let mut model = test_view_model();
        model.track_canvas_size(vec2(1000.0, 600.0));
        model.apply_snapshot(reference_snapshot(false));

        model.set_selected(Some("peer-1".to_owned()));
        assert!(model.run_pending_camera());
        assert!(!model.camera.is_animating());

        assert!(!model.run_pending_camera());
        assert!(model.camera.is_animating());
        assert!(model.pending_camera.is_none());
    }

    #[test]
    fn fit_without_positions_is_skipped() {
        let mut model = test_view_model();
        model.track_canvas_size(vec2(1000.0, 600.0));
        model.selected = Some("peer-1".to_owned());
        model.schedule_camera(CameraCommand::FitSelection);

        model.run_pending_camera();
        model.run_pending_camera();
        assert!(!model.camera.is_animating());
    }

    #[test]
    fn resize_refits_only_with_a_selection() {
        let mut model = test_view_model();
        model.apply_snapshot(reference_snapshot(false));
        model.track_canvas_size(vec2(1000.0, 600.0));
        model.track_canvas_size(vec2(1200.0, 600.0));
        assert!(model.pending_camera.is_none());

        model.set_selected(Some("our-node".to_owned()));
        model.pending_camera = None;
        model.track_canvas_size(vec2(900.0, 700.0));
        assert_eq!(
            model.pending_camera.map(|pending| pending.command),
            Some(CameraCommand::FitSelection)
        );
    }

    #[test]
    fn growth_recenters_only_while_running_and_unselected() {
        let mut model = test_view_model();
        model.apply_snapshot(reference_snapshot(true));
        assert!(model.pending_camera.is_none());

        model.centering = InitialCentering::Done;
        model.apply_snapshot(GraphSnapshot::empty("our-node".to_owned()));
        model.pending_camera = None;
        model.apply_snapshot(reference_snapshot(true));
        assert_eq!(
            model.pending_camera.map(|pending| pending.command),
            Some(CameraCommand::Recenter)
        );

        model.pending_camera = None;
        model.apply_snapshot(GraphSnapshot::empty("our-node".to_owned()));
        model.apply_snapshot(reference_snapshot(false));
        assert!(model.pending_camera.is_none());
    }

    #[test]
    fn selection_survives_snapshots_that_keep_the_node() {
        let mut model = test_view_model();
        model.apply_snapshot(reference_snapshot(true));
        model.set_selected(Some("remote-1".to_owned()));
        model.apply_snapshot(reference_snapshot(false));
        assert_eq!(model.selected.as_deref(), Some("remote-1"));

        model.apply_snapshot(GraphSnapshot::empty("our-node".to_owned()));
        assert_eq!(model.selected, None);
    }
}
