use eframe::egui::{self, PointerButton, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::physics::REHEAT_ALPHA;

pub(in crate::app) const MIN_HIT_RADIUS: f32 = 14.0;
pub(in crate::app) const FALLBACK_PICK_DISTANCE: f32 = 24.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct HitTarget {
    pub index: usize,
    pub center: Pos2,
    pub radius: f32,
    pub hit_radius: f32,
}

pub(in crate::app) fn hit_radius(
    visual_radius: f32,
    selection_active: bool,
    highlighted: bool,
) -> f32 {
    if selection_active && !highlighted {
        visual_radius
    } else {
        visual_radius.max(MIN_HIT_RADIUS)
    }
}

pub(in crate::app) fn hit_test(targets: &[HitTarget], pointer: Pos2) -> Option<usize> {
    targets
        .iter()
        .filter_map(|target| {
            let distance = target.center.distance(pointer);
            (distance <= target.hit_radius).then_some((target.index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

pub(in crate::app) fn nearest_within(
    targets: &[HitTarget],
    pointer: Pos2,
    max_distance: f32,
) -> Option<usize> {
    targets
        .iter()
        .map(|target| (target.index, target.center.distance(pointer) - target.radius))
        .filter(|(_, gap)| *gap <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Node picked by a click: direct hit first, then the nearest node close
/// enough to the pointer. `None` means the background was clicked.
pub(in crate::app) fn resolve_click(targets: &[HitTarget], pointer: Pos2) -> Option<usize> {
    hit_test(targets, pointer)
        .or_else(|| nearest_within(targets, pointer, FALLBACK_PICK_DISTANCE))
}

/// Clicking the selected node again deselects it; clicking nothing clears.
pub(in crate::app) fn toggle_selection(
    current: Option<&str>,
    clicked: Option<&str>,
) -> Option<String> {
    match clicked {
        Some(id) if current == Some(id) => None,
        Some(id) => Some(id.to_owned()),
        None => None,
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.camera.zoom_at(rect, pointer, zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        let background_drag =
            self.dragging.is_none() && response.dragged_by(PointerButton::Primary);
        if background_drag
            || response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.camera.pan_by(response.drag_delta());
        }
    }

    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        targets: &[HitTarget],
    ) {
        if response.drag_started_by(PointerButton::Primary) {
            let press = ui
                .input(|input| input.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(press) = press
                && let Some(index) = hit_test(targets, press)
                && let Some(node) = self.snapshot.nodes.get(index)
            {
                let id = node.id.clone();
                let world = self.camera.screen_to_world(rect, press);
                self.layout.pin(&id, world);
                self.layout.reheat(REHEAT_ALPHA);
                self.dragging = Some(id);
            }
        }

        if let Some(id) = &self.dragging
            && response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = self.camera.screen_to_world(rect, pointer);
            self.layout.pin(id, world);
        }

        if response.drag_stopped_by(PointerButton::Primary)
            && let Some(id) = self.dragging.take()
        {
            self.layout.unpin(&id);
            self.layout.reheat(REHEAT_ALPHA);
        }
    }

    pub(in crate::app) fn handle_graph_click(
        &mut self,
        response: &egui::Response,
        targets: &[HitTarget],
    ) {
        if !response.clicked_by(PointerButton::Primary) {
            return;
        }
        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };

        let clicked = resolve_click(targets, pointer)
            .and_then(|index| self.snapshot.nodes.get(index))
            .map(|node| node.id.clone());
        let next = toggle_selection(self.selected.as_deref(), clicked.as_deref());
        self.set_selected(next);
    }
}
