use eframe::egui::{self, Align2, Color32, CursorIcon, FontId, Sense, Stroke, Ui, vec2};

use crate::util::truncate_label;

use super::super::highlight::{HighlightState, build_highlight_state};
use super::super::render_utils::{
    LABEL_MAX_CHARS, LinkEmphasis, blend_color, circle_visible, draw_background, fade_color,
    label_visible, link_stroke, node_radius, segment_visible,
};
use super::super::ViewModel;
use super::interaction::{HitTarget, hit_radius, hit_test};

const DIMMED_OPACITY: f32 = 0.22;
const SELECTED_RING: Color32 = Color32::from_rgba_premultiplied(110, 92, 40, 110);
const NEIGHBOR_RING: Color32 = Color32::from_rgba_premultiplied(40, 50, 62, 70);

impl ViewModel {
    fn hit_targets(
        &self,
        rect: egui::Rect,
        highlight: Option<&HighlightState>,
    ) -> Vec<HitTarget> {
        let selection_active = highlight.is_some();
        let zoom_scale = self.camera.zoom.sqrt().clamp(0.5, 2.5);

        self.snapshot
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let world = self.layout.position(&node.id)?;
                let center = self.camera.world_to_screen(rect, world);
                let radius = node_radius(node) * zoom_scale;
                if !circle_visible(rect, center, radius.max(1.0) + 24.0) {
                    return None;
                }
                let highlighted = highlight.is_some_and(|state| state.contains(&node.id));
                Some(HitTarget {
                    index,
                    center,
                    radius,
                    hit_radius: hit_radius(radius, selection_active, highlighted),
                })
            })
            .collect()
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.track_canvas_size(rect.size());
        let painter = ui.painter_at(rect);

        let (now, frame_delta_seconds) = ui.input(|input| {
            (
                input.time,
                input.stable_dt.clamp(1.0 / 240.0, 1.0 / 20.0),
            )
        });

        let mut physics_moving = false;
        if self.live_physics || self.dragging.is_some() {
            physics_moving = self.layout.step(self.physics);
        }

        let local_position = self.layout.position(&self.snapshot.local_id);
        if let Some(target) = self
            .centering
            .poll(now, self.layout.has_ticked(), local_position)
        {
            self.camera.jump_to(target);
        }
        let camera_waiting = self.run_pending_camera() || !self.centering.is_done();
        self.camera.update(frame_delta_seconds);
        let camera_moving = self.camera.is_animating();

        let highlight = self
            .selected
            .as_deref()
            .and_then(|id| build_highlight_state(&self.snapshot, id));
        let targets = self.hit_targets(rect, highlight.as_ref());

        self.handle_node_drag(ui, rect, &response, &targets);
        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        if physics_moving || camera_moving || camera_waiting || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        draw_background(&painter, rect, &self.camera);

        let zoom_scale = self.camera.zoom.sqrt().clamp(0.5, 2.5);
        for link in &self.snapshot.links {
            let (Some(source), Some(target)) = (
                self.layout.position(&link.source),
                self.layout.position(&link.target),
            ) else {
                continue;
            };
            let start = self.camera.world_to_screen(rect, source);
            let end = self.camera.world_to_screen(rect, target);
            if !segment_visible(rect, start, end, 4.0) {
                continue;
            }

            let emphasis = match &highlight {
                None => LinkEmphasis::Normal,
                Some(state) if state.touches_link(&link.id) => LinkEmphasis::Selected,
                Some(_) => LinkEmphasis::Background,
            };
            let mut stroke = link_stroke(link, emphasis);
            stroke.width *= zoom_scale;
            painter.line_segment([start, end], stroke);
        }

        let hovered_index = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| hit_test(&targets, pointer));
        if hovered_index.is_some() {
            ui.ctx().set_cursor_icon(if self.dragging.is_some() {
                CursorIcon::Grabbing
            } else {
                CursorIcon::PointingHand
            });
        }

        let label_font = FontId::proportional(12.0);
        for target in &targets {
            let Some(node) = self.snapshot.nodes.get(target.index) else {
                continue;
            };

            let is_selected = highlight.as_ref().is_some_and(|state| state.selected == node.id);
            let is_neighbor = highlight.as_ref().is_some_and(|state| state.is_neighbor(&node.id));
            let is_hovered = hovered_index == Some(target.index);
            let dimmed = highlight.is_some() && !is_selected && !is_neighbor;

            if is_selected {
                painter.circle_filled(target.center, target.radius + 10.0, SELECTED_RING);
            } else if is_neighbor {
                painter.circle_filled(target.center, target.radius + 6.0, NEIGHBOR_RING);
            }

            let mut fill = node.color;
            if is_hovered {
                fill = blend_color(fill, Color32::WHITE, 0.35);
            }
            if dimmed {
                fill = fade_color(fill, DIMMED_OPACITY);
            }
            painter.circle_filled(target.center, target.radius, fill);

            let outline = if node.is_our_node {
                Stroke::new(2.0, Color32::from_rgb(255, 214, 120))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(12, 14, 18, 200))
            };
            painter.circle_stroke(
                target.center,
                target.radius,
                if dimmed {
                    Stroke::new(outline.width, fade_color(outline.color, DIMMED_OPACITY))
                } else {
                    outline
                },
            );

            let highlighted = is_selected || is_neighbor;
            if label_visible(node, highlighted || is_hovered, self.camera.zoom) {
                let color = if dimmed {
                    Color32::from_gray(110)
                } else {
                    Color32::from_gray(236)
                };
                painter.text(
                    target.center + vec2(target.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(&node.alias, LABEL_MAX_CHARS),
                    label_font.clone(),
                    color,
                );
            }
        }

        if let Some(index) = hovered_index
            && let Some(node) = self.snapshot.nodes.get(index)
        {
            let degree = self.snapshot.neighbors_of(&node.id).count();
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  hop {}  |  {} channels", node.alias, node.hop, degree),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.handle_graph_click(&response, &targets);

        if self.selected.is_some() {
            self.draw_details_overlay(ui.ctx(), rect);
        }
    }
}
