use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::lightning::{GraphLink, GraphNode};

use super::camera::Camera;

pub(super) const LOCAL_NODE_RADIUS: f32 = 14.0;
pub(super) const PEER_NODE_RADIUS: f32 = 9.0;
pub(super) const REMOTE_NODE_RADIUS: f32 = 5.0;
pub(super) const LABEL_MAX_CHARS: usize = 18;
pub(super) const LABEL_ZOOM_THRESHOLD: f32 = 1.8;

const GOSSIP_WIDTH_MIN: f32 = 0.4;
const GOSSIP_WIDTH_MAX: f32 = 2.5;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn fade_color(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, camera: &Camera) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 20, 27));

    let step = (64.0 * camera.zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = camera.world_to_screen(rect, eframe::egui::Vec2::ZERO);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(58, 66, 82, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn node_radius(node: &GraphNode) -> f32 {
    if node.is_our_node {
        LOCAL_NODE_RADIUS
    } else if node.has_channel {
        PEER_NODE_RADIUS
    } else {
        REMOTE_NODE_RADIUS
    }
}

pub(super) fn label_visible(node: &GraphNode, highlighted: bool, zoom: f32) -> bool {
    node.is_our_node || node.has_channel || highlighted || zoom > LABEL_ZOOM_THRESHOLD
}

pub(super) fn gossip_link_width(capacity_sats: u64) -> f32 {
    let magnitude = (capacity_sats.max(1) as f64).log10() as f32;
    ((magnitude - 4.0) * 0.5).clamp(GOSSIP_WIDTH_MIN, GOSSIP_WIDTH_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum LinkEmphasis {
    Normal,
    Selected,
    Background,
}

pub(super) fn link_stroke(link: &GraphLink, emphasis: LinkEmphasis) -> Stroke {
    match (emphasis, link.is_our_channel) {
        (LinkEmphasis::Selected, true) => Stroke::new(3.2, Color32::from_rgb(255, 196, 87)),
        (LinkEmphasis::Selected, false) => Stroke::new(2.2, Color32::from_rgb(124, 198, 255)),
        (LinkEmphasis::Background, _) => {
            Stroke::new(0.5, Color32::from_rgba_unmultiplied(90, 100, 118, 14))
        }
        (LinkEmphasis::Normal, true) => {
            Stroke::new(2.4, Color32::from_rgba_unmultiplied(247, 178, 72, 220))
        }
        (LinkEmphasis::Normal, false) => Stroke::new(
            gossip_link_width(link.capacity),
            Color32::from_rgba_unmultiplied(110, 124, 148, 110),
        ),
    }
}
