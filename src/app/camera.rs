use eframe::egui::{Pos2, Rect, Vec2, vec2};

pub(in crate::app) const PANEL_WIDTH: f32 = 320.0;
pub(in crate::app) const FIT_PADDING: f32 = 80.0;
pub(in crate::app) const MIN_ZOOM: f32 = 0.1;
pub(in crate::app) const MAX_ZOOM: f32 = 8.0;
pub(in crate::app) const DEFAULT_ZOOM: f32 = 1.5;
const SMOOTHING_RATE: f32 = 8.0;
const SETTLE_EPSILON: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct CameraTarget {
    pub center: Vec2,
    pub zoom: f32,
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Camera {
    pub center: Vec2,
    pub zoom: f32,
    target: Option<CameraTarget>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: DEFAULT_ZOOM,
            target: None,
        }
    }
}

impl Camera {
    pub(in crate::app) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + (world - self.center) * self.zoom
    }

    pub(in crate::app) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        self.center + (screen - rect.center()) / self.zoom
    }

    pub(in crate::app) fn pan_by(&mut self, screen_delta: Vec2) {
        self.target = None;
        self.center -= screen_delta / self.zoom;
    }

    pub(in crate::app) fn zoom_at(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        self.target = None;
        let world_before = self.screen_to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.center = world_before - (anchor - rect.center()) / self.zoom;
    }

    pub(in crate::app) fn fly_to(&mut self, target: CameraTarget) {
        self.target = Some(target);
    }

    pub(in crate::app) fn jump_to(&mut self, target: CameraTarget) {
        self.target = None;
        self.center = target.center;
        self.zoom = target.zoom;
    }

    pub(in crate::app) fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    pub(in crate::app) fn update(&mut self, dt: f32) {
        let Some(target) = self.target else {
            return;
        };

        let t = 1.0 - (-SMOOTHING_RATE * dt.max(0.0)).exp();
        self.center += (target.center - self.center) * t;
        self.zoom += (target.zoom - self.zoom) * t;

        let settled = (target.center - self.center).length() * self.zoom < SETTLE_EPSILON
            && (target.zoom - self.zoom).abs() < SETTLE_EPSILON * 0.01;
        if settled {
            self.center = target.center;
            self.zoom = target.zoom;
            self.target = None;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub(in crate::app) fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

pub(in crate::app) fn selection_bounds(
    positions: impl IntoIterator<Item = Option<Vec2>>,
) -> Option<WorldBounds> {
    let mut bounds: Option<WorldBounds> = None;
    for pos in positions.into_iter().flatten() {
        if !pos.x.is_finite() || !pos.y.is_finite() {
            continue;
        }
        bounds = Some(match bounds {
            Some(current) => WorldBounds {
                min: current.min.min(pos),
                max: current.max.max(pos),
            },
            None => WorldBounds { min: pos, max: pos },
        });
    }
    bounds
}

/// Frames `bounds` inside the part of `viewport` not covered by the detail
/// panel, keeping `focus` centered in that unobstructed area.
pub(in crate::app) fn fit_selection(
    bounds: Option<WorldBounds>,
    focus: Option<Vec2>,
    viewport: Vec2,
    panel_width: f32,
    padding: f32,
) -> Option<CameraTarget> {
    let bounds = bounds?;
    let focus = focus?;

    let visible = vec2(viewport.x - panel_width, viewport.y);
    let size = bounds.size();
    let axis_zoom = |available: f32, extent: f32| {
        if extent <= f32::EPSILON {
            MAX_ZOOM
        } else {
            (available - 2.0 * padding) / extent
        }
    };
    let zoom = axis_zoom(visible.x, size.x)
        .min(axis_zoom(visible.y, size.y))
        .clamp(MIN_ZOOM, MAX_ZOOM);

    Some(CameraTarget {
        center: vec2(focus.x + panel_width / 2.0 / zoom, focus.y),
        zoom,
    })
}

pub(in crate::app) const CENTERING_INTERVAL_SECS: f64 = 0.1;
pub(in crate::app) const CENTERING_MAX_ATTEMPTS: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum InitialCentering {
    Waiting { attempts: u32, next_at: f64 },
    Done,
}

impl InitialCentering {
    pub(in crate::app) fn new(now: f64) -> Self {
        Self::Waiting {
            attempts: 0,
            next_at: now,
        }
    }

    pub(in crate::app) fn poll(
        &mut self,
        now: f64,
        layout_ticked: bool,
        local_position: Option<Vec2>,
    ) -> Option<CameraTarget> {
        let Self::Waiting { attempts, next_at } = *self else {
            return None;
        };
        if !layout_ticked || now < next_at {
            return None;
        }

        if let Some(pos) = local_position {
            *self = Self::Done;
            return Some(CameraTarget {
                center: pos,
                zoom: DEFAULT_ZOOM,
            });
        }

        let attempts = attempts + 1;
        if attempts >= CENTERING_MAX_ATTEMPTS {
            *self = Self::Done;
            return Some(CameraTarget {
                center: Vec2::ZERO,
                zoom: DEFAULT_ZOOM,
            });
        }

        *self = Self::Waiting {
            attempts,
            next_at: now + CENTERING_INTERVAL_SECS,
        };
        None
    }

    pub(in crate::app) fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min: (f32, f32), max: (f32, f32)) -> Option<WorldBounds> {
        Some(WorldBounds {
            min: vec2(min.0, min.1),
            max: vec2(max.0, max.1),
        })
    }

    #[test]
    fn fit_selection_frames_reference_box() {
        let target = fit_selection(
            bounds((0.0, 0.0), (100.0, 50.0)),
            Some(vec2(50.0, 25.0)),
            vec2(1000.0, 600.0),
            PANEL_WIDTH,
            FIT_PADDING,
        )
        .unwrap();

        assert!((target.zoom - 5.2).abs() < 1e-4);
        assert!((target.center.x - 80.769).abs() < 0.01);
        assert!((target.center.y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn fit_selection_clamps_zoom() {
        let huge = fit_selection(
            bounds((0.0, 0.0), (100_000.0, 100_000.0)),
            Some(Vec2::ZERO),
            vec2(1000.0, 600.0),
            PANEL_WIDTH,
            FIT_PADDING,
        )
        .unwrap();
        assert_eq!(huge.zoom, MIN_ZOOM);

        let tiny = fit_selection(
            bounds((0.0, 0.0), (1.0, 1.0)),
            Some(Vec2::ZERO),
            vec2(1000.0, 600.0),
            PANEL_WIDTH,
            FIT_PADDING,
        )
        .unwrap();
        assert_eq!(tiny.zoom, MAX_ZOOM);

        let single_point = fit_selection(
            bounds((5.0, 5.0), (5.0, 5.0)),
            Some(vec2(5.0, 5.0)),
            vec2(1000.0, 600.0),
            PANEL_WIDTH,
            FIT_PADDING,
        )
        .unwrap();
        assert_eq!(single_point.zoom, MAX_ZOOM);
    }

    #[test]
    fn fit_selection_without_coordinates_is_a_no_op() {
        assert!(fit_selection(None, Some(Vec2::ZERO), vec2(800.0, 600.0), 320.0, 80.0).is_none());
        assert!(selection_bounds([None, None]).is_none());
        assert!(selection_bounds(Vec::new()).is_none());
    }

    #[test]
    fn selection_bounds_skips_missing_positions() {
        let found = selection_bounds([Some(vec2(3.0, -2.0)), None, Some(vec2(-1.0, 4.0))]).unwrap();
        assert_eq!(found.min, vec2(-1.0, -2.0));
        assert_eq!(found.max, vec2(3.0, 4.0));
    }

    #[test]
    fn screen_and_world_round_trip_through_zoom_at() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let mut camera = Camera::default();
        let anchor = Pos2::new(600.0, 100.0);
        let world = camera.screen_to_world(rect, anchor);

        camera.zoom_at(rect, anchor, 2.0);
        let after = camera.world_to_screen(rect, world);
        assert!((after - anchor).length() < 1e-3);
    }

    #[test]
    fn update_converges_on_target() {
        let mut camera = Camera::default();
        camera.fly_to(CameraTarget {
            center: vec2(120.0, -40.0),
            zoom: 3.0,
        });
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!(!camera.is_animating());
        assert_eq!(camera.center, vec2(120.0, -40.0));
        assert_eq!(camera.zoom, 3.0);
    }

    #[test]
    fn initial_centering_waits_for_first_tick_and_position() {
        let mut centering = InitialCentering::new(0.0);
        assert_eq!(centering.poll(0.0, false, Some(vec2(1.0, 1.0))), None);
        assert_eq!(centering.poll(0.0, true, None), None);
        assert_eq!(centering.poll(0.05, true, Some(vec2(4.0, 2.0))), None);

        let target = centering.poll(0.1, true, Some(vec2(4.0, 2.0))).unwrap();
        assert_eq!(target.center, vec2(4.0, 2.0));
        assert_eq!(target.zoom, DEFAULT_ZOOM);
        assert!(centering.is_done());
        assert_eq!(centering.poll(10.0, true, Some(vec2(4.0, 2.0))), None);
    }

    #[test]
    fn initial_centering_falls_back_to_origin() {
        let mut centering = InitialCentering::new(0.0);
        let mut now = 0.0;
        let mut result = None;
        for _ in 0..CENTERING_MAX_ATTEMPTS {
            result = centering.poll(now, true, None);
            now += CENTERING_INTERVAL_SECS;
        }

        assert_eq!(
            result,
            Some(CameraTarget {
                center: Vec2::ZERO,
                zoom: DEFAULT_ZOOM,
            })
        );
        assert!(centering.is_done());
    }
}
