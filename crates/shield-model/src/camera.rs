use crate::geometry::Vec2;

pub const DEFAULT_MIN_ZOOM: f32 = 0.2;
pub const DEFAULT_MAX_ZOOM: f32 = 3.0;
pub const DEFAULT_ZOOM_STEP: f32 = 0.1;
/// Smallest and largest zoom bound a camera accepts.
pub const ZOOM_FLOOR: f32 = 1e-3;
pub const ZOOM_CEILING: f32 = 1e3;

/// Pan/zoom transform of the canvas: `screen = world * zoom + offset`.
///
/// The zoom is kept inside `[min_zoom, max_zoom]`; the offset is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    zoom: f32,
    offset: Vec2,
    min_zoom: f32,
    max_zoom: f32,
    zoom_step: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Vec2::ZERO,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom bounds. See [`Camera::set_bounds`].
    pub fn with_bounds(min_zoom: f32, max_zoom: f32) -> Self {
        let mut camera = Self::default();
        camera.set_bounds(min_zoom, max_zoom);
        camera
    }

    pub fn with_zoom_step(mut self, zoom_step: f32) -> Self {
        self.zoom_step = zoom_step;
        self
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    /// Inverted bounds are swapped. Each bound is held inside
    /// `[ZOOM_FLOOR, ZOOM_CEILING]` so the zoom never reaches zero; NaN
    /// reads as the floor.
    pub fn set_bounds(&mut self, min_zoom: f32, max_zoom: f32) {
        let min_zoom = sanitize_bound(min_zoom);
        let max_zoom = sanitize_bound(max_zoom);
        let (lo, hi) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        self.min_zoom = lo;
        self.max_zoom = hi;
        self.zoom = self.clamp_zoom(self.zoom);
    }

    /// Sets the zoom directly, clamped to the bounds.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = self.clamp_zoom(zoom);
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zooms by `delta` wheel units while keeping the world point under
    /// `pointer` fixed on screen.
    pub fn zoom_at(&mut self, pointer: Vec2, delta: f32) {
        let old_zoom = self.zoom;
        let new_zoom = self
            .clamp_zoom(old_zoom + delta * self.zoom_step * old_zoom);
        self.offset =
            (self.offset - pointer) * (new_zoom / old_zoom) + pointer;
        self.zoom = new_zoom;
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.zoom
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world * self.zoom + self.offset
    }

    /// Restores zoom 1 and zero offset, keeping bounds and step.
    pub fn reset_view(&mut self) {
        self.zoom = self.clamp_zoom(1.0);
        self.offset = Vec2::ZERO;
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

fn sanitize_bound(bound: f32) -> f32 {
    if bound.is_nan() {
        return ZOOM_FLOOR;
    }
    bound.clamp(ZOOM_FLOOR, ZOOM_CEILING)
}
