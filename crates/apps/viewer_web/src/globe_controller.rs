//! Drag-to-rotate controller for the globe group.
//!
//! Pointer and touch deltas accumulate into a two-axis rotation offset; the
//! visible rotation eases toward that offset. An optional slow spin about Y
//! runs on top of it while the user is not interacting.

use foundation::math::Vec2;
use runtime::tween::Tween;

use crate::config::ControlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Client coordinate of the previous move, in pixels.
        last_px: Vec2,
    },
}

/// Window geometry needed to map client pixels to picking NDC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerLayout {
    pub window_width: f64,
    pub window_height: f64,
    /// Bounding-rect top of the canvas container.
    pub container_top: f64,
    pub wide_min_width: f64,
}

impl PointerLayout {
    /// Side-by-side layout: the canvas fills the right half of the window.
    pub fn is_wide(&self) -> bool {
        self.window_width >= self.wide_min_width
    }

    pub fn mouse_ndc(&self, client_px: Vec2) -> Vec2 {
        if self.is_wide() {
            let half = (self.window_width / 2.0).max(1.0);
            let h = self.window_height.max(1.0);
            Vec2::new(
                ((client_px.x - half) / half) * 2.0 - 1.0,
                -(client_px.y / h) * 2.0 + 1.0,
            )
        } else {
            self.stacked_ndc(client_px)
        }
    }

    /// Touch input always uses the stacked mapping.
    pub fn touch_ndc(&self, client_px: Vec2) -> Vec2 {
        self.stacked_ndc(client_px)
    }

    fn stacked_ndc(&self, client_px: Vec2) -> Vec2 {
        let w = self.window_width.max(1.0);
        let h = self.window_height.max(1.0);
        Vec2::new(
            (client_px.x / w) * 2.0 - 1.0,
            -((client_px.y - self.container_top) / h) * 2.0 + 1.0,
        )
    }
}

#[derive(Debug, Clone)]
pub struct GlobeController {
    config: ControlConfig,
    drag: DragState,
    /// Last touch coordinate; set on touch-start so the first drag delta is defined.
    touch_anchor: Option<Vec2>,
    pointer_ndc: Option<Vec2>,
    offset: Vec2,
    rotation: Tween<Vec2>,
    spin_y_rad: f64,
    idle_s: f64,
}

impl GlobeController {
    pub fn new(config: ControlConfig) -> Self {
        let idle_s = config.auto_rotate_resume_delay_s;
        Self {
            config,
            drag: DragState::Idle,
            touch_anchor: None,
            pointer_ndc: None,
            offset: Vec2::ZERO,
            rotation: Tween::settled(Vec2::ZERO),
            spin_y_rad: 0.0,
            idle_s,
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Accumulated drag target `(x, y)` in radians.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// `None` until the pointer has moved over the page.
    pub fn pointer_ndc(&self) -> Option<Vec2> {
        self.pointer_ndc
    }

    pub fn touch_anchor(&self) -> Option<Vec2> {
        self.touch_anchor
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.config.auto_rotate_enabled = enabled;
    }

    pub fn pointer_down(&mut self, client_px: Vec2) {
        self.drag = DragState::Dragging { last_px: client_px };
        self.idle_s = 0.0;
    }

    /// Returns `true` when the host should suppress the event's default action.
    pub fn pointer_move(&mut self, client_px: Vec2, ndc: Vec2) -> bool {
        self.pointer_ndc = Some(ndc);
        self.drag_to(client_px)
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn touch_start(&mut self, client_px: Vec2) {
        self.touch_anchor = Some(client_px);
    }

    /// A touch drag only starts once the touch point is over the sphere, so
    /// swipes elsewhere keep scrolling the page.
    pub fn touch_move(&mut self, client_px: Vec2, ndc: Vec2, hits_sphere: bool) -> bool {
        if hits_sphere && !self.is_dragging() {
            let last_px = self.touch_anchor.unwrap_or(client_px);
            self.drag = DragState::Dragging { last_px };
            self.idle_s = 0.0;
        }

        if !self.is_dragging() {
            self.touch_anchor = Some(client_px);
            return false;
        }

        self.pointer_ndc = Some(ndc);
        self.touch_anchor = Some(client_px);
        self.drag_to(client_px)
    }

    pub fn touch_end(&mut self) {
        self.drag = DragState::Idle;
        self.touch_anchor = None;
    }

    fn drag_to(&mut self, client_px: Vec2) -> bool {
        let DragState::Dragging { last_px } = self.drag else {
            return false;
        };
        let delta = client_px - last_px;
        self.drag = DragState::Dragging { last_px: client_px };

        let s = self.config.drag_sensitivity;
        self.offset += Vec2::new(delta.y * s, delta.x * s);
        self.rotation
            .retarget(self.offset, self.config.rotation_duration_s);
        self.idle_s = 0.0;
        true
    }

    /// Advance easing and spin by `dt_s`; returns the group rotation `(x, y)`.
    pub fn update(&mut self, dt_s: f64) -> Vec2 {
        let eased = self.rotation.advance(dt_s);

        if self.is_dragging() {
            self.idle_s = 0.0;
        } else {
            self.idle_s += dt_s;
            if self.config.auto_rotate_enabled
                && self.idle_s >= self.config.auto_rotate_resume_delay_s
            {
                self.spin_y_rad += self.config.auto_rotate_speed_deg_per_s.to_radians() * dt_s;
            }
        }

        Vec2::new(eased.x, eased.y + self.spin_y_rad)
    }

    /// Drop all accumulated rotation.
    pub fn reset(&mut self) {
        self.drag = DragState::Idle;
        self.touch_anchor = None;
        self.offset = Vec2::ZERO;
        self.rotation = Tween::settled(Vec2::ZERO);
        self.spin_y_rad = 0.0;
        self.idle_s = self.config.auto_rotate_resume_delay_s;
    }
}
