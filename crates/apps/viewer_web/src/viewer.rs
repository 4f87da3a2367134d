use foundation::Time;
use foundation::math::{Vec2, Vec3};
use formats::{CountryRecord, parse_countries};
use gpu::{Camera3D, RenderFrame, Renderer, Viewport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use runtime::frame::{Frame, FrameClock};
use scene::hover::{HoverChange, HoverTracker};
use scene::picking::{pick_bars, ray_hits_entity};
use scene::world::World;
use scene::{GlobeScene, spawn_population_globe};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::globe_controller::{GlobeController, PointerLayout};
use crate::wgpu::Globals;

/// Result of one animation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub frame: Frame,
    pub hover: HoverChange,
}

/// Everything the page mutates: scene, input, camera and clock.
#[derive(Debug)]
pub struct ViewerState {
    pub config: ViewerConfig,
    pub world: World,
    pub globe: GlobeScene,
    pub controller: GlobeController,
    pub hover: HoverTracker,
    pub viewport: Viewport,
    pub clock: FrameClock,
    pub layout: PointerLayout,
}

impl ViewerState {
    pub fn new(
        config: ViewerConfig,
        countries: &[CountryRecord],
        width: u32,
        height: u32,
        layout: PointerLayout,
    ) -> Self {
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(config.globe.rng_seed);
        let globe = spawn_population_globe(&mut world, countries, &config.globe, &mut rng);

        let camera = Camera3D::look_at(
            Vec3::new(0.0, 0.0, config.camera.distance),
            Vec3::ZERO,
            config.camera.fov_y_deg.to_radians(),
            config.camera.near,
            config.camera.far,
        );

        Self {
            controller: GlobeController::new(config.controls.clone()),
            hover: HoverTracker::new(config.globe.bar_opacity, config.globe.bar_hover_opacity),
            viewport: Viewport::new(width, height, camera),
            clock: FrameClock::new(),
            world,
            globe,
            layout,
            config,
        }
    }

    /// Build from a JSON country list such as the bundled dataset.
    pub fn from_dataset(
        config: ViewerConfig,
        dataset_json: &str,
        width: u32,
        height: u32,
        layout: PointerLayout,
    ) -> Result<Self, ViewerError> {
        let countries = parse_countries(dataset_json)?;
        Ok(Self::new(config, &countries, width, height, layout))
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.viewport.resize(width, height)
    }

    pub fn set_layout(&mut self, layout: PointerLayout) {
        self.layout = layout;
    }

    pub fn mouse_down(&mut self, client_px: Vec2) {
        self.controller.pointer_down(client_px);
    }

    /// Returns `true` when the browser's default action should be prevented.
    pub fn mouse_move(&mut self, client_px: Vec2) -> bool {
        let ndc = self.layout.mouse_ndc(client_px);
        self.controller.pointer_move(client_px, ndc)
    }

    pub fn mouse_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn touch_start(&mut self, client_px: Vec2) {
        self.controller.touch_start(client_px);
    }

    /// Starts a drag only when the touch point lies over the globe.
    pub fn touch_move(&mut self, client_px: Vec2) -> bool {
        let ndc = self.layout.touch_ndc(client_px);
        let ray = self.viewport.camera.ray_through_ndc(ndc);
        let hits_sphere = ray_hits_entity(&self.world, self.globe.sphere, ray).is_some();
        self.controller.touch_move(client_px, ndc, hits_sphere)
    }

    pub fn touch_end(&mut self) {
        self.controller.touch_end();
    }

    /// Advance the clock and animations, then redo hover from the pointer.
    pub fn step(&mut self, now: Time) -> FrameOutput {
        let frame = self.clock.tick(now);

        let rotation = self.controller.update(frame.dt_s);
        self.globe
            .set_group_rotation(&mut self.world, rotation.x, rotation.y);
        self.globe.animate_bars(&mut self.world, frame.dt_s);

        let hit = self.controller.pointer_ndc().and_then(|ndc| {
            let ray = self.viewport.camera.ray_through_ndc(ndc);
            pick_bars(&self.world, ray)
        });
        let hover = self.hover.update(&mut self.world, hit);

        FrameOutput { frame, hover }
    }

    pub fn render_frame(&self) -> RenderFrame {
        Renderer::collect(&self.world)
    }

    pub fn globals(&self) -> Globals {
        let camera = &self.viewport.camera;
        Globals::new(&camera.view_proj(), &camera.view())
    }

    pub fn star_positions(&self) -> Vec<[f32; 3]> {
        self.world
            .drawable_3d(self.globe.stars)
            .and_then(|d| match d.shape {
                scene::components::Shape3D::Points { cloud } => self.world.point_cloud(cloud),
                _ => None,
            })
            .map(|points| points.iter().map(|p| p.as_f32()).collect())
            .unwrap_or_default()
    }

    pub fn bar_count(&self) -> usize {
        self.globe.bars.len()
    }

    /// Clear rotation and hover state.
    pub fn reset_view(&mut self) -> HoverChange {
        self.controller.reset();
        self.globe.set_group_rotation(&mut self.world, 0.0, 0.0);
        self.hover.clear(&mut self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerState;
    use crate::config::ViewerConfig;
    use crate::globe_controller::PointerLayout;
    use foundation::Time;
    use foundation::math::{Quat, Vec2};
    use formats::CountryRecord;
    use pretty_assertions::assert_eq;
    use scene::hover::HoverChange;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9, "expected {a} ~= {b}");
    }

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 800;

    fn stacked_layout() -> PointerLayout {
        PointerLayout {
            window_width: WIDTH as f64,
            window_height: HEIGHT as f64,
            container_top: 0.0,
            wide_min_width: 1280.0,
        }
    }

    fn state() -> ViewerState {
        let mut config = ViewerConfig::default();
        config.globe.star_count = 16;
        config.controls.auto_rotate_enabled = false;
        let countries = vec![CountryRecord {
            name: "Testland".to_string(),
            population: 1_000_000_000,
            latlng: Some([0.0, 0.0]),
        }];
        ViewerState::new(config, &countries, WIDTH, HEIGHT, stacked_layout())
    }

    fn center_px() -> Vec2 {
        Vec2::new(WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0)
    }

    #[test]
    fn builds_from_bundled_dataset() {
        let s = ViewerState::from_dataset(
            ViewerConfig::default(),
            include_str!("../assets/countries.json"),
            WIDTH,
            HEIGHT,
            stacked_layout(),
        )
        .expect("bundled dataset parses");
        assert!(s.bar_count() > 100);
        assert_eq!(s.star_positions().len(), 10_000);
    }

    #[test]
    fn hovering_the_centered_bar_shows_its_tooltip() {
        let mut s = state();
        s.mouse_move(center_px());
        let out = s.step(Time::from_millis(0.0));
        let bar = s.globe.bars[0].entity;
        assert_eq!(
            out.hover,
            HoverChange::Entered {
                entity: bar,
                label: "Testland".to_string(),
                value: "1,000,000,000".to_string(),
            }
        );
        assert_eq!(s.world.material(bar).map(|m| m.opacity), Some(1.0));

        // Same target next frame: nothing to write.
        let out = s.step(Time::from_millis(16.0));
        assert_eq!(out.hover, HoverChange::Unchanged);
    }

    #[test]
    fn moving_off_the_bar_clears_hover() {
        let mut s = state();
        s.mouse_move(center_px());
        s.step(Time::from_millis(0.0));
        s.mouse_move(Vec2::new(2.0, 2.0));
        let out = s.step(Time::from_millis(16.0));
        assert_eq!(out.hover, HoverChange::Cleared);
        let bar = s.globe.bars[0].entity;
        assert_eq!(s.world.material(bar).map(|m| m.opacity), Some(0.4));
    }

    #[test]
    fn no_pointer_hides_the_tooltip_once() {
        let mut s = state();
        let out = s.step(Time::from_millis(0.0));
        assert_eq!(out.hover, HoverChange::Cleared);
        assert_eq!(s.hover.hovered(), None);
        assert_eq!(s.step(Time::from_millis(16.0)).hover, HoverChange::Unchanged);
    }

    #[test]
    fn initial_miss_hides_the_tooltip() {
        let mut s = state();
        s.mouse_move(Vec2::new(2.0, 2.0));
        let changes: Vec<HoverChange> = (0..3)
            .map(|i| s.step(Time::from_millis(i as f64 * 16.0)).hover)
            .collect();
        assert_eq!(
            changes,
            vec![HoverChange::Cleared, HoverChange::Unchanged, HoverChange::Unchanged]
        );
    }

    #[test]
    fn mouse_drag_rotates_the_group() {
        let mut s = state();
        s.mouse_down(Vec2::new(100.0, 100.0));
        assert!(s.mouse_move(Vec2::new(200.0, 100.0)));
        s.mouse_up();
        assert!(!s.mouse_move(Vec2::new(300.0, 100.0)));
        assert_close(s.controller.offset().x, 0.0);
        assert_close(s.controller.offset().y, 0.5);

        // Frame deltas are capped, so walk the clock past the 2 s ease.
        for i in 0..40 {
            s.step(Time::from_millis(i as f64 * 100.0));
        }
        let r = s.world.transform(s.globe.group).expect("group transform").rotation;
        let expected = Quat::from_euler_xyz(0.0, 0.5, 0.0);
        assert_close(r.y, expected.y);
        assert_close(r.w, expected.w);
    }

    #[test]
    fn touch_drag_requires_the_globe_under_the_finger() {
        let mut s = state();
        s.touch_start(Vec2::new(1.0, 1.0));
        assert!(!s.touch_move(Vec2::new(2.0, 2.0)));
        assert!(!s.controller.is_dragging());

        s.touch_start(center_px());
        assert!(s.touch_move(center_px() + Vec2::new(10.0, 0.0)));
        assert!(s.controller.is_dragging());
        s.touch_end();
        assert!(!s.controller.is_dragging());
    }

    #[test]
    fn resize_is_idempotent() {
        let mut s = state();
        assert!(s.resize(1024, 512));
        let camera = s.viewport.camera;
        assert!(!s.resize(1024, 512));
        assert_eq!(s.viewport.camera, camera);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn render_frame_includes_every_layer() {
        let s = state();
        let frame = s.render_frame();
        assert_eq!(frame.bars().count(), 1);
        assert_eq!(frame.commands.len(), 4);
        let globals = s.globals();
        // Camera at z = 15 looking at the origin: view translates by -15.
        assert_eq!(globals.view[3][2], -15.0);
    }

    #[test]
    fn reset_view_clears_hover_and_rotation() {
        let mut s = state();
        s.mouse_move(center_px());
        s.step(Time::from_millis(0.0));
        s.mouse_down(Vec2::ZERO);
        s.mouse_move(Vec2::new(50.0, 50.0));
        assert_eq!(s.reset_view(), HoverChange::Cleared);
        assert_eq!(s.controller.offset(), Vec2::ZERO);
        assert_eq!(
            s.world.transform(s.globe.group).map(|t| t.rotation),
            Some(Quat::IDENTITY)
        );
    }
}
