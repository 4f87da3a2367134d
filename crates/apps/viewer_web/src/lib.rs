use console_error_panic_hook::set_once;
use foundation::Time;
use foundation::math::Vec2;
use gloo_net::http::Request;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    AddEventListenerOptions, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
    TouchEvent, Window,
};

pub mod config;
pub mod error;
pub mod globe_controller;
pub mod logging;
pub mod texture;
pub mod tooltip;
pub mod viewer;
mod wgpu;

pub use config::ViewerConfig;
pub use error::ViewerError;
pub use viewer::ViewerState;

use globe_controller::PointerLayout;
use texture::{MAX_TEXTURE_DIM, TextureImage, decode_texture};
use tooltip::Tooltip;
use wgpu::{
    WgpuContext, init_wgpu_from_canvas, render_frame, resize_wgpu, set_globe_texture,
    surface_size,
};

const COUNTRIES_JSON: &str = include_str!("../assets/countries.json");

/// Mounted page: application state plus the DOM and GPU handles it drives.
struct App {
    state: ViewerState,
    window: Window,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    /// Canvas backing-store size in device pixels.
    surface: (u32, u32),
    tooltip: Option<Tooltip>,
    wgpu: Option<WgpuContext>,
}

impl App {
    fn refresh_layout(&mut self) {
        let layout = pointer_layout(
            &self.window,
            &self.container,
            self.state.config.controls.wide_layout_min_width_px,
        );
        self.state.set_layout(layout);
    }

    fn container_size(&self) -> (u32, u32) {
        (
            self.container.offset_width().max(1) as u32,
            self.container.offset_height().max(1) as u32,
        )
    }

    /// `width`/`height` are CSS pixels; the surface follows the pixel ratio.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let css_changed = self.state.resize(width, height);
        let surface = surface_size(
            width,
            height,
            pixel_ratio(&self.window, &self.state.config),
            MAX_TEXTURE_DIM,
        );
        if !css_changed && surface == self.surface {
            return;
        }
        self.surface = surface;
        size_canvas(&self.canvas, width, height, surface);
        if let Some(ctx) = self.wgpu.as_mut() {
            resize_wgpu(ctx, surface.0, surface.1);
        }
        tracing::debug!(
            width,
            height,
            surface_width = surface.0,
            surface_height = surface.1,
            "viewport resized"
        );
    }

    fn frame(&mut self, now_ms: f64) -> Result<(), ViewerError> {
        let out = self.state.step(Time::from_millis(now_ms));
        if let Some(tooltip) = &self.tooltip {
            tooltip.apply(&out.hover);
        }
        if let Some(ctx) = self.wgpu.as_mut() {
            let frame = self.state.render_frame();
            render_frame(ctx, self.state.globals(), &frame)?;
        }
        Ok(())
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

/// Store `value` in an empty slot. A filled slot keeps its occupant.
fn install_once<T>(slot: &RefCell<Option<T>>, value: T) -> bool {
    let mut slot = slot.borrow_mut();
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// Run `f` against the mounted app; `None` before `mount`.
fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| app.borrow_mut().as_mut().map(f))
}

fn pixel_ratio(window: &Window, config: &ViewerConfig) -> f64 {
    if config.render.hidpi {
        window.device_pixel_ratio()
    } else {
        1.0
    }
}

/// Backing store in device pixels, laid out at the CSS size.
fn size_canvas(canvas: &HtmlCanvasElement, css_width: u32, css_height: u32, surface: (u32, u32)) {
    canvas.set_width(surface.0);
    canvas.set_height(surface.1);
    let style = canvas.style();
    for (property, px) in [("width", css_width), ("height", css_height)] {
        if let Err(err) = style.set_property(property, &format!("{px}px")) {
            tracing::warn!(?err, property, "canvas style not applied");
        }
    }
}

fn pointer_layout(window: &Window, container: &HtmlElement, wide_min_width: f64) -> PointerLayout {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    PointerLayout {
        window_width: dim(window.inner_width()),
        window_height: dim(window.inner_height()),
        container_top: container.get_bounding_client_rect().top(),
        wide_min_width,
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Build the scene inside the configured container and start the frame loop.
///
/// `config_json` is an optional, possibly partial, [`ViewerConfig`]. Only the
/// first successful call mounts; later calls leave the running globe alone.
#[wasm_bindgen]
pub fn mount(config_json: Option<String>) -> Result<(), JsValue> {
    let config = ViewerConfig::from_json(config_json.as_deref().unwrap_or(""))?;
    logging::init(&config.log_filter)?;

    let window = web_sys::window().ok_or_else(|| ViewerError::MissingElement("window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| ViewerError::MissingElement("document".into()))?;
    let container = document
        .get_element_by_id(&config.elements.container)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| ViewerError::MissingElement(config.elements.container.clone()))?;
    let canvas = container
        .query_selector("canvas")?
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| ViewerError::MissingElement(format!("{} canvas", config.elements.container)))?;

    let width = container.offset_width().max(1) as u32;
    let height = container.offset_height().max(1) as u32;
    let surface = surface_size(width, height, pixel_ratio(&window, &config), MAX_TEXTURE_DIM);

    let tooltip = match Tooltip::from_document(&document, &config.elements) {
        Ok(tooltip) => Some(tooltip),
        Err(err) => {
            tracing::warn!(%err, "tooltip elements missing; hover labels disabled");
            None
        }
    };

    let layout = pointer_layout(
        &window,
        &container,
        config.controls.wide_layout_min_width_px,
    );
    let state = ViewerState::from_dataset(config.clone(), COUNTRIES_JSON, width, height, layout)?;
    let stars = state.star_positions();
    let bar_capacity = state.bar_count();

    let installed = APP.with(|app| {
        install_once(
            app,
            App {
                state,
                window: window.clone(),
                container: container.clone(),
                canvas: canvas.clone(),
                surface,
                tooltip,
                wgpu: None,
            },
        )
    });
    if !installed {
        tracing::warn!("globe already mounted; ignoring mount");
        return Ok(());
    }

    size_canvas(&canvas, width, height, surface);
    with_app(|app| {
        if let Some(tooltip) = &app.tooltip {
            tooltip.set_visible(false);
        }
    });

    wire_events(&window, &container)?;
    start_animation_loop(&window)?;

    tracing::info!(
        width,
        height,
        surface_width = surface.0,
        surface_height = surface.1,
        "globe mounted"
    );

    spawn_local(async move {
        init_gpu(
            canvas,
            stars,
            config.globe.segments,
            bar_capacity,
            config.render.antialias,
            config.texture_url,
        )
        .await;
    });
    Ok(())
}

#[wasm_bindgen]
pub fn on_resize(width: u32, height: u32) {
    with_app(|app| app.resize(width, height));
}

#[wasm_bindgen]
pub fn on_mouse_down(client_x: f64, client_y: f64) {
    with_app(|app| app.state.mouse_down(Vec2::new(client_x, client_y)));
}

/// Returns `true` when the event's default action should be prevented.
#[wasm_bindgen]
pub fn on_mouse_move(client_x: f64, client_y: f64) -> bool {
    with_app(|app| {
        app.refresh_layout();
        if let Some(tooltip) = &app.tooltip {
            tooltip.move_to(client_x, client_y);
        }
        app.state.mouse_move(Vec2::new(client_x, client_y))
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn on_mouse_up() {
    with_app(|app| app.state.mouse_up());
}

#[wasm_bindgen]
pub fn on_touch_start(client_x: f64, client_y: f64) {
    with_app(|app| app.state.touch_start(Vec2::new(client_x, client_y)));
}

/// Returns `true` once the touch drags the globe; the page must not scroll then.
#[wasm_bindgen]
pub fn on_touch_move(client_x: f64, client_y: f64) -> bool {
    with_app(|app| {
        app.refresh_layout();
        let dragging = app.state.touch_move(Vec2::new(client_x, client_y));
        if dragging && let Some(tooltip) = &app.tooltip {
            tooltip.move_to(client_x, client_y);
        }
        dragging
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn on_touch_end() {
    with_app(|app| app.state.touch_end());
}

/// Step and draw one frame at host timestamp `now_ms`.
#[wasm_bindgen]
pub fn advance_frame(now_ms: f64) -> Result<(), JsValue> {
    with_app(|app| app.frame(now_ms))
        .unwrap_or(Ok(()))
        .map_err(JsValue::from)
}

#[wasm_bindgen]
pub fn set_auto_rotate_enabled(enabled: bool) {
    with_app(|app| app.state.controller.set_auto_rotate(enabled));
}

#[wasm_bindgen]
pub fn reset_view() {
    with_app(|app| {
        let change = app.state.reset_view();
        if let Some(tooltip) = &app.tooltip {
            tooltip.apply(&change);
        }
    });
}

fn listen(
    target: &EventTarget,
    kind: &str,
    passive: Option<bool>,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    match passive {
        Some(passive) => {
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            )?;
        }
        None => {
            target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?
        }
    }
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

fn mouse_position(event: &Event) -> Option<(f64, f64)> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some((mouse.client_x() as f64, mouse.client_y() as f64))
}

fn first_touch(event: &Event) -> Option<(f64, f64)> {
    let touch = event.dyn_ref::<TouchEvent>()?.touches().item(0)?;
    Some((touch.client_x() as f64, touch.client_y() as f64))
}

fn wire_events(window: &Window, container: &HtmlElement) -> Result<(), JsValue> {
    listen(container, "mousedown", None, |e| {
        if let Some((x, y)) = mouse_position(&e) {
            on_mouse_down(x, y);
        }
    })?;
    listen(window, "mouseup", None, |_| on_mouse_up())?;
    listen(window, "mousemove", None, |e| {
        if let Some((x, y)) = mouse_position(&e)
            && on_mouse_move(x, y)
        {
            e.prevent_default();
        }
    })?;

    listen(window, "touchstart", Some(true), |e| {
        if let Some((x, y)) = first_touch(&e) {
            on_touch_start(x, y);
        }
    })?;
    // Non-passive so an active drag can cancel page scrolling.
    listen(window, "touchmove", Some(false), |e| {
        if let Some((x, y)) = first_touch(&e)
            && on_touch_move(x, y)
        {
            e.prevent_default();
        }
    })?;
    listen(window, "touchend", None, |_| on_touch_end())?;

    listen(window, "resize", None, |_| {
        if let Some((width, height)) = with_app(|app| app.container_size()) {
            on_resize(width, height);
        }
    })?;
    Ok(())
}

fn start_animation_loop(window: &Window) -> Result<(), JsValue> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();

    *callback.borrow_mut() = Some(Closure::new(move |now_ms: f64| {
        if let Err(err) = advance_frame(now_ms) {
            tracing::warn!(?err, "frame skipped");
        }
        if let Some(window) = web_sys::window()
            && let Some(cb) = next.borrow().as_ref()
            && let Err(err) = window.request_animation_frame(cb.as_ref().unchecked_ref())
        {
            tracing::error!(?err, "requestAnimationFrame failed; animation stopped");
        }
    }));

    if let Some(cb) = callback.borrow().as_ref() {
        window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    }
    Ok(())
}

async fn init_gpu(
    canvas: HtmlCanvasElement,
    stars: Vec<[f32; 3]>,
    sphere_segments: u32,
    bar_capacity: usize,
    antialias: bool,
    texture_url: String,
) {
    match init_wgpu_from_canvas(canvas, &stars, sphere_segments, bar_capacity, antialias).await {
        Ok(ctx) => {
            with_app(|app| app.wgpu = Some(ctx));
        }
        Err(err) => {
            tracing::error!(%err, "gpu init failed; globe stays blank");
            return;
        }
    }

    match fetch_texture(&texture_url).await {
        Ok(tex) => {
            with_app(|app| {
                if let Some(ctx) = app.wgpu.as_mut() {
                    set_globe_texture(ctx, tex.width, tex.height, &tex.rgba);
                }
            });
            tracing::info!(url = %texture_url, width = tex.width, height = tex.height, "globe texture loaded");
        }
        Err(err) => {
            tracing::error!(%err, url = %texture_url, "globe texture unavailable; using fallback color");
        }
    }
}

async fn fetch_texture(url: &str) -> Result<TextureImage, ViewerError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| ViewerError::Texture(e.to_string()))?;
    if !resp.ok() {
        return Err(ViewerError::Texture(format!("{url}: HTTP {}", resp.status())));
    }
    let bytes = resp
        .binary()
        .await
        .map_err(|e| ViewerError::Texture(e.to_string()))?;
    decode_texture(&bytes, MAX_TEXTURE_DIM)
}

#[cfg(test)]
mod tests {
    use super::install_once;
    use std::cell::RefCell;

    #[test]
    fn second_install_keeps_the_first_occupant() {
        let slot = RefCell::new(None);
        assert!(install_once(&slot, 1));
        assert!(!install_once(&slot, 2));
        assert_eq!(*slot.borrow(), Some(1));
    }
}
