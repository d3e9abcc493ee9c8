//! `wasm-bindgen` surface for the host page.
//!
//! The page owns the canvas and the animation loop; it calls [`tick`] once
//! per animation frame and pulls buffers for whatever changed.

use std::cell::{Cell, RefCell};

use futures_util::future::{Either, select};
use gloo_net::http::Request;
use gpu::{RouteUniforms, TubeVertex};
use layers::{RasterError, RasterImage};
use runtime::{DeviceClass, VisualizationConfig};
use scene::routes::RouteId;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use crate::{GlobeVisualization, RouteChanges};

struct Host {
    vis: GlobeVisualization,
    observer: IntersectionObserver,
    // Must outlive the observer.
    _on_intersect: Closure<dyn FnMut(js_sys::Array)>,
    changes: RouteChanges,
    generation: u64,
}

thread_local! {
    static STATE: RefCell<Option<Host>> = const { RefCell::new(None) };
    static GENERATION: Cell<u64> = const { Cell::new(0) };
}

fn with_host<T>(f: impl FnOnce(&mut Host) -> T) -> Option<T> {
    STATE.with(|state| state.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // Already set on a hot reload.
    let _ = tracing_wasm::try_set_as_global_default();
    Ok(())
}

/// Mounts the visualization on `element_id`. `config_json` holds optional
/// overrides on top of the device defaults; invalid overrides are logged and
/// ignored.
#[wasm_bindgen]
pub fn mount(element_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let element = document
        .get_element_by_id(element_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{element_id}")))?;

    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let device = DeviceClass::classify(width);
    let config = match config_json {
        Some(json) => VisualizationConfig::from_json_overrides(device, &json).unwrap_or_else(|err| {
            warn!(%err, "ignoring invalid config overrides");
            VisualizationConfig::for_device(device)
        }),
        None => VisualizationConfig::for_device(device),
    };

    unmount();

    let generation = GENERATION.with(|g| {
        let next = g.get() + 1;
        g.set(next);
        next
    });

    let on_intersect = Closure::<dyn FnMut(js_sys::Array)>::new(|entries: js_sys::Array| {
        for entry in entries.iter() {
            let entry: IntersectionObserverEntry = entry.unchecked_into();
            let ratio = if entry.is_intersecting() {
                entry.intersection_ratio()
            } else {
                0.0
            };
            with_host(|host| host.vis.observe_intersection(ratio));
        }
    });
    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(config.visibility_threshold));
    let observer = IntersectionObserver::new_with_options(on_intersect.as_ref().unchecked_ref(), &init)?;
    observer.observe(&element);

    let raster_url = config.raster_url.clone();
    let timeout_ms = config.raster_timeout_ms;
    let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
    let host = Host {
        vis: GlobeVisualization::mount(config, seed),
        observer,
        _on_intersect: on_intersect,
        changes: RouteChanges::new(),
        generation,
    };
    STATE.with(|state| *state.borrow_mut() = Some(host));

    match raster_url {
        Some(url) => spawn_local(async move {
            let raster = load_raster(&url, timeout_ms).await;
            deliver_raster(generation, raster);
        }),
        None => deliver_raster(
            generation,
            Err(RasterError::Fetch("no raster url configured".to_string())),
        ),
    }
    Ok(())
}

fn deliver_raster(generation: u64, raster: Result<RasterImage, RasterError>) {
    with_host(|host| {
        // A remount while the fetch was in flight makes this result stale.
        if host.generation == generation {
            host.vis.on_raster_loaded(raster);
        }
    });
}

async fn fetch_raster(url: &str) -> Result<RasterImage, RasterError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| RasterError::Fetch(e.to_string()))?;
    if !resp.ok() {
        return Err(RasterError::Fetch(format!("HTTP {}", resp.status())));
    }
    let bytes = resp
        .binary()
        .await
        .map_err(|e| RasterError::Fetch(e.to_string()))?;
    RasterImage::decode(&bytes)
}

fn sleep(ms: u32) -> JsFuture {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    JsFuture::from(promise)
}

async fn load_raster(url: &str, timeout_ms: u32) -> Result<RasterImage, RasterError> {
    let fetch = Box::pin(fetch_raster(url));
    match select(fetch, sleep(timeout_ms)).await {
        Either::Left((raster, _)) => raster,
        Either::Right(_) => Err(RasterError::Timeout(timeout_ms)),
    }
}

/// Advances one animation frame. Returns `false` when the frame was skipped
/// (hidden, unmounted, or never mounted) and nothing should be drawn.
#[wasm_bindgen]
pub fn tick(dt_s: f64) -> bool {
    with_host(|host| {
        let ran = host.vis.tick(dt_s).is_some();
        for event in host.vis.drain_events() {
            host.changes.record(&event);
        }
        ran
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn set_visible(visible: bool) {
    with_host(|host| host.vis.set_visible(visible));
}

/// Tears the visualization down. Returns the number of routes released.
#[wasm_bindgen]
pub fn unmount() -> u32 {
    let Some(mut host) = STATE.with(|state| state.borrow_mut().take()) else {
        return 0;
    };
    host.observer.disconnect();
    host.vis.unmount() as u32
}

#[wasm_bindgen]
pub fn is_ready() -> bool {
    with_host(|host| host.vis.is_ready()).unwrap_or(false)
}

/// Land point positions as `[x, y, z, ...]`.
#[wasm_bindgen]
pub fn land_positions() -> Vec<f32> {
    with_host(|host| host.vis.land().as_slice().to_vec()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn point_size() -> f32 {
    with_host(|host| host.vis.config().point_size).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn point_color() -> Vec<f32> {
    with_host(|host| host.vis.config().point_color.to_vec()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn points_shader() -> String {
    gpu::shaders::POINTS_SHADER.to_string()
}

#[wasm_bindgen]
pub fn route_shader() -> String {
    gpu::shaders::ROUTE_SHADER.to_string()
}

fn route_ids(ids: Vec<RouteId>) -> Vec<f64> {
    ids.into_iter().map(|id| id.0 as f64).collect()
}

/// Ids of routes spawned since the last call. Routes that already retired
/// are left out.
#[wasm_bindgen]
pub fn take_spawned_routes() -> Vec<f64> {
    with_host(|host| route_ids(host.changes.take_spawned())).unwrap_or_default()
}

/// Ids of routes retired since the last call; their buffers can be dropped.
/// Call every frame alongside [`take_spawned_routes`].
#[wasm_bindgen]
pub fn take_retired_routes() -> Vec<f64> {
    with_host(|host| route_ids(host.changes.take_retired())).unwrap_or_default()
}

/// Interleaved tube vertices (`position`, `normal`, `uv`; 8 floats each).
#[wasm_bindgen]
pub fn route_vertices(id: f64) -> Option<Vec<f32>> {
    with_host(|host| {
        let geometry = host.vis.route_geometry(RouteId(id as u64))?;
        let vertices = gpu::tube_vertices(&geometry.tube);
        Some(bytemuck::cast_slice::<TubeVertex, f32>(&vertices).to_vec())
    })
    .flatten()
}

#[wasm_bindgen]
pub fn route_indices(id: f64) -> Option<Vec<u32>> {
    with_host(|host| {
        let geometry = host.vis.route_geometry(RouteId(id as u64))?;
        Some(geometry.tube.indices.clone())
    })
    .flatten()
}

/// Route ids in draw order for the current frame.
#[wasm_bindgen]
pub fn active_route_ids() -> Vec<f64> {
    with_host(|host| {
        host.vis
            .render_frame()
            .map(|frame| frame.tubes().map(|(id, _, _)| id.0 as f64).collect())
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

/// Per-route uniform blocks (8 floats each) in [`active_route_ids`] order.
#[wasm_bindgen]
pub fn route_uniforms() -> Vec<f32> {
    with_host(|host| {
        let Some(frame) = host.vis.render_frame() else {
            return Vec::new();
        };
        let uniforms: Vec<RouteUniforms> = frame.tubes().map(|(_, _, u)| u).collect();
        bytemuck::cast_slice::<RouteUniforms, f32>(&uniforms).to_vec()
    })
    .unwrap_or_default()
}
