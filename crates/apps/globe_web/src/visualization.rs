//! Globe visualization controller.
//!
//! Owns every piece of per-mount state and advances it from the host's
//! per-frame callback:
//! - the land point cloud, generated once per raster load
//! - the active route set and its GPU-side resources
//! - the visibility gate that fully suspends ticking while off screen
//!
//! There is exactly one writer for all of it: whoever holds the controller.

use gpu::{PointStyle, RenderFrame, Renderer};
use layers::{LandMask, LandPoints, RasterError, RasterImage};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use runtime::metrics::{
    FRAMES_SUSPENDED, FRAMES_TICKED, ROUTES_ACTIVE, ROUTES_REJECTED, ROUTES_RETIRED, ROUTES_SPAWNED,
};
use runtime::{
    EventBus, EventKind, Frame, FrameScheduler, Metrics, VisibilityTransition, VisualizationConfig,
};
use scene::PointField;
use scene::routes::{LifecycleParams, RouteGeometry, RouteId, RouteManager};
use tracing::info;

/// Everything generated or animated for one mount.
#[derive(Debug)]
pub struct VisualizationState {
    pub config: VisualizationConfig,
    /// `None` until the raster load resolves (successfully or not).
    pub point_field: Option<PointField>,
    pub land: LandPoints,
    pub routes: RouteManager,
    /// Last raster outcome, kept so a config change can regenerate the field.
    raster: Option<Result<RasterImage, RasterError>>,
}

impl VisualizationState {
    fn new(config: VisualizationConfig) -> Self {
        Self {
            routes: RouteManager::new(LifecycleParams::from_config(&config)),
            config,
            point_field: None,
            land: LandPoints::default(),
            raster: None,
        }
    }
}

pub struct GlobeVisualization<R = StdRng> {
    state: VisualizationState,
    scheduler: FrameScheduler,
    events: EventBus,
    metrics: Metrics,
    rng: R,
    mounted: bool,
}

impl GlobeVisualization<StdRng> {
    pub fn mount(config: VisualizationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GlobeVisualization<R> {
    pub fn with_rng(config: VisualizationConfig, rng: R) -> Self {
        let scheduler = FrameScheduler::new(config.device, config.visibility_threshold);
        info!(device = ?config.device, points = config.point_count, "visualization mounted");
        Self {
            state: VisualizationState::new(config),
            scheduler,
            events: EventBus::new(),
            metrics: Metrics::new(),
            rng,
            mounted: true,
        }
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.state.config
    }

    pub fn land(&self) -> &LandPoints {
        &self.state.land
    }

    pub fn routes(&self) -> &RouteManager {
        &self.state.routes
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Takes the retained lifecycle events. The log is bounded at
    /// [`runtime::DEFAULT_EVENT_CAPACITY`] and evicts its oldest entries, so
    /// callers that need every event drain it each frame.
    pub fn drain_events(&mut self) -> Vec<runtime::Event> {
        self.events.drain()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_visible(&self) -> bool {
        self.scheduler.is_visible()
    }

    /// Point field has been generated and classified.
    pub fn is_ready(&self) -> bool {
        self.state.point_field.is_some()
    }

    pub fn route_geometry(&self, id: RouteId) -> Option<&RouteGeometry> {
        let route = self.state.routes.route(id)?;
        self.state.routes.geometry(route.geometry)
    }

    /// Completes the one asynchronous step: generate the point field and keep
    /// its land subset. A failed load keeps every point.
    pub fn on_raster_loaded(&mut self, raster: Result<RasterImage, RasterError>) {
        if !self.mounted {
            return;
        }
        self.state.raster = Some(raster);
        self.regenerate_points();
    }

    fn regenerate_points(&mut self) {
        let Some(raster) = &self.state.raster else {
            return;
        };
        let field = PointField::fibonacci(self.state.config.point_count);
        let land = LandMask::from_config(&self.state.config).classify(&field, raster.as_ref());

        let frame = self.scheduler.current_frame();
        if land.is_unfiltered() {
            self.events.emit(frame, EventKind::RasterFallback, 0);
        }
        self.events
            .emit(frame, EventKind::PointFieldReady, land.len() as u64);

        self.state.point_field = Some(field);
        self.state.land = land;
    }

    /// Feeds the viewport intersection ratio of the visualization's box.
    pub fn observe_intersection(&mut self, ratio: f64) -> Option<VisibilityTransition> {
        let transition = self.scheduler.observe_intersection(ratio);
        self.record_transition(transition);
        transition
    }

    pub fn set_visible(&mut self, visible: bool) -> Option<VisibilityTransition> {
        let transition = self.scheduler.set_visible(visible);
        self.record_transition(transition);
        transition
    }

    fn record_transition(&mut self, transition: Option<VisibilityTransition>) {
        let kind = match transition {
            Some(VisibilityTransition::BecameHidden) => EventKind::Suspended,
            Some(VisibilityTransition::BecameVisible) => EventKind::Resumed,
            None => return,
        };
        self.events.emit(self.scheduler.current_frame(), kind, 0);
    }

    /// One host frame. Returns the frame that ran, or `None` when suspended
    /// or unmounted; in that case the host must skip its draw call too.
    pub fn tick(&mut self, dt_s: f64) -> Option<Frame> {
        if !self.mounted {
            return None;
        }
        let Some(frame) = self.scheduler.begin_frame(dt_s) else {
            self.metrics.inc_counter(FRAMES_SUSPENDED, 1);
            return None;
        };

        let report = self.state.routes.tick(&self.state.land, &mut self.rng);

        if let Some(id) = report.spawned {
            self.events.emit(frame, EventKind::RouteSpawned, id.0);
            self.metrics.inc_counter(ROUTES_SPAWNED, 1);
        }
        if report.rejected {
            self.events.emit(frame, EventKind::RouteRejected, 0);
            self.metrics.inc_counter(ROUTES_REJECTED, 1);
        }
        for id in &report.retired {
            self.events.emit(frame, EventKind::RouteRetired, id.0);
        }
        self.metrics
            .inc_counter(ROUTES_RETIRED, report.retired.len() as u64);
        self.metrics.inc_counter(FRAMES_TICKED, 1);
        self.metrics
            .set_gauge(ROUTES_ACTIVE, self.state.routes.len() as i64);

        Some(frame)
    }

    /// Draw list for the current frame, or `None` when nothing may be drawn.
    pub fn render_frame(&self) -> Option<RenderFrame> {
        if !self.mounted || !self.scheduler.is_visible() {
            return None;
        }
        let frame = self.scheduler.last_frame()?;
        Some(Renderer::collect(
            frame,
            &self.state.land,
            PointStyle::from_config(&self.state.config),
            &self.state.routes,
        ))
    }

    /// Swaps the config: drops every route and regenerates the point field
    /// from the last raster outcome. Visibility carries over; a hidden globe
    /// stays suspended until the next intersection change.
    pub fn reconfigure(&mut self, config: VisualizationConfig) {
        self.retire_all();
        let was_visible = self.scheduler.is_visible();
        self.scheduler = FrameScheduler::new(config.device, config.visibility_threshold);
        self.scheduler.set_visible(was_visible);
        self.state.routes = RouteManager::new(LifecycleParams::from_config(&config));
        self.state.config = config;
        self.state.point_field = None;
        self.state.land = LandPoints::default();
        self.regenerate_points();
    }

    /// Releases every route resource and the point buffers. Later ticks are
    /// no-ops. Returns how many routes were released.
    pub fn unmount(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        let released = self.retire_all();
        self.state.point_field = None;
        self.state.land = LandPoints::default();
        self.state.raster = None;
        self.mounted = false;
        self.events
            .emit(self.scheduler.current_frame(), EventKind::Unmounted, released as u64);
        info!(released, "visualization unmounted");
        released
    }

    fn retire_all(&mut self) -> usize {
        let frame = self.scheduler.current_frame();
        let ids = self.state.routes.release_all();
        for id in &ids {
            self.events.emit(frame, EventKind::RouteRetired, id.0);
        }
        self.metrics.inc_counter(ROUTES_RETIRED, ids.len() as u64);
        self.metrics.set_gauge(ROUTES_ACTIVE, 0);
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::GlobeVisualization;
    use approx::assert_abs_diff_eq;
    use layers::{RasterError, RasterImage};
    use runtime::metrics::{FRAMES_SUSPENDED, ROUTES_SPAWNED};
    use runtime::{DeviceClass, EventKind, VisualizationConfig};

    fn eager_config() -> VisualizationConfig {
        let mut config = VisualizationConfig::for_device(DeviceClass::Constrained);
        config.point_count = 800;
        config.spawn_threshold = 0.0;
        config
    }

    fn mounted_with_fallback() -> GlobeVisualization {
        let mut vis = GlobeVisualization::mount(eager_config(), 42);
        vis.on_raster_loaded(Err(RasterError::Fetch("offline".into())));
        vis
    }

    fn progresses(vis: &GlobeVisualization) -> Vec<f64> {
        vis.routes().active().iter().map(|r| r.progress).collect()
    }

    #[test]
    fn ticking_before_raster_is_a_noop() {
        let mut vis = GlobeVisualization::mount(eager_config(), 1);
        for _ in 0..100 {
            assert!(vis.tick(0.016).is_some());
        }
        assert!(!vis.is_ready());
        assert!(vis.routes().is_empty());
        assert_eq!(vis.metrics().counter(ROUTES_SPAWNED), 0);
    }

    #[test]
    fn failed_raster_keeps_full_point_cloud() {
        let vis = mounted_with_fallback();
        assert!(vis.is_ready());
        assert_eq!(vis.land().len(), 800);
        assert!(vis.land().is_unfiltered());
        assert_eq!(vis.events().count(EventKind::RasterFallback), 1);
    }

    #[test]
    fn loaded_raster_filters_points() {
        let mut vis = GlobeVisualization::mount(eager_config(), 2);
        let ocean = RasterImage::from_luma(8, 4, vec![255; 32]).unwrap();
        vis.on_raster_loaded(Ok(ocean));
        assert!(vis.is_ready());
        assert!(vis.land().is_empty());
        assert_eq!(vis.events().count(EventKind::RasterFallback), 0);

        // No land, no routes, no errors.
        for _ in 0..50 {
            vis.tick(0.016);
        }
        assert!(vis.routes().is_empty());
    }

    #[test]
    fn routes_spawn_up_to_the_cap() {
        let mut vis = mounted_with_fallback();
        let cap = vis.config().max_concurrent_routes;
        for _ in 0..200 {
            vis.tick(0.016);
            assert!(vis.routes().len() <= cap);
        }
        assert_eq!(vis.routes().len(), cap);
    }

    #[test]
    fn hidden_visualization_does_not_advance() {
        let mut vis = mounted_with_fallback();
        for _ in 0..20 {
            vis.tick(0.016);
        }
        let before = progresses(&vis);
        assert!(!before.is_empty());

        vis.observe_intersection(0.0);
        for _ in 0..500 {
            assert!(vis.tick(0.016).is_none());
            assert!(vis.render_frame().is_none());
        }
        assert_eq!(progresses(&vis), before);
        assert_eq!(vis.metrics().counter(FRAMES_SUSPENDED), 500);

        vis.observe_intersection(1.0);
        vis.tick(0.016);
        let after = progresses(&vis);
        for (a, b) in before.iter().zip(&after) {
            assert!(b > a);
        }
    }

    #[test]
    fn resuming_keeps_point_buffers() {
        let mut vis = mounted_with_fallback();
        let land = vis.land().clone();
        vis.observe_intersection(0.0);
        vis.tick(0.016);
        vis.observe_intersection(0.5);
        vis.tick(0.016);
        assert_eq!(vis.land(), &land);
        assert_eq!(vis.events().count(EventKind::PointFieldReady), 1);
        assert_eq!(vis.events().count(EventKind::Suspended), 1);
        assert_eq!(vis.events().count(EventKind::Resumed), 1);
    }

    #[test]
    fn render_frame_lists_every_active_route() {
        let mut vis = mounted_with_fallback();
        assert!(vis.render_frame().is_none(), "nothing ran yet");
        for _ in 0..10 {
            vis.tick(0.016);
        }
        let frame = vis.render_frame().unwrap();
        assert_eq!(frame.frame_index, 9);
        assert_eq!(frame.tubes().count(), vis.routes().len());
        for (id, _, uniforms) in frame.tubes() {
            let route = vis.routes().route(id).unwrap();
            assert_abs_diff_eq!(uniforms.progress, route.progress as f32);
            assert!(vis.route_geometry(id).is_some());
        }
    }

    #[test]
    fn spawn_and_retire_events_pair_up() {
        let mut config = eager_config();
        config.speed_min = 0.05;
        config.speed_max = 0.1;
        let mut vis = GlobeVisualization::mount(config, 7);
        vis.on_raster_loaded(Err(RasterError::Timeout(10)));
        for _ in 0..400 {
            vis.tick(0.016);
        }
        let spawned = vis.events().count(EventKind::RouteSpawned);
        let retired = vis.events().count(EventKind::RouteRetired);
        assert!(retired > 0);
        assert_eq!(spawned, retired + vis.routes().len());
    }

    #[test]
    fn unmount_releases_everything() {
        let mut vis = mounted_with_fallback();
        for _ in 0..50 {
            vis.tick(0.016);
        }
        let active = vis.routes().len();
        assert!(active > 0);
        assert_eq!(vis.unmount(), active);
        assert_eq!(vis.routes().live_resources(), (0, 0));
        assert!(vis.land().is_empty());
        assert!(vis.tick(0.016).is_none());
        assert!(vis.render_frame().is_none());
        assert_eq!(vis.unmount(), 0);

        // A raster arriving after unmount is ignored.
        vis.on_raster_loaded(Err(RasterError::Timeout(10)));
        assert!(!vis.is_ready());
    }

    #[test]
    fn reconfigure_while_hidden_stays_suspended() {
        let mut vis = mounted_with_fallback();
        vis.observe_intersection(0.0);
        vis.reconfigure(eager_config());
        assert!(!vis.is_visible());

        let ran = (0..100).filter(|_| vis.tick(0.016).is_some()).count();
        assert_eq!(ran, 0);
        assert!(vis.routes().is_empty());
        assert!(vis.render_frame().is_none());

        vis.observe_intersection(1.0);
        assert!(vis.tick(0.016).is_some());
    }

    #[test]
    fn reconfigure_regenerates_from_last_raster() {
        let mut vis = mounted_with_fallback();
        for _ in 0..30 {
            vis.tick(0.016);
        }
        let mut smaller = eager_config();
        smaller.point_count = 300;
        vis.reconfigure(smaller);
        assert!(vis.routes().is_empty());
        assert_eq!(vis.routes().live_resources(), (0, 0));
        assert_eq!(vis.land().len(), 300);
        assert_eq!(vis.events().count(EventKind::PointFieldReady), 2);
    }
}
