use foundation::handles::Handle;
use foundation::math::Vec3;
use foundation::Arena;
use rand::Rng;
use runtime::VisualizationConfig;
use tracing::{debug, trace};

use super::geometry::{RouteGeometry, RouteGeometryParams, build_route};
use super::material::RouteMaterial;

/// Read-only set of candidate route endpoints.
pub trait EndpointSource {
    fn endpoint_count(&self) -> usize;
    fn endpoint(&self, index: usize) -> Vec3;
}

impl EndpointSource for [Vec3] {
    fn endpoint_count(&self) -> usize {
        self.len()
    }

    fn endpoint(&self, index: usize) -> Vec3 {
        self[index]
    }
}

impl EndpointSource for Vec<Vec3> {
    fn endpoint_count(&self) -> usize {
        self.len()
    }

    fn endpoint(&self, index: usize) -> Vec3 {
        self[index]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub u64);

/// One active route. Owned by the [`RouteManager`] from spawn to retirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: RouteId,
    pub geometry: Handle,
    pub material: Handle,
    pub progress: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleParams {
    pub max_concurrent_routes: usize,
    /// A spawn is attempted when the per-tick draw in `[0, 1)` exceeds this.
    pub spawn_threshold: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub retirement_threshold: f64,
    pub colors: Vec<[f32; 3]>,
    pub geometry: RouteGeometryParams,
}

impl LifecycleParams {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            max_concurrent_routes: config.max_concurrent_routes,
            spawn_threshold: config.spawn_threshold,
            speed_min: config.speed_min,
            speed_max: config.speed_max,
            retirement_threshold: config.retirement_threshold,
            colors: config.colors.clone(),
            geometry: RouteGeometryParams::from_config(config),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpawnRejection {
    AtCapacity,
    /// Endpoints identical or closer than the minimum route distance.
    DegeneratePair,
}

/// What happened to the route set during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub spawned: Option<RouteId>,
    pub rejected: bool,
    pub retired: Vec<RouteId>,
}

/// Sole owner and writer of the active route set and its GPU-side resources.
#[derive(Debug)]
pub struct RouteManager {
    params: LifecycleParams,
    routes: Vec<Route>,
    geometries: Arena<RouteGeometry>,
    materials: Arena<RouteMaterial>,
    next_id: u64,
}

impl RouteManager {
    pub fn new(params: LifecycleParams) -> Self {
        Self {
            params,
            routes: Vec::new(),
            geometries: Arena::new(),
            materials: Arena::new(),
            next_id: 0,
        }
    }

    pub fn params(&self) -> &LifecycleParams {
        &self.params
    }

    pub fn active(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn geometry(&self, handle: Handle) -> Option<&RouteGeometry> {
        self.geometries.get(handle)
    }

    pub fn material(&self, handle: Handle) -> Option<&RouteMaterial> {
        self.materials.get(handle)
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Live `(geometry, material)` resources; both are zero once every route is gone.
    pub fn live_resources(&self) -> (usize, usize) {
        (self.geometries.live(), self.materials.live())
    }

    /// Runs one frame: maybe spawn, advance every route, retire finished ones.
    ///
    /// With fewer than two endpoints (land not loaded yet) the spawn step is
    /// a no-op.
    pub fn tick<E, R>(&mut self, endpoints: &E, rng: &mut R) -> TickReport
    where
        E: EndpointSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = TickReport::default();

        match self.try_spawn(endpoints, rng) {
            Some(Ok(id)) => report.spawned = Some(id),
            Some(Err(_)) => report.rejected = true,
            None => {}
        }

        self.advance();
        report.retired = self.retire_finished();
        report
    }

    fn try_spawn<E, R>(&mut self, endpoints: &E, rng: &mut R) -> Option<Result<RouteId, SpawnRejection>>
    where
        E: EndpointSource + ?Sized,
        R: Rng + ?Sized,
    {
        let count = endpoints.endpoint_count();
        if count < 2 || self.routes.len() >= self.params.max_concurrent_routes {
            return None;
        }
        if rng.gen_range(0.0..1.0) <= self.params.spawn_threshold {
            return None;
        }

        let a = rng.gen_range(0..count);
        let mut b = rng.gen_range(0..count - 1);
        if b >= a {
            b += 1;
        }
        let speed = if self.params.speed_min < self.params.speed_max {
            rng.gen_range(self.params.speed_min..self.params.speed_max)
        } else {
            self.params.speed_min
        };
        let color = if self.params.colors.is_empty() {
            [1.0, 1.0, 1.0]
        } else {
            self.params.colors[rng.gen_range(0..self.params.colors.len())]
        };

        Some(self.spawn(endpoints.endpoint(a), endpoints.endpoint(b), speed, color))
    }

    /// Spawns a route between two explicit points.
    pub fn spawn(
        &mut self,
        start: Vec3,
        end: Vec3,
        speed: f64,
        color: [f32; 3],
    ) -> Result<RouteId, SpawnRejection> {
        if self.routes.len() >= self.params.max_concurrent_routes {
            return Err(SpawnRejection::AtCapacity);
        }
        let Some(build) = build_route(start, end, &self.params.geometry, color) else {
            trace!("route pair too close, skipping spawn");
            return Err(SpawnRejection::DegeneratePair);
        };

        let id = RouteId(self.next_id);
        self.next_id += 1;
        let route = Route {
            id,
            geometry: self.geometries.alloc(build.geometry),
            material: self.materials.alloc(build.material),
            progress: 0.0,
            speed,
        };
        debug!(route = id.0, speed, active = self.routes.len() + 1, "route spawned");
        self.routes.push(route);
        Ok(id)
    }

    fn advance(&mut self) {
        for route in &mut self.routes {
            route.progress += route.speed;
            if let Some(material) = self.materials.get_mut(route.material) {
                material.set_progress(route.progress as f32);
            }
        }
    }

    fn retire_finished(&mut self) -> Vec<RouteId> {
        let threshold = self.params.retirement_threshold;
        let (retire, keep): (Vec<Route>, Vec<Route>) = std::mem::take(&mut self.routes)
            .into_iter()
            .partition(|r| r.progress >= threshold);
        self.routes = keep;

        retire
            .into_iter()
            .map(|route| {
                self.release(&route);
                debug!(route = route.id.0, progress = route.progress, "route retired");
                route.id
            })
            .collect()
    }

    fn release(&mut self, route: &Route) {
        self.geometries.release(route.geometry);
        self.materials.release(route.material);
    }

    /// Drops every route and frees its resources, returning the retired ids.
    pub fn release_all(&mut self) -> Vec<RouteId> {
        let routes = std::mem::take(&mut self.routes);
        for route in &routes {
            self.release(route);
        }
        routes.into_iter().map(|r| r.id).collect()
    }
}
