use std::f64::consts::TAU;

use foundation::math::Vec3;
use runtime::VisualizationConfig;

use super::material::RouteMaterial;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RouteGeometryParams {
    /// Pairs closer than this (chord length) are rejected.
    pub min_distance: f64,
    /// Extra apex altitude per unit of chord length.
    pub altitude_factor: f64,
    pub tube_radius: f64,
    /// Subdivisions along the arc.
    pub tubular_segments: u32,
    /// Subdivisions around the tube.
    pub radial_segments: u32,
    pub trail_length: f32,
}

impl RouteGeometryParams {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            min_distance: config.min_route_distance(),
            altitude_factor: config.altitude_factor,
            tube_radius: config.tube_radius,
            tubular_segments: config.tube_segments,
            radial_segments: config.radial_segments,
            trail_length: config.trail_length,
        }
    }
}

/// Quadratic Bézier through `start`, a raised `control` and `end`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcCurve {
    pub start: Vec3,
    pub control: Vec3,
    pub end: Vec3,
}

impl ArcCurve {
    /// Lifts the chord midpoint along its own direction to
    /// `|mid| + distance * altitude_factor`.
    pub fn raised(start: Vec3, end: Vec3, altitude_factor: f64) -> Self {
        let mid = (start + end) * 0.5;
        let distance = start.distance(end);
        // Antipodal endpoints put the midpoint at the centre; lift sideways instead.
        let up = mid
            .try_normalize()
            .unwrap_or_else(|| (end - start).any_orthogonal());
        let control = up * (mid.length() + distance * altitude_factor);
        Self {
            start,
            control,
            end,
        }
    }

    pub fn point_at(&self, t: f64) -> Vec3 {
        let s = 1.0 - t;
        self.start * (s * s) + self.control * (2.0 * s * t) + self.end * (t * t)
    }

    pub fn tangent_at(&self, t: f64) -> Vec3 {
        (self.control - self.start) * (2.0 * (1.0 - t)) + (self.end - self.control) * (2.0 * t)
    }
}

/// Indexed triangle mesh of a tube swept along an [`ArcCurve`].
///
/// Vertices are laid out ring by ring: `(tubular_segments + 1)` rings of
/// `(radial_segments + 1)` vertices, the last vertex of each ring duplicating
/// the first so the seam gets its own UV. `uv[0]` is the length parameter
/// along the arc in `[0, 1]`, which the trail shader keys on.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub tubular_segments: u32,
    pub radial_segments: u32,
}

impl TubeGeometry {
    pub fn extrude(curve: &ArcCurve, tubular_segments: u32, radial_segments: u32, radius: f64) -> Self {
        let tubular = tubular_segments.max(1);
        let radial = radial_segments.max(3);
        let ring = (radial + 1) as usize;
        let rings = (tubular + 1) as usize;

        let mut positions = Vec::with_capacity(rings * ring);
        let mut normals = Vec::with_capacity(rings * ring);
        let mut uvs = Vec::with_capacity(rings * ring);

        let chord = (curve.end - curve.start)
            .try_normalize()
            .unwrap_or(Vec3::Z);

        // Parallel-transport frames: carry the previous normal onto each new
        // tangent's plane so the tube does not twist.
        let mut normal: Option<Vec3> = None;
        for i in 0..rings {
            let t = i as f64 / tubular as f64;
            let center = curve.point_at(t);
            let tangent = curve.tangent_at(t).try_normalize().unwrap_or(chord);
            let n = match normal {
                None => tangent.any_orthogonal(),
                Some(prev) => (prev - tangent * prev.dot(tangent))
                    .try_normalize()
                    .unwrap_or_else(|| tangent.any_orthogonal()),
            };
            let b = tangent.cross(n);
            normal = Some(n);

            for j in 0..ring {
                let v = j as f64 / radial as f64;
                let angle = v * TAU;
                let dir = n * angle.cos() + b * angle.sin();
                positions.push((center + dir * radius).to_f32_array());
                normals.push(dir.to_f32_array());
                uvs.push([t as f32, v as f32]);
            }
        }

        let mut indices = Vec::with_capacity(tubular as usize * radial as usize * 6);
        let ring = ring as u32;
        for i in 1..=tubular {
            for j in 1..=radial {
                let a = ring * (i - 1) + (j - 1);
                let b = ring * i + (j - 1);
                let c = ring * i + j;
                let d = ring * (i - 1) + j;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            positions,
            normals,
            uvs,
            indices,
            tubular_segments: tubular,
            radial_segments: radial,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub curve: ArcCurve,
    pub tube: TubeGeometry,
}

/// Geometry plus the material uniforms a new route starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteBuild {
    pub geometry: RouteGeometry,
    pub material: RouteMaterial,
}

/// Builds the arc and tube between two land points.
///
/// Returns `None` for pairs closer than `params.min_distance` (including
/// identical points) or with non-finite coordinates.
pub fn build_route(
    start: Vec3,
    end: Vec3,
    params: &RouteGeometryParams,
    color: [f32; 3],
) -> Option<RouteBuild> {
    let distance = start.distance(end);
    if !distance.is_finite() || distance <= f64::EPSILON || distance < params.min_distance {
        return None;
    }

    let curve = ArcCurve::raised(start, end, params.altitude_factor);
    let tube = TubeGeometry::extrude(
        &curve,
        params.tubular_segments,
        params.radial_segments,
        params.tube_radius,
    );
    Some(RouteBuild {
        geometry: RouteGeometry { curve, tube },
        material: RouteMaterial::new(color, params.trail_length),
    })
}
