use layers::LandPoints;
use scene::routes::{RouteMaterial, TubeGeometry};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// `x`: length parameter along the arc, `y`: angle around the tube.
    pub uv: [f32; 2],
}

/// Per-draw uniform block for one route tube. Matches `RouteUniforms` in
/// [`crate::shaders::ROUTE_SHADER`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RouteUniforms {
    pub color: [f32; 3],
    pub progress: f32,
    pub trail_length: f32,
    pub _pad: [f32; 3],
}

impl From<&RouteMaterial> for RouteUniforms {
    fn from(material: &RouteMaterial) -> Self {
        Self {
            color: material.color,
            progress: material.progress(),
            trail_length: material.trail_length,
            _pad: [0.0; 3],
        }
    }
}

/// Interleaves a tube mesh into the vertex layout the route pipeline expects.
pub fn tube_vertices(tube: &TubeGeometry) -> Vec<TubeVertex> {
    tube.positions
        .iter()
        .zip(&tube.normals)
        .zip(&tube.uvs)
        .map(|((position, normal), uv)| TubeVertex {
            position: *position,
            normal: *normal,
            uv: *uv,
        })
        .collect()
}

pub fn tube_index_bytes(tube: &TubeGeometry) -> &[u8] {
    bytemuck::cast_slice(&tube.indices)
}

/// Land positions as raw bytes for a `float32x3` vertex buffer.
pub fn point_cloud_bytes(land: &LandPoints) -> &[u8] {
    bytemuck::cast_slice(land.as_slice())
}

#[cfg(test)]
mod tests {
    use super::{RouteUniforms, TubeVertex, point_cloud_bytes, tube_index_bytes, tube_vertices};
    use foundation::math::Vec3;
    use layers::{LandMask, RasterError};
    use runtime::{DeviceClass, VisualizationConfig};
    use scene::PointField;
    use scene::routes::{RouteGeometryParams, RouteMaterial, build_route};

    #[test]
    fn layouts_have_gpu_friendly_sizes() {
        assert_eq!(std::mem::size_of::<TubeVertex>(), 32);
        assert_eq!(std::mem::size_of::<RouteUniforms>(), 32);
    }

    #[test]
    fn tube_vertices_interleave_every_attribute() {
        let config = VisualizationConfig::for_device(DeviceClass::Constrained);
        let params = RouteGeometryParams::from_config(&config);
        let build = build_route(Vec3::X, Vec3::Z, &params, [1.0; 3]).unwrap();
        let tube = &build.geometry.tube;

        let vertices = tube_vertices(tube);
        assert_eq!(vertices.len(), tube.vertex_count());
        assert_eq!(vertices[5].position, tube.positions[5]);
        assert_eq!(vertices[5].normal, tube.normals[5]);
        assert_eq!(vertices[5].uv, tube.uvs[5]);
        assert_eq!(tube_index_bytes(tube).len(), tube.indices.len() * 4);
    }

    #[test]
    fn uniforms_mirror_material() {
        let mut material = RouteMaterial::new([0.1, 0.2, 0.3], 0.45);
        material.set_progress(0.7);
        let u = RouteUniforms::from(&material);
        assert_eq!(u.color, [0.1, 0.2, 0.3]);
        assert_eq!(u.progress, 0.7);
        assert_eq!(u.trail_length, 0.45);
    }

    #[test]
    fn point_cloud_bytes_cover_every_point() {
        let config = VisualizationConfig::for_device(DeviceClass::Constrained);
        let land = LandMask::from_config(&config)
            .classify(&PointField::fibonacci(10), Err(&RasterError::Timeout(1)));
        assert_eq!(point_cloud_bytes(&land).len(), 10 * 3 * 4);
    }
}
