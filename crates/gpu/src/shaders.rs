//! WGSL sources for the two primitives the visualization emits. The rendering
//! surface owns pipelines and camera; it binds `Globals` itself.

/// Land point cloud, drawn as screen-facing quads (6 vertices per point,
/// instanced over the position buffer).
pub const POINTS_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    point_size: f32,
    _pad: f32,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) local: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vid: u32, @location(0) center: vec3<f32>) -> VsOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vid % 6u];
    let clip = globals.view_proj * vec4<f32>(center, 1.0);
    // Size is in world units at unit distance; perspective divide shrinks it.
    let offset = corner * globals.point_size * vec2<f32>(globals.viewport.y / globals.viewport.x, 1.0);
    return VsOut(clip + vec4<f32>(offset, 0.0, 0.0), corner);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    if (dot(in.local, in.local) > 1.0) {
        discard;
    }
    return globals.color;
}
"#;

/// Route tube with a travelling trail. The fragment logic is the GPU twin of
/// `scene::routes::trail_alpha`.
pub const ROUTE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
};

struct RouteUniforms {
    color: vec3<f32>,
    progress: f32,
    trail_length: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> route: RouteUniforms;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) along: f32,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), uv.x);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let tail = route.progress - route.trail_length;
    if (route.trail_length <= 0.0 || in.along > route.progress || in.along < tail) {
        discard;
    }
    let alpha = smoothstep(tail, route.progress, in.along);
    return vec4<f32>(route.color, alpha);
}
"#;

#[cfg(test)]
mod tests {
    use super::{POINTS_SHADER, ROUTE_SHADER};

    #[test]
    fn shaders_expose_entry_points() {
        for src in [POINTS_SHADER, ROUTE_SHADER] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }

    #[test]
    fn route_uniform_block_matches_rust_layout() {
        // Field order must line up with `RouteUniforms` in buffers.rs.
        let color = ROUTE_SHADER.find("color: vec3<f32>").unwrap();
        let progress = ROUTE_SHADER.find("progress: f32").unwrap();
        let trail = ROUTE_SHADER.find("trail_length: f32").unwrap();
        assert!(color < progress && progress < trail);
    }
}
