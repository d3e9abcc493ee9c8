use foundation::handles::Handle;
use layers::LandPoints;
use runtime::{Frame, VisualizationConfig};
use scene::routes::{RouteId, RouteManager};

use crate::buffers::RouteUniforms;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointStyle {
    pub size: f32,
    pub color: [f32; 3],
}

impl PointStyle {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            size: config.point_size,
            color: config.point_color,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RenderCommand {
    /// The static land cloud; its buffer only changes when the field is regenerated.
    PointCloud { count: u32, style: PointStyle },
    /// One route tube; `geometry` resolves through the route manager.
    Tube {
        route: RouteId,
        geometry: Handle,
        uniforms: RouteUniforms,
    },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame_index: u64,
    pub commands: Vec<RenderCommand>,
}

impl RenderFrame {
    pub fn tubes(&self) -> impl Iterator<Item = (RouteId, Handle, RouteUniforms)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            RenderCommand::Tube {
                route,
                geometry,
                uniforms,
            } => Some((route, geometry, uniforms)),
            RenderCommand::PointCloud { .. } => None,
        })
    }
}

pub struct Renderer;

impl Renderer {
    /// Draw list for one visible frame: the point cloud first, then one tube
    /// per active route in spawn order.
    pub fn collect(
        frame: Frame,
        land: &LandPoints,
        style: PointStyle,
        routes: &RouteManager,
    ) -> RenderFrame {
        let mut out = RenderFrame {
            frame_index: frame.index,
            commands: Vec::with_capacity(routes.len() + 1),
        };
        if !land.is_empty() {
            out.commands.push(RenderCommand::PointCloud {
                count: land.len() as u32,
                style,
            });
        }
        for route in routes.active() {
            let Some(material) = routes.material(route.material) else {
                continue;
            };
            out.commands.push(RenderCommand::Tube {
                route: route.id,
                geometry: route.geometry,
                uniforms: RouteUniforms::from(material),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{PointStyle, RenderCommand, Renderer};
    use foundation::math::Vec3;
    use layers::{LandMask, LandPoints, RasterError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use runtime::{DeviceClass, Frame, VisualizationConfig};
    use scene::PointField;
    use scene::routes::{LifecycleParams, RouteManager};

    fn config() -> VisualizationConfig {
        VisualizationConfig::for_device(DeviceClass::Full)
    }

    #[test]
    fn empty_scene_has_no_commands() {
        let routes = RouteManager::new(LifecycleParams::from_config(&config()));
        let frame = Renderer::collect(
            Frame::first(0.016),
            &LandPoints::default(),
            PointStyle::from_config(&config()),
            &routes,
        );
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn collects_point_cloud_then_tubes() {
        let cfg = config();
        let land = LandMask::from_config(&cfg)
            .classify(&PointField::fibonacci(50), Err(&RasterError::Timeout(1)));
        let mut routes = RouteManager::new(LifecycleParams::from_config(&cfg));
        let a = routes.spawn(Vec3::X, Vec3::Z, 0.25, [1.0, 0.0, 0.0]).unwrap();
        let b = routes.spawn(Vec3::Y, -Vec3::Y, 0.5, [0.0, 1.0, 0.0]).unwrap();
        let empty: &[Vec3] = &[];
        routes.tick(empty, &mut StdRng::seed_from_u64(0));

        let frame = Renderer::collect(
            Frame::first(0.016),
            &land,
            PointStyle::from_config(&cfg),
            &routes,
        );
        assert!(matches!(
            frame.commands[0],
            RenderCommand::PointCloud { count: 50, .. }
        ));
        let tubes: Vec<_> = frame.tubes().collect();
        assert_eq!(tubes.len(), 2);
        assert_eq!(tubes[0].0, a);
        assert_eq!(tubes[0].2.progress, 0.25);
        assert_eq!(tubes[1].0, b);
        assert_eq!(tubes[1].2.color, [0.0, 1.0, 0.0]);
        assert!(routes.geometry(tubes[1].1).is_some());
    }
}
