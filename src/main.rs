//! Interactive grid-placement demo.
//!
//! Hovering the grid highlights the cell under the pointer, white when free
//! and red when taken; left-clicking a free cell places an animated copy of
//! the configured model there. Right-drag orbits the camera, the scroll
//! wheel zooms.

use cgmath::{EuclideanSpace, One, Point3, Quaternion, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};

use paddock::{
    context::{Context, InitContext},
    data_structures::{instance::Instance, scene_graph::SceneNode},
    flow::{FlowConstructor, GraphicsFlow},
    highlight::pulse_opacity,
    pipelines::{
        highlight::{HighlightUniform, Indicator},
        lines,
    },
    placement::{Stage, StageConfig},
    render::Render,
    resources::{LoadedModel, animation::Mixer, load_model_gltf},
};

/// One placed copy of the template: its own scene graph clone, the grid
/// transform it sits under and its looping clip.
struct PlacedInstance {
    base: Instance,
    root: SceneNode,
    mixer: Option<Mixer>,
}

struct GridFlow {
    config: StageConfig,
    template: Option<LoadedModel>,
    /// Resolved clip name; `None` leaves placed instances static.
    clip: Option<String>,
    placed: Vec<PlacedInstance>,
    indicator: Indicator,
    grid_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    axes_buffer: wgpu::Buffer,
    axes_vertex_count: u32,
}

impl GridFlow {
    async fn new(init: InitContext, config: StageConfig) -> Self {
        let grid = lines::grid_vertices(config.grid_half_extent);
        let grid_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Vertex Buffer"),
                contents: bytemuck::cast_slice(&grid),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let axes = lines::axes_vertices(5.0);
        let axes_buffer = init
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Axes Vertex Buffer"),
                contents: bytemuck::cast_slice(&axes),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let indicator = Indicator::new(
            &init.device,
            HighlightUniform {
                colour: paddock::highlight::FREE_COLOUR,
                opacity: 1.0,
                centre: [0.5, 0.0, 0.5],
                _padding: 0.0,
            },
        );

        // A missing model leaves the grid fully usable for hovering; only
        // placement becomes a no-op.
        let template = match load_model_gltf(&config.model_path, &init.device, &init.queue).await {
            Ok(model) => Some(model),
            Err(e) => {
                log::error!("could not load {}: {}", config.model_path, e);
                None
            }
        };
        let clip = template.as_ref().and_then(|model| {
            let clip = config.clip.resolve(&model.clips);
            if clip.is_none() {
                log::warn!(
                    "{} has no clip matching {:?}; placed instances will not animate",
                    config.model_path,
                    config.clip
                );
            }
            clip.map(str::to_string)
        });

        Self {
            config,
            template,
            clip,
            placed: Vec::new(),
            indicator,
            grid_buffer,
            grid_vertex_count: grid.len() as u32,
            axes_buffer,
            axes_vertex_count: axes.len() as u32,
        }
    }

    /// Where the pointer currently hits the ground plane, if anywhere.
    fn project(&self, ctx: &Context) -> Option<Point3<f32>> {
        ctx.camera
            .camera
            .mouse_ray(
                ctx.mouse.coords,
                ctx.config.width as f32,
                ctx.config.height as f32,
                &ctx.projection,
            )
            .and_then(|ray| ray.intersect_ground(self.config.grid_half_extent))
    }

    fn place(&mut self, ctx: &Context, stage: &mut Stage) {
        let Some(template) = &self.template else {
            return;
        };
        let Some(placement) = stage.planner.request(self.project(ctx)) else {
            return;
        };
        log::info!("placed instance {} at {:?}", placement.id, placement.cell);

        let mut root = template.root.deep_clone(&ctx.device);
        let scale = self.config.model_scale;
        let base = Instance {
            position: placement.centre.to_vec(),
            rotation: Quaternion::one(),
            scale: Vector3::new(scale, scale, scale),
        };
        root.update_world(&base);
        root.write_to_buffers(&ctx.queue);

        self.placed.push(PlacedInstance {
            base,
            root,
            mixer: self.clip.as_deref().map(Mixer::play),
        });
        // The new occupant sits right under the pointer.
        stage.highlight.refresh(stage.planner.occupancy());
    }
}

impl GraphicsFlow<Stage> for GridFlow {
    fn on_init(&mut self, _ctx: &mut Context, _stage: &mut Stage) {}

    fn on_window_events(&mut self, ctx: &Context, stage: &mut Stage, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { .. } => {
                stage
                    .highlight
                    .pointer_moved(self.project(ctx), stage.planner.occupancy());
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.place(ctx, stage);
            }
            _ => {}
        }
    }

    fn on_device_events(&mut self, _ctx: &Context, _stage: &mut Stage, _event: &DeviceEvent) {}

    fn on_update(&mut self, ctx: &Context, stage: &mut Stage, dt: Duration) {
        for placed in &mut self.placed {
            if let Some(mixer) = &mut placed.mixer {
                mixer.update(dt);
                placed.root.animate(mixer);
                placed.root.update_world(&placed.base);
                placed.root.write_to_buffers(&ctx.queue);
            }
        }

        self.indicator.update(
            &ctx.queue,
            stage.highlight.centre(),
            stage.highlight.colour(),
            pulse_opacity(stage.elapsed_millis()),
        );
    }

    fn on_render(&self) -> Render<'_> {
        let mut basics = Vec::new();
        for placed in &self.placed {
            placed.root.collect_renders(&mut basics);
        }
        Render::Composed(vec![
            Render::Defaults(basics),
            Render::Lines(paddock::render::Lines {
                vertex: &self.grid_buffer,
                vertex_count: self.grid_vertex_count,
            }),
            Render::Lines(paddock::render::Lines {
                vertex: &self.axes_buffer,
                vertex_count: self.axes_vertex_count,
            }),
            self.indicator.render(),
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let config = StageConfig::default();
    let constructor: FlowConstructor<Stage> = Box::new(move |init| {
        Box::pin(async move {
            Box::new(GridFlow::new(init, config).await) as Box<dyn GraphicsFlow<Stage>>
        })
    });
    paddock::flow::run(vec![constructor])
}
