//! Render pipelines shared by all flows.

pub mod basic;
pub mod highlight;
pub mod light;
pub mod lines;

/// The pipelines built once at startup and reused every frame.
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub lines: wgpu::RenderPipeline,
    pub highlight: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            basic: basic::mk_basic_pipeline(
                device,
                config,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            lines: lines::mk_lines_pipeline(device, config, camera_bind_group_layout),
            highlight: highlight::mk_highlight_pipeline(device, config, camera_bind_group_layout),
        }
    }
}
