//! Alpha-blended pipeline and geometry for the cell highlight indicator.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{model::Vertex, texture::Texture},
    pipelines::basic::mk_render_pipeline,
    render::{Overlay, Render},
};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlainVertex {
    pub position: [f32; 3],
}

impl Vertex for PlainVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlainVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Matches the uniform block in `highlight.wgsl`: two vec4-aligned fields.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HighlightUniform {
    pub colour: [f32; 3],
    pub opacity: f32,
    pub centre: [f32; 3],
    pub _padding: f32,
}

pub fn highlight_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("highlight_bind_group_layout"),
    })
}

/// Both faces stay visible while orbiting, so culling is off. Depth writes
/// are off as well so the quad blends over the grid without occluding
/// anything drawn after it.
pub fn mk_highlight_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Highlight Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, &highlight_bind_group_layout(device)],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Highlight Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("highlight.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        false,
        wgpu::PrimitiveTopology::TriangleList,
        None,
        &[PlainVertex::desc()],
        shader,
    )
}

/// The one-cell indicator quad with its uniform state on the GPU.
#[derive(Debug)]
pub struct Indicator {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    index_count: u32,
}

impl Indicator {
    // Lifted slightly off the ground plane so it never z-fights the grid.
    const QUAD_HEIGHT: f32 = 0.02;

    pub fn new(device: &wgpu::Device, initial: HighlightUniform) -> Self {
        let vertices = [
            PlainVertex {
                position: [-0.5, Self::QUAD_HEIGHT, -0.5],
            },
            PlainVertex {
                position: [-0.5, Self::QUAD_HEIGHT, 0.5],
            },
            PlainVertex {
                position: [0.5, Self::QUAD_HEIGHT, 0.5],
            },
            PlainVertex {
                position: [0.5, Self::QUAD_HEIGHT, -0.5],
            },
        ];
        let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Highlight Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Highlight Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Highlight Uniform Buffer"),
            contents: bytemuck::cast_slice(&[initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &highlight_bind_group_layout(device),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("highlight_bind_group"),
        });

        Self {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            index_count: indices.len() as u32,
        }
    }

    pub fn update(
        &self,
        queue: &wgpu::Queue,
        centre: cgmath::Point3<f32>,
        colour: [f32; 3],
        opacity: f32,
    ) {
        let uniform = HighlightUniform {
            colour,
            opacity,
            centre: centre.into(),
            _padding: 0.0,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn render(&self) -> Render<'_> {
        Render::Overlay(Overlay {
            vertex: &self.vertex_buffer,
            index: &self.index_buffer,
            bind_group: &self.bind_group,
            index_count: self.index_count,
        })
    }
}
