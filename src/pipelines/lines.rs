//! Line list pipeline and the grid/axes helper geometry.

use crate::{
    data_structures::{model::Vertex, texture::Texture},
    pipelines::basic::mk_render_pipeline,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

pub fn mk_lines_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Lines Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Lines Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("lines.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        true,
        wgpu::PrimitiveTopology::LineList,
        None,
        &[LineVertex::desc()],
        shader,
    )
}

const GRID_COLOR: [f32; 3] = [0.53, 0.53, 0.53];
const GRID_CENTER_COLOR: [f32; 3] = [0.27, 0.27, 0.27];

/// Ground grid on the y=0 plane with one-unit spacing, the two lines through
/// the origin darker than the rest.
pub fn grid_vertices(half_extent: f32) -> Vec<LineVertex> {
    let steps = half_extent as i32;
    let mut vertices = Vec::new();
    for i in -steps..=steps {
        let offset = i as f32;
        let color = if i == 0 { GRID_CENTER_COLOR } else { GRID_COLOR };
        vertices.push(LineVertex {
            position: [offset, 0.0, -half_extent],
            color,
        });
        vertices.push(LineVertex {
            position: [offset, 0.0, half_extent],
            color,
        });
        vertices.push(LineVertex {
            position: [-half_extent, 0.0, offset],
            color,
        });
        vertices.push(LineVertex {
            position: [half_extent, 0.0, offset],
            color,
        });
    }
    vertices
}

/// Coordinate axes from the origin: x red, y green, z blue.
pub fn axes_vertices(length: f32) -> Vec<LineVertex> {
    let origin = [0.0, 0.0, 0.0];
    vec![
        LineVertex {
            position: origin,
            color: [1.0, 0.0, 0.0],
        },
        LineVertex {
            position: [length, 0.0, 0.0],
            color: [1.0, 0.0, 0.0],
        },
        LineVertex {
            position: origin,
            color: [0.0, 1.0, 0.0],
        },
        LineVertex {
            position: [0.0, length, 0.0],
            color: [0.0, 1.0, 0.0],
        },
        LineVertex {
            position: origin,
            color: [0.0, 0.0, 1.0],
        },
        LineVertex {
            position: [0.0, 0.0, length],
            color: [0.0, 0.0, 1.0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_vertices_per_line() {
        // 21 lines per direction for a 20x20 grid.
        let vertices = grid_vertices(10.0);
        assert_eq!(vertices.len(), 21 * 2 * 2);
    }

    #[test]
    fn grid_lines_span_the_full_extent() {
        let vertices = grid_vertices(10.0);
        assert!(vertices
            .iter()
            .all(|v| v.position[0].abs() <= 10.0 && v.position[2].abs() <= 10.0));
        assert!(vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn axes_are_three_lines() {
        let vertices = axes_vertices(5.0);
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[1].position, [5.0, 0.0, 0.0]);
        assert_eq!(vertices[3].position, [0.0, 5.0, 0.0]);
        assert_eq!(vertices[5].position, [0.0, 0.0, 5.0]);
    }
}
