//! Render batching.
//!
//! Flows describe what to draw with a [`Render`] value; the event loop sorts
//! the pieces into per-pipeline batches and draws them in a fixed order:
//! opaque instanced models first, then helper lines, then alpha-blended
//! overlays such as the highlight indicator.

use crate::data_structures::model::Model;

/// An instanced model draw: geometry plus a buffer of per-instance
/// transforms.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// A line-list draw (grid and axes helpers).
pub struct Lines<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub vertex_count: u32,
}

/// An alpha-blended overlay quad with its own uniform bind group.
pub struct Overlay<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub bind_group: &'a wgpu::BindGroup,
    pub index_count: u32,
}

/// What a flow wants drawn this frame.
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Lines(Lines<'a>),
    Overlay(Overlay<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn sort(
        self,
        basics: &mut Vec<Instanced<'a>>,
        lines: &mut Vec<Lines<'a>>,
        overlays: &mut Vec<Overlay<'a>>,
    ) {
        match self {
            Render::None => (),
            Render::Default(instanced) => basics.push(instanced),
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Lines(l) => lines.push(l),
            Render::Overlay(o) => overlays.push(o),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.sort(basics, lines, overlays)),
        }
    }
}
