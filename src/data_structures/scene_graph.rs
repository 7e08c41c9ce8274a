//! Hierarchical glTF scene representation.
//!
//! Each node carries its rest pose, a local transform that animation
//! overwrites, and the world transform composed from its parent. Nodes with
//! a mesh own a single-instance buffer; placing a model clones the whole
//! graph so every placed copy animates independently while sharing the mesh
//! and material GPU resources.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{self, Model},
    },
    render::Instanced,
    resources::animation::{AnimationTrack, Mixer},
};

pub struct SceneNode {
    pub name: String,
    pub model: Option<Model>,
    instance_buffer: Option<wgpu::Buffer>,
    /// Transform from the glTF file, used as fallback for untracked
    /// components while a clip plays.
    rest: Instance,
    local: Instance,
    world: Instance,
    tracks: Vec<AnimationTrack>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A node without geometry, used to group children under one transform.
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            model: None,
            instance_buffer: None,
            rest: Instance::default(),
            local: Instance::default(),
            world: Instance::default(),
            tracks: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Clone the graph for an independently animated copy.
    ///
    /// Mesh and material resources are reference counted by wgpu and shared
    /// between clones; only the per-instance buffer is freshly allocated so
    /// each copy can hold its own pose.
    pub fn deep_clone(&self, device: &wgpu::Device) -> Self {
        let instance_buffer = self.model.as_ref().map(|_| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Instance Buffer", self.name)),
                contents: bytemuck::cast_slice(&[self.world.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
        });
        Self {
            name: self.name.clone(),
            model: self.model.clone(),
            instance_buffer,
            rest: self.rest.clone(),
            local: self.local.clone(),
            world: self.world.clone(),
            tracks: self.tracks.clone(),
            children: self
                .children
                .iter()
                .map(|child| child.deep_clone(device))
                .collect(),
        }
    }

    /// Overwrite local transforms from the mixer's current clip position.
    /// Nodes without a track for the clip keep their rest pose.
    pub fn animate(&mut self, mixer: &Mixer) {
        if let Some(track) = self.tracks.iter().find(|t| t.name == mixer.clip()) {
            self.local = track.sample(mixer.elapsed(), &self.rest);
        }
        for child in &mut self.children {
            child.animate(mixer);
        }
    }

    /// Recompute world transforms top-down from `parent`.
    pub fn update_world(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in &mut self.children {
            child.update_world(&self.world);
        }
    }

    /// Upload the current world transforms to the instance buffers.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(buffer) = &self.instance_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[self.world.to_raw()]));
        }
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    /// Collect one instanced draw per mesh-bearing node.
    pub fn collect_renders<'a>(&'a self, out: &mut Vec<Instanced<'a>>) {
        if let (Some(model), Some(buffer)) = (&self.model, &self.instance_buffer) {
            out.push(Instanced {
                instance: buffer,
                model,
                amount: 1,
            });
        }
        for child in &self.children {
            child.collect_renders(out);
        }
    }
}

/// Convert one glTF node (and its subtree) into a [`SceneNode`].
///
/// `tracks` maps a glTF node index to the animation tracks targeting it,
/// one per clip.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    device: &wgpu::Device,
    materials: &[model::Material],
    tracks: &HashMap<usize, Vec<AnimationTrack>>,
) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let model = node.mesh().map(|mesh| {
        let meshes = mesh
            .primitives()
            .map(|primitive| {
                let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

                let mut vertices = Vec::new();
                if let Some(positions) = reader.read_positions() {
                    positions.for_each(|position| {
                        vertices.push(model::ModelVertex {
                            position,
                            tex_coords: Default::default(),
                            normal: Default::default(),
                            tangent: Default::default(),
                            bitangent: Default::default(),
                        })
                    });
                }
                if let Some(normals) = reader.read_normals() {
                    for (vertex, normal) in vertices.iter_mut().zip(normals) {
                        vertex.normal = normal;
                    }
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                        vertex.tex_coords = tex_coord;
                    }
                }
                if let Some(tangents) = reader.read_tangents() {
                    for (vertex, tangent) in vertices.iter_mut().zip(tangents) {
                        // The w component gives the bitangent's direction.
                        let tangent: cgmath::Vector4<f32> = tangent.into();
                        vertex.tangent = tangent.truncate().into();
                        let normal: cgmath::Vector3<f32> = vertex.normal.into();
                        vertex.bitangent = (normal.cross(tangent.truncate()) * tangent[3]).into();
                    }
                }

                let indices = reader
                    .read_indices()
                    .map(|raw| raw.into_u32().collect::<Vec<u32>>())
                    .unwrap_or_default();

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                model::Mesh {
                    name: mesh.name().unwrap_or("unnamed_mesh").to_string(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: indices.len() as u32,
                    material: primitive.material().index().unwrap_or(0),
                }
            })
            .collect();

        Model {
            meshes,
            materials: materials.to_vec(),
        }
    });

    let (position, rotation, scale) = node.transform().decomposed();
    let rest = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };

    let instance_buffer = model.as_ref().map(|_| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", name)),
            contents: bytemuck::cast_slice(&[rest.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })
    });

    let children = node
        .children()
        .map(|child| to_scene_node(child, buf, device, materials, tracks))
        .collect();

    SceneNode {
        name,
        model,
        instance_buffer,
        local: rest.clone(),
        world: rest.clone(),
        rest,
        tracks: tracks.get(&node.index()).cloned().unwrap_or_default(),
        children,
    }
}
