//! Loading of models and their resources from external files.

use std::collections::HashMap;

use crate::{
    data_structures::{
        model,
        scene_graph::{SceneNode, to_scene_node},
        texture::Texture,
    },
    resources::{
        animation::{AnimationTrack, Channel},
        texture::{diffuse_normal_layout, load_binary, load_texture},
    },
};

pub mod animation;
pub mod texture;

/// A loaded glTF asset: its scene graph plus the names of the animation
/// clips it ships with, in file order.
pub struct LoadedModel {
    pub root: SceneNode,
    pub clips: Vec<String>,
}

fn image_bytes<'a>(
    view: &gltf::buffer::View,
    buffer_data: &'a [Vec<u8>],
) -> anyhow::Result<&'a [u8]> {
    slice_buffer(
        buffer_data,
        view.buffer().index(),
        view.offset(),
        view.length(),
    )
    .ok_or_else(|| {
        anyhow::anyhow!(
            "buffer view out of bounds (buffer {}, offset {}, length {})",
            view.buffer().index(),
            view.offset(),
            view.length()
        )
    })
}

/// Bounds-checked slice into the loaded buffer data. `None` when the file
/// declares more bytes than were actually loaded, e.g. a truncated `.bin`.
fn slice_buffer(
    buffers: &[Vec<u8>],
    index: usize,
    offset: usize,
    length: usize,
) -> Option<&[u8]> {
    buffers.get(index)?.get(offset..offset.checked_add(length)?)
}

pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedModel> {
    let data = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&data)?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                // A missing blob must still occupy its buffer slot, or every
                // later buffer index would point at the wrong data.
                let blob = gltf.blob.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("{file_name} declares a binary chunk but carries none")
                })?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // One track per (clip, node) pair, stored per node for the scene graph.
    let mut clips = Vec::new();
    let mut tracks: HashMap<usize, Vec<AnimationTrack>> = HashMap::new();
    for (clip_idx, animation) in gltf.animations().enumerate() {
        let clip_name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("clip_{clip_idx}"));
        clips.push(clip_name.clone());

        for channel in animation.channels() {
            let reader = channel.reader(|buffer| {
                buffer_data.get(buffer.index()).map(Vec::as_slice)
            });
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                _ => {
                    log::warn!(
                        "{file_name}: animation channel {} has no sampler input, skipping",
                        channel.index()
                    );
                    continue;
                }
            };

            let node_tracks = tracks.entry(channel.target().node().index()).or_default();
            let track = match node_tracks.iter_mut().find(|t| t.name == clip_name) {
                Some(track) => track,
                None => {
                    node_tracks.push(AnimationTrack::new(&clip_name));
                    node_tracks.last_mut().unwrap()
                }
            };

            match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    track.translation = Some(Channel {
                        timestamps,
                        values: translations.map(Into::into).collect(),
                    });
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    track.rotation = Some(Channel {
                        timestamps,
                        values: rotations.into_f32().map(Into::into).collect(),
                    });
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    track.scale = Some(Channel {
                        timestamps,
                        values: scales.map(Into::into).collect(),
                    });
                }
                _ => {
                    log::warn!(
                        "{file_name}: unsupported animation output in channel {}",
                        channel.index()
                    );
                }
            }
        }
    }

    let layout = diffuse_normal_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => match info.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Texture::from_bytes(
                    device,
                    queue,
                    image_bytes(&view, &buffer_data)?,
                    file_name,
                    mime_type.split('/').next_back(),
                    false,
                )?,
                gltf::image::Source::Uri { uri, mime_type } => {
                    let format = mime_type.and_then(|mt| mt.split('/').next_back());
                    load_texture(uri, false, device, queue, format).await?
                }
            },
            // Untextured material: bake the base colour factor into a
            // single-pixel texture.
            None => {
                let factor = pbr.base_color_factor();
                let pixel = factor.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                Texture::from_pixel(device, queue, pixel, "base color", false)
            }
        };
        let normal_texture = match material.normal_texture() {
            Some(normal) => match normal.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Texture::from_bytes(
                    device,
                    queue,
                    image_bytes(&view, &buffer_data)?,
                    file_name,
                    mime_type.split('/').next_back(),
                    true,
                )?,
                gltf::image::Source::Uri { uri, mime_type } => {
                    let format = mime_type.and_then(|mt| mt.split('/').next_back());
                    load_texture(uri, true, device, queue, format).await?
                }
            },
            None => Texture::create_default_normal_map(device, queue),
        };
        materials.push(model::Material::new(
            device,
            material.name().unwrap_or(file_name),
            diffuse_texture,
            normal_texture,
            &layout,
        ));
    }
    // Meshes index into the material list, so it must not be empty.
    if materials.is_empty() {
        materials.push(model::Material::new(
            device,
            "default",
            Texture::from_pixel(device, queue, [204, 204, 204, 255], "default diffuse", false),
            Texture::create_default_normal_map(device, queue),
            &layout,
        ));
    }

    let scene = gltf
        .scenes()
        .next()
        .ok_or_else(|| anyhow::anyhow!("{file_name} contains no scene"))?;
    let mut roots: Vec<SceneNode> = scene
        .nodes()
        .map(|node| to_scene_node(node, &buffer_data, device, &materials, &tracks))
        .collect();

    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        let mut root = SceneNode::group(file_name);
        root.children = roots;
        root
    };

    Ok(LoadedModel { root, clips })
}

#[cfg(test)]
mod tests {
    use super::slice_buffer;

    #[test]
    fn slices_within_the_loaded_bytes() {
        let buffers = vec![vec![0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]];
        assert_eq!(slice_buffer(&buffers, 0, 2, 3), Some(&[2u8, 3, 4][..]));
        assert_eq!(slice_buffer(&buffers, 0, 0, 10), Some(&buffers[0][..]));
    }

    #[test]
    fn truncated_buffer_reads_are_refused_not_panics() {
        // A file may declare a larger byte length than its sidecar .bin
        // actually holds; the view then reaches past the loaded bytes.
        let buffers = vec![vec![0u8; 10]];
        assert_eq!(slice_buffer(&buffers, 0, 0, 1000), None);
        assert_eq!(slice_buffer(&buffers, 0, 8, 3), None);
    }

    #[test]
    fn missing_buffer_index_is_refused() {
        let buffers = vec![vec![0u8; 10]];
        assert_eq!(slice_buffer(&buffers, 1, 0, 1), None);
        assert_eq!(slice_buffer(&[], 0, 0, 0), None);
    }

    #[test]
    fn offset_plus_length_overflow_is_refused() {
        let buffers = vec![vec![0u8; 10]];
        assert_eq!(slice_buffer(&buffers, 0, usize::MAX, 2), None);
    }
}
