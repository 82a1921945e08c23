//! glTF host adapter
//!
//! Loads a glTF/GLB scene and materializes the rig model: the selected
//! skin's joints become named rest bones, the mesh skinned to that skin
//! becomes the weight-grouped rest mesh, and the selected animation backs a
//! [`PoseSource`] that re-evaluates the joint TRS channels per frame.
//! Channel interpolation is linear or stepped; cubic-spline channels are
//! skipped with a warning.

use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec2, Vec3};
use gltf::animation::util::ReadOutputs;
use hashbrown::HashMap;
use std::path::Path;

use crate::math::checked_inverse;
use crate::rig::{
    Action, Armature, BonePose, GroupWeight, PoseSnapshot, PoseSource, RestBone, Rig, RigTexture,
    SkinnedMesh,
};

/// Default sample rate for animations (frames per second)
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Rest-pose joint data shared by the armature builder and the pose source.
struct JointSet {
    names: Vec<String>,
    /// Parent bone index where the parent node is itself a joint
    parents: Vec<Option<usize>>,
    /// Decomposed rest TRS per joint, parent-relative
    rest_trs: Vec<(Vec3, Quat, Vec3)>,
    /// Recomposed parent-relative rest transforms
    rest_local: Vec<Mat4>,
    /// Joint -> armature-space rest transforms (chained within the joint set)
    rest_armature: Vec<Mat4>,
}

/// Load a rig and its pose source from a glTF/GLB file.
///
/// The skin is selected by name, or the first skin is used; same for the
/// animation, except that a scene without any animation yields a rig with no
/// action rather than an error. `frame_rate` fixes the sampling rate the
/// action's frame range and the pose source agree on.
pub fn load_rig(
    input: &Path,
    skin_name: Option<&str>,
    animation_name: Option<&str>,
    frame_rate: f32,
) -> Result<(Rig, GltfPoseSource)> {
    let (document, buffers, images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    // Find skin by name or use first
    let skin = if let Some(name) = skin_name {
        document
            .skins()
            .find(|s| s.name() == Some(name))
            .with_context(|| format!("Skin '{}' not found in glTF", name))?
    } else {
        document
            .skins()
            .next()
            .context("No skins found in glTF file")?
    };
    let skin_label = skin.name().unwrap_or("unnamed").to_string();

    let joint_set = collect_joints(&document, &skin);
    let matrix_world = armature_world_matrix(&document, &skin);
    let (scale, _, _) = matrix_world.to_scale_rotation_translation();

    let armature = Armature {
        name: skin_label.clone(),
        bones: build_bones(&joint_set),
        scale,
        matrix_world,
    };

    let (mesh, texture) = extract_mesh(&document, &buffers, &images, &skin, &joint_set)?;

    // Find animation by name or use first; a scene without animations
    // degrades to a rig with no action
    let animation = match animation_name {
        Some(name) => Some(
            document
                .animations()
                .find(|a| a.name() == Some(name))
                .with_context(|| {
                    let available: Vec<_> =
                        document.animations().filter_map(|a| a.name()).collect();
                    format!(
                        "Animation '{}' not found in glTF. Available animations: {:?}",
                        name, available
                    )
                })?,
        ),
        None => document.animations().next(),
    };

    let joint_map: HashMap<usize, usize> = skin
        .joints()
        .enumerate()
        .map(|(i, j)| (j.index(), i))
        .collect();

    let (action, channels) = match &animation {
        Some(animation) => {
            let duration = animation_duration(animation, &buffers);
            let action = Action {
                name: animation.name().unwrap_or("unnamed").to_string(),
                frame_start: 0,
                frame_end: (duration * frame_rate).ceil() as i32,
            };
            let channels = collect_channels(animation, &buffers, &joint_map);
            (Some(action), channels)
        }
        None => (None, Vec::new()),
    };

    let rest_local_inv = joint_set
        .rest_local
        .iter()
        .enumerate()
        .map(|(i, local)| {
            checked_inverse(local).with_context(|| {
                format!("Joint '{}' has a singular rest transform", joint_set.names[i])
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let source = GltfPoseSource {
        frame_rate,
        rest_trs: joint_set.rest_trs,
        parents: joint_set.parents,
        rest_local_inv,
        channels,
    };

    tracing::info!(
        "Loaded rig from {:?}: skin '{}' with {} joints, {} vertices{}",
        input,
        skin_label,
        armature.bones.len(),
        mesh.positions.len(),
        action
            .as_ref()
            .map(|a| format!(", action '{}'", a.name))
            .unwrap_or_default()
    );

    Ok((
        Rig {
            armature,
            mesh,
            action,
            texture,
        },
        source,
    ))
}

fn collect_joints(document: &gltf::Document, skin: &gltf::Skin) -> JointSet {
    let joints: Vec<_> = skin.joints().collect();
    let joint_map: HashMap<usize, usize> = joints
        .iter()
        .enumerate()
        .map(|(i, j)| (j.index(), i))
        .collect();

    let names: Vec<String> = joints
        .iter()
        .enumerate()
        .map(|(i, j)| {
            j.name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("bone_{}", i))
        })
        .collect();

    // Parent edges that stay inside the joint set
    let mut parents: Vec<Option<usize>> = vec![None; joints.len()];
    for node in document.nodes() {
        let Some(&parent_bone) = joint_map.get(&node.index()) else {
            continue;
        };
        for child in node.children() {
            if let Some(&child_bone) = joint_map.get(&child.index()) {
                parents[child_bone] = Some(parent_bone);
            }
        }
    }

    let rest_trs: Vec<(Vec3, Quat, Vec3)> = joints
        .iter()
        .map(|joint| {
            let (t, r, s) = joint.transform().decomposed();
            (Vec3::from(t), Quat::from_array(r), Vec3::from(s))
        })
        .collect();
    let rest_local: Vec<Mat4> = rest_trs
        .iter()
        .map(|(t, r, s)| Mat4::from_scale_rotation_translation(*s, *r, *t))
        .collect();
    let rest_armature = compose_armature_space(&rest_local, &parents);

    JointSet {
        names,
        parents,
        rest_trs,
        rest_local,
        rest_armature,
    }
}

/// Chain parent-relative transforms into armature space.
fn compose_armature_space(locals: &[Mat4], parents: &[Option<usize>]) -> Vec<Mat4> {
    let mut chained = Vec::with_capacity(locals.len());
    for i in 0..locals.len() {
        let mut matrix = locals[i];
        let mut parent = parents[i];
        while let Some(p) = parent {
            matrix = locals[p] * matrix;
            parent = parents[p];
        }
        chained.push(matrix);
    }
    chained
}

fn build_bones(joint_set: &JointSet) -> Vec<RestBone> {
    let count = joint_set.names.len();
    let heads: Vec<Vec3> = joint_set
        .rest_armature
        .iter()
        .map(|m| m.w_axis.truncate())
        .collect();

    // First child (lowest bone index) per joint, for tail placement
    let mut first_child: Vec<Option<usize>> = vec![None; count];
    for (child, parent) in joint_set.parents.iter().enumerate() {
        if let Some(p) = *parent {
            if first_child[p].is_none() {
                first_child[p] = Some(child);
            }
        }
    }

    // Leaf tails extend along the bone's rest Y axis by the mean bone length
    let mut length_sum = 0.0f32;
    let mut length_count = 0usize;
    for (child, parent) in joint_set.parents.iter().enumerate() {
        if let Some(p) = *parent {
            length_sum += (heads[child] - heads[p]).length();
            length_count += 1;
        }
    }
    let tail_reach = if length_count == 0 || length_sum <= f32::EPSILON {
        1.0
    } else {
        length_sum / length_count as f32
    };

    (0..count)
        .map(|i| {
            let tail = match first_child[i] {
                Some(child) => heads[child],
                None => {
                    let dir = joint_set.rest_armature[i].y_axis.truncate().normalize_or_zero();
                    let dir = if dir == Vec3::ZERO { Vec3::Y } else { dir };
                    heads[i] + dir * tail_reach
                }
            };
            RestBone {
                name: joint_set.names[i].clone(),
                head: heads[i],
                tail,
                parent: joint_set.parents[i].map(|p| joint_set.names[p].clone()),
                matrix_local: joint_set.rest_armature[i],
            }
        })
        .collect()
}

/// World transform of the joint set's enclosing scope: the product of the
/// local transforms of the skeleton root's non-joint ancestors.
fn armature_world_matrix(document: &gltf::Document, skin: &gltf::Skin) -> Mat4 {
    let nodes: Vec<_> = document.nodes().collect();
    let joint_indices: Vec<usize> = skin.joints().map(|j| j.index()).collect();

    let mut node_parents: HashMap<usize, usize> = HashMap::new();
    for node in &nodes {
        for child in node.children() {
            node_parents.insert(child.index(), node.index());
        }
    }

    // The skeleton root: a joint whose node parent is not itself a joint
    let root = joint_indices.iter().copied().find(|&index| {
        node_parents
            .get(&index)
            .is_none_or(|parent| !joint_indices.contains(parent))
    });
    let Some(root) = root else {
        return Mat4::IDENTITY;
    };

    let mut matrix = Mat4::IDENTITY;
    let mut current = node_parents.get(&root).copied();
    while let Some(index) = current {
        matrix = Mat4::from_cols_array_2d(&nodes[index].transform().matrix()) * matrix;
        current = node_parents.get(&index).copied();
    }
    matrix
}

fn extract_mesh(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
    skin: &gltf::Skin,
    joint_set: &JointSet,
) -> Result<(SkinnedMesh, Option<RigTexture>)> {
    let skin_label = skin.name().unwrap_or("unnamed");
    let gltf_mesh = document
        .nodes()
        .filter(|n| n.skin().map(|s| s.index()) == Some(skin.index()))
        .find_map(|n| n.mesh())
        .with_context(|| format!("No mesh is skinned to skin '{}'", skin_label))?;
    let primitive = gltf_mesh
        .primitives()
        .next()
        .context("No primitives found in mesh")?;
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        bail!(
            "Unsupported primitive mode {:?}, only triangulated meshes export",
            primitive.mode()
        );
    }

    // Extract vertex data
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    // Positions (required)
    let positions: Vec<Vec3> = reader
        .read_positions()
        .context("No positions in mesh")?
        .map(Vec3::from)
        .collect();

    // UVs (optional)
    let uvs: Vec<Vec2> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().map(Vec2::from).collect())
        .unwrap_or_default();

    // Normals (optional)
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from).collect())
        .unwrap_or_default();

    // Skinning data (optional) - JOINTS_0 and WEIGHTS_0
    let joints_attr: Option<Vec<[u16; 4]>> =
        reader.read_joints(0).map(|iter| iter.into_u16().collect());
    let weights_attr: Option<Vec<[f32; 4]>> =
        reader.read_weights(0).map(|iter| iter.into_f32().collect());

    let (group_names, vertex_groups) = match (&joints_attr, &weights_attr) {
        (Some(j), Some(w)) if j.len() == positions.len() && w.len() == positions.len() => {
            let memberships: Vec<Vec<GroupWeight>> = j
                .iter()
                .zip(w.iter())
                .map(|(slots, weights)| {
                    slots
                        .iter()
                        .zip(weights.iter())
                        .filter(|(_, &weight)| weight > 0.0)
                        .map(|(&slot, &weight)| GroupWeight {
                            group: slot as usize,
                            weight,
                        })
                        .collect()
                })
                .collect();
            (joint_set.names.clone(), memberships)
        }
        (None, None) => (Vec::new(), vec![Vec::new(); positions.len()]),
        _ => {
            tracing::warn!(
                "Mesh has partial skinning data (joints or weights missing), ignoring skinning"
            );
            (Vec::new(), vec![Vec::new(); positions.len()])
        }
    };

    // Indices (optional; their absence means sequential triangles)
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    let triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let texture = decode_texture(&primitive, images);

    let mesh = SkinnedMesh {
        name: gltf_mesh.name().unwrap_or("mesh").to_string(),
        positions,
        normals,
        uvs,
        triangles,
        group_names,
        vertex_groups,
    };
    Ok((mesh, texture))
}

/// Decode the primitive material's base color texture, if any.
fn decode_texture(primitive: &gltf::Primitive, images: &[gltf::image::Data]) -> Option<RigTexture> {
    let info = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_texture()?;
    let texture = info.texture();
    let name = texture
        .name()
        .or_else(|| texture.source().name())
        .unwrap_or("texture")
        .to_string();
    let data = images.get(texture.source().index())?;

    let image = match data.format {
        gltf::image::Format::R8G8B8A8 => {
            image::RgbaImage::from_raw(data.width, data.height, data.pixels.clone())
        }
        gltf::image::Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(data.pixels.len() / 3 * 4);
            for rgb in data.pixels.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(255);
            }
            image::RgbaImage::from_raw(data.width, data.height, rgba)
        }
        other => {
            tracing::warn!("Unsupported texture format {:?}, skipping texture", other);
            return None;
        }
    };
    match image {
        Some(image) => Some(RigTexture { name, image }),
        None => {
            tracing::warn!("Texture '{}' has inconsistent pixel data, skipping", name);
            None
        }
    }
}

/// List skins and animations in a glTF file
pub fn inspect(input: &Path) -> Result<()> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let skins: Vec<_> = document.skins().collect();
    if skins.is_empty() {
        tracing::info!("No skins found in {:?}", input);
    } else {
        tracing::info!("Skins in {:?}:", input);
        for (i, skin) in skins.iter().enumerate() {
            let name = skin.name().unwrap_or("unnamed");
            let joint_count = skin.joints().count();
            tracing::info!("  [{}] '{}': {} joints", i, name, joint_count);
        }
    }

    let animations: Vec<_> = document.animations().collect();
    if animations.is_empty() {
        tracing::info!("No animations found in {:?}", input);
        return Ok(());
    }
    tracing::info!("Animations in {:?}:", input);
    for (i, animation) in animations.iter().enumerate() {
        let name = animation.name().unwrap_or("unnamed");
        let channel_count = animation.channels().count();
        let duration = animation_duration(animation, &buffers);
        tracing::info!(
            "  [{}] '{}': {} channels, {:.2}s",
            i,
            name,
            channel_count,
            duration
        );
    }

    Ok(())
}

/// Longest input time over all of the animation's channels.
fn animation_duration(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> f32 {
    let mut max_time = 0.0f32;
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(times) = reader.read_inputs() else {
            continue;
        };
        if let Some(t) = times.last() {
            max_time = max_time.max(t);
        }
    }
    max_time
}

/// Keyframe values for one channel targeting one bone.
struct ChannelData {
    bone: usize,
    /// Hold each key until the next instead of blending (STEP interpolation)
    step: bool,
    times: Vec<f32>,
    values: ChannelValues,
}

enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

fn collect_channels(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    joint_map: &HashMap<usize, usize>,
) -> Vec<ChannelData> {
    let mut channels = Vec::new();
    for channel in animation.channels() {
        // Skip channels that do not target a joint in our skin
        let Some(&bone) = joint_map.get(&channel.target().node().index()) else {
            continue;
        };
        let interpolation = channel.sampler().interpolation();
        if interpolation == gltf::animation::Interpolation::CubicSpline {
            tracing::warn!("Cubic spline interpolation is not supported, skipping channel");
            continue;
        }
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(times) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = times.collect();
        if times.is_empty() {
            continue;
        }
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };
        let values = match outputs {
            ReadOutputs::Translations(iter) => {
                ChannelValues::Translation(iter.map(Vec3::from).collect())
            }
            ReadOutputs::Rotations(rotations) => ChannelValues::Rotation(
                rotations.into_f32().map(Quat::from_array).collect(),
            ),
            ReadOutputs::Scales(iter) => ChannelValues::Scale(iter.map(Vec3::from).collect()),
            ReadOutputs::MorphTargetWeights(_) => continue,
        };
        let value_count = match &values {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
            ChannelValues::Rotation(v) => v.len(),
        };
        if value_count != times.len() {
            tracing::warn!(
                "Channel keyframe mismatch ({} times, {} values), skipping channel",
                times.len(),
                value_count
            );
            continue;
        }
        channels.push(ChannelData {
            bone,
            step: interpolation == gltf::animation::Interpolation::Step,
            times,
            values,
        });
    }
    channels
}

/// Pose source backed by the loaded glTF animation channels.
///
/// Each evaluation starts every joint from its decomposed rest TRS, overlays
/// the channel values at `frame / frame_rate` seconds, and rebuilds the
/// bone-local basis and the armature-space pose matrix. Evaluation is a pure
/// function of the frame number.
pub struct GltfPoseSource {
    frame_rate: f32,
    rest_trs: Vec<(Vec3, Quat, Vec3)>,
    parents: Vec<Option<usize>>,
    rest_local_inv: Vec<Mat4>,
    channels: Vec<ChannelData>,
}

impl PoseSource for GltfPoseSource {
    fn evaluate(&mut self, frame: i32) -> Result<PoseSnapshot> {
        let t = frame as f32 / self.frame_rate;

        let mut trs = self.rest_trs.clone();
        for channel in &self.channels {
            let target = &mut trs[channel.bone];
            match &channel.values {
                ChannelValues::Translation(values) => {
                    target.0 = interpolate_vec3(&channel.times, values, t, channel.step);
                }
                ChannelValues::Rotation(values) => {
                    target.1 = interpolate_quat(&channel.times, values, t, channel.step);
                }
                ChannelValues::Scale(values) => {
                    target.2 = interpolate_vec3(&channel.times, values, t, channel.step);
                }
            }
        }

        let locals: Vec<Mat4> = trs
            .iter()
            .map(|(t, r, s)| Mat4::from_scale_rotation_translation(*s, *r, *t))
            .collect();
        let matrices = compose_armature_space(&locals, &self.parents);

        let bones = locals
            .iter()
            .zip(matrices)
            .enumerate()
            .map(|(i, (local, matrix))| BonePose {
                basis: self.rest_local_inv[i] * *local,
                matrix,
            })
            .collect();
        Ok(PoseSnapshot { bones })
    }
}

/// Active keyframe span index and the clamped blend factor within it.
fn key_span(times: &[f32], t: f32) -> (usize, f32) {
    let mut i = 0;
    while i < times.len() - 1 && times[i + 1] < t {
        i += 1;
    }
    if i >= times.len() - 1 {
        return (times.len() - 1, 0.0);
    }

    let t0 = times[i];
    let t1 = times[i + 1];
    let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    (i, factor.clamp(0.0, 1.0))
}

fn interpolate_vec3(times: &[f32], values: &[Vec3], t: f32, step: bool) -> Vec3 {
    let (i, factor) = key_span(times, t);
    if i + 1 >= values.len() {
        return values[i];
    }
    if step {
        // A stepped key switches exactly at the next key's time
        return if factor >= 1.0 { values[i + 1] } else { values[i] };
    }
    values[i].lerp(values[i + 1], factor)
}

fn interpolate_quat(times: &[f32], values: &[Quat], t: f32, step: bool) -> Quat {
    let (i, factor) = key_span(times, t);
    if i + 1 >= values.len() {
        return values[i];
    }
    if step {
        return if factor >= 1.0 { values[i + 1] } else { values[i] };
    }
    // glam's slerp takes the shortest path
    values[i].slerp(values[i + 1], factor)
}
