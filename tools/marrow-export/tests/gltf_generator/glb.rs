//! Packs the test scene into glTF JSON plus a binary buffer and assembles
//! the final GLB container.

use gltf_json as json;
use json::validation::Checked::Valid;

use super::scene::{ARMATURE_TRANSLATION, JOINT_NAMES, SceneData, SEGMENT_HEIGHT};

const ARMATURE_NODE: u32 = 0;
const ROOT_NODE: u32 = 1;
const SPINE_NODE: u32 = 2;
const HEAD_NODE: u32 = 3;
const MESH_NODE: u32 = 4;

/// Accessor and view indices produced while packing the buffer.
struct PackedIds {
    positions: u32,
    normals: u32,
    uvs: u32,
    joints: u32,
    weights: u32,
    indices: u32,
    inverse_bind_matrices: u32,
    png_view: u32,
    // (times, root translation, spine rotation)
    animation: Option<(u32, u32, u32)>,
}

pub(crate) fn build_glb(scene: &SceneData, with_animation: bool) -> Vec<u8> {
    let mut buffer = BufferBuilder::new();
    let ids = pack_scene(&mut buffer, scene, with_animation);
    let root = build_root(buffer.views, buffer.accessors, buffer.data.len(), &ids);
    assemble_glb(&root, &buffer.data)
}

/// Accumulates one binary buffer along with its views and accessors.
struct BufferBuilder {
    data: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    fn push_view(&mut self, bytes: &[u8], target: Option<json::buffer::Target>) -> u32 {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });
        self.views.len() as u32 - 1
    }

    fn push_accessor(
        &mut self,
        bytes: &[u8],
        count: usize,
        component_type: json::accessor::ComponentType,
        type_: json::accessor::Type,
        bounds: Option<(&[f32], &[f32])>,
        target: Option<json::buffer::Target>,
    ) -> u32 {
        let view = self.push_view(bytes, target);
        let to_values = |values: &[f32]| {
            json::Value::Array(values.iter().map(|&v| json::Value::from(v)).collect())
        };
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(view)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min: bounds.map(|(min, _)| to_values(min)),
            max: bounds.map(|(_, max)| to_values(max)),
            name: None,
            normalized: false,
            sparse: None,
        });
        self.accessors.len() as u32 - 1
    }
}

fn f32_bytes<'a>(values: impl IntoIterator<Item = &'a f32>) -> Vec<u8> {
    values.into_iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn pack_scene(buffer: &mut BufferBuilder, scene: &SceneData, with_animation: bool) -> PackedIds {
    use json::accessor::{ComponentType, Type};
    use json::buffer::Target;

    let (min, max) = position_bounds(&scene.positions);
    let positions = buffer.push_accessor(
        &f32_bytes(scene.positions.iter().flatten()),
        scene.positions.len(),
        ComponentType::F32,
        Type::Vec3,
        Some((&min, &max)),
        Some(Target::ArrayBuffer),
    );
    let normals = buffer.push_accessor(
        &f32_bytes(scene.normals.iter().flatten()),
        scene.normals.len(),
        ComponentType::F32,
        Type::Vec3,
        None,
        Some(Target::ArrayBuffer),
    );
    let uvs = buffer.push_accessor(
        &f32_bytes(scene.uvs.iter().flatten()),
        scene.uvs.len(),
        ComponentType::F32,
        Type::Vec2,
        None,
        Some(Target::ArrayBuffer),
    );
    let joint_bytes: Vec<u8> = scene.joints.iter().flatten().copied().collect();
    let joints = buffer.push_accessor(
        &joint_bytes,
        scene.joints.len(),
        ComponentType::U8,
        Type::Vec4,
        None,
        Some(Target::ArrayBuffer),
    );
    let weights = buffer.push_accessor(
        &f32_bytes(scene.weights.iter().flatten()),
        scene.weights.len(),
        ComponentType::F32,
        Type::Vec4,
        None,
        Some(Target::ArrayBuffer),
    );
    let index_bytes: Vec<u8> = scene.indices.iter().flat_map(|i| i.to_le_bytes()).collect();
    let indices = buffer.push_accessor(
        &index_bytes,
        scene.indices.len(),
        ComponentType::U16,
        Type::Scalar,
        None,
        Some(Target::ElementArrayBuffer),
    );
    let inverse_bind_matrices = buffer.push_accessor(
        &f32_bytes(scene.inverse_bind_matrices.iter().flatten().flatten()),
        scene.inverse_bind_matrices.len(),
        ComponentType::F32,
        Type::Mat4,
        None,
        None,
    );

    let animation = with_animation.then(|| {
        let keys = &scene.animation;
        let last_time = keys.times[keys.times.len() - 1];
        let times = buffer.push_accessor(
            &f32_bytes(keys.times.iter()),
            keys.times.len(),
            ComponentType::F32,
            Type::Scalar,
            Some((&[keys.times[0]], &[last_time])),
            None,
        );
        let root_translations = buffer.push_accessor(
            &f32_bytes(keys.root_translations.iter().flatten()),
            keys.root_translations.len(),
            ComponentType::F32,
            Type::Vec3,
            None,
            None,
        );
        let spine_rotations = buffer.push_accessor(
            &f32_bytes(keys.spine_rotations.iter().flatten()),
            keys.spine_rotations.len(),
            ComponentType::F32,
            Type::Vec4,
            None,
            None,
        );
        (times, root_translations, spine_rotations)
    });

    let png_view = buffer.push_view(&scene.texture_png, None);

    PackedIds {
        positions,
        normals,
        uvs,
        joints,
        weights,
        indices,
        inverse_bind_matrices,
        png_view,
        animation,
    }
}

fn position_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for position in positions {
        for i in 0..3 {
            min[i] = min[i].min(position[i]);
            max[i] = max[i].max(position[i]);
        }
    }
    (min, max)
}

fn node(
    name: &str,
    translation: Option<[f32; 3]>,
    children: Vec<u32>,
    mesh_skin: Option<(u32, u32)>,
) -> json::Node {
    json::Node {
        camera: None,
        children: if children.is_empty() {
            None
        } else {
            Some(children.into_iter().map(json::Index::new).collect())
        },
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: mesh_skin.map(|(mesh, _)| json::Index::new(mesh)),
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation,
        skin: mesh_skin.map(|(_, skin)| json::Index::new(skin)),
        weights: None,
    }
}

fn push_channel(
    samplers: &mut Vec<json::animation::Sampler>,
    channels: &mut Vec<json::animation::Channel>,
    times: u32,
    output: u32,
    node: u32,
    path: json::animation::Property,
) {
    let sampler = samplers.len() as u32;
    samplers.push(json::animation::Sampler {
        extensions: Default::default(),
        extras: Default::default(),
        input: json::Index::new(times),
        interpolation: Valid(json::animation::Interpolation::Linear),
        output: json::Index::new(output),
    });
    channels.push(json::animation::Channel {
        sampler: json::Index::new(sampler),
        target: json::animation::Target {
            extensions: Default::default(),
            extras: Default::default(),
            node: json::Index::new(node),
            path: Valid(path),
        },
        extensions: Default::default(),
        extras: Default::default(),
    });
}

fn build_root(
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
    buffer_length: usize,
    ids: &PackedIds,
) -> json::Root {
    use json::animation::Property;

    let nodes = vec![
        node(
            "Armature",
            Some(ARMATURE_TRANSLATION),
            vec![ROOT_NODE, MESH_NODE],
            None,
        ),
        node(JOINT_NAMES[0], Some([0.0, 0.0, 0.0]), vec![SPINE_NODE], None),
        node(
            JOINT_NAMES[1],
            Some([0.0, SEGMENT_HEIGHT, 0.0]),
            vec![HEAD_NODE],
            None,
        ),
        node(JOINT_NAMES[2], Some([0.0, SEGMENT_HEIGHT, 0.0]), Vec::new(), None),
        node("HeroMesh", None, Vec::new(), Some((0, 0))),
    ];

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(ids.positions),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Normals),
        json::Index::new(ids.normals),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::TexCoords(0)),
        json::Index::new(ids.uvs),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Joints(0)),
        json::Index::new(ids.joints),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Weights(0)),
        json::Index::new(ids.weights),
    );

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("HeroMesh".to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(json::Index::new(ids.indices)),
            material: Some(json::Index::new(0)),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    }];

    let skins = vec![json::Skin {
        extensions: Default::default(),
        extras: Default::default(),
        inverse_bind_matrices: Some(json::Index::new(ids.inverse_bind_matrices)),
        joints: vec![
            json::Index::new(ROOT_NODE),
            json::Index::new(SPINE_NODE),
            json::Index::new(HEAD_NODE),
        ],
        name: Some("Hero".to_string()),
        skeleton: Some(json::Index::new(ROOT_NODE)),
    }];

    let images = vec![json::Image {
        buffer_view: Some(json::Index::new(ids.png_view)),
        mime_type: Some(json::image::MimeType("image/png".to_string())),
        name: Some("BaseColor".to_string()),
        uri: None,
        extensions: Default::default(),
        extras: Default::default(),
    }];

    let textures = vec![json::Texture {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("BaseColor".to_string()),
        sampler: None,
        source: json::Index::new(0),
    }];

    let materials = vec![json::Material {
        name: Some("HeroSkin".to_string()),
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: Some(json::texture::Info {
                index: json::Index::new(0),
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }),
            ..Default::default()
        },
        ..Default::default()
    }];

    let animations = match ids.animation {
        Some((times, root_translations, spine_rotations)) => {
            let mut samplers = Vec::new();
            let mut channels = Vec::new();
            push_channel(
                &mut samplers,
                &mut channels,
                times,
                root_translations,
                ROOT_NODE,
                Property::Translation,
            );
            push_channel(
                &mut samplers,
                &mut channels,
                times,
                spine_rotations,
                SPINE_NODE,
                Property::Rotation,
            );
            vec![json::Animation {
                extensions: Default::default(),
                extras: Default::default(),
                channels,
                name: Some("Wave".to_string()),
                samplers,
            }]
        }
        None => Vec::new(),
    };

    json::Root {
        accessors,
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("marrow-export test generator".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers: vec![json::Buffer {
            byte_length: buffer_length.into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }],
        buffer_views: views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_used: Vec::new(),
        extensions_required: Vec::new(),
        images,
        materials,
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("Scene".to_string()),
            nodes: vec![json::Index::new(ARMATURE_NODE)],
        }],
        skins,
        textures,
    }
}

fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let json_string = json::serialize::to_string(root).expect("Failed to serialize glTF JSON");
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;
    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    // 12-byte header: magic, version, total length
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk, space-padded to a 4-byte boundary
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat_n(0x20u8, json_padding));

    // BIN chunk, zero-padded
    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat_n(0u8, buffer_padding));

    glb
}
