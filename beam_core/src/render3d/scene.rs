//! Scene graph as plain data.
//!
//! Nodes carry geometry and material descriptions instead of GPU handles;
//! a [`RenderBackend`](super::viewer::RenderBackend) turns them into real
//! resources. The whole graph serializes to JSON for inspection.

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Axis-aligned box centred on the node position
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Arrowhead, apex along +Y before rotation
    Cone { radius: f32, height: f32 },
    /// Connected polyline
    Line { points: Vec<Vec3> },
    /// Wireframe of a box's edges
    Edges { size: Vec3 },
    Grid { size: f32, divisions: u32 },
    Axes { size: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    /// Lit surface (roughness/metalness)
    Standard,
    /// Unlit surface
    Basic,
    Line,
    Dashed,
    Sprite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: String,
    pub opacity: f32,
}

impl Material {
    pub fn new(kind: MaterialKind, color: &str) -> Self {
        Self {
            kind,
            color: color.to_string(),
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// User data attached to pickable meshes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshTag {
    Beam { id: String, width: f64, height: f64, length: f64 },
    Column { id: String, width: f64 },
}

impl MeshTag {
    /// Dimension tooltip
    pub fn tooltip(&self) -> String {
        match self {
            MeshTag::Beam { id, width, height, length } => {
                format!("{}: {} × {} cm, L = {} cm", id, width, height, length)
            }
            MeshTag::Column { id, width } => format!("{}: {} × {} cm", id, width, width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Mesh { geometry: Geometry, material: Material },
    /// Camera-facing text label
    Sprite { text: String, material: Material, height: f32 },
    AmbientLight { color: String, intensity: f32 },
    DirectionalLight { color: String, intensity: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub position: Vec3,
    /// Euler angles (radians, XYZ order)
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<MeshTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            rotation: Vec3::ZERO,
            tag: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group, Vec3::ZERO)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material, position: Vec3) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material }, position)
    }

    pub fn sprite(name: impl Into<String>, text: impl Into<String>, color: &str, height: f32, position: Vec3) -> Self {
        Self::new(
            name,
            NodeKind::Sprite {
                text: text.into(),
                material: Material::new(MaterialKind::Sprite, color),
                height,
            },
            position,
        )
    }

    pub fn with_tag(mut self, tag: MeshTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first, parents before children
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Node counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStats {
    pub meshes: usize,
    pub sprites: usize,
    pub lights: usize,
    pub tagged: usize,
    /// Geometries the backend must allocate
    pub geometries: usize,
    /// Materials the backend must allocate
    pub materials: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub background: String,
    pub nodes: Vec<SceneNode>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: "#f3f4f6".to_string(),
            nodes: Vec::new(),
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn traverse<'a>(&'a self, mut f: impl FnMut(&'a SceneNode)) {
        for node in &self.nodes {
            node.visit(&mut f);
        }
    }

    /// First top-level node with the given name
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// World-space position of every tagged mesh with its geometry
    pub fn tagged_meshes(&self) -> Vec<(&MeshTag, &Geometry, Vec3)> {
        fn walk<'a>(node: &'a SceneNode, offset: Vec3, out: &mut Vec<(&'a MeshTag, &'a Geometry, Vec3)>) {
            let position = offset + node.position;
            if let (Some(tag), NodeKind::Mesh { geometry, .. }) = (&node.tag, &node.kind) {
                out.push((tag, geometry, position));
            }
            for child in &node.children {
                walk(child, position, out);
            }
        }
        let mut out = Vec::new();
        for node in &self.nodes {
            walk(node, Vec3::ZERO, &mut out);
        }
        out
    }

    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        self.traverse(|node| {
            if node.tag.is_some() {
                stats.tagged += 1;
            }
            match &node.kind {
                NodeKind::Mesh { .. } => {
                    stats.meshes += 1;
                    stats.geometries += 1;
                    stats.materials += 1;
                }
                NodeKind::Sprite { .. } => {
                    stats.sprites += 1;
                    stats.materials += 1;
                }
                NodeKind::AmbientLight { .. } | NodeKind::DirectionalLight { .. } => stats.lights += 1,
                NodeKind::Group => {}
            }
        });
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scene {
        let mut scene = Scene::new();
        let beam = SceneNode::mesh(
            "V1",
            Geometry::Box { size: Vec3::new(320.0, 40.0, 20.0) },
            Material::new(MaterialKind::Standard, "#808080").with_opacity(0.6),
            Vec3::new(10.0, 0.0, 0.0),
        )
        .with_tag(MeshTag::Beam { id: "V1".into(), width: 20.0, height: 40.0, length: 320.0 })
        .with_child(SceneNode::mesh(
            "V1-edges",
            Geometry::Edges { size: Vec3::new(320.0, 40.0, 20.0) },
            Material::new(MaterialKind::Line, "#000000"),
            Vec3::ZERO,
        ));
        let mut group = SceneNode::group("structure");
        group.position = Vec3::new(0.0, 5.0, 0.0);
        group.push(beam);
        scene.add(group);
        scene.add(SceneNode::new(
            "ambient",
            NodeKind::AmbientLight { color: "#ffffff".into(), intensity: 0.6 },
            Vec3::ZERO,
        ));
        scene.add(SceneNode::sprite("label", "V1", "#333333", 12.0, Vec3::ZERO));
        scene
    }

    #[test]
    fn test_stats_count_resources() {
        let stats = sample().stats();
        assert_eq!(stats.meshes, 2);
        assert_eq!(stats.sprites, 1);
        assert_eq!(stats.lights, 1);
        assert_eq!(stats.tagged, 1);
        assert_eq!(stats.geometries, 2);
        assert_eq!(stats.materials, 3);
    }

    #[test]
    fn test_tagged_meshes_accumulate_parent_offsets() {
        let scene = sample();
        let tagged = scene.tagged_meshes();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].2, Vec3::new(10.0, 5.0, 0.0));
        assert_eq!(tagged[0].0.tooltip(), "V1: 20 × 40 cm, L = 320 cm");
    }

    #[test]
    fn test_scene_serializes() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["nodes"][0]["children"][0]["kind"]["type"], "mesh");
        assert_eq!(json["nodes"][0]["children"][0]["tag"]["kind"], "beam");
        assert!(sample().find("ambient").is_some());
    }
}
