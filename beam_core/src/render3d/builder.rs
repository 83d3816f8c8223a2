//! Builds the full scene graph from a model snapshot.
//!
//! World axes: X runs along the structure (cm), Y is the load-normal axis
//! (up), Z is depth. Beams are centred on Y = 0; columns hang below the
//! tallest beam. The diagram, when shown, lies in a constant-depth plane in
//! front of the beams.

use std::f32::consts::PI;

use glam::Vec3;
use tracing::debug;

use crate::diagram::overlay::format_value;
use crate::diagram::{DiagramOverlay, MarkerRole};
use crate::model::{StructuralModel, DEFAULT_BEAM_HEIGHT, DEFAULT_BEAM_WIDTH};
use crate::palette::color_for;
use crate::projection::viewport::DEFAULT_WIDTH;
use crate::projection::{Projection, DEFAULT_PADDING, EMPTY_RANGE};
use crate::render2d::{distributed_arrow_count, load_label, ViewMode, NO_DATA_MESSAGE};

use super::camera::SceneBounds;
use super::scene::{Geometry, Material, MaterialKind, MeshTag, NodeKind, Scene, SceneNode};

pub const BEAM_COLOR: &str = "#808080";
pub const BEAM_OPACITY: f32 = 0.6;
pub const COLUMN_COLOR: &str = "#a0a0a0";
pub const EDGE_COLOR: &str = "#000000";
pub const DIAGRAM_COLOR: &str = "#2563eb";
const INK: &str = "#333333";

/// Column height as a multiple of the tallest beam
pub const COLUMN_HEIGHT_FACTOR: f32 = 3.0;
pub const POINT_ARROW_LENGTH: f32 = 60.0;
pub const DISTRIBUTED_ARROW_LENGTH: f32 = 40.0;
pub const ARROW_HEAD_RADIUS: f32 = 4.0;
pub const ARROW_HEAD_LENGTH: f32 = 10.0;
pub const LABEL_HEIGHT: f32 = 12.0;
/// World height of the diagram's peak value
pub const DIAGRAM_HEIGHT: f32 = 100.0;
/// Gap between the beams' front face and the diagram plane
pub const DIAGRAM_DEPTH_GAP: f32 = 20.0;
pub const LABEL_MARGIN: f32 = 10.0;
pub const MARKER_RADIUS: f32 = 3.0;

/// Everything the 3D view is a function of
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub model: &'a StructuralModel,
    pub mode: ViewMode,
    pub overlay: Option<&'a DiagramOverlay>,
}

impl<'a> SceneInput<'a> {
    pub fn loads(model: &'a StructuralModel) -> Self {
        Self { model, mode: ViewMode::Loads, overlay: None }
    }

    pub fn diagram(model: &'a StructuralModel, overlay: Option<&'a DiagramOverlay>) -> Self {
        Self { model, mode: ViewMode::Diagram, overlay }
    }

    fn diagram_overlay(&self) -> Option<&'a DiagramOverlay> {
        match self.mode {
            ViewMode::Diagram => self.overlay.filter(|o| !o.is_empty()),
            ViewMode::Loads => None,
        }
    }
}

// ============================================================================
// Dimensions
// ============================================================================

fn tallest_beam(model: &StructuralModel) -> f32 {
    model.max_beam_height().unwrap_or(DEFAULT_BEAM_HEIGHT) as f32
}

fn widest_member(model: &StructuralModel) -> f32 {
    model
        .beams
        .iter()
        .map(|b| b.width)
        .chain(model.pillars.iter().map(|p| p.width))
        .reduce(f64::max)
        .unwrap_or(DEFAULT_BEAM_WIDTH) as f32
}

/// Half-height of the beam envelope (top face Y)
pub fn beam_top(model: &StructuralModel) -> f32 {
    tallest_beam(model) / 2.0
}

pub fn column_height(model: &StructuralModel) -> f32 {
    tallest_beam(model) * COLUMN_HEIGHT_FACTOR
}

/// Depth (Z) of the plane the diagram is drawn in
pub fn diagram_plane_z(model: &StructuralModel) -> f32 {
    widest_member(model) / 2.0 + DIAGRAM_DEPTH_GAP
}

pub fn scene_bounds(model: &StructuralModel) -> SceneBounds {
    let (min_x, max_x) = model.extent().unwrap_or(EMPTY_RANGE);
    let top = beam_top(model);
    let half_depth = widest_member(model) / 2.0;
    SceneBounds {
        min: Vec3::new(min_x as f32, -top - column_height(model), -half_depth),
        max: Vec3::new(max_x as f32, top, half_depth),
    }
}

/// Vertical scale applied to display values in diagram mode
pub fn diagram_scale(overlay: &DiagramOverlay) -> f32 {
    let peak = overlay.peak_amplitude() as f32;
    if peak > 0.0 {
        DIAGRAM_HEIGHT / peak
    } else {
        0.0
    }
}

/// Keep a value label outside the beam envelope, on the side of its sign
pub fn clamp_label_y(y: f32, value: f64, envelope: f32) -> f32 {
    if value >= 0.0 {
        (y + LABEL_MARGIN).max(envelope + LABEL_MARGIN)
    } else {
        (y - LABEL_MARGIN).min(-envelope - LABEL_MARGIN)
    }
}

// ============================================================================
// Builders
// ============================================================================

fn line(name: String, points: Vec<Vec3>, material: Material) -> SceneNode {
    SceneNode::mesh(name, Geometry::Line { points }, material, Vec3::ZERO)
}

/// Shaft plus cone head, from `tail` to `tip` (vertical)
fn arrow(name: &str, tail: Vec3, tip: Vec3, color: &str) -> SceneNode {
    let pointing_down = tip.y < tail.y;
    let head_center = if pointing_down {
        tip + Vec3::Y * (ARROW_HEAD_LENGTH / 2.0)
    } else {
        tip - Vec3::Y * (ARROW_HEAD_LENGTH / 2.0)
    };
    let rotation = if pointing_down { Vec3::new(0.0, 0.0, PI) } else { Vec3::ZERO };

    SceneNode::group(name)
        .with_child(line(format!("{}-shaft", name), vec![tail, tip], Material::new(MaterialKind::Line, color)))
        .with_child(
            SceneNode::mesh(
                format!("{}-head", name),
                Geometry::Cone { radius: ARROW_HEAD_RADIUS, height: ARROW_HEAD_LENGTH },
                Material::new(MaterialKind::Basic, color),
                head_center,
            )
            .with_rotation(rotation),
        )
}

fn structure(model: &StructuralModel) -> SceneNode {
    let top = beam_top(model);
    let column_h = column_height(model);
    let mut group = SceneNode::group("structure");

    for beam in &model.beams {
        let size = Vec3::new(beam.length() as f32, beam.height as f32, beam.width as f32);
        let center = Vec3::new(((beam.min_position() + beam.max_position()) / 2.0) as f32, 0.0, 0.0);
        group.push(
            SceneNode::mesh(
                &beam.id,
                Geometry::Box { size },
                Material::new(MaterialKind::Standard, BEAM_COLOR).with_opacity(BEAM_OPACITY),
                center,
            )
            .with_tag(MeshTag::Beam {
                id: beam.id.clone(),
                width: beam.width,
                height: beam.height,
                length: beam.length(),
            })
            .with_child(SceneNode::mesh(
                format!("{}-edges", beam.id),
                Geometry::Edges { size },
                Material::new(MaterialKind::Line, EDGE_COLOR),
                Vec3::ZERO,
            )),
        );
    }

    for pillar in &model.pillars {
        let w = pillar.width as f32;
        let size = Vec3::new(w, column_h, w);
        group.push(
            SceneNode::mesh(
                &pillar.id,
                Geometry::Box { size },
                Material::new(MaterialKind::Standard, COLUMN_COLOR),
                Vec3::new(pillar.position as f32, -top - column_h / 2.0, 0.0),
            )
            .with_tag(MeshTag::Column { id: pillar.id.clone(), width: pillar.width })
            .with_child(SceneNode::mesh(
                format!("{}-edges", pillar.id),
                Geometry::Edges { size },
                Material::new(MaterialKind::Line, EDGE_COLOR),
                Vec3::ZERO,
            )),
        );
    }

    group
}

fn helpers(bounds: &SceneBounds) -> SceneNode {
    let extent = bounds.extent().max(100.0);
    SceneNode::group("helpers")
        .with_child(SceneNode::mesh(
            "grid",
            Geometry::Grid { size: extent * 1.5, divisions: 20 },
            Material::new(MaterialKind::Line, "#cccccc"),
            Vec3::new(bounds.centroid().x, bounds.min.y - 10.0, 0.0),
        ))
        .with_child(SceneNode::mesh(
            "axes",
            Geometry::Axes { size: extent / 2.0 },
            Material::new(MaterialKind::Line, "#999999"),
            Vec3::ZERO,
        ))
}

fn loads(model: &StructuralModel) -> SceneNode {
    let top = beam_top(model);
    // arrow density follows the default 2D elevation, not the world length
    let reference = Projection::fit(model, DEFAULT_WIDTH, DEFAULT_PADDING);
    let mut group = SceneNode::group("loads");

    for (index, load) in model.point_loads.iter().enumerate() {
        let color = color_for(index);
        let x = load.position as f32;
        let base = Vec3::new(x, top, 0.0);
        let high = base + Vec3::Y * POINT_ARROW_LENGTH;
        let (tail, tip) = if load.magnitude < 0.0 { (high, base) } else { (base, high) };
        let label_at = high + Vec3::Y * (LABEL_HEIGHT + LABEL_MARGIN);

        group.push(arrow(&load.id, tail, tip, color));
        group.push(line(
            format!("{}-guide", load.id),
            vec![high, label_at],
            Material::new(MaterialKind::Dashed, color),
        ));
        group.push(SceneNode::sprite(
            format!("{}-label", load.id),
            load_label(&load.id, load.magnitude, "kN"),
            color,
            LABEL_HEIGHT,
            label_at,
        ));
    }

    let offset = model.point_loads.len();
    for (index, load) in model.distributed_loads.iter().enumerate() {
        let color = color_for(offset + index);
        let (x1, x2) = (load.min_position() as f32, load.max_position() as f32);
        let bar_y = top + DISTRIBUTED_ARROW_LENGTH;
        let count = distributed_arrow_count(reference.span_px(load.max_position() - load.min_position()));
        let material = Material::new(MaterialKind::Line, color);

        let mut row = SceneNode::group(&load.id);
        row.push(line(format!("{}-bar", load.id), vec![Vec3::new(x1, bar_y, 0.0), Vec3::new(x2, bar_y, 0.0)], material.clone()));
        for x in [x1, x2] {
            row.push(line(
                format!("{}-bound", load.id),
                vec![Vec3::new(x, top, 0.0), Vec3::new(x, bar_y, 0.0)],
                material.clone(),
            ));
        }
        for i in 0..count {
            let x = x1 + (x2 - x1) * i as f32 / (count - 1) as f32;
            let (base, high) = (Vec3::new(x, top, 0.0), Vec3::new(x, bar_y, 0.0));
            let (tail, tip) = if load.magnitude < 0.0 { (high, base) } else { (base, high) };
            row.push(arrow(&format!("{}-arrow{}", load.id, i), tail, tip, color));
        }
        row.push(SceneNode::sprite(
            format!("{}-label", load.id),
            load_label(&load.id, load.magnitude, "kN/m"),
            color,
            LABEL_HEIGHT,
            Vec3::new((x1 + x2) / 2.0, bar_y + LABEL_HEIGHT, 0.0),
        ));
        group.push(row);
    }

    group
}

fn diagram(model: &StructuralModel, overlay: &DiagramOverlay) -> SceneNode {
    let z = diagram_plane_z(model);
    let k = diagram_scale(overlay);
    let envelope = beam_top(model);
    let at = |x: f64, value: f64| Vec3::new(x as f32, value as f32 * k, z);

    let mut group = SceneNode::group("diagram");
    let curve: Vec<Vec3> = overlay.points.iter().map(|p| at(p.x, p.value)).collect();

    if let (Some(first), Some(last)) = (overlay.points.first(), overlay.points.last()) {
        group.push(line(
            "diagram-baseline".to_string(),
            vec![at(first.x, 0.0), at(last.x, 0.0)],
            Material::new(MaterialKind::Line, "#999999"),
        ));
    }
    group.push(line("diagram-curve".to_string(), curve, Material::new(MaterialKind::Line, DIAGRAM_COLOR)));

    for (i, marker) in overlay.markers.iter().enumerate() {
        let color = match marker.role {
            MarkerRole::Node => INK,
            MarkerRole::Max | MarkerRole::Min => DIAGRAM_COLOR,
        };
        let position = at(marker.x, marker.value);
        group.push(SceneNode::mesh(
            format!("marker{}", i),
            Geometry::Sphere { radius: MARKER_RADIUS },
            Material::new(MaterialKind::Basic, color),
            position,
        ));
        let label_y = clamp_label_y(position.y, marker.value, envelope);
        group.push(SceneNode::sprite(
            format!("marker{}-label", i),
            format_value(marker.value),
            color,
            LABEL_HEIGHT,
            Vec3::new(position.x, label_y, z),
        ));
    }

    group
}

/// Full rebuild of the scene for one input state
pub fn build_scene(input: &SceneInput<'_>) -> Scene {
    let model = input.model;
    let bounds = scene_bounds(model);
    let light_distance = bounds.extent().max(200.0);

    let mut scene = Scene::new();
    scene.add(SceneNode::new(
        "ambient",
        NodeKind::AmbientLight { color: "#ffffff".into(), intensity: 0.6 },
        Vec3::ZERO,
    ));
    scene.add(SceneNode::new(
        "sun",
        NodeKind::DirectionalLight { color: "#ffffff".into(), intensity: 0.8 },
        bounds.centroid() + Vec3::splat(light_distance),
    ));
    scene.add(structure(model));
    scene.add(helpers(&bounds));

    match (input.mode, input.diagram_overlay()) {
        (ViewMode::Loads, _) => scene.add(loads(model)),
        (ViewMode::Diagram, Some(overlay)) => scene.add(diagram(model, overlay)),
        (ViewMode::Diagram, None) => scene.add(SceneNode::sprite(
            "no-data",
            NO_DATA_MESSAGE,
            INK,
            LABEL_HEIGHT,
            Vec3::new(bounds.centroid().x, bounds.max.y + 4.0 * LABEL_HEIGHT, 0.0),
        )),
    }

    debug!(nodes = scene.nodes.len(), mode = ?input.mode, "scene rebuilt");
    scene
}
