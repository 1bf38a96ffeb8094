//! Skinned mesh assembly.
//!
//! One pass over the joints in creation order. Branches emit a three-quad
//! strip from their own seams down to the parent's, terminals cap the strip,
//! and leaves emit a sprite quad. Every vertex is skinned to at most two
//! joints, and every joint gets a bind pose at its own index.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PlantConfig, Sprite};
use crate::error::{PlantError, Result};
use crate::geometry::{JointSections, BLEND_DOWN, BLEND_UP};
use crate::random::XorShift128;
use crate::skeleton::{Joint, JointKind, Skeleton};

/// Texture row of the seam nearest the top of a segment.
pub const UV_TOP: f32 = 0.1;
/// Texture row of the seam nearest the bottom of a segment.
pub const UV_BOTTOM: f32 = 1.0 - UV_TOP;

/// Two-slot skinning weight. Unused slots carry weight 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct BoneWeight {
    pub indices: [u32; 2],
    pub weights: [f32; 2],
}

impl BoneWeight {
    pub fn single(bone: usize) -> Self {
        Self {
            indices: [bone as u32, 0],
            weights: [1.0, 0.0],
        }
    }

    pub fn blend(first: usize, first_weight: f32, second: usize, second_weight: f32) -> Self {
        Self {
            indices: [first as u32, second as u32],
            weights: [first_weight, second_weight],
        }
    }

    pub fn total(&self) -> f32 {
        self.weights[0] + self.weights[1]
    }
}

/// Mesh buffers ready to hand to a skinned renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinnedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Triangle list, clockwise winding.
    pub triangles: Vec<u32>,
    pub bone_weights: Vec<BoneWeight>,
    /// Inverse joint transform per joint, indexed by joint index.
    pub bind_poses: Vec<Mat4>,
}

impl SkinnedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Axis-aligned bounds of all vertices, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Area-weighted vertex normals. Degenerate triangles contribute nothing.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.triangles.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals.into_iter().map(Vec3::normalize_or_zero).collect();
    }

    fn push_vertices(&mut self, positions: &[Vec3], uvs: &[Vec2], weights: &[BoneWeight]) -> u32 {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(positions);
        self.uvs.extend_from_slice(uvs);
        self.bone_weights.extend_from_slice(weights);
        base
    }

    fn push_quads(&mut self, base: u32, rows: u32) {
        // Quad between vertex rows r and r+1: (0,1,2) and (1,3,2), clockwise.
        for row in 0..rows {
            let i = base + row * 2;
            self.triangles
                .extend_from_slice(&[i, i + 1, i + 2, i + 1, i + 3, i + 2]);
        }
    }
}

/// UV rect of a sprite as `(left x, right x, top y, height)`.
fn uv_frame(sprite: &Sprite) -> (f32, f32, f32, f32) {
    let [lt, rt, lb, _] = sprite.uv;
    (lt.x, rt.x, lt.y, lb.y - lt.y)
}

fn uv_rows(sprite: &Sprite, rows: &[f32]) -> Vec<Vec2> {
    let (lx, rx, y, h) = uv_frame(sprite);
    rows.iter()
        .flat_map(|&r| [Vec2::new(lx, y + h * r), Vec2::new(rx, y + h * r)])
        .collect()
}

/// Build the skinned mesh for a decoded skeleton and its seams.
///
/// Sprite picks draw from `rng`: one node sprite per branch or terminal, one
/// leaf sprite per leaf, in joint order.
pub fn assemble(
    skeleton: &Skeleton,
    sections: &[JointSections],
    config: &PlantConfig,
    rng: &mut XorShift128,
) -> Result<SkinnedMesh> {
    let mut mesh = SkinnedMesh {
        bind_poses: vec![Mat4::IDENTITY; skeleton.len()],
        ..SkinnedMesh::default()
    };

    for joint in &skeleton.joints {
        match joint.kind {
            JointKind::Origin => {}
            JointKind::Branch => {
                let sprite = pick(&config.node_sprites, rng, "node")?;
                emit_branch(&mut mesh, skeleton, sections, joint, sprite);
            }
            JointKind::Terminal => {
                let sprite = pick(&config.node_sprites, rng, "node")?;
                emit_terminal(&mut mesh, skeleton, sections, joint, sprite);
            }
            JointKind::Leaf => {
                let sprite = pick(&config.leaf_sprites, rng, "leaf")?;
                emit_leaf(&mut mesh, skeleton, joint, sprite, config);
            }
        }
        mesh.bind_poses[joint.index] = joint.bind_pose();
    }

    mesh.recalculate_normals();
    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "assembled mesh"
    );
    Ok(mesh)
}

fn pick<'a>(pool: &'a [Sprite], rng: &mut XorShift128, name: &'static str) -> Result<&'a Sprite> {
    rng.pick(pool.len())
        .map(|i| &pool[i])
        .ok_or(PlantError::EmptySpritePool(name))
}

fn emit_branch(
    mesh: &mut SkinnedMesh,
    skeleton: &Skeleton,
    sections: &[JointSections],
    joint: &Joint,
    sprite: &Sprite,
) {
    let own = &sections[joint.index];
    // Branches always have a parent; the origin is handled by the caller.
    let parent_index = joint.parent.unwrap_or(0);
    let parent_is_origin = skeleton.joints[parent_index].kind == JointKind::Origin;

    let (toward_parent, last_row) = if parent_is_origin {
        (sections[parent_index].current, 1.0)
    } else {
        (sections[parent_index].up, UV_BOTTOM)
    };

    let positions = [
        own.up.left,
        own.up.right,
        own.base.left,
        own.base.right,
        own.base.left,
        own.base.right,
        own.down.left,
        own.down.right,
        toward_parent.left,
        toward_parent.right,
    ];
    let uvs = uv_rows(sprite, &[UV_BOTTOM, 1.0, 0.0, UV_TOP, last_row]);

    let (bottom, toward) = match skeleton.ancestor(joint.index, 2) {
        Some(grandparent) if !parent_is_origin => (
            BoneWeight::blend(parent_index, BLEND_UP, grandparent, BLEND_DOWN),
            BoneWeight::single(grandparent),
        ),
        _ => (
            BoneWeight::single(parent_index),
            BoneWeight::single(parent_index),
        ),
    };
    let full = BoneWeight::single(parent_index);
    let weights = [
        full, full, full, full, full, full, bottom, bottom, toward, toward,
    ];

    let base = mesh.push_vertices(&positions, &uvs, &weights);
    // bottom-base, base-top, top-bottom; rows (1,2) are coincident and skipped.
    mesh.push_quads(base, 1);
    mesh.push_quads(base + 4, 2);
}

fn emit_terminal(
    mesh: &mut SkinnedMesh,
    skeleton: &Skeleton,
    sections: &[JointSections],
    joint: &Joint,
    sprite: &Sprite,
) {
    let own = &sections[joint.index];
    let parent_index = joint.parent.unwrap_or(0);
    let parent_up = sections[parent_index].up;

    let positions = [
        own.current.left,
        own.current.right,
        parent_up.left,
        parent_up.right,
    ];
    let uvs = uv_rows(sprite, &[0.0, UV_BOTTOM]);

    // Weighted like the parent branch's segment: its grandparent and great-grandparent.
    let (head, tail) = match (
        skeleton.ancestor(joint.index, 2),
        skeleton.ancestor(joint.index, 3),
    ) {
        (Some(gp), Some(ggp)) => (
            BoneWeight::single(gp),
            BoneWeight::blend(gp, BLEND_DOWN, ggp, BLEND_UP),
        ),
        (Some(gp), None) => (BoneWeight::single(gp), BoneWeight::single(gp)),
        _ => (
            BoneWeight::single(parent_index),
            BoneWeight::single(parent_index),
        ),
    };
    let weights = [head, head, tail, tail];

    let base = mesh.push_vertices(&positions, &uvs, &weights);
    mesh.push_quads(base, 1);
}

fn emit_leaf(
    mesh: &mut SkinnedMesh,
    skeleton: &Skeleton,
    joint: &Joint,
    sprite: &Sprite,
    config: &PlantConfig,
) {
    let anchor = joint.world_position - skeleton.root().world_position;
    let positions = sprite.vertices.map(|v| {
        Vec3::new(v.x * config.leaf_scale, v.y * config.leaf_scale, config.leaf_z_offset) + anchor
    });
    let weights = [BoneWeight::single(joint.index); 4];

    let base = mesh.push_vertices(&positions, &sprite.uv, &weights);
    mesh.push_quads(base, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_sections;
    use crate::skeleton::decode;

    fn config() -> PlantConfig {
        PlantConfig {
            dist_min: 1.0,
            dist_max: 1.0,
            ..PlantConfig::default()
        }
    }

    fn build(dna: &str) -> (Skeleton, SkinnedMesh) {
        let config = config();
        let mut rng = XorShift128::from_seed(11);
        let skeleton = decode(dna, &config, &mut rng);
        let sections = build_sections(&skeleton, config.thickness);
        let mesh = assemble(&skeleton, &sections, &config, &mut rng).unwrap();
        (skeleton, mesh)
    }

    #[test]
    fn test_single_segment_counts() {
        let (_, mesh) = build("F");
        // branch 10 + terminal 4 + leaf 4
        assert_eq!(mesh.vertex_count(), 18);
        // branch 6 + terminal 2 + leaf 2
        assert_eq!(mesh.triangle_count(), 10);
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        assert_eq!(mesh.bone_weights.len(), mesh.vertex_count());
        assert_eq!(mesh.normals.len(), mesh.vertex_count());
        assert_eq!(mesh.bind_poses.len(), 4);
    }

    #[test]
    fn test_branch_triangle_wiring() {
        let (_, mesh) = build("F");
        assert_eq!(
            &mesh.triangles[..18],
            &[0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6, 6, 7, 8, 7, 9, 8]
        );
        assert_eq!(&mesh.triangles[18..24], &[10, 11, 12, 11, 13, 12]);
    }

    #[test]
    fn test_branch_on_origin_weights_collapse() {
        let (_, mesh) = build("F");
        for w in &mesh.bone_weights[..10] {
            assert_eq!(*w, BoneWeight::single(0));
        }
    }

    #[test]
    fn test_nested_branch_blends_parent_and_grandparent() {
        let (skeleton, mesh) = build("FF");
        assert_eq!(skeleton.joints[2].kind, JointKind::Branch);
        let second = &mesh.bone_weights[10..20];
        assert_eq!(second[0], BoneWeight::single(1));
        assert_eq!(second[6], BoneWeight::blend(1, BLEND_UP, 0, BLEND_DOWN));
        assert_eq!(second[8], BoneWeight::single(0));
    }

    #[test]
    fn test_terminal_weights() {
        let (skeleton, mesh) = build("FF");
        // joints: origin, b1, b2, terminal(3), leaf(4)
        assert_eq!(skeleton.joints[3].kind, JointKind::Terminal);
        let terminal = &mesh.bone_weights[20..24];
        assert_eq!(terminal[0], BoneWeight::single(1));
        assert_eq!(terminal[2], BoneWeight::blend(1, BLEND_DOWN, 0, BLEND_UP));
        let leaf = &mesh.bone_weights[24..28];
        assert!(leaf.iter().all(|w| *w == BoneWeight::single(4)));
    }

    #[test]
    fn test_terminal_without_great_grandparent() {
        let (_, mesh) = build("F");
        // terminal(2) -> branch(1) -> origin(0); no great-grandparent.
        let terminal = &mesh.bone_weights[10..14];
        assert!(terminal.iter().all(|w| *w == BoneWeight::single(0)));
    }

    #[test]
    fn test_terminal_on_origin() {
        let (skeleton, mesh) = build("+");
        assert_eq!(skeleton.len(), 3);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.bone_weights[..4].iter().all(|w| *w == BoneWeight::single(0)));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let (skeleton, mesh) = build("F[+F[-F]F]F[G]");
        for w in &mesh.bone_weights {
            assert!((w.total() - 1.0).abs() < 1e-6);
            assert!((w.indices[0] as usize) < skeleton.len());
            assert!((w.indices[1] as usize) < skeleton.len());
        }
    }

    #[test]
    fn test_branch_uv_rows() {
        let (_, mesh) = build("FF");
        // Default node sprite maps v from 1 (top) to 0 (bottom): h = -1.
        let second = &mesh.uvs[10..20];
        assert!((second[0].y - 0.1).abs() < 1e-6);
        assert_eq!(second[2].y, 0.0);
        assert_eq!(second[4].y, 1.0);
        assert!((second[6].y - 0.9).abs() < 1e-6);
        assert!((second[8].y - 0.1).abs() < 1e-6);
        // Parent is the origin for the first branch: last row maps to y + h.
        assert_eq!(mesh.uvs[8].y, 0.0);
        assert_eq!(mesh.uvs[0].x, 0.0);
        assert_eq!(mesh.uvs[1].x, 1.0);
    }

    #[test]
    fn test_leaf_quad_uses_sprite() {
        let config = config();
        let (skeleton, mesh) = build("F");
        let leaf = &skeleton.joints[3];
        let sprite = config.leaf_sprites[0];
        let corners = &mesh.positions[14..18];
        for (corner, v) in corners.iter().zip(sprite.vertices) {
            let expected = leaf.world_position + Vec3::new(v.x * 5.0, v.y * 5.0, 0.0);
            assert!((*corner - expected).length() < 1e-5);
        }
        assert_eq!(&mesh.uvs[14..18], &sprite.uv);
    }

    #[test]
    fn test_bind_poses_indexed_by_joint() {
        let (skeleton, mesh) = build("F[+F]F");
        for joint in &skeleton.joints {
            assert_eq!(mesh.bind_poses[joint.index], joint.bind_pose());
        }
    }

    #[test]
    fn test_empty_leaf_pool_is_error() {
        let config = PlantConfig {
            leaf_sprites: Vec::new(),
            ..config()
        };
        let mut rng = XorShift128::from_seed(1);
        let skeleton = decode("F", &config, &mut rng);
        let sections = build_sections(&skeleton, config.thickness);
        let err = assemble(&skeleton, &sections, &config, &mut rng).unwrap_err();
        assert!(matches!(err, PlantError::EmptySpritePool("leaf")));
    }

    #[test]
    fn test_bounds_and_normals() {
        let (_, mesh) = build("FF");
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(hi.y >= 2.0 && lo.y <= 0.0);
        assert!(mesh.normals.iter().all(|n| n.length() < 1.0 + 1e-4));
        assert_eq!(SkinnedMesh::default().bounds(), None);
    }
}
