//! Exporters for generated plants: JSON dump, Wavefront OBJ, raw GPU-ready
//! buffers, and a flat PNG silhouette preview.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::Result;
use crate::mesh::SkinnedMesh;
use crate::plant::GeneratedPlant;
use crate::skeleton::{JointKind, Skeleton};

const BACKGROUND: [u8; 3] = [245, 242, 232];
const BARK: [u8; 3] = [110, 78, 48];
const FOLIAGE: [u8; 3] = [72, 140, 60];

/// Write the whole plant (dna, joints, seams, mesh buffers) as pretty JSON.
pub fn export_json(plant: &GeneratedPlant, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(plant)?;
    fs::write(path, text)?;
    Ok(())
}

/// Render the mesh as Wavefront OBJ text.
pub fn mesh_to_obj(mesh: &SkinnedMesh, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "o {}", name);
    for p in &mesh.positions {
        let _ = writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z);
    }
    for uv in &mesh.uvs {
        let _ = writeln!(out, "vt {:.6} {:.6}", uv.x, uv.y);
    }
    for n in &mesh.normals {
        let _ = writeln!(out, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z);
    }
    // Triangles are stored clockwise; OBJ expects counter-clockwise.
    for tri in mesh.triangles.chunks_exact(3) {
        let [a, b, c] = [tri[0] + 1, tri[2] + 1, tri[1] + 1];
        let _ = writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
    }
    out
}

pub fn export_obj(mesh: &SkinnedMesh, name: &str, path: &Path) -> Result<()> {
    fs::write(path, mesh_to_obj(mesh, name))?;
    Ok(())
}

/// Interleaved vertex layout for skinned rendering (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub bones: [u32; 2],
    pub weights: [f32; 2],
}

pub fn interleave(mesh: &SkinnedMesh) -> Vec<SkinnedVertex> {
    (0..mesh.vertex_count())
        .map(|i| SkinnedVertex {
            position: mesh.positions[i].to_array(),
            normal: mesh.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
            uv: mesh.uvs[i].to_array(),
            bones: mesh.bone_weights[i].indices,
            weights: mesh.bone_weights[i].weights,
        })
        .collect()
}

/// Write little-endian vertex and index buffers as raw bytes.
pub fn export_buffers(mesh: &SkinnedMesh, vertex_path: &Path, index_path: &Path) -> Result<()> {
    let vertices = interleave(mesh);
    fs::write(vertex_path, bytemuck::cast_slice::<SkinnedVertex, u8>(&vertices))?;
    fs::write(index_path, bytemuck::cast_slice::<u32, u8>(&mesh.triangles))?;
    Ok(())
}

/// Orthographic XY silhouette of the mesh, fitted into `width` x `height`.
/// Leaf quads are drawn green, everything else bark brown.
pub fn render_preview(mesh: &SkinnedMesh, skeleton: &Skeleton, width: u32, height: u32) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb(BACKGROUND));
    let Some((lo, hi)) = mesh.bounds() else {
        return img;
    };

    let margin = 0.05;
    let extent = (hi - lo).truncate().max(Vec2::splat(1e-4));
    let usable = Vec2::new(width as f32, height as f32) * (1.0 - 2.0 * margin);
    let scale = (usable / extent).min_element();
    let offset = Vec2::new(width as f32, height as f32) * 0.5
        - (lo.truncate() + extent * 0.5) * scale * Vec2::new(1.0, -1.0);

    // Image rows grow downwards.
    let project = |p: Vec3| offset + Vec2::new(p.x, -p.y) * scale;

    for tri in mesh.triangles.chunks_exact(3) {
        let owner = mesh.bone_weights[tri[0] as usize].indices[0] as usize;
        let is_leaf = skeleton
            .get(owner)
            .is_some_and(|j| j.kind == JointKind::Leaf);
        let color = if is_leaf { FOLIAGE } else { BARK };
        let corners = [tri[0], tri[1], tri[2]].map(|i| project(mesh.positions[i as usize]));
        fill_triangle(&mut img, corners, color);
    }

    img
}

pub fn export_preview(
    mesh: &SkinnedMesh,
    skeleton: &Skeleton,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<()> {
    render_preview(mesh, skeleton, width, height).save(path)?;
    Ok(())
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

/// Fill a triangle of either winding; degenerate triangles draw nothing.
fn fill_triangle(img: &mut RgbImage, [a, b, c]: [Vec2; 3], color: [u8; 3]) {
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON {
        return;
    }
    let min = a.min(b).min(c).floor().max(Vec2::ZERO);
    let max = a
        .max(b)
        .max(c)
        .ceil()
        .min(Vec2::new(img.width() as f32 - 1.0, img.height() as f32 - 1.0));
    if min.x > max.x || min.y > max.y {
        return;
    }

    for y in min.y as u32..=max.y as u32 {
        for x in min.x as u32..=max.x as u32 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlantConfig;
    use crate::plant::generate;

    fn plant() -> GeneratedPlant {
        generate(&PlantConfig::default(), 7).unwrap().unwrap()
    }

    #[test]
    fn test_obj_counts() {
        let plant = plant();
        let obj = mesh_to_obj(&plant.mesh, "plant");
        assert!(obj.starts_with("o plant\n"));
        let vertices = obj.lines().filter(|l| l.starts_with("v ")).count();
        let faces = obj.lines().filter(|l| l.starts_with("f ")).count();
        assert_eq!(vertices, plant.mesh.vertex_count());
        assert_eq!(faces, plant.mesh.triangle_count());
    }

    #[test]
    fn test_obj_indices_are_one_based_and_reversed() {
        let mesh = SkinnedMesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            uvs: vec![Vec2::ZERO; 3],
            triangles: vec![0, 1, 2],
            ..SkinnedMesh::default()
        };
        let obj = mesh_to_obj(&mesh, "t");
        assert!(obj.contains("f 1/1/1 3/3/3 2/2/2"));
    }

    #[test]
    fn test_interleaved_layout() {
        assert_eq!(std::mem::size_of::<SkinnedVertex>(), 48);
        let plant = plant();
        let vertices = interleave(&plant.mesh);
        assert_eq!(vertices.len(), plant.mesh.vertex_count());
        assert_eq!(vertices[3].position, plant.mesh.positions[3].to_array());
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), vertices.len() * 48);
    }

    #[test]
    fn test_preview_draws_both_materials() {
        let plant = plant();
        let img = render_preview(&plant.mesh, &plant.skeleton, 128, 128);
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        assert!(pixels.contains(&BARK));
        assert!(pixels.contains(&FOLIAGE));
        assert!(pixels.contains(&BACKGROUND));
    }

    #[test]
    fn test_preview_of_empty_mesh_is_blank() {
        let plant = plant();
        let img = render_preview(&SkinnedMesh::default(), &plant.skeleton, 8, 8);
        assert!(img.pixels().all(|p| p.0 == BACKGROUND));
    }

    #[test]
    fn test_fill_triangle_either_winding() {
        let mut img: RgbImage = ImageBuffer::from_pixel(10, 10, Rgb(BACKGROUND));
        let tri = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)];
        fill_triangle(&mut img, tri, BARK);
        assert_eq!(img.get_pixel(1, 1).0, BARK);
        let mut img2: RgbImage = ImageBuffer::from_pixel(10, 10, Rgb(BACKGROUND));
        fill_triangle(&mut img2, [tri[0], tri[2], tri[1]], BARK);
        assert_eq!(img2.get_pixel(1, 1).0, BARK);
        assert_eq!(img2.get_pixel(9, 9).0, BACKGROUND);
    }
}
