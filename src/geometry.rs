//! Cross-section seams for every joint.
//!
//! Each joint gets a "current" cross-section (two points either side of its
//! position, along its rotated right axis). Non-origin joints also get the
//! seam where they meet their parent: `base` is the parent's current
//! cross-section, while `up` and `down` sit half a thickness above and below
//! it, blended between the child's and the parent's rotation so the mesh
//! bends smoothly across the joint.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::skeleton::Skeleton;

/// Blend factor towards the parent's rotation for the seam above a joint.
pub const BLEND_UP: f32 = 0.25;
/// Blend factor towards the parent's rotation for the seam below a joint.
pub const BLEND_DOWN: f32 = 1.0 - BLEND_UP;

/// Left/right point pair of a mesh seam.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub left: Vec3,
    pub right: Vec3,
}

impl CrossSection {
    pub fn new(left: Vec3, right: Vec3) -> Self {
        Self { left, right }
    }

    /// Points offset along `rotation`'s right axis, plus a vertical `bias`
    /// in the same frame, all scaled by `thickness`.
    fn around(position: Vec3, rotation: Quat, thickness: f32, bias: f32) -> Self {
        let right = (Vec3::X + Vec3::Y * bias) * thickness;
        let left = (Vec3::NEG_X + Vec3::Y * bias) * thickness;
        Self::new(position + rotation * left, position + rotation * right)
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(self.left.lerp(other.left, t), self.right.lerp(other.right, t))
    }

    pub fn width(&self) -> f32 {
        self.left.distance(self.right)
    }
}

/// All seams of one joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointSections {
    /// Seam at the joint itself.
    pub current: CrossSection,
    /// Parent-side seam, biased upwards.
    pub up: CrossSection,
    /// Parent-side seam, equal to the parent's current seam.
    pub base: CrossSection,
    /// Parent-side seam, biased downwards.
    pub down: CrossSection,
}

/// Compute seams for every joint, indexed like `skeleton.joints`.
///
/// Parents always precede their children in creation order, so one forward
/// pass sees every parent finished before its children.
pub fn build_sections(skeleton: &Skeleton, base_thickness: f32) -> Vec<JointSections> {
    let root = skeleton.root().world_position;
    let mut sections = vec![JointSections::default(); skeleton.len()];

    for joint in &skeleton.joints {
        let thickness = base_thickness * skeleton.scale_at(joint.depth);
        let position = joint.world_position - root;
        let current = CrossSection::around(position, joint.world_rotation, thickness, 0.0);

        let Some(parent_index) = joint.parent else {
            sections[joint.index] = JointSections {
                current,
                up: current,
                base: current,
                down: current,
            };
            continue;
        };

        let parent = &skeleton.joints[parent_index];
        let parent_current = sections[parent_index].current;

        sections[joint.index] = if joint.depth <= 1 {
            JointSections {
                current,
                up: parent_current,
                base: parent_current,
                down: parent_current,
            }
        } else {
            let thickness = base_thickness * skeleton.scale_at(parent.depth);
            let at = parent.world_position - root;
            let own = joint.world_rotation;
            let inherited = parent.world_rotation;

            let up = CrossSection::around(at, own, thickness, 0.5)
                .lerp(CrossSection::around(at, inherited, thickness, 0.5), BLEND_UP);
            let down = CrossSection::around(at, own, thickness, -0.5)
                .lerp(CrossSection::around(at, inherited, thickness, -0.5), BLEND_DOWN);

            JointSections {
                current,
                up,
                base: parent_current,
                down,
            }
        };
    }

    sections
}
