//! Joint tree decoded from a symbol sequence.
//!
//! Joints live in a flat arena ([`Skeleton::joints`]) addressed by their
//! creation index. A joint owns the list of its children's indices and keeps
//! its parent as a plain index, so the tree has no ownership cycles and the
//! whole thing is released by dropping the skeleton.

use std::fmt;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlantConfig;
use crate::grammar::{GENERATE, GROW_FORWARD, POP, PUSH, TURN_LEFT, TURN_RIGHT};
use crate::math::{euler_degrees, lerp, wrap_angles};
use crate::random::XorShift128;

/// Role of a joint in the skeleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// The single root at index 0.
    Origin,
    /// A grown segment (`F` or `G`).
    Branch,
    /// Cap synthesized at the end of a branch.
    Terminal,
    /// Sprite anchor synthesized under every terminal.
    Leaf,
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Branch => write!(f, "branch"),
            Self::Terminal => write!(f, "terminal"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

/// A node of the skeleton; doubles as a skinning bone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Creation order; also the bone index.
    pub index: usize,
    pub depth: u32,
    pub kind: JointKind,
    /// Euler angles (degrees) accumulated since the previous growth step.
    pub local_rotation: Vec3,
    /// Distance travelled along the local up axis from the parent.
    pub grow_length: f32,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Position relative to the parent's frame.
    pub local_position: Vec3,
    /// Position in the skeleton's root frame.
    pub world_position: Vec3,
    /// Rotation in the skeleton's root frame.
    pub world_rotation: Quat,
}

impl Joint {
    fn origin() -> Self {
        Self {
            index: 0,
            depth: 0,
            kind: JointKind::Origin,
            local_rotation: Vec3::ZERO,
            grow_length: 0.0,
            parent: None,
            children: Vec::new(),
            local_position: Vec3::ZERO,
            world_position: Vec3::ZERO,
            world_rotation: Quat::IDENTITY,
        }
    }

    /// Joint-to-root transform.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.world_rotation, self.world_position)
    }

    /// Root-to-joint transform, used as the skinning bind pose.
    pub fn bind_pose(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// Display name such as `branch_3`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.kind, self.index)
    }

    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

/// Decoded joint tree plus the global taper rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
    /// Deepest terminal depth seen while decoding.
    pub max_depth: u32,
    /// Thickness lost per depth level: `(1 - tip_scale) / max_depth`.
    pub depth_scale: f32,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn root(&self) -> &Joint {
        &self.joints[0]
    }

    pub fn get(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Index of the `generations`-th ancestor (1 = parent), if it exists.
    pub fn ancestor(&self, index: usize, generations: usize) -> Option<usize> {
        let mut current = index;
        for _ in 0..generations {
            current = self.joints[current].parent?;
        }
        Some(current)
    }

    /// Thickness multiplier for a depth. Leaves sit one level below the
    /// deepest terminal, so depth is clamped to keep the result in
    /// `[tip_scale, 1]`.
    pub fn scale_at(&self, depth: u32) -> f32 {
        1.0 - self.depth_scale * depth.min(self.max_depth) as f32
    }

    pub fn count(&self, kind: JointKind) -> usize {
        self.joints.iter().filter(|j| j.kind == kind).count()
    }
}

/// Build the joint tree for `dna`.
///
/// Growth lengths and turn angles draw from `rng`, so the decoder must run
/// right after the grammar expansion on the same source to reproduce a plant.
pub fn decode(dna: &str, config: &PlantConfig, rng: &mut XorShift128) -> Skeleton {
    let symbols: Vec<char> = dna.chars().collect();
    let mut decoder = Decoder {
        config,
        rng,
        symbols: &symbols,
        cursor: 0,
        joints: vec![Joint::origin()],
        max_depth: 0,
    };
    decoder.walk(0, Vec3::ZERO);

    let max_depth = decoder.max_depth;
    let joints = decoder.joints;
    let depth_scale = if max_depth > 0 {
        (1.0 - config.tip_scale) / max_depth as f32
    } else {
        0.0
    };

    debug!(joints = joints.len(), max_depth, depth_scale, "decoded skeleton");

    Skeleton {
        joints,
        max_depth,
        depth_scale,
    }
}

struct Scope {
    current: usize,
    angle: Vec3,
    prev: Option<char>,
}

struct Decoder<'a> {
    config: &'a PlantConfig,
    rng: &'a mut XorShift128,
    symbols: &'a [char],
    cursor: usize,
    joints: Vec<Joint>,
    max_depth: u32,
}

impl Decoder<'_> {
    /// Walk the symbols with an explicit stack of open scopes. `[` opens a
    /// scope at the current joint, `]` closes the innermost one, and a `]`
    /// with no open scope ends decoding.
    fn walk(&mut self, start: usize, angle: Vec3) {
        let mut scopes = vec![Scope {
            current: start,
            angle,
            prev: None,
        }];

        while let Some(&symbol) = self.symbols.get(self.cursor) {
            self.cursor += 1;
            let Some(scope) = scopes.last_mut() else {
                return;
            };
            match symbol {
                GROW_FORWARD | GENERATE => {
                    let t = self.rng.unit();
                    let length = lerp(self.config.dist_min, self.config.dist_max, t);
                    scope.current =
                        self.add_joint(scope.current, scope.angle, JointKind::Branch, length);
                    scope.angle = Vec3::ZERO;
                }
                PUSH => {
                    let inner = Scope {
                        current: scope.current,
                        angle: scope.angle,
                        prev: None,
                    };
                    scope.angle = Vec3::ZERO;
                    scope.prev = Some(PUSH);
                    scopes.push(inner);
                    continue;
                }
                POP => {
                    let current = scope.current;
                    scopes.pop();
                    self.close_tip(current);
                    if scopes.is_empty() {
                        return;
                    }
                    continue;
                }
                TURN_LEFT => scope.angle = wrap_angles(scope.angle + self.turn()),
                TURN_RIGHT => scope.angle = wrap_angles(scope.angle - self.turn()),
                _ => {}
            }
            scope.prev = Some(symbol);
        }

        // Unterminated scopes close innermost first.
        while let Some(scope) = scopes.pop() {
            if scope.prev != Some(PUSH) {
                self.close_tip(scope.current);
            }
        }
    }

    fn turn(&mut self) -> Vec3 {
        let t = self.rng.unit();
        self.config.angle_min.lerp(self.config.angle_max, t)
    }

    /// Give a childless joint its terminal cap and leaf.
    fn close_tip(&mut self, joint: usize) {
        if !self.joints[joint].is_tip() {
            return;
        }
        let terminal = self.add_joint(joint, Vec3::ZERO, JointKind::Terminal, 0.0);
        self.max_depth = self.max_depth.max(self.joints[terminal].depth);
        self.add_joint(terminal, Vec3::ZERO, JointKind::Leaf, 0.0);
    }

    fn add_joint(&mut self, parent: usize, angle: Vec3, kind: JointKind, length: f32) -> usize {
        let index = self.joints.len();
        let (depth, parent_position, parent_rotation) = {
            let p = &self.joints[parent];
            (p.depth + 1, p.world_position, p.world_rotation)
        };

        let local = euler_degrees(angle);
        let local_position = local * Vec3::Y * length;

        self.joints.push(Joint {
            index,
            depth,
            kind,
            local_rotation: angle,
            grow_length: length,
            parent: Some(parent),
            children: Vec::new(),
            local_position,
            world_position: parent_position + parent_rotation * local_position,
            world_rotation: parent_rotation * local,
        });
        self.joints[parent].children.push(index);
        index
    }
}
