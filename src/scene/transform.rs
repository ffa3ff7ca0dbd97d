//! Cached transform node
//!
//! Tracks an object's placement as position, Euler rotation and scale, keeps
//! its local basis vectors in sync with the rotation, and lazily derives the
//! world matrix together with its inverse-transpose.
//!
//! # Example
//!
//! ```ignore
//! let mut node = TransformNode::new();
//!
//! node.set_position(Vec3::new(1.0, 0.0, 0.0));
//! node.rotate(0.0, std::f32::consts::FRAC_PI_2, 0.0);
//!
//! let world = node.world_matrix();                 // recomputes both matrices
//! let normals = node.world_inverse_transpose_matrix(); // served from the cache
//! ```

use std::cell::Cell;

use glam::{Mat4, Quat, Vec3};

/// Canonical basis the orientation is derived from.
const BASE_FORWARD: Vec3 = Vec3::Z;
const BASE_RIGHT: Vec3 = Vec3::X;
const BASE_UP: Vec3 = Vec3::Y;

/// Build the orientation quaternion for accumulated (pitch, yaw, roll) angles.
///
/// Roll about Z is applied first, then pitch about X, then yaw about Y.
#[must_use]
pub fn orientation_from_euler(rotation: Vec3) -> Quat {
    Quat::from_rotation_y(rotation.y)
        * Quat::from_rotation_x(rotation.x)
        * Quat::from_rotation_z(rotation.z)
}

// ============================================================================
// Transform Node
// ============================================================================

/// A scene node transform with cached world matrices.
///
/// Mutators only touch the source attributes and raise the dirty flag. The
/// first matrix read after a mutation refreshes the world matrix and the
/// world-inverse-transpose matrix together, so the two always describe the
/// same snapshot.
///
/// The caches live in `Cell`s so reads work through a shared reference.
/// The node is therefore `!Sync` and meant for single-threaded frame loops.
#[derive(Debug, Clone)]
pub struct TransformNode {
    /// Position in world space
    position: Vec3,
    /// Accumulated (pitch, yaw, roll) in radians
    rotation: Vec3,
    /// Per-axis scale
    scale: Vec3,

    forward: Vec3,
    right: Vec3,
    up: Vec3,

    world: Cell<Mat4>,
    world_inverse_transpose: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl TransformNode {
    /// Create an identity transform at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from position, rotation (pitch, yaw, roll) and scale.
    #[must_use]
    pub fn from_parts(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        let mut node = Self {
            position,
            rotation,
            scale,
            ..Self::default()
        };
        node.recalculate_orientation();
        node
    }

    // -------------------------------------------------------------------------
    // Accessors (never recompute)
    // -------------------------------------------------------------------------

    /// Get the position.
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Get the accumulated (pitch, yaw, roll) rotation.
    #[must_use]
    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Get the scale.
    #[must_use]
    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Local forward axis (+Z at zero rotation).
    #[must_use]
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Local right axis (+X at zero rotation).
    #[must_use]
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Local up axis (+Y at zero rotation).
    #[must_use]
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    // -------------------------------------------------------------------------
    // Setters
    // -------------------------------------------------------------------------

    /// Overwrite the position.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mark_dirty();
    }

    /// Overwrite the rotation. The basis vectors follow the new angles.
    #[inline]
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.recalculate_orientation();
        self.mark_dirty();
    }

    /// Overwrite the scale.
    #[inline]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.mark_dirty();
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Move along the world axes.
    #[inline]
    pub fn move_absolute(&mut self, delta: Vec3) {
        self.position += delta;
        self.mark_dirty();
    }

    /// Move along the node's own basis: `dx` forward, `dy` right, `dz` up.
    ///
    /// Uses the basis as of the last rotation change.
    #[inline]
    pub fn move_relative(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += self.forward * dx + self.right * dy + self.up * dz;
        self.mark_dirty();
    }

    /// Add to the accumulated rotation and rebuild the basis from the total.
    pub fn rotate(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.rotation += Vec3::new(pitch, yaw, roll);
        self.recalculate_orientation();
        self.mark_dirty();
    }

    /// Multiply the scale component-wise.
    #[inline]
    pub fn scale_by(&mut self, x: f32, y: f32, z: f32) {
        self.scale *= Vec3::new(x, y, z);
        self.mark_dirty();
    }

    fn recalculate_orientation(&mut self) {
        let orientation = orientation_from_euler(self.rotation);
        self.forward = orientation * BASE_FORWARD;
        self.right = orientation * BASE_RIGHT;
        self.up = orientation * BASE_UP;
    }

    // -------------------------------------------------------------------------
    // Derived matrices (cached)
    // -------------------------------------------------------------------------

    /// World matrix: scale, then rotate, then translate.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.refresh();
        self.world.get()
    }

    /// Inverse-transpose of the world matrix, for transforming normals.
    #[must_use]
    pub fn world_inverse_transpose_matrix(&self) -> Mat4 {
        self.refresh();
        self.world_inverse_transpose.get()
    }

    fn refresh(&self) {
        if !self.dirty.get() {
            return;
        }

        let world = Mat4::from_scale_rotation_translation(
            self.scale,
            orientation_from_euler(self.rotation),
            self.position,
        );
        self.world.set(world);
        self.world_inverse_transpose.set(world.inverse().transpose());
        self.dirty.set(false);
    }

    // -------------------------------------------------------------------------
    // Cache State
    // -------------------------------------------------------------------------

    /// Whether the next matrix read will recompute.
    #[must_use]
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    #[inline]
    fn mark_dirty(&self) {
        self.dirty.set(true);
    }
}

impl Default for TransformNode {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            forward: BASE_FORWARD,
            right: BASE_RIGHT,
            up: BASE_UP,
            world: Cell::new(Mat4::IDENTITY),
            world_inverse_transpose: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(true),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_default_is_identity_and_dirty() {
        let node = TransformNode::new();

        assert_eq!(node.position(), Vec3::ZERO);
        assert_eq!(node.rotation(), Vec3::ZERO);
        assert_eq!(node.scale(), Vec3::ONE);
        assert_eq!(node.forward(), Vec3::Z);
        assert_eq!(node.right(), Vec3::X);
        assert_eq!(node.up(), Vec3::Y);
        assert!(node.is_dirty());

        assert_eq!(node.world_matrix(), Mat4::IDENTITY);
        assert!(!node.is_dirty());
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let mut node = TransformNode::new();
        node.set_position(Vec3::new(3.0, -1.0, 2.5));
        node.rotate(0.3, 1.1, -0.4);
        node.set_scale(Vec3::new(1.5, 0.5, 2.0));

        let first = node.world_matrix();
        assert!(!node.is_dirty());
        let second = node.world_matrix();

        assert_eq!(first.to_cols_array(), second.to_cols_array());
        assert!(!node.is_dirty());
    }

    #[test]
    fn test_mutation_triggers_recompute() {
        let mut node = TransformNode::new();
        let _ = node.world_matrix();

        node.set_position(Vec3::new(5.0, 0.0, 0.0));
        assert!(node.is_dirty());
        assert_eq!(
            node.world_matrix().w_axis.truncate(),
            Vec3::new(5.0, 0.0, 0.0)
        );

        node.move_absolute(Vec3::new(0.0, 2.0, 0.0));
        assert!(node.is_dirty());
        assert_eq!(
            node.world_matrix().w_axis.truncate(),
            Vec3::new(5.0, 2.0, 0.0)
        );

        node.scale_by(3.0, 1.0, 1.0);
        assert!(node.is_dirty());
        let world = node.world_matrix();
        assert!(approx_vec(world.transform_vector3(Vec3::X), Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_every_mutator_marks_dirty() {
        let mut node = TransformNode::new();
        let mutations: [fn(&mut TransformNode); 7] = [
            |n| n.set_position(Vec3::ONE),
            |n| n.set_rotation(Vec3::new(0.1, 0.2, 0.3)),
            |n| n.set_scale(Vec3::splat(2.0)),
            |n| n.move_absolute(Vec3::X),
            |n| n.move_relative(1.0, 0.0, 0.0),
            |n| n.rotate(0.0, 0.5, 0.0),
            |n| n.scale_by(1.0, 2.0, 1.0),
        ];

        for mutate in mutations {
            let _ = node.world_matrix();
            assert!(!node.is_dirty());
            mutate(&mut node);
            assert!(node.is_dirty());
        }
    }

    #[test]
    fn test_translation_only_world_matrix() {
        let mut node = TransformNode::new();
        node.set_position(Vec3::new(1.0, 0.0, 0.0));

        let world = node.world_matrix();

        assert_eq!(world, Mat4::from_translation(Vec3::X));
        assert!(approx_vec(world.transform_point3(Vec3::ZERO), Vec3::X));
    }

    #[test]
    fn test_scale_rotate_translate_order() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(2.0, 1.0, 1.0));
        node.rotate(0.0, FRAC_PI_2, 0.0);
        node.set_position(Vec3::new(0.0, 0.0, 10.0));

        // (1,0,0) scales to (2,0,0), yaws to (0,0,-2), then shifts by +10 in z
        let point = node.world_matrix().transform_point3(Vec3::X);
        assert!(approx_vec(point, Vec3::new(0.0, 0.0, 8.0)));
    }

    #[test]
    fn test_inverse_transpose_differs_under_non_uniform_scale() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(2.0, 1.0, 1.0));

        let world = node.world_matrix();
        let inverse_transpose = node.world_inverse_transpose_matrix();

        let as_point_axis = world.transform_vector3(Vec3::X);
        let as_normal = inverse_transpose.transform_vector3(Vec3::X);

        assert!(approx_vec(as_point_axis, Vec3::new(2.0, 0.0, 0.0)));
        assert!(approx_vec(as_normal, Vec3::new(0.5, 0.0, 0.0)));
        assert!(!approx_vec(as_point_axis, as_normal));
    }

    #[test]
    fn test_yaw_quarter_turn_moves_along_new_forward() {
        let mut node = TransformNode::new();
        let old_right = node.right();

        node.rotate(0.0, FRAC_PI_2, 0.0);
        assert!(approx_vec(node.forward(), old_right));

        node.move_relative(1.0, 0.0, 0.0);
        assert!(approx_vec(node.position(), Vec3::X));
        assert!(!approx_vec(node.position(), Vec3::Z));
    }

    #[test]
    fn test_move_relative_uses_all_axes() {
        let mut node = TransformNode::new();
        node.move_relative(1.0, 2.0, 3.0);

        assert!(approx_vec(node.position(), Vec3::new(2.0, 3.0, 1.0)));
    }

    #[test]
    fn test_half_turn_yaw_faces_negative_z() {
        let mut node = TransformNode::new();
        node.rotate(0.0, PI, 0.0);

        assert!(approx_vec(node.forward(), Vec3::NEG_Z));
        assert!(approx_vec(node.right(), Vec3::NEG_X));
        assert!(approx_vec(node.up(), Vec3::Y));
    }

    #[test]
    fn test_rotation_accumulates() {
        let mut node = TransformNode::new();
        node.rotate(0.0, FRAC_PI_2, 0.0);
        node.rotate(0.0, FRAC_PI_2, 0.0);

        assert!(approx_vec(node.rotation(), Vec3::new(0.0, PI, 0.0)));
        assert!(approx_vec(node.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_pitch_tilts_forward_down() {
        let mut node = TransformNode::new();
        node.rotate(FRAC_PI_2, 0.0, 0.0);

        assert!(approx_vec(node.forward(), Vec3::NEG_Y));
        assert!(approx_vec(node.up(), Vec3::Z));
    }

    #[test]
    fn test_inverse_transpose_read_refreshes_world_too() {
        let mut node = TransformNode::new();
        let _ = node.world_matrix();

        node.set_position(Vec3::new(4.0, 5.0, 6.0));
        node.rotate(0.2, 0.4, 0.6);
        node.scale_by(2.0, 3.0, 0.5);

        let inverse_transpose = node.world_inverse_transpose_matrix();
        assert!(!node.is_dirty());

        let world = node.world_matrix();
        let expected = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 3.0, 0.5),
            orientation_from_euler(Vec3::new(0.2, 0.4, 0.6)),
            Vec3::new(4.0, 5.0, 6.0),
        );

        assert!(world.abs_diff_eq(expected, EPSILON));
        assert!(inverse_transpose.abs_diff_eq(world.inverse().transpose(), EPSILON));
    }

    #[test]
    fn test_scale_by_multiplies_scale_not_rotation() {
        let mut node = TransformNode::new();
        node.set_scale(Vec3::new(2.0, 2.0, 2.0));
        node.scale_by(0.5, 2.0, 3.0);

        assert_eq!(node.scale(), Vec3::new(1.0, 4.0, 6.0));
        assert_eq!(node.rotation(), Vec3::ZERO);
    }

    #[test]
    fn test_set_rotation_refreshes_basis() {
        let mut node = TransformNode::new();
        node.set_rotation(Vec3::new(0.0, PI, 0.0));

        assert!(approx_vec(node.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_from_parts() {
        let node = TransformNode::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, FRAC_PI_2, 0.0),
            Vec3::splat(2.0),
        );

        assert!(node.is_dirty());
        assert!(approx_vec(node.forward(), Vec3::X));
        assert_eq!(node.world_matrix().w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }
}
