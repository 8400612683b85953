//! Per-particle force contributions.
//!
//! Everything here returns a velocity delta. The integrator sums the deltas,
//! then applies [`damping_factor`] and [`should_snap`]. Each threshold is a
//! named constant so the settling and disturbed regimes can be checked in
//! isolation.

use glam::Vec2;

/// Below this distance the restoring pull is softened.
pub const SOFT_PULL_RADIUS: f32 = 5.0;
/// Pull reached at the edge of [`SOFT_PULL_RADIUS`].
pub const SOFT_PULL_MAX: f32 = 0.1;
/// Pull per unit of distance outside [`SOFT_PULL_RADIUS`].
pub const FAR_PULL_PER_UNIT: f32 = 0.02;

/// Within this distance of its origin an undisturbed particle gets the damping floor.
pub const SETTLE_RADIUS: f32 = 10.0;
/// Lowest damping factor used while settling.
pub const DAMPING_FLOOR: f32 = 0.8;

/// A settling particle closer than this to its origin may snap onto it.
pub const SNAP_DISTANCE: f32 = 1.0;
/// Both velocity components must be below this to snap.
pub const SNAP_VELOCITY: f32 = 0.1;

/// Fraction of the click force converted into velocity.
pub const CLICK_IMPULSE_SCALE: f32 = 0.1;
/// Inward pull of the vortex relative to its tangential push.
pub const VORTEX_INWARD: f32 = 0.1;

/// Global speed scalar for a field of `particle_count` particles.
///
/// Larger fields settle faster. Fields with zero or one particle would give a
/// non-positive or undefined logarithm, so they get a speed of zero.
pub fn global_speed(particle_count: usize) -> f32 {
    if particle_count <= 1 {
        return 0.0;
    }
    let speed = (particle_count as f32).ln() / 10.0;
    if speed.is_finite() { speed } else { 0.0 }
}

/// Magnitude of the restoring pull at `distance` from the (noisy) target.
pub fn restoring_magnitude(distance: f32) -> f32 {
    if distance < SOFT_PULL_RADIUS {
        SOFT_PULL_MAX * distance / SOFT_PULL_RADIUS
    } else {
        FAR_PULL_PER_UNIT * distance
    }
}

/// Velocity delta pulling a particle toward its origin.
///
/// `offset` is the vector from the particle to its origin with the noise
/// jitter already added.
pub fn restoring(offset: Vec2, speed: f32) -> Vec2 {
    let distance = offset.length();
    offset.normalize_or_zero() * (restoring_magnitude(distance) * speed)
}

/// Velocity delta pushing a particle away from the pointer.
///
/// `offset` points from the pointer to the particle. A negative `mouse_force`
/// attracts instead.
pub fn pointer(offset: Vec2, mouse_force: f32, speed: f32) -> Vec2 {
    let dist = offset.length();
    if dist <= 0.0 {
        return Vec2::ZERO;
    }
    let force = mouse_force / dist;
    offset.normalize_or_zero() * (force * speed)
}

/// Velocity delta swirling a particle around the vortex anchor.
///
/// `offset` points from the anchor to the particle. The tangential part turns
/// clockwise on a y-down surface; a small inward part draws the particle
/// toward the anchor so the motion spirals. Both parts are scaled by
/// `mouse_force * speed`, the same factor as the pointer force.
pub fn vortex(offset: Vec2, mouse_force: f32, speed: f32) -> Vec2 {
    let dist = offset.length();
    if dist <= 0.0 {
        return Vec2::ZERO;
    }
    let angle = offset.to_angle();
    let tangent = Vec2::from_angle(angle + std::f32::consts::FRAC_PI_2) * (1.0 / dist);
    let inward = offset.normalize_or_zero() * (-VORTEX_INWARD / dist);
    (tangent + inward) * (mouse_force * speed)
}

/// One-shot velocity delta from a click ripple.
///
/// `offset` points from the click to the particle.
pub fn click(offset: Vec2, click_strength: f32) -> Vec2 {
    let dist = offset.length();
    let force = click_strength / (dist + 1.0);
    offset.normalize_or_zero() * (force * CLICK_IMPULSE_SCALE)
}

/// Velocity multiplier for this tick.
///
/// `distance_to_origin` is the undisturbed geometric distance.
pub fn damping_factor(
    gravity: f32,
    speed: f32,
    pointer_active: bool,
    distance_to_origin: f32,
) -> f32 {
    let damping = 1.0 - gravity * speed;
    if !pointer_active && distance_to_origin < SETTLE_RADIUS {
        damping.max(DAMPING_FLOOR)
    } else {
        damping
    }
}

/// Whether a particle is close and slow enough to be placed on its origin.
pub fn should_snap(pointer_active: bool, distance_to_origin: f32, velocity: Vec2) -> bool {
    !pointer_active
        && distance_to_origin < SNAP_DISTANCE
        && velocity.x.abs() < SNAP_VELOCITY
        && velocity.y.abs() < SNAP_VELOCITY
}
