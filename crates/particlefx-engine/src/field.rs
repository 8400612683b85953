//! Particle storage.
//!
//! The field keeps particles and their origins in parallel arrays. Index `i`
//! in every array belongs to the same particle for the lifetime of the field;
//! a new field is built whenever the image, stride or surface size changes.

use particlefx_core::Rgba;

use glam::Vec2;

/// Stable index of a particle inside a [`ParticleField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub usize);

/// The pixel a particle was spawned from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    /// Raster position of the source pixel.
    pub position: Vec2,
    /// Source pixel color.
    pub color: Rgba,
}

/// Struct-of-arrays particle arena.
#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    origins: Vec<Origin>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    hidden: Vec<bool>,
    /// Reserved for permanent removal; nothing sets it today.
    dead: Vec<bool>,
}

impl ParticleField {
    /// Create an empty field with room for `capacity` particles.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            origins: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            hidden: Vec::with_capacity(capacity),
            dead: Vec::with_capacity(capacity),
        }
    }

    /// Append a particle paired with its origin.
    pub fn push(&mut self, origin: Origin, position: Vec2, velocity: Vec2) -> ParticleId {
        let id = ParticleId(self.origins.len());
        self.origins.push(origin);
        self.positions.push(position);
        self.velocities.push(velocity);
        self.hidden.push(false);
        self.dead.push(false);
        id
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Iterate over every particle handle in order.
    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + use<> {
        (0..self.len()).map(ParticleId)
    }

    pub fn origin(&self, id: ParticleId) -> Origin {
        self.origins[id.0]
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn position(&self, id: ParticleId) -> Vec2 {
        self.positions[id.0]
    }

    pub fn set_position(&mut self, id: ParticleId, position: Vec2) {
        self.positions[id.0] = position;
    }

    pub fn velocity(&self, id: ParticleId) -> Vec2 {
        self.velocities[id.0]
    }

    pub fn set_velocity(&mut self, id: ParticleId, velocity: Vec2) {
        self.velocities[id.0] = velocity;
    }

    /// Add `delta` to a particle's velocity.
    pub fn push_velocity(&mut self, id: ParticleId, delta: Vec2) {
        self.velocities[id.0] += delta;
    }

    pub fn is_hidden(&self, id: ParticleId) -> bool {
        self.hidden[id.0]
    }

    pub fn set_hidden(&mut self, id: ParticleId, hidden: bool) {
        self.hidden[id.0] = hidden;
    }

    pub fn is_dead(&self, id: ParticleId) -> bool {
        self.dead[id.0]
    }

    /// Clear both the hidden and dead flags.
    pub fn revive(&mut self, id: ParticleId) {
        self.hidden[id.0] = false;
        self.dead[id.0] = false;
    }

    /// Distance between a particle and its origin.
    pub fn distance_to_origin(&self, id: ParticleId) -> f32 {
        (self.origins[id.0].position - self.positions[id.0]).length()
    }

    /// Number of particles that would currently be drawn.
    pub fn visible_count(&self) -> usize {
        self.hidden
            .iter()
            .zip(&self.dead)
            .filter(|&(&hidden, &dead)| !hidden && !dead)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(x: f32, y: f32) -> Origin {
        Origin {
            position: Vec2::new(x, y),
            color: Rgba::opaque(255, 255, 255),
        }
    }

    #[test]
    fn test_push_keeps_arrays_aligned() {
        let mut field = ParticleField::with_capacity(2);
        let a = field.push(origin(1.0, 2.0), Vec2::new(5.0, 5.0), Vec2::ZERO);
        let b = field.push(origin(3.0, 4.0), Vec2::new(3.0, 4.0), Vec2::new(1.0, 0.0));
        assert_eq!(field.len(), 2);
        assert_eq!(a, ParticleId(0));
        assert_eq!(b, ParticleId(1));
        assert_eq!(field.origin(b).position, Vec2::new(3.0, 4.0));
        assert_eq!(field.velocity(b), Vec2::new(1.0, 0.0));
        assert_eq!(field.distance_to_origin(a), 5.0);
        assert_eq!(field.distance_to_origin(b), 0.0);
    }

    #[test]
    fn test_flags() {
        let mut field = ParticleField::default();
        let id = field.push(origin(0.0, 0.0), Vec2::ZERO, Vec2::ZERO);
        assert!(!field.is_hidden(id));
        assert!(!field.is_dead(id));
        field.set_hidden(id, true);
        assert_eq!(field.visible_count(), 0);
        field.revive(id);
        assert_eq!(field.visible_count(), 1);
    }
}
