//! Pointer tracking and click handling.
//!
//! Handlers only record pointer state or queue a one-shot impulse; they never
//! touch particles directly. The integrator consumes both on the next tick,
//! except for click ripples which the engine applies immediately.

use log::trace;

use crate::field::ParticleField;
use crate::force;
use glam::Vec2;

/// Transient pointer state owned by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Last known pointer position in surface coordinates.
    pub position: Vec2,
    /// Whether the pointer is currently over the surface.
    pub active: bool,
    /// Vortex centre set by the last click in vortex mode, until the pointer leaves.
    pub vortex_anchor: Option<Vec2>,
}

impl PointerState {
    /// Record a pointer move. Moving over the surface activates the pointer.
    pub fn on_move(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.active = true;
    }

    /// The pointer left the surface: deactivate and drop the vortex anchor.
    pub fn on_leave(&mut self) {
        self.active = false;
        self.vortex_anchor = None;
    }

    /// Handle a click.
    ///
    /// In vortex mode the click sets the anchor and no impulse is produced.
    /// Otherwise the returned ripple should be applied once to the field.
    pub fn on_click(&mut self, x: f32, y: f32, vortex_mode: bool) -> Option<ClickImpulse> {
        self.on_move(x, y);
        if vortex_mode {
            trace!("vortex anchor set at ({x}, {y})");
            self.vortex_anchor = Some(self.position);
            None
        } else {
            Some(ClickImpulse {
                center: self.position,
            })
        }
    }

    /// Point the vortex swirls around: the anchor if set, else the pointer.
    pub fn vortex_center(&self) -> Vec2 {
        self.vortex_anchor.unwrap_or(self.position)
    }
}

/// A click ripple waiting to be applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickImpulse {
    pub center: Vec2,
}

impl ClickImpulse {
    /// Add the ripple to every live particle's velocity.
    pub fn apply(self, field: &mut ParticleField, click_strength: f32) {
        for id in field.ids() {
            if field.is_dead(id) {
                continue;
            }
            let offset = field.position(id) - self.center;
            field.push_velocity(id, force::click(offset, click_strength));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Origin;
    use particlefx_core::Rgba;

    #[test]
    fn test_move_and_leave() {
        let mut pointer = PointerState::default();
        assert!(!pointer.active);
        pointer.on_move(3.0, 4.0);
        assert!(pointer.active);
        assert_eq!(pointer.position, Vec2::new(3.0, 4.0));
        pointer.on_leave();
        assert!(!pointer.active);
    }

    #[test]
    fn test_vortex_click_sets_anchor_until_leave() {
        let mut pointer = PointerState::default();
        assert_eq!(pointer.on_click(10.0, 20.0, true), None);
        assert_eq!(pointer.vortex_anchor, Some(Vec2::new(10.0, 20.0)));
        pointer.on_move(50.0, 50.0);
        assert_eq!(pointer.vortex_center(), Vec2::new(10.0, 20.0));
        pointer.on_leave();
        assert_eq!(pointer.vortex_anchor, None);
    }

    #[test]
    fn test_ripple_click_pushes_outward_once() {
        let mut pointer = PointerState::default();
        let impulse = pointer.on_click(0.0, 0.0, false).unwrap();
        assert_eq!(pointer.vortex_anchor, None);

        let mut field = ParticleField::default();
        let id = field.push(
            Origin {
                position: Vec2::new(9.0, 0.0),
                color: Rgba::opaque(1, 1, 1),
            },
            Vec2::new(9.0, 0.0),
            Vec2::ZERO,
        );
        impulse.apply(&mut field, 100.0);
        let v = field.velocity(id);
        assert!((v.x - 1.0).abs() < 1e-5);
        assert_eq!(v.y, 0.0);
    }
}
