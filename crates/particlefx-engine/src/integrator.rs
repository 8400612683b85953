//! Per-tick motion update and the field-wide reset and explode commands.
//!
//! Integration is explicit Euler with one step per rendered frame. There is
//! no fixed timestep: a host that renders fewer frames moves particles more
//! slowly.

use std::f32::consts::TAU;

use particlefx_core::EngineConfig;
use rand::Rng;

use crate::field::ParticleField;
use crate::force;
use crate::interaction::PointerState;
use glam::Vec2;

/// Maximum offset from the origin after [`reset`], per axis.
pub const RESET_JITTER: f32 = 10.0;

/// Range of the random speed added by [`explode`].
pub const EXPLODE_MIN: f32 = 2.0;
pub const EXPLODE_MAX: f32 = 7.0;

/// Advance every live particle by one tick inside a `width × height` surface.
pub fn step<R: Rng + ?Sized>(
    field: &mut ParticleField,
    config: &EngineConfig,
    pointer: &PointerState,
    width: u32,
    height: u32,
    rng: &mut R,
) {
    let speed = force::global_speed(field.len());
    let active = pointer.active;
    let vortex_center = pointer.vortex_center();

    for id in field.ids() {
        if field.is_dead(id) {
            continue;
        }

        let home = field.origin(id).position;
        let mut position = field.position(id);
        let mut velocity = field.velocity(id);

        let jitter = Vec2::new(
            config.noise * (rng.random::<f32>() - 0.5),
            config.noise * (rng.random::<f32>() - 0.5),
        );
        velocity += force::restoring(home - position + jitter, speed);

        if active {
            velocity += if config.vortex_mode {
                force::vortex(position - vortex_center, config.mouse_force, speed)
            } else {
                force::pointer(position - pointer.position, config.mouse_force, speed)
            };
        }

        let distance = (home - position).length();
        velocity = velocity * force::damping_factor(config.gravity, speed, active, distance);

        if !velocity.is_finite() {
            velocity = Vec2::ZERO;
        }

        if force::should_snap(active, distance, velocity) {
            position = home;
            velocity = Vec2::ZERO;
        } else {
            position += velocity;
        }

        field.set_position(id, position);
        field.set_velocity(id, velocity);
        field.set_hidden(id, !in_bounds(position, width, height));
    }
}

/// Whether `position` lies inside `[0, width) × [0, height)`.
pub fn in_bounds(position: Vec2, width: u32, height: u32) -> bool {
    position.x >= 0.0
        && position.y >= 0.0
        && position.x < width as f32
        && position.y < height as f32
}

/// Scatter every particle to within [`RESET_JITTER`] of its origin and stop it.
pub fn reset<R: Rng + ?Sized>(field: &mut ParticleField, rng: &mut R) {
    for id in field.ids() {
        let home = field.origin(id).position;
        let offset = Vec2::new(
            rng.random_range(-RESET_JITTER..=RESET_JITTER),
            rng.random_range(-RESET_JITTER..=RESET_JITTER),
        );
        field.set_position(id, home + offset);
        field.set_velocity(id, Vec2::ZERO);
        field.revive(id);
    }
}

/// Add a random outward kick to every particle's velocity.
///
/// Positions are untouched and repeated calls accumulate.
pub fn explode<R: Rng + ?Sized>(field: &mut ParticleField, rng: &mut R) {
    for id in field.ids() {
        let angle = rng.random_range(0.0..TAU);
        let magnitude = rng.random_range(EXPLODE_MIN..EXPLODE_MAX);
        field.push_velocity(id, Vec2::from_angle(angle) * magnitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Origin;
    use particlefx_core::Rgba;
    use rand::{SeedableRng, rngs::StdRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            noise: 0.0,
            ..EngineConfig::default()
        }
    }

    fn grid_field(n: usize) -> ParticleField {
        let mut field = ParticleField::with_capacity(n * n);
        for y in 0..n {
            for x in 0..n {
                let home = Vec2::new(x as f32 * 4.0 + 2.0, y as f32 * 4.0 + 2.0);
                field.push(
                    Origin {
                        position: home,
                        color: Rgba::opaque(200, 200, 200),
                    },
                    home,
                    Vec2::ZERO,
                );
            }
        }
        field
    }

    #[test]
    fn test_single_particle_at_rest_snaps() {
        let mut field = ParticleField::default();
        let home = Vec2::new(5.0, 5.0);
        let id = field.push(
            Origin {
                position: home,
                color: Rgba::opaque(255, 255, 255),
            },
            home,
            Vec2::ZERO,
        );
        step(
            &mut field,
            &quiet_config(),
            &PointerState::default(),
            10,
            10,
            &mut rng(),
        );
        assert_eq!(field.position(id), home);
        assert_eq!(field.velocity(id), Vec2::ZERO);
    }

    #[test]
    fn test_disturbed_particle_settles_and_snaps() {
        let mut field = grid_field(10);
        let id = crate::field::ParticleId(0);
        field.set_velocity(id, Vec2::new(0.6, -0.4));
        let config = quiet_config();
        let pointer = PointerState::default();
        let home = field.origin(id).position;

        let mut rng = rng();
        let mut snapped = false;
        for _ in 0..2000 {
            step(&mut field, &config, &pointer, 40, 40, &mut rng);
            let v = field.velocity(id);
            if field.position(id) == home && v == Vec2::ZERO {
                snapped = true;
                break;
            }
        }
        assert!(snapped, "particle never came to rest");
    }

    #[test]
    fn test_speed_zero_field_does_not_go_nan() {
        let mut field = ParticleField::default();
        let id = field.push(
            Origin {
                position: Vec2::new(1.0, 1.0),
                color: Rgba::opaque(1, 1, 1),
            },
            Vec2::new(30.0, 30.0),
            Vec2::new(1.0, 1.0),
        );
        let pointer = PointerState {
            position: Vec2::new(30.0, 30.0),
            active: true,
            vortex_anchor: None,
        };
        for _ in 0..10 {
            step(&mut field, &EngineConfig::default(), &pointer, 64, 64, &mut rng());
        }
        assert!(field.position(id).is_finite());
        assert!(field.velocity(id).is_finite());
    }

    #[test]
    fn test_leaving_and_reentering_bounds_toggles_hidden() {
        let mut field = ParticleField::default();
        let id = field.push(
            Origin {
                position: Vec2::new(1.0, 1.0),
                color: Rgba::opaque(1, 1, 1),
            },
            Vec2::new(1.0, 1.0),
            Vec2::new(-3.0, 0.0),
        );
        let config = quiet_config();
        let pointer = PointerState::default();

        // One particle means zero speed and no damping: pure drift.
        step(&mut field, &config, &pointer, 8, 8, &mut rng());
        assert!(field.is_hidden(id));
        assert_eq!(field.position(id), Vec2::new(-2.0, 1.0));

        field.set_velocity(id, Vec2::new(4.0, 0.0));
        step(&mut field, &config, &pointer, 8, 8, &mut rng());
        assert!(!field.is_hidden(id));
        assert_eq!(field.position(id), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_pointer_pushes_particles_away() {
        let mut field = grid_field(10);
        let id = crate::field::ParticleId(55);
        let p = field.position(id);
        let pointer = PointerState {
            position: p - Vec2::new(3.0, 0.0),
            active: true,
            vortex_anchor: None,
        };
        step(&mut field, &quiet_config(), &pointer, 40, 40, &mut rng());
        assert!(field.velocity(id).x > 0.0);
    }

    #[test]
    fn test_vortex_spirals_around_anchor() {
        let mut field = grid_field(11);
        // Column 5, row 2: directly above the centre cell (5, 5).
        let id = crate::field::ParticleId(2 * 11 + 5);
        let anchor = field.origin(crate::field::ParticleId(5 * 11 + 5)).position;
        let pointer = PointerState {
            position: anchor,
            active: true,
            vortex_anchor: Some(anchor),
        };
        let config = EngineConfig {
            vortex_mode: true,
            ..quiet_config()
        };
        step(&mut field, &config, &pointer, 44, 44, &mut rng());
        let v = field.velocity(id);
        assert!(v.x > 0.0);
        assert!(v.y > 0.0);
    }

    fn assert_reset(field: &ParticleField) {
        for id in field.ids() {
            let offset = field.position(id) - field.origin(id).position;
            assert!(offset.x.abs() <= RESET_JITTER && offset.y.abs() <= RESET_JITTER);
            assert_eq!(field.velocity(id), Vec2::ZERO);
            assert!(!field.is_hidden(id));
            assert!(!field.is_dead(id));
        }
    }

    #[test]
    fn test_reset_scatters_within_bound() {
        let mut field = grid_field(6);
        explode(&mut field, &mut rng());
        reset(&mut field, &mut rng());
        assert_reset(&field);
    }

    #[test]
    fn test_reset_twice_after_particles_leave() {
        let mut field = grid_field(6);
        let mut rng = rng();
        explode(&mut field, &mut rng);
        for id in field.ids() {
            field.push_velocity(id, Vec2::new(-40.0, 0.0));
        }
        step(&mut field, &quiet_config(), &PointerState::default(), 24, 24, &mut rng);
        assert!(field.ids().all(|id| field.is_hidden(id)));

        reset(&mut field, &mut rng);
        assert_reset(&field);
        reset(&mut field, &mut rng);
        assert_reset(&field);
    }

    #[test]
    fn test_explode_accumulates() {
        let mut field = grid_field(4);
        let mut rng = rng();
        explode(&mut field, &mut rng);
        let first: Vec<Vec2> = field.ids().map(|id| field.velocity(id)).collect();

        // Replay the second kick on a resting field to know what it adds.
        let mut second = grid_field(4);
        explode(&mut second, &mut rng.clone());
        explode(&mut field, &mut rng);

        for id in field.ids() {
            let kick = second.velocity(id);
            assert!(kick.length() > EXPLODE_MIN - 1e-4 && kick.length() < EXPLODE_MAX + 1e-4);
            let expected = first[id.0] + kick;
            assert!((field.velocity(id) - expected).length() < 1e-5);
            assert_eq!(field.position(id), field.origin(id).position);
        }
    }
}
