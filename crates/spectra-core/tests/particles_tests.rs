// Integration tests for the particle engine and the sacred-geometry overlay.

use glam::Vec3;
use spectra_core::constants::{FIXED_STEP_SEC, TRAIL_LENGTH};
use spectra_core::*;

fn resolve(name: &str, overrides: PresetOverrides) -> VisualPreset {
    PresetResolver::new().resolve(name, &overrides).unwrap()
}

fn single_system() -> VisualPreset {
    resolve(
        "default",
        PresetOverrides {
            particle_count: Some(5_000),
            color_palette: Some(vec![0x4444ff]),
            ..Default::default()
        },
    )
}

fn loud() -> FrequencyBands {
    let mut bands = FrequencyBands::ZERO;
    for band in Band::ALL {
        bands.set(band, 1.0);
    }
    bands
}

#[test]
fn default_preset_builds_three_systems_of_eight_thousand() {
    let mut engine = ParticleSystemEngine::new(1);
    assert_eq!(engine.state(), Lifecycle::Uninitialized);
    engine.activate(&resolve("default", PresetOverrides::default()));
    assert_eq!(engine.state(), Lifecycle::Active);
    assert_eq!(engine.generation(), 1);
    assert_eq!(engine.systems().len(), 3);
    for system in engine.systems() {
        assert_eq!(system.len(), 8_000);
        assert_eq!(system.state(), Lifecycle::Active);
        assert_eq!(system.trails().len(), 8_000 * TRAIL_LENGTH * 3);
    }
    assert_eq!(engine.particle_count(), 24_000);
    assert_eq!(engine.overlay().map(|o| o.kind), Some(GeometryKind::Default));
}

#[test]
fn systems_map_to_bands_by_palette_index() {
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&resolve("default", PresetOverrides::default()));
    let bands: Vec<Band> = engine.systems().iter().map(|s| s.band()).collect();
    assert_eq!(bands, vec![Band::SubBass, Band::Bass, Band::Mid]);
    let colors: Vec<u32> = engine.systems().iter().map(|s| s.color()).collect();
    assert_eq!(colors, vec![0x4444ff, 0xff4444, 0x44ff44]);
}

#[test]
fn spawn_state_respects_seeding_ranges() {
    let mut engine = ParticleSystemEngine::new(7);
    engine.activate(&single_system());
    let system = &engine.systems()[0];
    for p in 0..system.len() {
        assert!(system.position(p).length() <= 10.0 + 1e-4);
        assert_eq!(system.position(p), system.initial_position(p));
        for slot in 0..TRAIL_LENGTH {
            assert_eq!(system.trail_point(p, slot), system.initial_position(p));
        }
        assert!((1.0..=3.0).contains(&system.orbit_radius()[p]));
        assert!((0.5..=2.0).contains(&system.orbit_speed()[p]));
        assert!((0.0..std::f32::consts::TAU).contains(&system.orbit_phase()[p]));
    }
    assert!(system.velocities().iter().all(|v| v.abs() <= 0.01));
}

#[test]
fn same_seed_reproduces_a_generation() {
    let preset = single_system();
    let mut a = ParticleSystemEngine::new(99);
    let mut b = ParticleSystemEngine::new(99);
    a.activate(&preset);
    b.activate(&preset);
    assert_eq!(a.systems()[0].positions(), b.systems()[0].positions());

    let mut c = ParticleSystemEngine::new(100);
    c.activate(&preset);
    assert_ne!(a.systems()[0].positions(), c.systems()[0].positions());
}

#[test]
fn silence_keeps_particles_in_place_and_fills_trails() {
    let preset = single_system();
    let mut engine = ParticleSystemEngine::new(3);
    engine.activate(&preset);
    let before = engine.systems()[0].positions().to_vec();
    engine.update(1.0, &FrequencyBands::ZERO, &preset);
    let system = &engine.systems()[0];
    assert_eq!(system.positions(), &before[..]);
    assert_eq!(system.trail_point(0, 0), system.position(0));
}

#[test]
fn trail_shifts_one_slot_per_frame() {
    let preset = single_system();
    let mut engine = ParticleSystemEngine::new(5);
    engine.activate(&preset);
    let mut bands = FrequencyBands::ZERO;
    bands.sub_bass = 0.05;

    let mut history = Vec::new();
    for frame in 1..=3 {
        engine.update(frame as f32 / 60.0, &bands, &preset);
        history.push(engine.systems()[0].trail_point(0, 0));
    }
    let system = &engine.systems()[0];
    assert_eq!(system.trail_point(0, 0), history[2]);
    assert_eq!(system.trail_point(0, 1), history[1]);
    assert_eq!(system.trail_point(0, 2), history[0]);
    assert_eq!(system.trail_point(0, 3), system.initial_position(0));
}

#[test]
fn escaped_particles_respawn_at_their_initial_position() {
    let preset = single_system();
    let bands = loud();
    let mut engine = ParticleSystemEngine::new(11);
    engine.activate(&preset);

    let mut respawns = 0;
    for frame in 1..=30 {
        let time = frame as f32 / 60.0;
        let before = engine.systems()[0].clone();
        engine.update(time, &bands, &preset);
        let after = &engine.systems()[0];
        for p in 0..after.len() {
            let angle = time * before.orbit_speed()[p] + before.orbit_phase()[p];
            let orbit = before.orbit_radius()[p];
            let velocity = Vec3::from_slice(&before.velocities()[p * 3..p * 3 + 3]);
            let mut expected = before.position(p);
            expected += velocity * 1.0 * 2.0 + Vec3::new(angle.cos() * orbit, angle.sin() * orbit, 0.0);

            assert!(after.trail_point(p, 0).distance(expected) < 1e-4);
            if expected.length() > 15.0 {
                respawns += 1;
                assert_eq!(after.position(p), after.initial_position(p));
            } else {
                assert!(after.position(p).distance(expected) < 1e-4);
            }
            assert!(after.position(p).length() <= 15.0 + 1e-3);
        }
    }
    assert!(respawns > 0, "no particle escaped");
}

#[test]
fn later_systems_rotate_faster() {
    let preset = resolve("vortex", PresetOverrides::default());
    let mut engine = ParticleSystemEngine::new(2);
    engine.activate(&preset);
    for frame in 0..10 {
        engine.update(frame as f32 / 60.0, &FrequencyBands::ZERO, &preset);
    }
    let rs = preset.rotation_speed;
    for (i, system) in engine.systems().iter().enumerate() {
        let k = (i + 1) as f32;
        assert!((system.rotation().y - rs * k * 10.0).abs() < 1e-6);
        assert!((system.rotation().x - rs * 0.5 * k * 10.0).abs() < 1e-6);
    }
    let systems = engine.systems();
    assert!(systems[2].rotation().y > systems[0].rotation().y);
}

#[test]
fn empty_palette_creates_no_systems() {
    let preset = resolve(
        "default",
        PresetOverrides {
            color_palette: Some(Vec::new()),
            ..Default::default()
        },
    );
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    assert!(engine.systems().is_empty());
    engine.update(0.1, &loud(), &preset);
    assert_eq!(engine.state(), Lifecycle::Active);
}

#[test]
fn zero_particles_per_system_still_creates_empty_systems() {
    let preset = resolve(
        "default",
        PresetOverrides {
            particle_count: Some(5_000),
            performance_mode: Some(true),
            color_palette: Some(vec![0x112233; 3_000]),
            ..Default::default()
        },
    );
    assert_eq!(preset.particles_per_system(), 0);
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    assert_eq!(engine.systems().len(), 3_000);
    assert!(engine.systems().iter().all(|s| s.is_empty()));
    assert_eq!(engine.systems()[1].band(), Band::Bass);
    engine.update(0.1, &loud(), &preset);
}

#[test]
fn reactivation_replaces_the_generation() {
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&resolve("default", PresetOverrides::default()));
    engine.activate(&resolve("sacredFlower", PresetOverrides::default()));
    assert_eq!(engine.generation(), 2);
    assert_eq!(engine.systems().len(), 3);
    assert_eq!(engine.systems()[0].len(), 15_000);
    assert_eq!(engine.overlay().map(|o| o.kind), Some(GeometryKind::Flower));
}

#[test]
fn shutdown_disposes_and_ignores_later_calls() {
    let preset = single_system();
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    engine.shutdown();
    assert_eq!(engine.state(), Lifecycle::Disposed);
    assert!(engine.systems().is_empty());

    engine.update(1.0, &loud(), &preset);
    engine.activate(&preset);
    assert!(engine.systems().is_empty());
    assert_eq!(engine.generation(), 1);
}

#[test]
fn update_before_activation_is_a_no_op() {
    let mut engine = ParticleSystemEngine::new(1);
    engine.update(1.0, &loud(), &single_system());
    assert_eq!(engine.state(), Lifecycle::Uninitialized);
    assert_eq!(engine.particle_count(), 0);
}

#[test]
fn color_randomization_jitters_system_colors() {
    let preset = resolve(
        "default",
        PresetOverrides {
            color_palette: Some(vec![0x808080, 0x808080]),
            randomization: Some(RandomizationOverrides {
                enable_color_randomization: Some(true),
                random_seed: Some(42),
                intensity_factor: Some(1.0),
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    assert_eq!(engine.systems()[0].color(), 0x867C95);
    assert_ne!(engine.systems()[1].color(), 0x808080);
}

#[test]
fn particle_randomization_offsets_spawn_points() {
    let plain = single_system();
    let jittered = PresetResolver::new().update(
        &plain,
        &PresetOverrides {
            randomization: Some(RandomizationOverrides {
                enable_particle_randomization: Some(true),
                random_seed: Some(3),
                intensity_factor: Some(1.0),
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    let mut a = ParticleSystemEngine::new(8);
    let mut b = ParticleSystemEngine::new(8);
    a.activate(&plain);
    b.activate(&jittered);
    let (sa, sb) = (&a.systems()[0], &b.systems()[0]);
    assert_ne!(sa.positions(), sb.positions());
    for p in 0..sa.len() {
        let offset = sb.position(p) - sa.position(p);
        assert!(offset.abs().max_element() <= 1.0 + 1e-5);
        assert_eq!(sb.position(p), sb.initial_position(p));
    }
    // placement RNG is untouched by the jitter
    assert_eq!(sa.velocities(), sb.velocities());
}

#[test]
fn overlay_pulses_with_the_driving_band() {
    let preset = resolve("sacredFlower", PresetOverrides::default());
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    let mut bands = FrequencyBands::ZERO;
    bands.sub_bass = 0.5;
    engine.update(0.0, &bands, &preset);
    let overlay = engine.overlay().unwrap();
    assert!((overlay.scale - 1.15).abs() < 1e-6);
    assert!((overlay.rotation.y - preset.rotation_speed).abs() < 1e-9);
    assert!((overlay.rotation.z - preset.geometry_rotation).abs() < 1e-9);
    assert_eq!(overlay.opacity, 0.6);
}

#[test]
fn neural_web_expands_on_strong_sub_bass() {
    let preset = resolve("default", PresetOverrides::default());
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    let mut bands = FrequencyBands::ZERO;
    bands.sub_bass = 0.9;
    bands.bass = 0.5;
    bands.mid = 0.25;
    engine.update(0.0, &bands, &preset);
    let overlay = engine.overlay().unwrap();
    assert_eq!(overlay.kind, GeometryKind::Default);
    assert!((overlay.scale - 1.74).abs() < 1e-5);
    assert!((overlay.opacity - 0.93).abs() < 1e-5);
    assert!((overlay.rotation.z - 0.25 * 0.02).abs() < 1e-7);
}

#[test]
fn overlay_settles_after_an_expansion() {
    let preset = resolve("cosmic", PresetOverrides::default());
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    let mut bands = FrequencyBands::ZERO;
    bands.sub_bass = 0.9;
    engine.update(0.0, &bands, &preset);
    let expanded = engine.overlay().unwrap().opacity;
    assert!((expanded - 0.93).abs() < 1e-5);

    engine.update(FIXED_STEP_SEC, &FrequencyBands::ZERO, &preset);
    let overlay = engine.overlay().unwrap();
    assert_eq!(overlay.opacity, 0.6);
    assert_eq!(overlay.scale, 1.0);
}

#[test]
fn reduced_motion_damps_overlay_animation() {
    let preset = resolve(
        "default",
        PresetOverrides {
            geometry_type: Some(GeometryKind::Default),
            reduced_motion: Some(true),
            ..Default::default()
        },
    );
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    let mut bands = FrequencyBands::ZERO;
    bands.sub_bass = 1.0;
    engine.update(0.0, &bands, &preset);
    let overlay = engine.overlay().unwrap();
    assert!((overlay.rotation.y - preset.rotation_speed * 0.3).abs() < 1e-9);
    assert!((overlay.scale - (1.0 + 0.6 * 0.3)).abs() < 1e-5);
    assert!((overlay.opacity - 0.8).abs() < 1e-5);
}

#[test]
fn overlay_hue_cycles_with_time() {
    let red = hsl_to_rgb(0.0, 0.8, 0.5);
    assert!((red[0] - 0.9).abs() < 1e-5 && (red[1] - 0.1).abs() < 1e-5 && (red[2] - 0.1).abs() < 1e-5);

    let preset = resolve("metatron", PresetOverrides::default());
    let mut engine = ParticleSystemEngine::new(1);
    engine.activate(&preset);
    engine.update(5.0, &FrequencyBands::ZERO, &preset);
    let half_turn = engine.overlay().unwrap().color_rgb;
    let expected = hsl_to_rgb(0.5, 0.8, 0.5);
    for c in 0..3 {
        assert!((half_turn[c] - expected[c]).abs() < 1e-5);
    }
    assert_eq!(rgb_from_hex(0xff0000), [1.0, 0.0, 0.0]);
}
