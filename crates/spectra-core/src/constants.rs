// Shared tuning constants for the simulation, geometry builders and scheduler.

// Frame pacing
pub const FIXED_STEP_SEC: f32 = 1.0 / 60.0; // simulation advance per frame

// Particle seeding
pub const SPAWN_RADIUS: f32 = 10.0; // particles start inside this sphere
pub const RESPAWN_RADIUS: f32 = 15.0; // beyond this a particle returns to its spawn point
pub const VELOCITY_JITTER: f32 = 0.01; // per-axis velocity range is [-j, j]
pub const ORBIT_RADIUS_MIN: f32 = 1.0;
pub const ORBIT_RADIUS_MAX: f32 = 3.0;
pub const ORBIT_SPEED_MIN: f32 = 0.5;
pub const ORBIT_SPEED_MAX: f32 = 2.0;
pub const VELOCITY_BAND_GAIN: f32 = 2.0; // how strongly the driving band pushes along velocity
pub const TRAIL_LENGTH: usize = 20; // positions remembered per particle
pub const SPAWN_JITTER_OFFSET: f32 = 1.0; // max spawn offset under particle randomization

// Preset scaling
pub const PERFORMANCE_PARTICLE_MULTIPLIER: f32 = 0.5;
pub const PERFORMANCE_MAX_PARTICLES: u32 = 30_000;
pub const PERFORMANCE_MAX_BLOOM: f32 = 1.5;
pub const PERFORMANCE_MAX_FRACTAL_ITERATIONS: u32 = 8;
pub const PARTICLE_COUNT_MIN: u32 = 5_000;
pub const PARTICLE_COUNT_MAX: u32 = 100_000;
pub const BLOOM_MAX: f32 = 5.0;
pub const PARTICLE_SIZE_MIN: f32 = 0.001;
pub const PARTICLE_SIZE_MAX: f32 = 1.0;
pub const FRACTAL_ITERATIONS_MAX: u32 = 16;
pub const DEFAULT_RANDOM_INTENSITY: f32 = 0.5;

// Accessibility / performance animation damping
pub const REDUCED_MOTION_SCALE: f32 = 0.3;
pub const PERFORMANCE_ANIMATION_SCALE: f32 = 0.5;

// Overlay animation
pub const OVERLAY_DRIVER_SYSTEM: usize = 0; // palette index whose band animates the overlay
pub const OVERLAY_HUE_RATE: f32 = 0.1; // hue cycles per second of simulation time
pub const OVERLAY_HUE_SYSTEM_STEP: f32 = 0.2;
pub const OVERLAY_SATURATION: f32 = 0.8;
pub const OVERLAY_LIGHTNESS: f32 = 0.5;
pub const OVERLAY_BASE_OPACITY: f32 = 0.6;
pub const OVERLAY_PULSE_GAIN: f32 = 0.3; // scale = 1 + band * gain
pub const EXPANSION_THRESHOLD: f32 = 0.8; // neural web expands above this band level
pub const EXPANSION_TWIST_GAIN: f32 = 0.02;

// Geometry builder defaults
pub const FLOWER_RADIUS: f32 = 10.0;
pub const FLOWER_LAYERS: u32 = 6;
pub const FLOWER_SEGMENTS: u32 = 32;
pub const METATRON_SIZE: f32 = 8.0;
pub const SPIRAL_TURNS: u32 = 5;
pub const SPIRAL_POINTS_PER_TURN: u32 = 100;
pub const SPIRAL_RADIUS: f32 = 10.0;
pub const NEURAL_WEB_NODES: u32 = 100;
pub const NEURAL_WEB_RADIUS: f32 = 12.0;
pub const NEURAL_WEB_THRESHOLD: f32 = 4.0;
pub const HYPERBOLIC_DEPTH: u32 = 6;
pub const HYPERBOLIC_POLYGON_EDGES: f32 = 7.0; // points per unit of ring circumference
pub const HYPERBOLIC_EDGE_DISTANCE: f32 = 0.5;
pub const HYPERBOLIC_MAX_POINTS: usize = 4096; // pairwise edge search is quadratic
pub const LSYSTEM_MAX_SYMBOLS: usize = 4_000_000; // rewriting stops before exceeding this

// Frame-rate monitoring
pub const FPS_THRESHOLD: f32 = 50.0;
pub const FPS_CONSECUTIVE_SAMPLES: u32 = 10;
pub const FPS_SAMPLE_WINDOW_SEC: f32 = 1.0;

// Spectrum source (browser-analyser compatible)
pub const ANALYSER_FFT_SIZE: usize = 2048;
pub const ANALYSER_SMOOTHING: f32 = 0.85;
pub const ANALYSER_MIN_DB: f32 = -100.0;
pub const ANALYSER_MAX_DB: f32 = -30.0;
