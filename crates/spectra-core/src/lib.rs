pub mod constants;
pub mod effects;
pub mod frame;
pub mod geometry;
pub mod particles;
pub mod perf;
pub mod preset;
pub mod random;
pub mod spectrum;

pub use effects::*;
pub use frame::*;
pub use geometry::{build_overlay, GeometryBuffer, GeometryKind, Primitive, SacredShape};
pub use particles::*;
pub use perf::*;
pub use preset::*;
pub use random::{RandomizationSettings, Randomizer, SeededRandom};
pub use spectrum::*;
