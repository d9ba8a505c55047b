//! Fixed values shared by the normalizer and the particle stores.

pub const NUM_PARTICLE_TYPES: usize = 6;

/// Particle-type slot holding dark matter in the Illustris taxonomy.
pub const DARK_MATTER_SLOT: usize = 1;

/// Multiplier applied to the raw halo extent so every particle lands strictly
/// inside the cubical output domain.
pub const BOX_PADDING: f64 = 1.1;

pub const UNIT_LENGTH_IN_CM: f64 = 3.0856775809623245e+21;
pub const UNIT_MASS_IN_G: f64 = 1.98841586e+43;
pub const UNIT_VELOCITY_IN_CM_PER_S: f64 = 1.0e5;

pub const HEADER_GROUP: &str = "Header";
pub const UNITS_GROUP: &str = "Units";

pub const FIELD_PARTICLE_IDS: &str = "ParticleIDs";
pub const FIELD_COORDINATES: &str = "Coordinates";
pub const FIELD_DENSITY: &str = "Density";
pub const FIELD_SMOOTHING_LENGTH: &str = "SmoothingLength";
pub const FIELD_VOLUME: &str = "Volume";
pub const FIELD_SUBFIND_DENSITY: &str = "SubfindDensity";
pub const FIELD_SUBFIND_HSML: &str = "SubfindHsml";

pub const ATTR_UNIT_LENGTH: &str = "UnitLength_in_cm";
pub const ATTR_UNIT_MASS: &str = "UnitMass_in_g";
pub const ATTR_UNIT_VELOCITY: &str = "UnitVelocity_in_cm_per_s";

pub const DEFAULT_API_BASE_URL: &str = "http://www.illustris-project.org/api/";
pub const API_KEY_HEADER: &str = "api-key";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
