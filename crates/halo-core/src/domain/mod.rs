pub mod errors;
pub mod header;

pub use errors::{HaloError, HaloErrorCategory, HaloResult};
pub use header::{HeaderAttribute, HeaderValues, UnitSystem};

use crate::common::constants::{DARK_MATTER_SLOT, NUM_PARTICLE_TYPES};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the six fixed particle-type groups (`PartType0`..`PartType5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleSlot(usize);

impl ParticleSlot {
    pub const GAS: Self = Self(0);
    pub const DARK_MATTER: Self = Self(DARK_MATTER_SLOT);

    pub const fn new(index: usize) -> Option<Self> {
        if index < NUM_PARTICLE_TYPES {
            Some(Self(index))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_PARTICLE_TYPES).map(Self)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub fn group_name(self) -> String {
        format!("PartType{}", self.0)
    }
}

impl Display for ParticleSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PartType{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationInfo {
    pub name: String,
    pub omega0: f64,
    pub omega_lambda: f64,
    pub hubble_param: f64,
    /// Simulation-scale comoving box width, not the per-halo box.
    pub box_size: f64,
    pub dark_matter_particle_mass: f64,
    #[serde(skip)]
    pub snapshots_url: String,
}

/// How a snapshot is addressed: a label appended to the snapshot endpoint, or a
/// position in the ordered snapshot list (negative counts from the end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRef {
    Index(i64),
    Label(String),
}

impl FromStr for SnapshotRef {
    type Err = HaloError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(HaloError::input_validation(
                "INPUT.SNAPSHOT",
                "snapshot identifier must not be empty",
            ));
        }
        Ok(match trimmed.parse::<i64>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Label(trimmed.to_string()),
        })
    }
}

impl Display for SnapshotRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub number: Option<i64>,
    pub redshift: f64,
    #[serde(skip)]
    pub subhalos_url: String,
}

impl SnapshotInfo {
    pub fn time(&self) -> f64 {
        1.0 / (1.0 + self.redshift)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubhaloSelection {
    Single(i64),
    List(Vec<i64>),
    /// Field constraints forwarded verbatim as search query parameters.
    Filter(BTreeMap<String, String>),
}

impl From<i64> for SubhaloSelection {
    fn from(id: i64) -> Self {
        Self::Single(id)
    }
}

impl From<Vec<i64>> for SubhaloSelection {
    fn from(ids: Vec<i64>) -> Self {
        Self::List(ids)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubhaloInfo {
    pub id: i64,
    pub position: [f64; 3],
    pub cutout_url: String,
}
