//! Wire shapes of the catalog API responses.

use crate::domain::{HaloError, HaloResult, SimulationInfo, SnapshotInfo, SubhaloInfo};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(super) struct SimulationListing {
    pub(super) simulations: Vec<Link>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Link {
    #[serde(default)]
    pub(super) name: Option<String>,
    pub(super) url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SimulationRecord {
    name: String,
    omega_0: f64,
    #[serde(rename = "omega_L")]
    omega_lambda: f64,
    hubble: f64,
    mass_dm: f64,
    boxsize: f64,
    snapshots: String,
}

impl From<SimulationRecord> for SimulationInfo {
    fn from(record: SimulationRecord) -> Self {
        Self {
            name: record.name,
            omega0: record.omega_0,
            omega_lambda: record.omega_lambda,
            hubble_param: record.hubble,
            box_size: record.boxsize,
            dark_matter_particle_mass: record.mass_dm,
            snapshots_url: record.snapshots,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotRecord {
    #[serde(default)]
    number: Option<i64>,
    redshift: f64,
    subhalos: String,
}

impl From<SnapshotRecord> for SnapshotInfo {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            number: record.number,
            redshift: record.redshift,
            subhalos_url: record.subhalos,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SubhaloPage {
    #[serde(default)]
    pub(super) next: Option<String>,
    pub(super) results: Vec<SubhaloId>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubhaloId {
    pub(super) id: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubhaloRecord {
    id: i64,
    pos_x: f64,
    pos_y: f64,
    pos_z: f64,
    cutouts: CutoutLinks,
}

#[derive(Debug, Deserialize)]
struct CutoutLinks {
    subhalo: String,
}

impl From<SubhaloRecord> for SubhaloInfo {
    fn from(record: SubhaloRecord) -> Self {
        Self {
            id: record.id,
            position: [record.pos_x, record.pos_y, record.pos_z],
            cutout_url: record.cutouts.subhalo,
        }
    }
}

pub(super) fn decode<T: DeserializeOwned>(url: &str, value: Value) -> HaloResult<T> {
    serde_json::from_value(value).map_err(|source| {
        HaloError::transport(
            "TRANSPORT.RESPONSE_SHAPE",
            format!("unexpected response from {url}: {source}"),
        )
    })
}
