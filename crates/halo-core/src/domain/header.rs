use super::{HaloError, HaloResult, SimulationInfo, SnapshotInfo};
use crate::common::constants::{
    ATTR_UNIT_LENGTH, ATTR_UNIT_MASS, ATTR_UNIT_VELOCITY, DARK_MATTER_SLOT, NUM_PARTICLE_TYPES,
    UNIT_LENGTH_IN_CM, UNIT_MASS_IN_G, UNIT_VELOCITY_IN_CM_PER_S,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderAttribute {
    Float(f64),
    Int(i32),
    FloatArray(Vec<f64>),
    IntArray(Vec<i32>),
}

/// Global header attributes written into one normalized cutout.
///
/// Built fresh for every file; nothing here is shared between subhalos.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeaderValues {
    pub redshift: f64,
    pub omega0: f64,
    pub omega_lambda: f64,
    pub hubble_param: f64,
    pub mass_table: [f64; NUM_PARTICLE_TYPES],
    pub num_files_per_snapshot: i32,
    pub time: f64,
    pub box_size: f64,
    #[serde(rename = "NumPart_ThisFile")]
    pub num_part_this_file: [i32; NUM_PARTICLE_TYPES],
}

impl HeaderValues {
    pub fn new(
        simulation: &SimulationInfo,
        snapshot: &SnapshotInfo,
        num_part_this_file: [i32; NUM_PARTICLE_TYPES],
        box_size: f64,
    ) -> HaloResult<Self> {
        let redshift = snapshot.redshift;
        if !(redshift.is_finite() && redshift > -1.0) {
            return Err(HaloError::input_validation(
                "INPUT.REDSHIFT",
                format!("redshift must be finite and greater than -1, got {redshift}"),
            ));
        }

        let mut mass_table = [0.0; NUM_PARTICLE_TYPES];
        mass_table[DARK_MATTER_SLOT] = simulation.dark_matter_particle_mass;

        Ok(Self {
            redshift,
            omega0: simulation.omega0,
            omega_lambda: simulation.omega_lambda,
            hubble_param: simulation.hubble_param,
            mass_table,
            num_files_per_snapshot: 1,
            time: snapshot.time(),
            box_size,
            num_part_this_file,
        })
    }

    pub fn attributes(&self) -> Vec<(&'static str, HeaderAttribute)> {
        vec![
            ("Redshift", HeaderAttribute::Float(self.redshift)),
            ("Omega0", HeaderAttribute::Float(self.omega0)),
            ("OmegaLambda", HeaderAttribute::Float(self.omega_lambda)),
            ("HubbleParam", HeaderAttribute::Float(self.hubble_param)),
            (
                "MassTable",
                HeaderAttribute::FloatArray(self.mass_table.to_vec()),
            ),
            (
                "NumFilesPerSnapshot",
                HeaderAttribute::Int(self.num_files_per_snapshot),
            ),
            ("Time", HeaderAttribute::Float(self.time)),
            ("BoxSize", HeaderAttribute::Float(self.box_size)),
            (
                "NumPart_ThisFile",
                HeaderAttribute::IntArray(self.num_part_this_file.to_vec()),
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSystem {
    pub length_in_cm: f64,
    pub mass_in_g: f64,
    pub velocity_in_cm_per_s: f64,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self {
            length_in_cm: UNIT_LENGTH_IN_CM,
            mass_in_g: UNIT_MASS_IN_G,
            velocity_in_cm_per_s: UNIT_VELOCITY_IN_CM_PER_S,
        }
    }
}

impl UnitSystem {
    pub fn attributes(&self) -> [(&'static str, f64); 3] {
        [
            (ATTR_UNIT_LENGTH, self.length_in_cm),
            (ATTR_UNIT_MASS, self.mass_in_g),
            (ATTR_UNIT_VELOCITY, self.velocity_in_cm_per_s),
        ]
    }
}
