//! Halo normalization: turns a freshly downloaded subhalo cutout into a
//! self-contained snapshot file.
//!
//! The box policy is the symmetric one: the box width is twice the largest
//! per-axis distance of any particle from the subhalo's catalogued position,
//! padded by [`BOX_PADDING`], and particles are shifted so that position lands
//! at the centre of the box.

mod bounds;

use crate::common::constants::{
    BOX_PADDING, FIELD_DENSITY, FIELD_PARTICLE_IDS, FIELD_SMOOTHING_LENGTH,
    FIELD_SUBFIND_DENSITY, FIELD_SUBFIND_HSML, FIELD_VOLUME,
};
use crate::domain::{
    HaloError, HaloResult, HeaderValues, ParticleSlot, SimulationInfo, SnapshotInfo, UnitSystem,
};
use crate::store::ParticleStore;
use bounds::ParticleCensus;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizerOptions {
    /// Simulation box width used to unwrap periodic images before bounding.
    pub periodic_box: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizationInput<'a> {
    pub simulation: &'a SimulationInfo,
    pub snapshot: &'a SnapshotInfo,
    pub subhalo_position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationReport {
    pub header: HeaderValues,
    /// Unpadded box width.
    pub box_width: f64,
    pub gas_fields_substituted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HaloNormalizer {
    options: NormalizerOptions,
}

impl HaloNormalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    /// Normalizes `store` in place and releases it.
    ///
    /// Every check runs before the first write, so a rejected file is left
    /// exactly as it was. The store is dropped on every error path.
    pub fn normalize<S: ParticleStore>(
        &self,
        mut store: S,
        input: &NormalizationInput<'_>,
    ) -> HaloResult<NormalizationReport> {
        let label = store.label();
        let center = input.subhalo_position;
        preflight(&store, &label)?;

        let mut census = ParticleCensus::scan(&store)?;
        if let Some(period) = self.options.periodic_box {
            if !(period.is_finite() && period > 0.0) {
                return Err(HaloError::input_validation(
                    "INPUT.PERIODIC_BOX",
                    format!("periodic box width must be positive, got {period}"),
                ));
            }
            census.unwrap_periodic(center, period);
        }

        let extent = census.symmetric_extent(center).ok_or_else(|| {
            HaloError::schema(
                "SCHEMA.EMPTY_CUTOUT",
                format!("{label}: no particle type carries particles"),
            )
        })?;
        let box_width = 2.0 * extent;
        if !(box_width.is_finite() && box_width > 0.0) {
            return Err(HaloError::schema(
                "SCHEMA.DEGENERATE_EXTENT",
                format!("{label}: particle extent {box_width} cannot define a box"),
            ));
        }
        let box_size = BOX_PADDING * box_width;
        let header = HeaderValues::new(
            input.simulation,
            input.snapshot,
            census.num_part_this_file(),
            box_size,
        )?;
        debug!(cutout = %label, box_width, box_size, "bounding box computed");

        census.recenter(center, box_size);
        for slot in census.slots() {
            store.write_coordinates(slot.slot, &slot.coordinates)?;
        }

        let gas_fields_substituted = substitute_gas_fields(&mut store, &label)?;
        store.write_header(&header)?;
        store.create_units(&UnitSystem::default())?;
        store.close()?;

        info!(
            cutout = %label,
            box_size,
            particles = ?header.num_part_this_file,
            "cutout normalized"
        );
        Ok(NormalizationReport {
            header,
            box_width,
            gas_fields_substituted,
        })
    }
}

fn gas_is_particle_bearing<S: ParticleStore + ?Sized>(store: &S) -> bool {
    store.has_slot(ParticleSlot::GAS) && store.has_field(ParticleSlot::GAS, FIELD_PARTICLE_IDS)
}

fn preflight<S: ParticleStore + ?Sized>(store: &S, label: &str) -> HaloResult<()> {
    if store.has_units() {
        return Err(HaloError::schema(
            "SCHEMA.ALREADY_NORMALIZED",
            format!("{label}: units section already present; the cutout was normalized before"),
        ));
    }

    if gas_is_particle_bearing(store) {
        for field in [FIELD_SUBFIND_DENSITY, FIELD_SUBFIND_HSML] {
            if !store.has_field(ParticleSlot::GAS, field) {
                return Err(HaloError::schema(
                    "SCHEMA.MISSING_GAS_FIELD",
                    format!("{label}: {} has no '{field}' field", ParticleSlot::GAS),
                ));
            }
        }
    }
    Ok(())
}

/// Replaces the gas density and smoothing length with the SUBFIND estimates
/// and drops the cell volume.
fn substitute_gas_fields<S: ParticleStore + ?Sized>(
    store: &mut S,
    label: &str,
) -> HaloResult<bool> {
    let gas = ParticleSlot::GAS;
    if !store.has_slot(gas) {
        return Ok(false);
    }
    if !gas_is_particle_bearing(store) {
        warn!(cutout = %label, "gas group has no particles; density fields left as-is");
        return Ok(false);
    }

    for field in [FIELD_DENSITY, FIELD_SMOOTHING_LENGTH, FIELD_VOLUME] {
        if store.has_field(gas, field) {
            store.remove_field(gas, field)?;
        }
    }
    store.rename_field(gas, FIELD_SUBFIND_DENSITY, FIELD_DENSITY)?;
    store.rename_field(gas, FIELD_SUBFIND_HSML, FIELD_SMOOTHING_LENGTH)?;
    Ok(true)
}
