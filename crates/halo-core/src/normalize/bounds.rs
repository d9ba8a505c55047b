use crate::common::constants::{FIELD_COORDINATES, FIELD_PARTICLE_IDS, NUM_PARTICLE_TYPES};
use crate::domain::{HaloError, HaloResult, ParticleSlot};
use crate::store::ParticleStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub(super) struct SlotParticles {
    pub(super) slot: ParticleSlot,
    pub(super) coordinates: Vec<[f64; 3]>,
}

/// Particle counts per slot plus the coordinates of every particle-bearing slot.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ParticleCensus {
    counts: [i32; NUM_PARTICLE_TYPES],
    slots: Vec<SlotParticles>,
}

impl ParticleCensus {
    pub(super) fn scan<S: ParticleStore + ?Sized>(store: &S) -> HaloResult<Self> {
        let label = store.label();
        let mut counts = [0; NUM_PARTICLE_TYPES];
        let mut slots = Vec::new();

        for slot in ParticleSlot::all() {
            if !store.has_slot(slot) {
                continue;
            }
            if !store.has_field(slot, FIELD_PARTICLE_IDS) {
                warn!(cutout = %label, %slot, "particle group has no ids; counting it as empty");
                continue;
            }

            let count = store.field_len(slot, FIELD_PARTICLE_IDS)?;
            counts[slot.index()] = i32::try_from(count).map_err(|_| {
                HaloError::schema(
                    "SCHEMA.PARTICLE_COUNT",
                    format!("{label}: {slot} holds {count} particles, too many for the header"),
                )
            })?;
            if count == 0 {
                continue;
            }

            if !store.has_field(slot, FIELD_COORDINATES) {
                return Err(HaloError::schema(
                    "SCHEMA.MISSING_COORDINATES",
                    format!(
                        "{label}: {slot} has {count} particles but no '{FIELD_COORDINATES}' field"
                    ),
                ));
            }
            let coordinates = store.read_coordinates(slot)?;
            if coordinates.len() != count {
                return Err(HaloError::schema(
                    "SCHEMA.COORDINATE_SHAPE",
                    format!(
                        "{label}: {slot} has {count} particle ids but {} coordinates",
                        coordinates.len()
                    ),
                ));
            }
            if let Some(row) = coordinates
                .iter()
                .position(|position| position.iter().any(|value| !value.is_finite()))
            {
                return Err(HaloError::schema(
                    "SCHEMA.NON_FINITE_COORDINATE",
                    format!("{label}: {slot} coordinate row {row} is not finite"),
                ));
            }

            debug!(cutout = %label, %slot, count, "particle slot scanned");
            slots.push(SlotParticles { slot, coordinates });
        }

        Ok(Self { counts, slots })
    }

    pub(super) fn num_part_this_file(&self) -> [i32; NUM_PARTICLE_TYPES] {
        self.counts
    }

    pub(super) fn slots(&self) -> &[SlotParticles] {
        &self.slots
    }

    /// Maps every coordinate onto its periodic image closest to `center`.
    pub(super) fn unwrap_periodic(&mut self, center: [f64; 3], period: f64) {
        for slot in &mut self.slots {
            for position in &mut slot.coordinates {
                for axis in 0..3 {
                    position[axis] = minimum_image(position[axis], center[axis], period);
                }
            }
        }
    }

    /// Largest distance from `center` along any axis, taken over all slots.
    ///
    /// `None` when no slot carries particles.
    pub(super) fn symmetric_extent(&self, center: [f64; 3]) -> Option<f64> {
        let mut box_min = f64::INFINITY;
        let mut box_max = f64::NEG_INFINITY;
        for position in self.slots.iter().flat_map(|slot| slot.coordinates.iter()) {
            for axis in 0..3 {
                let offset = position[axis] - center[axis];
                box_min = box_min.min(offset);
                box_max = box_max.max(offset);
            }
        }
        (box_min <= box_max).then(|| (-box_min).max(box_max))
    }

    /// Shifts every slot so `center` sits in the middle of a cube of side `box_size`.
    pub(super) fn recenter(&mut self, center: [f64; 3], box_size: f64) {
        let shift = center.map(|component| component - 0.5 * box_size);
        for slot in &mut self.slots {
            for position in &mut slot.coordinates {
                for axis in 0..3 {
                    position[axis] -= shift[axis];
                }
            }
        }
    }
}

pub(super) fn minimum_image(value: f64, center: f64, period: f64) -> f64 {
    let offset = value - center;
    center + offset - period * (offset / period).round()
}
