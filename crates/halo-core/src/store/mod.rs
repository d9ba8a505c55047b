//! Read-write access to one downloaded particle cutout.
//!
//! The normalizer only sees [`ParticleStore`]; the HDF5 backend and the
//! in-memory backend both implement it.

#[cfg(feature = "hdf5")]
mod hdf5_file;
mod memory;
#[cfg(test)]
mod staged;

#[cfg(feature = "hdf5")]
pub use hdf5_file::{Hdf5Format, Hdf5ParticleFile};
pub use memory::{FieldData, MemoryParticleFile};
#[cfg(test)]
pub(crate) use staged::MemoryCutouts;

use crate::domain::{HaloResult, HeaderValues, ParticleSlot, UnitSystem};
use std::path::Path;

pub trait ParticleStore {
    /// Human-readable location used in diagnostics.
    fn label(&self) -> String;

    fn has_slot(&self, slot: ParticleSlot) -> bool;

    fn has_field(&self, slot: ParticleSlot, field: &str) -> bool;

    /// Number of rows (first-axis length) of a field.
    fn field_len(&self, slot: ParticleSlot, field: &str) -> HaloResult<usize>;

    fn read_coordinates(&self, slot: ParticleSlot) -> HaloResult<Vec<[f64; 3]>>;

    fn write_coordinates(&mut self, slot: ParticleSlot, coordinates: &[[f64; 3]])
    -> HaloResult<()>;

    fn remove_field(&mut self, slot: ParticleSlot, field: &str) -> HaloResult<()>;

    fn rename_field(&mut self, slot: ParticleSlot, from: &str, to: &str) -> HaloResult<()>;

    fn has_units(&self) -> bool;

    /// Writes every header attribute, replacing values already present.
    fn write_header(&mut self, header: &HeaderValues) -> HaloResult<()>;

    /// Creates the units section; fails when one already exists.
    fn create_units(&mut self, units: &UnitSystem) -> HaloResult<()>;

    fn flush(&mut self) -> HaloResult<()>;

    /// Commits pending writes and releases the handle.
    fn close(mut self) -> HaloResult<()>
    where
        Self: Sized,
    {
        self.flush()
    }
}

impl<T: ParticleStore + ?Sized> ParticleStore for &mut T {
    fn label(&self) -> String {
        (**self).label()
    }

    fn has_slot(&self, slot: ParticleSlot) -> bool {
        (**self).has_slot(slot)
    }

    fn has_field(&self, slot: ParticleSlot, field: &str) -> bool {
        (**self).has_field(slot, field)
    }

    fn field_len(&self, slot: ParticleSlot, field: &str) -> HaloResult<usize> {
        (**self).field_len(slot, field)
    }

    fn read_coordinates(&self, slot: ParticleSlot) -> HaloResult<Vec<[f64; 3]>> {
        (**self).read_coordinates(slot)
    }

    fn write_coordinates(
        &mut self,
        slot: ParticleSlot,
        coordinates: &[[f64; 3]],
    ) -> HaloResult<()> {
        (**self).write_coordinates(slot, coordinates)
    }

    fn remove_field(&mut self, slot: ParticleSlot, field: &str) -> HaloResult<()> {
        (**self).remove_field(slot, field)
    }

    fn rename_field(&mut self, slot: ParticleSlot, from: &str, to: &str) -> HaloResult<()> {
        (**self).rename_field(slot, from, to)
    }

    fn has_units(&self) -> bool {
        (**self).has_units()
    }

    fn write_header(&mut self, header: &HeaderValues) -> HaloResult<()> {
        (**self).write_header(header)
    }

    fn create_units(&mut self, units: &UnitSystem) -> HaloResult<()> {
        (**self).create_units(units)
    }

    fn flush(&mut self) -> HaloResult<()> {
        (**self).flush()
    }
}

/// Opens downloaded cutouts for in-place normalization.
pub trait CutoutFormat {
    type Store: ParticleStore;

    fn open_rw(&self, path: &Path) -> HaloResult<Self::Store>;
}
