use super::{CutoutFormat, MemoryParticleFile, ParticleStore};
use crate::domain::{HaloError, HaloResult, HeaderValues, ParticleSlot, UnitSystem};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory stand-in for a directory of downloaded cutouts, keyed by file name.
///
/// Handles opened from it write their state back on flush, so a run that fails
/// before flushing leaves the stored file untouched.
#[derive(Debug, Default)]
pub(crate) struct MemoryCutouts {
    files: RefCell<BTreeMap<String, MemoryParticleFile>>,
}

impl MemoryCutouts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, file_name: impl Into<String>, file: MemoryParticleFile) {
        self.files.borrow_mut().insert(file_name.into(), file);
    }

    pub(crate) fn get(&self, file_name: &str) -> Option<MemoryParticleFile> {
        self.files.borrow().get(file_name).cloned()
    }
}

impl<'a> CutoutFormat for &'a MemoryCutouts {
    type Store = MemoryHandle<'a>;

    fn open_rw(&self, path: &Path) -> HaloResult<MemoryHandle<'a>> {
        let owner: &'a MemoryCutouts = *self;
        let key = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = owner.get(&key).ok_or_else(|| {
            HaloError::io_system(
                "IO.CUTOUT_OPEN",
                format!("no cutout named '{}' is staged", path.display()),
            )
        })?;
        Ok(MemoryHandle { owner, key, file })
    }
}

pub(crate) struct MemoryHandle<'a> {
    owner: &'a MemoryCutouts,
    key: String,
    file: MemoryParticleFile,
}

impl ParticleStore for MemoryHandle<'_> {
    fn label(&self) -> String {
        self.file.label()
    }

    fn has_slot(&self, slot: ParticleSlot) -> bool {
        self.file.has_slot(slot)
    }

    fn has_field(&self, slot: ParticleSlot, field: &str) -> bool {
        self.file.has_field(slot, field)
    }

    fn field_len(&self, slot: ParticleSlot, field: &str) -> HaloResult<usize> {
        self.file.field_len(slot, field)
    }

    fn read_coordinates(&self, slot: ParticleSlot) -> HaloResult<Vec<[f64; 3]>> {
        self.file.read_coordinates(slot)
    }

    fn write_coordinates(
        &mut self,
        slot: ParticleSlot,
        coordinates: &[[f64; 3]],
    ) -> HaloResult<()> {
        self.file.write_coordinates(slot, coordinates)
    }

    fn remove_field(&mut self, slot: ParticleSlot, field: &str) -> HaloResult<()> {
        self.file.remove_field(slot, field)
    }

    fn rename_field(&mut self, slot: ParticleSlot, from: &str, to: &str) -> HaloResult<()> {
        self.file.rename_field(slot, from, to)
    }

    fn has_units(&self) -> bool {
        self.file.has_units()
    }

    fn write_header(&mut self, header: &HeaderValues) -> HaloResult<()> {
        self.file.write_header(header)
    }

    fn create_units(&mut self, units: &UnitSystem) -> HaloResult<()> {
        self.file.create_units(units)
    }

    fn flush(&mut self) -> HaloResult<()> {
        self.owner
            .files
            .borrow_mut()
            .insert(self.key.clone(), self.file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryCutouts;
    use crate::domain::{HaloErrorCategory, ParticleSlot};
    use crate::store::{CutoutFormat, FieldData, MemoryParticleFile, ParticleStore};
    use std::path::Path;

    fn sample() -> MemoryParticleFile {
        MemoryParticleFile::new("cutout_7.hdf5").with_field(
            ParticleSlot::DARK_MATTER,
            "ParticleIDs",
            FieldData::Ids(vec![1, 2]),
        )
    }

    #[test]
    fn handles_write_back_only_on_flush() {
        let cutouts = MemoryCutouts::new();
        cutouts.insert("cutout_7.hdf5", sample());

        let format = &cutouts;
        let mut handle = format
            .open_rw(Path::new("downloads/cutout_7.hdf5"))
            .expect("staged cutout should open");
        handle
            .remove_field(ParticleSlot::DARK_MATTER, "ParticleIDs")
            .expect("remove should succeed");
        assert!(
            cutouts
                .get("cutout_7.hdf5")
                .expect("cutout is staged")
                .has_field(ParticleSlot::DARK_MATTER, "ParticleIDs")
        );

        handle.close().expect("close should flush");
        assert!(
            !cutouts
                .get("cutout_7.hdf5")
                .expect("cutout is staged")
                .has_field(ParticleSlot::DARK_MATTER, "ParticleIDs")
        );
    }

    #[test]
    fn opening_an_unknown_cutout_is_an_io_error() {
        let cutouts = MemoryCutouts::new();
        let format = &cutouts;
        let error = format
            .open_rw(Path::new("missing.hdf5"))
            .err()
            .expect("unknown cutout should fail");
        assert_eq!(error.category(), HaloErrorCategory::IoSystemError);
    }
}
