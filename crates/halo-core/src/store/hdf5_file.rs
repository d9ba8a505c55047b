use super::{CutoutFormat, ParticleStore};
use crate::common::constants::{FIELD_COORDINATES, HEADER_GROUP, UNITS_GROUP};
use crate::domain::{
    HaloError, HaloResult, HeaderAttribute, HeaderValues, ParticleSlot, UnitSystem,
};
use hdf5::types::H5Type;
use hdf5::{File, Group};
use std::path::{Path, PathBuf};

/// An HDF5 cutout opened read-write. Dropping the value closes the file.
pub struct Hdf5ParticleFile {
    file: File,
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Format;

impl CutoutFormat for Hdf5Format {
    type Store = Hdf5ParticleFile;

    fn open_rw(&self, path: &Path) -> HaloResult<Hdf5ParticleFile> {
        Hdf5ParticleFile::open_rw(path)
    }
}

impl Hdf5ParticleFile {
    pub fn open_rw(path: &Path) -> HaloResult<Self> {
        let file = File::open_rw(path).map_err(|source| {
            HaloError::io_system(
                "IO.HDF5_OPEN",
                format!("failed to open '{}' read-write: {}", path.display(), source),
            )
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn slot_group(&self, slot: ParticleSlot) -> HaloResult<Group> {
        self.file.group(&slot.group_name()).map_err(|source| {
            HaloError::schema(
                "SCHEMA.MISSING_GROUP",
                format!("{}: cannot open {slot}: {}", self.path.display(), source),
            )
        })
    }

    fn header_group(&self) -> HaloResult<Group> {
        let group = if self.file.link_exists(HEADER_GROUP) {
            self.file.group(HEADER_GROUP)
        } else {
            self.file.create_group(HEADER_GROUP)
        };
        group.map_err(|source| self.io_error("IO.HDF5_HEADER", "open header group", source))
    }

    fn io_error(
        &self,
        placeholder: &'static str,
        action: &str,
        source: hdf5::Error,
    ) -> HaloError {
        HaloError::io_system(
            placeholder,
            format!("{}: failed to {}: {}", self.path.display(), action, source),
        )
    }
}

fn write_attribute<T: H5Type>(
    group: &Group,
    name: &str,
    values: &[T],
    scalar: bool,
) -> hdf5::Result<()> {
    // Cutout headers may store a key with another rank or dtype.
    if group.attr_names()?.iter().any(|existing| existing == name) {
        group.delete_attr(name)?;
    }
    let attribute = if scalar {
        group.new_attr::<T>().create(name)?
    } else {
        group.new_attr::<T>().shape(values.len()).create(name)?
    };
    match (scalar, values.first()) {
        (true, Some(value)) => attribute.write_scalar(value),
        _ => attribute.write_raw(values),
    }
}

impl ParticleStore for Hdf5ParticleFile {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn has_slot(&self, slot: ParticleSlot) -> bool {
        self.file.link_exists(&slot.group_name())
    }

    fn has_field(&self, slot: ParticleSlot, field: &str) -> bool {
        self.has_slot(slot)
            && self
                .slot_group(slot)
                .map(|group| group.link_exists(field))
                .unwrap_or(false)
    }

    fn field_len(&self, slot: ParticleSlot, field: &str) -> HaloResult<usize> {
        let dataset = self.slot_group(slot)?.dataset(field).map_err(|source| {
            HaloError::schema(
                "SCHEMA.MISSING_FIELD",
                format!(
                    "{}: {slot} has no '{field}' field: {}",
                    self.path.display(),
                    source
                ),
            )
        })?;
        Ok(dataset.shape().first().copied().unwrap_or(0))
    }

    fn read_coordinates(&self, slot: ParticleSlot) -> HaloResult<Vec<[f64; 3]>> {
        let dataset = self
            .slot_group(slot)?
            .dataset(FIELD_COORDINATES)
            .map_err(|source| {
                HaloError::schema(
                    "SCHEMA.MISSING_COORDINATES",
                    format!(
                        "{}: {slot} coordinates unreadable: {}",
                        self.path.display(),
                        source
                    ),
                )
            })?;
        let shape = dataset.shape();
        if shape.len() != 2 || shape[1] != 3 {
            return Err(HaloError::schema(
                "SCHEMA.COORDINATE_SHAPE",
                format!(
                    "{}: {slot} coordinates have shape {:?}, expected N x 3",
                    self.path.display(),
                    shape
                ),
            ));
        }
        let flat = dataset
            .read_raw::<f64>()
            .map_err(|source| self.io_error("IO.HDF5_READ", "read coordinates", source))?;
        Ok(flat
            .chunks_exact(3)
            .map(|row| [row[0], row[1], row[2]])
            .collect())
    }

    fn write_coordinates(
        &mut self,
        slot: ParticleSlot,
        coordinates: &[[f64; 3]],
    ) -> HaloResult<()> {
        let dataset = self
            .slot_group(slot)?
            .dataset(FIELD_COORDINATES)
            .map_err(|source| self.io_error("IO.HDF5_WRITE", "open coordinates", source))?;
        let flat: Vec<f64> = coordinates.iter().flatten().copied().collect();
        dataset
            .write_raw(&flat)
            .map_err(|source| self.io_error("IO.HDF5_WRITE", "write coordinates", source))
    }

    fn remove_field(&mut self, slot: ParticleSlot, field: &str) -> HaloResult<()> {
        self.slot_group(slot)?
            .unlink(field)
            .map_err(|source| self.io_error("IO.HDF5_UNLINK", "remove field", source))
    }

    fn rename_field(&mut self, slot: ParticleSlot, from: &str, to: &str) -> HaloResult<()> {
        self.slot_group(slot)?
            .relink(from, to)
            .map_err(|source| self.io_error("IO.HDF5_RELINK", "rename field", source))
    }

    fn has_units(&self) -> bool {
        self.file.link_exists(UNITS_GROUP)
    }

    fn write_header(&mut self, header: &HeaderValues) -> HaloResult<()> {
        let group = self.header_group()?;
        for (key, value) in header.attributes() {
            let written = match &value {
                HeaderAttribute::Float(value) => write_attribute(&group, key, &[*value], true),
                HeaderAttribute::Int(value) => write_attribute(&group, key, &[*value], true),
                HeaderAttribute::FloatArray(values) => {
                    write_attribute(&group, key, values, false)
                }
                HeaderAttribute::IntArray(values) => write_attribute(&group, key, values, false),
            };
            written.map_err(|source| {
                self.io_error("IO.HDF5_HEADER", "write header attribute", source)
            })?;
        }
        Ok(())
    }

    fn create_units(&mut self, units: &UnitSystem) -> HaloResult<()> {
        let group = self
            .file
            .create_group(UNITS_GROUP)
            .map_err(|source| self.io_error("IO.UNITS_CREATE", "create units group", source))?;
        for (key, value) in units.attributes() {
            write_attribute(&group, key, &[value], true).map_err(|source| {
                self.io_error("IO.UNITS_CREATE", "write unit attribute", source)
            })?;
        }
        Ok(())
    }

    fn flush(&mut self) -> HaloResult<()> {
        self.file
            .flush()
            .map_err(|source| self.io_error("IO.HDF5_FLUSH", "flush", source))
    }

    fn close(mut self) -> HaloResult<()> {
        self.flush()?;
        let path = self.path;
        self.file.close().map_err(|source| {
            HaloError::io_system(
                "IO.HDF5_CLOSE",
                format!("{}: failed to close: {}", path.display(), source),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Hdf5ParticleFile;
    use crate::common::constants::{FIELD_COORDINATES, FIELD_PARTICLE_IDS};
    use crate::domain::{HeaderValues, ParticleSlot, SimulationInfo, SnapshotInfo, UnitSystem};
    use crate::normalize::{HaloNormalizer, NormalizationInput, NormalizerOptions};
    use crate::store::ParticleStore;
    use tempfile::TempDir;

    fn write_ids(group: &hdf5::Group, ids: &[u64]) {
        group
            .new_dataset::<u64>()
            .shape(ids.len())
            .create(FIELD_PARTICLE_IDS)
            .expect("ids should be created")
            .write_raw(ids)
            .expect("ids should be written");
    }

    fn write_rows(group: &hdf5::Group, name: &str, rows: &[[f64; 3]]) {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        group
            .new_dataset::<f64>()
            .shape([rows.len(), 3])
            .create(name)
            .expect("rows should be created")
            .write_raw(&flat)
            .expect("rows should be written");
    }

    fn write_column(group: &hdf5::Group, name: &str, values: &[f64]) {
        group
            .new_dataset::<f64>()
            .shape(values.len())
            .create(name)
            .expect("column should be created")
            .write_raw(values)
            .expect("column should be written");
    }

    fn read_column(file: &hdf5::File, path: &str) -> Vec<f64> {
        file.dataset(path)
            .expect("dataset should exist")
            .read_raw()
            .expect("dataset should read")
    }

    fn illustris_1() -> SimulationInfo {
        SimulationInfo {
            name: "Illustris-1".to_string(),
            omega0: 0.2726,
            omega_lambda: 0.7274,
            hubble_param: 0.704,
            box_size: 75_000.0,
            dark_matter_particle_mass: 0.0004430565,
            snapshots_url: String::new(),
        }
    }

    #[test]
    fn header_units_and_coordinates_round_trip_through_hdf5() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("cutout.hdf5");
        {
            let file = hdf5::File::create(&path).expect("file should be created");
            let group = file.create_group("PartType1").expect("group should be created");
            group
                .new_dataset::<u64>()
                .shape(3)
                .create(FIELD_PARTICLE_IDS)
                .expect("ids should be created")
                .write_raw(&[11_u64, 12, 13])
                .expect("ids should be written");
            group
                .new_dataset::<f64>()
                .shape([3, 3])
                .create(FIELD_COORDINATES)
                .expect("coordinates should be created")
                .write_raw(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
                .expect("coordinates should be written");
            file.create_group("Header").expect("header should be created");
        }

        let mut store = Hdf5ParticleFile::open_rw(&path).expect("file should open");
        assert!(store.has_slot(ParticleSlot::DARK_MATTER));
        assert!(!store.has_slot(ParticleSlot::GAS));
        assert_eq!(
            store
                .field_len(ParticleSlot::DARK_MATTER, FIELD_PARTICLE_IDS)
                .expect("ids should have a length"),
            3
        );
        let coordinates = store
            .read_coordinates(ParticleSlot::DARK_MATTER)
            .expect("coordinates should read");
        assert_eq!(coordinates[2], [7.0, 8.0, 9.0]);

        let shifted: Vec<[f64; 3]> = coordinates
            .iter()
            .map(|row| [row[0] - 1.0, row[1] - 1.0, row[2] - 1.0])
            .collect();
        store
            .write_coordinates(ParticleSlot::DARK_MATTER, &shifted)
            .expect("coordinates should write");

        let simulation = SimulationInfo {
            name: "TNG100-1".to_string(),
            omega0: 0.3089,
            omega_lambda: 0.6911,
            hubble_param: 0.6774,
            box_size: 75000.0,
            dark_matter_particle_mass: 0.000505574296436975,
            snapshots_url: String::new(),
        };
        let snapshot = SnapshotInfo {
            number: Some(99),
            redshift: 0.0,
            subhalos_url: String::new(),
        };
        let header = HeaderValues::new(&simulation, &snapshot, [0, 3, 0, 0, 0, 0], 9.9)
            .expect("header should build");
        store.write_header(&header).expect("header should write");
        store.write_header(&header).expect("header should overwrite");
        store
            .create_units(&UnitSystem::default())
            .expect("units should be created");
        assert!(store.has_units());
        store.close().expect("file should close");

        let file = hdf5::File::open(&path).expect("file should reopen");
        let header_group = file.group("Header").expect("header should exist");
        let box_size: f64 = header_group
            .attr("BoxSize")
            .expect("BoxSize should exist")
            .read_scalar()
            .expect("BoxSize should read");
        assert_eq!(box_size, 9.9);
        let counts: Vec<i32> = header_group
            .attr("NumPart_ThisFile")
            .expect("NumPart_ThisFile should exist")
            .read_raw()
            .expect("counts should read");
        assert_eq!(counts, vec![0, 3, 0, 0, 0, 0]);
        let coordinates: Vec<f64> = file
            .dataset("PartType1/Coordinates")
            .expect("coordinates should exist")
            .read_raw()
            .expect("coordinates should read");
        assert_eq!(coordinates[0], 0.0);
        assert!(file.link_exists("Units"));
    }

    #[test]
    fn normalizing_a_downloaded_cutout_rewrites_gas_fields_and_header() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("cutout_7.hdf5");
        {
            let file = hdf5::File::create(&path).expect("file should be created");
            let gas = file.create_group("PartType0").expect("gas should be created");
            write_ids(&gas, &[1, 2]);
            write_rows(&gas, FIELD_COORDINATES, &[[9.0, 10.0, 10.0], [12.0, 10.0, 10.0]]);
            write_column(&gas, "Density", &[1.0, 2.0]);
            write_column(&gas, "Volume", &[0.5, 0.25]);
            write_column(&gas, "SubfindDensity", &[3.0, 4.0]);
            write_column(&gas, "SubfindHsml", &[0.1, 0.2]);
            let dark = file.create_group("PartType1").expect("dark matter should be created");
            write_ids(&dark, &[3, 4]);
            write_rows(&dark, FIELD_COORDINATES, &[[10.0, 7.0, 10.0], [10.0, 10.0, 11.0]]);

            let header = file.create_group("Header").expect("header should be created");
            header
                .new_attr::<f64>()
                .create("BoxSize")
                .expect("BoxSize should be created")
                .write_scalar(&75_000.0)
                .expect("BoxSize should be written");
            header
                .new_attr::<i64>()
                .create("NumPart_ThisFile")
                .expect("counts should be created")
                .write_scalar(&4_i64)
                .expect("counts should be written");
        }

        let simulation = illustris_1();
        let snapshot = SnapshotInfo {
            number: Some(135),
            redshift: 0.0,
            subhalos_url: String::new(),
        };
        let input = NormalizationInput {
            simulation: &simulation,
            snapshot: &snapshot,
            subhalo_position: [10.0, 10.0, 10.0],
        };
        let store = Hdf5ParticleFile::open_rw(&path).expect("file should open");
        let report = HaloNormalizer::new(NormalizerOptions::default())
            .normalize(store, &input)
            .expect("cutout should normalize");
        assert_eq!(report.box_width, 6.0);
        assert!(report.gas_fields_substituted);

        let file = hdf5::File::open(&path).expect("file should reopen");
        assert_eq!(read_column(&file, "PartType0/Density"), vec![3.0, 4.0]);
        assert_eq!(read_column(&file, "PartType0/SmoothingLength"), vec![0.1, 0.2]);
        for removed in ["Volume", "SubfindDensity", "SubfindHsml"] {
            assert!(
                !file.link_exists(&format!("PartType0/{removed}")),
                "{removed} should be gone"
            );
        }

        let header = file.group("Header").expect("header should exist");
        let box_size: f64 = header
            .attr("BoxSize")
            .expect("BoxSize should exist")
            .read_scalar()
            .expect("BoxSize should read");
        assert!((box_size - 6.6).abs() < 1e-9);
        let counts: Vec<i32> = header
            .attr("NumPart_ThisFile")
            .expect("NumPart_ThisFile should exist")
            .read_raw()
            .expect("counts should read");
        assert_eq!(counts, vec![2, 2, 0, 0, 0, 0]);

        let coordinates = read_column(&file, "PartType1/Coordinates");
        assert!(coordinates.iter().all(|value| *value > 0.0 && *value < box_size));
        assert!(file.link_exists("Units"));
    }
}
