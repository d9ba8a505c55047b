use super::ParticleStore;
use crate::common::constants::FIELD_COORDINATES;
use crate::domain::{
    HaloError, HaloResult, HeaderAttribute, HeaderValues, ParticleSlot, UnitSystem,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Ids(Vec<u64>),
    Scalars(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
}

impl FieldData {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(values) => values.len(),
            Self::Scalars(values) => values.len(),
            Self::Vectors(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Particle cutout held entirely in memory, mirroring the group/field/attribute
/// layout of the HDF5 files served by the API.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryParticleFile {
    name: String,
    groups: BTreeMap<ParticleSlot, BTreeMap<String, FieldData>>,
    header: BTreeMap<String, HeaderAttribute>,
    units: Option<BTreeMap<String, f64>>,
}

impl MemoryParticleFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_group(mut self, slot: ParticleSlot) -> Self {
        self.groups.entry(slot).or_default();
        self
    }

    pub fn with_field(mut self, slot: ParticleSlot, field: &str, data: FieldData) -> Self {
        self.groups
            .entry(slot)
            .or_default()
            .insert(field.to_string(), data);
        self
    }

    pub fn with_header_attribute(mut self, key: &str, value: HeaderAttribute) -> Self {
        self.header.insert(key.to_string(), value);
        self
    }

    pub fn field(&self, slot: ParticleSlot, field: &str) -> Option<&FieldData> {
        self.groups.get(&slot).and_then(|group| group.get(field))
    }

    pub fn header_attribute(&self, key: &str) -> Option<&HeaderAttribute> {
        self.header.get(key)
    }

    pub fn units(&self) -> Option<&BTreeMap<String, f64>> {
        self.units.as_ref()
    }

    fn group_mut(&mut self, slot: ParticleSlot) -> HaloResult<&mut BTreeMap<String, FieldData>> {
        let label = self.name.clone();
        self.groups.get_mut(&slot).ok_or_else(|| {
            HaloError::schema(
                "SCHEMA.MISSING_GROUP",
                format!("{label}: group {slot} does not exist"),
            )
        })
    }

    fn missing_field(&self, slot: ParticleSlot, field: &str) -> HaloError {
        HaloError::schema(
            "SCHEMA.MISSING_FIELD",
            format!("{}: {slot} has no '{field}' field", self.name),
        )
    }
}

impl ParticleStore for MemoryParticleFile {
    fn label(&self) -> String {
        self.name.clone()
    }

    fn has_slot(&self, slot: ParticleSlot) -> bool {
        self.groups.contains_key(&slot)
    }

    fn has_field(&self, slot: ParticleSlot, field: &str) -> bool {
        self.field(slot, field).is_some()
    }

    fn field_len(&self, slot: ParticleSlot, field: &str) -> HaloResult<usize> {
        self.field(slot, field)
            .map(FieldData::len)
            .ok_or_else(|| self.missing_field(slot, field))
    }

    fn read_coordinates(&self, slot: ParticleSlot) -> HaloResult<Vec<[f64; 3]>> {
        match self.field(slot, FIELD_COORDINATES) {
            Some(FieldData::Vectors(values)) => Ok(values.clone()),
            Some(_) => Err(HaloError::schema(
                "SCHEMA.COORDINATE_SHAPE",
                format!("{}: {slot} coordinates are not an N x 3 array", self.name),
            )),
            None => Err(self.missing_field(slot, FIELD_COORDINATES)),
        }
    }

    fn write_coordinates(
        &mut self,
        slot: ParticleSlot,
        coordinates: &[[f64; 3]],
    ) -> HaloResult<()> {
        let expected = self.field_len(slot, FIELD_COORDINATES)?;
        if expected != coordinates.len() {
            return Err(HaloError::schema(
                "SCHEMA.COORDINATE_SHAPE",
                format!(
                    "{}: {slot} holds {expected} coordinates, refusing to write {}",
                    self.name,
                    coordinates.len()
                ),
            ));
        }
        self.group_mut(slot)?.insert(
            FIELD_COORDINATES.to_string(),
            FieldData::Vectors(coordinates.to_vec()),
        );
        Ok(())
    }

    fn remove_field(&mut self, slot: ParticleSlot, field: &str) -> HaloResult<()> {
        let missing = self.missing_field(slot, field);
        self.group_mut(slot)?
            .remove(field)
            .map(|_| ())
            .ok_or(missing)
    }

    fn rename_field(&mut self, slot: ParticleSlot, from: &str, to: &str) -> HaloResult<()> {
        let missing = self.missing_field(slot, from);
        let label = self.name.clone();
        let group = self.group_mut(slot)?;
        if group.contains_key(to) {
            return Err(HaloError::schema(
                "SCHEMA.FIELD_EXISTS",
                format!("{label}: {slot} already has a '{to}' field"),
            ));
        }
        let data = group.remove(from).ok_or(missing)?;
        group.insert(to.to_string(), data);
        Ok(())
    }

    fn has_units(&self) -> bool {
        self.units.is_some()
    }

    fn write_header(&mut self, header: &HeaderValues) -> HaloResult<()> {
        for (key, value) in header.attributes() {
            self.header.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn create_units(&mut self, units: &UnitSystem) -> HaloResult<()> {
        if self.units.is_some() {
            return Err(HaloError::io_system(
                "IO.UNITS_CREATE",
                format!("{}: units section already exists", self.name),
            ));
        }
        self.units = Some(
            units
                .attributes()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        );
        Ok(())
    }

    fn flush(&mut self) -> HaloResult<()> {
        Ok(())
    }
}
