use super::records::{
    Link, SimulationListing, SimulationRecord, SnapshotRecord, SubhaloPage, SubhaloRecord, decode,
};
use super::{ApiTransport, QueryParams};
use crate::domain::{
    HaloError, HaloResult, SimulationInfo, SnapshotInfo, SnapshotRef, SubhaloInfo,
    SubhaloSelection,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves catalog records and fetches cutouts through an [`ApiTransport`].
#[derive(Debug)]
pub struct IllustrisClient<T> {
    transport: T,
    base_url: String,
}

impl<T: ApiTransport> IllustrisClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: with_trailing_slash(&base_url.into()),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    fn get<R: DeserializeOwned>(&self, url: &str, params: &QueryParams) -> HaloResult<R> {
        let value = self.transport.get_json(url, params)?;
        decode(url, value)
    }

    pub fn resolve_simulation(&self, name: &str) -> HaloResult<SimulationInfo> {
        let listing: SimulationListing = self.get(&self.base_url, &QueryParams::new())?;
        let Some(link) = listing
            .simulations
            .iter()
            .find(|link| link.name.as_deref() == Some(name))
        else {
            let available: Vec<&str> = listing
                .simulations
                .iter()
                .filter_map(|link| link.name.as_deref())
                .collect();
            return Err(HaloError::input_validation(
                "INPUT.SIMULATION",
                format!(
                    "unknown simulation '{name}'; available: {}",
                    available.join(", ")
                ),
            ));
        };

        let record: SimulationRecord = self.get(&link.url, &QueryParams::new())?;
        let simulation = SimulationInfo::from(record);
        debug!(
            simulation = %simulation.name,
            box_size = simulation.box_size,
            "simulation resolved"
        );
        Ok(simulation)
    }

    pub fn snapshot_info(
        &self,
        simulation: &SimulationInfo,
        snapshot: &SnapshotRef,
    ) -> HaloResult<SnapshotInfo> {
        let snapshots_url = with_trailing_slash(&simulation.snapshots_url);
        let url = match snapshot {
            SnapshotRef::Label(label) => format!("{snapshots_url}{label}/"),
            SnapshotRef::Index(index) => {
                let snapshots: Vec<Link> = self.get(&snapshots_url, &QueryParams::new())?;
                let position = list_position(*index, snapshots.len()).ok_or_else(|| {
                    HaloError::input_validation(
                        "INPUT.SNAPSHOT_INDEX",
                        format!(
                            "snapshot index {index} is out of range for {} ({} snapshots)",
                            simulation.name,
                            snapshots.len()
                        ),
                    )
                })?;
                snapshots[position].url.clone()
            }
        };

        let record: SnapshotRecord = self.get(&url, &QueryParams::new())?;
        let info = SnapshotInfo::from(record);
        debug!(%snapshot, number = ?info.number, redshift = info.redshift, "snapshot resolved");
        Ok(info)
    }

    /// Turns a selection into subhalo ids. A filter consumes every result page.
    pub fn locate_subhalos(
        &self,
        snapshot: &SnapshotInfo,
        selection: &SubhaloSelection,
    ) -> HaloResult<Vec<i64>> {
        let filter = match selection {
            SubhaloSelection::Single(id) => return Ok(vec![*id]),
            SubhaloSelection::List(ids) => return Ok(ids.clone()),
            SubhaloSelection::Filter(filter) => filter,
        };

        let mut ids = Vec::new();
        let mut visited = BTreeSet::new();
        let mut next = Some((snapshot.subhalos_url.clone(), filter.clone()));
        while let Some((url, params)) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(HaloError::transport(
                    "TRANSPORT.PAGINATION",
                    format!("subhalo search revisited page {url}"),
                ));
            }
            let page: SubhaloPage = self.get(&url, &params)?;
            ids.extend(page.results.iter().map(|result| result.id));
            next = page
                .next
                .filter(|link| !link.is_empty())
                .map(|link| (link, QueryParams::new()));
        }

        info!(matches = ids.len(), ?filter, "subhalo search finished");
        Ok(ids)
    }

    pub fn subhalo_info(&self, snapshot: &SnapshotInfo, id: i64) -> HaloResult<SubhaloInfo> {
        let url = format!("{}{id}/", with_trailing_slash(&snapshot.subhalos_url));
        let record: SubhaloRecord = self.get(&url, &QueryParams::new())?;
        Ok(SubhaloInfo::from(record))
    }

    /// Downloads the subhalo's particle cutout into `dest_dir`.
    pub fn fetch_cutout(
        &self,
        subhalo: &SubhaloInfo,
        params: &QueryParams,
        dest_dir: &Path,
    ) -> HaloResult<PathBuf> {
        let path = self
            .transport
            .download(&subhalo.cutout_url, params, dest_dir)?;
        info!(subhalo = subhalo.id, path = %path.display(), "cutout fetched");
        Ok(path)
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Position of `index` in a list of `len` items; negative counts from the end.
fn list_position(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}
