//! End-to-end batch: resolve, locate, fetch, normalize, archive.

use crate::api::{ApiTransport, IllustrisClient, QueryParams};
use crate::archive::archive;
use crate::common::config::FetchConfig;
use crate::common::constants::NUM_PARTICLE_TYPES;
use crate::domain::{
    HaloResult, SimulationInfo, SnapshotInfo, SnapshotRef, SubhaloInfo, SubhaloSelection,
};
use crate::normalize::{HaloNormalizer, NormalizationInput, NormalizerOptions};
use crate::store::CutoutFormat;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub simulation: String,
    pub snapshot: SnapshotRef,
    pub selection: SubhaloSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedHalo {
    pub subhalo: SubhaloInfo,
    pub path: PathBuf,
    pub num_part_this_file: [i32; NUM_PARTICLE_TYPES],
    pub box_size: f64,
}

/// Outcome of one batch, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub simulation: SimulationInfo,
    pub snapshot: SnapshotInfo,
    pub files: Vec<ArchivedHalo>,
}

pub struct HaloPipeline<T, F> {
    client: IllustrisClient<T>,
    format: F,
    output_dir: PathBuf,
    cutout_params: QueryParams,
    unwrap_periodic: bool,
}

impl<T: ApiTransport, F: CutoutFormat> HaloPipeline<T, F> {
    pub fn new(client: IllustrisClient<T>, format: F, config: &FetchConfig) -> Self {
        Self {
            client,
            format,
            output_dir: config.output_dir.clone(),
            cutout_params: config.cutout_params.clone(),
            unwrap_periodic: config.unwrap_periodic,
        }
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> &IllustrisClient<T> {
        &self.client
    }

    /// Processes every selected subhalo in turn.
    ///
    /// The first failure aborts the batch. Files archived before it stay on disk.
    pub fn run(&self, request: &FetchRequest) -> HaloResult<BatchReport> {
        let simulation = self.client.resolve_simulation(&request.simulation)?;
        let snapshot = self.client.snapshot_info(&simulation, &request.snapshot)?;
        let ids = self.client.locate_subhalos(&snapshot, &request.selection)?;
        let subhalos = ids
            .iter()
            .map(|id| self.client.subhalo_info(&snapshot, *id))
            .collect::<HaloResult<Vec<_>>>()?;

        let normalizer = HaloNormalizer::new(NormalizerOptions {
            periodic_box: self.unwrap_periodic.then_some(simulation.box_size),
        });
        let mut files = Vec::with_capacity(subhalos.len());
        for subhalo in subhalos {
            let downloaded =
                self.client
                    .fetch_cutout(&subhalo, &self.cutout_params, &self.output_dir)?;
            let store = self.format.open_rw(&downloaded)?;
            let report = normalizer.normalize(
                store,
                &NormalizationInput {
                    simulation: &simulation,
                    snapshot: &snapshot,
                    subhalo_position: subhalo.position,
                },
            )?;
            let path = archive(&downloaded, &simulation.name, &request.snapshot)?;
            info!(subhalo = subhalo.id, path = %path.display(), "halo ready");

            files.push(ArchivedHalo {
                subhalo,
                path,
                num_part_this_file: report.header.num_part_this_file,
                box_size: report.header.box_size,
            });
        }

        Ok(BatchReport {
            simulation,
            snapshot,
            files,
        })
    }
}
