use anyhow::Context;
use halo_core::api::{HttpTransport, IllustrisClient};
use halo_core::common::config::FetchConfig;
use halo_core::domain::HaloResult;
use halo_core::normalize::{NormalizationInput, NormalizationReport, NormalizerOptions};
use halo_core::pipeline::{BatchReport, FetchRequest};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Parses `x,y,z` into a position.
pub(super) fn parse_position(value: &str) -> Result<[f64; 3], String> {
    let components = value
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", component.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match components.as_slice() {
        [x, y, z] if [x, y, z].iter().all(|value| value.is_finite()) => Ok([*x, *y, *z]),
        [_, _, _] => Err("position components must be finite".to_string()),
        _ => Err(format!(
            "expected three comma-separated components, got {}",
            components.len()
        )),
    }
}

pub(super) fn write_json_report<T: Serialize>(path: &Path, report: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create report directory '{}'", parent.display())
        })?;
    }
    let mut rendered = serde_json::to_string_pretty(report).context("failed to render report")?;
    rendered.push('\n');
    fs::write(path, rendered)
        .with_context(|| format!("failed to write report '{}'", path.display()))
}

#[cfg(not(feature = "hdf5"))]
fn hdf5_disabled() -> halo_core::domain::HaloError {
    halo_core::domain::HaloError::input_validation(
        "INPUT.HDF5_DISABLED",
        "this build cannot open HDF5 cutouts; rebuild with the default `hdf5` feature",
    )
}

#[cfg(feature = "hdf5")]
pub(super) fn run_pipeline(
    client: IllustrisClient<HttpTransport>,
    config: &FetchConfig,
    request: &FetchRequest,
) -> HaloResult<BatchReport> {
    use halo_core::pipeline::HaloPipeline;
    use halo_core::store::Hdf5Format;

    HaloPipeline::new(client, Hdf5Format, config).run(request)
}

#[cfg(not(feature = "hdf5"))]
pub(super) fn run_pipeline(
    _client: IllustrisClient<HttpTransport>,
    _config: &FetchConfig,
    _request: &FetchRequest,
) -> HaloResult<BatchReport> {
    Err(hdf5_disabled())
}

#[cfg(feature = "hdf5")]
pub(super) fn normalize_file(
    path: &Path,
    options: NormalizerOptions,
    input: &NormalizationInput<'_>,
) -> HaloResult<NormalizationReport> {
    use halo_core::normalize::HaloNormalizer;
    use halo_core::store::Hdf5ParticleFile;

    let store = Hdf5ParticleFile::open_rw(path)?;
    HaloNormalizer::new(options).normalize(store, input)
}

#[cfg(not(feature = "hdf5"))]
pub(super) fn normalize_file(
    _path: &Path,
    _options: NormalizerOptions,
    _input: &NormalizationInput<'_>,
) -> HaloResult<NormalizationReport> {
    Err(hdf5_disabled())
}
