use super::CliError;
use super::helpers::*;
use halo_core::api::{HttpTransport, IllustrisClient};
use halo_core::common::config::{FetchConfig, parse_key_value_pairs};
use halo_core::domain::{SimulationInfo, SnapshotInfo, SnapshotRef, SubhaloSelection};
use halo_core::normalize::{NormalizationInput, NormalizerOptions};
use halo_core::pipeline::FetchRequest;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(clap::Args)]
#[command(group(clap::ArgGroup::new("selection").required(true).args(["subhalo", "filter"])))]
pub(super) struct FetchArgs {
    /// Simulation name as listed by the catalog (e.g. Illustris-1)
    #[arg(long)]
    simulation: String,

    /// Snapshot index (negative counts from the end) or label
    #[arg(long, allow_hyphen_values = true)]
    snapshot: String,

    /// Subhalo id to fetch; repeat for several
    #[arg(long, value_name = "ID")]
    subhalo: Vec<i64>,

    /// Subhalo search constraint, e.g. mass__gt=10; repeat for several
    #[arg(long, value_name = "KEY=VALUE")]
    filter: Vec<String>,

    /// Cutout request parameter, e.g. gas=Coordinates,Density
    #[arg(long, value_name = "KEY=VALUE")]
    cutout: Vec<String>,

    /// Directory receiving the archived cutouts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Catalog API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// API key sent with every request
    #[arg(long, env = "ILLUSTRIS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unwrap periodic images around each subhalo before bounding
    #[arg(long)]
    unwrap_periodic: bool,

    /// Write the batch report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct NormalizeArgs {
    /// Downloaded cutout to normalize in place
    #[arg(long)]
    file: PathBuf,

    /// Subhalo position as x,y,z in simulation length units
    #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
    position: [f64; 3],

    #[arg(long, allow_hyphen_values = true)]
    redshift: f64,

    #[arg(long)]
    omega0: f64,

    #[arg(long)]
    omega_lambda: f64,

    #[arg(long)]
    hubble: f64,

    /// Dark matter particle mass
    #[arg(long)]
    mass_dm: f64,

    /// Simulation box width, needed for --unwrap-periodic
    #[arg(long)]
    box_size: Option<f64>,

    #[arg(long, requires = "box_size")]
    unwrap_periodic: bool,
}

pub(super) fn run_fetch_command(args: FetchArgs) -> Result<i32, CliError> {
    let mut config = match &args.config {
        Some(path) => FetchConfig::load(path)?,
        None => FetchConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(api_key) = args.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    config
        .cutout_params
        .extend(parse_key_value_pairs(&args.cutout, "INPUT.CUTOUT_PARAM")?);
    config.unwrap_periodic |= args.unwrap_periodic;

    let api_key = config.require_api_key()?.to_string();
    let snapshot: SnapshotRef = args.snapshot.parse()?;
    let selection = if args.filter.is_empty() {
        SubhaloSelection::List(args.subhalo)
    } else {
        SubhaloSelection::Filter(parse_key_value_pairs(&args.filter, "INPUT.FILTER")?)
    };

    let transport = HttpTransport::new(api_key, Duration::from_secs(config.timeout_secs))?;
    let client = IllustrisClient::new(transport, config.normalized_base_url());
    let request = FetchRequest {
        simulation: args.simulation,
        snapshot,
        selection,
    };
    let report = run_pipeline(client, &config, &request)?;

    for file in &report.files {
        println!("{}", file.path.display());
    }
    if let Some(path) = &args.report {
        write_json_report(path, &report)?;
    }
    info!(archived = report.files.len(), "fetch finished");
    Ok(0)
}

pub(super) fn run_normalize_command(args: NormalizeArgs) -> Result<i32, CliError> {
    let simulation = SimulationInfo {
        name: String::new(),
        omega0: args.omega0,
        omega_lambda: args.omega_lambda,
        hubble_param: args.hubble,
        box_size: args.box_size.unwrap_or_default(),
        dark_matter_particle_mass: args.mass_dm,
        snapshots_url: String::new(),
    };
    let snapshot = SnapshotInfo {
        number: None,
        redshift: args.redshift,
        subhalos_url: String::new(),
    };
    let options = NormalizerOptions {
        periodic_box: args.box_size.filter(|_| args.unwrap_periodic),
    };
    let input = NormalizationInput {
        simulation: &simulation,
        snapshot: &snapshot,
        subhalo_position: args.position,
    };

    let report = normalize_file(&args.file, options, &input)?;
    println!(
        "{}: BoxSize {} NumPart_ThisFile {:?}",
        args.file.display(),
        report.header.box_size,
        report.header.num_part_this_file
    );
    Ok(0)
}
