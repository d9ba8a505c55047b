//! Scripted transport standing in for the catalog API in unit tests.

use super::{ApiTransport, QueryParams};
use crate::domain::{HaloError, HaloResult};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const BASE_URL: &str = "http://api.test/";
pub(crate) const SIM_URL: &str = "http://api.test/Illustris-1/";
pub(crate) const SNAPSHOTS_URL: &str = "http://api.test/Illustris-1/snapshots/";
pub(crate) const SUBHALOS_URL: &str = "http://api.test/Illustris-1/snapshots/135/subhalos/";

#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    json: BTreeMap<String, Value>,
    downloads: BTreeMap<String, String>,
    requests: RefCell<Vec<String>>,
}

pub(crate) fn request_key(url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{url}?{}", query.join("&"))
}

pub(crate) fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_json(mut self, url: &str, query: &[(&str, &str)], body: Value) -> Self {
        self.json.insert(request_key(url, &params(query)), body);
        self
    }

    pub(crate) fn with_download(mut self, url: &str, file_name: &str) -> Self {
        self.downloads.insert(url.to_string(), file_name.to_string());
        self
    }

    pub(crate) fn with_subhalo(self, id: i64, position: [f64; 3]) -> Self {
        let record_url = format!("{SUBHALOS_URL}{id}/");
        let cutout_url = format!("{record_url}cutout.hdf5");
        self.with_json(
            &record_url,
            &[],
            json!({
                "id": id,
                "pos_x": position[0],
                "pos_y": position[1],
                "pos_z": position[2],
                "mass": 12.5,
                "cutouts": { "subhalo": cutout_url, "parent_halo": "unused" }
            }),
        )
        .with_download(&cutout_url, &format!("cutout_{id}.hdf5"))
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn record(&self, key: String) {
        self.requests.borrow_mut().push(key);
    }
}

/// A catalog with two simulations and two snapshots of `Illustris-1`.
pub(crate) fn illustris_catalog() -> ScriptedTransport {
    let snapshot = |number: i64, redshift: f64| {
        json!({
            "number": number,
            "redshift": redshift,
            "subhalos": format!("{SNAPSHOTS_URL}{number}/subhalos/"),
        })
    };
    ScriptedTransport::new()
        .with_json(
            BASE_URL,
            &[],
            json!({
                "simulations": [
                    { "name": "TNG100-1", "url": "http://api.test/TNG100-1/" },
                    { "name": "Illustris-1", "url": SIM_URL },
                ]
            }),
        )
        .with_json(
            SIM_URL,
            &[],
            json!({
                "name": "Illustris-1",
                "omega_0": 0.2726,
                "omega_L": 0.7274,
                "hubble": 0.704,
                "mass_dm": 0.0004430565,
                "boxsize": 75000.0,
                "num_snapshots": 136,
                "snapshots": SNAPSHOTS_URL,
            }),
        )
        .with_json(
            SNAPSHOTS_URL,
            &[],
            json!([
                { "number": 134, "redshift": 0.0099, "url": format!("{SNAPSHOTS_URL}134/") },
                { "number": 135, "redshift": 0.0, "url": format!("{SNAPSHOTS_URL}135/") },
            ]),
        )
        .with_json(&format!("{SNAPSHOTS_URL}134/"), &[], snapshot(134, 0.0099))
        .with_json(&format!("{SNAPSHOTS_URL}135/"), &[], snapshot(135, 0.0))
        .with_json(&format!("{SNAPSHOTS_URL}z=0/"), &[], snapshot(135, 0.0))
}

impl ApiTransport for ScriptedTransport {
    fn get_json(&self, url: &str, params: &QueryParams) -> HaloResult<Value> {
        let key = request_key(url, params);
        self.record(key.clone());
        self.json.get(&key).cloned().ok_or_else(|| {
            HaloError::transport("TRANSPORT.STATUS", format!("GET {key} returned 404 Not Found"))
        })
    }

    fn download(&self, url: &str, params: &QueryParams, dest_dir: &Path) -> HaloResult<PathBuf> {
        let key = request_key(url, params);
        self.record(key.clone());
        let file_name = self.downloads.get(url).ok_or_else(|| {
            HaloError::transport("TRANSPORT.STATUS", format!("GET {key} returned 404 Not Found"))
        })?;
        let path = dest_dir.join(file_name);
        fs::write(&path, b"cutout").map_err(|source| {
            HaloError::io_system("IO.CUTOUT_WRITE", format!("{}: {source}", path.display()))
        })?;
        Ok(path)
    }
}
