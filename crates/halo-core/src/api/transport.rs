use crate::common::constants::API_KEY_HEADER;
use crate::domain::{HaloError, HaloResult};
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Query parameters attached to a request. Sorted so requests are reproducible.
pub type QueryParams = BTreeMap<String, String>;

/// Authenticated access to the catalog web API.
pub trait ApiTransport {
    /// GETs a JSON document.
    fn get_json(&self, url: &str, params: &QueryParams) -> HaloResult<Value>;

    /// GETs a binary payload into `dest_dir` and returns the written path.
    fn download(&self, url: &str, params: &QueryParams, dest_dir: &Path) -> HaloResult<PathBuf>;
}

/// Blocking HTTP transport sending the API key header on every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> HaloResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|source| {
            HaloError::internal(
                "INTERNAL.HTTP_CLIENT",
                format!("failed to build HTTP client: {source}"),
            )
        })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }

    fn get(&self, url: &str, params: &QueryParams) -> HaloResult<Response> {
        debug!(url, ?params, "GET");
        let response = self
            .client
            .get(url)
            .query(params)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .map_err(|source| {
                HaloError::transport("TRANSPORT.REQUEST", format!("GET {url} failed: {source}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HaloError::transport(
                "TRANSPORT.STATUS",
                format!("GET {url} returned {status}"),
            ));
        }
        Ok(response)
    }
}

impl ApiTransport for HttpTransport {
    fn get_json(&self, url: &str, params: &QueryParams) -> HaloResult<Value> {
        let response = self.get(url, params)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_json_content_type(&content_type) {
            return Err(HaloError::transport(
                "TRANSPORT.CONTENT_TYPE",
                format!("GET {url} answered '{content_type}' instead of JSON"),
            ));
        }
        response.json().map_err(|source| {
            HaloError::transport(
                "TRANSPORT.DECODE",
                format!("GET {url} returned malformed JSON: {source}"),
            )
        })
    }

    fn download(&self, url: &str, params: &QueryParams, dest_dir: &Path) -> HaloResult<PathBuf> {
        let mut response = self.get(url, params)?;
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| filename_from_url(url));

        fs::create_dir_all(dest_dir).map_err(|source| {
            HaloError::io_system(
                "IO.OUTPUT_DIR",
                format!("failed to create '{}': {}", dest_dir.display(), source),
            )
        })?;
        let path = dest_dir.join(file_name);
        let mut file = fs::File::create(&path).map_err(|source| {
            HaloError::io_system(
                "IO.CUTOUT_WRITE",
                format!("failed to create '{}': {}", path.display(), source),
            )
        })?;
        let bytes = response.copy_to(&mut file).map_err(|source| {
            HaloError::transport(
                "TRANSPORT.BODY",
                format!("GET {url} body could not be saved: {source}"),
            )
        })?;
        file.sync_all().map_err(|source| {
            HaloError::io_system(
                "IO.CUTOUT_WRITE",
                format!("failed to sync '{}': {}", path.display(), source),
            )
        })?;

        debug!(url, path = %path.display(), bytes, "cutout downloaded");
        Ok(path)
    }
}

fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Extracts a bare file name from a `content-disposition` header value.
pub(crate) fn filename_from_disposition(value: &str) -> Option<String> {
    let (_, raw) = value.split_once("filename=")?;
    let raw = raw.split(';').next().unwrap_or(raw).trim().trim_matches('"');
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Fallback file name derived from the last path segment of `url`.
pub(crate) fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .unwrap_or("cutout");
    if segment.ends_with(".hdf5") {
        segment.to_string()
    } else {
        format!("{segment}.hdf5")
    }
}
