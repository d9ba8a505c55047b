//! Client for the Illustris catalog web API: simulation and snapshot
//! resolution, subhalo search and cutout downloads.

mod catalog;
mod records;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use catalog::IllustrisClient;
pub use transport::{ApiTransport, HttpTransport, QueryParams};
