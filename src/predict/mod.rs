mod error;
mod event_finder;
mod ground_station;
mod illumination;
mod propagation;
mod tle_loader;

pub use error::PredictError;
pub use event_finder::{find_events, sample_events};
pub use ground_station::GroundStation;
pub use illumination::{is_sunlit, sun_position_km};
pub use propagation::look_at;
pub use tle_loader::{TleCatalog, TleEntry};

#[cfg(test)]
pub(crate) use tle_loader::tests as test_support;
