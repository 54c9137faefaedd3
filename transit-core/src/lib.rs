// transit-core/src/lib.rs

//! The core logic for the light curve transit inspector.
//! This crate is responsible for light curve loading, detrending,
//! phase folding, transit marker placement and the saved candidate
//! catalog. It is completely headless and contains no GUI code.

pub mod catalog;
pub mod config;
pub mod detrend;
pub mod error;
pub mod fold;
pub mod markers;
pub mod series;
pub mod session;
pub mod source;
pub mod stats;
pub mod store;

pub use catalog::{CatalogEntry, TransitCatalog};
pub use config::TransitConfig;
pub use error::{Result, TransitError};
pub use markers::{MarkerLayout, MarkerPhase, RepeatMarker, Repeats, Side, TransitMarkerEngine};
pub use series::TimeSeries;
pub use session::{PlotFrame, Session};
pub use source::{LoadedSeries, RawLightCurve};
pub use store::CatalogStore;
