pub mod aoi;
pub mod assets;
pub mod catalog;
pub mod components;
pub mod config;
pub mod crs_geo;
pub mod errors;
pub mod fetch;
pub mod intersection;
pub mod ndmi;
pub mod pipeline;
pub mod render;
pub mod sensors;

pub use aoi::AreaOfInterest;
pub use assets::NdmiBands;
pub use catalog::{Catalog, SceneRecord, StacCatalog};
pub use components::{BandRaster, NdmiRaster};
pub use config::{Args, PipelineConfig};
pub use errors::{NdmiError, Result};
pub use fetch::{HttpTransport, Transport};
pub use pipeline::{Pipeline, RunOutcome, SceneReport, SceneStatus};
pub use render::{PngRenderer, Render};
