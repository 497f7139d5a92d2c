use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use sentinel_ndmi::{
    AreaOfInterest, Args, HttpTransport, Pipeline, PipelineConfig, PngRenderer, RunOutcome,
    SceneStatus, StacCatalog,
    sensors::{Sensor, Sentinel2},
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = PipelineConfig::from(Args::parse());

    let aoi = AreaOfInterest::open(&config.aoi_path)
        .with_context(|| format!("failed to load area of interest {}", config.aoi_path.display()))?;
    let catalog = StacCatalog::new(&config.catalog_url, config.max_items)
        .with_context(|| format!("failed to set up catalog client for {}", config.catalog_url))?;
    let transport = HttpTransport::new()?;
    let pipeline = Pipeline::new(
        config,
        Sentinel2::ndmi_bands(),
        catalog,
        transport,
        PngRenderer::default(),
    );

    let reports = match pipeline.run(&aoi)? {
        RunOutcome::NoData => return Ok(()),
        RunOutcome::Processed(reports) => reports,
    };
    for report in &reports {
        match &report.status {
            SceneStatus::Rendered { path, mean } => {
                info!("{} ({}): mean NDMI {mean:.4}, {}", report.scene_id, report.date, path.display())
            }
            SceneStatus::Skipped { path } => {
                info!("{} ({}): kept {}", report.scene_id, report.date, path.display())
            }
            SceneStatus::Failed { reason } => {
                warn!("{} ({}): {reason}", report.scene_id, report.date)
            }
        }
    }
    Ok(())
}
