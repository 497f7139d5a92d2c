use chrono::NaiveDate;
use itertools::Itertools;
use log::{error, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    aoi::AreaOfInterest,
    assets::{AssetResolver, NdmiBands, ResolvedAsset},
    catalog::{search, Catalog, SceneRecord, SearchOutcome},
    components::BandRaster,
    config::PipelineConfig,
    crs_geo::WGS84,
    errors::{NdmiError, Result},
    fetch::{FetchedRaster, LocalCache, RasterFetcher, Transport},
    ndmi,
    render::{NdmiPlot, Render},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SceneStatus {
    /// A map was written to `path`.
    Rendered { path: PathBuf, mean: f64 },
    /// A map for the acquisition date already existed.
    Skipped { path: PathBuf },
    /// The scene could not be processed; the run went on.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub scene_id: String,
    pub date: NaiveDate,
    pub status: SceneStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No scene in the whole lookback window.
    NoData,
    Processed(Vec<SceneReport>),
}

pub struct Pipeline<C, T, R> {
    config: PipelineConfig,
    catalog: C,
    bands: NdmiBands,
    resolver: AssetResolver,
    fetcher: RasterFetcher<T>,
    renderer: R,
}

impl<C: Catalog, T: Transport, R: Render> Pipeline<C, T, R> {
    /// Pipeline reading the `bands` assets of the scenes `catalog` finds.
    pub fn new(
        config: PipelineConfig,
        bands: NdmiBands,
        catalog: C,
        transport: T,
        renderer: R,
    ) -> Self {
        let fetcher = RasterFetcher::new(transport, LocalCache::new(&config.download_dir));
        Self {
            config,
            resolver: AssetResolver::new(bands.semantics.clone()),
            bands,
            catalog,
            fetcher,
            renderer,
        }
    }

    /// Map file for the acquisition date of `scene`.
    pub fn output_path(&self, scene: &SceneRecord) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}.png", scene.acquisition_date().format("%Y-%m-%d")))
    }

    /// Processes every scene of the nearest day with data.
    ///
    /// Scenes failing for reasons of their own are reported as
    /// [SceneStatus::Failed]; any other error ends the run.
    pub fn run(&self, aoi: &AreaOfInterest) -> Result<RunOutcome> {
        let geometry = aoi.search_geometry().with_crs(WGS84)?.into_geometry();
        let SearchOutcome::Found { scenes, date, .. } = search(
            &self.catalog,
            &geometry,
            self.config.target_date,
            &self.config.search,
        )?
        else {
            info!(
                "no data available for this location in the {} days up to {}",
                self.config.search.lookback_days, self.config.target_date
            );
            return Ok(RunOutcome::NoData);
        };
        info!("found {} scene(s) on {date}", scenes.len());

        fs::create_dir_all(&self.config.download_dir)?;
        fs::create_dir_all(&self.config.output_dir)?;

        let mut reports = Vec::with_capacity(scenes.len());
        for scene in &scenes {
            info!("processing {}", scene.id);
            let status = match self.process(scene, aoi) {
                Ok(status) => status,
                Err(err) if err.aborts_scene_only() => {
                    error!("skipping {}: {err}", scene.id);
                    SceneStatus::Failed {
                        reason: err.to_string(),
                    }
                }
                Err(err) => return Err(err),
            };
            reports.push(SceneReport {
                scene_id: scene.id.clone(),
                date: scene.acquisition_date(),
                status,
            });
        }
        Ok(RunOutcome::Processed(reports))
    }

    fn process(&self, scene: &SceneRecord, aoi: &AreaOfInterest) -> Result<SceneStatus> {
        let output = self.output_path(scene);
        if output.exists() {
            info!("NDMI map already exists: {}", output.display());
            return Ok(SceneStatus::Skipped { path: output });
        }

        let assets = self.resolver.resolve(&scene.assets, &self.bands.keys());
        let urls = assets.iter().map(|asset| asset.href.as_str()).collect_vec();
        let fetched = self.fetcher.fetch(&urls, &scene.id);

        let nir = BandRaster::<f64>::open(band_path(&assets, &fetched, &self.bands.nir)?)?;
        let swir = BandRaster::<f64>::open(band_path(&assets, &fetched, &self.bands.swir)?)?;
        let result = ndmi::compute(&nir, &swir, aoi)?;

        let date_label = scene.acquisition_date().format("%Y-%m-%d").to_string();
        self.renderer
            .render(&NdmiPlot::new(&result, date_label), &output)?;
        Ok(SceneStatus::Rendered {
            path: output,
            mean: result.mean,
        })
    }
}

/// Local file of the first asset of `band` that was fetched.
fn band_path<'a>(
    assets: &[ResolvedAsset],
    fetched: &'a [FetchedRaster],
    band: &str,
) -> Result<&'a Path> {
    assets
        .iter()
        .filter(|asset| asset.band == band)
        .find_map(|asset| fetched.iter().find(|raster| raster.url == asset.href))
        .map(|raster| raster.path.as_path())
        .ok_or_else(|| NdmiError::InsufficientBands {
            band: band.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchOrigin;
    use rstest::rstest;

    fn asset(band: &str, href: &str) -> ResolvedAsset {
        ResolvedAsset {
            band: band.to_string(),
            href: href.to_string(),
        }
    }

    fn fetched(url: &str) -> FetchedRaster {
        FetchedRaster {
            url: url.to_string(),
            path: PathBuf::from(format!("/data/{}", url.rsplit('/').next().unwrap())),
            origin: FetchOrigin::Cached,
        }
    }

    #[rstest]
    fn first_fetched_asset_wins() {
        let assets = [
            asset("b8A", "https://x/missing/B8A.tif"),
            asset("b8A", "https://y/B8A.tif"),
            asset("b8A", "https://z/B8A_copy.tif"),
            asset("b11", "https://x/B11.tif"),
        ];
        let fetched = [
            fetched("https://z/B8A_copy.tif"),
            fetched("https://y/B8A.tif"),
            fetched("https://x/B11.tif"),
        ];
        assert_eq!(
            band_path(&assets, &fetched, "b8A").unwrap(),
            Path::new("/data/B8A.tif")
        );
        assert_eq!(
            band_path(&assets, &fetched, "b11").unwrap(),
            Path::new("/data/B11.tif")
        );
    }

    #[rstest]
    fn missing_band_is_insufficient() {
        let assets = [asset("b8A", "https://x/B8A.tif")];
        let err = band_path(&assets, &[fetched("https://x/B8A.tif")], "b11").unwrap_err();
        assert!(matches!(err, NdmiError::InsufficientBands { ref band } if band == "b11"));
        assert!(err.aborts_scene_only());
    }
}
