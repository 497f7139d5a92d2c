use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::{
    catalog::{stac::EARTH_SEARCH, SearchCriteria},
    sensors::{Sensor, Sentinel2},
};

/// Map the NDMI of the nearest cloud free Sentinel-2 scene over an area of interest.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Vector file (shapefile, GeoJSON, ...) holding the area of interest
    #[arg(long, env = "NDMI_AOI", default_value = "shp/AOI.shp")]
    pub aoi: PathBuf,

    /// Acquisition date to look for, YYYY-MM-DD
    #[arg(long, env = "NDMI_DATE")]
    pub date: NaiveDate,

    /// Scenes must have strictly less cloud cover than this percentage
    #[arg(long, env = "NDMI_CLOUD_COVER", default_value_t = 10.)]
    pub cloud_cover: f64,

    /// Days before --date that may be searched when it has no scenes
    #[arg(long, env = "NDMI_LOOKBACK_DAYS", default_value_t = 365)]
    pub lookback_days: u32,

    /// Directory relative paths are resolved against
    #[arg(long, env = "NDMI_PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Root of the STAC API to search
    #[arg(long, env = "NDMI_CATALOG_URL", default_value = EARTH_SEARCH)]
    pub catalog_url: String,

    /// Catalog collection to search
    #[arg(long, env = "NDMI_COLLECTION", default_value = Sentinel2::COLLECTION)]
    pub collection: String,

    /// Where band rasters are downloaded to
    #[arg(long, env = "NDMI_DOWNLOAD_DIR", default_value = "data")]
    pub download_dir: PathBuf,

    /// Where maps are written to
    #[arg(long, env = "NDMI_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Most items collected from the catalog per query
    #[arg(long, env = "NDMI_MAX_ITEMS", default_value_t = 100)]
    pub max_items: usize,
}

/// Settings of one run, fixed once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub aoi_path: PathBuf,
    pub target_date: NaiveDate,
    pub search: SearchCriteria,
    pub catalog_url: String,
    pub max_items: usize,
    pub download_dir: PathBuf,
    pub output_dir: PathBuf,
}

fn resolve(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        let root = args.project_root;
        Self {
            aoi_path: resolve(&root, args.aoi),
            target_date: args.date,
            search: SearchCriteria {
                collection: args.collection,
                max_cloud_cover: args.cloud_cover,
                lookback_days: args.lookback_days,
            },
            catalog_url: args.catalog_url,
            max_items: args.max_items,
            download_dir: resolve(&root, args.download_dir),
            output_dir: resolve(&root, args.output_dir),
        }
    }
}
