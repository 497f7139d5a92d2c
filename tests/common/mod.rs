#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use gdal::{raster::Buffer, spatial_ref::SpatialRef, DriverManager};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use sentinel_ndmi::{
    catalog::{Catalog, SceneAsset, SceneRecord, SearchRequest},
    render::{NdmiPlot, Render},
    NdmiError, PngRenderer, Result,
};

pub const UTM_45N: u32 = 32645;
/// 10 m pixels, north up.
pub const GEO_TRANSFORM: [f64; 6] = [600_000., 10., 0., 2_500_000., 0., -10.];

/// Writes a square single band GeoTIFF in UTM 45N.
pub fn write_band(path: &Path, size: usize, value: impl Fn(usize, usize) -> f64) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f64, _>(path, size, size, 1)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(UTM_45N).unwrap())
        .unwrap();
    let data = (0..size * size)
        .map(|index| value(index / size, index % size))
        .collect();
    let mut buffer = Buffer::new((size, size), data);
    dataset
        .rasterband(1)
        .unwrap()
        .write((0, 0), (size, size), &mut buffer)
        .unwrap();
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn scene(id: &str, acquired: NaiveDate, assets: &[(&str, &str)]) -> SceneRecord {
    SceneRecord {
        id: id.to_string(),
        acquired: Utc.from_utc_datetime(&acquired.and_hms_opt(4, 47, 44).unwrap()),
        cloud_cover: 3.,
        assets: assets
            .iter()
            .map(|(label, href)| {
                let asset = SceneAsset {
                    href: href.to_string(),
                    band_label: Some(label.to_string()),
                    media_type: Some("image/tiff; application=geotiff".to_string()),
                };
                (label.to_string(), asset)
            })
            .collect(),
    }
}

/// Scenes held in memory, counting queries.
pub struct MemoryCatalog {
    scenes: Vec<SceneRecord>,
    pub queries: Cell<usize>,
}

impl MemoryCatalog {
    pub fn new(scenes: Vec<SceneRecord>) -> Self {
        Self {
            scenes,
            queries: Cell::new(0),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn query(&self, request: &SearchRequest) -> Result<Vec<SceneRecord>> {
        self.queries.set(self.queries.get() + 1);
        Ok(self
            .scenes
            .iter()
            .filter(|scene| request.admits(scene))
            .cloned()
            .collect())
    }
}

/// Serves files from a directory by URL, counting requests.
pub struct CountingTransport {
    files: HashMap<String, PathBuf>,
    pub requests: RefCell<Vec<String>>,
}

impl CountingTransport {
    pub fn new(files: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        Self {
            files: files.into_iter().collect(),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl sentinel_ndmi::Transport for CountingTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        match self.files.get(url) {
            Some(path) => Ok(fs::read(path)?),
            None => Err(NdmiError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Small PNG renderer, counting calls.
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: Cell<usize>,
}

impl Render for CountingRenderer {
    fn render(&self, plot: &NdmiPlot<'_>, output: &Path) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        PngRenderer::new(300, 300).render(plot, output)
    }
}
