use chrono::{DateTime, Utc};
use geo::{LineString, MultiPolygon};
use itertools::Itertools;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    catalog::{Catalog, SceneAsset, SceneRecord, SearchRequest},
    errors::{NdmiError, Result},
};

/// Element 84 Earth Search, which serves Sentinel-2 L2A as COGs.
pub const EARTH_SEARCH: &str = "https://earth-search.aws.element84.com/v1";

const PAGE_LIMIT: usize = 100;

/// Blocking client for STAC API item search (`POST /search`).
#[derive(Debug)]
pub struct StacCatalog {
    search_url: String,
    client: reqwest::blocking::Client,
    max_items: usize,
}

impl StacCatalog {
    /// Client for the API rooted at `root`, collecting at most `max_items` per query.
    pub fn new(root: &str, max_items: usize) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            search_url: search_url(root),
            client,
            max_items,
        })
    }

    fn post(&self, url: &str, body: &Value) -> Result<ItemCollection> {
        let response = self.client.post(url).json(body).send()?;
        Self::parse(url, response)
    }

    fn get(&self, url: &str) -> Result<ItemCollection> {
        let response = self.client.get(url).send()?;
        Self::parse(url, response)
    }

    fn parse(url: &str, response: reqwest::blocking::Response) -> Result<ItemCollection> {
        let status = response.status();
        if !status.is_success() {
            return Err(NdmiError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(serde_json::from_str(&response.text()?)?)
    }

    /// Next page, either re-posting the (merged) search body or following a plain link.
    fn follow(&self, link: &Link, body: &Value) -> Result<ItemCollection> {
        match link.method.as_deref() {
            Some(method) if method.eq_ignore_ascii_case("POST") => {
                let next_body = match (&link.body, link.merge.unwrap_or(false)) {
                    (Some(link_body), true) => merge(body.clone(), link_body),
                    (Some(link_body), false) => link_body.clone(),
                    (None, _) => body.clone(),
                };
                self.post(&link.href, &next_body)
            }
            _ => self.get(&link.href),
        }
    }
}

impl Catalog for StacCatalog {
    fn query(&self, request: &SearchRequest) -> Result<Vec<SceneRecord>> {
        let body = search_body(request, PAGE_LIMIT.min(self.max_items));
        let mut page = self.post(&self.search_url, &body)?;
        let mut items = Vec::new();
        loop {
            let next = page.next_link().cloned();
            items.append(&mut page.features);
            if items.len() >= self.max_items {
                break;
            }
            match next {
                Some(link) => {
                    page = self.follow(&link, &body)?;
                    if page.features.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }
        items.truncate(self.max_items);
        debug!("{} returned {} item(s)", self.search_url, items.len());

        Ok(items
            .into_iter()
            .filter_map(|item| match scene_record(item) {
                Ok(scene) if request.admits(&scene) => Some(scene),
                Ok(scene) => {
                    debug!("{} does not match the search filters, skipping", scene.id);
                    None
                }
                Err(err) => {
                    warn!("{err}");
                    None
                }
            })
            .collect())
    }
}

/// `{root}/search`, tolerating trailing slashes and roots that already end in `/search`.
pub fn search_url(root: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.ends_with("/search") {
        root.to_string()
    } else {
        format!("{root}/search")
    }
}

pub fn search_body(request: &SearchRequest, limit: usize) -> Value {
    json!({
        "collections": [request.collection],
        "intersects": to_geojson(&request.geometry),
        "datetime": request.window.to_interval(),
        "query": { "eo:cloud_cover": { "lt": request.max_cloud_cover } },
        "limit": limit,
    })
}

fn to_geojson(geometry: &MultiPolygon) -> Value {
    let ring = |ring: &LineString| ring.coords().map(|coord| [coord.x, coord.y]).collect_vec();
    let coordinates = geometry
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(ring)
                .collect_vec()
        })
        .collect_vec();
    json!({ "type": "MultiPolygon", "coordinates": coordinates })
}

fn merge(mut base: Value, overlay: &Value) -> Value {
    if let (Some(base_object), Some(overlay_object)) = (base.as_object_mut(), overlay.as_object()) {
        for (key, value) in overlay_object {
            base_object.insert(key.clone(), value.clone());
        }
    }
    base
}

#[derive(Debug, Deserialize)]
struct ItemCollection {
    #[serde(default)]
    features: Vec<Item>,
    #[serde(default)]
    links: Vec<Link>,
}

impl ItemCollection {
    fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == "next")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Link {
    rel: String,
    href: String,
    method: Option<String>,
    body: Option<Value>,
    merge: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
    properties: ItemProperties,
    /// Kept as raw JSON so the manifest order survives.
    #[serde(default)]
    assets: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ItemProperties {
    datetime: Option<String>,
    #[serde(rename = "eo:cloud_cover")]
    cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    href: String,
    #[serde(rename = "type")]
    media_type: Option<String>,
    #[serde(rename = "eo:bands", default)]
    bands: Vec<EoBand>,
}

#[derive(Debug, Deserialize)]
struct EoBand {
    common_name: Option<String>,
}

fn scene_record(item: Item) -> Result<SceneRecord> {
    let invalid = |reason: &str| NdmiError::InvalidScene {
        id: item.id.clone(),
        reason: reason.to_string(),
    };
    let acquired = item
        .properties
        .datetime
        .as_deref()
        .and_then(|datetime| DateTime::parse_from_rfc3339(datetime).ok())
        .ok_or_else(|| invalid("missing or malformed datetime"))?
        .with_timezone(&Utc);
    let cloud_cover = item
        .properties
        .cloud_cover
        .ok_or_else(|| invalid("missing eo:cloud_cover"))?;
    let assets = item
        .assets
        .into_iter()
        .map(|(key, value)| -> Result<(String, SceneAsset)> {
            let asset: Asset = serde_json::from_value(value)?;
            let band_label = asset
                .bands
                .into_iter()
                .next()
                .and_then(|band| band.common_name);
            let scene_asset = SceneAsset {
                href: asset.href,
                band_label,
                media_type: asset.media_type,
            };
            Ok((key, scene_asset))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SceneRecord {
        id: item.id,
        acquired,
        cloud_cover,
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DateWindow;
    use chrono::NaiveDate;
    use geo::polygon;
    use rstest::rstest;

    const FIXTURE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "S2B_45QYE_20240524_0_L2A",
      "properties": {
        "datetime": "2024-05-24T04:47:44.024000Z",
        "eo:cloud_cover": 4.2
      },
      "assets": {
        "thumbnail": {
          "href": "https://example.com/45/Q/YE/thumbnail.jpg",
          "type": "image/jpeg"
        },
        "swir16": {
          "href": "https://example.com/45/Q/YE/B11.tif",
          "eo:bands": [{ "name": "B11", "common_name": "swir16" }]
        },
        "nir08": {
          "href": "https://example.com/45/Q/YE/B8A.tif",
          "type": "image/tiff; application=geotiff; profile=cloud-optimized",
          "eo:bands": [{ "name": "B8A", "common_name": "nir08" }]
        }
      }
    },
    {
      "type": "Feature",
      "id": "no-datetime",
      "properties": { "eo:cloud_cover": 1.0 },
      "assets": {}
    }
  ],
  "links": [
    { "rel": "next", "href": "https://example.com/v1/search", "method": "POST", "body": { "next": "abc" }, "merge": true }
  ]
}"#;

    fn collection() -> ItemCollection {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[rstest]
    #[case("https://example.com/v1", "https://example.com/v1/search")]
    #[case("https://example.com/v1/", "https://example.com/v1/search")]
    #[case("https://example.com/v1/search", "https://example.com/v1/search")]
    fn search_urls(#[case] root: &str, #[case] expected: &str) {
        assert_eq!(search_url(root), expected);
    }

    #[rstest]
    fn item_becomes_scene_record() {
        let item = collection().features.into_iter().next().unwrap();
        let scene = scene_record(item).unwrap();
        assert_eq!(scene.id, "S2B_45QYE_20240524_0_L2A");
        assert_eq!(
            scene.acquisition_date(),
            NaiveDate::from_ymd_opt(2024, 5, 24).unwrap()
        );
        assert!((scene.cloud_cover - 4.2).abs() < f64::EPSILON);
        assert_eq!(scene.asset("nir08").unwrap().band_label.as_deref(), Some("nir08"));
        assert_eq!(scene.asset("thumbnail").unwrap().band_label, None);
        assert!(scene.asset("red").is_none());
    }

    #[rstest]
    fn assets_keep_manifest_order() {
        let item = collection().features.into_iter().next().unwrap();
        let scene = scene_record(item).unwrap();
        let roles: Vec<_> = scene.assets.iter().map(|(role, _)| role.as_str()).collect();
        assert_eq!(roles, ["thumbnail", "swir16", "nir08"]);
    }

    #[rstest]
    fn asset_without_href_invalidates_the_item() {
        let item: Item = serde_json::from_value(json!({
            "id": "broken",
            "properties": { "datetime": "2024-05-24T04:47:44Z", "eo:cloud_cover": 1.0 },
            "assets": { "nir08": { "type": "image/tiff" } }
        }))
        .unwrap();
        assert!(matches!(scene_record(item), Err(NdmiError::JsonError(_))));
    }

    #[rstest]
    fn item_without_datetime_is_invalid() {
        let item = collection().features.into_iter().nth(1).unwrap();
        assert!(matches!(
            scene_record(item),
            Err(NdmiError::InvalidScene { id, .. }) if id == "no-datetime"
        ));
    }

    #[rstest]
    fn next_link_merges_into_body() {
        let collection = collection();
        let link = collection.next_link().unwrap();
        let merged = merge(json!({ "limit": 100, "next": "old" }), link.body.as_ref().unwrap());
        assert_eq!(merged, json!({ "limit": 100, "next": "abc" }));
    }

    #[rstest]
    fn request_body_carries_filters() {
        let request = SearchRequest {
            collection: "sentinel-2-l2a".to_string(),
            geometry: polygon![(x: 1., y: 2.), (x: 3., y: 2.), (x: 3., y: 4.)].into(),
            window: DateWindow::day(NaiveDate::from_ymd_opt(2024, 5, 24).unwrap()),
            max_cloud_cover: 10.,
        };
        let body = search_body(&request, 50);
        assert_eq!(body["collections"], json!(["sentinel-2-l2a"]));
        assert_eq!(body["datetime"], "2024-05-24T00:00:00Z/2024-05-24T23:59:59Z");
        assert_eq!(body["query"]["eo:cloud_cover"]["lt"], json!(10.));
        assert_eq!(body["limit"], 50);
        assert_eq!(body["intersects"]["type"], "MultiPolygon");
        assert_eq!(
            body["intersects"]["coordinates"][0][0],
            json!([[1., 2.], [3., 2.], [3., 4.], [1., 2.]])
        );
    }
}
