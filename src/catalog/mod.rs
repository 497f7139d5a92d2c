//! Scene discovery.
//!
//! A [Catalog] answers single queries. [search] implements the backward
//! walk through time: the target day first, then one day earlier at a time
//! until a day yields scenes or the lookback window is exhausted.

pub mod stac;

use chrono::{DateTime, Days, NaiveDate, Utc};
use geo::MultiPolygon;
use log::{debug, info};

use crate::errors::Result;

pub use stac::StacCatalog;

/// One downloadable file of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAsset {
    pub href: String,
    /// Semantic band label the catalog declares for this asset (e.g. `nir08`).
    pub band_label: Option<String>,
    pub media_type: Option<String>,
}

/// Catalog entry for one acquisition.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub id: String,
    pub acquired: DateTime<Utc>,
    /// Percentage of the scene covered by clouds.
    pub cloud_cover: f64,
    /// Assets keyed by their role, in manifest order.
    pub assets: Vec<(String, SceneAsset)>,
}

impl SceneRecord {
    pub fn acquisition_date(&self) -> NaiveDate {
        self.acquired.date_naive()
    }

    pub fn asset(&self, key: &str) -> Option<&SceneAsset> {
        self.assets
            .iter()
            .find(|(role, _)| role == key)
            .map(|(_, asset)| asset)
    }
}

/// Inclusive range of whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// ISO-8601 interval from the first to the last second of the window.
    pub fn to_interval(&self) -> String {
        format!(
            "{}T00:00:00Z/{}T23:59:59Z",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let date = instant.date_naive();
        self.start <= date && date <= self.end
    }
}

/// A single catalog query.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub collection: String,
    /// Footprint filter, in WGS84.
    pub geometry: MultiPolygon,
    pub window: DateWindow,
    /// Exclusive upper bound on cloud cover.
    pub max_cloud_cover: f64,
}

impl SearchRequest {
    /// Whether a scene satisfies the date and cloud cover filters.
    pub fn admits(&self, scene: &SceneRecord) -> bool {
        scene.cloud_cover < self.max_cloud_cover && self.window.contains(&scene.acquired)
    }
}

pub trait Catalog {
    /// Scenes intersecting the request geometry, in catalog order.
    fn query(&self, request: &SearchRequest) -> Result<Vec<SceneRecord>>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn query(&self, request: &SearchRequest) -> Result<Vec<SceneRecord>> {
        (**self).query(request)
    }
}

/// Filters shared by every query of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub collection: String,
    pub max_cloud_cover: f64,
    /// Days before the target date that may be searched.
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found {
        scenes: Vec<SceneRecord>,
        /// Day the scenes were found on.
        date: NaiveDate,
        /// Days between the target date and `date`.
        offset_days: u32,
    },
    NotFound,
}

/// Nearest day, at or before `target_date`, with at least one scene.
///
/// The first non empty day wins; scenes keep the catalog order.
pub fn search<C: Catalog + ?Sized>(
    catalog: &C,
    geometry: &MultiPolygon,
    target_date: NaiveDate,
    criteria: &SearchCriteria,
) -> Result<SearchOutcome> {
    for offset_days in 0..=criteria.lookback_days {
        let Some(date) = target_date.checked_sub_days(Days::new(u64::from(offset_days))) else {
            break;
        };
        let request = SearchRequest {
            collection: criteria.collection.clone(),
            geometry: geometry.clone(),
            window: DateWindow::day(date),
            max_cloud_cover: criteria.max_cloud_cover,
        };
        debug!("querying {} for {}", request.collection, request.window.to_interval());
        let scenes = catalog.query(&request)?;
        if scenes.is_empty() {
            if offset_days == 0 {
                info!(
                    "no scenes on {target_date}, looking back up to {} days",
                    criteria.lookback_days
                );
            }
            continue;
        }
        if offset_days > 0 {
            info!("data is available for {date}");
        }
        return Ok(SearchOutcome::Found {
            scenes,
            date,
            offset_days,
        });
    }
    Ok(SearchOutcome::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geo::polygon;
    use rstest::{fixture, rstest};
    use std::cell::RefCell;

    /// Scenes held in memory, recording every day asked for.
    struct MemoryCatalog {
        scenes: Vec<SceneRecord>,
        queried: RefCell<Vec<NaiveDate>>,
    }

    impl MemoryCatalog {
        fn new(scenes: Vec<SceneRecord>) -> Self {
            Self {
                scenes,
                queried: RefCell::new(Vec::new()),
            }
        }
    }

    impl Catalog for MemoryCatalog {
        fn query(&self, request: &SearchRequest) -> Result<Vec<SceneRecord>> {
            self.queried.borrow_mut().push(request.window.start);
            Ok(self
                .scenes
                .iter()
                .filter(|scene| request.admits(scene))
                .cloned()
                .collect())
        }
    }

    fn scene(id: &str, date: NaiveDate, cloud_cover: f64) -> SceneRecord {
        SceneRecord {
            id: id.to_string(),
            acquired: Utc.from_utc_datetime(&date.and_hms_opt(10, 56, 21).unwrap()),
            cloud_cover,
            assets: Vec::new(),
        }
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 24).unwrap()
    }

    #[fixture]
    fn criteria() -> SearchCriteria {
        SearchCriteria {
            collection: "sentinel-2-l2a".to_string(),
            max_cloud_cover: 10.,
            lookback_days: 365,
        }
    }

    #[fixture]
    fn aoi() -> MultiPolygon {
        polygon![(x: 88.3, y: 22.5), (x: 88.4, y: 22.5), (x: 88.4, y: 22.6)].into()
    }

    #[rstest]
    fn target_day_hit_needs_one_query(criteria: SearchCriteria, aoi: MultiPolygon) {
        let catalog = MemoryCatalog::new(vec![scene("a", target(), 3.)]);
        let outcome = search(&catalog, &aoi, target(), &criteria).unwrap();
        assert!(matches!(outcome, SearchOutcome::Found { offset_days: 0, .. }));
        assert_eq!(catalog.queried.borrow().len(), 1);
    }

    #[rstest]
    #[case(1)]
    #[case(17)]
    #[case(365)]
    fn fallback_stops_at_first_hit(
        criteria: SearchCriteria,
        aoi: MultiPolygon,
        #[case] k: u32,
    ) {
        let date = target() - Days::new(u64::from(k));
        let older = date - Days::new(3);
        let catalog = MemoryCatalog::new(vec![scene("hit", date, 1.), scene("older", older, 1.)]);

        let outcome = search(&catalog, &aoi, target(), &criteria).unwrap();

        let SearchOutcome::Found {
            scenes,
            date: found,
            offset_days,
        } = outcome
        else {
            panic!("expected scenes for {date}");
        };
        assert_eq!(found, date);
        assert_eq!(offset_days, k);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].id, "hit");
        let queried = catalog.queried.borrow();
        assert_eq!(queried.len() as u32, k + 1);
        assert_eq!(*queried.last().unwrap(), date);
        assert!(queried.iter().all(|day| *day >= date));
    }

    #[rstest]
    fn empty_lookback_is_not_found_and_repeatable(criteria: SearchCriteria, aoi: MultiPolygon) {
        let too_old = target() - Days::new(366);
        let catalog = MemoryCatalog::new(vec![scene("old", too_old, 0.)]);

        for run in 1..=2 {
            let outcome = search(&catalog, &aoi, target(), &criteria).unwrap();
            assert_eq!(outcome, SearchOutcome::NotFound);
            // target day plus one query per lookback day, every run
            assert_eq!(catalog.queried.borrow().len(), run * 366);
        }
    }

    #[rstest]
    #[case(9.99, true)]
    #[case(10., false)]
    #[case(42., false)]
    fn cloud_cover_bound_is_strict(
        aoi: MultiPolygon,
        #[case] cloud_cover: f64,
        #[case] admitted: bool,
    ) {
        let request = SearchRequest {
            collection: "sentinel-2-l2a".to_string(),
            geometry: aoi,
            window: DateWindow::day(target()),
            max_cloud_cover: 10.,
        };
        assert_eq!(request.admits(&scene("s", target(), cloud_cover)), admitted);
    }

    #[rstest]
    fn scenes_keep_catalog_order(criteria: SearchCriteria, aoi: MultiPolygon) {
        let catalog = MemoryCatalog::new(vec![
            scene("second", target(), 5.),
            scene("first", target(), 1.),
        ]);
        let SearchOutcome::Found { scenes, .. } = search(&catalog, &aoi, target(), &criteria).unwrap()
        else {
            panic!("expected scenes");
        };
        let ids: Vec<_> = scenes.iter().map(|scene| scene.id.as_str()).collect();
        assert_eq!(ids, ["second", "first"]);
    }

    #[rstest]
    fn day_window_interval() {
        let window = DateWindow::day(target());
        assert_eq!(
            window.to_interval(),
            "2024-05-24T00:00:00Z/2024-05-24T23:59:59Z"
        );
    }
}
