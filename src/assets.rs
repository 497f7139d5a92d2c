use log::warn;

use crate::catalog::SceneAsset;

/// Ordered table from logical band keys to the semantic label a catalog declares.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSemantics(Vec<(String, String)>);

impl<const N: usize> From<[(&str, &str); N]> for BandSemantics {
    fn from(value: [(&str, &str); N]) -> Self {
        Self(
            value
                .into_iter()
                .map(|(band, label)| (band.to_string(), label.to_string()))
                .collect(),
        )
    }
}

impl BandSemantics {
    pub fn label(&self, band: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == band)
            .map(|(_, label)| label.as_str())
    }
}

/// Near and short wave infrared band keys, with the labels identifying them in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct NdmiBands {
    pub nir: String,
    pub swir: String,
    pub semantics: BandSemantics,
}

impl NdmiBands {
    /// Bands from `(key, label)` pairs.
    pub fn new(nir: (&str, &str), swir: (&str, &str)) -> Self {
        Self {
            nir: nir.0.to_string(),
            swir: swir.0.to_string(),
            semantics: BandSemantics::from([nir, swir]),
        }
    }

    /// NIR first.
    pub fn keys(&self) -> [&str; 2] {
        [&self.nir, &self.swir]
    }
}

/// Download link chosen for a logical band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub band: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    semantics: BandSemantics,
    extension: String,
}

impl AssetResolver {
    pub fn new(semantics: BandSemantics) -> Self {
        Self {
            semantics,
            extension: "tif".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    /// Every asset declaring the label of a required band and linking a raster file.
    ///
    /// Results are grouped by band in request order, then follow the
    /// manifest order. Several assets may match the same band; all of them
    /// are returned.
    pub fn resolve(
        &self,
        assets: &[(String, SceneAsset)],
        required_bands: &[&str],
    ) -> Vec<ResolvedAsset> {
        let mut resolved = Vec::new();
        for band in required_bands {
            let Some(label) = self.semantics.label(band) else {
                warn!("band {band} not found in band semantics, skipping");
                continue;
            };
            resolved.extend(
                assets
                    .iter()
                    .map(|(_, asset)| asset)
                    .filter(|asset| asset.band_label.as_deref() == Some(label))
                    .filter(|asset| asset.href.ends_with(self.extension.as_str()))
                    .map(|asset| ResolvedAsset {
                        band: band.to_string(),
                        href: asset.href.clone(),
                    }),
            );
        }
        resolved
    }
}
