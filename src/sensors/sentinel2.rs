use super::Sensor;
use crate::assets::BandSemantics;

/// Sentinel-2 MSI, level 2A surface reflectance.
#[derive(Debug)]
pub struct Sentinel2;

impl Sensor for Sentinel2 {
    const COLLECTION: &'static str = "sentinel-2-l2a";
    const NIR_BAND: &'static str = "b8A";
    const SWIR_BAND: &'static str = "b11";

    fn ndmi_semantics() -> BandSemantics {
        BandSemantics::from([(Self::NIR_BAND, "nir08"), (Self::SWIR_BAND, "swir16")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("b8A", Some("nir08"))]
    #[case("b11", Some("swir16"))]
    #[case("b04", None)]
    fn ndmi_band_labels(#[case] band: &str, #[case] label: Option<&str>) {
        assert_eq!(Sentinel2::ndmi_semantics().label(band), label);
    }

    #[rstest]
    fn nir_comes_first() {
        let bands = Sentinel2::ndmi_bands();
        assert_eq!(bands.keys(), ["b8A", "b11"]);
        assert_eq!(bands.semantics, Sentinel2::ndmi_semantics());
    }
}
