use std::fmt::Debug;

mod sentinel2;
pub use sentinel2::Sentinel2;

use crate::assets::{BandSemantics, NdmiBands};

/// Imagery source the catalog is searched for.
pub trait Sensor: Debug {
    /// Catalog collection identifier.
    const COLLECTION: &'static str;
    /// Logical band carrying near infrared reflectance.
    const NIR_BAND: &'static str;
    /// Logical band carrying short wave infrared reflectance.
    const SWIR_BAND: &'static str;

    /// Logical band to catalog semantic label table.
    fn ndmi_semantics() -> BandSemantics;

    /// Bands an NDMI computation needs.
    fn ndmi_bands() -> NdmiBands {
        NdmiBands {
            nir: Self::NIR_BAND.to_string(),
            swir: Self::SWIR_BAND.to_string(),
            semantics: Self::ndmi_semantics(),
        }
    }
}
