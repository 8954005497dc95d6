//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while cleaning and fitting
//! - exported to CSV/JSON
//! - reloaded later for training, EDA, or serving

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A numerical stellar property carried through the pipeline.
///
/// After processing, units are:
/// - `M`: log10 of mass in kg
/// - `L`: log10 of luminosity in W
/// - `met`: log10 of the Fe/H number fraction
/// - `Teff`: kelvin
/// - `R`: solar radii
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "M")]
    Mass,
    #[serde(rename = "L")]
    Luminosity,
    #[serde(rename = "Teff")]
    Teff,
    #[serde(rename = "R")]
    Radius,
    #[serde(rename = "met")]
    Metallicity,
}

impl Feature {
    /// Column order used for reports and the cleaned CSV.
    pub const ALL: [Feature; 5] = [
        Feature::Mass,
        Feature::Luminosity,
        Feature::Teff,
        Feature::Radius,
        Feature::Metallicity,
    ];

    /// Column name in the cleaned catalog.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Mass => "M",
            Feature::Luminosity => "L",
            Feature::Teff => "Teff",
            Feature::Radius => "R",
            Feature::Metallicity => "met",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Feature::Mass => "log10 kg",
            Feature::Luminosity => "log10 W",
            Feature::Teff => "K",
            Feature::Radius => "R_sun",
            Feature::Metallicity => "log10 Fe/H",
        }
    }
}

/// A complete set of stellar features (all present).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub mass: f64,
    pub luminosity: f64,
    pub teff: f64,
    pub radius: f64,
    pub metallicity: f64,
}

impl Features {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Mass => self.mass,
            Feature::Luminosity => self.luminosity,
            Feature::Teff => self.teff,
            Feature::Radius => self.radius,
            Feature::Metallicity => self.metallicity,
        }
    }

    pub fn all_finite(&self) -> bool {
        Feature::ALL.into_iter().all(|f| self.get(f).is_finite())
    }
}

/// Features where any value may be missing (Gaia coverage is partial).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialFeatures {
    pub mass: Option<f64>,
    pub luminosity: Option<f64>,
    pub teff: Option<f64>,
    pub radius: Option<f64>,
    pub metallicity: Option<f64>,
}

impl PartialFeatures {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Mass => self.mass,
            Feature::Luminosity => self.luminosity,
            Feature::Teff => self.teff,
            Feature::Radius => self.radius,
            Feature::Metallicity => self.metallicity,
        }
    }

    /// Per feature: our value when present, else `fallback`'s.
    pub fn combine_first(&self, fallback: &PartialFeatures) -> PartialFeatures {
        PartialFeatures {
            mass: self.mass.or(fallback.mass),
            luminosity: self.luminosity.or(fallback.luminosity),
            teff: self.teff.or(fallback.teff),
            radius: self.radius.or(fallback.radius),
            metallicity: self.metallicity.or(fallback.metallicity),
        }
    }

    /// `Some` only when every feature is present.
    pub fn complete(&self) -> Option<Features> {
        Some(Features {
            mass: self.mass?,
            luminosity: self.luminosity?,
            teff: self.teff?,
            radius: self.radius?,
            metallicity: self.metallicity?,
        })
    }
}

impl From<Features> for PartialFeatures {
    fn from(value: Features) -> Self {
        PartialFeatures {
            mass: Some(value.mass),
            luminosity: Some(value.luminosity),
            teff: Some(value.teff),
            radius: Some(value.radius),
            metallicity: Some(value.metallicity),
        }
    }
}

/// A raw row of the NEA stellar-hosts table (everything optional).
///
/// Solar units as published: `st_mass` in M_sun, `st_lum` in log10 L_sun,
/// `st_met` in dex, `st_teff` in K, `st_rad` in R_sun.
#[derive(Debug, Clone, Default)]
pub struct NeaRecord {
    pub tic_id: Option<String>,
    pub refname: Option<String>,
    pub spectype: Option<String>,
    pub metratio: Option<String>,
    pub mass: Option<f64>,
    pub lum: Option<f64>,
    pub met: Option<f64>,
    pub teff: Option<f64>,
    pub rad: Option<f64>,
}

/// A cleaned NEA star (one per TIC id, converted units).
#[derive(Debug, Clone, PartialEq)]
pub struct NeaStar {
    /// TIC id exactly as published (e.g. `TIC 142748283`).
    pub tic_id: String,
    /// Numeric part of the TIC id, used for cross-referencing.
    pub tic_number: Option<u64>,
    pub refname: String,
    pub spectype: String,
    pub features: Features,
}

/// One TIC -> Gaia DR3 cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossMatch {
    pub tic_id: u64,
    pub gaia_dr3_id: u64,
}

/// A Gaia DR3 astrophysical-parameters row.
///
/// Before cleaning the features hold the published values (solar units, dex);
/// after `prep::gaia::process` they hold converted values.
#[derive(Debug, Clone, PartialEq)]
pub struct GaiaStar {
    pub source_id: u64,
    pub features: PartialFeatures,
    pub spectype: Option<String>,
    pub evolstage: Option<f64>,
}

/// A star after the cross-catalog join, before joined-set cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedStar {
    pub tic_id: String,
    pub gaia_id: u64,
    pub nea: Features,
    pub gaia: PartialFeatures,
    pub spectype_nea: String,
    pub spectype_gaia: Option<String>,
    pub evolstage: Option<f64>,
}

/// A fully cleaned star: one row of the cleaned catalog CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub tic_id: String,
    pub gaia_id: u64,
    pub spectype: String,
    #[serde(rename = "M")]
    pub mass: f64,
    #[serde(rename = "L")]
    pub luminosity: f64,
    #[serde(rename = "Teff")]
    pub teff: f64,
    #[serde(rename = "R")]
    pub radius: f64,
    #[serde(rename = "met")]
    pub metallicity: f64,
}

impl Star {
    pub fn new(tic_id: String, gaia_id: u64, spectype: String, features: Features) -> Self {
        Star {
            tic_id,
            gaia_id,
            spectype,
            mass: features.mass,
            luminosity: features.luminosity,
            teff: features.teff,
            radius: features.radius,
            metallicity: features.metallicity,
        }
    }

    pub fn features(&self) -> Features {
        Features {
            mass: self.mass,
            luminosity: self.luminosity,
            teff: self.teff,
            radius: self.radius,
            metallicity: self.metallicity,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.features().get(feature)
    }
}

/// Harvard spectral sequence, hottest first. Used for ordering categories.
pub const SPECTRAL_ORDER: [&str; 7] = ["O", "B", "A", "F", "G", "K", "M"];

/// Well-known stars drawn next to the catalog on mass-luminosity diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceStar {
    #[serde(rename = "Name")]
    pub name: &'static str,
    /// Solar luminosities.
    #[serde(rename = "L")]
    pub luminosity: f64,
    /// Solar masses.
    #[serde(rename = "M")]
    pub mass: f64,
    #[serde(rename = "Info")]
    pub info: &'static str,
}

pub const REFERENCE_STARS: [ReferenceStar; 4] = [
    ReferenceStar {
        name: "\u{3b1} Canis Majoris A",
        luminosity: 24.7,
        mass: 2.06,
        info: "Also known as Sirius, the brightest star in the night sky",
    },
    ReferenceStar {
        name: "\u{3b1} Piscis Austrini",
        luminosity: 16.63,
        mass: 1.92,
        info: "Was assumed to host the first exoplanet imaged at visible\nwavelengths; it later turned out to be a dust cloud",
    },
    ReferenceStar {
        name: "Sun",
        luminosity: 1.0,
        mass: 1.0,
        info: "Centerpiece of our Solar System",
    },
    ReferenceStar {
        name: "\u{3b1} Centauri C",
        luminosity: 0.001567,
        mass: 0.1221,
        info: "Our closest extrasolar neighbor",
    },
];

/// Configuration of a `stellar prepare` run (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub nea_path: PathBuf,
    /// Local TIC -> Gaia cross-reference CSV; fetched over TAP when absent.
    pub crossref_path: Option<PathBuf>,
    /// Local Gaia astrophysical-parameters CSV; fetched over TAP when absent.
    pub gaia_path: Option<PathBuf>,
    /// Where fetched TAP tables are cached as CSV.
    pub cache_dir: Option<PathBuf>,
    pub out_path: PathBuf,
    /// Optional intermediate exports of the per-source tables.
    pub nea_out: Option<PathBuf>,
    pub gaia_out: Option<PathBuf>,
    /// Write the EDA report and charts here when set.
    pub eda_dir: Option<PathBuf>,
    /// z-score threshold for outlier removal; `None` disables the filter.
    pub outlier_threshold: Option<f64>,
}

/// Configuration of a `stellar train` run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub model_out: PathBuf,
    /// Fraction of rows held out for testing (0, 1).
    pub test_size: f64,
    pub seed: u64,
    pub folds: usize,
}

/// Configuration of `stellar serve`.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub model_path: PathBuf,
    pub data_path: PathBuf,
    pub static_dir: PathBuf,
    pub addr: SocketAddr,
}
