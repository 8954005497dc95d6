//! Command-line parsing for the `stellar` binary.
//!
//! Argument parsing lives here; dispatch lives in `app`. Each subcommand's
//! args convert into a domain config so the pipeline never sees clap types.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{PrepareConfig, ServeConfig, TrainConfig};
use crate::prep::DEFAULT_Z_THRESHOLD;

/// Asset directory served by `stellar serve`; the Graphs page loads the EDA charts from it.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "stellar", version, about = "Main-sequence stellar mass from luminosity and metallicity")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean and join the NEA and Gaia DR3 catalogs into the modeling catalog.
    Prepare(PrepareArgs),
    /// Fit the linear mass model on a cleaned catalog and write the artifact.
    Train(TrainArgs),
    /// `prepare` followed by `train`.
    Run(RunArgs),
    /// Write the EDA report and charts for a cleaned catalog.
    Eda(EdaArgs),
    /// Print variance inflation factors of the model predictors.
    Vif(DataArgs),
    /// Predict a mass from luminosity and metallicity.
    Predict(PredictArgs),
    /// Serve the web app and the prediction API.
    Serve(ServeArgs),
    /// Write a synthetic cleaned catalog (offline demo data).
    Sample(SampleArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PrepareArgs {
    /// NEA stellar-hosts CSV export.
    #[arg(long, value_name = "CSV")]
    pub nea: PathBuf,

    /// Local TIC -> Gaia DR3 cross-reference CSV (queried over TAP when omitted).
    #[arg(long, value_name = "CSV")]
    pub crossref: Option<PathBuf>,

    /// Local Gaia DR3 astrophysical-parameters CSV (queried over TAP when omitted).
    #[arg(long, value_name = "CSV")]
    pub gaia: Option<PathBuf>,

    /// Cache directory for tables fetched over TAP.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Cleaned catalog output.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub out: PathBuf,

    /// Also export the cleaned NEA table.
    #[arg(long, value_name = "CSV")]
    pub nea_out: Option<PathBuf>,

    /// Also export the cleaned Gaia table.
    #[arg(long, value_name = "CSV")]
    pub gaia_out: Option<PathBuf>,

    /// Write the EDA report and charts into this directory. Use the serve
    /// static dir (`--eda-dir static`) to show them on the Graphs page.
    #[arg(long, value_name = "DIR")]
    pub eda_dir: Option<PathBuf>,

    /// z-score threshold for outlier removal.
    #[arg(long, default_value_t = DEFAULT_Z_THRESHOLD)]
    pub z_threshold: f64,

    /// Keep outliers.
    #[arg(long)]
    pub no_outliers: bool,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Model artifact output.
    #[arg(short, long, default_value = "linear_model.json")]
    pub model: PathBuf,

    /// Fraction of rows held out for testing.
    #[arg(long, default_value_t = 0.25)]
    pub test_size: f64,

    /// Random seed for the split and the folds.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Number of cross-validation folds.
    #[arg(long, default_value_t = 5)]
    pub folds: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Cleaned catalog CSV.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub data: PathBuf,

    #[command(flatten)]
    pub fit: FitArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub prepare: PrepareArgs,

    #[command(flatten)]
    pub fit: FitArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Cleaned catalog CSV.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub data: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct EdaArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory for `eda_report.txt` and the SVG charts. The default
    /// is the directory `stellar serve` reads for the Graphs page.
    #[arg(short, long, default_value = DEFAULT_STATIC_DIR)]
    pub out_dir: PathBuf,

    /// z-score threshold for the outlier section.
    #[arg(long, default_value_t = DEFAULT_Z_THRESHOLD)]
    pub z_threshold: f64,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Luminosity in solar luminosities.
    #[arg(short = 'l', long)]
    pub luminosity: f64,

    /// Metallicity as [Fe/H] in dex.
    #[arg(short = 'f', long, allow_negative_numbers = true)]
    pub metallicity: f64,

    /// Model artifact written by `stellar train`.
    #[arg(short, long, default_value = "linear_model.json")]
    pub model: PathBuf,

    /// Catalog drawn behind the prediction.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub data: PathBuf,

    /// Render the ASCII mass-luminosity diagram.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Model artifact written by `stellar train`.
    #[arg(short, long, default_value = "linear_model.json")]
    pub model: PathBuf,

    /// Cleaned catalog CSV for the diagram.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub data: PathBuf,

    /// Directory holding `index.html` and other static assets.
    #[arg(long, default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: PathBuf,

    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV.
    #[arg(short, long, default_value = "joined_out.csv")]
    pub out: PathBuf,

    /// Number of stars.
    #[arg(short = 'n', long, default_value_t = 400)]
    pub count: usize,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Scatter of log10 L around the mass-luminosity relation (dex).
    #[arg(long, default_value_t = 0.08)]
    pub scatter: f64,
}

impl PrepareArgs {
    pub fn to_config(&self) -> PrepareConfig {
        PrepareConfig {
            nea_path: self.nea.clone(),
            crossref_path: self.crossref.clone(),
            gaia_path: self.gaia.clone(),
            cache_dir: self.cache_dir.clone(),
            out_path: self.out.clone(),
            nea_out: self.nea_out.clone(),
            gaia_out: self.gaia_out.clone(),
            eda_dir: self.eda_dir.clone(),
            outlier_threshold: (!self.no_outliers).then_some(self.z_threshold),
        }
    }
}

impl FitArgs {
    pub fn to_config(&self, data_path: PathBuf) -> TrainConfig {
        TrainConfig {
            data_path,
            model_out: self.model.clone(),
            test_size: self.test_size,
            seed: self.seed,
            folds: self.folds,
        }
    }
}

impl ServeArgs {
    pub fn to_config(&self) -> ServeConfig {
        ServeConfig {
            model_path: self.model.clone(),
            data_path: self.data.clone(),
            static_dir: self.static_dir.clone(),
            addr: self.addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_defaults_enable_outlier_filter() {
        let cli = Cli::parse_from(["stellar", "prepare", "--nea", "nea.csv"]);
        let Command::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        let config = args.to_config();
        assert_eq!(config.outlier_threshold, Some(DEFAULT_Z_THRESHOLD));
        assert_eq!(config.out_path, PathBuf::from("joined_out.csv"));
        assert!(config.crossref_path.is_none());
    }

    #[test]
    fn no_outliers_disables_filter() {
        let cli = Cli::parse_from(["stellar", "prepare", "--nea", "n.csv", "--no-outliers"]);
        let Command::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        assert_eq!(args.to_config().outlier_threshold, None);
    }

    #[test]
    fn run_combines_prepare_and_fit_flags() {
        let cli = Cli::parse_from([
            "stellar", "run", "--nea", "n.csv", "--out", "c.csv", "--seed", "7", "--folds", "3",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let train = args.fit.to_config(args.prepare.out.clone());
        assert_eq!(train.data_path, PathBuf::from("c.csv"));
        assert_eq!((train.seed, train.folds), (7, 3));
    }

    #[test]
    fn eda_charts_default_to_served_static_dir() {
        let Command::Eda(eda) = Cli::parse_from(["stellar", "eda"]).command else {
            panic!("expected eda");
        };
        let Command::Serve(serve) = Cli::parse_from(["stellar", "serve"]).command else {
            panic!("expected serve");
        };
        assert_eq!(eda.out_dir, PathBuf::from(DEFAULT_STATIC_DIR));
        assert_eq!(eda.out_dir, serve.static_dir);
    }

    #[test]
    fn predict_accepts_negative_metallicity() {
        let cli = Cli::parse_from(["stellar", "predict", "-l", "1.5", "-f", "-0.3"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!((args.luminosity, args.metallicity), (1.5, -0.3));
        assert!(!args.plot);
    }
}
