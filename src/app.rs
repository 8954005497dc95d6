//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - dispatches to the batch workflows in `pipeline`
//! - prints reports and plots

use std::io::Write;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, DataArgs, EdaArgs, PredictArgs, RunArgs, SampleArgs, TrainArgs};
use crate::data::{generate_catalog, SyntheticConfig};
use crate::domain::REFERENCE_STARS;
use crate::error::AppError;
use crate::fit::{predictor_vif, Dataset, MODEL_FEATURES, MODEL_TARGET};
use crate::io::{read_model_json, read_stars_csv, write_stars_csv};
use crate::models::predict_solar_mass;
use crate::plot::{render_mass_luminosity, Diagram};
use crate::report::{format_prediction, format_prep_summary, format_training, format_vif};
use crate::server::MassLuminosity;

pub mod pipeline;

/// Process exit status for a finished run; a failure is written once to `err_out`.
pub fn exit_status(result: Result<(), AppError>, err_out: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            let _ = writeln!(err_out, "{err}");
            err.exit_code()
        }
    }
}

/// Entry point for the `stellar` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Prepare(args) => {
            let out = pipeline::run_prepare(&args.to_config())?;
            println!("{}", format_prep_summary(&out.stats));
            Ok(())
        }
        Command::Train(args) => handle_train(args),
        Command::Run(args) => handle_run(args),
        Command::Eda(args) => handle_eda(args),
        Command::Vif(args) => handle_vif(args),
        Command::Predict(args) => handle_predict(args),
        Command::Serve(args) => crate::server::serve(&args.to_config()),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = args.fit.to_config(args.data);
    let training = pipeline::run_train(&config)?;
    println!("{}", format_training(&training, config.seed));
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let prepare = pipeline::run_prepare(&args.prepare.to_config())?;
    println!("{}", format_prep_summary(&prepare.stats));

    let config = args.fit.to_config(args.prepare.out);
    let training = pipeline::run_train(&config)?;
    println!("{}", format_training(&training, config.seed));
    Ok(())
}

fn handle_eda(args: EdaArgs) -> Result<(), AppError> {
    let stars = read_stars_csv(&args.data.data)?;
    if stars.is_empty() {
        return Err(AppError::insufficient("Catalog is empty; nothing to analyse."));
    }
    pipeline::run_eda(&stars, &args.out_dir, args.z_threshold)?;
    println!("EDA report written to {}", args.out_dir.display());
    Ok(())
}

fn handle_vif(args: DataArgs) -> Result<(), AppError> {
    let stars = read_stars_csv(&args.data)?;
    let data = Dataset::from_stars(&stars, &MODEL_FEATURES, MODEL_TARGET);
    if data.len() <= MODEL_FEATURES.len() {
        return Err(AppError::insufficient(format!(
            "VIF needs more than {} rows, got {}.",
            MODEL_FEATURES.len(),
            data.len()
        )));
    }
    println!("{}", format_vif(&predictor_vif(&data)));
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let artifact = read_model_json(&args.model)?;
    let mass = predict_solar_mass(&artifact.model, args.luminosity, args.metallicity)?;
    println!("{}", format_prediction(args.luminosity, args.metallicity, mass, &REFERENCE_STARS));

    if args.plot {
        let stars: Vec<(f64, f64)> = if args.data.exists() {
            read_stars_csv(&args.data)?
                .iter()
                .map(MassLuminosity::from_star)
                .map(|p| (p.mass, p.luminosity))
                .collect()
        } else {
            Vec::new()
        };
        let diagram = Diagram {
            stars: &stars,
            references: &REFERENCE_STARS,
            prediction: Some((mass, args.luminosity)),
            model: Some((&artifact.model, args.metallicity)),
        };
        println!("{}", render_mass_luminosity(&diagram, args.width, args.height));
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let stars = generate_catalog(&SyntheticConfig {
        count: args.count,
        seed: args.seed,
        lum_scatter_dex: args.scatter,
        ..SyntheticConfig::default()
    })?;
    write_stars_csv(&args.out, &stars)?;
    info!(rows = stars.len(), path = %args.out.display(), "wrote synthetic catalog");
    println!("Wrote {} synthetic stars to {}", stars.len(), args.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_reported_once_with_its_exit_code() {
        let mut err_out = Vec::new();
        let status = exit_status(Err(AppError::insufficient("Only 2 rows left after cleaning.")), &mut err_out);
        assert_eq!(status, 3);
        assert_eq!(String::from_utf8(err_out).unwrap(), "Only 2 rows left after cleaning.\n");
    }

    #[test]
    fn success_writes_nothing() {
        let mut err_out = Vec::new();
        assert_eq!(exit_status(Ok(()), &mut err_out), 0);
        assert!(err_out.is_empty());
    }
}
