use std::process::ExitCode;

fn main() -> ExitCode {
    stellar_mass::logging::init();

    let status = stellar_mass::app::exit_status(stellar_mass::app::run(), &mut std::io::stderr());
    ExitCode::from(status)
}
