use std::process;

use sim_lib::error::SimulatorResult;
use sim_lib::flags::SimArgs;
use sim_lib::run_wrapper;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = SimArgs::from_env_or_exit();

    // RUST_LOG wins over -v
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &SimArgs) -> SimulatorResult<()> {
    run_wrapper::run(
        &args.program,
        args.raw_base.map(|base| base.0),
        args.policy(),
        args.trace.as_deref(),
    )?;
    Ok(())
}
