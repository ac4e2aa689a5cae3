use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::bail;
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use eqbench::generator::{Generator, GeneratorConfig};
use eqbench::render::write_benchmark;

/// Generates random equality-logic benchmarks.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of formulas.
    #[arg(short = 'n', long, value_name = "INT")]
    num_formulas: usize,

    /// Clauses per formula (at least 2).
    #[arg(short = 'c', long, value_name = "INT")]
    num_clauses: usize,

    /// Literals per clause.
    #[arg(short = 'e', long, value_name = "INT")]
    edge_size: usize,

    /// Constant factor, in [0, 1].
    #[arg(short = 'f', long, value_name = "FLOAT")]
    const_factor: f64,

    /// Existing output directory.
    #[arg(short = 'o', long, value_name = "DIR")]
    output: PathBuf,

    /// Random seed. Drawn at random if omitted.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: simplelog::LevelFilter,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;
    debug!("args = {:?}", args);

    let config = GeneratorConfig::new(args.num_clauses, args.edge_size, args.const_factor);
    config.validate()?;
    if !args.output.is_dir() {
        bail!("output directory {} does not exist", args.output.display());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("seed = {}", seed);
    let mut generator = Generator::new(config, ChaCha8Rng::seed_from_u64(seed))?;

    let time_total = std::time::Instant::now();
    let meta = write_benchmark(&mut generator, &args.output, args.num_formulas)?;
    debug!("metadata in {}", meta.path().display());
    info!(
        "Generated {} formulas in {:.3} s",
        args.num_formulas,
        time_total.elapsed().as_secs_f64()
    );

    Ok(())
}
