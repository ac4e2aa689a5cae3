use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::eyre;
use log::{debug, info};

use eqbench::analyzer::{analyze_file, count_clauses, count_clauses_dir, evaluate_dir};
use eqbench::table::{ClauseTable, ResultsTable};

/// Measures sparseness and constant factor of SMT-LIB formulas.
///
/// Prints `<sparseness>,<const_factor>` for a single file, with `*` for
/// undefined values. In directory mode one row per file is appended to the
/// output table instead.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Formula to analyze.
    #[arg(value_name = "FILE", required_unless_present = "dir", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Analyze every `.smt2` file below this directory.
    #[arg(short = 'd', long, value_name = "DIR", requires = "output")]
    dir: Option<PathBuf>,

    /// Results table to append to in directory mode (`file,sparseness,const_factor`,
    /// or `file,clauses` with `--clauses`).
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Count normalized clauses instead (`-1` if not a single goal).
    #[arg(long)]
    clauses: bool,

    #[arg(long, value_name = "LEVEL", default_value = "warn")]
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

    if let Some(dir) = &args.dir {
        let output = args.output.as_ref().ok_or_else(|| eyre!("--dir requires --output"))?;
        let appended = if args.clauses {
            count_clauses_dir(dir, &ClauseTable::open(output)?)?
        } else {
            evaluate_dir(dir, &ResultsTable::open(output)?)?
        };
        info!("evaluation completed: {} new rows in {}", appended, output.display());
        return Ok(());
    }

    let file = args.file.as_ref().ok_or_else(|| eyre!("no input file"))?;
    if args.clauses {
        let text = std::fs::read_to_string(file)?;
        let count = count_clauses(&text)?.map_or(-1, |n| n as i64);
        println!("{}", count);
    } else {
        println!("{}", analyze_file(file)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clauses_in_both_modes() {
        let args = Cli::try_parse_from(["eqsparse", "--clauses", "p.smt2"]).unwrap();
        assert!(args.clauses && args.dir.is_none());

        let args = Cli::try_parse_from(["eqsparse", "--clauses", "-d", "bench", "-o", "clauses.csv"]).unwrap();
        assert!(args.clauses);
        assert_eq!(args.dir, Some(PathBuf::from("bench")));

        assert!(Cli::try_parse_from(["eqsparse", "-d", "bench"]).is_err());
        assert!(Cli::try_parse_from(["eqsparse", "-d", "bench", "-o", "r.csv", "p.smt2"]).is_err());
    }
}
