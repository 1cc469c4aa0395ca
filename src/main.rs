use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;
use log::info;
use simplelog::LevelFilter;

use cgp_bdd::bdd::Bdd;
use cgp_bdd::circuit::{seed_path, Circuit};
use cgp_bdd::config::{parse_key_value, MutationKind, RunConfig};
use cgp_bdd::error::Error;
use cgp_bdd::evolution::Evolution;
use cgp_bdd::fitness::Evaluator;
use cgp_bdd::report::RunLog;
use cgp_bdd::table::TargetTable;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Target truth table in PLA format.
    #[arg(value_name = "TABLE")]
    table: PathBuf,

    /// RNG seed, as `seed=<INT>`.
    #[arg(value_name = "seed=INT")]
    seed: String,

    /// Number of genotype columns, as `ncol=<INT>`.
    #[arg(value_name = "ncol=INT")]
    ncol: String,

    /// Evaluation budget, as `maxeval=<INT>`.
    #[arg(value_name = "maxeval=INT")]
    maxeval: String,

    /// Mutation operator, as `mutation=<1|2|3>` (SAM, SAM+GAM, PM).
    #[arg(value_name = "mutation=1|2|3")]
    mutation: String,

    /// Run log file, optionally preceded by `ngates=<INT>` to seed from
    /// `<TABLE>.circuit`. The log goes to stdout when omitted.
    #[arg(value_name = "[ngates=INT] LOG", num_args = 0..=2)]
    rest: Vec<String>,

    /// Individuals per generation (one parent plus offspring).
    #[arg(long, value_name = "INT", default_value_t = RunConfig::DEFAULT_POPULATION_SIZE)]
    population_size: usize,

    /// BDD node pool size (in bits, so the actual size is `2^bits` nodes).
    #[arg(long, value_name = "BITS", default_value = "20")]
    pool_bits: usize,

    /// BDD computed-table size (in bits).
    #[arg(long, value_name = "BITS", default_value = "16")]
    cache_bits: usize,

    /// Diagnostics level on stderr.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: LevelFilter,
}

enum Mode {
    Fresh { log: Option<PathBuf> },
    Seeded { ngates: usize, log: PathBuf },
}

fn mode(rest: &[String]) -> Result<Mode, Error> {
    match rest {
        [] => Ok(Mode::Fresh { log: None }),
        [log] => Ok(Mode::Fresh {
            log: Some(PathBuf::from(log)),
        }),
        [ngates, log] => Ok(Mode::Seeded {
            ngates: parse_key_value(ngates, "ngates")?,
            log: PathBuf::from(log),
        }),
        _ => Err(Error::Config("too many arguments".to_string())),
    }
}

fn config(args: &Cli) -> Result<RunConfig, Error> {
    let mutation: String = parse_key_value(&args.mutation, "mutation")?;
    let config = RunConfig::new(
        parse_key_value(&args.seed, "seed")?,
        parse_key_value(&args.ncol, "ncol")?,
        parse_key_value(&args.maxeval, "maxeval")?,
        mutation.parse::<MutationKind>()?,
    )
    .with_population_size(args.population_size)
    .with_pool(args.pool_bits, args.cache_bits);
    config.validate()?;
    Ok(config)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => return Err(Error::Config(e.to_string()).into()),
    };

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let config = config(&args)?;
    let mode = mode(&args.rest)?;
    info!("config = {:?}", config);

    let log_path = match &mode {
        Mode::Fresh { log } => log.clone(),
        Mode::Seeded { log, .. } => Some(log.clone()),
    };
    let out: Box<dyn Write> = match log_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let mut log = RunLog::new(out);
    log.banner(config.mutation)?;

    let table = TargetTable::load(&args.table)?;
    info!(
        "Loaded {:?}: {} inputs, {} outputs, {} cubes",
        args.table,
        table.num_inputs,
        table.num_outputs,
        table.cubes.len()
    );

    let bdd = Bdd::new(config.pool_bits, config.cache_bits);
    let evaluator = Evaluator::new(bdd, &table)?;
    let mut evolution = Evolution::new(&config, evaluator, log);

    let time_total = Instant::now();
    match mode {
        Mode::Fresh { .. } => {
            let outcome = evolution.run()?;
            info!("Search outcome: {:?}", outcome);
        }
        Mode::Seeded { ngates, .. } => {
            let path = seed_path(&args.table);
            info!("Seeding from {:?}", path);
            let circuit = Circuit::load(&path)?;
            evolution.sow(&circuit, ngates)?;
            evolution.optimize()?;
        }
    }

    let mut out = evolution.finish(time_total.elapsed().as_secs_f64())?;
    out.flush()?;
    Ok(())
}
