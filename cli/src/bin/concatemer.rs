use concatemer::config::CallerConfig;
use concatemer::pairwise::QualityVote;
use concatemer::pipeline::{self, Caller, Toolbox};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
#[macro_use]
extern crate log;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = concatemer_cli::commands::concatemer_parser().get_matches();
    let (name, sub_m) = match matches.subcommand() {
        Some(x) => x,
        None => return Ok(()),
    };
    let config = match name {
        "pipeline" => {
            let path: &PathBuf = sub_m.get_one("profile").ok_or("no profile")?;
            let profile = std::fs::read_to_string(path)?;
            CallerConfig::from_toml(&profile)?
        }
        _ => concatemer_cli::commands::caller_config(sub_m),
    };
    let level = match config.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    set_threads(config.threads);
    match name {
        "call" | "pipeline" => call(&config),
        "peaks" => peaks(&config),
        "zero_repeat" => zero_repeat(&config),
        _ => unreachable!(),
    }
}

fn set_threads(threads: usize) {
    debug!("Set Threads\t{}", threads);
    if let Err(why) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("{:?}", why);
    }
}

fn call(config: &CallerConfig) -> Result<(), Box<dyn std::error::Error>> {
    debug!("START\tCall\t{:?}", config.input_file);
    let summary = pipeline::run(config)?;
    info!("Built {} consensus sequences", summary.built());
    info!("{:?}", summary);
    Ok(())
}

fn peaks(config: &CallerConfig) -> Result<(), Box<dyn std::error::Error>> {
    debug!("START\tPeaks\t{:?}", config.input_file);
    let toolbox = Toolbox::new(config);
    let pairwise = QualityVote::new(toolbox.msa());
    let caller = Caller::new(toolbox.aligner(), toolbox.collaborators(&pairwise), config.temp_root())?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    let reported = pipeline::report_peaks(config, &caller, &mut wtr)?;
    wtr.flush()?;
    info!("Reported {} reads", reported);
    Ok(())
}

fn zero_repeat(config: &CallerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stats = pipeline::zero_repeat(&config.input_file)?;
    match stats.percentage() {
        Some(percent) => println!("{:.0}% of total reads has zero repeats", percent),
        None => warn!("No consensus sequence in {:?}", config.input_file),
    }
    Ok(())
}
