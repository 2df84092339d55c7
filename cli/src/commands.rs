use clap::{Arg, ArgAction, ArgMatches, Command};
use concatemer::config::{AlignerBackend, CallerConfig};
use std::path::PathBuf;

fn arg_verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Debug mode")
}

fn arg_threads() -> Arg {
    Arg::new("threads")
        .short('t')
        .long("threads")
        .value_parser(clap::value_parser!(usize))
        .default_value("1")
        .help("number of threads")
}

fn arg_input() -> Arg {
    Arg::new("input")
        .long("input")
        .short('r')
        .value_name("READS")
        .value_parser(clap::value_parser!(PathBuf))
        .required(true)
        .help("Input FASTQ file. Each identifier should be <read-id>_<seed-offset>.")
}

/// Arguments deciding how the self-similarity signals are computed.
fn args_aligner() -> [Arg; 3] {
    [
        Arg::new("aligner")
            .long("aligner")
            .value_parser(["builtin", "water"])
            .default_value("builtin")
            .help("Local aligner. The in-process ungapped scorer or EMBOSS water."),
        Arg::new("water")
            .long("water")
            .value_name("PATH")
            .value_parser(clap::value_parser!(PathBuf))
            .default_value("water")
            .help("water executable"),
        Arg::new("temp")
            .long("temp")
            .value_name("DIR")
            .value_parser(clap::value_parser!(PathBuf))
            .help("Directory for the temporary files. The system temporary directory by default."),
    ]
}

fn subcommand_call() -> Command {
    Command::new("call")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Call the consensus of each concatemeric read.")
        .arg(arg_verbose())
        .arg(arg_input())
        .arg(arg_threads())
        .args(args_aligner())
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(".")
                .help("Output directory"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .default_value("R2C2_Consensus")
                .help("Consensus sequences are written to <DIR>/<prefix>.fasta"),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_parser(clap::value_parser!(usize))
                .default_value("1000")
                .help("Number of reads processed before the outputs are flushed"),
        )
        .arg(
            Arg::new("resume")
                .long("resume")
                .action(ArgAction::SetTrue)
                .help("Skip the reads processed by the previous run."),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Kill an external tool after SECONDS."),
        )
        .arg(Arg::new("poa").long("poa").value_name("PATH").default_value("poa"))
        .arg(
            Arg::new("matrix")
                .long("matrix")
                .value_name("PATH")
                .default_value("NUC.4.4.mat")
                .help("Score matrix of poa"),
        )
        .arg(
            Arg::new("minimap2")
                .long("minimap2")
                .value_name("PATH")
                .default_value("minimap2"),
        )
        .arg(Arg::new("racon").long("racon").value_name("PATH").default_value("racon"))
}

fn subcommand_peaks() -> Command {
    Command::new("peaks")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Write the peaks and the period of each read to stdout as JSON lines.")
        .arg(arg_verbose())
        .arg(arg_input())
        .arg(arg_threads())
        .args(args_aligner())
}

fn subcommand_zero_repeat() -> Command {
    Command::new("zero_repeat")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Percentage of the consensus sequences with zero repeats.")
        .arg(arg_verbose())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("FASTA")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true)
                .help("Consensus sequences written by `call`."),
        )
}

fn subcommand_pipeline() -> Command {
    Command::new("pipeline")
        .version("0.1")
        .author("BanshoMasutani")
        .about("Run pipeline based on the given TOML file.")
        .arg(
            Arg::new("profile")
                .short('p')
                .value_parser(clap::value_parser!(PathBuf))
                .required(true)
                .help("TOML configuration file. See example.toml for an example."),
        )
}

pub fn concatemer_parser() -> Command {
    Command::new("concatemer")
        .version("0.1")
        .author("Bansho Masutani <ban-m@g.ecc.u-tokyo.ac.jp>")
        .about("Consensus caller for concatemeric reads")
        .arg_required_else_help(true)
        .subcommand(subcommand_call())
        .subcommand(subcommand_peaks())
        .subcommand(subcommand_zero_repeat())
        .subcommand(subcommand_pipeline())
}

fn path_of(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    if let Ok(Some(path)) = matches.try_get_one::<PathBuf>(id) {
        return Some(path.clone());
    }
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .map(PathBuf::from)
}

/// Assemble the configuration from the arguments of `call` or `peaks`.
pub fn caller_config(matches: &ArgMatches) -> CallerConfig {
    let mut config = CallerConfig::default();
    if let Some(input) = path_of(matches, "input") {
        config.input_file = input;
    }
    if let Some(out_dir) = path_of(matches, "output") {
        config.out_dir = out_dir;
    }
    config.temp_root = path_of(matches, "temp");
    if let Ok(Some(prefix)) = matches.try_get_one::<String>("prefix") {
        config.prefix = prefix.clone();
    }
    if let Ok(Some(&threads)) = matches.try_get_one::<usize>("threads") {
        config.threads = threads;
    }
    if let Ok(Some(&batch)) = matches.try_get_one::<usize>("batch") {
        config.batch_size = batch;
    }
    config.resume = matches.try_get_one::<bool>("resume").ok().flatten() == Some(&true);
    config.verbose = matches.get_count("verbose") as usize;
    config.tool_timeout_secs = matches.try_get_one::<u64>("timeout").ok().flatten().copied();
    let aligner = matches.try_get_one::<String>("aligner").ok().flatten();
    if let Some(aligner) = aligner.and_then(|x| x.parse::<AlignerBackend>().ok()) {
        config.aligner = aligner;
    }
    let tools = &mut config.tools;
    for (id, path) in [
        ("water", &mut tools.water),
        ("poa", &mut tools.poa),
        ("matrix", &mut tools.poa_matrix),
        ("minimap2", &mut tools.minimap2),
        ("racon", &mut tools.racon),
    ] {
        if let Some(given) = path_of(matches, id) {
            *path = given;
        }
    }
    config
}
