use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgMatches,
    Command,
};

use anyhow::Context;

use median_norm::Window;
use utils::{add_log_args, init_log};

use crate::{config::*, sample::*};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    add_log_args(
        Command::new(crate_name!())
            .about(crate_description!())
            .version(crate_version!())
            .author(crate_authors!()),
    )
    .arg(
        Arg::new("threads")
            .short('t')
            .long("threads")
            .value_parser(value_parser!(NonZeroUsize))
            .value_name("INT")
            .help("Set number of calculation threads [default: available cores]"),
    )
    .arg(
        Arg::new("distance")
            .short('w')
            .long("distance")
            .value_parser(value_parser!(usize))
            .value_name("INT")
            .default_value("100")
            .help("Max. distance (bp) of points included in the local median"),
    )
    .arg(
        Arg::new("bin_size")
            .short('b')
            .long("bin-size")
            .value_parser(value_parser!(NonZeroUsize))
            .value_name("INT")
            .help("Merge input points into windows of this size before normalization"),
    )
    .arg(
        Arg::new("input_prefix")
            .short('P')
            .long("input-prefix")
            .value_parser(value_parser!(String))
            .value_name("STRING")
            .default_value("ratio")
            .help("Set prefix for input file names"),
    )
    .arg(
        Arg::new("output_prefix")
            .short('p')
            .long("output-prefix")
            .value_parser(value_parser!(String))
            .value_name("STRING")
            .default_value("nratio")
            .help("Set prefix for output file names"),
    )
    .arg(
        Arg::new("input_dir")
            .short('D')
            .long("input-dir")
            .value_parser(value_parser!(PathBuf))
            .value_name("PATH")
            .help("Set input directory [default: current directory]"),
    )
    .arg(
        Arg::new("output_dir")
            .short('d')
            .long("output-dir")
            .value_parser(value_parser!(PathBuf))
            .value_name("PATH")
            .help("Set output directory [default: current directory]"),
    )
    .arg(
        Arg::new("sample_list")
            .value_parser(value_parser!(PathBuf))
            .value_name("SAMPLE_FILE")
            .required(true)
            .help("Input file with list of sample names for normalization"),
    )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");
    config_from_matches(&m)
}

fn config_from_matches(m: &ArgMatches) -> anyhow::Result<Config> {
    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    let output_prefix = m
        .get_one::<String>("output_prefix")
        .expect("Missing default output prefix")
        .clone();

    let input_prefix = m
        .get_one::<String>("input_prefix")
        .expect("Missing default input prefix")
        .clone();

    let distance = *m
        .get_one::<usize>("distance")
        .expect("Missing default distance");

    // Read in sample list
    let mut samples = read_sample_list_from_file(
        m.get_one::<PathBuf>("sample_list")
            .expect("Missing sample list file"),
    )
    .with_context(|| "Could not open sample list file for input")?;

    if samples.is_empty() {
        return Err(anyhow!("No samples found in sample list file"));
    }

    let input_dir = m.get_one::<PathBuf>("input_dir").map(|p| p.as_path());

    let contigs = get_input_files_and_contig_list(&mut samples, input_dir, &input_prefix)
        .with_context(|| "Error collecting input files")?;

    debug!("Number of contigs found: {}", contigs.len());

    let mut cfg = Config::new(output_prefix, samples, contigs);

    if let Some(p) = m.get_one::<PathBuf>("output_dir") {
        cfg.set_output_dir(p.to_owned())
    }

    cfg.set_threads(nt);
    cfg.set_distance(distance);

    if let Some(x) = m.get_one::<NonZeroUsize>("bin_size") {
        cfg.set_bin(Window::new(x.get())?)
    }

    // Make sure output does not overlap input
    if cfg.output_prefix() == input_prefix {
        let d1 = canonical_dir(input_dir)?;
        let d2 = canonical_dir(cfg.output_dir())?;
        if d1 == d2 {
            return Err(anyhow!(
                "Both Input and output directories and input and output prefixes are the same"
            ));
        }
    }

    Ok(cfg)
}

fn canonical_dir(d: Option<&Path>) -> anyhow::Result<PathBuf> {
    let d = d.unwrap_or_else(|| Path::new("./"));
    // The output directory may not exist yet, in which case it can not match the input
    if d.exists() {
        d.canonicalize()
            .with_context(|| format!("Invalid directory path {}", d.display()))
    } else {
        Ok(d.to_owned())
    }
}
