use std::{fs, io::Write, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use median_norm::{NormalizedRatioPoint, RatioPoint};
use utils::get_next_line;

use crate::config::Config;

/// Read (position, ratio) pairs from a contig file
///
/// The file is tab separated with the columns contig, position and ratio.
/// Further columns are ignored, as are lines with less than 3 columns.
pub fn read_ratio_file(p: &Path) -> anyhow::Result<Vec<RatioPoint>> {
    let mut v = Vec::new();
    trace!("Opening ratio file {} for reading", p.display());
    let mut rdr = CompressIo::new().path(p).bufreader()?;
    trace!("Reading from {}", p.display());
    let mut buf = String::new();
    let mut line = 0;

    while let Some(fields) = get_next_line(&mut rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from {}", line, p.display()))?
    {
        line += 1;
        if fields.len() >= 3 {
            let x = fields[1]
                .parse::<usize>()
                .with_context(|| format!("{}:{} Error reading position", p.display(), line))?;
            let z = fields[2]
                .parse::<f64>()
                .with_context(|| format!("{}:{} Error reading ratio", p.display(), line))?;
            v.push(RatioPoint::new(x, z))
        }
    }
    trace!("Read {} points from {}", v.len(), p.display());
    Ok(v)
}

/// Write normalized data for a contig
///
/// Columns: contig, position, raw ratio, local median, normalized ratio
pub fn write_normalized(
    p: &Path,
    ctg: &str,
    data: &[NormalizedRatioPoint],
) -> anyhow::Result<()> {
    trace!("Opening {} for output", p.display());
    let mut wrt = CompressIo::new()
        .path(p)
        .bufwriter()
        .with_context(|| format!("Problem creating output file {}", p.display()))?;

    for x in data {
        writeln!(
            wrt,
            "{}\t{}\t{:.4}\t{:.4}\t{:.4}",
            ctg, x.position, x.ratio, x.local_median, x.normalized
        )
        .with_context(|| format!("Error writing normalized data to {}", p.display()))?;
    }
    wrt.flush()
        .with_context(|| format!("Error writing normalized data to {}", p.display()))?;
    Ok(())
}

/// Create output directory and per sample sub-directories
pub fn setup_output(cfg: &Config) -> anyhow::Result<()> {
    let p = if let Some(d) = cfg.output_dir() {
        if !d.exists() {
            debug!("Creating output directory {}", d.display());
            fs::create_dir_all(d)
                .with_context(|| format!("Error creating output directory {}", d.display()))?;
        }
        d.to_owned()
    } else {
        Default::default()
    };
    for s in cfg.sample_list() {
        let p1 = p.join(s.name());
        if !p1.exists() {
            fs::create_dir(&p1)
                .with_context(|| format!("Error creating output directory {}", p1.display()))?;
        }
    }
    Ok(())
}
