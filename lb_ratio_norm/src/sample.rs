use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;
use utils::get_next_line;

use crate::config::Contig;

/// Input sample
///
/// name - sample name.  Input files are read from, and output files written to,
///        a directory of this name
/// files - input ratio file for each contig
///
pub struct Sample {
    name: String,
    files: BTreeMap<Contig, PathBuf>,
}

impl Sample {
    pub fn new(name: String) -> Self {
        Self {
            name,
            files: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ctg_path(&self, ctg: &str) -> Option<&Path> {
        self.files.get(ctg).map(|x| x.as_path())
    }
}

pub fn read_sample_list_from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Vec<Sample>> {
    debug!("Reading in sample list from {}", fname.as_ref().display());

    trace!("Opening sample file for reading");
    let mut rdr = CompressIo::new().path(&fname).bufreader()?;

    trace!("Reading from file");
    let mut buf = String::new();
    let mut line = 0;
    let mut sample_vec = Vec::new();
    let mut seen = HashSet::new();

    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.as_ref().display()
        )
    })? {
        line += 1;
        // Skip empty lines and repeated samples
        if !fields[0].is_empty() {
            if seen.insert(fields[0].to_owned()) {
                sample_vec.push(Sample::new(fields[0].to_owned()));
            } else {
                warn!("Sample {} listed more than once", fields[0])
            }
        }
    }

    debug!(
        "Finished reading in {} lines; found {} samples",
        line,
        sample_vec.len()
    );

    Ok(sample_vec)
}

/// Collect input file paths for each sample in samples.
/// Each file path is parsed to extract the contig name.
/// A sorted vector of all contigs found is returned
pub fn get_input_files_and_contig_list(
    samples: &mut [Sample],
    dir: Option<&Path>,
    prefix: &str,
) -> anyhow::Result<Vec<Contig>> {
    let mut ctg_hash = HashSet::new();
    let reg = Regex::new(format!("^{}_([^_]*)[.]txt$", regex::escape(prefix)).as_str())?;
    for s in samples.iter_mut() {
        get_files_for_sample(s, dir, &reg, &mut ctg_hash)?
    }
    let mut v: Vec<_> = ctg_hash.drain().collect();
    v.sort_unstable();
    Ok(v)
}

fn get_files_for_sample(
    s: &mut Sample,
    dir: Option<&Path>,
    reg: &Regex,
    ctg_hash: &mut HashSet<Contig>,
) -> anyhow::Result<()> {
    let mut in_dir = dir.map(|p| p.to_owned()).unwrap_or_else(PathBuf::new);
    in_dir.push(&s.name);

    for f in in_dir
        .read_dir()
        .with_context(|| format!("Error checking input directory {}", in_dir.display()))?
    {
        let entry =
            f.with_context(|| format!("Could not get directory entry from {}", in_dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                Err(n) => {
                    warn!("Skipping file with non UTF-8 name {:?}", n);
                    continue;
                }
            };
            if let Some(ctg) = reg.captures(name.as_str()).and_then(|c| c.get(1)) {
                let ctg = ctg.as_str();
                if !ctg_hash.contains(ctg) {
                    trace!("Adding contig {}", ctg);
                    ctg_hash.insert(Arc::from(ctg));
                }
                let ctg = ctg_hash
                    .get(ctg)
                    .cloned()
                    .unwrap_or_else(|| Arc::from(ctg));
                trace!(
                    "Adding file {} ({}) for sample {}",
                    path.display(),
                    ctg,
                    s.name
                );
                s.files.insert(ctg, path);
            }
        }
    }

    if s.files.is_empty() {
        Err(anyhow!(
            "No input files found for sample {} in {}",
            s.name,
            in_dir.display()
        ))
    } else {
        debug!(
            "{} input files found for sample {} in {}",
            s.files.len(),
            s.name,
            in_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_sample_list_and_contigs() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("samples.txt");
        fs::write(&list, "s1\n\ns2\textra\ns1\n").unwrap();

        let mut samples = read_sample_list_from_file(&list).unwrap();
        let names: Vec<_> = samples.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["s1", "s2"]);

        for (s, ctgs) in [("s1", ["chr1", "chr2"]), ("s2", ["chr2", "chrX"])] {
            let d = dir.path().join(s);
            fs::create_dir(&d).unwrap();
            for c in ctgs {
                fs::write(d.join(format!("ratio_{}.txt", c)), "").unwrap();
            }
            fs::write(d.join("other_chr1.txt"), "").unwrap();
        }

        let ctgs = get_input_files_and_contig_list(&mut samples, Some(dir.path()), "ratio")
            .unwrap();
        let ctgs: Vec<&str> = ctgs.iter().map(|c| c.as_ref()).collect();
        assert_eq!(ctgs, vec!["chr1", "chr2", "chrX"]);
        assert!(samples[0].ctg_path("chr1").is_some());
        assert!(samples[0].ctg_path("chr2").is_some());
        assert!(samples[0].ctg_path("chrX").is_none());
        assert_eq!(
            samples[1].ctg_path("chrX").unwrap(),
            dir.path().join("s2").join("ratio_chrX.txt")
        );
    }

    #[test]
    fn test_sample_without_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("s1")).unwrap();
        let mut samples = vec![Sample::new("s1".to_owned())];
        assert!(get_input_files_and_contig_list(&mut samples, Some(dir.path()), "ratio").is_err());
    }
}
