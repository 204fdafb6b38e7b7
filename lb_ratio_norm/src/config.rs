use std::path::{Path, PathBuf};
use std::sync::Arc;

use median_norm::Window;

use crate::sample::Sample;

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// sample_list - list of input samples
/// ctg_list - contigs found in the input files
/// output_prefix - prefix for output file names
/// output_dir - output directory
/// distance - max distance (bp) from a point for ratios to be included in its local median
/// bin - if set, input points are merged into windows of this size before normalization
/// threads - number of worker threads
///
pub struct Config {
    sample_list: Vec<Sample>,
    ctg_list: Vec<Contig>,
    output_prefix: String,
    output_dir: Option<PathBuf>,
    distance: usize,
    bin: Option<Window>,
    threads: usize,
}

impl Config {
    pub fn new(output_prefix: String, sample_list: Vec<Sample>, ctg_list: Vec<Contig>) -> Self {
        Self {
            sample_list,
            ctg_list,
            output_prefix,
            output_dir: None,
            distance: 100,
            bin: None,
            threads: 1,
        }
    }
    pub fn set_output_dir(&mut self, d: PathBuf) {
        self.output_dir = Some(d)
    }

    pub fn set_distance(&mut self, d: usize) {
        self.distance = d
    }

    pub fn set_bin(&mut self, w: Window) {
        self.bin = Some(w)
    }

    pub fn set_threads(&mut self, n: usize) {
        self.threads = n.max(1)
    }

    pub fn ctg_list(&self) -> &[Contig] {
        &self.ctg_list
    }

    pub fn sample_list(&self) -> &[Sample] {
        &self.sample_list
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn bin(&self) -> Option<&Window> {
        self.bin.as_ref()
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Path for normalized output of a sample and contig
    pub fn output_path(&self, sample: &Sample, ctg: &str) -> PathBuf {
        let mut p = self
            .output_dir
            .as_ref()
            .map(|d| d.to_owned())
            .unwrap_or_else(PathBuf::new);
        p.push(sample.name());
        p.push(format!("{}_{}.txt", self.output_prefix, ctg));
        p
    }
}

pub type Contig = Arc<str>;
