use std::{path::Path, thread};

use anyhow::Context;
use crossbeam_channel::{bounded, Receiver, Sender};
use median_norm::{bin_points, WindowedRatioNormalizer};

use crate::{
    config::{Config, Contig},
    io,
    sample::Sample,
};

/// Normalization of one contig for one sample
struct Job<'a> {
    sample: &'a Sample,
    ctg: &'a Contig,
    path: &'a Path,
}

struct JobResult<'a> {
    sample: &'a Sample,
    ctg: &'a Contig,
    res: anyhow::Result<usize>,
}

/// Read, normalize and write out the data for a single job.
/// Returns the number of points written
fn normalize_job(cfg: &Config, job: &Job) -> anyhow::Result<usize> {
    let mut pts = io::read_ratio_file(job.path)?;

    if let Some(w) = cfg.bin() {
        let n = pts.len();
        pts = bin_points(w, pts).with_context(|| {
            format!("Error binning data from {}", job.path.display())
        })?;
        trace!(
            "{}:{} {} points merged into {} bins",
            job.sample.name(),
            job.ctg,
            n,
            pts.len()
        );
    }

    let norm = WindowedRatioNormalizer::new(cfg.distance())
        .normalize(&pts)
        .with_context(|| format!("Error normalizing data from {}", job.path.display()))?;

    let opath = cfg.output_path(job.sample, job.ctg);
    io::write_normalized(&opath, job.ctg, &norm)?;
    Ok(norm.len())
}

fn process_task<'a>(
    cfg: &Config,
    ix: usize,
    recv: Receiver<Job<'a>>,
    snd: Sender<JobResult<'a>>,
) -> anyhow::Result<()> {
    debug!("Process task {} starting up", ix);
    for job in recv.iter() {
        trace!(
            "Task {} received job {}:{}",
            ix,
            job.sample.name(),
            job.ctg
        );
        let res = normalize_job(cfg, &job);
        snd.send(JobResult {
            sample: job.sample,
            ctg: job.ctg,
            res,
        })
        .map_err(|_| anyhow!("Task {}: results channel closed", ix))?;
    }
    debug!("Process task {} closing down", ix);
    Ok(())
}

/// Strategy
///
/// Each (sample, contig) pair is an independent job.  Jobs are sent to a pool
/// of worker threads through a bounded channel and the results are collected
/// in the main thread.  A failure in one job is reported and does not stop the
/// processing of the others.
pub fn process_samples(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    let nt = cfg.threads();
    let (send_job, recv_job) = bounded(nt * 4);
    let (send_res, recv_res) = bounded(nt * 4);

    let (n_jobs, n_failed) = thread::scope(|sc| {
        let workers: Vec<_> = (0..nt)
            .map(|ix| {
                let r = recv_job.clone();
                let s = send_res.clone();
                sc.spawn(move || process_task(cfg, ix + 1, r, s))
            })
            .collect();
        drop(recv_job);
        drop(send_res);

        // Feed jobs from a separate thread so the results channel is drained
        // while jobs are still being queued
        let feeder = sc.spawn(move || -> anyhow::Result<usize> {
            let mut n = 0;
            for ctg in cfg.ctg_list() {
                for sample in cfg.sample_list() {
                    if let Some(path) = sample.ctg_path(ctg) {
                        send_job
                            .send(Job { sample, ctg, path })
                            .map_err(|_| anyhow!("Job channel closed"))?;
                        n += 1;
                    }
                }
            }
            Ok(n)
        });

        let mut n_failed = 0;
        for r in recv_res.iter() {
            match r.res {
                Ok(n) => info!(
                    "Normalized {} points for {}:{}",
                    n,
                    r.sample.name(),
                    r.ctg
                ),
                Err(e) => {
                    error!("Failed to process {}:{}: {:#}", r.sample.name(), r.ctg, e);
                    n_failed += 1;
                }
            }
        }

        for (ix, jh) in workers.into_iter().enumerate() {
            match jh.join() {
                Ok(Err(e)) => error!("Process task {} exited with error: {:#}", ix + 1, e),
                Err(_) => error!("Process task {} panicked", ix + 1),
                _ => {}
            }
        }

        let n_jobs = match feeder.join() {
            Ok(r) => r,
            Err(_) => Err(anyhow!("Job feeder thread panicked")),
        };
        n_jobs.map(|n| (n, n_failed))
    })?;

    debug!("Processing finished: {} jobs, {} failed", n_jobs, n_failed);
    if n_failed > 0 {
        Err(anyhow!(
            "Normalization failed for {} of {} sample/contig combinations",
            n_failed,
            n_jobs
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{get_input_files_and_contig_list, Sample};

    use pretty_assertions::assert_eq;
    use std::fs;

    fn make_config(dir: &Path, chr2: &str) -> Config {
        let d = dir.join("s1");
        fs::create_dir(&d).unwrap();
        fs::write(
            d.join("ratio_chr1.txt"),
            "chr1\t1\t1.0\nchr1\t50\t1.5\nchr1\t120\t1.1\nchr1\t200\t1.2\n",
        )
        .unwrap();
        fs::write(d.join("ratio_chr2.txt"), chr2).unwrap();

        let mut samples = vec![Sample::new("s1".to_owned())];
        let ctgs = get_input_files_and_contig_list(&mut samples, Some(dir), "ratio").unwrap();
        let mut cfg = Config::new("nratio".to_owned(), samples, ctgs);
        cfg.set_output_dir(dir.join("out"));
        cfg.set_threads(2);
        io::setup_output(&cfg).unwrap();
        cfg
    }

    #[test]
    fn test_process_samples() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = make_config(dir.path(), "chr2\t10\t2.0\n");
        process_samples(&cfg).unwrap();

        let out = dir.path().join("out").join("s1");
        let s = fs::read_to_string(out.join("nratio_chr1.txt")).unwrap();
        let med: Vec<&str> = s
            .lines()
            .map(|l| l.split('\t').nth(3).unwrap())
            .collect();
        assert_eq!(med, vec!["1.2500", "1.1000", "1.2000", "1.1500"]);
        let s = fs::read_to_string(out.join("nratio_chr2.txt")).unwrap();
        assert_eq!(s, "chr2\t10\t2.0000\t2.0000\t1.0000\n");
    }

    #[test]
    fn test_failed_contig_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        // chr2 is not sorted by position
        let cfg = make_config(dir.path(), "chr2\t300\t2.0\nchr2\t10\t1.0\n");
        assert!(process_samples(&cfg).is_err());

        let out = dir.path().join("out").join("s1");
        assert!(out.join("nratio_chr1.txt").exists());
        assert!(!out.join("nratio_chr2.txt").exists());
    }

    #[test]
    fn test_binned_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = make_config(dir.path(), "chr2\t10\t2.0\nchr2\t20\t4.0\nchr2\t1500\t1.0\n");
        cfg.set_bin(median_norm::Window::new(1000).unwrap());
        cfg.set_distance(0);
        process_samples(&cfg).unwrap();

        let out = dir.path().join("out").join("s1");
        let s = fs::read_to_string(out.join("nratio_chr2.txt")).unwrap();
        assert_eq!(
            s,
            "chr2\t500\t3.0000\t3.0000\t1.0000\nchr2\t1500\t1.0000\t1.0000\t1.0000\n"
        );
    }
}
