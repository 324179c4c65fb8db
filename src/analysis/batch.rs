use super::{analyze_season, AnalysisConfig, SeasonAnalysis};
use crate::{
    detection::{group_by_date, Detection},
    geo::{Boundary, ProtectedArea},
    FireGroupsResult,
};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use std::{
    fmt::{self, Display},
    thread::{self, JoinHandle},
};

const CHANNEL_SIZE: usize = 16;

/// Identifies a single season of analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub park_id: String,
    pub year: i32,
}

impl Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.park_id, self.year)
    }
}

/// Everything needed to analyze one (park, year) season independently of any other.
#[derive(Debug, Clone)]
pub struct SeasonJob {
    pub key: JobKey,
    /// Detections already cut down to the park and season, see [prefilter](super::prefilter).
    pub detections: Vec<Detection>,
    pub boundary: Option<ProtectedArea>,
}

impl SeasonJob {
    pub fn new(park_id: impl Into<String>, year: i32, detections: Vec<Detection>) -> Self {
        SeasonJob {
            key: JobKey {
                park_id: park_id.into(),
                year,
            },
            detections,
            boundary: None,
        }
    }

    pub fn with_boundary(self, boundary: ProtectedArea) -> Self {
        SeasonJob {
            boundary: Some(boundary),
            ..self
        }
    }

    fn run(self, config: &AnalysisConfig) -> FireGroupsResult<SeasonAnalysis> {
        let SeasonJob {
            key,
            detections,
            boundary,
        } = self;

        debug!(target: "batch", "starting {} with {} detections", key, detections.len());

        let by_date = group_by_date(detections);
        analyze_season(
            &by_date,
            boundary.as_ref().map(|b| b as &dyn Boundary),
            config,
        )
    }
}

/**
 * Analyze many seasons in parallel.
 *
 * Each job is analyzed on its own, nothing is shared between them except the configuration.
 * A job that fails does not stop the others, its error is returned in its place.
 *
 * #Arguments
 * jobs - the seasons to analyze.
 * config - parameters used for every job.
 * threads - number of worker threads, or 0 to use one per CPU.
 *
 * #Returns
 * The result of every job, sorted by key. An error is only returned for the whole batch if the
 * configuration is invalid or a worker thread could not be started or panicked.
 */
pub fn analyze_batch(
    jobs: Vec<SeasonJob>,
    config: &AnalysisConfig,
    threads: usize,
) -> FireGroupsResult<Vec<(JobKey, FireGroupsResult<SeasonAnalysis>)>> {
    config.validate()?;

    let threads = if threads == 0 { num_cpus::get() } else { threads };
    let num_jobs = jobs.len();
    info!(target: "batch", "analyzing {} seasons on {} threads", num_jobs, threads);

    let (to_workers, from_feeder) = bounded(CHANNEL_SIZE);
    let (to_collector, from_workers) = bounded(CHANNEL_SIZE);

    let feeder = start_feeder_thread(jobs, to_workers)?;
    let workers = start_worker_threads(threads, config, from_feeder, to_collector)?;

    let mut results: Vec<(JobKey, FireGroupsResult<SeasonAnalysis>)> =
        Vec::with_capacity(num_jobs);
    for (key, result) in from_workers {
        if let Err(ref err) = result {
            warn!(target: "batch", "{} failed: {}", key, err);
        }
        results.push((key, result));
    }

    feeder.join().map_err(|_| "job feeder thread panicked")?;
    for jh in workers {
        jh.join().map_err(|_| "season worker thread panicked")?;
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        target: "batch",
        "finished {} seasons, {} failed",
        results.len(),
        results.iter().filter(|(_, r)| r.is_err()).count()
    );

    Ok(results)
}

fn start_feeder_thread(
    jobs: Vec<SeasonJob>,
    to_workers: Sender<SeasonJob>,
) -> FireGroupsResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("season-feeder".to_owned())
        .spawn(move || {
            for job in jobs {
                if to_workers.send(job).is_err() {
                    break;
                }
            }
        })?;

    Ok(jh)
}

fn start_worker_threads(
    threads: usize,
    config: &AnalysisConfig,
    from_feeder: Receiver<SeasonJob>,
    to_collector: Sender<(JobKey, FireGroupsResult<SeasonAnalysis>)>,
) -> FireGroupsResult<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(threads);

    for _ in 0..threads {
        let from_feeder = from_feeder.clone();
        let to_collector = to_collector.clone();
        let config = config.clone();

        let jh = thread::Builder::new()
            .name("season-worker".to_owned())
            .spawn(move || {
                for job in from_feeder {
                    let key = job.key.clone();
                    let result = job.run(&config);

                    if to_collector.send((key, result)).is_err() {
                        break;
                    }
                }
            })?;

        handles.push(jh);
    }

    Ok(handles)
}
