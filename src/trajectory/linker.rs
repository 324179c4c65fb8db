use super::Trajectory;
use crate::{
    cluster::{ClusterKey, DailyCluster, SeasonClusters},
    geo::{local_distance_km, Geo},
};
use chrono::NaiveDate;
use log::{debug, trace};
use rustc_hash::FxHashSet as HashSet;

/// Kilometers of score credit for each degree a candidate lies south of the current cluster.
const SOUTHWARD_WEIGHT: f64 = 5.0;
/// Score penalty for each unit of the size ratio between two clusters.
const SIZE_RATIO_WEIGHT: f64 = 2.0;

/**
 * Greedily chains daily clusters into trajectories.
 *
 * The days of a season are walked in order. Every cluster that has not yet been claimed starts a
 * new trajectory, which is then extended one day at a time by picking the best unclaimed cluster
 * within `max_link_km` of the trajectory's latest cluster. Candidates further south and of a
 * similar size are preferred. Days with no acceptable candidate are skipped until the trajectory
 * has gone more than `max_gap_days` without a sighting.
 *
 * A cluster claimed by a trajectory that turns out shorter than `min_trajectory_length` is not
 * released, so it can't be used by any later trajectory either.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryLinker {
    pub max_link_km: f64,
    pub max_gap_days: i64,
    pub min_trajectory_length: usize,
}

impl Default for TrajectoryLinker {
    fn default() -> Self {
        TrajectoryLinker {
            max_link_km: 25.0,
            max_gap_days: 3,
            min_trajectory_length: 5,
        }
    }
}

impl TrajectoryLinker {
    pub fn new(max_link_km: f64, max_gap_days: i64, min_trajectory_length: usize) -> Self {
        TrajectoryLinker {
            max_link_km,
            max_gap_days,
            min_trajectory_length,
        }
    }

    /**
     * Link all the clusters in a season into trajectories.
     *
     * #Returns
     * The trajectories with at least `min_trajectory_length` clusters, ordered by the date and
     * index of their first cluster. No cluster appears in more than one of them.
     */
    pub fn link(&self, season: &SeasonClusters) -> Vec<Trajectory> {
        let dates: Vec<NaiveDate> = season.dates().collect();
        let mut used: HashSet<ClusterKey> = HashSet::default();
        let mut trajectories = vec![];
        let mut num_discarded = 0;

        for (start_idx, &start_date) in dates.iter().enumerate() {
            for start in season.on(start_date) {
                if !used.insert(start.key()) {
                    continue;
                }

                let mut chain = vec![start.clone()];

                for &next_date in &dates[(start_idx + 1)..] {
                    let best = {
                        let current = &chain[chain.len() - 1];
                        if (next_date - current.date()).num_days() > self.max_gap_days {
                            break;
                        }
                        self.best_candidate(current, season.on(next_date), &used)
                    };

                    if let Some(best) = best {
                        used.insert(best.key());
                        chain.push(best.clone());
                    }
                }

                if chain.len() >= self.min_trajectory_length {
                    debug!(
                        target: "linker",
                        "trajectory from {} to {}, {} days",
                        chain[0].date(),
                        chain[chain.len() - 1].date(),
                        chain.len()
                    );

                    if let Some(traj) = Trajectory::new(chain) {
                        trajectories.push(traj);
                    }
                } else {
                    trace!(
                        target: "linker",
                        "discarding chain starting at {} with {} days",
                        start_date,
                        chain.len()
                    );
                    num_discarded += 1;
                }
            }
        }

        debug!(
            target: "linker",
            "{} trajectories kept, {} discarded, {} of {} clusters claimed",
            trajectories.len(),
            num_discarded,
            used.len(),
            season.num_clusters()
        );

        trajectories
    }

    /// The lowest scoring unclaimed candidate within range. Ties go to the earlier candidate.
    fn best_candidate<'a>(
        &self,
        current: &DailyCluster,
        candidates: &'a [DailyCluster],
        used: &HashSet<ClusterKey>,
    ) -> Option<&'a DailyCluster> {
        let mut best: Option<&DailyCluster> = None;
        let mut best_score = f64::INFINITY;

        for cand in candidates {
            if used.contains(&cand.key()) {
                continue;
            }

            let dist = local_distance_km(current.centroid(), cand.centroid());
            if dist > self.max_link_km {
                continue;
            }

            let score = link_score(current, cand, dist);
            trace!(
                target: "linker",
                "{:?} -> {:?}: {:.2} km, score {:.2}",
                current.key(),
                cand.key(),
                dist,
                score
            );

            if score < best_score {
                best_score = score;
                best = Some(cand);
            }
        }

        best
    }
}

/// Lower is better. Moving south lowers the score and a big change in size raises it.
fn link_score(current: &DailyCluster, candidate: &DailyCluster, dist_km: f64) -> f64 {
    let southward = current.lat() - candidate.lat();

    let big = current.count().max(candidate.count()) as f64;
    let small = current.count().min(candidate.count()).max(1) as f64;
    let size_ratio = big / small;

    dist_km - southward * SOUTHWARD_WEIGHT + size_ratio * SIZE_RATIO_WEIGHT
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::Coord;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn cluster(d: u32, id: usize, lat: f64, lon: f64, count: usize) -> DailyCluster {
        DailyCluster::new(day(d), id, Coord::new(lat, lon), count, count as f64, 1.0)
    }

    /// One cluster a day drifting 0.1 degrees south each day.
    fn drifting(days: &[u32], start_lat: f64, lon: f64) -> Vec<DailyCluster> {
        days.iter()
            .enumerate()
            .map(|(i, &d)| cluster(d, 0, start_lat - i as f64 * 0.1, lon, 10))
            .collect()
    }

    fn assert_invariants(trajs: &[Trajectory], min_len: usize) {
        let mut seen = HashSet::default();
        for traj in trajs {
            assert!(traj.len() >= min_len);
            for w in traj.clusters().windows(2) {
                assert!(w[0].date() < w[1].date());
            }
            for key in traj.keys() {
                assert!(seen.insert(key), "{:?} used twice", key);
            }
        }
    }

    #[test]
    fn test_single_drifting_group() {
        let season: SeasonClusters = drifting(&[1, 2, 3, 4, 5, 6], 10.0, 20.0)
            .into_iter()
            .collect();

        let trajs = TrajectoryLinker::default().link(&season);
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].len(), 6);
        assert_eq!(trajs[0].start_date(), day(1));
        assert_eq!(trajs[0].end_date(), day(6));
        assert_invariants(&trajs, 5);
    }

    #[test]
    fn test_too_short_is_dropped() {
        let season: SeasonClusters = drifting(&[1, 2, 3, 4], 10.0, 20.0).into_iter().collect();
        assert!(TrajectoryLinker::default().link(&season).is_empty());

        let linker = TrajectoryLinker {
            min_trajectory_length: 4,
            ..Default::default()
        };
        assert_eq!(linker.link(&season).len(), 1);
    }

    #[test]
    fn test_gap_handling() {
        // A gap of exactly max_gap_days is bridged.
        let season: SeasonClusters = drifting(&[1, 2, 5, 6, 7], 10.0, 20.0)
            .into_iter()
            .collect();
        let trajs = TrajectoryLinker::default().link(&season);
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].len(), 5);

        // One more day breaks the chain in two, both too short.
        let season: SeasonClusters = drifting(&[1, 2, 6, 7, 8], 10.0, 20.0)
            .into_iter()
            .collect();
        assert!(TrajectoryLinker::default().link(&season).is_empty());
    }

    #[test]
    fn test_unmatched_days_within_gap_are_skipped() {
        // Day 3 has a cluster, but it is far away. The chain keeps going past it.
        let mut clusters = drifting(&[1, 2, 4, 5, 6], 10.0, 20.0);
        clusters.push(cluster(3, 0, 5.0, 25.0, 10));
        let season: SeasonClusters = clusters.into_iter().collect();

        let trajs = TrajectoryLinker::default().link(&season);
        assert_eq!(trajs.len(), 1);
        let dates: Vec<_> = trajs[0].clusters().iter().map(|c| c.date()).collect();
        assert_eq!(dates, vec![day(1), day(2), day(4), day(5), day(6)]);
    }

    #[test]
    fn test_out_of_range_candidates_ignored() {
        // 0.3 degrees of latitude is 33.3 km, beyond the default 25 km.
        let season: SeasonClusters = (1..=6)
            .map(|d| cluster(d, 0, 10.0 - (d as f64) * 0.3, 20.0, 10))
            .collect();
        assert!(TrajectoryLinker::default().link(&season).is_empty());

        let linker = TrajectoryLinker::new(40.0, 3, 5);
        assert_eq!(linker.link(&season).len(), 1);
    }

    #[test]
    fn test_prefers_southward_candidate() {
        // Equally far north and south of the day 1 cluster.
        let season: SeasonClusters = vec![
            cluster(1, 0, 10.0, 20.0, 10),
            cluster(2, 0, 10.1, 20.0, 10),
            cluster(2, 1, 9.9, 20.0, 10),
        ]
        .into_iter()
        .collect();

        let linker = TrajectoryLinker::new(25.0, 3, 2);
        let trajs = linker.link(&season);

        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].last().id(), 1);
    }

    #[test]
    fn test_prefers_similar_size() {
        // Same distance and latitude, one candidate is ten times larger.
        let season: SeasonClusters = vec![
            cluster(1, 0, 10.0, 20.0, 10),
            cluster(2, 0, 10.0, 20.1, 100),
            cluster(2, 1, 10.0, 19.9, 12),
        ]
        .into_iter()
        .collect();

        let linker = TrajectoryLinker::new(25.0, 3, 2);
        let trajs = linker.link(&season);

        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].last().id(), 1);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let season: SeasonClusters = vec![
            cluster(1, 0, 10.0, 20.0, 10),
            cluster(2, 0, 10.0, 20.1, 10),
            cluster(2, 1, 10.0, 20.1, 10),
        ]
        .into_iter()
        .collect();

        let linker = TrajectoryLinker::new(25.0, 3, 2);
        let trajs = linker.link(&season);

        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].last().id(), 0);
    }

    #[test]
    fn test_parallel_groups_stay_separate() {
        let season: SeasonClusters = (1..=5)
            .flat_map(|d| {
                let lat = 10.0 - d as f64 * 0.1;
                vec![cluster(d, 0, lat, 20.0, 10), cluster(d, 1, lat, 22.0, 10)]
            })
            .collect();

        let trajs = TrajectoryLinker::default().link(&season);
        assert_eq!(trajs.len(), 2);
        assert_invariants(&trajs, 5);
        assert!(trajs[0].clusters().iter().all(|c| c.lon() == 20.0));
        assert!(trajs[1].clusters().iter().all(|c| c.lon() == 22.0));
    }

    #[test]
    fn test_discarded_chain_keeps_its_clusters() {
        // Along the equator 0.2 degrees of longitude is 22.2 km.
        //
        // The chain from A reaches B on day 4 and then dies, too short. The chain from A2 walks
        // X, Y and would have reached B on day 4, but B is already claimed.
        let season: SeasonClusters = vec![
            cluster(1, 0, 0.0, 0.0, 10), // A
            cluster(1, 1, 0.0, 0.8, 10), // A2
            cluster(2, 0, 0.0, 0.6, 10), // X
            cluster(3, 0, 0.0, 0.4, 10), // Y
            cluster(4, 0, 0.0, 0.2, 10), // B
        ]
        .into_iter()
        .collect();

        let linker = TrajectoryLinker::new(25.0, 3, 4);
        assert!(linker.link(&season).is_empty());

        // Without A there is nothing to claim B first.
        let season: SeasonClusters = season
            .iter()
            .flat_map(|(_, c)| c.iter().cloned())
            .filter(|c| !(c.date() == day(1) && c.id() == 0))
            .collect();
        let trajs = linker.link(&season);
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let mut clusters = vec![];
        for d in 1..=10 {
            for id in 0..4 {
                let lat = 10.0 - d as f64 * 0.05 + id as f64 * 0.07;
                let lon = 20.0 + ((d * 7 + id as u32 * 3) % 5) as f64 * 0.04;
                clusters.push(cluster(d, id, lat, lon, 5 + (d as usize * id) % 9));
            }
        }
        let season: SeasonClusters = clusters.into_iter().collect();

        let linker = TrajectoryLinker::new(25.0, 3, 3);
        let first = linker.link(&season);
        let second = linker.link(&season);

        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_invariants(&first, 3);
    }

    #[test]
    fn test_empty_season() {
        assert!(TrajectoryLinker::default()
            .link(&SeasonClusters::new())
            .is_empty());
    }
}
