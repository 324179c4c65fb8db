/*!
 * Trajectories of fire groups.
 *
 * A trajectory is the path of a single group of people (herders, hunters, park staff) who light
 * fires as they travel. It is reconstructed by chaining together daily clusters, at most one per
 * day, with [TrajectoryLinker].
 */
use crate::{
    cluster::{ClusterKey, DailyCluster},
    geo::{local_distance_km, BoundingBox, Coord, Geo},
};
use chrono::NaiveDate;

pub use linker::TrajectoryLinker;

mod linker;

/**
 * An ordered sequence of daily clusters with strictly increasing dates.
 *
 * A trajectory is never empty, and it is never modified once the linker has finished it.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    clusters: Vec<DailyCluster>,
}

impl Trajectory {
    /// Create a trajectory from clusters, `None` if it is empty or the dates are not strictly
    /// increasing.
    pub fn new(clusters: Vec<DailyCluster>) -> Option<Self> {
        if clusters.is_empty() || clusters.windows(2).any(|w| w[0].date() >= w[1].date()) {
            return None;
        }

        Some(Trajectory { clusters })
    }

    pub fn clusters(&self) -> &[DailyCluster] {
        &self.clusters
    }

    /// The number of days the group was observed.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Always false, a trajectory has at least one cluster.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn first(&self) -> &DailyCluster {
        &self.clusters[0]
    }

    pub fn last(&self) -> &DailyCluster {
        &self.clusters[self.clusters.len() - 1]
    }

    pub fn start_date(&self) -> NaiveDate {
        self.first().date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.last().date()
    }

    /// Total number of detections in all the clusters.
    pub fn total_fires(&self) -> usize {
        self.clusters.iter().map(|c| c.count()).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = ClusterKey> + '_ {
        self.clusters.iter().map(|c| c.key())
    }

    /// The daily cluster centroids in order.
    pub fn path(&self) -> impl Iterator<Item = Coord> + '_ {
        self.clusters.iter().map(|c| c.centroid())
    }

    /// The distance moved between each pair of consecutive clusters in kilometers.
    pub fn step_distances_km(&self) -> Vec<f64> {
        self.clusters
            .windows(2)
            .map(|w| local_distance_km(w[0].centroid(), w[1].centroid()))
            .collect()
    }
}

impl Geo for Trajectory {
    fn centroid(&self) -> Coord {
        let n = self.clusters.len() as f64;
        let (lat, lon) = self
            .clusters
            .iter()
            .fold((0.0, 0.0), |(lat, lon), c| (lat + c.lat(), lon + c.lon()));
        Coord {
            lat: lat / n,
            lon: lon / n,
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::default();
        for cluster in &self.clusters {
            let cbox = cluster.bounding_box();
            bbox.expand_to(cbox.ll);
            bbox.expand_to(cbox.ur);
        }
        bbox
    }
}
