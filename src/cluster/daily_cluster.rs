use super::dbscan::dbscan;
use crate::{
    detection::Detection,
    geo::{BoundingBox, Coord, Geo, KM_PER_DEGREE},
};
use chrono::NaiveDate;
use log::debug;

/// Identifies a cluster within a season: the day it was seen and its index on that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey {
    pub date: NaiveDate,
    pub id: usize,
}

/**
 * The aggregate properties of a spatially connected group of detections on a single day.
 *
 * Apart from its id, which a [SeasonClusters](super::SeasonClusters) sets when the cluster is
 * added, a DailyCluster is never modified.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCluster {
    date: NaiveDate,
    /// Position of this cluster in the list of clusters for its day.
    id: usize,
    /// Average latitude and longitude of the member detections.
    centroid: Coord,
    /// The number of detections in this cluster.
    count: usize,
    /// Total (sum) of the radiative power of the detections in megawatts.
    total_power: f64,
    /// The larger of the latitude and longitude spans, converted to kilometers.
    spatial_extent_km: f64,
    bbox: BoundingBox,
    /// Indexes of the member detections in the list the cluster was made from.
    members: Vec<usize>,
}

impl DailyCluster {
    /**
     * Create a cluster from its summary values.
     *
     * This is for clusters produced outside of [cluster_day], so it has no member list and its
     * bounding box is just the centroid.
     */
    pub fn new(
        date: NaiveDate,
        id: usize,
        centroid: Coord,
        count: usize,
        total_power: f64,
        spatial_extent_km: f64,
    ) -> Self {
        DailyCluster {
            date,
            id,
            centroid,
            count,
            total_power,
            spatial_extent_km,
            bbox: BoundingBox {
                ll: centroid,
                ur: centroid,
            },
            members: vec![],
        }
    }

    fn from_members(
        date: NaiveDate,
        id: usize,
        detections: &[Detection],
        members: Vec<usize>,
    ) -> Self {
        debug_assert!(!members.is_empty());

        let mut bbox = BoundingBox::default();
        let mut lat_sum = 0.0;
        let mut lon_sum = 0.0;
        let mut total_power = 0.0;

        for &i in &members {
            let det = &detections[i];
            lat_sum += det.lat();
            lon_sum += det.lon();
            total_power += det.frp();
            bbox.expand_to(det.coord());
        }

        let count = members.len();
        let centroid = Coord {
            lat: lat_sum / count as f64,
            lon: lon_sum / count as f64,
        };

        let spatial_extent_km = f64::max(
            (bbox.ur.lat - bbox.ll.lat) * KM_PER_DEGREE,
            (bbox.ur.lon - bbox.ll.lon) * KM_PER_DEGREE,
        );

        DailyCluster {
            date,
            id,
            centroid,
            count,
            total_power,
            spatial_extent_km,
            bbox,
            members,
        }
    }

    /// Move the cluster to a new position in its day's list.
    pub(super) fn renumber(&mut self, id: usize) {
        self.id = id;
    }

    pub fn key(&self) -> ClusterKey {
        ClusterKey {
            date: self.date,
            id: self.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn lat(&self) -> f64 {
        self.centroid.lat
    }

    pub fn lon(&self) -> f64 {
        self.centroid.lon
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Total radiative power, megawatts.
    pub fn total_power(&self) -> f64 {
        self.total_power
    }

    pub fn spatial_extent_km(&self) -> f64 {
        self.spatial_extent_km
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

impl Geo for DailyCluster {
    fn centroid(&self) -> Coord {
        self.centroid
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/**
 * Group one day's detections into clusters.
 *
 * The radius is converted from kilometers to degrees with a fixed 111 km/degree in both
 * directions, so clusters away from the equator reach a little further east-west than `eps_km`.
 * A detection needs `min_detections / 2` detections (itself included) within that radius to seed
 * a cluster. Detections that end up in no cluster are dropped.
 *
 * #Arguments
 * detections - all the detections for a single day.
 * eps_km - the clustering radius in kilometers, must be positive.
 * min_detections - days with fewer detections than this produce no clusters at all.
 *
 * #Returns
 * The clusters, in the order they were found. Member indexes refer to `detections`.
 */
pub fn cluster_day(
    detections: &[Detection],
    eps_km: f64,
    min_detections: usize,
) -> Vec<DailyCluster> {
    if detections.is_empty() || detections.len() < min_detections {
        return vec![];
    }

    let date = detections[0].date();
    debug_assert!(detections.iter().all(|d| d.date() == date));

    let eps_deg = eps_km / KM_PER_DEGREE;
    let min_samples = (min_detections / 2).max(1);

    let coords: Vec<Coord> = detections.iter().map(|d| d.coord()).collect();
    let labels = dbscan(&coords, eps_deg, min_samples);

    let num_clusters = labels.iter().flatten().map(|l| l + 1).max().unwrap_or(0);
    let mut members: Vec<Vec<usize>> = vec![vec![]; num_clusters];
    for (i, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            members[*label].push(i);
        }
    }

    let clusters: Vec<DailyCluster> = members
        .into_iter()
        .enumerate()
        .map(|(id, mems)| DailyCluster::from_members(date, id, detections, mems))
        .collect();

    debug!(
        target: "cluster",
        "{}: {} detections, {} clusters, {} noise",
        date,
        detections.len(),
        clusters.len(),
        labels.iter().filter(|l| l.is_none()).count()
    );

    clusters
}
