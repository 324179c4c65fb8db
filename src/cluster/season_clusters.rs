use super::{cluster_day, DailyCluster};
use crate::detection::Detection;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/**
 * All the daily clusters for one season, ordered by date.
 *
 * Days without any clusters are not stored. The id of every cluster is its position in its day's
 * list, so no two clusters share a [ClusterKey](super::ClusterKey).
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonClusters(BTreeMap<NaiveDate, Vec<DailyCluster>>);

impl SeasonClusters {
    pub fn new() -> Self {
        SeasonClusters(BTreeMap::new())
    }

    /**
     * Cluster every day of a season.
     *
     * #Arguments
     * by_date - a season's detections split up by day, see
     * [group_by_date](crate::group_by_date).
     * eps_km - clustering radius in kilometers.
     * min_detections - minimum number of detections for a day to be clustered.
     */
    pub fn from_detections(
        by_date: &BTreeMap<NaiveDate, Vec<Detection>>,
        eps_km: f64,
        min_detections: usize,
    ) -> Self {
        let mut season = Self::new();
        for (&date, detections) in by_date {
            let clusters = cluster_day(detections, eps_km, min_detections);
            if !clusters.is_empty() {
                season.0.insert(date, clusters);
            }
        }

        season
    }

    /// Add a cluster to its day, after any clusters already on that day. The cluster's id is
    /// replaced with its position on that day.
    pub fn add_cluster(&mut self, mut cluster: DailyCluster) {
        let day = self.0.entry(cluster.date()).or_default();
        cluster.renumber(day.len());
        day.push(cluster);
    }

    /// The clusters on a day, empty if there were none.
    pub fn on(&self, date: NaiveDate) -> &[DailyCluster] {
        self.0.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Days with at least one cluster, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    /// Iterate over days and their clusters in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[DailyCluster])> + '_ {
        self.0.iter().map(|(d, c)| (*d, c.as_slice()))
    }

    /// The number of days that have at least one cluster.
    pub fn active_days(&self) -> usize {
        self.0.len()
    }

    /// The total number of clusters in the season.
    pub fn num_clusters(&self) -> usize {
        self.0.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<NaiveDate, Vec<DailyCluster>>> for SeasonClusters {
    fn from(src: BTreeMap<NaiveDate, Vec<DailyCluster>>) -> Self {
        // Clusters filed under the wrong date go to their own day.
        src.into_values().flatten().collect()
    }
}

impl FromIterator<DailyCluster> for SeasonClusters {
    fn from_iter<I: IntoIterator<Item = DailyCluster>>(iter: I) -> Self {
        let mut season = Self::new();
        for cluster in iter {
            season.add_cluster(cluster);
        }
        season
    }
}
