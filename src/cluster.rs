/*!
 * Types and functions for working with daily clusters.
 *
 * A daily cluster describes the aggregate properties of a spatially connected group of
 * [Detection](crate::Detection) objects that were all observed on the same day. Each one is a
 * candidate sighting of a fire group for that day.
 */

pub use daily_cluster::{cluster_day, ClusterKey, DailyCluster};
pub use season_clusters::SeasonClusters;

mod daily_cluster;
mod dbscan;
mod season_clusters;
