/*!
 * Tools for finding groups of people traveling and burning across the landscape.
 *
 * Satellite fire detections are clustered day by day, the daily clusters are linked into
 * trajectories of single groups, each trajectory is classified by how it moved, and trajectories
 * that enter a protected area are analyzed for what happened to them there.
 */

pub use analysis::{
    analyze_batch, analyze_season, prefilter, AnalysisConfig, AnalyzedTrajectory, DrySeason,
    GroupReport, JobKey, LabelStatistics, SeasonAnalysis, SeasonJob, SeasonSummary,
};
pub use classify::{
    classify, BehaviorLabel, ClassifiedTrajectory, TrajectoryMetrics, MIN_CLASSIFY_DAYS,
};
pub use cluster::{cluster_day, ClusterKey, DailyCluster, SeasonClusters};
pub use detection::{group_by_date, keep_valid, parse_acq_time, Confidence, Detection};
pub use error::{
    BoundaryError, ConfigError, FireGroupsResult, ValidationError, ValidationErrorKind,
};
pub use geo::{
    local_distance_km, Boundary, BoundingBox, Coord, Geo, Polygon, ProtectedArea, KM_PER_DEGREE,
};
pub use interaction::{analyze_interaction, InteractionResult, Outcome, TrackPoint};
pub use kml::{
    write_label_styles, write_protected_area, write_trajectory, KmlBuffer, KmlFile, KmlWriter,
};
pub use trajectory::{Trajectory, TrajectoryLinker};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod analysis;
mod classify;
mod cluster;
mod detection;
mod error;
mod geo;
mod interaction;
mod kml;
mod trajectory;
