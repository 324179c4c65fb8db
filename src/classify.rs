/*!
 * Classify trajectories by the kind of group that most likely made them.
 *
 * The classification is a simple decision tree on the average daily movement, the net southward
 * movement, the duration, and the spread of the daily clusters. Foot and cattle traffic move a
 * few kilometers to a few tens of kilometers a day, anything faster is assumed to be management
 * burning from a vehicle or aircraft.
 */
use crate::{
    geo::{Coord, KM_PER_DEGREE},
    trajectory::Trajectory,
};
use chrono::NaiveDate;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The behavior a trajectory is attributed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BehaviorLabel {
    /// Faster than 30 km/day, aircraft.
    ManagementFast,
    /// Fast with large fires, a vehicle.
    ManagementVehicle,
    /// Fast local movement.
    HerderFast,
    /// Sustained southward movement at 5-15 km/day.
    Transhumance,
    /// Short movements that aren't clearly directional.
    HerderLocal,
    /// Slow southward movement over more than 10 days.
    TranshumanceSlow,
    /// Short duration local burns.
    LocalBurning,
    /// Very slow over a long time, usually near a settlement.
    VillagePersistent,
    /// Very slow and short.
    LocalStationary,
    /// Too short to classify.
    Unknown,
}

impl BehaviorLabel {
    /// Burning by park management rather than by a group on foot.
    pub fn is_management(&self) -> bool {
        matches!(
            self,
            BehaviorLabel::ManagementFast | BehaviorLabel::ManagementVehicle
        )
    }

    pub fn is_transhumance(&self) -> bool {
        matches!(
            self,
            BehaviorLabel::Transhumance | BehaviorLabel::TranshumanceSlow
        )
    }

    pub fn is_herder(&self) -> bool {
        matches!(self, BehaviorLabel::HerderFast | BehaviorLabel::HerderLocal)
    }

    /// Slow burning that stays around a settlement.
    pub fn is_village(&self) -> bool {
        matches!(
            self,
            BehaviorLabel::VillagePersistent | BehaviorLabel::LocalStationary
        )
    }
}

/**
 * Summary of the movement along a trajectory.
 *
 * Values are kept at full precision, the classification is done on these. Use
 * [TrajectoryMetrics::rounded] for reporting.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryMetrics {
    /// Number of days with a cluster.
    pub days: usize,
    /// Total number of detections.
    pub fires: usize,
    /// Positive if the group ended up south of where it started.
    pub net_south_km: f64,
    /// Positive if the group ended up east of where it started.
    pub net_east_km: f64,
    /// Mean distance between consecutive clusters.
    pub avg_speed_km_day: f64,
    pub max_speed_km_day: f64,
    /// Mean spatial extent of the daily clusters.
    pub avg_spread_km: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start: Coord,
    pub end: Coord,
}

impl TrajectoryMetrics {
    /**
     * Calculate the metrics for a trajectory.
     *
     * Speeds are per step between consecutive clusters, whether or not there were skipped days in
     * between. The east-west distance is scaled by the cosine of the mean of the start and end
     * latitudes.
     */
    pub fn from_trajectory(traj: &Trajectory) -> Self {
        let start = traj.first();
        let end = traj.last();

        let net_south_km = (start.lat() - end.lat()) * KM_PER_DEGREE;
        let mean_lat = (start.lat() + end.lat()) / 2.0;
        let net_east_km = (end.lon() - start.lon()) * KM_PER_DEGREE * mean_lat.to_radians().cos();

        let steps = traj.step_distances_km();
        let (avg_speed_km_day, max_speed_km_day) = if steps.is_empty() {
            (0.0, 0.0)
        } else {
            (
                steps.iter().sum::<f64>() / steps.len() as f64,
                steps.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        let avg_spread_km = traj
            .clusters()
            .iter()
            .map(|c| c.spatial_extent_km())
            .sum::<f64>()
            / traj.len() as f64;

        TrajectoryMetrics {
            days: traj.len(),
            fires: traj.total_fires(),
            net_south_km,
            net_east_km,
            avg_speed_km_day,
            max_speed_km_day,
            avg_spread_km,
            start_date: traj.start_date(),
            end_date: traj.end_date(),
            start: Coord::new(start.lat(), start.lon()),
            end: Coord::new(end.lat(), end.lon()),
        }
    }

    /// Distances rounded to 0.1 km and coordinates to 0.001 degrees.
    pub fn rounded(&self) -> Self {
        let km = |v: f64| (v * 10.0).round() / 10.0;
        let deg = |v: f64| (v * 1000.0).round() / 1000.0;

        TrajectoryMetrics {
            net_south_km: km(self.net_south_km),
            net_east_km: km(self.net_east_km),
            avg_speed_km_day: km(self.avg_speed_km_day),
            max_speed_km_day: km(self.max_speed_km_day),
            avg_spread_km: km(self.avg_spread_km),
            start: Coord::new(deg(self.start.lat), deg(self.start.lon)),
            end: Coord::new(deg(self.end.lat), deg(self.end.lon)),
            ..*self
        }
    }

    /// Apply the decision rules. The first rule that matches wins.
    pub fn label(&self) -> BehaviorLabel {
        use BehaviorLabel::*;

        let speed = self.avg_speed_km_day;

        if speed > 30.0 {
            ManagementFast
        } else if speed > 15.0 {
            if self.avg_spread_km > 30.0 {
                ManagementVehicle
            } else {
                HerderFast
            }
        } else if speed > 5.0 {
            if self.net_south_km > 20.0 {
                Transhumance
            } else {
                HerderLocal
            }
        } else if speed > 2.0 {
            if self.days > 10 && self.net_south_km > 15.0 {
                TranshumanceSlow
            } else {
                LocalBurning
            }
        } else if self.days > 7 {
            VillagePersistent
        } else {
            LocalStationary
        }
    }
}

/// The minimum number of days needed to classify a trajectory.
pub const MIN_CLASSIFY_DAYS: usize = 3;

/**
 * Classify a trajectory.
 *
 * #Returns
 * The label and the metrics it was decided on. Trajectories shorter than [MIN_CLASSIFY_DAYS] are
 * [BehaviorLabel::Unknown] with no metrics.
 */
pub fn classify(traj: &Trajectory) -> (BehaviorLabel, Option<TrajectoryMetrics>) {
    if traj.len() < MIN_CLASSIFY_DAYS {
        return (BehaviorLabel::Unknown, None);
    }

    let metrics = TrajectoryMetrics::from_trajectory(traj);
    (metrics.label(), Some(metrics))
}

/// A trajectory with its label and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTrajectory {
    pub trajectory: Trajectory,
    pub label: BehaviorLabel,
    pub metrics: Option<TrajectoryMetrics>,
}

impl ClassifiedTrajectory {
    pub fn new(trajectory: Trajectory) -> Self {
        let (label, metrics) = classify(&trajectory);
        ClassifiedTrajectory {
            trajectory,
            label,
            metrics,
        }
    }
}

impl From<Trajectory> for ClassifiedTrajectory {
    fn from(trajectory: Trajectory) -> Self {
        Self::new(trajectory)
    }
}
