use crate::{
    detection::Detection,
    error::ConfigError,
    geo::BoundingBox,
    trajectory::TrajectoryLinker,
};
use chrono::{Datelike, NaiveDate};
use std::{
    fmt::{self, Display},
    ops::RangeInclusive,
};

/**
 * All the tunable parameters of an analysis.
 *
 * The defaults are the values the analysis was calibrated with for West and Central African
 * savanna parks.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Radius for daily clustering.
    pub eps_km: f64,
    /// Days with fewer detections are not clustered. Half of this is the number of neighbors a
    /// detection needs to seed a cluster.
    pub min_detections: usize,
    /// The furthest a group can move between sightings.
    pub max_link_km: f64,
    /// The most days a group can go without being seen.
    pub max_gap_days: i64,
    /// Shorter trajectories are discarded.
    pub min_trajectory_length: usize,
    /// Groups with an average speed, rounded to 0.1 km/day, outside this range are not reported.
    pub plausible_speed_km_day: RangeInclusive<f64>,
    /// Don't report groups labeled as management burning.
    pub skip_management: bool,
    /// Seasons with fewer detections are not analyzed.
    pub min_season_detections: usize,
    /// Seasons with fewer days with clusters are not linked.
    pub min_active_days: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            eps_km: 15.0,
            min_detections: 8,
            max_link_km: 25.0,
            max_gap_days: 3,
            min_trajectory_length: 5,
            plausible_speed_km_day: 0.5..=30.0,
            skip_management: true,
            min_season_detections: 100,
            min_active_days: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn with_eps_km(self, eps_km: f64) -> Self {
        AnalysisConfig { eps_km, ..self }
    }

    pub fn with_min_detections(self, min_detections: usize) -> Self {
        AnalysisConfig {
            min_detections,
            ..self
        }
    }

    pub fn with_max_link_km(self, max_link_km: f64) -> Self {
        AnalysisConfig {
            max_link_km,
            ..self
        }
    }

    pub fn with_max_gap_days(self, max_gap_days: i64) -> Self {
        AnalysisConfig {
            max_gap_days,
            ..self
        }
    }

    pub fn with_min_trajectory_length(self, min_trajectory_length: usize) -> Self {
        AnalysisConfig {
            min_trajectory_length,
            ..self
        }
    }

    pub fn with_plausible_speed(self, plausible_speed_km_day: RangeInclusive<f64>) -> Self {
        AnalysisConfig {
            plausible_speed_km_day,
            ..self
        }
    }

    pub fn with_skip_management(self, skip_management: bool) -> Self {
        AnalysisConfig {
            skip_management,
            ..self
        }
    }

    pub fn with_min_season_detections(self, min_season_detections: usize) -> Self {
        AnalysisConfig {
            min_season_detections,
            ..self
        }
    }

    pub fn with_min_active_days(self, min_active_days: usize) -> Self {
        AnalysisConfig {
            min_active_days,
            ..self
        }
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eps_km.is_finite() && self.eps_km > 0.0) {
            return Err(ConfigError {
                msg: "eps_km must be positive",
            });
        }

        if self.min_detections == 0 {
            return Err(ConfigError {
                msg: "min_detections must be at least 1",
            });
        }

        if !(self.max_link_km.is_finite() && self.max_link_km > 0.0) {
            return Err(ConfigError {
                msg: "max_link_km must be positive",
            });
        }

        if self.max_gap_days <= 0 {
            return Err(ConfigError {
                msg: "max_gap_days must be at least 1",
            });
        }

        if self.min_trajectory_length == 0 {
            return Err(ConfigError {
                msg: "min_trajectory_length must be at least 1",
            });
        }

        let speeds = &self.plausible_speed_km_day;
        if speeds.start().is_nan() || speeds.end().is_nan() || speeds.start() > speeds.end() {
            return Err(ConfigError {
                msg: "plausible speed range is empty",
            });
        }

        Ok(())
    }

    /// The linker for these parameters.
    pub fn linker(&self) -> TrajectoryLinker {
        TrajectoryLinker::new(
            self.max_link_km,
            self.max_gap_days,
            self.min_trajectory_length,
        )
    }
}

impl Display for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "          Cluster radius: {:.1} km", self.eps_km)?;
        writeln!(f, "   Min detections / day: {}", self.min_detections)?;
        writeln!(f, "       Max link distance: {:.1} km", self.max_link_km)?;
        writeln!(f, "            Max gap days: {}", self.max_gap_days)?;
        writeln!(f, "   Min trajectory length: {}", self.min_trajectory_length)?;
        writeln!(
            f,
            "         Plausible speed: {:.1} - {:.1} km/day",
            self.plausible_speed_km_day.start(),
            self.plausible_speed_km_day.end()
        )?;
        writeln!(f, "         Skip management: {}", self.skip_management)?;
        writeln!(f, "Min detections / season: {}", self.min_season_detections)?;
        writeln!(f, "         Min active days: {}", self.min_active_days)?;

        Ok(())
    }
}

/// The calendar months that make up the dry (burning) season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrySeason {
    months: Vec<u32>,
}

impl Default for DrySeason {
    /// November through March.
    fn default() -> Self {
        DrySeason {
            months: vec![11, 12, 1, 2, 3],
        }
    }
}

impl DrySeason {
    /// Months are numbered from 1, anything outside 1 to 12 is ignored.
    pub fn new(months: &[u32]) -> Self {
        DrySeason {
            months: months
                .iter()
                .copied()
                .filter(|m| (1..=12).contains(m))
                .collect(),
        }
    }

    /**
     * The dry season for a park at `lat`.
     *
     * North of the equator the dry season runs November through March, otherwise May through
     * October.
     */
    pub fn for_latitude(lat: f64) -> Self {
        if lat > 0.0 {
            DrySeason::default()
        } else {
            DrySeason {
                months: (5..=10).collect(),
            }
        }
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.months.contains(&date.month())
    }
}

/**
 * Keep only the detections in the dry season and inside a bounding box.
 *
 * This is how a season's worth of detections for a single park is normally cut out of a larger
 * data set, see [BoundingBox::around].
 */
pub fn prefilter<I>(detections: I, season: &DrySeason, bbox: &BoundingBox) -> Vec<Detection>
where
    I: IntoIterator<Item = Detection>,
{
    detections
        .into_iter()
        .filter(|d| season.contains(d.date()) && bbox.contains(d.coord()))
        .collect()
}
