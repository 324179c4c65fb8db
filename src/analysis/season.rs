use super::AnalysisConfig;
use crate::{
    classify::{BehaviorLabel, ClassifiedTrajectory, TrajectoryMetrics},
    cluster::SeasonClusters,
    detection::Detection,
    geo::Boundary,
    interaction::{analyze_interaction, InteractionResult, Outcome},
    FireGroupsResult,
};
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// A classified trajectory and, if there was a boundary, how it interacted with it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedTrajectory {
    pub classified: ClassifiedTrajectory,
    pub interaction: Option<InteractionResult>,
}

/// A group that entered the protected area and passed the reporting policy.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    /// Index into [SeasonAnalysis::trajectories].
    pub trajectory_index: usize,
    pub label: BehaviorLabel,
    /// Average speed of the whole trajectory, rounded to 0.1 km/day.
    pub avg_speed_km_day: f64,
    pub interaction: InteractionResult,
}

/// Statistics over all the reported groups of a season.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSummary {
    pub total_groups: usize,
    pub transhumance_groups: usize,
    pub herder_groups: usize,
    pub avg_days_burning: f64,
    pub median_days_burning: f64,
    pub max_days_burning: usize,
    pub total_fires_inside: usize,
    pub groups_transited: usize,
    pub groups_stopped_inside: usize,
    pub groups_stopped_after_exit: usize,
    pub avg_days_tracked_before: f64,
    pub avg_days_tracked_after: f64,
}

impl SeasonSummary {
    /// Summarize a list of groups, `None` if it is empty.
    pub fn from_groups(groups: &[GroupReport]) -> Option<Self> {
        if groups.is_empty() {
            return None;
        }

        let n = groups.len() as f64;
        let count_outcome = |outcome: Outcome| {
            groups
                .iter()
                .filter(|g| g.interaction.outcome == outcome)
                .count()
        };

        let mut days: Vec<usize> = groups
            .iter()
            .map(|g| g.interaction.days_burning_inside)
            .collect();
        days.sort_unstable();

        let mid = days.len() / 2;
        let median_days_burning = if days.len() % 2 == 0 {
            (days[mid - 1] + days[mid]) as f64 / 2.0
        } else {
            days[mid] as f64
        };

        Some(SeasonSummary {
            total_groups: groups.len(),
            transhumance_groups: groups.iter().filter(|g| g.label.is_transhumance()).count(),
            herder_groups: groups.iter().filter(|g| g.label.is_herder()).count(),
            avg_days_burning: days.iter().sum::<usize>() as f64 / n,
            median_days_burning,
            max_days_burning: days[days.len() - 1],
            total_fires_inside: groups.iter().map(|g| g.interaction.fires_inside).sum(),
            groups_transited: count_outcome(Outcome::Transited),
            groups_stopped_inside: count_outcome(Outcome::StoppedInside),
            groups_stopped_after_exit: count_outcome(Outcome::StoppedAfterExit),
            avg_days_tracked_before: groups
                .iter()
                .map(|g| g.interaction.days_tracked_before())
                .sum::<usize>() as f64
                / n,
            avg_days_tracked_after: groups
                .iter()
                .map(|g| g.interaction.days_tracked_after())
                .sum::<usize>() as f64
                / n,
        })
    }
}

/**
 * Counts of the classified trajectories of a season by kind of group, whether or not they came
 * near the boundary.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStatistics {
    /// The detections that went into the analysis, already cut down to the dry season.
    pub dry_season_fires: usize,
    pub transhumance_groups: usize,
    /// Total detections of all the transhumance groups.
    pub transhumance_fires: usize,
    /// Mean of the average speeds of the transhumance groups, 0 if there were none.
    pub avg_transhumance_speed_km_day: f64,
    pub herder_groups: usize,
    pub management_groups: usize,
    pub village_groups: usize,
    /// The calendar month with the most detections.
    pub peak_month: Option<u32>,
}

impl LabelStatistics {
    pub fn from_groups(
        by_label: &BTreeMap<BehaviorLabel, Vec<TrajectoryMetrics>>,
        dry_season_fires: usize,
        peak_month: Option<u32>,
    ) -> Self {
        let select = |pred: fn(&BehaviorLabel) -> bool| {
            by_label
                .iter()
                .filter(move |(label, _)| pred(label))
                .flat_map(|(_, metrics)| metrics.iter())
        };
        let count = |pred: fn(&BehaviorLabel) -> bool| select(pred).count();

        let transhumance_groups = count(BehaviorLabel::is_transhumance);
        let avg_transhumance_speed_km_day = if transhumance_groups > 0 {
            select(BehaviorLabel::is_transhumance)
                .map(|m| m.avg_speed_km_day)
                .sum::<f64>()
                / transhumance_groups as f64
        } else {
            0.0
        };

        LabelStatistics {
            dry_season_fires,
            transhumance_groups,
            transhumance_fires: select(BehaviorLabel::is_transhumance)
                .map(|m| m.fires)
                .sum(),
            avg_transhumance_speed_km_day,
            herder_groups: count(BehaviorLabel::is_herder),
            management_groups: count(BehaviorLabel::is_management),
            village_groups: count(BehaviorLabel::is_village),
            peak_month,
        }
    }
}

/// Everything learned from one season of detections around one park.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonAnalysis {
    /// The number of detections that went into the analysis.
    pub num_detections: usize,
    /// The calendar month with the most detections, ties go to the lower month number.
    pub peak_month: Option<u32>,
    pub clusters: SeasonClusters,
    pub trajectories: Vec<AnalyzedTrajectory>,
    /// The groups that entered the boundary and passed the reporting policy.
    pub groups: Vec<GroupReport>,
    pub summary: Option<SeasonSummary>,
}

impl SeasonAnalysis {
    /// The metrics of every classified trajectory, grouped by label.
    pub fn groups_by_label(&self) -> BTreeMap<BehaviorLabel, Vec<TrajectoryMetrics>> {
        let mut by_label: BTreeMap<BehaviorLabel, Vec<TrajectoryMetrics>> = BTreeMap::new();
        for traj in &self.trajectories {
            if let Some(metrics) = traj.classified.metrics {
                by_label
                    .entry(traj.classified.label)
                    .or_default()
                    .push(metrics);
            }
        }
        by_label
    }

    /// Group counts by kind over every classified trajectory.
    pub fn label_statistics(&self) -> LabelStatistics {
        LabelStatistics::from_groups(&self.groups_by_label(), self.num_detections, self.peak_month)
    }

    /// The trajectories that entered the boundary, whether or not they were reported.
    pub fn interactions(
        &self,
    ) -> impl Iterator<Item = (&ClassifiedTrajectory, &InteractionResult)> + '_ {
        self.trajectories
            .iter()
            .filter_map(|t| t.interaction.as_ref().map(|i| (&t.classified, i)))
    }
}

/**
 * Analyze one season of detections.
 *
 * Seasons with too few detections or too few days with clusters are not errors, they just
 * produce an analysis with nothing in it. Without a boundary the trajectories are still
 * clustered, linked, and classified, but there are no interactions or groups to report.
 *
 * #Arguments
 * by_date - the detections for a single park and season, see [group_by_date](crate::group_by_date).
 * boundary - the protected area, if one is available.
 * config - analysis parameters, these are validated first.
 */
pub fn analyze_season(
    by_date: &BTreeMap<NaiveDate, Vec<Detection>>,
    boundary: Option<&dyn Boundary>,
    config: &AnalysisConfig,
) -> FireGroupsResult<SeasonAnalysis> {
    config.validate()?;

    let num_detections: usize = by_date.values().map(|v| v.len()).sum();
    let mut analysis = SeasonAnalysis {
        num_detections,
        peak_month: peak_month(by_date),
        ..SeasonAnalysis::default()
    };

    if num_detections < config.min_season_detections {
        debug!(
            target: "analysis",
            "only {} detections, need {}",
            num_detections,
            config.min_season_detections
        );
        return Ok(analysis);
    }

    analysis.clusters =
        SeasonClusters::from_detections(by_date, config.eps_km, config.min_detections);

    if analysis.clusters.active_days() < config.min_active_days {
        debug!(
            target: "analysis",
            "only {} days with clusters, need {}",
            analysis.clusters.active_days(),
            config.min_active_days
        );
        return Ok(analysis);
    }

    if boundary.is_none() {
        warn!(target: "analysis", "no boundary, interactions will not be analyzed");
    }

    analysis.trajectories = config
        .linker()
        .link(&analysis.clusters)
        .into_iter()
        .map(|traj| {
            let interaction = boundary.and_then(|b| analyze_interaction(&traj, b));
            AnalyzedTrajectory {
                classified: ClassifiedTrajectory::new(traj),
                interaction,
            }
        })
        .collect();

    analysis.groups = analysis
        .trajectories
        .iter()
        .enumerate()
        .filter_map(|(i, t)| report_group(i, t, config))
        .collect();

    analysis.summary = SeasonSummary::from_groups(&analysis.groups);

    info!(
        target: "analysis",
        "{} detections, {} clusters, {} trajectories, {} groups reported",
        num_detections,
        analysis.clusters.num_clusters(),
        analysis.trajectories.len(),
        analysis.groups.len()
    );

    Ok(analysis)
}

fn peak_month(by_date: &BTreeMap<NaiveDate, Vec<Detection>>) -> Option<u32> {
    let mut by_month: BTreeMap<u32, usize> = BTreeMap::new();
    for (date, dets) in by_date {
        *by_month.entry(date.month()).or_default() += dets.len();
    }

    let mut peak: Option<(u32, usize)> = None;
    for (month, count) in by_month {
        if count > 0 && peak.map_or(true, |(_, most)| count > most) {
            peak = Some((month, count));
        }
    }

    peak.map(|(month, _)| month)
}

/// Apply the reporting policy to a single trajectory.
fn report_group(
    index: usize,
    traj: &AnalyzedTrajectory,
    config: &AnalysisConfig,
) -> Option<GroupReport> {
    let interaction = traj.interaction.as_ref()?;
    let label = traj.classified.label;

    if config.skip_management && label.is_management() {
        return None;
    }

    let avg_speed_km_day = traj
        .classified
        .metrics
        .map(|m| m.rounded().avg_speed_km_day)
        .unwrap_or(0.0);

    if !config.plausible_speed_km_day.contains(&avg_speed_km_day) {
        debug!(
            target: "analysis",
            "rejecting {} group at {:.1} km/day",
            label,
            avg_speed_km_day
        );
        return None;
    }

    Some(GroupReport {
        trajectory_index: index,
        label,
        avg_speed_km_day,
        interaction: interaction.clone(),
    })
}
