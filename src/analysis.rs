/*!
 * Running the whole analysis for a park and a season.
 *
 * The core stages (clustering, linking, classification, and boundary interaction) are pure
 * functions. This module strings them together, applies the reporting policy, and runs many
 * independent (park, year) seasons in parallel.
 */

pub use batch::{analyze_batch, JobKey, SeasonJob};
pub use config::{prefilter, AnalysisConfig, DrySeason};
pub use season::{
    analyze_season, AnalyzedTrajectory, GroupReport, LabelStatistics, SeasonAnalysis,
    SeasonSummary,
};

mod batch;
mod config;
mod season;

static_assertions::assert_impl_all!(SeasonAnalysis: Send, Sync);
static_assertions::assert_impl_all!(SeasonJob: Send, Sync);
static_assertions::assert_impl_all!(AnalysisConfig: Send, Sync);
