use chrono::NaiveDate;
use firegroups::{
    analyze_batch, analyze_season, classify, cluster_day, group_by_date, keep_valid, prefilter,
    AnalysisConfig, BehaviorLabel, BoundingBox, Coord, Detection, DrySeason, KmlBuffer, Outcome,
    ProtectedArea, SeasonClusters, SeasonJob, TrajectoryLinker,
};
use log::LevelFilter;
use once_cell::sync::OnceCell;
use simple_logger::SimpleLogger;

static LOGGER: OnceCell<()> = OnceCell::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        // Another test harness may already have installed a logger.
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
    });
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

/// Ten detections scattered within a couple of kilometers of a point.
fn blob(date: NaiveDate, lat: f64, lon: f64) -> Vec<Detection> {
    const OFFSETS: [(f64, f64); 10] = [
        (0.000, 0.000),
        (0.010, 0.000),
        (0.000, 0.010),
        (-0.010, 0.000),
        (0.000, -0.010),
        (0.007, 0.007),
        (-0.007, 0.007),
        (0.007, -0.007),
        (-0.007, -0.007),
        (0.015, 0.003),
    ];

    OFFSETS
        .iter()
        .map(|(dlat, dlon)| Detection::new(lat + dlat, lon + dlon, date, 4.5).unwrap())
        .collect()
}

/// One blob a day along a path.
fn track(path: &[(f64, f64)]) -> Vec<Detection> {
    path.iter()
        .enumerate()
        .flat_map(|(i, &(lat, lon))| blob(day(1 + i as u32), lat, lon))
        .collect()
}

fn band(min_lat: f64, max_lat: f64) -> ProtectedArea {
    ProtectedArea::from_ring(
        "band",
        vec![
            Coord::new(min_lat, 19.0),
            Coord::new(min_lat, 21.0),
            Coord::new(max_lat, 21.0),
            Coord::new(max_lat, 19.0),
        ],
    )
    .unwrap()
}

fn small_season_config() -> AnalysisConfig {
    AnalysisConfig::default().with_min_season_detections(10)
}

#[test]
fn test_stationary_group() {
    init_logging();

    let dets = track(&[(0.0, 20.0); 6]);
    let by_date = group_by_date(dets);

    let mut season = SeasonClusters::new();
    for day_dets in by_date.values() {
        let clusters = cluster_day(day_dets, 15.0, 4);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 10);
        for cluster in clusters {
            season.add_cluster(cluster);
        }
    }

    let trajs = TrajectoryLinker::default().link(&season);
    assert_eq!(trajs.len(), 1);
    assert_eq!(trajs[0].len(), 6);

    let (label, metrics) = classify(&trajs[0]);
    let metrics = metrics.unwrap();
    assert_eq!(label, BehaviorLabel::LocalStationary);
    assert!(metrics.avg_speed_km_day < 1.0e-9);
    assert_eq!(metrics.fires, 60);
}

#[test]
fn test_transhumance_group() {
    init_logging();

    let path: Vec<(f64, f64)> = (0..10).map(|i| (2.0 - i as f64 / 9.0, 20.0)).collect();
    let by_date = group_by_date(track(&path));

    let analysis = analyze_season(&by_date, None, &small_season_config()).unwrap();
    assert_eq!(analysis.clusters.active_days(), 10);
    assert_eq!(analysis.trajectories.len(), 1);

    let ct = &analysis.trajectories[0].classified;
    let metrics = ct.metrics.unwrap();
    assert_eq!(ct.label, BehaviorLabel::Transhumance);
    assert!((metrics.avg_speed_km_day - 12.33).abs() < 0.01);
    assert!((metrics.net_south_km - 111.0).abs() < 1.0e-6);
    assert_eq!(metrics.days, 10);

    let stats = analysis.label_statistics();
    assert_eq!(stats.dry_season_fires, 100);
    assert_eq!(stats.transhumance_groups, 1);
    assert_eq!(stats.transhumance_fires, 100);
    assert_eq!(stats.peak_month, Some(1));
}

#[test]
fn test_group_stops_inside() {
    init_logging();

    // 0.1 degrees a day south, the last three days inside the band.
    let path: Vec<(f64, f64)> = (0..6).map(|i| (10.0 - i as f64 * 0.1, 20.0)).collect();
    let area = band(9.45, 9.75);

    let analysis =
        analyze_season(&group_by_date(track(&path)), Some(&area), &small_season_config()).unwrap();

    assert_eq!(analysis.groups.len(), 1);
    let group = &analysis.groups[0];
    assert_eq!(group.interaction.outcome, Outcome::StoppedInside);
    assert_eq!(group.interaction.days_burning_inside, 3);
    assert_eq!(group.interaction.fires_inside, 30);
    assert_eq!(group.interaction.days_tracked_after(), 0);

    let summary = analysis.summary.as_ref().unwrap();
    assert_eq!(summary.groups_stopped_inside, 1);
}

#[test]
fn test_group_transits() {
    init_logging();

    // Enters on day 3, last inside on day 5, keeps burning outside through day 8.
    let path: Vec<(f64, f64)> = (0..8).map(|i| (10.0 - i as f64 * 0.1, 20.0)).collect();
    let area = band(9.55, 9.85);

    let analysis =
        analyze_season(&group_by_date(track(&path)), Some(&area), &small_season_config()).unwrap();

    assert_eq!(analysis.groups.len(), 1);
    let res = &analysis.groups[0].interaction;
    assert_eq!(res.outcome, Outcome::Transited);
    assert_eq!(res.days_burning_inside, 3);
    assert_eq!(res.entry_date, day(3));
    assert_eq!(res.last_inside_date, day(5));
    assert_eq!(res.days_tracked_before(), 2);
    assert_eq!(res.days_tracked_after(), 3);
}

#[test]
fn test_missing_boundary_still_classifies() {
    init_logging();

    let path: Vec<(f64, f64)> = (0..8).map(|i| (10.0 - i as f64 * 0.1, 20.0)).collect();
    let analysis =
        analyze_season(&group_by_date(track(&path)), None, &small_season_config()).unwrap();

    assert_eq!(analysis.trajectories.len(), 1);
    assert!(analysis.interactions().next().is_none());
    assert!(analysis.groups.is_empty());
    assert_eq!(analysis.groups_by_label().len(), 1);
}

#[test]
fn test_reruns_are_identical() {
    init_logging();

    // Several groups crossing paths.
    let mut dets = Vec::new();
    for g in 0..4 {
        let path: Vec<(f64, f64)> = (0..9)
            .map(|i| {
                (
                    10.0 - i as f64 * 0.08 * (g + 1) as f64,
                    20.0 + g as f64 * 0.15 + i as f64 * 0.02,
                )
            })
            .collect();
        dets.extend(track(&path));
    }
    let by_date = group_by_date(dets);
    let area = band(9.0, 9.6);
    let config = small_season_config();

    let first = analyze_season(&by_date, Some(&area), &config).unwrap();
    let second = analyze_season(&by_date, Some(&area), &config).unwrap();
    assert_eq!(first, second);

    let mut seen = std::collections::HashSet::new();
    for traj in &first.trajectories {
        for key in traj.classified.trajectory.keys() {
            assert!(seen.insert(key));
        }
    }
}

#[test]
fn test_batch_with_prefilter() {
    init_logging();

    let path: Vec<(f64, f64)> = (0..8).map(|i| (10.0 - i as f64 * 0.1, 20.0)).collect();
    let mut all = track(&path);
    // Far away, and in the wet season.
    all.extend(blob(day(1), 0.0, 0.0));
    all.extend(blob(NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(), 9.5, 20.0));

    // A couple of bad rows from ingestion.
    let mut records: Vec<_> = all.into_iter().map(Ok).collect();
    records.push(Detection::new(95.0, 20.0, day(2), 1.0));
    records.push(Detection::new(9.5, 20.0, day(2), f64::NAN));
    let all = keep_valid(records);
    assert_eq!(all.len(), 100);

    let bbox = BoundingBox::around(Coord::new(9.5, 20.0), 300.0);
    let dets = prefilter(all, &DrySeason::for_latitude(9.5), &bbox);
    assert_eq!(dets.len(), 80);

    let jobs = vec![
        SeasonJob::new("band", 2023, dets).with_boundary(band(9.55, 9.85)),
        SeasonJob::new("band", 2022, vec![]),
    ];

    let results = analyze_batch(jobs, &small_season_config(), 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.year, 2022);

    let analysis = results[1].1.as_ref().unwrap();
    assert_eq!(analysis.num_detections, 80);
    assert_eq!(analysis.groups.len(), 1);

    let mut kml = KmlBuffer::new().unwrap();
    firegroups::write_label_styles(&mut kml).unwrap();
    for (i, traj) in analysis.trajectories.iter().enumerate() {
        firegroups::write_trajectory(&mut kml, &format!("group {}", i), &traj.classified).unwrap();
    }
    let text = kml.finish().unwrap();
    assert_eq!(text.matches("<LineString>").count(), 1);
}
