/*!
 * What happened to a fire group that entered a protected area.
 *
 * A group that is contacted by park staff usually stops burning. So a trajectory that ends
 * inside the area may mean a successful response, while a trajectory that keeps going after it
 * leaves means the group only passed through.
 */
use crate::{
    cluster::DailyCluster,
    geo::{local_distance_km, Boundary, Coord, Geo, KM_PER_DEGREE},
    trajectory::Trajectory,
};
use chrono::NaiveDate;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The outcome for a group that was seen inside a boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The last sighting was inside.
    StoppedInside,
    /// The group was seen outside again after its last sighting inside.
    Transited,
    /// The group left and then stopped burning.
    StoppedAfterExit,
}

impl Outcome {
    pub fn description(&self) -> &'static str {
        use Outcome::*;

        match self {
            StoppedInside => "fires stopped inside - possible staff contact or end of tracking",
            Transited => "group transited, continued burning after exit",
            StoppedAfterExit => "group exited but stopped burning",
        }
    }
}

/// A single day's position of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub date: NaiveDate,
    pub coord: Coord,
    /// Number of detections that day.
    pub fires: usize,
}

impl From<&DailyCluster> for TrackPoint {
    fn from(cluster: &DailyCluster) -> Self {
        TrackPoint {
            date: cluster.date(),
            coord: cluster.centroid(),
            fires: cluster.count(),
        }
    }
}

/// How a trajectory interacted with a boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionResult {
    /// Index into the trajectory of the first cluster inside.
    pub first_inside_index: usize,
    /// Index into the trajectory of the last cluster inside. Clusters between the first and last
    /// may be outside.
    pub last_inside_index: usize,
    pub entry_date: NaiveDate,
    pub entry: Coord,
    pub last_inside_date: NaiveDate,
    pub last_inside: Coord,
    /// The number of clusters inside.
    pub days_burning_inside: usize,
    /// The number of detections in the clusters inside.
    pub fires_inside: usize,
    /// Distance moved from the first to the last cluster inside.
    pub distance_inside_km: f64,
    /// `distance_inside_km / days_burning_inside`
    pub speed_inside_km_day: f64,
    pub outcome: Outcome,
    /// The number of clusters outside after the last cluster inside.
    pub days_resumed_outside: usize,

    pub trajectory_days: usize,
    pub total_fires: usize,
    pub net_south_km: f64,
    pub origin: TrackPoint,
    pub destination: TrackPoint,
    /// The track before the first cluster inside.
    pub before_entry: Vec<TrackPoint>,
    /// The track after the last cluster inside.
    pub after_last_inside: Vec<TrackPoint>,
}

impl InteractionResult {
    pub fn days_tracked_before(&self) -> usize {
        self.before_entry.len()
    }

    pub fn days_tracked_after(&self) -> usize {
        self.after_last_inside.len()
    }

    /// A human readable description of the outcome.
    pub fn outcome_detail(&self) -> String {
        match self.outcome {
            Outcome::Transited => format!(
                "group transited, continued burning {} days after exit",
                self.days_resumed_outside
            ),
            other => other.description().to_owned(),
        }
    }
}

/**
 * Analyze how a trajectory interacted with a boundary.
 *
 * #Returns
 * `None` if no cluster of the trajectory is inside the boundary.
 */
pub fn analyze_interaction<B>(traj: &Trajectory, boundary: &B) -> Option<InteractionResult>
where
    B: Boundary + ?Sized,
{
    let clusters = traj.clusters();

    let inside: Vec<bool> = clusters
        .iter()
        .map(|c| boundary.contains(c.centroid()))
        .collect();

    let first_inside_index = inside.iter().position(|&x| x)?;
    let last_inside_index = inside.iter().rposition(|&x| x)?;

    let after = &clusters[(last_inside_index + 1)..];
    let days_resumed_outside = after
        .iter()
        .filter(|c| !boundary.contains(c.centroid()))
        .count();

    let outcome = if after.is_empty() {
        Outcome::StoppedInside
    } else if days_resumed_outside > 0 {
        Outcome::Transited
    } else {
        Outcome::StoppedAfterExit
    };

    let (days_burning_inside, fires_inside) = clusters
        .iter()
        .zip(&inside)
        .filter(|(_, is_in)| **is_in)
        .fold((0, 0), |(days, fires), (c, _)| (days + 1, fires + c.count()));

    let distance_inside_km: f64 = clusters[first_inside_index..=last_inside_index]
        .windows(2)
        .map(|w| local_distance_km(w[0].centroid(), w[1].centroid()))
        .sum();
    let speed_inside_km_day = if days_burning_inside > 0 {
        distance_inside_km / days_burning_inside as f64
    } else {
        0.0
    };

    let entry = &clusters[first_inside_index];
    let last_in = &clusters[last_inside_index];

    Some(InteractionResult {
        first_inside_index,
        last_inside_index,
        entry_date: entry.date(),
        entry: entry.centroid(),
        last_inside_date: last_in.date(),
        last_inside: last_in.centroid(),
        days_burning_inside,
        fires_inside,
        distance_inside_km,
        speed_inside_km_day,
        outcome,
        days_resumed_outside,
        trajectory_days: traj.len(),
        total_fires: traj.total_fires(),
        net_south_km: (traj.first().lat() - traj.last().lat()) * KM_PER_DEGREE,
        origin: traj.first().into(),
        destination: traj.last().into(),
        before_entry: clusters[..first_inside_index]
            .iter()
            .map(TrackPoint::from)
            .collect(),
        after_last_inside: after.iter().map(TrackPoint::from).collect(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geo::ProtectedArea;
    use std::cell::Cell;

    /// A group drifting 0.1 degrees (11.1 km) south each day along 20E.
    fn southward(days: usize) -> Trajectory {
        let clusters = (0..days)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2023, 1, 1 + i as u32).unwrap();
                let lat = 1.0 - i as f64 * 0.1;
                DailyCluster::new(date, 0, Coord::new(lat, 20.0), 10 + i, 20.0, 2.0)
            })
            .collect();
        Trajectory::new(clusters).unwrap()
    }

    fn lat_band(min_lat: f64, max_lat: f64) -> ProtectedArea {
        ProtectedArea::from_ring(
            "park",
            vec![
                Coord::new(min_lat, 19.5),
                Coord::new(min_lat, 20.5),
                Coord::new(max_lat, 20.5),
                Coord::new(max_lat, 19.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_never_inside() {
        let traj = southward(6);
        assert!(analyze_interaction(&traj, &lat_band(5.0, 6.0)).is_none());
        assert!(analyze_interaction(&traj, &|_: Coord| false).is_none());
    }

    #[test]
    fn test_stopped_inside() {
        // The last three clusters, 0.7, 0.6 and 0.5 N, are inside.
        let traj = southward(6);
        let res = analyze_interaction(&traj, &lat_band(0.45, 0.75)).unwrap();

        assert_eq!(res.outcome, Outcome::StoppedInside);
        assert_eq!(res.first_inside_index, 3);
        assert_eq!(res.last_inside_index, 5);
        assert_eq!(res.days_burning_inside, 3);
        assert_eq!(res.fires_inside, 13 + 14 + 15);
        assert_eq!(res.days_tracked_before(), 3);
        assert_eq!(res.days_tracked_after(), 0);
        assert_eq!(res.days_resumed_outside, 0);
        assert_eq!(res.entry_date, NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
        assert_eq!(res.last_inside_date, NaiveDate::from_ymd_opt(2023, 1, 6).unwrap());
        assert_eq!(res.destination.coord, res.last_inside);
    }

    #[test]
    fn test_transited() {
        // In on day 3, last seen inside on day 5, and seen outside through day 8.
        let traj = southward(8);
        let res = analyze_interaction(&traj, &lat_band(0.55, 0.85)).unwrap();

        assert_eq!(res.outcome, Outcome::Transited);
        assert_eq!(res.first_inside_index, 2);
        assert_eq!(res.last_inside_index, 4);
        assert_eq!(res.days_burning_inside, 3);
        assert_eq!(res.days_resumed_outside, 3);
        assert_eq!(res.days_tracked_before(), 2);
        assert_eq!(res.days_tracked_after(), 3);
        assert_eq!(res.trajectory_days, 8);
        assert_eq!(res.total_fires, (10..18).sum::<usize>());
        assert_eq!(res.origin.coord, Coord::new(1.0, 20.0));
        assert_eq!(res.after_last_inside[0].fires, 15);
        assert!(res.outcome_detail().contains("3 days"));

        assert!((res.distance_inside_km - 22.2).abs() < 1.0e-6);
        assert!((res.speed_inside_km_day - 7.4).abs() < 1.0e-6);
        assert!((res.net_south_km - 77.7).abs() < 1.0e-6);
    }

    #[test]
    fn test_exit_and_reenter() {
        // Inside on days 2 and 5 only. The distance inside covers everything in between.
        let traj = southward(7);
        let boundary = |c: Coord| (c.lat - 0.9).abs() < 0.01 || (c.lat - 0.6).abs() < 0.01;
        let res = analyze_interaction(&traj, &boundary).unwrap();

        assert_eq!(res.first_inside_index, 1);
        assert_eq!(res.last_inside_index, 4);
        assert_eq!(res.days_burning_inside, 2);
        assert_eq!(res.fires_inside, 11 + 14);
        assert_eq!(res.outcome, Outcome::Transited);
        assert!((res.distance_inside_km - 33.3).abs() < 1.0e-6);
        assert!((res.speed_inside_km_day - 16.65).abs() < 1.0e-6);
    }

    #[test]
    fn test_stopped_after_exit() {
        // A boundary that grows to cover everything after the first pass over the track.
        let traj = southward(6);
        let calls = Cell::new(0);
        let boundary = |c: Coord| {
            let n = calls.get();
            calls.set(n + 1);
            n >= 6 || (c.lat > 0.75 && c.lat < 0.95)
        };

        let res = analyze_interaction(&traj, &boundary).unwrap();
        assert_eq!(res.last_inside_index, 2);
        assert_eq!(res.outcome, Outcome::StoppedAfterExit);
        assert_eq!(res.days_tracked_after(), 3);
        assert_eq!(res.outcome_detail(), Outcome::StoppedAfterExit.description());
    }

    #[test]
    fn test_dyn_boundary() {
        let area = lat_band(0.45, 0.75);
        let boundary: &dyn Boundary = &area;
        let res = analyze_interaction(&southward(6), boundary).unwrap();
        assert_eq!(res.outcome, Outcome::StoppedInside);
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(Outcome::StoppedInside.to_string(), "STOPPED_INSIDE");
        assert_eq!(Outcome::Transited.to_string(), "TRANSITED");
        let name: &'static str = Outcome::StoppedAfterExit.into();
        assert_eq!(name, "STOPPED_AFTER_EXIT");
        assert_eq!("TRANSITED".parse::<Outcome>().unwrap(), Outcome::Transited);
    }
}
