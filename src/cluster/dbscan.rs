/*!
 * Density based clustering of points in latitude-longitude space.
 *
 * Distances are plain Euclidean distances in degrees, the caller converts its radius from
 * kilometers. Labels are assigned in the same order as the classic DBSCAN formulation: points are
 * visited by index, every unlabeled core point starts a new cluster, and the cluster is grown by
 * a depth first walk through core points. A border point that can be reached from two clusters
 * belongs to the one that was started first.
 */
use crate::geo::Coord;
use rustc_hash::FxHashMap as HashMap;

/**
 * Assign cluster labels to points.
 *
 * #Arguments
 * points - the points to cluster.
 * eps - the neighborhood radius in degrees, inclusive.
 * min_samples - the number of points (including the point itself) that must be in the
 * neighborhood of a point for it to be a core point.
 *
 * #Returns
 * A label for each point. Labels count up from 0 in the order the clusters were found, `None`
 * is noise.
 */
pub(crate) fn dbscan(points: &[Coord], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    debug_assert!(eps > 0.0);

    let grid = NeighborGrid::new(points, eps);
    let neighborhoods: Vec<Vec<usize>> = (0..points.len()).map(|i| grid.neighbors(i)).collect();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|nbrs| nbrs.len() >= min_samples)
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut next_label = 0;
    let mut stack: Vec<usize> = Vec::with_capacity(points.len());

    for start in 0..points.len() {
        if labels[start].is_some() || !is_core[start] {
            continue;
        }

        stack.push(start);
        while let Some(i) = stack.pop() {
            if labels[i].is_some() {
                continue;
            }

            labels[i] = Some(next_label);

            if is_core[i] {
                stack.extend(
                    neighborhoods[i]
                        .iter()
                        .copied()
                        .filter(|&v| labels[v].is_none()),
                );
            }
        }

        next_label += 1;
    }

    labels
}

/// Buckets points into square cells with an edge of `eps` so a neighborhood query only has to
/// look at the 3x3 block of cells around a point.
struct NeighborGrid<'a> {
    points: &'a [Coord],
    eps: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl<'a> NeighborGrid<'a> {
    fn new(points: &'a [Coord], eps: f64) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::default();
        for (i, &pnt) in points.iter().enumerate() {
            cells.entry(cell_of(pnt, eps)).or_default().push(i);
        }

        NeighborGrid { points, eps, cells }
    }

    /// All points within `eps` of point `i`, including `i`, in ascending index order.
    fn neighbors(&self, i: usize) -> Vec<usize> {
        let center = self.points[i];
        let (row, col) = cell_of(center, self.eps);

        // Cell indexes saturate for a tiny eps, so neighboring cells can collapse into one.
        let mut block: Vec<(i64, i64)> = Vec::with_capacity(9);
        for drow in -1..=1 {
            for dcol in -1..=1 {
                let cell = (row.saturating_add(drow), col.saturating_add(dcol));
                if !block.contains(&cell) {
                    block.push(cell);
                }
            }
        }

        let mut found = Vec::new();
        for cell in &block {
            if let Some(members) = self.cells.get(cell) {
                found.extend(members.iter().copied().filter(|&j| {
                    let other = self.points[j];
                    let dlat = other.lat - center.lat;
                    let dlon = other.lon - center.lon;
                    f64::sqrt(dlat * dlat + dlon * dlon) <= self.eps
                }));
            }
        }

        found.sort_unstable();
        found
    }
}

fn cell_of(pnt: Coord, eps: f64) -> (i64, i64) {
    (
        (pnt.lat / eps).floor() as i64,
        (pnt.lon / eps).floor() as i64,
    )
}
