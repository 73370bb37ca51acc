use super::geo::{chord_to_km, unit_vector};

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the order it was given to [`KdTree::build`].
    pub index: usize,
    /// Great-circle distance in km.
    pub distance_km: f64,
}

/// Spatial index over geographic points answering one query: the nearest
/// indexed point and its distance.
pub trait NearestNeighbor {
    fn nearest(&self, lat: f64, lon: f64) -> Option<Neighbor>;
}

#[derive(Debug, Clone, Copy)]
struct Node {
    point: [f64; 3],
    /// Original position of the point.
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced 3-d tree over unit-sphere embeddings of lat/lon points.
///
/// Built once by recursive median splits (O(n log n)); never mutated.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KdTree {
    /// Build from `(lat, lon)` pairs. Non-finite points are skipped but keep
    /// their slot in the index numbering.
    pub fn build(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut items: Vec<([f64; 3], usize)> = points
            .into_iter()
            .enumerate()
            .filter(|(_, (lat, lon))| lat.is_finite() && lon.is_finite())
            .map(|(i, (lat, lon))| (unit_vector(lat, lon), i))
            .collect();

        let mut tree = KdTree {
            nodes: Vec::with_capacity(items.len()),
            root: None,
        };
        tree.root = tree.build_node(&mut items, 0);
        tree
    }

    fn build_node(&mut self, items: &mut [([f64; 3], usize)], depth: usize) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 3;
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| a.0[axis].total_cmp(&b.0[axis]));

        let (point, index) = items[mid];
        let slot = self.nodes.len();
        self.nodes.push(Node {
            point,
            index,
            axis,
            left: None,
            right: None,
        });

        let (lower, rest) = items.split_at_mut(mid);
        let left = self.build_node(lower, depth + 1);
        let right = self.build_node(&mut rest[1..], depth + 1);
        self.nodes[slot].left = left;
        self.nodes[slot].right = right;
        Some(slot)
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn search(&self, slot: usize, target: &[f64; 3], best: &mut Option<(usize, f64)>) {
        let node = &self.nodes[slot];
        let d2 = squared_distance(&node.point, target);
        // Strict `<` keeps the first-found point on exact ties.
        if best.map_or(true, |(_, b)| d2 < b) {
            *best = Some((node.index, d2));
        }

        let diff = target[node.axis] - node.point[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search(near, target, best);
        }
        if let Some(far) = far {
            if best.map_or(true, |(_, b)| diff * diff < b) {
                self.search(far, target, best);
            }
        }
    }
}

impl NearestNeighbor for KdTree {
    fn nearest(&self, lat: f64, lon: f64) -> Option<Neighbor> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let target = unit_vector(lat, lon);
        let mut best = None;
        self.search(self.root?, &target, &mut best);
        best.map(|(index, d2)| Neighbor {
            index,
            distance_km: chord_to_km(d2.sqrt()),
        })
    }
}

#[inline(always)]
fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geo::haversine_km;

    const CITIES: [(f64, f64); 6] = [
        (-6.2088, 106.8456), // Jakarta
        (-6.9175, 107.6191), // Bandung
        (-7.7956, 110.3695), // Yogyakarta
        (-8.6500, 115.2167), // Denpasar
        (3.5952, 98.6722),   // Medan
        (-5.1477, 119.4327), // Makassar
    ];

    fn brute_force(lat: f64, lon: f64) -> usize {
        CITIES
            .iter()
            .enumerate()
            .min_by(|a, b| {
                haversine_km(lat, lon, a.1 .0, a.1 .1)
                    .total_cmp(&haversine_km(lat, lon, b.1 .0, b.1 .1))
            })
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn nearest_agrees_with_brute_force() {
        let tree = KdTree::build(CITIES);
        assert_eq!(tree.len(), CITIES.len());

        let probes = [
            (-6.3, 106.9),
            (-7.0, 108.0),
            (-8.0, 112.0),
            (0.0, 100.0),
            (-4.0, 125.0),
            (10.0, -70.0),
            (-89.0, 179.0),
        ];
        for (lat, lon) in probes {
            let hit = tree.nearest(lat, lon).unwrap();
            assert_eq!(hit.index, brute_force(lat, lon), "probe ({lat}, {lon})");
            let expected = haversine_km(lat, lon, CITIES[hit.index].0, CITIES[hit.index].1);
            assert!((hit.distance_km - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn exact_hit_has_zero_distance() {
        let tree = KdTree::build(CITIES);
        let hit = tree.nearest(-8.65, 115.2167).unwrap();
        assert_eq!(hit.index, 3);
        assert!(hit.distance_km < 1e-6);
    }

    #[test]
    fn non_finite_points_are_skipped_but_keep_numbering() {
        let tree = KdTree::build([(f64::NAN, 0.0), (-6.2088, 106.8456)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nearest(-6.0, 106.0).unwrap().index, 1);
    }

    #[test]
    fn empty_tree_and_nan_query() {
        assert!(KdTree::build(std::iter::empty()).nearest(0.0, 0.0).is_none());
        let tree = KdTree::build(CITIES);
        assert!(tree.nearest(f64::NAN, 106.0).is_none());
        assert!(tree.nearest(-6.0, f64::INFINITY).is_none());
    }
}
