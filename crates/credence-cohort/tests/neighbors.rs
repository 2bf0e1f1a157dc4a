//! Cohort selection over a random population.

use credence_cohort::{CohortScope, NeighborCount, NeighborFinder};
use credence_data::FeatureTable;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn population(n: usize, width: usize, seed: u64) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = Array2::from_shape_fn((n, width), |_| rng.gen_range(-1.0..1.0));
    let names = (0..width).map(|j| format!("f{j}")).collect();
    FeatureTable::new(names, values).unwrap()
}

#[test]
fn test_ten_nearest_of_five_hundred() {
    let table = population(500, 8, 1);
    let finder = NeighborFinder::new(&table);
    let rows = finder.nearest(50, NeighborCount::new(10).unwrap()).unwrap();

    assert_eq!(rows.len(), 10);
    assert!(rows.contains(&50));
    assert!(rows.windows(2).all(|w| w[0] < w[1]));

    // No outsider is strictly closer than the farthest member.
    let distances = finder.distances(50).unwrap();
    let radius = rows.iter().map(|&i| distances[i]).fold(0.0, f64::max);
    for i in (0..500).filter(|i| !rows.contains(i)) {
        assert!(distances[i] >= radius);
    }
}

#[test]
fn test_growing_k_only_adds_rows() {
    let table = population(300, 5, 2);
    let finder = NeighborFinder::new(&table);
    let mut previous: Vec<usize> = Vec::new();
    for k in [10, 11, 25, 100, 299, 300, 1000] {
        let rows = finder.nearest(123, NeighborCount::new(k).unwrap()).unwrap();
        assert_eq!(rows.len(), k.min(300));
        assert!(previous.iter().all(|i| rows.contains(i)));
        previous = rows;
    }
}

#[test]
fn test_toggle_switches_to_full_population() {
    let table = population(40, 3, 3);
    let finder = NeighborFinder::new(&table);
    let k = NeighborCount::new(10).unwrap();

    let neighbors = finder.cohort(5, CohortScope::from_toggle(false, k)).unwrap();
    assert_eq!(neighbors.len(), 10);
    assert!(neighbors.target_position().is_some());

    let everyone = finder.cohort(5, CohortScope::from_toggle(true, k)).unwrap();
    assert_eq!(everyone.len(), 40);
    assert!(neighbors.indices.iter().all(|i| everyone.contains(*i)));
}
