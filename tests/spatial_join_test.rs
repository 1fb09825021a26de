// Copyright 2025 Tellus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests for the spatial distance join.
//!
//! Five landmark points are joined against themselves at increasing
//! maximum distances; the expected pair sets are known by construction.
//! Every scenario runs under both algorithms, which must agree.

use std::collections::BTreeSet;
use std::sync::Arc;

use tellus::{
    Definedness, Error, ExecutionContext, MemoryTracker, Operator, ResultCache, Row,
    SpatialJoin, SpatialJoinAlgorithm, Table, Value, Variable, VariableColumn,
    VariableMap, ValuesOperator, DISTANCE_VARIABLE,
};

const LANDMARKS: [(&str, &str); 5] = [
    ("Uni Freiburg TF", "POINT(7.83505 48.01267)"),
    ("Minster Freiburg", "POINT(7.85298 47.99557)"),
    ("London Eye", "POINT(-0.11957 51.50333)"),
    ("Statue of liberty", "POINT(-74.04454 40.68925)"),
    ("eiffel tower", "POINT(2.29451 48.85825)"),
];

fn side_operator(
    name_var: &str,
    point_var: &str,
    rows: &[(&str, &str)],
) -> Arc<dyn Operator> {
    let mut table = Table::new(2, Arc::new(MemoryTracker::new(1 << 22)));
    for (name, point) in rows {
        table
            .push_row(Row::from_values(vec![
                Value::text(*name),
                Value::text(format!("\"{point}\"")),
            ]))
            .unwrap();
    }
    let mut vars = VariableMap::new();
    vars.insert(Variable::new(name_var), VariableColumn::always_defined(0))
        .unwrap();
    vars.insert(Variable::new(point_var), VariableColumn::always_defined(1))
        .unwrap();
    Arc::new(ValuesOperator::new(table, vars))
}

fn landmark_join(ctx: Arc<ExecutionContext>, max_dist_m: i64) -> SpatialJoin {
    let node = SpatialJoin::try_new(
        ctx,
        Variable::new("?point1"),
        &format!("<max-distance-in-meters:{max_dist_m}>"),
        Variable::new("?point2"),
    )
    .unwrap();
    node.add_child(
        side_operator("?name1", "?point1", &LANDMARKS),
        &Variable::new("?point1"),
    )
    .unwrap()
    .add_child(
        side_operator("?name2", "?point2", &LANDMARKS),
        &Variable::new("?point2"),
    )
    .unwrap()
}

/// The (left name, right name, distance) triples of a result, sorted.
fn name_pairs(table: &Table) -> Vec<(String, String, i64)> {
    let mut pairs: Vec<_> = table
        .iter()
        .map(|row| {
            (
                row[0].as_text().unwrap().to_string(),
                row[2].as_text().unwrap().to_string(),
                row[4].as_integer().unwrap(),
            )
        })
        .collect();
    pairs.sort();
    pairs
}

fn pair_set(table: &Table) -> BTreeSet<(String, String)> {
    name_pairs(table)
        .into_iter()
        .map(|(a, b, _)| (a, b))
        .collect()
}

fn self_pairs() -> BTreeSet<(String, String)> {
    LANDMARKS
        .iter()
        .map(|(name, _)| (name.to_string(), name.to_string()))
        .collect()
}

fn with_both_directions(
    mut set: BTreeSet<(String, String)>,
    extra: &[(&str, &str)],
) -> BTreeSet<(String, String)> {
    for (a, b) in extra {
        set.insert((a.to_string(), b.to_string()));
        set.insert((b.to_string(), a.to_string()));
    }
    set
}

fn compute(max_dist_m: i64, algorithm: SpatialJoinAlgorithm) -> Table {
    let ctx = Arc::new(ExecutionContext::new());
    landmark_join(ctx, max_dist_m)
        .with_algorithm(algorithm)
        .compute_result()
        .unwrap()
}

const BOTH_ALGORITHMS: [SpatialJoinAlgorithm; 2] = [
    SpatialJoinAlgorithm::NestedLoop,
    SpatialJoinAlgorithm::BoundingBox,
];

// ============================================================================
// Landmark scenarios
// ============================================================================

#[test]
fn test_max_dist_1_only_self_pairs() {
    for algorithm in BOTH_ALGORITHMS {
        let result = compute(1, algorithm);
        assert_eq!(result.num_rows(), 5, "{algorithm:?}");
        assert_eq!(pair_set(&result), self_pairs());
        for (_, _, dist) in name_pairs(&result) {
            assert_eq!(dist, 0);
        }
    }
}

#[test]
fn test_max_dist_5000_adds_freiburg_pair() {
    let expected = with_both_directions(
        self_pairs(),
        &[("Uni Freiburg TF", "Minster Freiburg")],
    );
    for algorithm in BOTH_ALGORITHMS {
        let result = compute(5_000, algorithm);
        assert_eq!(result.num_rows(), 7, "{algorithm:?}");
        assert_eq!(pair_set(&result), expected);

        // The Freiburg pair is ~2.3 km apart.
        for (left, _, dist) in name_pairs(&result) {
            if dist > 0 {
                assert!((2_200..2_400).contains(&dist), "{left}: {dist}");
            }
        }
    }
}

#[test]
fn test_max_dist_500_000() {
    let expected = with_both_directions(
        self_pairs(),
        &[
            ("Uni Freiburg TF", "Minster Freiburg"),
            ("Uni Freiburg TF", "eiffel tower"),
            ("Minster Freiburg", "eiffel tower"),
            ("London Eye", "eiffel tower"),
        ],
    );
    for algorithm in BOTH_ALGORITHMS {
        let result = compute(500_000, algorithm);
        assert_eq!(result.num_rows(), 13, "{algorithm:?}");
        assert_eq!(pair_set(&result), expected);
    }
}

#[test]
fn test_max_dist_1_000_000_adds_freiburg_london() {
    let expected = with_both_directions(
        self_pairs(),
        &[
            ("Uni Freiburg TF", "Minster Freiburg"),
            ("Uni Freiburg TF", "eiffel tower"),
            ("Minster Freiburg", "eiffel tower"),
            ("London Eye", "eiffel tower"),
            ("Uni Freiburg TF", "London Eye"),
            ("Minster Freiburg", "London Eye"),
        ],
    );
    for algorithm in BOTH_ALGORITHMS {
        let result = compute(1_000_000, algorithm);
        assert_eq!(result.num_rows(), 17, "{algorithm:?}");
        assert_eq!(pair_set(&result), expected);
    }
}

#[test]
fn test_max_dist_10_000_000_is_full_cross_product() {
    for algorithm in BOTH_ALGORITHMS {
        let result = compute(10_000_000, algorithm);
        assert_eq!(result.num_rows(), 25, "{algorithm:?}");

        // The Statue of Liberty is the farthest outlier; even its pairs
        // stay below 10,000 km.
        for (_, _, dist) in name_pairs(&result) {
            assert!(dist <= 10_000_000);
        }
    }
}

#[test]
fn test_algorithms_agree_on_every_scenario() {
    for max_dist in [0, 1, 5_000, 500_000, 1_000_000, 10_000_000] {
        let baseline = compute(max_dist, SpatialJoinAlgorithm::NestedLoop);
        let rtree = compute(max_dist, SpatialJoinAlgorithm::BoundingBox);
        assert_eq!(
            name_pairs(&baseline),
            name_pairs(&rtree),
            "algorithms disagree at max_dist {max_dist}"
        );
    }
}

#[test]
fn test_antimeridian_stress() {
    let rows_east = [("east", "POINT(179.0 0.0)")];
    let rows_west = [("west", "POINT(-179.0 0.0)")];
    let both = [rows_east[0], rows_west[0]];

    for algorithm in BOTH_ALGORITHMS {
        let ctx = Arc::new(ExecutionContext::new());
        let node = SpatialJoin::try_new(
            ctx,
            Variable::new("?point1"),
            "<max-distance-in-meters:300000>",
            Variable::new("?point2"),
        )
        .unwrap()
        .with_algorithm(algorithm);
        let result = node
            .add_child(
                side_operator("?name1", "?point1", &both),
                &Variable::new("?point1"),
            )
            .unwrap()
            .add_child(
                side_operator("?name2", "?point2", &both),
                &Variable::new("?point2"),
            )
            .unwrap()
            .compute_result()
            .unwrap();

        assert_eq!(result.num_rows(), 4, "{algorithm:?}");
        let pairs = name_pairs(&result);
        let cross: Vec<_> = pairs.iter().filter(|(a, b, _)| a != b).collect();
        assert_eq!(cross.len(), 2, "{algorithm:?}");
        for (_, _, dist) in cross {
            assert!((220_000..225_000).contains(dist), "{algorithm:?}: {dist}");
        }
    }
}

// ============================================================================
// Output schema
// ============================================================================

#[test]
fn test_output_width_matches_contract() {
    for algorithm in BOTH_ALGORITHMS {
        let ctx = Arc::new(ExecutionContext::new());
        let node = landmark_join(ctx, 5_000).with_algorithm(algorithm);
        let result = node.compute_result().unwrap();
        assert_eq!(result.num_columns(), node.result_width());
        assert_eq!(result.num_columns(), 5);
    }
}

#[test]
fn test_output_width_without_distance_column() {
    for algorithm in BOTH_ALGORITHMS {
        let ctx = Arc::new(ExecutionContext::new());
        let node = landmark_join(ctx, 5_000)
            .with_include_distance(false)
            .with_algorithm(algorithm);
        let result = node.compute_result().unwrap();
        assert_eq!(node.result_width(), 4);
        assert_eq!(result.num_columns(), 4);
        assert_eq!(result.num_rows(), 7);
    }
}

#[test]
fn test_variable_map_matches_output_layout() {
    let ctx = Arc::new(ExecutionContext::new());
    let node = landmark_join(ctx, 5_000);
    let map = node.variable_columns();

    assert_eq!(map.len(), 5);
    assert_eq!(map.get(&Variable::new("?name1")).unwrap().column, 0);
    assert_eq!(map.get(&Variable::new("?point1")).unwrap().column, 1);
    assert_eq!(map.get(&Variable::new("?name2")).unwrap().column, 2);
    assert_eq!(map.get(&Variable::new("?point2")).unwrap().column, 3);

    let dist = map.get(&Variable::new(DISTANCE_VARIABLE)).unwrap();
    assert_eq!(dist.column, 4);
    assert_eq!(dist.definedness, Definedness::AlwaysDefined);

    // Every mapped column is distinct and within the result width.
    let columns: BTreeSet<usize> =
        map.sorted_by_column().iter().map(|(_, c)| c.column).collect();
    assert_eq!(columns.len(), map.len());
    assert!(columns.iter().all(|&c| c < node.result_width()));
}

// ============================================================================
// Result cache
// ============================================================================

#[test]
fn test_result_cache_shares_equal_joins() {
    let cache = ResultCache::new();
    let ctx = Arc::new(ExecutionContext::new());

    let first = landmark_join(Arc::clone(&ctx), 5_000);
    let second = landmark_join(ctx, 5_000);
    assert_eq!(first.cache_key(), second.cache_key());

    let a = cache.get_or_compute(&first).unwrap();
    let b = cache.get_or_compute(&second).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    // A different maximum distance is a different key.
    let ctx = Arc::new(ExecutionContext::new());
    let other = landmark_join(ctx, 500_000);
    assert_ne!(other.cache_key(), first.cache_key());
    cache.get_or_compute(&other).unwrap();
    assert_eq!(cache.len(), 2);
}

// ============================================================================
// Failure propagation
// ============================================================================

#[test]
fn test_cancellation_aborts_both_algorithms() {
    for algorithm in BOTH_ALGORITHMS {
        let ctx = Arc::new(ExecutionContext::new());
        ctx.cancellation().cancel();
        let node = landmark_join(ctx, 5_000).with_algorithm(algorithm);
        assert_eq!(node.compute_result().unwrap_err(), Error::QueryCancelled);
    }
}

#[test]
fn test_memory_limit_aborts_join() {
    for algorithm in BOTH_ALGORITHMS {
        // Too small for even one output row.
        let ctx = Arc::new(ExecutionContext::with_memory_limit(16));
        let node = landmark_join(ctx, 5_000).with_algorithm(algorithm);
        let err = node.compute_result().unwrap_err();
        assert!(matches!(err, Error::MemoryExhausted { .. }), "{algorithm:?}");
    }
}

#[test]
fn test_malformed_point_is_fatal() {
    let rows = [("broken", "POINT(7.8 not-a-number)")];
    for algorithm in BOTH_ALGORITHMS {
        let ctx = Arc::new(ExecutionContext::new());
        let node = SpatialJoin::try_new(
            ctx,
            Variable::new("?point1"),
            "<max-distance-in-meters:1000>",
            Variable::new("?point2"),
        )
        .unwrap()
        .with_algorithm(algorithm);
        let err = node
            .add_child(
                side_operator("?name1", "?point1", &LANDMARKS[..1]),
                &Variable::new("?point1"),
            )
            .unwrap()
            .add_child(
                side_operator("?name2", "?point2", &rows),
                &Variable::new("?point2"),
            )
            .unwrap()
            .compute_result()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWktPoint(_)), "{algorithm:?}");
    }
}

#[test]
fn test_non_text_point_column_is_fatal() {
    let mut table = Table::new(1, Arc::new(MemoryTracker::new(1 << 20)));
    table
        .push_row(Row::from_values(vec![Value::integer(42)]))
        .unwrap();
    let mut vars = VariableMap::new();
    vars.insert(Variable::new("?point2"), VariableColumn::always_defined(0))
        .unwrap();
    let right: Arc<dyn Operator> = Arc::new(ValuesOperator::new(table, vars));

    let ctx = Arc::new(ExecutionContext::new());
    let err = SpatialJoin::try_new(
        ctx,
        Variable::new("?point1"),
        "<max-distance-in-meters:1000>",
        Variable::new("?point2"),
    )
    .unwrap()
    .add_child(
        side_operator("?name1", "?point1", &LANDMARKS[..1]),
        &Variable::new("?point1"),
    )
    .unwrap()
    .add_child(right, &Variable::new("?point2"))
    .unwrap()
    .compute_result()
    .unwrap_err();
    assert!(matches!(err, Error::PointColumnNotText(_)));
}
