use evalboard_core::{LeaderboardTotals, ModelId, ModelStats};
use evalboard_metrics::aggregators::{LeaderboardAggregator, RunStatsAggregator};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn totals(name: &str, judgments: i64, score: f64) -> LeaderboardTotals {
    LeaderboardTotals {
        model_id: ModelId::new(),
        model_name: name.to_string(),
        total_judgments: judgments,
        total_score: score,
    }
}

// ===== Averages =====

#[test]
fn test_average_without_judgments_is_exactly_zero() {
    let avg = LeaderboardAggregator::average(&totals("idle", 0, 0.0));
    assert_eq!(avg, 0.0);
}

#[rstest]
#[case(1, 0.5, 0.5)]
#[case(2, 1.5, 0.75)]
#[case(4, 1.0, 0.25)]
fn test_average_is_sum_over_count(#[case] count: i64, #[case] sum: f64, #[case] expected: f64) {
    let avg = LeaderboardAggregator::average(&totals("m", count, sum));
    assert!((avg - expected).abs() < 1e-9);
}

// ===== Ranking =====

#[test]
fn test_unranked_board_keeps_store_order() {
    let board = LeaderboardAggregator::build(
        vec![totals("low", 1, 0.1), totals("high", 1, 0.9)],
        false,
    );
    let names: Vec<&str> = board.iter().map(|e| e.model_name.as_str()).collect();
    assert_eq!(names, vec!["low", "high"]);
    assert!(board.iter().all(|e| e.rank.is_none()));
}

#[test]
fn test_ranking_is_stable_and_descending() {
    let board = LeaderboardAggregator::build(
        vec![
            totals("tie-a", 2, 1.0),
            totals("best", 1, 0.9),
            totals("none", 0, 0.0),
            totals("tie-b", 4, 2.0),
        ],
        true,
    );

    let order: Vec<(&str, Option<usize>)> = board
        .iter()
        .map(|e| (e.model_name.as_str(), e.rank))
        .collect();
    assert_eq!(
        order,
        vec![
            ("best", Some(1)),
            ("tie-a", Some(2)),
            ("tie-b", Some(3)),
            ("none", Some(4)),
        ]
    );
}

#[test]
fn test_entry_serializes_camel_case() {
    let board = LeaderboardAggregator::build(vec![totals("m", 0, 0.0)], false);
    let json = serde_json::to_value(&board[0]).unwrap();
    assert_eq!(json["averageScore"], 0.0);
    assert_eq!(json["totalJudgments"], 0);
    assert!(json.get("rank").is_none());
}

// ===== Run statistics =====

#[test]
fn test_success_rate() {
    let stats = ModelStats {
        total_runs: 4,
        successful_runs: 3,
        failed_runs: 1,
    };
    assert!((RunStatsAggregator::success_rate(&stats) - 0.75).abs() < 1e-9);
    assert_eq!(RunStatsAggregator::success_rate(&ModelStats::default()), 0.0);
}
