//! Repository tests against a live database. Run with
//! `--features integration-tests` and `DATABASE_URL` pointing at a scratch
//! Postgres instance.
#![cfg(feature = "integration-tests")]

mod common;

use common::*;
use evalboard_core::{Difficulty, EvalFilter, JudgmentFilter, ResultFilter, TagMatch, TimeRange};
use evalboard_storage::{create_pool, migrate, Stores};
use serial_test::serial;

async fn setup() -> Stores {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url).await.expect("failed to connect");
    migrate(&pool).await.expect("failed to migrate");
    sqlx::query("TRUNCATE judgments, results, evals, models")
        .execute(&pool)
        .await
        .expect("failed to truncate");
    Stores::postgres(pool)
}

#[tokio::test]
#[serial]
async fn test_postgres_eval_filters() {
    let stores = setup().await;
    let model = create_test_model("pg");
    stores.models.create_model(&model).await.unwrap();

    let tagged = create_test_eval(model.id, &["rustlang", "memory"], Difficulty::Easy, &["borrowing"], 3);
    let other = create_test_eval(model.id, &["rust"], Difficulty::Hard, &["lifetimes"], 12);
    stores.evals.create_eval(&tagged).await.unwrap();
    stores.evals.create_eval(&other).await.unwrap();

    let substring = stores
        .evals
        .list_evals(&EvalFilter {
            tags: Some(vec!["rust".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(substring.len(), 2);

    let exact = stores
        .evals
        .list_evals(&EvalFilter {
            tags: Some(vec!["rust".to_string()]),
            tag_match: TagMatch::Exact,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, other.id);

    let skills = stores
        .evals
        .list_evals(&EvalFilter {
            skills_tested: Some(vec!["borrowing".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].metadata, tagged.metadata);
}

#[tokio::test]
#[serial]
async fn test_postgres_cascade_and_leaderboard() {
    let stores = setup().await;
    let creator = create_test_model("creator");
    let judge = create_test_model("judge");
    stores.models.create_model(&creator).await.unwrap();
    stores.models.create_model(&judge).await.unwrap();

    let eval = create_test_eval(creator.id, &[], Difficulty::Medium, &[], 4);
    stores.evals.create_eval(&eval).await.unwrap();
    stores.results.create_result(&create_test_result(eval.id, creator.id)).await.unwrap();
    stores.judgments.create_judgment(&create_test_judgment(eval.id, judge.id, 0.75)).await.unwrap();

    let totals = stores.judgments.leaderboard_totals().await.unwrap();
    let row = totals.iter().find(|t| t.model_id == creator.id).unwrap();
    assert_eq!(row.total_judgments, 1);
    assert!((row.total_score - 0.75).abs() < 1e-9);

    stores.models.delete_model(&creator.id).await.unwrap();
    assert!(stores.evals.get_eval(&eval.id).await.unwrap().is_none());
    assert!(stores.results.list_results(&ResultFilter::default()).await.unwrap().is_empty());
    assert!(stores.judgments.list_judgments(&JudgmentFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_postgres_time_range_beyond_i32() {
    let stores = setup().await;
    let model = create_test_model("pg");
    stores.models.create_model(&model).await.unwrap();
    stores
        .evals
        .create_eval(&create_test_eval(model.id, &[], Difficulty::Easy, &[], 3))
        .await
        .unwrap();

    let under = stores
        .evals
        .list_evals(&EvalFilter {
            estimated_time_range: Some(TimeRange {
                min: None,
                max: Some(3_000_000_000),
            }),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(under.len(), 1);

    let over = stores
        .evals
        .list_evals(&EvalFilter {
            estimated_time_range: Some(TimeRange {
                min: Some(3_000_000_000),
                max: None,
            }),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(over.is_empty());
}

#[tokio::test]
#[serial]
async fn test_postgres_leaderboard_counts_judgment_once_per_result() {
    let stores = setup().await;
    let runner = create_test_model("runner");
    let judge = create_test_model("judge");
    stores.models.create_model(&runner).await.unwrap();
    stores.models.create_model(&judge).await.unwrap();

    let eval = create_test_eval(runner.id, &[], Difficulty::Easy, &[], 1);
    stores.evals.create_eval(&eval).await.unwrap();
    for _ in 0..2 {
        stores.results.create_result(&create_test_result(eval.id, runner.id)).await.unwrap();
    }
    stores.judgments.create_judgment(&create_test_judgment(eval.id, judge.id, 0.8)).await.unwrap();
    stores.judgments.create_judgment(&create_test_judgment(eval.id, judge.id, 0.4)).await.unwrap();

    let totals = stores.judgments.leaderboard_totals().await.unwrap();
    let row = totals.iter().find(|t| t.model_id == runner.id).unwrap();
    assert_eq!(row.total_judgments, 4);
    assert!((row.total_score - 2.4).abs() < 1e-9);
}
