#![allow(dead_code)]

use evalboard_core::{
    Difficulty, Eval, GeneratedMetadata, GenerationParams, Judgment, Model, ModelId, RunResult,
    EvalId,
};

pub fn create_test_model(name: &str) -> Model {
    Model::new(
        name.to_string(),
        format!("{}-provider-id", name),
        "https://api.example.com/v1".to_string(),
        "sk-test-0123456789".to_string(),
    )
}

pub fn create_test_params() -> GenerationParams {
    GenerationParams {
        prompt: "rust ownership".to_string(),
        temperature: 0.7,
        max_tokens: 1000,
        question_number: 1,
        number_of_questions: 1,
    }
}

pub fn create_test_eval(
    creator: ModelId,
    tags: &[&str],
    difficulty: Difficulty,
    skills: &[&str],
    minutes: u32,
) -> Eval {
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    Eval::generated(
        creator,
        "Explain the borrow checker.".to_string(),
        &tags,
        difficulty,
        GeneratedMetadata {
            expected_format: "paragraph".to_string(),
            example_answer: "It enforces aliasing XOR mutation.".to_string(),
            validation_criteria: vec!["mentions borrowing".to_string()],
            skills_tested: skills.iter().map(|s| s.to_string()).collect(),
            estimated_time_minutes: minutes,
            generation_params: create_test_params(),
        },
    )
}

pub fn create_test_result(eval_id: EvalId, model_id: ModelId) -> RunResult {
    RunResult::success(eval_id, model_id, "answer".to_string())
}

pub fn create_test_judgment(eval_id: EvalId, judge: ModelId, score: f64) -> Judgment {
    Judgment::new(eval_id, judge, score, "reasonable".to_string())
}
