//! End-to-end voting runs with deterministic in-memory backends (no network).
//!
//! Covers: generator ↔ distributor ↔ worker pool ↔ aggregator running
//! together through `VoteCoordinator`.
//!
//! Failed queries contribute to neither `agree` nor `decision`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vote_coordination::{
    generate_tasks, merge_tallies, parse_statements, AggregateReport, QueryClient,
    ShardingScheme, Tally, TallyMap, VoteConfig, VoteCoordinator,
};

/// Fixed answer per model; models missing from the map are unreachable.
struct ModelScript {
    answers: HashMap<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ModelScript {
    fn new(answers: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers
                .iter()
                .map(|(m, a)| (m.to_string(), a.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QueryClient for ModelScript {
    async fn query(&self, model: &str, prompt: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.answers.get(model).cloned()
    }
}

fn config(models: &[&str], roles: &[&str], workers: usize) -> VoteConfig {
    VoteConfig {
        models: models.iter().map(|s| s.to_string()).collect(),
        roles: roles.iter().map(|s| s.to_string()).collect(),
        worker_count: workers,
        ..Default::default()
    }
}

/// Two statements, one model, one role, every call answers TRUE.
#[tokio::test]
async fn test_all_true_two_statements() {
    let client = ModelScript::new(&[("llama3", "TRUE. It holds.")]);
    let coordinator =
        VoteCoordinator::new(client.clone(), config(&["llama3"], &["Engineer"], 2)).unwrap();
    let statements = parse_statements("The earth orbits the sun.\nWater is wet.");

    let summary = coordinator.run(&statements).await.unwrap();

    for prompt_id in 0..2 {
        let result = summary.report.get(prompt_id).unwrap();
        assert_eq!(result.agree, 2);
        assert_eq!(result.decision, 2);
        assert_eq!(format!("{:.2}", result.percentage), "100.00");
    }
    assert_eq!(summary.task_count, 4);
    assert_eq!(client.calls.load(Ordering::SeqCst), 4);
}

/// One statement, two models, no roles, one backend unreachable.
#[tokio::test]
async fn test_one_model_down_never_counts_as_decision() {
    for (alive, expected_agree, answer) in [("phi", 1, "TRUE."), ("phi", 0, "FALSE.")] {
        let client = ModelScript::new(&[(alive, answer)]);
        let coordinator =
            VoteCoordinator::new(client, config(&["llama3", "phi"], &[], 2)).unwrap();
        let statements = parse_statements("Cats are mammals.");

        let summary = coordinator.run(&statements).await.unwrap();
        let result = summary.report.get(0).unwrap();

        assert_eq!(result.decision, 1);
        assert_eq!(result.agree, expected_agree);
        assert_eq!(result.percentage, 100.0 * expected_agree as f64);
        assert_eq!(summary.failed_tasks, 1);
    }
}

/// Every backend down: statement is still reported, at 0%.
#[tokio::test]
async fn test_all_backends_down_reports_zero_percent() {
    let client = ModelScript::new(&[]);
    let coordinator =
        VoteCoordinator::new(client, config(&["llama3", "gemma"], &["Engineer"], 3)).unwrap();
    let statements = parse_statements("a\nb");

    let summary = coordinator.run(&statements).await.unwrap();

    assert_eq!(summary.report.len(), 2);
    for (_, result) in summary.report.iter() {
        assert_eq!(result.decision, 0);
        assert_eq!(result.percentage, 0.0);
    }
    assert_eq!(summary.failed_tasks, summary.task_count);
    assert!(summary.render().contains("Agreement Percentage: 0.00%"));
}

/// Same inputs, any worker count or sharding scheme, same report.
#[tokio::test]
async fn test_report_independent_of_workers_and_scheme() {
    let statements = parse_statements("s0\ns1\ns2\ns3\ns4");
    let answers = [
        ("llama3", "TRUE"),
        ("phi", "FALSE, definitely"),
        ("gemma", "not TRUE, FALSE"),
    ];

    let mut reports: Vec<AggregateReport> = Vec::new();
    for scheme in [
        ShardingScheme::TailRemainder,
        ShardingScheme::Contiguous,
        ShardingScheme::Strided,
    ] {
        for workers in [1, 2, 3, 7, 40] {
            let mut cfg = config(
                &["llama3", "phi", "gemma", "mistral"],
                &["Engineer", "Philosophy Professor"],
                workers,
            );
            cfg.sharding = scheme;
            let coordinator = VoteCoordinator::new(ModelScript::new(&answers), cfg).unwrap();
            reports.push(coordinator.run(&statements).await.unwrap().report);
        }
    }

    for report in &reports[1..] {
        assert_eq!(report, &reports[0]);
    }

    // per statement: 4 models × 3 queries; mistral is down, phi says FALSE
    let expected = Tally::new(6, 9);
    for (_, result) in reports[0].iter() {
        assert_eq!(result.tally(), expected);
    }
}

/// Panics before returning a future for `"eager"`.
struct EagerPanic;

impl QueryClient for EagerPanic {
    fn query<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        model: &'life1 str,
        _prompt: &'life2 str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        assert_ne!(model, "eager", "no request builder for {model}");
        Box::pin(async { Some("TRUE.".to_string()) })
    }
}

/// A client panicking outside its future still costs only its own tasks.
#[tokio::test]
async fn test_eager_client_panic_keeps_other_votes() {
    let coordinator =
        VoteCoordinator::new(Arc::new(EagerPanic), config(&["good", "eager"], &[], 1)).unwrap();

    let summary = coordinator.run(&parse_statements("a\nb")).await.unwrap();

    assert_eq!(summary.task_count, 4);
    assert_eq!(summary.failed_tasks, 2);
    assert_eq!(summary.report.len(), 2);
    assert_eq!(summary.overall(), Tally::new(2, 2));
}

/// Layer-3 prompts carry the persona; layer-2 prompts do not.
#[tokio::test]
async fn test_backend_receives_rendered_prompts() {
    let client = ModelScript::new(&[("llama3", "TRUE")]);
    let coordinator = VoteCoordinator::new(
        client.clone(),
        config(&["llama3"], &["Mathematician", "Physicist"], 1),
    )
    .unwrap();

    coordinator
        .run(&parse_statements("Pi is irrational."))
        .await
        .unwrap();

    let prompts = client.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 3);
    assert!(prompts
        .iter()
        .all(|(model, p)| model == "llama3" && p.contains("'Pi is irrational.'")));
    assert!(!prompts[0].1.contains("Respond as an expert"));
    assert!(prompts[1].1.ends_with("Respond as an expert Mathematician."));
    assert!(prompts[2].1.ends_with("Respond as an expert Physicist."));
}

#[test]
fn test_task_total_matches_formula() {
    let statements = parse_statements("a\nb\nc\nd");
    let models: Vec<String> = ["m1", "m2", "m3"].iter().map(|s| s.to_string()).collect();
    for role_count in 0..4 {
        let roles: Vec<String> = (0..role_count).map(|i| format!("role-{i}")).collect();
        let tasks = generate_tasks(&statements, &models, &roles);
        assert_eq!(tasks.len(), 4 * 3 * (1 + role_count));
    }
}

#[test]
fn test_merge_order_does_not_matter() {
    let workers: Vec<TallyMap> = (0..5u64)
        .map(|w| {
            (0..4usize)
                .filter(|p| (*p as u64 + w) % 2 == 0)
                .map(|p| (p, Tally::new(w % 3, w + 1)))
                .collect()
        })
        .collect();

    let forward = merge_tallies(workers.clone());
    let mut reversed = workers;
    reversed.reverse();
    assert_eq!(forward, merge_tallies(reversed));
}
