// tests/runtime_fake_executor.rs

use std::error::Error;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use pipegraph::Pipeline;
use pipegraph::engine::{RunReport, TaskStatus};
use pipegraph::fs::mock::{MockFileSystem, at};
use pipegraph::task::{Action, Artifact, TaskDescriptor};
use pipegraph::types::RunOptions;
use pipegraph_test_utils::fake_executor::FakeExecutor;
use pipegraph_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn step(name: &str) -> pipegraph::task::TaskBuilder {
    TaskDescriptor::builder(name).action(Action::process("echo", [name]))
}

/// reads.fq -> trim -> trimmed.fq -> assemble -> contigs/ -> qa -> qa.txt
/// plus an unrelated `stats` task.
fn assembly_pipeline() -> Vec<TaskDescriptor> {
    vec![
        step("trim")
            .input("reads.fq")
            .output("trimmed.fq")
            .build()
            .unwrap(),
        step("assemble")
            .input("trimmed.fq")
            .output(Artifact::dir("contigs"))
            .build()
            .unwrap(),
        step("qa")
            .input(Artifact::dir("contigs"))
            .output("qa.txt")
            .build()
            .unwrap(),
        step("stats")
            .input("reads.fq")
            .output("stats.txt")
            .build()
            .unwrap(),
        TaskDescriptor::builder("all")
            .task_deps(["qa", "stats"])
            .build()
            .unwrap(),
    ]
}

struct Harness {
    pipeline: Pipeline,
    fs: MockFileSystem,
    clock: Arc<AtomicU64>,
}

impl Harness {
    fn new(tasks: Vec<TaskDescriptor>) -> Self {
        let fs = MockFileSystem::new();
        fs.add_file("reads.fq", at(1));
        let pipeline = Pipeline::new(tasks)
            .unwrap()
            .with_file_system(Arc::new(fs.clone()));
        Self {
            pipeline,
            fs,
            clock: Arc::new(AtomicU64::new(100)),
        }
    }

    async fn run(&self, options: &RunOptions, failing: &[&str]) -> (RunReport, Vec<String>) {
        let executed = Arc::new(Mutex::new(Vec::new()));
        let fs = self.fs.clone();
        let clock = self.clock.clone();
        let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        let exec_log = executed.clone();

        let report = with_timeout(self.pipeline.run_with(
            options,
            move |tx| {
                FakeExecutor::new(tx, exec_log)
                    .failing(failing)
                    .producing_on(fs, clock)
            },
            std::future::pending(),
        ))
        .await
        .unwrap();

        let names = executed.lock().unwrap().clone();
        (report, names)
    }
}

#[tokio::test]
async fn first_run_executes_everything_in_order() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());

    let (report, executed) = h.run(&RunOptions::default(), &[]).await;

    assert_eq!(executed, vec!["trim", "assemble", "qa", "stats"]);
    assert!(report.is_success());
    assert_eq!(report.status_of("all"), Some(&TaskStatus::Succeeded));
    assert!(!report.ran().contains(&"all"));
    Ok(())
}

#[tokio::test]
async fn second_run_performs_no_actions() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());

    h.run(&RunOptions::default(), &[]).await;
    let (report, executed) = h.run(&RunOptions::default(), &[]).await;

    assert!(executed.is_empty(), "unexpected runs: {executed:?}");
    for name in ["trim", "assemble", "qa", "stats"] {
        assert_eq!(report.status_of(name), Some(&TaskStatus::SkippedUpToDate));
    }
    Ok(())
}

#[tokio::test]
async fn touching_an_input_reruns_only_downstream_tasks() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());
    h.run(&RunOptions::default(), &[]).await;

    h.fs.touch("trimmed.fq", at(10_000));
    let (_, executed) = h.run(&RunOptions::default(), &[]).await;

    assert_eq!(executed, vec!["assemble", "qa"]);
    Ok(())
}

#[tokio::test]
async fn failure_blocks_dependents_but_not_independent_tasks() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());

    let (report, executed) = h.run(&RunOptions::default(), &["assemble"]).await;

    assert_eq!(executed, vec!["trim", "assemble", "stats"]);
    assert!(matches!(report.status_of("assemble"), Some(TaskStatus::Failed(_))));
    assert_eq!(report.status_of("qa"), Some(&TaskStatus::SkippedBlocked));
    assert_eq!(report.status_of("all"), Some(&TaskStatus::SkippedBlocked));
    assert_eq!(report.status_of("stats"), Some(&TaskStatus::Succeeded));
    assert!(!report.is_success());
    assert_eq!(report.summary().failed, 1);
    Ok(())
}

#[tokio::test]
async fn fail_fast_blocks_dependents_and_cancels_the_rest() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());
    let options = RunOptions {
        fail_fast: true,
        ..RunOptions::default()
    };

    let (report, executed) = h.run(&options, &["trim"]).await;

    assert_eq!(executed, vec!["trim"]);
    assert!(matches!(report.status_of("trim"), Some(TaskStatus::Failed(_))));
    assert_eq!(report.status_of("stats"), Some(&TaskStatus::SkippedCancelled));
    for name in ["assemble", "qa", "all"] {
        assert_eq!(report.status_of(name), Some(&TaskStatus::SkippedBlocked));
    }
    let summary = report.summary();
    assert_eq!((summary.failed, summary.blocked, summary.cancelled), (1, 3, 1));
    Ok(())
}

#[tokio::test]
async fn jobs_limit_does_not_change_the_outcome() -> TestResult {
    init_tracing();

    let serial = Harness::new(assembly_pipeline());
    let (serial_report, _) = serial.run(&RunOptions::default(), &["qa"]).await;

    let parallel = Harness::new(assembly_pipeline());
    let options = RunOptions {
        jobs: 4,
        ..RunOptions::default()
    };
    let (parallel_report, _) = parallel.run(&options, &["qa"]).await;

    assert_eq!(serial_report.tasks, parallel_report.tasks);
    Ok(())
}

#[tokio::test]
async fn targets_limit_the_run_to_their_predecessors() -> TestResult {
    init_tracing();
    let h = Harness::new(assembly_pipeline());
    let options = RunOptions {
        targets: vec!["assemble".to_string()],
        ..RunOptions::default()
    };

    let (report, executed) = h.run(&options, &[]).await;

    assert_eq!(executed, vec!["trim", "assemble"]);
    assert_eq!(report.status_of("qa"), None);
    assert_eq!(report.tasks.len(), 2);
    Ok(())
}

#[tokio::test]
async fn run_once_task_is_skipped_when_output_exists() -> TestResult {
    init_tracing();
    let tasks = vec![
        step("fetch_db")
            .output(Artifact::sentinel("fetch_db.done"))
            .run_once()
            .build()
            .unwrap(),
        step("search")
            .input(Artifact::sentinel("fetch_db.done"))
            .input("reads.fq")
            .output("hits.tsv")
            .build()
            .unwrap(),
    ];
    let h = Harness::new(tasks);
    h.fs.add_file("fetch_db.done", at(50));

    let (report, executed) = h.run(&RunOptions::default(), &[]).await;

    assert_eq!(executed, vec!["search"]);
    assert_eq!(report.status_of("fetch_db"), Some(&TaskStatus::SkippedUpToDate));
    Ok(())
}
