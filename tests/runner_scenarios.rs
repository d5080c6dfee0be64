// tests/runner_scenarios.rs
#![cfg(unix)]

mod common;
use crate::common::builders::{fail, missing, sh, sleep, succeed};
use crate::common::{assert_well_formed, init_tracing, recording_runner, with_timeout, EventRecorder};

use std::time::{Duration, Instant};

use parallel_exec::events::{EventKind, FIELD_DURATION, FIELD_ERR};
use parallel_exec::{RunError, Runner, RunnerOptions};
use parallel_exec_test_utils::clock::StepClock;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_failure_fails_the_run_but_not_its_siblings() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 0);

    let result = with_timeout(runner.run_until(vec![succeed(), fail()], std::future::pending())).await;

    assert_eq!(result, Err(RunError::CommandFailed));
    assert_well_formed(&recorder);
    assert_eq!(recorder.count(EventKind::CmdFinished), 2);

    let failed = recorder.for_cmd("false");
    assert!(failed[1].field(FIELD_ERR).is_some());
    let ok = recorder.for_cmd("true");
    assert!(ok[1].error.is_none());

    let run_finished = recorder.events().pop().unwrap();
    assert_eq!(run_finished.error.as_deref(), Some("command failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unlimited_commands_run_side_by_side() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 0);
    let commands = vec![sh("sleep 1; exit 0"), sh("sleep 1; exit 1")];

    let started = Instant::now();
    let result = with_timeout(runner.run_until(commands, std::future::pending())).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(RunError::CommandFailed));
    assert!(elapsed < Duration::from_millis(1800), "took {elapsed:?}");
    assert_eq!(recorder.max_overlap(), 2);
    assert_well_formed(&recorder);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fast_fail_kills_the_slow_sibling() {
    init_tracing();
    let (runner, recorder) = recording_runner(true, 2);

    let started = Instant::now();
    let result = with_timeout(runner.run_until(vec![fail(), sleep(5.0)], std::future::pending())).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(RunError::CommandFailed));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    assert_well_formed(&recorder);

    // Killed either before it started (no events) or while running.
    let slow = recorder.for_cmd("sleep 5");
    assert!(slow.is_empty() || slow.len() == 2, "{slow:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fast_fail_keeps_queued_commands_from_starting() {
    init_tracing();
    let (runner, recorder) = recording_runner(true, 1);
    let commands = (1..=5).map(|n| sh(&format!("exit {n}"))).collect();

    let result = with_timeout(runner.run_until(commands, std::future::pending())).await;

    assert_eq!(result, Err(RunError::CommandFailed));
    assert_eq!(recorder.count(EventKind::CmdStarted), 1);
    assert_eq!(recorder.count(EventKind::CmdFinished), 1);
    assert_well_formed(&recorder);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_slot_never_overlaps() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 1);
    let commands = (0..4).map(|n| sh(&format!("sleep 0.05; echo {n} >/dev/null"))).collect();

    let result = with_timeout(runner.run_until(commands, std::future::pending())).await;

    assert_eq!(result, Ok(()));
    assert_eq!(recorder.count(EventKind::CmdStarted), 4);
    assert_eq!(recorder.max_overlap(), 1);
    assert_well_formed(&recorder);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unlimited_gate_admits_everything_at_once() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 0);
    let commands = (0..32).map(|n| sh(&format!("sleep 1; echo {n} >/dev/null"))).collect();

    let started = Instant::now();
    let result = with_timeout(runner.run_until(commands, std::future::pending())).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Ok(()));
    assert_eq!(recorder.count(EventKind::CmdFinished), 32);
    assert!(recorder.max_overlap() > 1);
    assert!(elapsed < Duration::from_secs(8), "took {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interruption_kills_in_flight_commands() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 2);
    let commands = (0..4u8).map(|n| sleep(5.0 + f64::from(n) / 10.0)).collect();

    let started = Instant::now();
    let result = with_timeout(
        runner.run_until(commands, tokio::time::sleep(Duration::from_millis(300))),
    )
    .await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(RunError::Interrupted));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    assert_eq!(recorder.count(EventKind::CmdStarted), 2);
    assert_eq!(recorder.count(EventKind::CmdFinished), 2);
    assert_well_formed(&recorder);

    let run_finished = recorder.events().pop().unwrap();
    assert_eq!(run_finished.error.as_deref(), Some("interrupted"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn start_failure_is_reported_per_command() {
    init_tracing();
    let (runner, recorder) = recording_runner(false, 0);

    let result = with_timeout(runner.run_until(vec![missing(), succeed()], std::future::pending())).await;

    assert_eq!(result, Err(RunError::CommandFailed));
    assert_well_formed(&recorder);

    let events = recorder.for_cmd("/nonexistent/parallel-exec-test-binary");
    let err = events[1].field(FIELD_ERR).unwrap();
    assert!(err.starts_with("command could not start:"), "{err}");
    assert!(recorder.for_cmd("true")[1].error.is_none());
}

#[tokio::test]
async fn injected_clock_makes_timestamps_deterministic() {
    let clock = StepClock::new(10);
    let recorder = EventRecorder::new();
    let runner = Runner::new(
        RunnerOptions::default()
            .with_max_concurrent(1)
            .with_clock(clock.as_fn())
            .with_event_sink(recorder.clone()),
    );

    let result = runner.run_until(vec![succeed()], std::future::pending()).await;
    assert_eq!(result, Ok(()));

    let events = recorder.events();
    let times: Vec<i64> = events.iter().map(|e| e.time.timestamp_millis()).collect();
    assert_eq!(times, [0, 10, 20, 30]);
    assert_eq!(events[2].field(FIELD_DURATION), Some("10ms"));
    assert_eq!(events[3].field(FIELD_DURATION), Some("30ms"));
}

#[tokio::test]
async fn empty_command_list_succeeds() {
    let (runner, recorder) = recording_runner(true, 1);

    let result = runner.run_until(Vec::new(), std::future::pending()).await;

    assert_eq!(result, Ok(()));
    assert_eq!(recorder.kinds(), [EventKind::RunStarted, EventKind::RunFinished]);
}
