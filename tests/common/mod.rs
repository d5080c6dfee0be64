#![allow(dead_code)]

pub use parallel_exec_test_utils::builders;
pub use parallel_exec_test_utils::{init_tracing, with_timeout, EventRecorder};

use parallel_exec::events::{EventKind, FIELD_CMD};
use parallel_exec::{Runner, RunnerOptions};

/// Runner whose events go to the returned recorder.
pub fn recording_runner(fast_fail: bool, max_concurrent: usize) -> (Runner, EventRecorder) {
    let recorder = EventRecorder::new();
    let options = RunnerOptions::default()
        .with_fast_fail(fast_fail)
        .with_max_concurrent(max_concurrent)
        .with_event_sink(recorder.clone());
    (Runner::new(options), recorder)
}

/// Exactly one `run_started` (first) and one `run_finished` (last), and every
/// command either has no events or exactly a started/finished pair.
pub fn assert_well_formed(recorder: &EventRecorder) {
    let kinds = recorder.kinds();
    assert_eq!(kinds.first(), Some(&EventKind::RunStarted), "{kinds:?}");
    assert_eq!(kinds.last(), Some(&EventKind::RunFinished), "{kinds:?}");
    assert_eq!(recorder.count(EventKind::RunStarted), 1);
    assert_eq!(recorder.count(EventKind::RunFinished), 1);

    let mut cmds: Vec<String> = recorder
        .events()
        .iter()
        .filter_map(|e| e.field(FIELD_CMD).map(str::to_string))
        .collect();
    cmds.sort();
    cmds.dedup();
    for cmd in cmds {
        let per_cmd: Vec<EventKind> = recorder.for_cmd(&cmd).iter().map(|e| e.kind).collect();
        assert_eq!(
            per_cmd,
            [EventKind::CmdStarted, EventKind::CmdFinished],
            "events for {cmd}"
        );
    }
}
