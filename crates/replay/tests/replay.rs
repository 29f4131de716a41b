//! Runs the full detector against a replayed trace.

use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use quakelight_detector::{
    new_callback, CancellationToken, CycleOutcome, CycleState, DetectionController,
    DetectorEvent, DetectorService, DetectorSettings, Digit, DigitDisplay, MagnitudeThresholds,
    MonitorSettings,
};
use quakelight_replay::{ConsoleDisplay, ReplayRig, ReplayTrace};

const TRACE: &str = r#"{
    "sample_interval_ms": 2,
    "events": [
        { "delay_ms": 0, "readings": [0.2, 0.7, 0.7, 0.3] },
        { "delay_ms": 10, "readings": [1.5, 0.4] }
    ]
}"#;

fn settings() -> DetectorSettings {
    DetectorSettings {
        scale: MagnitudeThresholds::default(),
        monitor: MonitorSettings {
            poll_interval: Duration::from_millis(2),
            quiet_periods: 15,
        },
    }
}

fn rig() -> ReplayRig {
    ReplayRig::new(ReplayTrace::from_json(TRACE).unwrap())
        .with_recheck_interval(Duration::from_millis(5))
}

#[test]
fn test_single_cycle_from_trace() {
    let mut controller = DetectionController::new(
        rig(),
        ConsoleDisplay::new(Duration::ZERO),
        settings(),
        CancellationToken::new(),
    );

    let CycleOutcome::Completed(report) = controller.run_cycle().unwrap() else {
        panic!("first trace event should complete a cycle");
    };

    assert_eq!(report.final_digit, Digit::new(5).unwrap());
    assert_eq!(report.peak_reading, 0.7);
    assert!(report.periods >= 15);
    assert_eq!(controller.state(), CycleState::Listening);
    assert_eq!(controller.display().current_digit(), Digit::ZERO);
}

#[test]
fn test_service_replays_whole_trace() {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let controller = DetectionController::new(
        rig(),
        ConsoleDisplay::new(Duration::ZERO),
        settings(),
        CancellationToken::new(),
    )
    .with_callback(new_callback(move |event| {
        let _ = tx.lock().unwrap().send(event);
    }));

    let mut service = DetectorService::spawn(controller).unwrap();

    let mut reports = Vec::new();
    while reports.len() < 2 {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(DetectorEvent::Settled { report }) => reports.push(report),
            Ok(_) => {}
            Err(e) => panic!("replay stalled: {e}"),
        }
    }

    assert_eq!(service.stop().unwrap(), 2);
    assert_eq!(reports[0].final_digit, Digit::new(5).unwrap());
    assert_eq!(reports[1].final_digit, Digit::new(9).unwrap());
    assert_eq!(reports[1].cycle, 2);

    let stopped = rx
        .try_iter()
        .any(|event| matches!(event, DetectorEvent::Stopped { completed_cycles: 2, .. }));
    assert!(stopped);
}
