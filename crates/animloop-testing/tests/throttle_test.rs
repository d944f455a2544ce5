//! Interval throttling observed through a running loop.

use animloop_testing::prelude::*;

#[test]
fn throttled_deltas_sum_to_the_last_crossed_boundary() {
    init_test_logging();
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(0.25));
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");

    assert_eq!(harness.run_uniform(14, 0.0625), 14);

    let fired = recorder.deltas("tick");
    assert_eq!(fired, vec![0.0625, 0.1875, 0.25, 0.25]);
    assert_eq!(fired.iter().sum::<f64>(), 0.75);
    assert_eq!(root.elapsed(), 0.875);

    let elapsed: Vec<f64> = recorder.calls().iter().map(|call| call.elapsed).collect();
    assert_eq!(elapsed, vec![0.0625, 0.25, 0.5, 0.75]);
}

#[test]
fn decimal_interval_fires_once_per_boundary() {
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(0.1));
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");

    harness.run_uniform(35, 0.01);

    let fired = recorder.deltas("tick");
    assertions::assert_deltas_approx_eq(
        &fired,
        &[0.01, 0.1, 0.09, 0.1],
        1e-9,
        "first frame plus the 0.1, 0.2 and 0.3 boundaries",
    );
    let total: f64 = fired.iter().sum();
    assert_approx_eq(total, 0.3, 1e-9, "sum of fired deltas");
    let last = recorder.calls().last().map(|call| call.elapsed).unwrap_or_default();
    assert_approx_eq(total, last, 1e-12, "sum matches elapsed at last firing");
    assert_approx_eq(root.elapsed(), 0.35, 1e-9, "elapsed keeps accumulating");
}

#[test]
fn throttled_root_still_requests_every_frame() {
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(1.0));
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");

    assert_eq!(harness.run_uniform(7, 0.25), 7);
    assert_eq!(harness.frames().request_count(), 8);
    assert_eq!(harness.frames().outstanding(), 1);
    assert_eq!(recorder.deltas("tick"), vec![0.25, 0.75]);
}

#[test]
fn stop_forgets_fired_boundaries() {
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(0.5));
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");
    harness.run_uniform(3, 0.25);
    assert_eq!(recorder.count("tick"), 2);

    root.stop();
    recorder.clear();
    root.start().expect("restart");
    harness.step(0.25);

    assert_eq!(recorder.deltas("tick"), vec![0.25]);
    assert_eq!(root.interval(), Some(0.5));
}

#[test]
fn pause_keeps_throttle_progress() {
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(0.5));
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");
    harness.step(0.25);

    root.pause();
    root.start().expect("resume");
    harness.step(0.125);
    harness.step(0.125);

    assert_eq!(recorder.deltas("tick"), vec![0.25, 0.25]);
}

#[test]
fn changing_the_interval_fires_on_the_next_tick() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");
    harness.run_uniform(3, 0.25);

    root.set_interval(Some(0.5));
    recorder.clear();
    harness.run_uniform(3, 0.25);

    assert_eq!(recorder.deltas("tick"), vec![0.25, 0.5]);

    root.set_interval(None);
    recorder.clear();
    harness.run_uniform(2, 0.25);
    assert_eq!(recorder.deltas("tick"), vec![0.25, 0.25]);
}

#[test]
fn invalid_intervals_leave_the_loop_unthrottled() {
    let harness = LoopHarness::with_settings(LoopSettings::new().with_interval(-1.0));
    let root = harness.root();
    assert_eq!(root.interval(), None);

    root.set_interval(Some(0.5));
    assert_eq!(root.interval(), Some(0.5));
    root.set_interval(Some(f64::NAN));
    assert_eq!(root.interval(), None);
    root.set_interval(Some(0.0));
    assert_eq!(root.interval(), None);

    let recorder = CallRecorder::new();
    root.add_animation_fn(recorder.callback("tick"));
    root.start().expect("root loops always start");
    harness.run_uniform(3, 0.125);
    assert_eq!(recorder.count("tick"), 3);
}
