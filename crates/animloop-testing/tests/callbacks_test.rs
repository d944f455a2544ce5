//! Callback categories: ordering, self-removal, base gating, forced ticks and
//! dormancy.

use animloop_testing::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn categories_fire_before_main_after_base() {
    init_test_logging();
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_base_fn(recorder.callback("base"));
    root.add_animation_fn_after(recorder.callback("after"));
    root.add_animation_fn(recorder.callback("main"));
    root.add_animation_fn_before(recorder.callback("before"));
    root.start().expect("root loops always start");

    harness.step(0.25);

    assert_eq!(recorder.labels(), vec!["before", "main", "after", "base"]);
    for call in recorder.calls() {
        assert_eq!(call.dt, 0.25);
        assert_eq!(call.elapsed, 0.25);
    }
}

#[test]
fn registration_order_is_kept_and_duplicates_are_ignored() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    let a = root.add_animation_fn(recorder.callback("a"));
    root.add_animation_fn(recorder.callback("b"));
    root.add_animation_fn(a.clone());
    root.add_animation_fn(recorder.callback("c"));
    assert_eq!(root.callback_count(Phase::Main), 3);

    root.start().expect("root loops always start");
    harness.step(0.25);
    assert_eq!(recorder.labels(), vec!["a", "b", "c"]);

    root.remove_animation_fn(&a);
    root.remove_animation_fn(&a);
    assert!(!root.contains_fn(Phase::Main, &a));
    recorder.clear();
    harness.step(0.25);
    assert_eq!(recorder.labels(), vec!["b", "c"]);
}

#[test]
fn same_closure_in_two_categories_fires_twice() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    let shared = recorder.callback("shared");
    root.add_animation_fn_before(shared.clone());
    root.add_animation_fn_after(shared.clone());
    root.start().expect("root loops always start");

    harness.step(0.25);
    assert_eq!(recorder.count("shared"), 2);

    root.remove_animation_fn_before(&shared);
    assert!(root.contains_fn(Phase::After, &shared));
}

#[test]
fn self_removal_takes_effect_after_the_current_call() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.limited("once", 1));
    root.add_animation_fn(recorder.limited("twice", 2));
    root.add_animation_fn(recorder.callback("steady"));
    root.start().expect("root loops always start");

    harness.run_uniform(4, 0.25);

    assert_eq!(recorder.count("once"), 1);
    assert_eq!(recorder.count("twice"), 2);
    assert_eq!(recorder.count("steady"), 4);
    assert_eq!(root.callback_count(Phase::Main), 1);
}

#[test]
fn flow_and_bool_returns_both_control_removal() {
    let harness = LoopHarness::new();
    let root = harness.root();
    let flow_calls = Rc::new(Cell::new(0));
    let bool_calls = Rc::new(Cell::new(0));
    {
        let flow_calls = Rc::clone(&flow_calls);
        root.add_animation_fn(FrameFn::new(move |_, _| {
            flow_calls.set(flow_calls.get() + 1);
            if flow_calls.get() == 3 {
                Flow::Remove
            } else {
                Flow::Continue
            }
        }));
    }
    {
        let bool_calls = Rc::clone(&bool_calls);
        root.add_animation_fn_after(FrameFn::new(move |_, _| {
            bool_calls.set(bool_calls.get() + 1);
            bool_calls.get() < 2
        }));
    }
    root.start().expect("root loops always start");

    assert_eq!(harness.run_uniform(10, 0.125), 3);
    assert_eq!(flow_calls.get(), 3);
    assert_eq!(bool_calls.get(), 2);
    assert!(!root.has_animation_fns());
    assert!(!root.is_ticking());
    assert!(root.is_running());
}

#[test]
fn callbacks_changed_mid_tick_take_effect_on_the_next_tick() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root().clone();
    let victim = recorder.callback("victim");
    let newcomer = recorder.callback("newcomer");
    {
        let handle = root.clone();
        let victim = victim.clone();
        let newcomer = newcomer.clone();
        root.add_animation_fn(FrameFn::new(move |_, _| {
            handle.remove_animation_fn(&victim);
            handle.add_animation_fn(newcomer.clone());
            Flow::Remove
        }));
    }
    root.add_animation_fn(victim.clone());
    root.start().expect("root loops always start");

    harness.step(0.25);
    assert_eq!(recorder.labels(), vec!["victim"]);

    recorder.clear();
    harness.step(0.25);
    assert_eq!(recorder.labels(), vec!["newcomer"]);

    root.dispose();
}

#[test]
fn base_callbacks_are_gated_on_animation_callbacks() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_base_fn(recorder.callback("base"));
    root.start().expect("root loops always start");

    assert!(!root.is_ticking(), "base alone never drives");
    assert!(!harness.step(0.25));
    assert_eq!(recorder.count("base"), 0);

    let main = root.add_animation_fn(recorder.limited("main", 2));
    assert!(root.is_ticking());
    harness.run_uniform(5, 0.25);
    assert_eq!(recorder.labels(), vec!["main", "base", "main", "base"]);
    assert!(!root.contains_fn(Phase::Main, &main));
    assert!(!root.is_ticking());
    assert_eq!(root.callback_count(Phase::Base), 1);
}

#[test]
fn base_gate_is_evaluated_once_per_tick() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn_after(recorder.limited("last-after", 1));
    root.add_base_fn(recorder.callback("base"));
    root.start().expect("root loops always start");

    harness.step(0.25);

    assert_eq!(recorder.labels(), vec!["last-after", "base"]);
    assert!(!root.is_ticking());
}

#[test]
fn base_callbacks_can_remove_themselves() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.callback("main"));
    root.add_base_fn(recorder.limited("base", 1));
    root.start().expect("root loops always start");

    harness.run_uniform(3, 0.25);
    assert_eq!(recorder.count("base"), 1);
    assert_eq!(root.callback_count(Phase::Base), 0);
}

#[test]
fn force_tick_fires_base_callbacks_once() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_base_fn(recorder.callback("base"));
    root.start().expect("root loops always start");

    root.force_tick();
    root.force_tick();
    assert_eq!(root.callback_count(Phase::Main), 1);
    assert!(root.is_ticking());

    assert_eq!(harness.run_uniform(5, 0.25), 1);
    assert_eq!(recorder.count("base"), 1);
    assert!(!root.has_animation_fns());

    root.force_tick();
    assert_eq!(harness.run_uniform(5, 0.25), 1);
    assert_eq!(recorder.count("base"), 2);
}

#[test]
fn force_tick_on_a_stopped_loop_waits_for_start() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_base_fn(recorder.callback("base"));

    root.force_tick();
    assert!(!root.is_ticking());
    assert_eq!(harness.frames().outstanding(), 0);

    root.start().expect("root loops always start");
    harness.step(0.25);
    assert_eq!(recorder.count("base"), 1);
}

#[test]
fn removing_the_last_callback_goes_dormant_immediately() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    let only = root.add_animation_fn(recorder.callback("only"));
    root.start().expect("root loops always start");
    assert_eq!(harness.frames().outstanding(), 1);

    root.remove_animation_fn(&only);

    assert!(!root.is_ticking());
    assert!(root.is_running());
    assert_eq!(harness.frames().outstanding(), 0);
    assert_eq!(harness.frames().cancel_count(), 1);
}

#[test]
fn dormant_loop_resumes_without_losing_elapsed() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.add_animation_fn(recorder.limited("first", 2));
    root.start().expect("root loops always start");

    assert_eq!(harness.run_uniform(5, 0.25), 2);
    assert!(!root.is_ticking());

    root.add_animation_fn(recorder.callback("second"));
    assert!(root.is_ticking());
    harness.step(0.25);

    let second = recorder
        .calls()
        .into_iter()
        .find(|call| call.label == "second")
        .expect("second callback fired");
    assert_eq!(second.elapsed, 0.75);
}

#[test]
fn adding_to_a_paused_loop_only_registers() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    root.start().expect("root loops always start");
    root.pause();

    let callback = root.add_animation_fn(recorder.callback("queued"));
    assert!(root.contains_fn(Phase::Main, &callback));
    assert!(!root.is_ticking());
    assert_eq!(harness.frames().outstanding(), 0);

    root.start().expect("resume");
    harness.step(0.25);
    assert_eq!(recorder.count("queued"), 1);
}

#[test]
fn generic_phase_registration_matches_named_methods() {
    let harness = LoopHarness::new();
    let recorder = CallRecorder::new();
    let root = harness.root();
    for phase in Phase::ALL {
        root.add_fn(phase, recorder.callback(phase.as_str()));
    }
    root.start().expect("root loops always start");
    harness.step(0.25);

    let expected: Vec<&str> = Phase::ALL.iter().map(|phase| phase.as_str()).collect();
    assert_eq!(recorder.labels(), expected);
}
