use super::*;
use animloop_core::{FrameFn, TimeSource};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn frame_source_delivers_in_request_order() {
    let frames = StdFrameSource::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for label in ["a", "b", "c"] {
        let order = Rc::clone(&order);
        frames.request_frame(Box::new(move || order.borrow_mut().push(label)));
    }

    assert_eq!(frames.drain_frame_callbacks(), 3);
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    assert!(!frames.has_pending());
}

#[test]
fn cancelled_requests_never_fire() {
    let frames = StdFrameSource::new();
    let fired = Rc::new(Cell::new(false));

    let id = {
        let fired = Rc::clone(&fired);
        frames.request_frame(Box::new(move || fired.set(true)))
    };
    frames.cancel_frame(id);
    frames.cancel_frame(id);

    assert_eq!(frames.drain_frame_callbacks(), 0);
    assert!(!fired.get());
}

#[test]
fn requests_made_during_a_frame_wait_for_the_next_one() {
    let frames = Rc::new(StdFrameSource::new());
    let nested_fired = Rc::new(Cell::new(false));

    {
        let frames_inner = Rc::clone(&frames);
        let nested_fired = Rc::clone(&nested_fired);
        frames.request_frame(Box::new(move || {
            frames_inner.request_frame(Box::new(move || nested_fired.set(true)));
        }));
    }

    assert_eq!(frames.drain_frame_callbacks(), 1);
    assert!(!nested_fired.get());
    assert_eq!(frames.pending_count(), 1);

    frames.drain_frame_callbacks();
    assert!(nested_fired.get());
}

#[test]
fn frame_waker_runs_on_every_request() {
    let frames = StdFrameSource::new();
    let wakes = Rc::new(Cell::new(0));
    {
        let wakes = Rc::clone(&wakes);
        frames.set_frame_waker(move || wakes.set(wakes.get() + 1));
    }

    frames.request_frame(Box::new(|| {}));
    frames.request_frame(Box::new(|| {}));
    assert_eq!(wakes.get(), 2);

    frames.clear_frame_waker();
    frames.request_frame(Box::new(|| {}));
    assert_eq!(wakes.get(), 2);
}

#[test]
fn std_time_source_is_monotonic() {
    let mut time = std_time_source();
    assert_eq!(time.delta(), 0.0);

    let mut last = time.elapsed_time();
    for _ in 0..5 {
        std::thread::sleep(Duration::from_millis(1));
        let delta = time.delta();
        assert!(delta >= 0.0);
        let elapsed = time.elapsed_time();
        assert!(elapsed >= last);
        last = elapsed;
    }
}

#[test]
fn std_runtime_drives_a_loop_frame_by_frame() {
    let runtime = StdRuntime::new();
    let animation = runtime.new_loop(LoopSettings::new().with_label("std"));
    let calls = Rc::new(Cell::new(0));
    let last_elapsed = Rc::new(Cell::new(0.0));
    {
        let calls = Rc::clone(&calls);
        let last_elapsed = Rc::clone(&last_elapsed);
        animation.add_animation_fn(FrameFn::new(move |dt, elapsed| {
            assert!(dt >= 0.0);
            assert!(elapsed >= last_elapsed.get());
            last_elapsed.set(elapsed);
            calls.set(calls.get() + 1);
        }));
    }

    animation.start().expect("root loops always start");
    assert!(runtime.needs_frame());

    for _ in 0..3 {
        runtime.pump_frame();
    }
    assert_eq!(calls.get(), 3);
    assert_eq!(runtime.frames().pending_count(), 1);

    animation.stop();
    assert!(!runtime.needs_frame());
    assert_eq!(animation.elapsed(), 0.0);
}

#[test]
fn run_frames_stops_once_the_loop_goes_dormant() {
    let runtime = StdRuntime::with_frame_interval(Duration::from_millis(1));
    let animation = runtime.new_loop(LoopSettings::default());
    let remaining = Rc::new(Cell::new(3));
    {
        let remaining = Rc::clone(&remaining);
        animation.add_animation_fn(FrameFn::new(move |_, _| {
            remaining.set(remaining.get() - 1);
            remaining.get() > 0
        }));
    }
    animation.start().expect("root loops always start");

    assert_eq!(runtime.run_frames(100), 3);
    assert!(!animation.is_ticking());
    assert!(animation.is_running());
}
