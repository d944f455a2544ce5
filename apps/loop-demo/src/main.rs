use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use animloop_core::{AnimationLoop, Flow, FrameFn, LoopSettings};
use animloop_runtime_std::StdRuntime;
use anyhow::{bail, Context, Result};
use clap::Parser;

/// Drives a root loop with two throttled children on the std runtime.
#[derive(Parser, Debug)]
#[command(name = "loop-demo", version, about)]
struct DemoOptions {
    /// How long the tree runs, in seconds of loop time.
    #[arg(long, default_value_t = 2.0)]
    seconds: f64,

    /// Upper bound on frames pumped before the demo gives up.
    #[arg(long, default_value_t = 600)]
    max_frames: usize,
}

impl DemoOptions {
    fn validate(self) -> Result<Self> {
        if !(self.seconds.is_finite() && self.seconds > 0.0) {
            bail!("--seconds must be positive, got {}", self.seconds);
        }
        Ok(self)
    }
}

/// Logs every firing of `animation` and reports how many there were.
fn attach_reporter(animation: &AnimationLoop, name: &'static str) -> Rc<Cell<usize>> {
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    animation.add_animation_fn(FrameFn::new(move |dt, elapsed| {
        counter.set(counter.get() + 1);
        log::info!("{name:>6} dt={dt:.4}s elapsed={elapsed:.3}s");
    }));
    fired
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = DemoOptions::parse().validate()?;
    println!("=== animloop demo ===");
    println!("A root loop drives two throttled children from one frame request.");
    println!("Running for {:.1}s (at most {} frames).", options.seconds, options.max_frames);
    println!();

    let runtime = StdRuntime::with_frame_interval(Duration::from_millis(16));
    let root = runtime.new_loop(LoopSettings::new().with_label("root"));
    let slow = root.add_child_loop_with(LoopSettings::new().with_label("slow").with_interval(0.5));
    let fast = root.add_child_loop_with(LoopSettings::new().with_label("fast").with_interval(0.1));

    let slow_fired = attach_reporter(&slow, "slow");
    let fast_fired = attach_reporter(&fast, "fast");

    let seconds = options.seconds;
    let frames = Rc::new(Cell::new(0usize));
    {
        let frames = Rc::clone(&frames);
        root.add_animation_fn_after(FrameFn::new(move |_, elapsed| {
            frames.set(frames.get() + 1);
            if elapsed >= seconds {
                Flow::Remove
            } else {
                Flow::Continue
            }
        }));
    }
    {
        let root_handle = root.clone();
        root.add_base_fn(FrameFn::new(move |_, elapsed| {
            if elapsed >= seconds {
                log::info!("time is up, stopping the tree");
                root_handle.stop();
            }
        }));
    }

    let requests = Rc::new(Cell::new(0usize));
    {
        let requests = Rc::clone(&requests);
        runtime
            .frames()
            .set_frame_waker(move || requests.set(requests.get() + 1));
    }

    slow.start().context("starting the slow child")?;
    fast.start().context("starting the fast child")?;
    root.start().context("starting the root loop")?;

    let pumped = runtime.run_frames(options.max_frames);

    println!();
    println!("frames pumped:  {pumped}");
    println!("root ticks:     {}", frames.get());
    println!("slow firings:   {}", slow_fired.get());
    println!("fast firings:   {}", fast_fired.get());
    println!("frame requests: {}", requests.get());

    runtime.frames().clear_frame_waker();

    root.dispose();
    Ok(())
}
