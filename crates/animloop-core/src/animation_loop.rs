//! The frame-driven scheduler.
//!
//! An [`AnimationLoop`] is either *root-driven*, requesting one frame at a
//! time from a [`FrameSource`] and polling its own [`TimeSource`], or a
//! *child* that registers its internal tick as a `main` callback on a parent
//! loop and reuses the parent's deltas. Either way a tree of loops holds at
//! most one outstanding frame request, owned by its root.
//!
//! No `RefCell` borrow of a loop is held while user callbacks, the parent loop
//! or the frame source run. Callbacks may therefore add or remove callbacks,
//! start, pause or stop any loop (their own included) and re-parent children
//! in the middle of a tick.

use crate::callbacks::{CallbackSet, Flow, FrameFn, Phase, Snapshot};
use crate::error::LoopError;
use crate::frame_clock::FrameRegistration;
use crate::platform::{FrameSource, TimeSource};
use crate::settings::LoopSettings;
use crate::throttle::Throttle;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Lifecycle state of an [`AnimationLoop`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Stopped,
    Running,
    Paused,
}

type InnerRef = Rc<RefCell<LoopInner>>;
type WeakInner = Weak<RefCell<LoopInner>>;

/// Where a loop gets its ticks from.
enum Driver {
    /// Root mode: frames from the host, deltas from an owned stopwatch.
    Frames {
        frames: Rc<dyn FrameSource>,
        clock: Box<dyn TimeSource>,
    },
    /// Child mode: ticks and deltas from the parent's `main` category.
    Parent { parent: Option<WeakInner> },
}

/// The one outstanding registration a driving loop holds.
enum DriveHandle {
    Frame(FrameRegistration),
    Parent { parent: WeakInner, tick: FrameFn },
}

/// Work needed to obtain a [`DriveHandle`], prepared under a borrow and
/// carried out after it is released.
enum Acquire {
    Frame {
        frames: Rc<dyn FrameSource>,
        generation: u64,
    },
    Parent {
        parent: InnerRef,
        tick: FrameFn,
    },
}

enum AfterTick {
    Idle,
    Dormant,
    Renew,
}

struct TickBatch {
    dt: f64,
    elapsed: f64,
    phases: SmallVec<[(Phase, Snapshot); 4]>,
}

struct LoopInner {
    this: WeakInner,
    label: Option<String>,
    state: LoopState,
    elapsed: f64,
    throttle: Throttle,
    driver: Driver,
    driving: bool,
    pending: Option<DriveHandle>,
    generation: u64,
    before: CallbackSet,
    main: CallbackSet,
    after: CallbackSet,
    base: CallbackSet,
    forced_tick: bool,
    child_tick: Option<FrameFn>,
    children: SmallVec<[WeakInner; 2]>,
}

impl LoopInner {
    fn new(this: WeakInner, driver: Driver, settings: LoopSettings) -> Self {
        let throttle = Throttle::new(settings.effective_interval());
        if settings.interval.is_some() && settings.effective_interval().is_none() {
            log::warn!(
                "ignoring invalid interval {:?} for loop {}",
                settings.interval,
                settings.label.as_deref().unwrap_or("<unnamed>")
            );
        }
        Self {
            this,
            label: settings.label,
            state: LoopState::Stopped,
            elapsed: 0.0,
            throttle,
            driver,
            driving: false,
            pending: None,
            generation: 0,
            before: CallbackSet::new(),
            main: CallbackSet::new(),
            after: CallbackSet::new(),
            base: CallbackSet::new(),
            forced_tick: false,
            child_tick: None,
            children: SmallVec::new(),
        }
    }

    fn name(&self) -> &str {
        match (&self.label, &self.driver) {
            (Some(label), _) => label,
            (None, Driver::Frames { .. }) => "root",
            (None, Driver::Parent { .. }) => "child",
        }
    }

    fn category(&self, phase: Phase) -> &CallbackSet {
        match phase {
            Phase::Before => &self.before,
            Phase::Main => &self.main,
            Phase::After => &self.after,
            Phase::Base => &self.base,
        }
    }

    fn category_mut(&mut self, phase: Phase) -> &mut CallbackSet {
        match phase {
            Phase::Before => &mut self.before,
            Phase::Main => &mut self.main,
            Phase::After => &mut self.after,
            Phase::Base => &mut self.base,
        }
    }

    /// `base` alone never fires, so it never keeps a loop driving either.
    fn has_animation_fns(&self) -> bool {
        !self.before.is_empty() || !self.main.is_empty() || !self.after.is_empty()
    }

    fn parent(&self) -> Option<InnerRef> {
        match &self.driver {
            Driver::Parent { parent } => parent.as_ref().and_then(Weak::upgrade),
            Driver::Frames { .. } => None,
        }
    }

    fn is_child(&self) -> bool {
        matches!(self.driver, Driver::Parent { .. })
    }

    fn child_tick(&mut self) -> FrameFn {
        if let Some(tick) = &self.child_tick {
            return tick.clone();
        }
        let this = self.this.clone();
        let tick = FrameFn::new(move |dt, _parent_elapsed| match this.upgrade() {
            Some(inner) => {
                AnimationLoop::tick(&inner, dt);
                Flow::Continue
            }
            None => Flow::Remove,
        });
        self.child_tick = Some(tick.clone());
        tick
    }

    fn plan_acquire(&mut self) -> Option<Acquire> {
        if let Some(parent) = self.parent() {
            let tick = self.child_tick();
            return Some(Acquire::Parent { parent, tick });
        }
        match &self.driver {
            Driver::Frames { frames, .. } => {
                let frames = Rc::clone(frames);
                self.generation += 1;
                Some(Acquire::Frame {
                    frames,
                    generation: self.generation,
                })
            }
            Driver::Parent { .. } => None,
        }
    }

    fn collect_batch(&self, dt: f64, elapsed: f64) -> TickBatch {
        let gate_open = self.has_animation_fns();
        let phases = Phase::ALL
            .iter()
            .filter(|phase| **phase != Phase::Base || gate_open)
            .filter_map(|phase| {
                let set = self.category(*phase);
                (!set.is_empty()).then(|| (*phase, set.snapshot()))
            })
            .collect();
        TickBatch {
            dt,
            elapsed,
            phases,
        }
    }
}

impl Acquire {
    fn execute(self, owner: &WeakInner) -> DriveHandle {
        match self {
            Acquire::Frame { frames, generation } => {
                let owner = owner.clone();
                let registration = FrameRegistration::request(&frames, move || {
                    AnimationLoop::frame_fired(&owner, generation);
                });
                if let Some(id) = registration.id() {
                    log::trace!("requested {} (generation {})", id, generation);
                }
                DriveHandle::Frame(registration)
            }
            Acquire::Parent { parent, tick } => {
                AnimationLoop::from_inner(Rc::clone(&parent)).add_fn(Phase::Main, tick.clone());
                DriveHandle::Parent {
                    parent: Rc::downgrade(&parent),
                    tick,
                }
            }
        }
    }
}

impl DriveHandle {
    fn release(self) {
        match self {
            DriveHandle::Frame(registration) => registration.cancel(),
            DriveHandle::Parent { parent, tick } => {
                if let Some(parent) = parent.upgrade() {
                    AnimationLoop::from_inner(parent).remove_fn(Phase::Main, &tick);
                }
            }
        }
    }
}

/// Handle to a frame-driven callback scheduler.
///
/// Cloning the handle shares the loop. Dropping the last handle of a
/// root-driven loop cancels its pending frame request; a dropped child simply
/// unregisters itself from its parent on the parent's next tick.
#[derive(Clone)]
pub struct AnimationLoop {
    inner: InnerRef,
}

impl AnimationLoop {
    /// Creates a root-driven loop with default settings.
    pub fn new(frames: Rc<dyn FrameSource>, clock: impl TimeSource + 'static) -> Self {
        Self::with_settings(frames, clock, LoopSettings::default())
    }

    /// Creates a root-driven loop.
    pub fn with_settings(
        frames: Rc<dyn FrameSource>,
        clock: impl TimeSource + 'static,
        settings: LoopSettings,
    ) -> Self {
        let driver = Driver::Frames {
            frames,
            clock: Box::new(clock),
        };
        Self::build(driver, settings)
    }

    /// Creates a child-mode loop that has no parent yet.
    ///
    /// It cannot start until attached with [`adopt_child`](Self::adopt_child).
    pub fn detached_child(settings: LoopSettings) -> Self {
        Self::build(Driver::Parent { parent: None }, settings)
    }

    fn build(driver: Driver, settings: LoopSettings) -> Self {
        let inner = Rc::new_cyclic(|this: &WeakInner| {
            RefCell::new(LoopInner::new(this.clone(), driver, settings))
        });
        Self { inner }
    }

    fn from_inner(inner: InnerRef) -> Self {
        Self { inner }
    }

    // ========== Accessors ==========

    /// Accumulated seconds since the last `stop()`.
    pub fn elapsed(&self) -> f64 {
        self.inner.borrow().elapsed
    }

    pub fn state(&self) -> LoopState {
        self.inner.borrow().state
    }

    /// `true` unless stopped. A paused loop is still started.
    pub fn is_started(&self) -> bool {
        self.state() != LoopState::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state() == LoopState::Paused
    }

    /// Started and not paused.
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Whether the loop currently holds a frame request or parent registration.
    pub fn is_ticking(&self) -> bool {
        self.inner.borrow().driving
    }

    pub fn interval(&self) -> Option<f64> {
        self.inner.borrow().throttle.interval()
    }

    /// Sets the throttle interval in seconds; `None` fires on every frame.
    ///
    /// Invalid intervals (non-positive or non-finite) unthrottle the loop.
    pub fn set_interval(&self, interval: Option<f64>) {
        let mut inner = self.inner.borrow_mut();
        let elapsed = inner.elapsed;
        if !inner.throttle.set_interval(interval, elapsed) {
            log::warn!(
                "ignoring invalid interval {:?} for loop {}",
                interval,
                inner.name()
            );
        }
    }

    pub fn label(&self) -> Option<String> {
        self.inner.borrow().label.clone()
    }

    /// Whether any `before`, `main` or `after` callback is registered.
    pub fn has_animation_fns(&self) -> bool {
        self.inner.borrow().has_animation_fns()
    }

    /// Number of callbacks registered in `phase`.
    pub fn callback_count(&self, phase: Phase) -> usize {
        self.inner.borrow().category(phase).len()
    }

    pub fn contains_fn(&self, phase: Phase, callback: &FrameFn) -> bool {
        self.inner.borrow().category(phase).contains(callback)
    }

    pub fn is_child(&self) -> bool {
        self.inner.borrow().is_child()
    }

    pub fn parent(&self) -> Option<AnimationLoop> {
        self.inner.borrow().parent().map(Self::from_inner)
    }

    /// Live child loops, in attachment order.
    pub fn children(&self) -> Vec<AnimationLoop> {
        self.inner
            .borrow()
            .children
            .iter()
            .filter_map(Weak::upgrade)
            .map(Self::from_inner)
            .collect()
    }

    pub fn ptr_eq(&self, other: &AnimationLoop) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========== Callback Registration ==========

    /// Registers `callback` in `phase` and returns it for later removal.
    ///
    /// Adding to a running loop that went dormant resumes driving. Adding to
    /// a stopped or paused loop only registers the callback.
    pub fn add_fn(&self, phase: Phase, callback: FrameFn) -> FrameFn {
        let resume = {
            let mut inner = self.inner.borrow_mut();
            inner.category_mut(phase).insert(callback.clone());
            inner.state == LoopState::Running
        };
        if resume {
            Self::start_driving(&self.inner);
        }
        callback
    }

    /// Unregisters `callback` from `phase`. Unknown callbacks are ignored.
    pub fn remove_fn(&self, phase: Phase, callback: &FrameFn) {
        Self::remove_from(&self.inner, phase, callback);
    }

    pub fn add_animation_fn_before(&self, callback: FrameFn) -> FrameFn {
        self.add_fn(Phase::Before, callback)
    }

    pub fn remove_animation_fn_before(&self, callback: &FrameFn) {
        self.remove_fn(Phase::Before, callback);
    }

    pub fn add_animation_fn(&self, callback: FrameFn) -> FrameFn {
        self.add_fn(Phase::Main, callback)
    }

    pub fn remove_animation_fn(&self, callback: &FrameFn) {
        self.remove_fn(Phase::Main, callback);
    }

    pub fn add_animation_fn_after(&self, callback: FrameFn) -> FrameFn {
        self.add_fn(Phase::After, callback)
    }

    pub fn remove_animation_fn_after(&self, callback: &FrameFn) {
        self.remove_fn(Phase::After, callback);
    }

    /// Registers a gated callback that only fires on ticks where some
    /// `before`, `main` or `after` callback exists.
    pub fn add_base_fn(&self, callback: FrameFn) -> FrameFn {
        self.add_fn(Phase::Base, callback)
    }

    pub fn remove_base_fn(&self, callback: &FrameFn) {
        self.remove_fn(Phase::Base, callback);
    }

    /// Guarantees one more tick, so `base` callbacks fire at least once even
    /// when nothing else is registered. Repeated calls before that tick are
    /// no-ops.
    pub fn force_tick(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.forced_tick {
                return;
            }
            inner.forced_tick = true;
        }
        let this = Rc::downgrade(&self.inner);
        self.add_animation_fn(FrameFn::new(move |_, _| {
            if let Some(inner) = this.upgrade() {
                inner.borrow_mut().forced_tick = false;
            }
            Flow::Remove
        }));
    }

    // ========== Lifecycle ==========

    /// Moves the loop to [`LoopState::Running`] and begins driving.
    ///
    /// Starting a running loop does nothing. Resuming a paused loop keeps its
    /// elapsed time. A child loop without a parent is rejected and stays
    /// stopped.
    pub fn start(&self) -> Result<(), LoopError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == LoopState::Running {
                return Ok(());
            }
            if inner.is_child() && inner.parent().is_none() {
                return Err(LoopError::InvalidLifecycleOperation(
                    "child loop has no parent to drive it",
                ));
            }
            let previous = inner.state;
            inner.state = LoopState::Running;
            if let Driver::Frames { clock, .. } = &mut inner.driver {
                clock.start();
            }
            log::debug!("loop {} {:?} -> Running", inner.name(), previous);
        }
        Self::start_driving(&self.inner);
        Ok(())
    }

    /// Returns the loop to [`LoopState::Stopped`], resetting elapsed time and
    /// releasing its frame registration before returning.
    pub fn stop(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == LoopState::Stopped {
                return;
            }
            inner.state = LoopState::Stopped;
            inner.elapsed = 0.0;
            inner.throttle.reset();
            if let Driver::Frames { clock, .. } = &mut inner.driver {
                clock.stop();
            }
            log::debug!("loop {} stopped", inner.name());
        }
        Self::stop_driving(&self.inner);
    }

    /// Freezes a running loop, keeping elapsed time and callbacks.
    pub fn pause(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state != LoopState::Running {
                return;
            }
            inner.state = LoopState::Paused;
            if let Driver::Frames { clock, .. } = &mut inner.driver {
                clock.stop();
            }
            log::debug!("loop {} paused at {:.4}s", inner.name(), inner.elapsed);
        }
        Self::stop_driving(&self.inner);
    }

    /// Clears every callback and detaches the loop from its parent.
    ///
    /// The handle stays valid; a disposed child can be adopted again.
    pub fn dispose(&self) {
        match self.parent() {
            Some(parent) => parent.remove_child_loop(self),
            None => self.stop(),
        }
        let mut inner = self.inner.borrow_mut();
        for phase in Phase::ALL {
            inner.category_mut(phase).clear();
        }
        inner.forced_tick = false;
    }

    // ========== Composition ==========

    /// Creates a child loop driven by this loop.
    pub fn add_child_loop(&self) -> AnimationLoop {
        self.add_child_loop_with(LoopSettings::default())
    }

    pub fn add_child_loop_with(&self, settings: LoopSettings) -> AnimationLoop {
        let child = Self::detached_child(settings);
        self.attach(&child);
        child
    }

    /// Attaches an existing child-mode loop, detaching it from any previous
    /// parent first (which stops it). A child whose parent was dropped is
    /// stopped as well.
    pub fn adopt_child(&self, child: &AnimationLoop) -> Result<(), LoopError> {
        if !child.is_child() {
            return Err(LoopError::InvalidAttachment(
                "root-driven loops cannot be driven by a parent",
            ));
        }
        if self.ptr_eq(child) || self.has_ancestor(child) {
            return Err(LoopError::InvalidAttachment(
                "attaching the loop would create a cycle",
            ));
        }
        match child.parent() {
            Some(current) if current.ptr_eq(self) => return Ok(()),
            Some(current) => current.remove_child_loop(child),
            // A dropped parent can leave the child running with a dead
            // registration; stopping releases it.
            None => child.stop(),
        }
        self.attach(child);
        Ok(())
    }

    /// Stops `child` and clears its parent link. Loops that are not children
    /// of this loop are ignored.
    pub fn remove_child_loop(&self, child: &AnimationLoop) {
        if !child.parent().is_some_and(|parent| parent.ptr_eq(self)) {
            return;
        }
        child.stop();
        if let Driver::Parent { parent } = &mut child.inner.borrow_mut().driver {
            *parent = None;
        }
        let mut inner = self.inner.borrow_mut();
        inner.children.retain(|entry| {
            entry
                .upgrade()
                .is_some_and(|live| !Rc::ptr_eq(&live, &child.inner))
        });
        log::debug!("loop {} detached a child", inner.name());
    }

    fn attach(&self, child: &AnimationLoop) {
        if let Driver::Parent { parent } = &mut child.inner.borrow_mut().driver {
            *parent = Some(Rc::downgrade(&self.inner));
        }
        let mut inner = self.inner.borrow_mut();
        inner.children.retain(|entry| entry.strong_count() > 0);
        inner.children.push(Rc::downgrade(&child.inner));
        log::debug!("loop {} adopted a child", inner.name());
    }

    fn has_ancestor(&self, candidate: &AnimationLoop) -> bool {
        let mut cursor = self.parent();
        while let Some(current) = cursor {
            if current.ptr_eq(candidate) {
                return true;
            }
            cursor = current.parent();
        }
        false
    }

    // ========== Driving ==========

    fn start_driving(this: &InnerRef) {
        {
            let mut inner = this.borrow_mut();
            if inner.driving || !inner.has_animation_fns() {
                return;
            }
            inner.driving = true;
        }
        Self::acquire(this);
    }

    fn stop_driving(this: &InnerRef) {
        let handle = {
            let mut inner = this.borrow_mut();
            inner.driving = false;
            inner.pending.take()
        };
        if let Some(handle) = handle {
            handle.release();
        }
    }

    fn acquire(this: &InnerRef) {
        let plan = {
            let mut inner = this.borrow_mut();
            let plan = inner.plan_acquire();
            if plan.is_none() {
                inner.driving = false;
            }
            plan
        };
        let Some(plan) = plan else {
            return;
        };
        let handle = plan.execute(&Rc::downgrade(this));
        let leftover = {
            let mut inner = this.borrow_mut();
            if inner.driving && inner.pending.is_none() {
                log::trace!("loop {} acquired its driver", inner.name());
                inner.pending = Some(handle);
                None
            } else {
                Some(handle)
            }
        };
        if let Some(handle) = leftover {
            handle.release();
        }
    }

    fn remove_from(this: &InnerRef, phase: Phase, callback: &FrameFn) {
        let dormant = {
            let mut inner = this.borrow_mut();
            inner.category_mut(phase).remove(callback)
                && inner.driving
                && !inner.has_animation_fns()
        };
        if dormant {
            Self::stop_driving(this);
        }
    }

    // ========== Ticking ==========

    fn frame_fired(owner: &WeakInner, generation: u64) {
        let Some(this) = owner.upgrade() else {
            return;
        };
        let dt = {
            let mut inner = this.borrow_mut();
            let current = inner.generation == generation
                && matches!(inner.pending, Some(DriveHandle::Frame(_)));
            if !current {
                log::trace!("loop {} ignored a stale frame", inner.name());
                return;
            }
            if let Some(DriveHandle::Frame(registration)) = inner.pending.take() {
                registration.complete();
            }
            match &mut inner.driver {
                Driver::Frames { clock, .. } => clock.delta().max(0.0),
                Driver::Parent { .. } => 0.0,
            }
        };
        Self::tick(&this, dt);
    }

    fn tick(this: &InnerRef, dt: f64) {
        let batch = {
            let mut inner = this.borrow_mut();
            if inner.state != LoopState::Running || !inner.driving {
                return;
            }
            inner.elapsed += dt;
            let elapsed = inner.elapsed;
            let batch = inner
                .throttle
                .admit(elapsed, dt)
                .map(|effective| inner.collect_batch(effective, elapsed));
            log::trace!(
                "loop {} tick dt={:.4} elapsed={:.4} fire={}",
                inner.name(),
                dt,
                elapsed,
                batch.is_some()
            );
            batch
        };

        if let Some(batch) = batch {
            Self::fire(this, batch);
        }

        let next = {
            let inner = this.borrow();
            if !inner.driving {
                AfterTick::Idle
            } else if !inner.has_animation_fns() {
                AfterTick::Dormant
            } else if matches!(inner.driver, Driver::Frames { .. })
                && inner.pending.is_none()
                && inner.state == LoopState::Running
            {
                AfterTick::Renew
            } else {
                AfterTick::Idle
            }
        };
        match next {
            AfterTick::Idle => {}
            AfterTick::Dormant => {
                log::trace!("loop {} went dormant", this.borrow().name());
                Self::stop_driving(this);
            }
            AfterTick::Renew => Self::acquire(this),
        }
    }

    fn fire(this: &InnerRef, batch: TickBatch) {
        let TickBatch {
            dt,
            elapsed,
            phases,
        } = batch;
        for (phase, snapshot) in phases {
            for callback in snapshot {
                if this.borrow().state != LoopState::Running {
                    return;
                }
                if callback.call(dt, elapsed) == Flow::Remove {
                    Self::remove_from(this, phase, &callback);
                }
            }
        }
    }
}

impl fmt::Debug for AnimationLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("AnimationLoop")
                .field("name", &inner.name())
                .field("state", &inner.state)
                .field("elapsed", &inner.elapsed)
                .field("interval", &inner.throttle.interval())
                .field("ticking", &inner.driving)
                .field("children", &inner.children.len())
                .finish(),
            Err(_) => f.write_str("AnimationLoop { <borrowed> }"),
        }
    }
}
