// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cooperative frame loop.
//!
//! [`MainLoop`] owns the surface, the scene tree (and through it the
//! renderer), the input decoder, an optional physics bridge, and a clock.
//! Each call to [`MainLoop::iterate`] does the following:
//!
//! 1. Drain surface events, unless events are paused. `Quit` stops the loop.
//!    `Resized` updates the renderer viewport. Everything else is decoded.
//!    Events that map to an action update the tree's
//!    [`InputState`](crate::InputState) and are propagated from the root as
//!    [`Notification::Input`].
//! 2. Unless the loop is paused, check the render, process, and physics
//!    cadences in that order and run the sub-step of each one that is due:
//!    - **render**: propagate `Render`, then run the renderer pass;
//!    - **process**: propagate `Process`, then flush the deferred queue;
//!    - **physics** (only with a bridge): step the bridge, then propagate
//!      `PhysicsProcess`.
//! 3. Stop if a node called [`SceneTree::quit`].
//!
//! [`MainLoop::start`] repeats `iterate` until the loop stops, yielding the
//! thread between iterations. Tests and embedders that own their own outer
//! loop call [`MainLoop::begin`] once and then `iterate` directly.

use kurbo::Size;
use subduction_core::clock::Clock;
use subduction_core::trace::{
    CadenceKind, EventsDrainedEvent, FlushEvent, RenderPassEvent, StepBeginEvent, StepEndEvent,
    TraceSink, Tracer,
};
use subduction_render::{GraphicsBackend, Renderer};

use crate::cadence::Cadence;
use crate::config::LoopConfig;
use crate::input::{ActionMap, InputDecoder, PlatformEvent};
use crate::notification::Notification;
use crate::platform::{PhysicsBridge, Surface, SurfaceError};
use crate::tree::SceneTree;

/// Lifecycle state of a [`MainLoop`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not started.
    Idle,
    /// Iterating.
    Running,
    /// Stopped by `Quit`, [`SceneTree::quit`], or [`MainLoop::stop`].
    Stopped,
    /// The surface could not be created. Starting is a permanent no-op.
    Failed(SurfaceError),
}

/// The frame scheduler.
pub struct MainLoop {
    config: LoopConfig,
    state: LoopState,
    surface: Box<dyn Surface>,
    tree: SceneTree,
    decoder: Box<dyn InputDecoder>,
    physics: Option<Box<dyn PhysicsBridge>>,
    clock: Box<dyn Clock>,
    cadences: [Cadence; 3],
    paused: bool,
    events_paused: bool,
    iteration: u64,
    trace_sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MainLoop")
            .field("state", &self.state)
            .field("cadences", &self.cadences)
            .field("paused", &self.paused)
            .field("events_paused", &self.events_paused)
            .field("iteration", &self.iteration)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

fn tracer(sink: &mut Option<Box<dyn TraceSink>>) -> Tracer<'_> {
    match sink.as_deref_mut() {
        Some(s) => Tracer::new(s),
        None => Tracer::none(),
    }
}

impl MainLoop {
    /// Creates the surface, then the renderer and scene tree.
    ///
    /// A surface failure is logged and recorded as [`LoopState::Failed`];
    /// the loop is still constructed so its tree can be inspected.
    pub fn new<S, B, C>(config: LoopConfig, surface: S, backend: B, clock: C) -> Self
    where
        S: Surface + 'static,
        B: GraphicsBackend + 'static,
        C: Clock + 'static,
    {
        let mut surface: Box<dyn Surface> = Box::new(surface);
        let state = match surface.create() {
            Ok(()) => LoopState::Idle,
            Err(err) => {
                log::error!("{err}");
                LoopState::Failed(err)
            }
        };

        let mut renderer = Renderer::new(Box::new(backend));
        renderer.set_viewport_size(surface.size());
        renderer.set_clear_color(config.clear_color);

        let mut cadences = CadenceKind::ALL.map(|kind| Cadence::new(kind, config.cadence(kind)));
        if config.follow_refresh_rate
            && let Some(hz) = surface.refresh_rate().filter(|hz| *hz > 0.0)
        {
            cadences[CadenceKind::Render.index()].set_frame_rate(hz);
        }

        Self {
            config,
            state,
            surface,
            tree: SceneTree::new(renderer),
            decoder: Box::new(ActionMap::new()),
            physics: None,
            clock: Box::new(clock),
            cadences,
            paused: false,
            events_paused: false,
            iteration: 0,
            trace_sink: None,
        }
    }

    // -- Lifecycle --

    /// Marks the loop running and restarts every cadence's interval at the
    /// current time. Returns `false` if the loop failed or is already
    /// running.
    pub fn begin(&mut self) -> bool {
        if matches!(self.state, LoopState::Failed(_) | LoopState::Running) {
            return false;
        }
        let now = self.clock.now();
        for cadence in &mut self.cadences {
            cadence.stamp(now);
        }
        self.state = LoopState::Running;
        log::info!("main loop started");
        true
    }

    /// Runs until the loop stops. No-op if the loop failed or is already
    /// running.
    pub fn start(&mut self) {
        if !self.begin() {
            return;
        }
        while self.is_running() {
            self.iterate();
            std::thread::yield_now();
        }
    }

    /// Stops the loop after the current iteration. Idempotent.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.state = LoopState::Stopped;
            log::info!("main loop stopped after {} iterations", self.iteration);
        }
    }

    /// Runs one iteration. No-op unless the loop is running.
    pub fn iterate(&mut self) {
        if !self.is_running() {
            return;
        }
        self.iteration += 1;
        if !self.events_paused {
            self.drain_events();
        }
        if !self.is_running() {
            return;
        }
        if !self.paused {
            for kind in CadenceKind::ALL {
                self.step(kind);
            }
        }
        if self.tree.is_quit_requested() {
            self.tree.clear_quit_request();
            self.stop();
        }
    }

    fn drain_events(&mut self) {
        let mut platform_events = 0_u32;
        let mut action_events = 0_u32;
        while let Some(event) = self.surface.poll_event() {
            platform_events += 1;
            match event {
                PlatformEvent::Quit => {
                    self.stop();
                    break;
                }
                PlatformEvent::Resized { width, height } => {
                    let size = Size::new(f64::from(width), f64::from(height));
                    self.tree.renderer_mut().set_viewport_size(size);
                }
                other => {
                    let Some(input) = self.decoder.decode(&other) else {
                        continue;
                    };
                    for action in self.decoder.actions(&input) {
                        action_events += 1;
                        self.tree.input_mut().apply(&action);
                        let root = self.tree.root();
                        self.tree
                            .propagate_notification(root, &Notification::Input(action));
                    }
                }
            }
        }
        let timestamp = self.clock.now();
        tracer(&mut self.trace_sink).events_drained(&EventsDrainedEvent {
            iteration: self.iteration,
            timestamp,
            platform_events,
            action_events,
        });
    }

    fn step(&mut self, kind: CadenceKind) {
        if kind == CadenceKind::Physics && self.physics.is_none() {
            return;
        }
        let now = self.clock.now();
        let timebase = self.clock.timebase();
        let cadence = &mut self.cadences[kind.index()];
        let step_index = cadence.step_count();
        let Some(elapsed) = cadence.try_step(now, timebase) else {
            return;
        };
        let delta = cadence.delta();
        self.tree.set_delta(kind, delta);

        tracer(&mut self.trace_sink).step_begin(&StepBeginEvent {
            cadence: kind,
            step_index,
            timestamp: now,
        });

        let root = self.tree.root();
        match kind {
            CadenceKind::Render => {
                self.tree.propagate_notification(root, &Notification::Render);
                let stats = self.tree.renderer_mut().render();
                tracer(&mut self.trace_sink).render_pass(&RenderPassEvent {
                    step_index,
                    items_visited: stats.items_visited,
                    items_skipped: stats.items_skipped,
                    draws_issued: stats.draws_issued,
                    draws_culled: stats.draws_culled,
                });
            }
            CadenceKind::Process => {
                self.tree
                    .propagate_notification(root, &Notification::Process);
                let stats = self.tree.flush_deferred();
                let timestamp = self.clock.now();
                tracer(&mut self.trace_sink).flush(&FlushEvent {
                    step_index,
                    timestamp,
                    actions_run: stats.actions_run,
                    nodes_freed: stats.nodes_freed,
                });
            }
            CadenceKind::Physics => {
                if let Some(bridge) = self.physics.as_mut() {
                    bridge.step(delta);
                }
                self.tree
                    .propagate_notification(root, &Notification::PhysicsProcess);
            }
        }

        let timestamp = self.clock.now();
        tracer(&mut self.trace_sink).step_end(&StepEndEvent {
            cadence: kind,
            step_index,
            timestamp,
            elapsed,
        });
    }

    // -- Settings --

    /// Sets a cadence's target steps per second.
    pub fn set_frame_rate(&mut self, kind: CadenceKind, frame_rate: f64) {
        self.cadences[kind.index()].set_frame_rate(frame_rate);
    }

    /// Sets a cadence's delta multiplier.
    pub fn set_time_scale(&mut self, kind: CadenceKind, time_scale: f64) {
        self.cadences[kind.index()].set_time_scale(time_scale);
    }

    /// Sets a cadence's interval multiplier.
    pub fn set_speed_scale(&mut self, kind: CadenceKind, speed_scale: f64) {
        self.cadences[kind.index()].set_speed_scale(speed_scale);
    }

    /// Pauses or resumes one cadence.
    pub fn set_cadence_paused(&mut self, kind: CadenceKind, paused: bool) {
        self.cadences[kind.index()].set_paused(paused);
    }

    /// Pauses or resumes every cadence. Events are still drained.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Stops or resumes draining surface events.
    pub fn set_events_paused(&mut self, paused: bool) {
        self.events_paused = paused;
    }

    /// Installs the physics bridge, enabling the physics cadence.
    pub fn set_physics<P: PhysicsBridge + 'static>(&mut self, bridge: P) {
        self.physics = Some(Box::new(bridge));
    }

    /// Replaces the input decoder.
    pub fn set_input_decoder<D: InputDecoder + 'static>(&mut self, decoder: D) {
        self.decoder = Box::new(decoder);
    }

    /// Installs a trace sink. Events reach it only with the `trace` feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace_sink = Some(sink);
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace_sink.take()
    }

    // -- Accessors --

    /// Returns the configuration the loop was built with.
    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Returns `true` while iterating.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running)
    }

    /// Returns `true` if every cadence is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Iterations run so far.
    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Returns one cadence's state.
    #[must_use]
    pub fn cadence(&self, kind: CadenceKind) -> &Cadence {
        &self.cadences[kind.index()]
    }

    /// Returns the scene tree.
    #[must_use]
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Returns the scene tree mutably.
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }
}
