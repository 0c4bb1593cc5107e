// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless scene run that exercises the whole runtime.
//!
//! Builds a small scene (a player sprite steered by input actions and a
//! spawner emitting short-lived sparks), drives the [`MainLoop`] with a
//! [`ManualClock`] for a few simulated seconds, prints every trace event
//! through a [`PrettyPrintSink`], and exports the recording as a Chrome trace
//! JSON file (first argument, default `scene_trace.json`).

mod logger;

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Rect, Size, Vec2};
use log::LevelFilter;
use subduction_core::clock::ManualClock;
use subduction_core::geometry::{Color, Transform2d};
use subduction_core::time::{Duration, Timebase};
use subduction_core::trace::{
    EventsDrainedEvent, FlushEvent, RenderPassEvent, StepBeginEvent, StepEndEvent, TraceSink,
};
use subduction_core::uid::Uid;
use subduction_debug::chrome;
use subduction_debug::pretty::PrettyPrintSink;
use subduction_debug::recorder::RecorderSink;
use subduction_render::{DrawCall, Flip, RecordingBackend};
use subduction_scene::{
    ActionMap, Behavior, Binding, ConnectFlags, HeadlessSurface, LoopConfig, MainLoop,
    NodeContext, PlatformEvent, SceneTree, Value,
};

use crate::logger::StderrLogger;

const PLAYER_TEXTURE: &str = "sprites/player.png";
const KEY_LEFT: u32 = 263;
const KEY_RIGHT: u32 = 262;
/// Simulated host step, 120 Hz.
const STEP_NS: u64 = 8_333_333;
const STEP_COUNT: u64 = 360;
const PLAYER_SPEED: f64 = 90.0;
const SPAWN_INTERVAL: f64 = 0.25;
const SPARK_LIFETIME: f64 = 0.6;

// ---------------------------------------------------------------------------
// Behaviors
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Player {
    texture: Option<Uid>,
}

impl Behavior for Player {
    fn ready(&mut self, ctx: &mut NodeContext<'_>) {
        self.texture = ctx.tree.renderer_mut().load_texture_from_path(PLAYER_TEXTURE);
        if self.texture.is_none() {
            log::warn!("{PLAYER_TEXTURE} missing, drawing a placeholder");
        }
        ctx.tree.set_position(ctx.id, Vec2::new(32.0, 90.0));
    }

    fn process(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        let input = ctx.tree.input();
        let axis = input.action_strength("move_right") - input.action_strength("move_left");
        if axis.abs() < f32::EPSILON {
            return;
        }
        let mut transform = ctx.tree.transform(ctx.id);
        transform.origin.x += f64::from(axis) * PLAYER_SPEED * delta;
        ctx.tree.set_transform(ctx.id, transform);
    }

    fn draw(&mut self, ctx: &mut NodeContext<'_>) {
        match self.texture {
            Some(texture) => {
                ctx.draw_texture(texture, Flip::None, Color::WHITE, Transform2d::IDENTITY);
            }
            None => {
                ctx.draw_rect(Rect::new(0.0, 0.0, 16.0, 16.0), Color::WHITE, true);
            }
        }
    }
}

#[derive(Default)]
struct Spawner {
    timer: f64,
    spawned: u32,
}

impl Behavior for Spawner {
    fn process(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        self.timer += delta;
        if self.timer < SPAWN_INTERVAL {
            return;
        }
        self.timer -= SPAWN_INTERVAL;
        self.spawned += 1;

        let tree = &mut *ctx.tree;
        let spark = tree.create_canvas_node("spark");
        tree.set_behavior(spark, Spark {
            life: SPARK_LIFETIME,
        });
        tree.set_position(spark, Vec2::new(160.0, 20.0 + 8.0 * f64::from(self.spawned % 16)));
        tree.set_z_index(spark, 1);
        tree.add_child(ctx.id, spark);
        tree.emit(ctx.id, "spawned", &[Value::Node(spark), Value::Int(i64::from(self.spawned))]);
    }
}

struct Spark {
    life: f64,
}

impl Behavior for Spark {
    fn process(&mut self, ctx: &mut NodeContext<'_>, delta: f64) {
        self.life -= delta;
        if self.life <= 0.0 {
            ctx.queue_free();
            return;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "alpha only needs f32 precision"
        )]
        let alpha = (self.life / SPARK_LIFETIME) as f32;
        ctx.tree
            .set_modulate(ctx.id, Color::rgba(1.0, 0.8, 0.2, alpha));
    }

    fn draw(&mut self, ctx: &mut NodeContext<'_>) {
        ctx.draw_rect(Rect::new(-2.0, -2.0, 2.0, 2.0), Color::WHITE, true);
    }
}

// ---------------------------------------------------------------------------
// Trace fan-out
// ---------------------------------------------------------------------------

/// Prints every event and records it for the Chrome export.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Tee {
    fn on_events_drained(&mut self, e: &EventsDrainedEvent) {
        self.pretty.on_events_drained(e);
        self.recorder.borrow_mut().on_events_drained(e);
    }

    fn on_step_begin(&mut self, e: &StepBeginEvent) {
        self.pretty.on_step_begin(e);
        self.recorder.borrow_mut().on_step_begin(e);
    }

    fn on_step_end(&mut self, e: &StepEndEvent) {
        self.pretty.on_step_end(e);
        self.recorder.borrow_mut().on_step_end(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.pretty.on_flush(e);
        self.recorder.borrow_mut().on_flush(e);
    }

    fn on_render_pass(&mut self, e: &RenderPassEvent) {
        self.pretty.on_render_pass(e);
        self.recorder.borrow_mut().on_render_pass(e);
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

fn build_scene(tree: &mut SceneTree, sparks_seen: Rc<Cell<u32>>) {
    let root = tree.root();

    let player = tree.create_canvas_node("player");
    tree.set_behavior(player, Player::default());
    tree.add_child(root, player);

    let spawner = tree.create_node("spawner");
    tree.set_behavior(spawner, Spawner::default());
    tree.add_child(root, spawner);

    tree.connect(
        spawner,
        "spawned",
        |_tree: &mut SceneTree, _args: &[Value]| log::info!("first spark spawned"),
        ConnectFlags::ONE_SHOT,
    );
    tree.connect(
        spawner,
        "spawned",
        move |tree: &mut SceneTree, args: &[Value]| {
            sparks_seen.set(sparks_seen.get() + 1);
            if let Some(Value::Node(spark)) = args.first() {
                log::debug!("spark at {:?}", tree.path(*spark));
            }
        },
        ConnectFlags::DEFERRED,
    );
}

fn main() {
    if let Err(err) = StderrLogger::init(LevelFilter::Info) {
        eprintln!("logger unavailable: {err}");
    }
    let trace_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "scene_trace.json".to_owned());
    let timebase = Timebase::NANOS;

    // -- platform ----------------------------------------------------------
    let backend = RecordingBackend::new().with_texture(PLAYER_TEXTURE, 16, 16);
    let clock = ManualClock::new();
    let surface = HeadlessSurface::new(Size::new(320.0, 180.0));

    let mut main = MainLoop::new(
        LoopConfig::desktop(),
        surface.clone(),
        backend.clone(),
        clock.clone(),
    );
    main.set_input_decoder(
        ActionMap::new()
            .bind(Binding::Key(KEY_LEFT), "move_left")
            .bind(Binding::Key(KEY_RIGHT), "move_right"),
    );

    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    main.set_trace_sink(Box::new(Tee {
        pretty: PrettyPrintSink::stderr(timebase),
        recorder: Rc::clone(&recorder),
    }));

    // -- scene -------------------------------------------------------------
    let sparks_seen = Rc::new(Cell::new(0));
    build_scene(main.tree_mut(), Rc::clone(&sparks_seen));

    // -- simulated loop ----------------------------------------------------
    if !main.begin() {
        log::error!("main loop failed to start: {:?}", main.state());
        return;
    }
    let step = Duration::from_nanos(STEP_NS, timebase);
    let (mut draws, mut presents) = (0_usize, 0_usize);
    for i in 0..STEP_COUNT {
        match i {
            30 => surface.push_event(key(KEY_RIGHT, true)),
            150 => surface.push_event(key(KEY_RIGHT, false)),
            180 => surface.push_event(key(KEY_LEFT, true)),
            240 => surface.push_event(key(KEY_LEFT, false)),
            _ => {}
        }
        clock.advance(step);
        main.iterate();
        for call in backend.take_calls() {
            match call {
                DrawCall::Present => presents += 1,
                call if call.is_draw() => draws += 1,
                _ => {}
            }
        }
    }
    surface.push_event(PlatformEvent::Quit);
    clock.advance(step);
    main.iterate();

    log::info!(
        "{} iterations, {} sparks, {} draws over {} presents, {} nodes alive",
        main.iteration(),
        sparks_seen.get(),
        draws,
        presents,
        main.tree().node_count(),
    );

    // -- export ------------------------------------------------------------
    main.take_trace_sink();
    let result = File::create(&trace_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        chrome::export(recorder.borrow().as_bytes(), timebase, &mut writer)
    });
    match result {
        Ok(()) => log::info!("trace written to {trace_path}"),
        Err(err) => log::error!("trace export failed: {err}"),
    }
}

fn key(code: u32, pressed: bool) -> PlatformEvent {
    PlatformEvent::Key {
        code,
        pressed,
        repeat: false,
    }
}
