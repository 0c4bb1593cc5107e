// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input decoding and the action model.
//!
//! Platform events arrive from the [`Surface`](crate::Surface) as
//! [`PlatformEvent`]s. An [`InputDecoder`] turns each one into a typed
//! [`InputEvent`] and, if it is bound to named actions, into
//! [`ActionEvent`]s with a pressed flag and an analog strength in `0.0..=1.0`.
//! The frame loop records action events in the tree's [`InputState`] and
//! propagates them as [`Notification::Input`](crate::Notification::Input).
//!
//! [`ActionMap`] is the stock decoder: a list of bindings from keys, mouse
//! buttons, gamepad buttons, or gamepad axis directions to action names.

use std::collections::BTreeMap;

use kurbo::Point;

/// A raw event reported by the surface.
#[derive(Clone, Debug, PartialEq)]
pub enum PlatformEvent {
    /// The user asked to close the application.
    Quit,
    /// The drawable area changed size.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// A keyboard key changed state.
    Key {
        /// Platform key code.
        code: u32,
        /// `true` on press, `false` on release.
        pressed: bool,
        /// `true` for auto-repeat presses.
        repeat: bool,
    },
    /// A mouse button changed state.
    MouseButton {
        /// Button index.
        button: u8,
        /// `true` on press.
        pressed: bool,
        /// Cursor position in surface pixels.
        position: Point,
    },
    /// The cursor moved.
    MouseMotion {
        /// Cursor position in surface pixels.
        position: Point,
    },
    /// A gamepad button changed state.
    GamepadButton {
        /// Button index.
        button: u8,
        /// `true` on press.
        pressed: bool,
    },
    /// A gamepad axis moved.
    GamepadAxis {
        /// Axis index.
        axis: u8,
        /// Axis value in `-1.0..=1.0`.
        value: f32,
    },
}

/// A decoded input event.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Keyboard key.
    Key {
        /// Key code.
        code: u32,
        /// Pressed state.
        pressed: bool,
        /// Auto-repeat.
        repeat: bool,
    },
    /// Mouse button.
    MouseButton {
        /// Button index.
        button: u8,
        /// Pressed state.
        pressed: bool,
        /// Cursor position.
        position: Point,
    },
    /// Cursor motion.
    MouseMotion {
        /// Cursor position.
        position: Point,
    },
    /// Gamepad button.
    GamepadButton {
        /// Button index.
        button: u8,
        /// Pressed state.
        pressed: bool,
    },
    /// Gamepad axis.
    GamepadAxis {
        /// Axis index.
        axis: u8,
        /// Axis value.
        value: f32,
    },
}

/// An input event that matched a named action.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionEvent {
    /// Action name.
    pub action: String,
    /// Whether the action is now held.
    pub pressed: bool,
    /// Analog strength in `0.0..=1.0`.
    pub strength: f32,
}

/// Converts platform events into input events and actions.
pub trait InputDecoder {
    /// Decodes one platform event. Window-management events (quit, resize)
    /// are handled by the loop and never reach the decoder.
    fn decode(&mut self, event: &PlatformEvent) -> Option<InputEvent>;

    /// Returns the actions `event` triggers, in delivery order.
    ///
    /// One event may touch several actions: an axis swinging across zero
    /// releases one direction and presses the other.
    fn actions(&mut self, event: &InputEvent) -> Vec<ActionEvent>;
}

/// What an action is bound to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Binding {
    /// A keyboard key.
    Key(u32),
    /// A mouse button.
    MouseButton(u8),
    /// A gamepad button.
    GamepadButton(u8),
    /// One direction of a gamepad axis.
    GamepadAxis {
        /// Axis index.
        axis: u8,
        /// `true` for the positive half.
        positive: bool,
    },
}

/// Default axis dead zone.
pub const DEFAULT_DEADZONE: f32 = 0.2;

/// The stock [`InputDecoder`]: a list of bindings to action names.
#[derive(Clone, Debug)]
pub struct ActionMap {
    bindings: Vec<(Binding, String)>,
    deadzone: f32,
    /// Direction (`true` for positive) each axis last reported past the dead
    /// zone, until it is released.
    held_axes: BTreeMap<u8, bool>,
}

impl Default for ActionMap {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            deadzone: DEFAULT_DEADZONE,
            held_axes: BTreeMap::new(),
        }
    }
}

impl ActionMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding and returns the map.
    #[must_use]
    pub fn bind(mut self, binding: Binding, action: &str) -> Self {
        self.add_binding(binding, action);
        self
    }

    /// Adds a binding.
    pub fn add_binding(&mut self, binding: Binding, action: &str) {
        self.bindings.push((binding, action.to_owned()));
    }

    /// Sets the axis dead zone below which an axis counts as released.
    pub fn set_deadzone(&mut self, deadzone: f32) {
        self.deadzone = deadzone.clamp(0.0, 1.0);
    }

    fn lookup(&self, wanted: impl Fn(&Binding) -> bool) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(b, _)| wanted(b))
            .map(|(_, name)| name.as_str())
    }
}

impl InputDecoder for ActionMap {
    fn decode(&mut self, event: &PlatformEvent) -> Option<InputEvent> {
        Some(match *event {
            PlatformEvent::Quit | PlatformEvent::Resized { .. } => return None,
            PlatformEvent::Key {
                code,
                pressed,
                repeat,
            } => InputEvent::Key {
                code,
                pressed,
                repeat,
            },
            PlatformEvent::MouseButton {
                button,
                pressed,
                position,
            } => InputEvent::MouseButton {
                button,
                pressed,
                position,
            },
            PlatformEvent::MouseMotion { position } => InputEvent::MouseMotion { position },
            PlatformEvent::GamepadButton { button, pressed } => {
                InputEvent::GamepadButton { button, pressed }
            }
            PlatformEvent::GamepadAxis { axis, value } => InputEvent::GamepadAxis {
                axis,
                value: value.clamp(-1.0, 1.0),
            },
        })
    }

    fn actions(&mut self, event: &InputEvent) -> Vec<ActionEvent> {
        let digital = |name: &str, pressed: bool| ActionEvent {
            action: name.to_owned(),
            pressed,
            strength: if pressed { 1.0 } else { 0.0 },
        };
        let action = match *event {
            InputEvent::Key { code, pressed, .. } => self
                .lookup(|b| *b == Binding::Key(code))
                .map(|n| digital(n, pressed)),
            InputEvent::MouseButton {
                button, pressed, ..
            } => self
                .lookup(|b| *b == Binding::MouseButton(button))
                .map(|n| digital(n, pressed)),
            InputEvent::GamepadButton { button, pressed } => self
                .lookup(|b| *b == Binding::GamepadButton(button))
                .map(|n| digital(n, pressed)),
            InputEvent::GamepadAxis { axis, value } => return self.axis_actions(axis, value),
            InputEvent::MouseMotion { .. } => None,
        };
        action.into_iter().collect()
    }
}

impl ActionMap {
    fn axis_actions(&mut self, axis: u8, value: f32) -> Vec<ActionEvent> {
        let positive = value >= 0.0;
        let strength = value.abs().min(1.0);
        let pressed = strength > self.deadzone;
        let mut out = Vec::new();

        // Crossing zero releases the direction that was held.
        if self.held_axes.get(&axis) == Some(&!positive) {
            self.held_axes.remove(&axis);
            let held = Binding::GamepadAxis {
                axis,
                positive: !positive,
            };
            if let Some(name) = self.lookup(|b| *b == held) {
                out.push(ActionEvent {
                    action: name.to_owned(),
                    pressed: false,
                    strength: 0.0,
                });
            }
        }
        if pressed {
            self.held_axes.insert(axis, positive);
        } else {
            self.held_axes.remove(&axis);
        }

        let current = Binding::GamepadAxis { axis, positive };
        if let Some(name) = self.lookup(|b| *b == current) {
            out.push(ActionEvent {
                action: name.to_owned(),
                pressed,
                strength: if pressed { strength } else { 0.0 },
            });
        }
        out
    }
}

/// Current state of one action.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionStatus {
    /// Held.
    pub pressed: bool,
    /// Analog strength.
    pub strength: f32,
}

/// Per-action pressed flags and strengths, updated by the frame loop.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    actions: BTreeMap<String, ActionStatus>,
}

impl InputState {
    /// Records an action event.
    pub fn apply(&mut self, event: &ActionEvent) {
        self.actions.insert(
            event.action.clone(),
            ActionStatus {
                pressed: event.pressed,
                strength: event.strength.clamp(0.0, 1.0),
            },
        );
    }

    /// Returns `true` if `action` is currently held.
    #[must_use]
    pub fn is_action_pressed(&self, action: &str) -> bool {
        self.actions.get(action).is_some_and(|s| s.pressed)
    }

    /// Returns the analog strength of `action`, zero if unknown.
    #[must_use]
    pub fn action_strength(&self, action: &str) -> f32 {
        self.actions.get(action).map_or(0.0, |s| s.strength)
    }

    /// Releases every action.
    pub fn release_all(&mut self) {
        self.actions.clear();
    }
}
