// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle and per-frame notifications delivered to nodes.

use crate::input::ActionEvent;

/// A notification delivered by [`SceneTree::notification`].
///
/// [`SceneTree::notification`]: crate::SceneTree::notification
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// The node became part of the active tree.
    EnterTree,
    /// The node is leaving the active tree.
    ExitTree,
    /// The node and all its descendants are inside the tree. Sent once per
    /// node, ever.
    Ready,
    /// The node was attached to a new parent.
    Parented,
    /// The node was detached from its parent.
    Unparented,
    /// Process cadence step.
    Process,
    /// Render cadence step.
    Render,
    /// Physics cadence step.
    PhysicsProcess,
    /// A canvas node should resubmit its drawing items.
    Draw,
    /// The node is about to be destroyed.
    PreDelete,
    /// A platform event mapped to a named action.
    Input(ActionEvent),
}
