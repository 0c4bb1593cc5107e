// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The deferred-action queue.
//!
//! Mutations that must not happen in the middle of a traversal are queued
//! here and executed at one fixed point: the end of the process cadence's
//! sub-step, after the `Process` notification has reached every node.
//!
//! The queue holds two things: a FIFO of [`DeferredAction`]s (deferred signal
//! calls, canvas redraws, arbitrary calls) and a list of nodes scheduled for
//! deletion. A flush runs the actions that were queued when it began, then
//! deletes the scheduled nodes. Actions queued while the flush is running
//! wait for the next flush. Deletions scheduled by those actions are still
//! picked up by the current one.

use std::collections::VecDeque;
use std::fmt;

use crate::node::NodeId;
use crate::signal::{Callable, Value};
use crate::tree::SceneTree;

/// One queued action.
pub(crate) enum DeferredAction {
    /// A deferred signal connection.
    Call { callable: Callable, args: Vec<Value> },
    /// A canvas node's pending redraw.
    Redraw(NodeId),
    /// Any other deferred call.
    Thunk(Box<dyn FnOnce(&mut SceneTree)>),
}

impl fmt::Debug for DeferredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call { args, .. } => f
                .debug_struct("Call")
                .field("args", args)
                .finish_non_exhaustive(),
            Self::Redraw(id) => f.debug_tuple("Redraw").field(id).finish(),
            Self::Thunk(_) => f.write_str("Thunk"),
        }
    }
}

/// Counters from one [`SceneTree::flush_deferred`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Actions executed.
    pub actions_run: u32,
    /// Nodes deleted.
    pub nodes_freed: u32,
}

/// Queue of deferred actions and pending deletions.
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    actions: VecDeque<DeferredAction>,
    deletions: Vec<NodeId>,
}

impl DeferredQueue {
    pub(crate) fn push(&mut self, action: DeferredAction) {
        self.actions.push_back(action);
    }

    pub(crate) fn queue_deletion(&mut self, id: NodeId) {
        self.deletions.push(id);
    }

    /// Takes the actions queued so far, leaving the queue empty.
    pub(crate) fn take_actions(&mut self) -> VecDeque<DeferredAction> {
        std::mem::take(&mut self.actions)
    }

    pub(crate) fn take_deletions(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.deletions)
    }

    pub(crate) fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn pending_deletions(&self) -> usize {
        self.deletions.len()
    }
}
