// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node signals: named lists of connected callables.
//!
//! A node's [`SignalTable`] maps a signal name to its connections in
//! connection order. Emitting a signal calls every connection with the
//! emitted arguments, either immediately or, for connections made with
//! [`ConnectFlags::deferred`], by queueing the call for the next deferred
//! flush.
//!
//! Callables receive `&mut SceneTree`, so a handler may connect, disconnect,
//! emit, or restructure the tree. Emission works on a snapshot of the
//! connection list taken before the first call.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::node::NodeId;
use crate::tree::SceneTree;

/// Names of the signals every node emits.
pub mod names {
    /// Emitted after the first [`Ready`](crate::Notification::Ready).
    pub const READY: &str = "ready";
    /// Emitted when the node's name changes.
    pub const RENAMED: &str = "renamed";
    /// Emitted after [`EnterTree`](crate::Notification::EnterTree).
    pub const TREE_ENTERED: &str = "tree_entered";
    /// Emitted before [`ExitTree`](crate::Notification::ExitTree) reaches
    /// the node's behavior.
    pub const TREE_EXITING: &str = "tree_exiting";
}

/// A signal argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value.
    #[default]
    Nil,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
    /// Node handle.
    Node(NodeId),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<NodeId> for Value {
    fn from(v: NodeId) -> Self {
        Self::Node(v)
    }
}

/// Shared handle to a connected function.
pub type Callable = Rc<RefCell<dyn FnMut(&mut SceneTree, &[Value])>>;

/// How a connection behaves when its signal is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectFlags {
    /// Queue the call for the next deferred flush instead of calling now.
    pub deferred: bool,
    /// Disconnect before the first call.
    pub one_shot: bool,
}

impl ConnectFlags {
    /// Immediate, persistent connection.
    pub const NONE: Self = Self {
        deferred: false,
        one_shot: false,
    };
    /// Deferred, persistent connection.
    pub const DEFERRED: Self = Self {
        deferred: true,
        one_shot: false,
    };
    /// Immediate, one-shot connection.
    pub const ONE_SHOT: Self = Self {
        deferred: false,
        one_shot: true,
    };
}

/// Identifies one connection for [`SceneTree::disconnect`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

#[derive(Clone)]
pub(crate) struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) callable: Callable,
    pub(crate) flags: ConnectFlags,
}

/// The signals of one node.
#[derive(Clone, Default)]
pub(crate) struct SignalTable {
    map: BTreeMap<String, Vec<Connection>>,
}

impl fmt::Debug for SignalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.map.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl SignalTable {
    pub(crate) fn connect(&mut self, signal: &str, connection: Connection) {
        self.map
            .entry(signal.to_owned())
            .or_default()
            .push(connection);
    }

    pub(crate) fn disconnect(&mut self, signal: &str, id: ConnectionId) -> bool {
        let Some(list) = self.map.get_mut(signal) else {
            return false;
        };
        let before = list.len();
        list.retain(|c| c.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.map.remove(signal);
        }
        removed
    }

    pub(crate) fn is_connected(&self, signal: &str, id: ConnectionId) -> bool {
        self.map
            .get(signal)
            .is_some_and(|list| list.iter().any(|c| c.id == id))
    }

    pub(crate) fn connection_count(&self, signal: &str) -> usize {
        self.map.get(signal).map_or(0, Vec::len)
    }

    pub(crate) fn snapshot(&self, signal: &str) -> Vec<Connection> {
        self.map.get(signal).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callable {
        Rc::new(RefCell::new(|_: &mut SceneTree, _: &[Value]| {}))
    }

    #[test]
    fn table_connect_disconnect() {
        let mut table = SignalTable::default();
        let a = ConnectionId(1);
        let b = ConnectionId(2);
        table.connect(
            "hit",
            Connection {
                id: a,
                callable: noop(),
                flags: ConnectFlags::NONE,
            },
        );
        table.connect(
            "hit",
            Connection {
                id: b,
                callable: noop(),
                flags: ConnectFlags::ONE_SHOT,
            },
        );
        assert_eq!(table.connection_count("hit"), 2, "two connections");
        assert!(table.is_connected("hit", b), "b connected");
        assert!(table.disconnect("hit", a), "a removed");
        assert!(!table.disconnect("hit", a), "a already gone");
        assert!(!table.disconnect("miss", b), "unknown signal");
        let snap = table.snapshot("hit");
        assert_eq!(snap.len(), 1, "snapshot has b only");
        assert!(snap[0].flags.one_shot, "flags kept");
        assert!(table.disconnect("hit", b), "b removed");
        assert_eq!(table.connection_count("hit"), 0, "empty");
    }

    #[test]
    fn values_convert() {
        assert_eq!(Value::from(3_i64), Value::Int(3), "int");
        assert_eq!(Value::from("x"), Value::Str("x".to_owned()), "str");
        assert_eq!(Value::default(), Value::Nil, "nil default");
    }
}
