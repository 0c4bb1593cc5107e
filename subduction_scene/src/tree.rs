// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The logical node tree.
//!
//! [`SceneTree`] stores every node in a slot arena with a free list and
//! per-slot generation counters, owns the [`Renderer`] that canvas nodes
//! mirror into, and holds the deferred-action queue that the frame loop
//! flushes once per process step.
//!
//! # Tree membership
//!
//! Being *parented* and being *inside the tree* are separate states. A node
//! is inside the tree when it is the root or when its parent is inside the
//! tree. Attaching a subtree under an inside node enters it: every node
//! receives [`Notification::EnterTree`] parent-first, then
//! [`Notification::Ready`] children-first, where `Ready` is sent at most once
//! per node for its whole lifetime. Detaching an inside subtree sends
//! [`Notification::ExitTree`] parent-first.
//!
//! # Traversal safety
//!
//! Propagation snapshots each child list before descending and skips ids that
//! went stale in the meantime. Deletion requested during a traversal goes
//! through [`SceneTree::queue_free`] and happens at the next
//! [`SceneTree::flush_deferred`].

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use subduction_core::trace::CadenceKind;
use subduction_render::Renderer;

use crate::deferred::{DeferredAction, DeferredQueue, FlushStats};
use crate::input::InputState;
use crate::node::{Behavior, NodeContext, NodeData, NodeId};
use crate::notification::Notification;
use crate::signal::{Callable, ConnectFlags, Connection, ConnectionId, Value, names};

/// Name given to nodes created with an empty name.
pub const DEFAULT_NODE_NAME: &str = "Node";

/// Name of the root node.
pub const ROOT_NAME: &str = "root";

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Arena of nodes plus the renderer, deferred queue, and input state they
/// share.
pub struct SceneTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: NodeId,
    renderer: Renderer,
    deferred: DeferredQueue,
    /// Notifications for nodes whose behavior is out of its slot running a
    /// callback; delivered once that callback returns.
    held: HashMap<NodeId, VecDeque<Notification>>,
    input: InputState,
    deltas: [f64; 3],
    next_connection: u64,
    quit_requested: bool,
}

impl std::fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneTree")
            .field("nodes", &self.node_count())
            .field("root", &self.root)
            .field("renderer", &self.renderer)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl SceneTree {
    /// Creates a tree holding only the root node, which is inside the tree
    /// and ready from the start.
    #[must_use]
    pub fn new(renderer: Renderer) -> Self {
        let mut root = NodeData::new(ROOT_NAME.to_owned());
        root.inside_tree = true;
        root.ready = true;
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free_list: Vec::new(),
            root: NodeId {
                idx: 0,
                generation: 0,
            },
            renderer,
            deferred: DeferredQueue::default(),
            held: HashMap::new(),
            input: InputState::default(),
            deltas: [0.0; 3],
            next_connection: 0,
            quit_requested: false,
        }
    }

    // -- Storage --

    /// Returns the root node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.node = Some(data);
            NodeId {
                idx,
                generation: slot.generation,
            }
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "node count is bounded well below u32::MAX"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(data),
            });
            NodeId { idx, generation: 0 }
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.idx as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Creates a detached node.
    pub fn create_node(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::new(sanitize_name(name)))
    }

    /// Creates a detached node driven by `behavior`.
    pub fn create_node_with<B: Behavior + 'static>(&mut self, name: &str, behavior: B) -> NodeId {
        let id = self.create_node(name);
        self.set_behavior(id, behavior);
        id
    }

    /// Replaces the node's behavior.
    pub fn set_behavior<B: Behavior + 'static>(&mut self, id: NodeId, behavior: B) {
        if let Some(node) = self.node_mut(id) {
            node.behavior = Some(Box::new(behavior));
        }
    }

    /// Returns `true` if `id` names a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, the root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    // -- Accessors --

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// Returns the node's parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Returns the node's children in order; empty for a stale id.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Returns `true` if the node is part of the active tree.
    #[must_use]
    pub fn is_inside_tree(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.inside_tree)
    }

    /// Returns `true` once the node has received [`Notification::Ready`].
    #[must_use]
    pub fn is_ready(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.ready)
    }

    /// Returns `true` if the node is waiting for deletion.
    #[must_use]
    pub fn is_queued_for_deletion(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.queued_for_deletion)
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Returns the renderer.
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Returns the renderer mutably.
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Returns the action state.
    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Returns the action state mutably.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Returns the scaled delta of the most recent step of `cadence`.
    #[must_use]
    pub fn delta(&self, cadence: CadenceKind) -> f64 {
        self.deltas[cadence.index()]
    }

    pub(crate) fn set_delta(&mut self, cadence: CadenceKind, delta: f64) {
        self.deltas[cadence.index()] = delta;
    }

    /// Asks the frame loop to stop after the current iteration.
    pub fn quit(&mut self) {
        self.quit_requested = true;
    }

    /// Returns `true` if [`quit`](Self::quit) was called.
    #[must_use]
    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn clear_quit_request(&mut self) {
        self.quit_requested = false;
    }

    // -- Names and paths --

    /// Renames the node, keeping sibling names unique, and emits
    /// [`names::RENAMED`] if the name changed.
    pub fn set_name(&mut self, id: NodeId, name: &str) {
        let Some(node) = self.node(id) else {
            return;
        };
        let wanted = sanitize_name(name);
        let new_name = match node.parent {
            Some(p) => self.unique_child_name(p, &wanted, id),
            None => wanted,
        };
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.name == new_name {
            return;
        }
        node.name = new_name;
        self.emit(id, names::RENAMED, &[]);
    }

    fn unique_child_name(&self, parent: NodeId, base: &str, exclude: NodeId) -> String {
        let taken = |candidate: &str| {
            self.children(parent)
                .iter()
                .any(|&c| c != exclude && self.name(c) == Some(candidate))
        };
        if !taken(base) {
            return base.to_owned();
        }
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        let stem = if stem.is_empty() { base } else { stem };
        (2_u64..)
            .map(|i| format!("{stem}{i}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_owned())
    }

    /// Returns the child of `parent` named `name`.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// Resolves a `/`-separated path of child names.
    ///
    /// Relative paths start at `from`; a leading `/` starts at the root.
    /// `.` stays put and `..` moves to the parent.
    #[must_use]
    pub fn get_node(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let (mut cur, rest) = match path.strip_prefix('/') {
            Some(rest) => (self.root, rest),
            None => (from, path),
        };
        if !self.is_alive(cur) {
            return None;
        }
        for segment in rest.split('/').filter(|s| !s.is_empty()) {
            cur = match segment {
                "." => cur,
                ".." => self.parent(cur)?,
                name => self.find_child(cur, name)?,
            };
        }
        Some(cur)
    }

    /// Returns the absolute path of a node inside the tree, `None` otherwise.
    ///
    /// The root's path is `/`.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Option<String> {
        if !self.is_inside_tree(id) {
            return None;
        }
        let mut segments = Vec::new();
        let mut cur = id;
        while cur != self.root {
            segments.push(self.name(cur)?);
            cur = self.parent(cur)?;
        }
        segments.reverse();
        Some(format!("/{}", segments.join("/")))
    }

    // -- Structure --

    /// Attaches `child` under `parent`.
    ///
    /// No-op if either id is stale, if they are the same node, if `child` is
    /// already a child of `parent`, or if `child` is an ancestor of `parent`.
    /// Otherwise `child` is detached from any previous parent and appended.
    /// A name clash with a sibling renames it (emitting [`names::RENAMED`]).
    /// It is then sent [`Notification::Parented`] and, if `parent` is inside
    /// the tree, entered.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_alive(parent) || !self.is_alive(child) || parent == child {
            return;
        }
        if self.parent(child) == Some(parent) {
            return;
        }
        if self.is_ancestor_of(child, parent) {
            log::warn!("refusing to add {child:?} under its own descendant {parent:?}");
            return;
        }
        if let Some(old) = self.parent(child) {
            self.remove_child(old, child);
        }
        let current = self.name(child).unwrap_or(DEFAULT_NODE_NAME).to_owned();
        let name = self.unique_child_name(parent, &current, child);
        let renamed = name != current;
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.name = name;
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if renamed {
            self.emit(child, names::RENAMED, &[]);
        }
        self.notification(child, &Notification::Parented);
        if self.is_inside_tree(parent) {
            self.propagate_enter(child);
            self.propagate_ready(child);
        }
    }

    /// Detaches `child` from `parent`.
    ///
    /// No-op unless `child`'s parent is `parent`. If the child was inside the
    /// tree, its subtree exits.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.is_alive(child) || self.parent(child) != Some(parent) {
            return;
        }
        let was_inside = self.is_inside_tree(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        self.notification(child, &Notification::Unparented);
        if was_inside {
            self.propagate_exit(child);
        }
    }

    /// Moves `child` to position `index` among its siblings (clamped).
    pub fn move_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if self.parent(child) != Some(parent) {
            return;
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
            let index = index.min(node.children.len());
            node.children.insert(index, child);
        }
    }

    fn propagate_enter(&mut self, id: NodeId) {
        match self.node_mut(id) {
            Some(node) if !node.inside_tree => node.inside_tree = true,
            _ => return,
        }
        log::trace!("{id:?} entered tree");
        self.notification(id, &Notification::EnterTree);
        for child in self.children(id).to_vec() {
            self.propagate_enter(child);
        }
    }

    fn propagate_ready(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.propagate_ready(child);
        }
        match self.node_mut(id) {
            Some(node) if node.inside_tree && !node.ready => node.ready = true,
            _ => return,
        }
        self.notification(id, &Notification::Ready);
    }

    fn propagate_exit(&mut self, id: NodeId) {
        if !self.is_inside_tree(id) {
            return;
        }
        self.notification(id, &Notification::ExitTree);
        if let Some(node) = self.node_mut(id) {
            node.inside_tree = false;
        }
        log::trace!("{id:?} exited tree");
        for child in self.children(id).to_vec() {
            self.propagate_exit(child);
        }
    }

    // -- Notifications --

    /// Delivers one notification to one node.
    ///
    /// Order: the built-in handler (canvas bookkeeping), the
    /// [`names::TREE_EXITING`] signal for `ExitTree`, the behavior's typed
    /// callback and catch-all, then [`names::TREE_ENTERED`] for `EnterTree`
    /// or [`names::READY`] for `Ready`.
    pub fn notification(&mut self, id: NodeId, what: &Notification) {
        if !self.is_alive(id) {
            return;
        }
        self.canvas_notification(id, what);
        if matches!(what, Notification::ExitTree) {
            self.emit(id, names::TREE_EXITING, &[]);
        }
        self.dispatch_behavior(id, what);
        match what {
            Notification::EnterTree => self.emit(id, names::TREE_ENTERED, &[]),
            Notification::Ready => self.emit(id, names::READY, &[]),
            _ => {}
        }
    }

    /// Delivers a notification to `id` and then to every descendant,
    /// depth-first, parent before children.
    pub fn propagate_notification(&mut self, id: NodeId, what: &Notification) {
        if !self.is_alive(id) {
            return;
        }
        self.notification(id, what);
        for child in self.children(id).to_vec() {
            self.propagate_notification(child, what);
        }
    }

    /// Runs the behavior's callbacks for `what`.
    ///
    /// Notifications sent to the same node while its callback runs are held
    /// and delivered, in order, right after it returns. That includes
    /// `PreDelete` for a node that freed itself.
    fn dispatch_behavior(&mut self, id: NodeId, what: &Notification) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let Some(mut behavior) = node.behavior.take() else {
            if let Some(queue) = self.held.get_mut(&id) {
                queue.push_back(what.clone());
            }
            return;
        };
        let outer = self.held.insert(id, VecDeque::new());
        run_behavior(behavior.as_mut(), &mut NodeContext { tree: self, id }, what);
        while let Some(next) = self.held.get_mut(&id).and_then(VecDeque::pop_front) {
            run_behavior(behavior.as_mut(), &mut NodeContext { tree: self, id }, &next);
        }
        if let Some(queue) = outer {
            self.held.insert(id, queue);
        } else {
            self.held.remove(&id);
        }
        // A behavior installed during the callback wins.
        if let Some(node) = self.node_mut(id)
            && node.behavior.is_none()
        {
            node.behavior = Some(behavior);
        }
    }

    // -- Deletion --

    /// Schedules the node for deletion at the next deferred flush.
    ///
    /// Idempotent. The root cannot be freed.
    pub fn queue_free(&mut self, id: NodeId) {
        if id == self.root {
            log::warn!("queue_free on the root node ignored");
            return;
        }
        match self.node_mut(id) {
            Some(node) if !node.queued_for_deletion => node.queued_for_deletion = true,
            _ => return,
        }
        self.deferred.queue_deletion(id);
    }

    /// Deletes the node and its subtree now.
    ///
    /// The node is detached (exiting the tree if it was inside), then every
    /// node of the subtree receives [`Notification::PreDelete`] parent-first
    /// and is released. Prefer [`queue_free`](Self::queue_free) while a
    /// traversal may be running.
    pub fn free(&mut self, id: NodeId) {
        if id == self.root {
            log::warn!("free on the root node ignored");
            return;
        }
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        } else {
            self.propagate_exit(id);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        self.notification(id, &Notification::PreDelete);
        for child in self.children(id).to_vec() {
            if self.is_alive(child) {
                self.free_subtree(child);
            }
        }
        self.release_slot(id);
    }

    fn release_slot(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.idx as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.idx);
        if let Some(uid) = node.canvas.and_then(|c| c.item) {
            self.renderer.remove_uid(uid);
        }
        log::debug!("freed node {id:?} ({})", node.name);
    }

    // -- Deferred queue --

    pub(crate) fn push_deferred(&mut self, action: DeferredAction) {
        self.deferred.push(action);
    }

    /// Queues `f` to run at the next deferred flush.
    pub fn call_deferred<F: FnOnce(&mut Self) + 'static>(&mut self, f: F) {
        self.deferred.push(DeferredAction::Thunk(Box::new(f)));
    }

    /// Number of queued actions and pending deletions.
    #[must_use]
    pub fn pending_deferred(&self) -> (usize, usize) {
        (
            self.deferred.pending_actions(),
            self.deferred.pending_deletions(),
        )
    }

    /// Runs queued actions in FIFO order, then deletes queued nodes.
    ///
    /// Only actions queued before the flush began run; anything they queue
    /// waits for the next flush. Deletions they request run in this one.
    pub fn flush_deferred(&mut self) -> FlushStats {
        let mut stats = FlushStats::default();
        for action in self.deferred.take_actions() {
            stats.actions_run += 1;
            match action {
                DeferredAction::Call { callable, args } => invoke(&callable, self, &args),
                DeferredAction::Redraw(id) => self.run_redraw(id),
                DeferredAction::Thunk(f) => f(self),
            }
        }
        let before = self.node_count();
        for id in self.deferred.take_deletions() {
            self.free(id);
        }
        let freed = before.saturating_sub(self.node_count());
        stats.nodes_freed = u32::try_from(freed).unwrap_or(u32::MAX);
        stats
    }

    // -- Signals --

    /// Connects `f` to the node's `signal`.
    ///
    /// Returns `None` if the node is stale.
    pub fn connect<F>(
        &mut self,
        id: NodeId,
        signal: &str,
        f: F,
        flags: ConnectFlags,
    ) -> Option<ConnectionId>
    where
        F: FnMut(&mut Self, &[Value]) + 'static,
    {
        let callable: Callable = Rc::new(RefCell::new(f));
        self.connect_callable(id, signal, callable, flags)
    }

    /// Connects an existing callable, which may be shared between
    /// connections.
    pub fn connect_callable(
        &mut self,
        id: NodeId,
        signal: &str,
        callable: Callable,
        flags: ConnectFlags,
    ) -> Option<ConnectionId> {
        let conn = ConnectionId(self.next_connection);
        let node = self.node_mut(id)?;
        node.signals.connect(
            signal,
            Connection {
                id: conn,
                callable,
                flags,
            },
        );
        self.next_connection += 1;
        Some(conn)
    }

    /// Removes a connection. Returns `false` if it was not connected.
    pub fn disconnect(&mut self, id: NodeId, signal: &str, conn: ConnectionId) -> bool {
        self.node_mut(id)
            .is_some_and(|n| n.signals.disconnect(signal, conn))
    }

    /// Returns `true` if the connection is live.
    #[must_use]
    pub fn is_connected(&self, id: NodeId, signal: &str, conn: ConnectionId) -> bool {
        self.node(id)
            .is_some_and(|n| n.signals.is_connected(signal, conn))
    }

    /// Number of connections on the node's `signal`.
    #[must_use]
    pub fn connection_count(&self, id: NodeId, signal: &str) -> usize {
        self.node(id)
            .map_or(0, |n| n.signals.connection_count(signal))
    }

    /// Emits the node's `signal` with `args`.
    ///
    /// Connections are called in connection order from a snapshot taken
    /// before the first call. A connection removed by an earlier handler is
    /// skipped. One-shot connections are removed before they run. Deferred
    /// connections are queued instead of called.
    pub fn emit(&mut self, id: NodeId, signal: &str, args: &[Value]) {
        let Some(node) = self.node(id) else {
            return;
        };
        for conn in node.signals.snapshot(signal) {
            let live = match self.node_mut(id) {
                Some(n) if conn.flags.one_shot => n.signals.disconnect(signal, conn.id),
                Some(n) => n.signals.is_connected(signal, conn.id),
                None => false,
            };
            if !live {
                continue;
            }
            if conn.flags.deferred {
                self.deferred.push(DeferredAction::Call {
                    callable: conn.callable,
                    args: args.to_vec(),
                });
            } else {
                invoke(&conn.callable, self, args);
            }
        }
    }
}

fn invoke(callable: &Callable, tree: &mut SceneTree, args: &[Value]) {
    match callable.try_borrow_mut() {
        Ok(mut f) => {
            let f = &mut *f;
            f(tree, args);
        }
        Err(_) => log::warn!("skipping re-entrant call of a running signal handler"),
    }
}

fn run_behavior(behavior: &mut dyn Behavior, ctx: &mut NodeContext<'_>, what: &Notification) {
    match what {
        Notification::Ready => behavior.ready(ctx),
        Notification::Process => {
            let delta = ctx.tree.delta(CadenceKind::Process);
            behavior.process(ctx, delta);
        }
        Notification::Render => {
            let delta = ctx.tree.delta(CadenceKind::Render);
            behavior.render(ctx, delta);
        }
        Notification::PhysicsProcess => {
            let delta = ctx.tree.delta(CadenceKind::Physics);
            behavior.physics_process(ctx, delta);
        }
        Notification::Input(event) => behavior.input(ctx, event),
        Notification::Draw => behavior.draw(ctx),
        _ => {}
    }
    behavior.notification(ctx, what);
}

fn sanitize_name(name: &str) -> String {
    if name.is_empty() {
        DEFAULT_NODE_NAME.to_owned()
    } else {
        name.replace('/', "_")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use subduction_render::RecordingBackend;

    pub(crate) type Log = Rc<RefCell<Vec<String>>>;

    pub(crate) fn headless_tree() -> SceneTree {
        SceneTree::new(Renderer::new(Box::new(RecordingBackend::new())))
    }

    /// Records every notification as `name:Variant`.
    pub(crate) struct Recorder {
        pub(crate) name: &'static str,
        pub(crate) log: Log,
    }

    impl Behavior for Recorder {
        fn notification(&mut self, _ctx: &mut NodeContext<'_>, what: &Notification) {
            let kind = format!("{what:?}");
            let kind = kind.split('(').next().unwrap_or_default().to_owned();
            self.log.borrow_mut().push(format!("{}:{kind}", self.name));
        }
    }

    fn recorded(tree: &mut SceneTree, name: &'static str, log: &Log) -> NodeId {
        tree.create_node_with(
            name,
            Recorder {
                name,
                log: log.clone(),
            },
        )
    }

    fn entries(log: &Log, suffix: &str) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|e| e.ends_with(suffix))
            .cloned()
            .collect()
    }

    #[test]
    fn re_adding_the_same_child_is_a_no_op() {
        let mut tree = headless_tree();
        let root = tree.root();
        let c = tree.create_node("c");
        tree.add_child(root, c);
        tree.add_child(root, c);
        assert_eq!(tree.child_count(root), 1, "child set unchanged");
        assert_eq!(tree.parent(c), Some(root), "parent is root");
    }

    #[test]
    fn invalid_attachments_are_ignored() {
        let mut tree = headless_tree();
        let root = tree.root();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        tree.add_child(a, b);
        tree.add_child(a, a);
        assert_eq!(tree.parent(a), None, "self-parenting ignored");
        tree.add_child(b, a);
        assert_eq!(tree.parent(a), None, "cycle ignored");
        tree.free(b);
        tree.add_child(root, b);
        assert_eq!(tree.child_count(root), 0, "stale child ignored");
        tree.add_child(b, a);
        assert_eq!(tree.parent(a), None, "stale parent ignored");
    }

    #[test]
    fn reparenting_detaches_first() {
        let mut tree = headless_tree();
        let root = tree.root();
        let a = tree.create_node("a");
        let b = tree.create_node("b");
        let c = tree.create_node("c");
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(a, c);
        tree.add_child(b, c);
        assert!(tree.children(a).is_empty(), "removed from old parent");
        assert_eq!(tree.children(b), [c], "added to new parent");
        assert!(tree.is_inside_tree(c), "still inside the tree");
    }

    #[test]
    fn remove_child_requires_the_actual_parent() {
        let mut tree = headless_tree();
        let root = tree.root();
        let a = tree.create_node("a");
        let c = tree.create_node("c");
        tree.add_child(root, a);
        tree.add_child(a, c);
        tree.remove_child(root, c);
        assert_eq!(tree.parent(c), Some(a), "wrong parent is a no-op");
        tree.remove_child(a, c);
        assert_eq!(tree.parent(c), None, "detached");
        assert!(!tree.is_inside_tree(c), "left the tree");
    }

    #[test]
    fn ready_fires_once_across_reattachment() {
        let log = Log::default();
        let mut tree = headless_tree();
        let root = tree.root();
        let n = recorded(&mut tree, "n", &log);
        tree.add_child(root, n);
        tree.remove_child(root, n);
        tree.add_child(root, n);
        assert_eq!(entries(&log, ":Ready"), ["n:Ready"], "exactly one ready");
        assert_eq!(entries(&log, ":EnterTree").len(), 2, "entered twice");
        assert_eq!(entries(&log, ":ExitTree").len(), 1, "exited once");
        assert!(tree.is_ready(n), "ready is permanent");
    }

    #[test]
    fn enter_is_parent_first_and_ready_children_first() {
        let log = Log::default();
        let mut tree = headless_tree();
        let root = tree.root();
        let p = recorded(&mut tree, "p", &log);
        let c1 = recorded(&mut tree, "c1", &log);
        let c2 = recorded(&mut tree, "c2", &log);
        tree.add_child(p, c1);
        tree.add_child(p, c2);
        log.borrow_mut().clear();

        tree.add_child(root, p);
        assert_eq!(
            entries(&log, ":EnterTree"),
            ["p:EnterTree", "c1:EnterTree", "c2:EnterTree"],
            "parent first"
        );
        assert_eq!(
            entries(&log, ":Ready"),
            ["c1:Ready", "c2:Ready", "p:Ready"],
            "children first"
        );
        assert_eq!(log.borrow()[0], "p:Parented", "parented before entering");

        log.borrow_mut().clear();
        tree.remove_child(root, p);
        assert_eq!(
            entries(&log, ":ExitTree"),
            ["p:ExitTree", "c1:ExitTree", "c2:ExitTree"],
            "exit parent first"
        );
    }

    #[test]
    fn detached_subtrees_do_not_enter() {
        let log = Log::default();
        let mut tree = headless_tree();
        let p = recorded(&mut tree, "p", &log);
        let c = recorded(&mut tree, "c", &log);
        tree.add_child(p, c);
        assert!(!tree.is_inside_tree(c), "detached parent");
        assert_eq!(*log.borrow(), ["c:Parented"], "only parented");
    }

    #[test]
    fn propagation_is_depth_first_parent_first() {
        let log = Log::default();
        let mut tree = headless_tree();
        let root = tree.root();
        let a = recorded(&mut tree, "a", &log);
        let a1 = recorded(&mut tree, "a1", &log);
        let b = recorded(&mut tree, "b", &log);
        tree.add_child(root, a);
        tree.add_child(a, a1);
        tree.add_child(root, b);
        log.borrow_mut().clear();
        tree.propagate_notification(root, &Notification::Process);
        assert_eq!(
            *log.borrow(),
            ["a:Process", "a1:Process", "b:Process"],
            "depth-first order"
        );
    }

    struct FreeOnProcess {
        victim: NodeId,
        seen_alive: Rc<RefCell<Vec<bool>>>,
    }

    impl Behavior for FreeOnProcess {
        fn process(&mut self, ctx: &mut NodeContext<'_>, _delta: f64) {
            ctx.tree.queue_free(self.victim);
            ctx.tree.queue_free(self.victim);
            self.seen_alive.borrow_mut().push(ctx.tree.is_alive(self.victim));
        }
    }

    #[test]
    fn queue_free_during_propagation_is_deferred() {
        let log = Log::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tree = headless_tree();
        let root = tree.root();
        let victim = recorded(&mut tree, "victim", &log);
        let victim_child = recorded(&mut tree, "victim_child", &log);
        let killer = tree.create_node_with(
            "killer",
            FreeOnProcess {
                victim,
                seen_alive: seen.clone(),
            },
        );
        tree.add_child(root, killer);
        tree.add_child(root, victim);
        tree.add_child(victim, victim_child);
        log.borrow_mut().clear();

        tree.propagate_notification(root, &Notification::Process);
        assert_eq!(*seen.borrow(), [true], "still alive during traversal");
        assert_eq!(
            entries(&log, ":Process"),
            ["victim:Process", "victim_child:Process"],
            "traversal reached the queued node"
        );
        assert!(tree.is_queued_for_deletion(victim), "marked");
        assert_eq!(tree.pending_deferred(), (0, 1), "queued once");

        let stats = tree.flush_deferred();
        assert_eq!(stats.nodes_freed, 2, "victim and its child");
        assert!(!tree.is_alive(victim), "gone after flush");
        assert!(!tree.is_alive(victim_child), "subtree gone");
        assert_eq!(tree.children(root), [killer], "detached from root");
        assert_eq!(
            entries(&log, ":PreDelete"),
            ["victim:PreDelete", "victim_child:PreDelete"],
            "pre-delete parent first"
        );
        assert_eq!(
            entries(&log, ":ExitTree"),
            ["victim:ExitTree", "victim_child:ExitTree"],
            "exit before deletion"
        );
    }

    /// Detaches or frees itself from inside `process`, logging everything.
    struct SelfRemoving {
        free: bool,
        log: Log,
    }

    impl Behavior for SelfRemoving {
        fn process(&mut self, ctx: &mut NodeContext<'_>, _delta: f64) {
            if self.free {
                ctx.tree.free(ctx.id);
            } else if let Some(parent) = ctx.tree.parent(ctx.id) {
                ctx.tree.remove_child(parent, ctx.id);
            }
            self.log.borrow_mut().push("process returned".to_owned());
        }

        fn notification(&mut self, _ctx: &mut NodeContext<'_>, what: &Notification) {
            self.log.borrow_mut().push(format!("{what:?}"));
        }
    }

    #[test]
    fn self_detaching_node_still_sees_its_exit() {
        let log = Log::default();
        let mut tree = headless_tree();
        let root = tree.root();
        let n = tree.create_node_with(
            "leaver",
            SelfRemoving {
                free: false,
                log: log.clone(),
            },
        );
        tree.add_child(root, n);
        log.borrow_mut().clear();

        tree.propagate_notification(root, &Notification::Process);
        assert!(!tree.is_inside_tree(n), "left the tree");
        assert_eq!(
            *log.borrow(),
            ["process returned", "Process", "Unparented", "ExitTree"],
            "held notifications follow the running callback in order"
        );

        log.borrow_mut().clear();
        tree.add_child(root, n);
        assert_eq!(
            *log.borrow(),
            ["Parented", "EnterTree"],
            "behavior restored after the held ones ran"
        );
    }

    #[test]
    fn self_freeing_node_still_sees_pre_delete() {
        let log = Log::default();
        let mut tree = headless_tree();
        let root = tree.root();
        let n = tree.create_node_with(
            "doomed",
            SelfRemoving {
                free: true,
                log: log.clone(),
            },
        );
        tree.add_child(root, n);
        log.borrow_mut().clear();

        tree.notification(n, &Notification::Process);
        assert!(!tree.is_alive(n), "freed");
        assert_eq!(
            *log.borrow(),
            [
                "process returned",
                "Process",
                "Unparented",
                "ExitTree",
                "PreDelete"
            ],
            "pre-delete delivered after the callback"
        );
        assert!(tree.held.is_empty(), "no held queue left behind");
    }

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let mut tree = headless_tree();
        let a = tree.create_node("a");
        tree.free(a);
        let b = tree.create_node("b");
        assert_eq!(a.index(), b.index(), "slot reused");
        assert_ne!(a, b, "generation differs");
        assert!(!tree.is_alive(a), "old id stale");
        assert_eq!(tree.name(b), Some("b"), "new node readable");
        tree.queue_free(tree.root());
        tree.free(tree.root());
        assert!(tree.is_alive(tree.root()), "root survives");
    }

    #[test]
    fn sibling_names_stay_unique() {
        let mut tree = headless_tree();
        let root = tree.root();
        let a = tree.create_node("Enemy");
        let b = tree.create_node("Enemy");
        let c = tree.create_node("Enemy");
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(root, c);
        assert_eq!(tree.name(a), Some("Enemy"), "first keeps its name");
        assert_eq!(tree.name(b), Some("Enemy2"), "second numbered");
        assert_eq!(tree.name(c), Some("Enemy3"), "third numbered");
        tree.set_name(c, "Enemy");
        assert_eq!(tree.name(c), Some("Enemy3"), "rename keeps uniqueness");

        let renames = Rc::new(RefCell::new(0));
        let d = tree.create_node("Enemy");
        let r = renames.clone();
        tree.connect(d, names::RENAMED, move |_, _| *r.borrow_mut() += 1, ConnectFlags::NONE);
        tree.add_child(root, d);
        assert_eq!(tree.name(d), Some("Enemy4"), "numbered on attach");
        assert_eq!(*renames.borrow(), 1, "attach rename announced");
        let e = tree.create_node("Boss");
        let r = renames.clone();
        tree.connect(e, names::RENAMED, move |_, _| *r.borrow_mut() += 1, ConnectFlags::NONE);
        tree.add_child(root, e);
        assert_eq!(*renames.borrow(), 1, "no clash, no signal");
        let unnamed = tree.create_node("");
        let slashed = tree.create_node("a/b");
        assert_eq!(tree.name(unnamed), Some("Node"), "default name");
        assert_eq!(tree.name(slashed), Some("a_b"), "slash replaced");
    }

    #[test]
    fn paths_resolve_both_ways() {
        let mut tree = headless_tree();
        let root = tree.root();
        let world = tree.create_node("world");
        let player = tree.create_node("player");
        let gun = tree.create_node("gun");
        tree.add_child(root, world);
        tree.add_child(world, player);
        tree.add_child(player, gun);
        assert_eq!(tree.path(gun).as_deref(), Some("/world/player/gun"), "absolute");
        assert_eq!(tree.path(root).as_deref(), Some("/"), "root path");
        assert_eq!(tree.get_node(root, "/world/player/gun"), Some(gun), "absolute lookup");
        assert_eq!(tree.get_node(gun, "../.."), Some(world), "parent hops");
        assert_eq!(tree.get_node(world, "./player"), Some(player), "relative");
        assert_eq!(tree.get_node(world, "nobody"), None, "missing");
        let loose = tree.create_node("loose");
        assert_eq!(tree.path(loose), None, "detached node has no path");
    }

    #[test]
    fn move_child_reorders_siblings() {
        let mut tree = headless_tree();
        let root = tree.root();
        let ids: Vec<NodeId> = ["a", "b", "c"]
            .iter()
            .map(|n| {
                let id = tree.create_node(n);
                tree.add_child(root, id);
                id
            })
            .collect();
        tree.move_child(root, ids[2], 0);
        assert_eq!(tree.children(root), [ids[2], ids[0], ids[1]], "moved to front");
        tree.move_child(root, ids[2], 99);
        assert_eq!(tree.children(root), [ids[0], ids[1], ids[2]], "clamped to back");
    }

    #[test]
    fn immediate_signals_run_in_connection_order() {
        let mut tree = headless_tree();
        let n = tree.create_node("n");
        let log = Log::default();
        for tag in ["first", "second"] {
            let log = log.clone();
            tree.connect(
                n,
                "hit",
                move |_, args| log.borrow_mut().push(format!("{tag}:{args:?}")),
                ConnectFlags::NONE,
            );
        }
        tree.emit(n, "hit", &[Value::Int(5)]);
        assert_eq!(
            *log.borrow(),
            ["first:[Int(5)]", "second:[Int(5)]"],
            "ordered, with args"
        );
    }

    #[test]
    fn one_shot_connections_fire_once() {
        let mut tree = headless_tree();
        let n = tree.create_node("n");
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let conn = tree
            .connect(n, "hit", move |_, _| *c.borrow_mut() += 1, ConnectFlags::ONE_SHOT)
            .unwrap();
        tree.emit(n, "hit", &[]);
        tree.emit(n, "hit", &[]);
        assert_eq!(*count.borrow(), 1, "fired once");
        assert!(!tree.is_connected(n, "hit", conn), "auto-disconnected");
    }

    #[test]
    fn deferred_connections_wait_for_the_flush() {
        let mut tree = headless_tree();
        let n = tree.create_node("n");
        let log = Log::default();
        let l = log.clone();
        tree.connect(
            n,
            "hit",
            move |_, args| l.borrow_mut().push(format!("{args:?}")),
            ConnectFlags::DEFERRED,
        );
        tree.emit(n, "hit", &[Value::from("a")]);
        tree.emit(n, "hit", &[Value::from("b")]);
        assert!(log.borrow().is_empty(), "nothing yet");
        let stats = tree.flush_deferred();
        assert_eq!(stats.actions_run, 2, "two calls");
        assert_eq!(
            *log.borrow(),
            ["[Str(\"a\")]", "[Str(\"b\")]"],
            "fifo order"
        );
    }

    #[test]
    fn handlers_may_disconnect_later_connections() {
        let mut tree = headless_tree();
        let n = tree.create_node("n");
        let hits = Rc::new(RefCell::new(0));
        let later = Rc::new(RefCell::new(None));
        let l = later.clone();
        tree.connect(
            n,
            "hit",
            move |tree, _| {
                if let Some(conn) = *l.borrow() {
                    tree.disconnect(n, "hit", conn);
                }
            },
            ConnectFlags::NONE,
        );
        let h = hits.clone();
        let conn = tree.connect(n, "hit", move |_, _| *h.borrow_mut() += 1, ConnectFlags::NONE);
        *later.borrow_mut() = conn;
        tree.emit(n, "hit", &[]);
        assert_eq!(*hits.borrow(), 0, "disconnected before its turn");
        assert_eq!(tree.connection_count(n, "hit"), 1, "one left");
    }

    #[test]
    fn re_entrant_emission_skips_the_running_handler() {
        let mut tree = headless_tree();
        let n = tree.create_node("n");
        let depth = Rc::new(RefCell::new(0));
        let d = depth.clone();
        tree.connect(
            n,
            "echo",
            move |tree, _| {
                *d.borrow_mut() += 1;
                tree.emit(n, "echo", &[]);
            },
            ConnectFlags::NONE,
        );
        tree.emit(n, "echo", &[]);
        assert_eq!(*depth.borrow(), 1, "inner emission skipped");
    }

    #[test]
    fn builtin_signals_fire() {
        let mut tree = headless_tree();
        let root = tree.root();
        let n = tree.create_node("n");
        let log = Log::default();
        for name in [
            names::TREE_ENTERED,
            names::READY,
            names::TREE_EXITING,
            names::RENAMED,
        ] {
            let l = log.clone();
            tree.connect(n, name, move |_, _| l.borrow_mut().push(name.to_owned()), ConnectFlags::NONE);
        }
        tree.add_child(root, n);
        tree.set_name(n, "m");
        tree.set_name(n, "m");
        tree.remove_child(root, n);
        assert_eq!(
            *log.borrow(),
            ["tree_entered", "ready", "renamed", "tree_exiting"],
            "lifecycle signals in order"
        );
    }

    #[test]
    fn deferred_calls_snapshot_the_queue() {
        let mut tree = headless_tree();
        let log = Log::default();
        let l = log.clone();
        tree.call_deferred(move |tree| {
            l.borrow_mut().push("outer".to_owned());
            let l2 = l.clone();
            tree.call_deferred(move |_| l2.borrow_mut().push("inner".to_owned()));
        });
        assert_eq!(tree.flush_deferred().actions_run, 1, "only the outer call");
        assert_eq!(*log.borrow(), ["outer"], "inner waits");
        assert_eq!(tree.flush_deferred().actions_run, 1, "inner on the next flush");
        assert_eq!(*log.borrow(), ["outer", "inner"], "both ran");
    }
}
