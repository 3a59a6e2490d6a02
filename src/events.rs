//! Generic event primitive (connection lists).
//!
//! [`Signal`] is the decoupled-callback substrate used throughout the
//! engine: component creation/destruction notifications, window events and
//! input events all flow through it. Observers register a callback and are
//! invoked in registration order whenever the signal fires.
//!
//! # Design Principles
//!
//! - Callbacks may freely connect, disconnect and re-emit *during* an
//!   in-progress emit: connections added mid-pass are parked on a side list
//!   and spliced in after the outermost pass completes, and a connection's
//!   callback is taken out of its slot while it executes so a nested emit
//!   never re-enters it.
//! - Disconnection silences a connection immediately, even while other
//!   [`Subscription`] handles still reference it.
//! - Connection storage is pooled: a slot that is inactive and unreferenced
//!   is recycled by a later `connect` instead of allocating.
//!
//! A signal belongs to a single logical owner thread; the `Rc`/`RefCell`
//! interior makes the type `!Send`/`!Sync` by construction.
//!
//! # Example
//!
//! ```rust,ignore
//! let signal: Signal<u32> = Signal::new();
//! let sub = signal.connect(|value| println!("got {value}"));
//! signal.emit(&7);
//! sub.disconnect();
//! signal.emit(&8); // not delivered
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Callback<A> = Box<dyn FnMut(&A)>;

/// One registered callback slot inside a [`Signal`].
///
/// Owned jointly by the signal's connection list and by any outstanding
/// [`Subscription`] handles; recycled through the signal's pool once it is
/// both inactive and unreferenced.
struct Connection<A> {
    active: Cell<bool>,
    /// `None` while the callback is executing (taken out of the slot) or
    /// after disconnection.
    callback: RefCell<Option<Callback<A>>>,
}

impl<A> Connection<A> {
    fn empty() -> Rc<Self> {
        Rc::new(Self {
            active: Cell::new(false),
            callback: RefCell::new(None),
        })
    }

    fn silence(&self) {
        self.active.set(false);
        self.callback.borrow_mut().take();
    }
}

/// Reference-counted handle to one connection of a [`Signal`].
///
/// Cloning the handle shares the same connection. Dropping all handles does
/// *not* disconnect; the connection keeps firing until [`disconnect`] is
/// called or the owning signal is cleared.
///
/// [`disconnect`]: Subscription::disconnect
pub struct Subscription<A> {
    conn: Rc<Connection<A>>,
}

impl<A> Clone for Subscription<A> {
    fn clone(&self) -> Self {
        Self {
            conn: Rc::clone(&self.conn),
        }
    }
}

impl<A> Subscription<A> {
    /// Marks the connection inactive and clears its callback immediately.
    ///
    /// No further firing occurs even while other handles still reference
    /// the connection. Disconnecting twice is a silent no-op.
    pub fn disconnect(&self) {
        self.conn.silence();
    }

    /// Returns `true` while the connection will still be fired.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.active.get()
    }
}

/// A connection-list event: an ordered set of callbacks fired together.
///
/// See the module documentation for the re-entrancy and storage rules.
pub struct Signal<A> {
    connections: RefCell<Vec<Rc<Connection<A>>>>,
    /// Connections added while an emit pass is running; spliced into the
    /// main list after the outermost pass so they are not fired this pass.
    pending: RefCell<Vec<Rc<Connection<A>>>>,
    /// Inactive, unreferenced slots ready for reuse.
    pool: RefCell<Vec<Rc<Connection<A>>>>,
    emit_depth: Cell<u32>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Signal<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            pool: RefCell::new(Vec::new()),
            emit_depth: Cell::new(0),
        }
    }

    /// Registers `callback` at the tail of the list and returns its handle.
    ///
    /// When called while this signal is emitting, the connection joins the
    /// list only after the outermost pass completes and is not fired during
    /// the current pass.
    #[must_use = "dropping the handle leaves the connection permanently registered"]
    pub fn connect(&self, callback: impl FnMut(&A) + 'static) -> Subscription<A> {
        let conn = self.pool.borrow_mut().pop().unwrap_or_else(Connection::empty);
        conn.active.set(true);
        *conn.callback.borrow_mut() = Some(Box::new(callback));

        let handle = Subscription {
            conn: Rc::clone(&conn),
        };
        if self.emit_depth.get() > 0 {
            self.pending.borrow_mut().push(conn);
        } else {
            // Maintenance point: reclaim disconnected slots before growing.
            self.sweep_inactive();
            self.connections.borrow_mut().push(conn);
        }
        handle
    }

    /// Fires every active connection in registration order.
    ///
    /// A connection disconnected earlier in the same pass is skipped; a
    /// callback that disconnects itself is not re-entered by a nested emit.
    pub fn emit(&self, arg: &A) {
        self.emit_depth.set(self.emit_depth.get() + 1);

        let mut index = 0;
        loop {
            // Fetch under a short borrow so callbacks may mutate the list.
            let conn = {
                let list = self.connections.borrow();
                match list.get(index) {
                    Some(conn) => Rc::clone(conn),
                    None => break,
                }
            };
            index += 1;

            if !conn.active.get() {
                continue;
            }
            let taken = conn.callback.borrow_mut().take();
            if let Some(mut callback) = taken {
                callback(arg);
                // Put the callback back unless it disconnected itself.
                if conn.active.get() {
                    *conn.callback.borrow_mut() = Some(callback);
                }
            }
        }

        let depth = self.emit_depth.get() - 1;
        self.emit_depth.set(depth);
        if depth == 0 {
            self.finish_pass();
        }
    }

    /// Deactivates every connection, including ones parked mid-emit.
    ///
    /// Storage referenced by outstanding handles stays alive until those
    /// handles drop.
    pub fn clear(&self) {
        for conn in self.connections.borrow().iter() {
            conn.silence();
        }
        for conn in self.pending.borrow().iter() {
            conn.silence();
        }
    }

    /// Number of active connections (pending ones included).
    #[must_use]
    pub fn len(&self) -> usize {
        let live = |list: &[Rc<Connection<A>>]| list.iter().filter(|c| c.active.get()).count();
        live(&self.connections.borrow()) + live(&self.pending.borrow())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total connection slots currently held (live, pending and pooled).
    ///
    /// Storage is bounded by the maximum concurrent connection count, not by
    /// the total number of `connect` calls.
    #[must_use]
    pub fn storage_len(&self) -> usize {
        self.connections.borrow().len() + self.pending.borrow().len() + self.pool.borrow().len()
    }

    /// Splices pending connections and reclaims inactive slots after the
    /// outermost emit pass.
    fn finish_pass(&self) {
        let mut pending = self.pending.borrow_mut();
        if !pending.is_empty() {
            self.connections.borrow_mut().append(&mut pending);
        }
        drop(pending);
        self.sweep_inactive();
    }

    fn sweep_inactive(&self) {
        let mut list = self.connections.borrow_mut();
        let mut pool = self.pool.borrow_mut();
        list.retain(|conn| {
            if conn.active.get() {
                return true;
            }
            // Only unreferenced slots may be recycled; slots still held by
            // a Subscription are released when the last handle drops.
            if Rc::strong_count(conn) == 1 {
                pool.push(Rc::clone(conn));
            }
            false
        });
    }
}
