//! Signal / Connection-List Tests
//!
//! Tests for:
//! - Connect / emit / disconnect basics and delivery order
//! - Mutation during emit: self-disconnect, connect-during-emit, nested emit
//! - Handle semantics: drop does not disconnect, clones share a connection
//! - Storage pooling: slot count bounded by peak concurrent connections

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vesper_scene::events::{Signal, Subscription};

// ============================================================================
// Basics
// ============================================================================

#[test]
fn signal_emit_invokes_callback() {
    let signal: Signal<i32> = Signal::new();
    let got = Rc::new(Cell::new(0));

    let got2 = Rc::clone(&got);
    let _sub = signal.connect(move |value| got2.set(*value));

    signal.emit(&41);
    assert_eq!(got.get(), 41);
}

#[test]
fn signal_emit_with_no_connections() {
    let signal: Signal<u32> = Signal::new();
    signal.emit(&1);
    assert!(signal.is_empty());
}

#[test]
fn signal_delivery_in_registration_order() {
    let signal: Signal<()> = Signal::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let o1 = Rc::clone(&order);
    let _a = signal.connect(move |()| o1.borrow_mut().push("a"));
    let o2 = Rc::clone(&order);
    let _b = signal.connect(move |()| o2.borrow_mut().push("b"));
    let o3 = Rc::clone(&order);
    let _c = signal.connect(move |()| o3.borrow_mut().push("c"));

    signal.emit(&());
    assert_eq!(*order.borrow(), ["a", "b", "c"]);
}

#[test]
fn signal_emit_fires_every_time() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));

    let c = Rc::clone(&count);
    let _sub = signal.connect(move |()| c.set(c.get() + 1));

    signal.emit(&());
    signal.emit(&());
    signal.emit(&());
    assert_eq!(count.get(), 3);
}

#[test]
fn signal_len_counts_active_connections() {
    let signal: Signal<()> = Signal::new();
    assert_eq!(signal.len(), 0);

    let a = signal.connect(|()| {});
    let _b = signal.connect(|()| {});
    assert_eq!(signal.len(), 2);

    a.disconnect();
    assert_eq!(signal.len(), 1);
}

// ============================================================================
// Disconnect
// ============================================================================

#[test]
fn signal_disconnect_stops_delivery() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));

    let c = Rc::clone(&count);
    let sub = signal.connect(move |()| c.set(c.get() + 1));

    signal.emit(&());
    sub.disconnect();
    signal.emit(&());
    signal.emit(&());

    assert_eq!(count.get(), 1, "No delivery after disconnect");
}

#[test]
fn signal_disconnect_twice_is_noop() {
    let signal: Signal<()> = Signal::new();
    let sub = signal.connect(|()| {});
    sub.disconnect();
    sub.disconnect();
    assert!(!sub.is_connected());
}

#[test]
fn signal_dropping_handle_does_not_disconnect() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));

    let c = Rc::clone(&count);
    let sub = signal.connect(move |()| c.set(c.get() + 1));
    drop(sub);

    signal.emit(&());
    assert_eq!(count.get(), 1, "Connection must outlive its handle");
}

#[test]
fn signal_cloned_handles_share_one_connection() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));

    let c = Rc::clone(&count);
    let sub = signal.connect(move |()| c.set(c.get() + 1));
    let alias = sub.clone();

    signal.emit(&());
    assert_eq!(count.get(), 1);

    alias.disconnect();
    assert!(!sub.is_connected());
    signal.emit(&());
    assert_eq!(count.get(), 1);
}

#[test]
fn signal_clear_deactivates_everything() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));

    let c1 = Rc::clone(&count);
    let a = signal.connect(move |()| c1.set(c1.get() + 1));
    let c2 = Rc::clone(&count);
    let _b = signal.connect(move |()| c2.set(c2.get() + 1));

    signal.clear();
    signal.emit(&());

    assert_eq!(count.get(), 0);
    assert!(!a.is_connected());
    assert!(signal.is_empty());
}

// ============================================================================
// Mutation during emit
// ============================================================================

#[test]
fn signal_callback_can_disconnect_itself() {
    let signal: Signal<()> = Signal::new();
    let count = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<Subscription<()>>>> = Rc::new(RefCell::new(None));

    let c = Rc::clone(&count);
    let s = Rc::clone(&slot);
    let sub = signal.connect(move |()| {
        c.set(c.get() + 1);
        if let Some(sub) = s.borrow().as_ref() {
            sub.disconnect();
        }
    });
    *slot.borrow_mut() = Some(sub);

    signal.emit(&());
    signal.emit(&());
    assert_eq!(count.get(), 1, "Self-disconnecting callback fires once");
}

#[test]
fn signal_earlier_callback_disconnects_later_one() {
    let signal: Signal<()> = Signal::new();
    let hit_b = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<Subscription<()>>>> = Rc::new(RefCell::new(None));

    let s = Rc::clone(&slot);
    let _a = signal.connect(move |()| {
        if let Some(sub) = s.borrow().as_ref() {
            sub.disconnect();
        }
    });
    let hb = Rc::clone(&hit_b);
    let b = signal.connect(move |()| hb.set(hb.get() + 1));
    *slot.borrow_mut() = Some(b);

    signal.emit(&());
    assert_eq!(hit_b.get(), 0, "Disconnected earlier in the pass, skipped");
}

#[test]
fn signal_connect_during_emit_not_fired_this_pass() {
    let signal: Rc<Signal<()>> = Rc::new(Signal::new());
    let late_hits = Rc::new(Cell::new(0));

    let sig = Rc::clone(&signal);
    let late = Rc::clone(&late_hits);
    let _a = signal.connect(move |()| {
        let l = Rc::clone(&late);
        let _late_sub = sig.connect(move |()| l.set(l.get() + 1));
    });

    signal.emit(&());
    assert_eq!(late_hits.get(), 0, "Joined after the pass completes");

    signal.emit(&());
    assert_eq!(late_hits.get(), 1, "Delivered on the next pass");
}

#[test]
fn signal_nested_emit_skips_executing_callback() {
    let signal: Rc<Signal<()>> = Rc::new(Signal::new());
    let outer_hits = Rc::new(Cell::new(0));
    let other_hits = Rc::new(Cell::new(0));

    let sig = Rc::clone(&signal);
    let outer = Rc::clone(&outer_hits);
    let _a = signal.connect(move |()| {
        outer.set(outer.get() + 1);
        if outer.get() == 1 {
            // Nested pass: must not re-enter this callback.
            sig.emit(&());
        }
    });
    let other = Rc::clone(&other_hits);
    let _b = signal.connect(move |()| other.set(other.get() + 1));

    signal.emit(&());

    assert_eq!(outer_hits.get(), 1, "Executing callback not re-entered");
    assert_eq!(other_hits.get(), 2, "Other connections fire in both passes");
}

// ============================================================================
// Storage pooling
// ============================================================================

#[test]
fn signal_storage_bounded_under_churn() {
    let signal: Signal<()> = Signal::new();

    for _ in 0..100 {
        let sub = signal.connect(|()| {});
        sub.disconnect();
    }
    // One extra slot may sit unswept until the next connect.
    assert!(
        signal.storage_len() <= 2,
        "storage_len {} exceeds the concurrent peak",
        signal.storage_len()
    );
}

#[test]
fn signal_storage_reuses_slots_across_generations() {
    let signal: Signal<()> = Signal::new();

    for _ in 0..10 {
        let a = signal.connect(|()| {});
        let b = signal.connect(|()| {});
        signal.emit(&());
        a.disconnect();
        b.disconnect();
    }
    assert!(
        signal.storage_len() <= 3,
        "storage_len {} exceeds the concurrent peak",
        signal.storage_len()
    );
}
