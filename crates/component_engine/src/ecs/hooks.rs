//! Per-tick host callbacks
//!
//! Hooks run after every simulation tick's update pass. Installing a hook
//! returns a [`HookGuard`]; the hook stays installed exactly as long as the
//! guard is alive.

use super::scene::Scene;
use super::scheduler::TickInfo;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

/// Callback invoked after each simulation tick
pub trait TickHook {
    /// Called with the tick that just ran and the scenes it updated
    fn after_tick(&mut self, tick: &TickInfo, scenes: &mut [Scene]);
}

impl<F> TickHook for F
where
    F: FnMut(&TickInfo, &mut [Scene]),
{
    fn after_tick(&mut self, tick: &TickInfo, scenes: &mut [Scene]) {
        self(tick, scenes);
    }
}

#[derive(Default)]
struct HookSlots {
    next_id: u64,
    hooks: Vec<(u64, Box<dyn TickHook>)>,
    // Guards dropped while their hook was taken out for a run
    removed: HashSet<u64>,
}

/// Ordered list of installed hooks
#[derive(Clone, Default)]
pub struct HookList {
    slots: Rc<RefCell<HookSlots>>,
}

impl HookList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a hook; it is removed when the returned guard is dropped
    #[must_use = "the hook is uninstalled as soon as the guard is dropped"]
    pub fn install(&self, hook: impl TickHook + 'static) -> HookGuard {
        let mut slots = self.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.hooks.push((id, Box::new(hook)));
        HookGuard {
            slots: Rc::downgrade(&self.slots),
            id,
        }
    }

    /// Run every installed hook in installation order
    ///
    /// Hooks may install or drop guards while they run.
    pub fn run(&self, tick: &TickInfo, scenes: &mut [Scene]) {
        let mut running = std::mem::take(&mut self.slots.borrow_mut().hooks);
        for (_, hook) in &mut running {
            hook.after_tick(tick, scenes);
        }

        let mut slots = self.slots.borrow_mut();
        let removed = std::mem::take(&mut slots.removed);
        running.retain(|(id, _)| !removed.contains(id));
        running.append(&mut slots.hooks);
        slots.hooks = running;
    }

    /// Number of installed hooks
    pub fn len(&self) -> usize {
        self.slots.borrow().hooks.len()
    }

    /// Whether no hook is installed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for HookList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookList").field("len", &self.len()).finish()
    }
}

/// Keeps a hook installed while alive
#[derive(Debug)]
pub struct HookGuard {
    slots: Weak<RefCell<HookSlots>>,
    id: u64,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        let Some(slots) = self.slots.upgrade() else {
            return;
        };
        let mut slots = slots.borrow_mut();
        match slots.hooks.iter().position(|(id, _)| *id == self.id) {
            Some(index) => {
                slots.hooks.remove(index);
            }
            None => {
                slots.removed.insert(self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn tick(frame: u64) -> TickInfo {
        TickInfo {
            frame,
            tick_duration: 1.0 / 60.0,
        }
    }

    #[test]
    fn test_dropping_guard_uninstalls() {
        let hooks = HookList::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let guard = hooks.install(move |_: &TickInfo, _: &mut [Scene]| counter.set(counter.get() + 1));

        hooks.run(&tick(1), &mut []);
        hooks.run(&tick(2), &mut []);
        assert_eq!(calls.get(), 2);

        drop(guard);
        assert!(hooks.is_empty());
        hooks.run(&tick(3), &mut []);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_hooks_run_in_install_order() {
        let hooks = HookList::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        let _a = hooks.install(move |t: &TickInfo, _: &mut [Scene]| first.borrow_mut().push(("a", t.frame)));
        let _b = hooks.install(move |t: &TickInfo, _: &mut [Scene]| second.borrow_mut().push(("b", t.frame)));

        hooks.run(&tick(7), &mut []);
        assert_eq!(*order.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_guard_dropped_inside_a_hook() {
        let hooks = HookList::new();
        let held: Rc<RefCell<Option<HookGuard>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        let victim = hooks.install(move |_: &TickInfo, _: &mut [Scene]| counter.set(counter.get() + 1));
        *held.borrow_mut() = Some(victim);

        let slot = Rc::clone(&held);
        let _dropper = hooks.install(move |_: &TickInfo, _: &mut [Scene]| {
            slot.borrow_mut().take();
        });

        hooks.run(&tick(1), &mut []);
        assert_eq!(calls.get(), 1);
        assert_eq!(hooks.len(), 1);
        hooks.run(&tick(2), &mut []);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_guard_outliving_list_is_harmless() {
        let hooks = HookList::new();
        let guard = hooks.install(|_: &TickInfo, _: &mut [Scene]| {});
        drop(hooks);
        drop(guard);
    }
}
