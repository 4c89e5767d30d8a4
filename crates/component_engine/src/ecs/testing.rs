//! Recording behaviors shared by the lifecycle, editor and engine tests

use super::component::{
    ArgumentDefaults, Arguments, Behavior, BehaviorError, BehaviorFactory, BehaviorType, ComponentContext,
};
use super::loader::{Module, ModuleRegistry};
use crate::value::codec;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) const MODULE: &str = "test.behaviors";

/// Ordered record of hook calls
pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn path(member: &str) -> String {
    format!("{MODULE}.{member}")
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    None,
    Start,
    Update,
}

struct Recorder {
    label: String,
    journal: Journal,
    fault: Fault,
}

impl Behavior for Recorder {
    fn start(&mut self, ctx: &mut ComponentContext<'_>, args: &Arguments) -> Result<(), BehaviorError> {
        let args: Vec<String> = args
            .iter()
            .map(|(name, value)| format!("{name}={}", codec::encode(value)))
            .collect();
        self.journal
            .borrow_mut()
            .push(format!("start {} {} {}", ctx.entity_name, self.label, args.join(",")));
        if self.fault == Fault::Start {
            return Err(BehaviorError::new(format!("{} refused to start", self.label)));
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
        self.journal
            .borrow_mut()
            .push(format!("update {} {} {}", ctx.entity_name, self.label, ctx.frame));
        if self.fault == Fault::Update {
            return Err(BehaviorError::new(format!("{} failed to update", self.label)));
        }
        Ok(())
    }
}

pub(crate) fn recorder(name: &str, journal: &Journal, defaults: ArgumentDefaults, fault: Fault) -> impl BehaviorType {
    let label = name.to_string();
    let journal = Rc::clone(journal);
    BehaviorFactory::new(name, move || {
        Box::new(Recorder {
            label: label.clone(),
            journal: Rc::clone(&journal),
            fault,
        }) as Box<dyn Behavior>
    })
    .with_defaults(defaults)
}

/// `test.behaviors` exporting `Mover`, `Spinner`, `Broken` and `Faulty`
pub(crate) fn registry(journal: &Journal) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    let journal = Rc::clone(journal);
    registry.register(MODULE, move || {
        Module::new(MODULE)
            .with_import("host")
            .with_behavior(recorder(
                "Mover",
                &journal,
                ArgumentDefaults::new().with("speed", 1.0).with("name", "bot"),
                Fault::None,
            ))
            .with_behavior(recorder(
                "Spinner",
                &journal,
                ArgumentDefaults::new()
                    .with("rate", 2)
                    .with_choice("mode", ["slow", "fast"], "slow"),
                Fault::None,
            ))
            .with_behavior(recorder("Broken", &journal, ArgumentDefaults::new(), Fault::Start))
            .with_behavior(recorder("Faulty", &journal, ArgumentDefaults::new(), Fault::Update))
    });
    registry
}

/// Take the recorded calls, leaving the journal empty
pub(crate) fn drain(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.borrow_mut())
}
