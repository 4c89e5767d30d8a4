//! Sample behaviors for the demo scene

use component_engine::prelude::*;

/// Module exporting the motion behaviors
pub const MOTION_MODULE: &str = "demo.motion";

/// Module exporting the lifetime behavior
pub const LIFETIME_MODULE: &str = "demo.lifetime";

/// Moves the entity along a velocity, storing the result in `position`
#[derive(Default)]
struct Mover {
    velocity: Vec3,
}

impl Behavior for Mover {
    fn start(&mut self, ctx: &mut ComponentContext<'_>, args: &Arguments) -> Result<(), BehaviorError> {
        let direction = args.get_vector3("direction").unwrap_or_else(Vec3::x);
        let speed = args.get_float("speed").unwrap_or(1.0);
        #[allow(clippy::cast_possible_truncation)]
        let speed = speed as f32;
        self.velocity = direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros) * speed;

        let mut position = UnionValue::new("position", ctx.properties);
        if position.kind()?.is_none() {
            position.set_vector3(Vec3::zeros())?;
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
        let mut position = UnionValue::new("position", ctx.properties);
        #[allow(clippy::cast_possible_truncation)]
        let step = self.velocity * ctx.tick_duration as f32;
        let current = position.get_vector3()?;
        position.set_vector3(current + step)?;
        Ok(())
    }
}

/// Spins the entity around one axis, storing degrees in `angle`
#[derive(Default)]
struct Spinner {
    rate: f64,
    axis: String,
}

impl Behavior for Spinner {
    fn start(&mut self, ctx: &mut ComponentContext<'_>, args: &Arguments) -> Result<(), BehaviorError> {
        self.rate = args.get_float("rate").unwrap_or_default();
        self.axis = args.get_choice("axis").unwrap_or("y").to_string();
        UnionValue::new("angle", ctx.properties).set_float(0.0)?;
        log::debug!("{} spins around {} at {} deg/s", ctx.entity_name, self.axis, self.rate);
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
        let mut angle = UnionValue::new("angle", ctx.properties);
        let next = (angle.get_float()? + self.rate * ctx.tick_duration).rem_euclid(360.0);
        angle.set_float(next)?;
        Ok(())
    }
}

/// Counts ticks down and reports when the entity's time is up
#[derive(Default)]
struct Lifetime {
    remaining: i64,
    label: String,
}

impl Behavior for Lifetime {
    fn start(&mut self, ctx: &mut ComponentContext<'_>, args: &Arguments) -> Result<(), BehaviorError> {
        self.remaining = args.get_integer("ticks").unwrap_or_default();
        self.label = args
            .get_str("label")
            .filter(|label| !label.is_empty())
            .unwrap_or(ctx.entity_name)
            .to_string();
        if self.remaining < 0 {
            return Err(BehaviorError::new(format!("{}: negative lifetime {}", self.label, self.remaining)));
        }
        UnionValue::new("remaining", ctx.properties).set_integer(self.remaining)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> Result<(), BehaviorError> {
        if self.remaining == 0 {
            return Ok(());
        }
        self.remaining -= 1;
        UnionValue::new("remaining", ctx.properties).set_integer(self.remaining)?;
        if self.remaining == 0 {
            log::info!("{} expired on frame {}", self.label, ctx.frame);
        }
        Ok(())
    }
}

fn motion_module() -> Module {
    Module::new(MOTION_MODULE)
        .with_import("host")
        .with_behavior(
            BehaviorFactory::new("Mover", || Box::new(Mover::default()) as Box<dyn Behavior>).with_defaults(
                ArgumentDefaults::new()
                    .with("direction", Vec3::new(1.0, 0.0, 0.0))
                    .with("speed", 1.0),
            ),
        )
        .with_behavior(
            BehaviorFactory::new("Spinner", || Box::new(Spinner::default()) as Box<dyn Behavior>).with_defaults(
                ArgumentDefaults::new()
                    .with("rate", 45.0)
                    .with_choice("axis", ["x", "y", "z"], "y"),
            ),
        )
}

fn lifetime_module() -> Module {
    Module::new(LIFETIME_MODULE)
        .with_import("host")
        .with_import("host.types")
        .with_behavior(
            BehaviorFactory::new("Lifetime", || Box::new(Lifetime::default()) as Box<dyn Behavior>).with_defaults(
                ArgumentDefaults::new().with("ticks", 120).with("label", ""),
            ),
        )
}

/// Registry with the demo modules and the host API surface they import
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_module(Module::new("host"));
    registry.register_module(Module::new("host.types"));
    registry.register(MOTION_MODULE, motion_module);
    registry.register(LIFETIME_MODULE, lifetime_module);
    registry
}
