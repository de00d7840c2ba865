//! Fluent builder for constructing a [`ParkingPolicyEngine`].

use pw_core::{EngineSettings, NoopDispatcher, NullRelocator, ParkingRelocator, TickDispatcher};

use crate::{EngineResult, ParkingPolicyEngine};

/// Fluent builder for [`ParkingPolicyEngine`].
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                     |
/// |----------------------|-----------------------------|
/// | `.settings(s)`       | `EngineSettings::default()` |
/// | `.relocator(r)`      | [`NullRelocator`]           |
/// | `.dispatcher(d)`     | [`NoopDispatcher`]          |
/// | `.active(b)`         | `true`                      |
///
/// The engine is bound to the thread that calls [`build`](Self::build).  A
/// host that builds on a loader thread must call
/// [`ParkingPolicyEngine::rebind_to_current_thread`] from its simulation
/// thread before use.
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = EngineBuilder::new()
///     .settings(EngineSettings::from_toml_str(&text)?)
///     .dispatcher(MyDispatcher::new(sim_handle))
///     .build()?;
/// engine.set_rule(lot, Rule::residents_within(300))?;
/// ```
pub struct EngineBuilder {
    settings:   EngineSettings,
    relocator:  Box<dyn ParkingRelocator>,
    dispatcher: Box<dyn TickDispatcher>,
    active:     bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            settings:   EngineSettings::default(),
            relocator:  Box::new(NullRelocator),
            dispatcher: Box::new(NoopDispatcher),
            active:     true,
        }
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Install a path-aware relocation backend.  It is used only while it
    /// reports itself available and the settings select it.
    pub fn relocator<R: ParkingRelocator + 'static>(mut self, relocator: R) -> Self {
        self.relocator = Box::new(relocator);
        self
    }

    /// Install the hook the engine uses to ask for its next tick.
    pub fn dispatcher<D: TickDispatcher + 'static>(mut self, dispatcher: D) -> Self {
        self.dispatcher = Box::new(dispatcher);
        self
    }

    /// Initial state of the feature gate.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate settings and return an engine bound to the calling thread.
    pub fn build(self) -> EngineResult<ParkingPolicyEngine> {
        self.settings.validate()?;
        let mut engine = ParkingPolicyEngine::from_parts(self.settings, self.relocator, self.dispatcher);
        engine.set_active(self.active);
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
