//! The runtime half of the hierarchical state machine.
//!
//! # Type Parameters
//! - `S`: State identifier type. Must implement `Hash`, `Eq`, `Clone` and `Debug`.
//! - `T`: Trigger type. Same bounds as `S`.
//! - `CTX`: Context owned by the machine and handed to every action and guard.
//!
//! # Usage
//! 1. Describe the states in a [`StateMachineConfig`].
//! 2. Create a [`StateMachine`] borrowing that configuration.
//! 3. Call [`StateMachine::fire_initial_transition`] once.
//! 4. Call [`StateMachine::fire`] for every trigger.
//!
//! # Transition protocol
//! For an external transition from the active state `C`, declared on `H`
//! (`C` or one of its ancestors) and targeting `D`:
//! 1. States from `C` up to, but excluding, the deepest common
//!    ancestor-or-self of `H` and `D` are exited, innermost first. When
//!    `D == H` the transition is a reentry and `H` itself is exited.
//! 2. The transition action runs.
//! 3. States below the common ancestor down to `D` are entered, outermost first.
//! 4. Initial substates below `D` are entered until a leaf is reached.
//! 5. The leaf becomes the current state.
//!
//! # Errors
//! Runtime methods return [`Error<S, T>`]: [`Error::UnhandledTrigger`] when no
//! active state accepts a trigger, [`Error::InvalidOperation`] when the
//! initial transition is misused.
//!
//! # Panics
//! Actions run synchronously on the caller's stack and are not caught. If an
//! action panics mid-transition, actions already run are not undone and the
//! current state keeps its previous value.

use std::{fmt::Debug, hash::Hash};

use crate::config::StateMachineConfig;
use crate::representation::TransitionKind;
use crate::{Error, Result};

/// A hierarchical state machine bound to a shared configuration.
pub struct StateMachine<'c, S, T, CTX = ()> {
    config: &'c StateMachineConfig<S, T, CTX>,
    current_state: S,
    context: CTX,
    started: bool,
}

impl<'c, S, T, CTX> StateMachine<'c, S, T, CTX>
where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    /// Create a machine in `initial`. No action runs until
    /// [`fire_initial_transition`](Self::fire_initial_transition).
    pub fn new(initial: S, config: &'c StateMachineConfig<S, T, CTX>, context: CTX) -> Self {
        Self {
            config,
            current_state: initial,
            context,
            started: false,
        }
    }

    /// Enter the initial state.
    ///
    /// The initial state is entered, then its chain of initial substates.
    /// Ancestors of the initial state are treated as already active and run
    /// no entry action. Must be called exactly once, before any
    /// [`fire`](Self::fire).
    pub fn fire_initial_transition(&mut self) -> Result<(), S, T> {
        if self.started {
            tracing::warn!(state = ?self.current_state, "initial transition fired twice");
            return Err(Error::InvalidOperation(
                "the initial transition has already been fired".to_string(),
            ));
        }

        let config = self.config;
        let descent = config.initial_descent(&self.current_state)?;
        self.started = true;

        config.enter_state(&self.current_state, None, &mut self.context);
        for state in &descent {
            config.enter_state(state, None, &mut self.context);
        }

        if let Some(leaf) = descent.last() {
            self.current_state = leaf.clone();
        }
        tracing::debug!(state = ?self.current_state, "initial transition fired");
        Ok(())
    }

    /// Fire `trigger` and run the selected transition to completion.
    ///
    /// Returns [`Error::UnhandledTrigger`] without side effects when no state
    /// on the active chain accepts the trigger.
    pub fn fire(&mut self, trigger: T) -> Result<(), S, T> {
        if !self.started {
            return Err(Error::InvalidOperation(format!(
                "trigger {:?} fired before the initial transition",
                trigger
            )));
        }

        let config = self.config;
        let Some((source, behaviour)) =
            config.resolve(&self.current_state, &trigger, &self.context)
        else {
            tracing::debug!(state = ?self.current_state, trigger = ?trigger, "unhandled trigger");
            return Err(Error::UnhandledTrigger {
                state: self.current_state.clone(),
                trigger,
            });
        };

        let destination = match &behaviour.kind {
            TransitionKind::Ignore => {
                tracing::trace!(state = ?source, trigger = ?trigger, "trigger ignored");
                return Ok(());
            }
            TransitionKind::Internal => {
                tracing::debug!(state = ?source, trigger = ?trigger, "internal transition");
                behaviour.run_action(&mut self.context);
                return Ok(());
            }
            TransitionKind::External(destination) => destination,
        };

        // Resolve everything before running the first action
        let path = config.transition_path(&self.current_state, &source, destination);
        let descent = config.initial_descent(destination)?;

        tracing::debug!(
            from = ?self.current_state,
            source = ?source,
            to = ?destination,
            trigger = ?trigger,
            "transition"
        );

        for state in &path.exits {
            config.exit_state(state, &mut self.context);
        }
        behaviour.run_action(&mut self.context);
        for state in path.entries.iter().chain(descent.iter()) {
            config.enter_state(state, Some(&trigger), &mut self.context);
        }

        self.current_state = descent.last().unwrap_or(destination).clone();
        Ok(())
    }

    /// Whether [`fire`](Self::fire) would accept `trigger` in the current
    /// state. Guards are evaluated; nothing else runs.
    pub fn can_fire(&self, trigger: &T) -> bool {
        self.config
            .resolve(&self.current_state, trigger, &self.context)
            .is_some()
    }

    /// Triggers accepted in the current state.
    ///
    /// Triggers declared on the current state come first, in declaration
    /// order, followed by those inherited from each ancestor in turn. Guards
    /// are evaluated; ignored triggers count as accepted and are included.
    pub fn permitted_triggers(&self) -> Vec<T> {
        let mut triggers: Vec<T> = Vec::new();
        for state in self.config.ancestors(&self.current_state) {
            let Some(rep) = self.config.representation(&state) else {
                continue;
            };
            for (trigger, behaviour) in rep.declared_behaviours() {
                if behaviour.guard_allows(&self.context) && !triggers.contains(trigger) {
                    triggers.push(trigger.clone());
                }
            }
        }
        triggers
    }

    /// Get the current state
    pub fn state(&self) -> &S {
        &self.current_state
    }

    /// Whether `state` is the current state or one of its ancestors
    pub fn is_in_state(&self, state: &S) -> bool {
        &self.current_state == state || self.config.is_substate_of(&self.current_state, state)
    }

    /// Whether the initial transition has been fired
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The configuration this machine runs against
    pub fn config(&self) -> &'c StateMachineConfig<S, T, CTX> {
        self.config
    }

    /// Get a reference to the context
    pub fn context(&self) -> &CTX {
        &self.context
    }

    /// Get a mutable reference to the context
    pub fn context_mut(&mut self) -> &mut CTX {
        &mut self.context
    }

    /// Consume the machine and return its context
    pub fn into_context(self) -> CTX {
        self.context
    }

    /// Export the configuration as PlantUML with the current state highlighted
    #[cfg(feature = "plantuml")]
    #[cfg_attr(docsrs, doc(cfg(feature = "plantuml")))]
    pub fn export_plantuml(&self) -> String {
        crate::plantuml::generate_plantuml(self.config, None, Some(&self.current_state))
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(feature = "plantuml"))]
    pub fn export_plantuml(&self) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature)")
    }
}

impl<S: Debug, T, CTX> Debug for StateMachine<'_, S, T, CTX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current_state", &self.current_state)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}
