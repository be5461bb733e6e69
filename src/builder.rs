//! Fluent configuration of a single state

use std::fmt::Debug;
use std::hash::Hash;

use crate::config::StateMachineConfig;
use crate::representation::{
    Action, EntryAction, Guard, StateRepresentation, TransitionKind, TriggerBehaviour,
};
use crate::{Error, Result};

/// Handle returned by [`StateMachineConfig::configure`].
///
/// Infallible registrations return `Self`; registrations that can break an
/// invariant of the configuration return [`Result<Self>`](crate::Result) so
/// calls chain with `?`:
///
/// ```rust
/// use hierarchical_fsm::StateMachineConfig;
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// enum State { Idle, Selection }
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// enum Trigger { CoinInserted, Cancel }
///
/// # fn main() -> Result<(), hierarchical_fsm::Error<State, Trigger>> {
/// let mut config: StateMachineConfig<State, Trigger, Vec<&'static str>> = StateMachineConfig::new();
/// config
///     .configure(State::Selection)
///     .on_entry(|log| log.push("show list"))
///     .permit(Trigger::Cancel, State::Idle)?
///     .permit(Trigger::CoinInserted, State::Selection)?;
/// # Ok(())
/// # }
/// ```
pub struct StateConfiguration<'a, S, T, CTX> {
    config: &'a mut StateMachineConfig<S, T, CTX>,
    state: S,
}

impl<'a, S, T, CTX> StateConfiguration<'a, S, T, CTX>
where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    pub(crate) fn new(config: &'a mut StateMachineConfig<S, T, CTX>, state: S) -> Self {
        Self { config, state }
    }

    /// The state being configured
    pub fn state(&self) -> &S {
        &self.state
    }

    fn representation(&mut self) -> &mut StateRepresentation<S, T, CTX> {
        self.config.ensure(&self.state)
    }

    /// Add an action run whenever the state is entered
    pub fn on_entry<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.representation()
            .entry_actions
            .push(EntryAction::new(None, Box::new(action)));
        self
    }

    /// Add an action run only when the state is entered by a transition fired
    /// with `trigger`
    pub fn on_entry_from<F>(mut self, trigger: T, action: F) -> Self
    where
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.representation()
            .entry_actions
            .push(EntryAction::new(Some(trigger), Box::new(action)));
        self
    }

    /// Add an action run whenever the state is left
    pub fn on_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.representation().exit_actions.push(Box::new(action));
        self
    }

    /// Accept `trigger` and transition to `destination`
    pub fn permit(self, trigger: T, destination: S) -> Result<Self, S, T> {
        self.add_behaviour(trigger, TransitionKind::External(destination), None, None)
    }

    /// Accept `trigger`, transition to `destination` and run `action` between
    /// the exit and entry actions
    pub fn permit_with_action<F>(self, trigger: T, destination: S, action: F) -> Result<Self, S, T>
    where
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.add_behaviour(
            trigger,
            TransitionKind::External(destination),
            None,
            Some(Box::new(action)),
        )
    }

    /// Accept `trigger` only while `guard` holds
    pub fn permit_if<G>(self, trigger: T, destination: S, guard: G) -> Result<Self, S, T>
    where
        G: Fn(&CTX) -> bool + Send + Sync + 'static,
    {
        self.add_behaviour(
            trigger,
            TransitionKind::External(destination),
            Some(Box::new(guard)),
            None,
        )
    }

    /// Guarded transition with a transition action
    pub fn permit_if_with_action<G, F>(
        self,
        trigger: T,
        destination: S,
        guard: G,
        action: F,
    ) -> Result<Self, S, T>
    where
        G: Fn(&CTX) -> bool + Send + Sync + 'static,
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.add_behaviour(
            trigger,
            TransitionKind::External(destination),
            Some(Box::new(guard)),
            Some(Box::new(action)),
        )
    }

    /// Accept `trigger` by leaving and re-entering this state
    pub fn permit_reentry(self, trigger: T) -> Result<Self, S, T> {
        let destination = self.state.clone();
        self.permit(trigger, destination)
    }

    /// Accept `trigger` by running `action` without leaving the state
    pub fn permit_internal<F>(self, trigger: T, action: F) -> Result<Self, S, T>
    where
        F: Fn(&mut CTX) + Send + Sync + 'static,
    {
        self.add_behaviour(trigger, TransitionKind::Internal, None, Some(Box::new(action)))
    }

    /// Accept `trigger` and do nothing. Ancestors are not consulted.
    pub fn ignore(self, trigger: T) -> Result<Self, S, T> {
        self.add_behaviour(trigger, TransitionKind::Ignore, None, None)
    }

    /// Make this state a substate of `parent`.
    ///
    /// Fails with [`Error::Cycle`] when `parent` is this state or one of its
    /// descendants.
    pub fn substate_of(mut self, parent: S) -> Result<Self, S, T> {
        if parent == self.state || self.config.is_substate_of(&parent, &self.state) {
            return Err(Error::Cycle {
                state: self.state.clone(),
                parent,
            });
        }
        self.representation().parent = Some(parent);
        Ok(self)
    }

    /// Declare the substate entered by default whenever this state is the
    /// target of a transition
    pub fn initial_transition(mut self, substate: S) -> Result<Self, S, T> {
        if self.representation().initial.is_some() {
            return Err(Error::DuplicateInitialTransition(self.state.clone()));
        }
        self.representation().initial = Some(substate);
        Ok(self)
    }

    fn add_behaviour(
        mut self,
        trigger: T,
        kind: TransitionKind<S>,
        guard: Option<Guard<CTX>>,
        action: Option<Action<CTX>>,
    ) -> Result<Self, S, T> {
        if self.representation().behaviours.contains_key(&trigger) {
            return Err(Error::DuplicateTrigger {
                state: self.state.clone(),
                trigger,
            });
        }
        self.representation().add_behaviour(trigger, TriggerBehaviour::new(kind, guard, action));
        Ok(self)
    }
}

impl<S: Debug, T, CTX> Debug for StateConfiguration<'_, S, T, CTX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateConfiguration")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
