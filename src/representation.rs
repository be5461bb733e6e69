//! Per-state configuration records kept by [`StateMachineConfig`](crate::StateMachineConfig).

use std::collections::HashMap;
use std::hash::Hash;

/// Callback run on entry, exit or as part of a transition.
pub(crate) type Action<CTX> = Box<dyn Fn(&mut CTX) + Send + Sync>;

/// Predicate deciding whether a transition is eligible.
pub(crate) type Guard<CTX> = Box<dyn Fn(&CTX) -> bool + Send + Sync>;

/// What happens when a trigger is accepted by a state.
pub(crate) enum TransitionKind<S> {
    /// Leave the active states up to the common ancestor and enter the destination
    External(S),
    /// Run the transition action without leaving the state
    Internal,
    /// Swallow the trigger
    Ignore,
}

/// A trigger registration on a single state.
pub(crate) struct TriggerBehaviour<S, CTX> {
    pub(crate) kind: TransitionKind<S>,
    pub(crate) guard: Option<Guard<CTX>>,
    pub(crate) action: Option<Action<CTX>>,
}

impl<S, CTX> TriggerBehaviour<S, CTX> {
    pub(crate) fn new(
        kind: TransitionKind<S>,
        guard: Option<Guard<CTX>>,
        action: Option<Action<CTX>>,
    ) -> Self {
        Self {
            kind,
            guard,
            action,
        }
    }

    /// A missing guard always allows the transition.
    pub(crate) fn guard_allows(&self, context: &CTX) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(context))
    }

    #[cfg_attr(not(feature = "plantuml"), allow(dead_code))]
    pub(crate) fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    pub(crate) fn run_action(&self, context: &mut CTX) {
        if let Some(action) = &self.action {
            action(context);
        }
    }
}

/// Entry action, optionally restricted to transitions fired by one trigger.
pub(crate) struct EntryAction<T, CTX> {
    from: Option<T>,
    action: Action<CTX>,
}

impl<T: Eq, CTX> EntryAction<T, CTX> {
    pub(crate) fn new(from: Option<T>, action: Action<CTX>) -> Self {
        Self { from, action }
    }

    fn applies_to(&self, trigger: Option<&T>) -> bool {
        match &self.from {
            None => true,
            Some(expected) => trigger == Some(expected),
        }
    }
}

/// Everything declared for one state through `configure`.
pub(crate) struct StateRepresentation<S, T, CTX> {
    pub(crate) parent: Option<S>,
    pub(crate) initial: Option<S>,
    pub(crate) entry_actions: Vec<EntryAction<T, CTX>>,
    pub(crate) exit_actions: Vec<Action<CTX>>,
    pub(crate) behaviours: HashMap<T, TriggerBehaviour<S, CTX>>,
    // Triggers in the order they were declared
    declared: Vec<T>,
}

impl<S, T, CTX> StateRepresentation<S, T, CTX>
where
    T: Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            parent: None,
            initial: None,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            behaviours: HashMap::new(),
            declared: Vec::new(),
        }
    }

    /// Register `behaviour` for `trigger`. The caller rejects duplicates.
    pub(crate) fn add_behaviour(&mut self, trigger: T, behaviour: TriggerBehaviour<S, CTX>)
    where
        T: Clone,
    {
        self.declared.push(trigger.clone());
        self.behaviours.insert(trigger, behaviour);
    }

    /// Registered behaviours in declaration order.
    pub(crate) fn declared_behaviours(
        &self,
    ) -> impl Iterator<Item = (&T, &TriggerBehaviour<S, CTX>)> + '_ {
        self.declared
            .iter()
            .filter_map(move |trigger| self.behaviours.get(trigger).map(|b| (trigger, b)))
    }

    /// Run entry actions in registration order. `trigger` is `None` for the
    /// initial transition.
    pub(crate) fn enter(&self, trigger: Option<&T>, context: &mut CTX) {
        for entry in &self.entry_actions {
            if entry.applies_to(trigger) {
                (entry.action)(context);
            }
        }
    }

    pub(crate) fn exit(&self, context: &mut CTX) {
        for action in &self.exit_actions {
            action(context);
        }
    }

    /// The behaviour for `trigger`, if registered and its guard holds.
    pub(crate) fn behaviour_for(
        &self,
        trigger: &T,
        context: &CTX,
    ) -> Option<&TriggerBehaviour<S, CTX>> {
        self.behaviours
            .get(trigger)
            .filter(|behaviour| behaviour.guard_allows(context))
    }
}
