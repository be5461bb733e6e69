//! The static description of a hierarchical state machine.
//!
//! A [`StateMachineConfig`] maps every configured state to its entry/exit
//! actions, permitted transitions, parent and initial substate. It is built
//! once through [`StateMachineConfig::configure`] and then borrowed by any
//! number of [`StateMachine`](crate::StateMachine) instances.
//!
//! The substate relation is kept acyclic at all times: [`substate_of`] rejects
//! links that would close a loop, so every ancestor walk terminates.
//!
//! [`substate_of`]: crate::StateConfiguration::substate_of

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::builder::StateConfiguration;
use crate::representation::{StateRepresentation, TriggerBehaviour};
use crate::Error;

/// Registry of state configurations, keyed by state.
pub struct StateMachineConfig<S, T, CTX = ()> {
    pub(crate) states: HashMap<S, StateRepresentation<S, T, CTX>>,
    // Configuration order, used for stable diagram output
    pub(crate) order: Vec<S>,
}

/// The states left and entered by one external transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransitionPath<S> {
    /// Innermost first
    pub(crate) exits: Vec<S>,
    /// Outermost first
    pub(crate) entries: Vec<S>,
}

impl<S, T, CTX> StateMachineConfig<S, T, CTX>
where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    /// Create an empty configuration
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Begin or continue configuring `state`.
    ///
    /// The record is created on first access; later calls return a handle to
    /// the same record so registrations accumulate.
    pub fn configure(&mut self, state: S) -> StateConfiguration<'_, S, T, CTX> {
        self.ensure(&state);
        StateConfiguration::new(self, state)
    }

    pub(crate) fn ensure(&mut self, state: &S) -> &mut StateRepresentation<S, T, CTX> {
        if !self.states.contains_key(state) {
            self.order.push(state.clone());
        }
        self.states
            .entry(state.clone())
            .or_insert_with(StateRepresentation::new)
    }

    /// Whether `configure` has been called for `state`
    pub fn contains(&self, state: &S) -> bool {
        self.states.contains_key(state)
    }

    /// Configured states, in the order they were first configured
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.order.iter()
    }

    /// Parent of `state`, if it was declared a substate
    pub fn parent_of(&self, state: &S) -> Option<&S> {
        self.states.get(state).and_then(|rep| rep.parent.as_ref())
    }

    /// Declared initial substate of a composite state
    pub fn initial_substate_of(&self, state: &S) -> Option<&S> {
        self.states.get(state).and_then(|rep| rep.initial.as_ref())
    }

    /// `state` followed by all of its ancestors, innermost first.
    pub fn ancestors(&self, state: &S) -> Vec<S> {
        let mut chain = vec![state.clone()];
        let mut cursor = state;
        while let Some(parent) = self.parent_of(cursor) {
            chain.push(parent.clone());
            cursor = parent;
        }
        chain
    }

    /// Whether `ancestor` is a strict ancestor of `state`
    pub fn is_substate_of(&self, state: &S, ancestor: &S) -> bool {
        let mut cursor = state;
        while let Some(parent) = self.parent_of(cursor) {
            if parent == ancestor {
                return true;
            }
            cursor = parent;
        }
        false
    }

    pub(crate) fn representation(&self, state: &S) -> Option<&StateRepresentation<S, T, CTX>> {
        self.states.get(state)
    }

    /// Find the innermost state on the active chain of `current` that accepts
    /// `trigger` with a satisfied guard. Returns that state and its behaviour.
    pub(crate) fn resolve(
        &self,
        current: &S,
        trigger: &T,
        context: &CTX,
    ) -> Option<(S, &TriggerBehaviour<S, CTX>)> {
        let mut cursor = Some(current);
        while let Some(state) = cursor {
            if let Some(behaviour) = self
                .representation(state)
                .and_then(|rep| rep.behaviour_for(trigger, context))
            {
                return Some((state.clone(), behaviour));
            }
            cursor = self.parent_of(state);
        }
        None
    }

    /// Exit and entry sequences for an external transition declared on
    /// `source` and fired while `current` is active.
    ///
    /// A transition back to its own source exits every active state up to and
    /// including the source, then re-enters it. Otherwise the states below the
    /// deepest common ancestor-or-self of `source` and `destination` are left
    /// and entered.
    pub(crate) fn transition_path(
        &self,
        current: &S,
        source: &S,
        destination: &S,
    ) -> TransitionPath<S> {
        let current_chain = self.ancestors(current);

        if source == destination {
            let mut exits = Vec::new();
            for state in current_chain {
                let reached_source = &state == source;
                exits.push(state);
                if reached_source {
                    break;
                }
            }
            return TransitionPath {
                exits,
                entries: vec![destination.clone()],
            };
        }

        let source_chain = self.ancestors(source);
        let destination_chain = self.ancestors(destination);
        let common = source_chain
            .iter()
            .find(|state| destination_chain.contains(state));

        let exits = current_chain
            .into_iter()
            .take_while(|state| Some(state) != common)
            .collect();
        let mut entries: Vec<S> = destination_chain
            .into_iter()
            .take_while(|state| Some(state) != common)
            .collect();
        entries.reverse();

        TransitionPath { exits, entries }
    }

    /// Chain of initial substates below `state`, outermost first.
    ///
    /// Every declared initial substate must be a direct substate of the
    /// composite that declares it; this also bounds the descent.
    pub(crate) fn initial_descent(&self, state: &S) -> Result<Vec<S>, Error<S, T>> {
        let mut descent = Vec::new();
        let mut cursor = state;
        while let Some(initial) = self.initial_substate_of(cursor) {
            if self.parent_of(initial) != Some(cursor) {
                return Err(Error::InvalidInitialTransition {
                    state: cursor.clone(),
                    substate: initial.clone(),
                });
            }
            descent.push(initial.clone());
            cursor = initial;
        }
        Ok(descent)
    }

    pub(crate) fn enter_state(&self, state: &S, trigger: Option<&T>, context: &mut CTX) {
        tracing::trace!(state = ?state, trigger = ?trigger, "entering state");
        if let Some(rep) = self.representation(state) {
            rep.enter(trigger, context);
        }
    }

    pub(crate) fn exit_state(&self, state: &S, context: &mut CTX) {
        tracing::trace!(state = ?state, "exiting state");
        if let Some(rep) = self.representation(state) {
            rep.exit(context);
        }
    }

    /// Render this configuration as a PlantUML state diagram.
    ///
    /// `initial` adds the top level `[*] -->` arrow.
    #[cfg(feature = "plantuml")]
    #[cfg_attr(docsrs, doc(cfg(feature = "plantuml")))]
    pub fn export_plantuml(&self, initial: Option<&S>) -> String {
        crate::plantuml::generate_plantuml(self, initial, None)
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(feature = "plantuml"))]
    pub fn export_plantuml(&self, _initial: Option<&S>) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature)")
    }
}

impl<S, T, CTX> Default for StateMachineConfig<S, T, CTX>
where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Debug, T, CTX> Debug for StateMachineConfig<S, T, CTX> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachineConfig")
            .field("states", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestState {
        Root,
        Menu,
        Settings,
        Display,
        Volume,
        Standalone,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestEvent {
        Enter,
        Back,
        Select,
    }

    type TestConfig = StateMachineConfig<TestState, TestEvent, i32>;

    // Root
    // ├── Menu
    // └── Settings
    //     ├── Display
    //     └── Volume
    fn create_test_config() -> TestConfig {
        let mut config = TestConfig::new();
        config
            .configure(TestState::Root)
            .permit(TestEvent::Enter, TestState::Menu)
            .unwrap();
        config
            .configure(TestState::Menu)
            .substate_of(TestState::Root)
            .unwrap()
            .permit(TestEvent::Select, TestState::Settings)
            .unwrap();
        config
            .configure(TestState::Settings)
            .substate_of(TestState::Root)
            .unwrap()
            .permit_if(TestEvent::Back, TestState::Menu, |value| *value > 0)
            .unwrap();
        config
            .configure(TestState::Display)
            .substate_of(TestState::Settings)
            .unwrap();
        config
            .configure(TestState::Volume)
            .substate_of(TestState::Settings)
            .unwrap()
            .permit(TestEvent::Back, TestState::Display)
            .unwrap();
        config
    }

    #[test]
    fn test_configure_is_idempotent() {
        let mut config = TestConfig::new();
        config.configure(TestState::Root);
        config.configure(TestState::Menu);
        config.configure(TestState::Root);

        let states: Vec<_> = config.states().cloned().collect();
        assert_eq!(states, vec![TestState::Root, TestState::Menu]);
        assert!(config.contains(&TestState::Root));
        assert!(!config.contains(&TestState::Display));
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let config = create_test_config();

        assert_eq!(
            config.ancestors(&TestState::Display),
            vec![TestState::Display, TestState::Settings, TestState::Root]
        );
        assert_eq!(config.ancestors(&TestState::Root), vec![TestState::Root]);
        // Unconfigured states are their own root
        assert_eq!(
            config.ancestors(&TestState::Standalone),
            vec![TestState::Standalone]
        );
    }

    #[test]
    fn test_is_substate_of() {
        let config = create_test_config();

        assert!(config.is_substate_of(&TestState::Display, &TestState::Settings));
        assert!(config.is_substate_of(&TestState::Display, &TestState::Root));
        assert!(!config.is_substate_of(&TestState::Display, &TestState::Display));
        assert!(!config.is_substate_of(&TestState::Root, &TestState::Display));
        assert!(!config.is_substate_of(&TestState::Menu, &TestState::Settings));
    }

    #[test]
    fn test_resolve_walks_up_the_chain() {
        let config = create_test_config();

        let (source, _) = config
            .resolve(&TestState::Display, &TestEvent::Enter, &0)
            .unwrap();
        assert_eq!(source, TestState::Root);

        assert!(config
            .resolve(&TestState::Root, &TestEvent::Select, &0)
            .is_none());
    }

    #[test]
    fn test_resolve_skips_failed_guards() {
        let config = create_test_config();

        // Volume handles Back itself, no guard
        let (source, _) = config
            .resolve(&TestState::Volume, &TestEvent::Back, &0)
            .unwrap();
        assert_eq!(source, TestState::Volume);

        // Display inherits Back from Settings, whose guard needs a positive value
        assert!(config
            .resolve(&TestState::Display, &TestEvent::Back, &0)
            .is_none());
        let (source, _) = config
            .resolve(&TestState::Display, &TestEvent::Back, &1)
            .unwrap();
        assert_eq!(source, TestState::Settings);
    }

    #[test]
    fn test_transition_path_between_siblings() {
        let config = create_test_config();

        let path = config.transition_path(
            &TestState::Display,
            &TestState::Display,
            &TestState::Volume,
        );
        assert_eq!(path.exits, vec![TestState::Display]);
        assert_eq!(path.entries, vec![TestState::Volume]);
    }

    #[test]
    fn test_transition_path_across_branches() {
        let config = create_test_config();

        let path = config.transition_path(
            &TestState::Display,
            &TestState::Display,
            &TestState::Menu,
        );
        assert_eq!(path.exits, vec![TestState::Display, TestState::Settings]);
        assert_eq!(path.entries, vec![TestState::Menu]);

        let path = config.transition_path(&TestState::Menu, &TestState::Menu, &TestState::Volume);
        assert_eq!(path.exits, vec![TestState::Menu]);
        assert_eq!(path.entries, vec![TestState::Settings, TestState::Volume]);
    }

    #[test]
    fn test_transition_path_between_roots() {
        let config = create_test_config();

        let path = config.transition_path(
            &TestState::Display,
            &TestState::Root,
            &TestState::Standalone,
        );
        assert_eq!(
            path.exits,
            vec![TestState::Display, TestState::Settings, TestState::Root]
        );
        assert_eq!(path.entries, vec![TestState::Standalone]);
    }

    #[test]
    fn test_transition_path_self_transition() {
        let config = create_test_config();

        let path = config.transition_path(&TestState::Menu, &TestState::Menu, &TestState::Menu);
        assert_eq!(path.exits, vec![TestState::Menu]);
        assert_eq!(path.entries, vec![TestState::Menu]);

        // Reentry declared on an ancestor leaves everything below it too
        let path = config.transition_path(
            &TestState::Display,
            &TestState::Settings,
            &TestState::Settings,
        );
        assert_eq!(path.exits, vec![TestState::Display, TestState::Settings]);
        assert_eq!(path.entries, vec![TestState::Settings]);
    }

    #[test]
    fn test_transition_path_to_ancestor_and_descendant() {
        let config = create_test_config();

        // Display -> Settings, declared on Display: Settings stays active
        let path = config.transition_path(
            &TestState::Display,
            &TestState::Display,
            &TestState::Settings,
        );
        assert_eq!(path.exits, vec![TestState::Display]);
        assert!(path.entries.is_empty());

        // Settings -> Display while Volume is active
        let path = config.transition_path(
            &TestState::Volume,
            &TestState::Settings,
            &TestState::Display,
        );
        assert_eq!(path.exits, vec![TestState::Volume]);
        assert_eq!(path.entries, vec![TestState::Display]);
    }

    #[test]
    fn test_initial_descent() {
        let mut config = create_test_config();
        config
            .configure(TestState::Root)
            .initial_transition(TestState::Settings)
            .unwrap();
        config
            .configure(TestState::Settings)
            .initial_transition(TestState::Volume)
            .unwrap();

        assert_eq!(
            config.initial_descent(&TestState::Root).unwrap(),
            vec![TestState::Settings, TestState::Volume]
        );
        assert!(config.initial_descent(&TestState::Menu).unwrap().is_empty());
    }

    #[test]
    fn test_initial_descent_rejects_non_substate() {
        let mut config = create_test_config();
        config
            .configure(TestState::Settings)
            .initial_transition(TestState::Menu)
            .unwrap();

        assert_eq!(
            config.initial_descent(&TestState::Settings),
            Err(Error::InvalidInitialTransition {
                state: TestState::Settings,
                substate: TestState::Menu,
            })
        );
    }
}
