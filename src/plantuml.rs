//! PlantUML diagram generation

use std::fmt::Debug;
use std::hash::Hash;

use crate::config::StateMachineConfig;
use crate::representation::TransitionKind;

/// Generate a PlantUML state diagram from a configuration.
///
/// Substates are nested inside their parents, composite states get an
/// `[*] -->` arrow to their initial substate, and `current` (if any) is
/// tagged `<<Current>>`.
pub(crate) fn generate_plantuml<S, T, CTX>(
    config: &StateMachineConfig<S, T, CTX>,
    initial: Option<&S>,
    current: Option<&S>,
) -> String
where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    let mut out = String::from(
        "@startuml\nskinparam state {\n  BackgroundColor<<Current>> YellowGreen\n}\n\n",
    );

    // Parents may be referenced without being configured
    let mut known: Vec<S> = config.states().cloned().collect();
    for state in config.states() {
        if let Some(parent) = config.parent_of(state) {
            if !known.contains(parent) {
                known.push(parent.clone());
            }
        }
    }

    if let Some(initial) = initial {
        out += &format!("[*] --> {:?}\n", initial);
    }
    for state in known.iter().filter(|s| config.parent_of(s).is_none()) {
        render_state(&mut out, config, &known, state, 0);
    }
    out.push('\n');

    for state in config.states() {
        let Some(rep) = config.representation(state) else {
            continue;
        };
        let mut behaviours: Vec<_> = rep.behaviours.iter().collect();
        behaviours.sort_by_key(|(trigger, _)| format!("{:?}", trigger));

        for (trigger, behaviour) in behaviours {
            let guard = if behaviour.is_guarded() { " [guard]" } else { "" };
            match &behaviour.kind {
                TransitionKind::External(destination) => {
                    out += &format!("{:?} --> {:?} : {:?}{}\n", state, destination, trigger, guard);
                }
                TransitionKind::Internal => {
                    out += &format!("{:?} : {:?}{} / internal\n", state, trigger, guard);
                }
                TransitionKind::Ignore => {
                    out += &format!("{:?} : {:?} / ignore\n", state, trigger);
                }
            }
        }
    }

    // Mark current state
    if let Some(current) = current {
        out += &format!("state {:?} <<Current>>\n", current);
    }

    out += "@enduml\n";
    out
}

fn render_state<S, T, CTX>(
    out: &mut String,
    config: &StateMachineConfig<S, T, CTX>,
    known: &[S],
    state: &S,
    depth: usize,
) where
    S: Clone + Debug + Eq + Hash,
    T: Clone + Debug + Eq + Hash,
{
    let indent = "  ".repeat(depth);
    let children: Vec<&S> = known
        .iter()
        .filter(|s| config.parent_of(s) == Some(state))
        .collect();

    if children.is_empty() {
        *out += &format!("{}state {:?}\n", indent, state);
        return;
    }

    *out += &format!("{}state {:?} {{\n", indent, state);
    if let Some(initial) = config.initial_substate_of(state) {
        *out += &format!("{}  [*] --> {:?}\n", indent, initial);
    }
    for child in children {
        render_state(out, config, known, child, depth + 1);
    }
    *out += &format!("{}}}\n", indent);
}

#[cfg(test)]
mod tests {
    use crate::{StateMachine, StateMachineConfig};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestState {
        Idle,
        Running,
        Playing,
        Paused,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestEvent {
        Start,
        Stop,
        Pause,
        Resume,
        Tick,
    }

    type TestConfig = StateMachineConfig<TestState, TestEvent, u32>;

    fn create_test_config() -> TestConfig {
        let mut config = TestConfig::new();
        config
            .configure(TestState::Idle)
            .permit(TestEvent::Start, TestState::Running)
            .unwrap();
        config
            .configure(TestState::Running)
            .initial_transition(TestState::Playing)
            .unwrap()
            .permit(TestEvent::Stop, TestState::Idle)
            .unwrap()
            .permit_internal(TestEvent::Tick, |ticks| *ticks += 1)
            .unwrap();
        config
            .configure(TestState::Playing)
            .substate_of(TestState::Running)
            .unwrap()
            .permit(TestEvent::Pause, TestState::Paused)
            .unwrap();
        config
            .configure(TestState::Paused)
            .substate_of(TestState::Running)
            .unwrap()
            .permit_if(TestEvent::Resume, TestState::Playing, |ticks| *ticks < 10)
            .unwrap();
        config
    }

    #[test]
    fn test_plantuml_generation() {
        let config = create_test_config();
        let plantuml = config.export_plantuml(Some(&TestState::Idle));

        assert!(plantuml.starts_with("@startuml"));
        assert!(plantuml.ends_with("@enduml\n"));
        assert!(plantuml.contains("[*] --> Idle"));
        assert!(plantuml
            .contains("state Running {\n  [*] --> Playing\n  state Playing\n  state Paused\n}"));
        assert!(plantuml.contains("Idle --> Running : Start"));
        assert!(plantuml.contains("Running --> Idle : Stop"));
        assert!(plantuml.contains("Running : Tick / internal"));
        assert!(plantuml.contains("Paused --> Playing : Resume [guard]"));
        assert!(!plantuml.contains(" <<Current>>"));
    }

    #[test]
    fn test_plantuml_marks_current_state() {
        let config = create_test_config();
        let mut fsm = StateMachine::new(TestState::Idle, &config, 0);
        fsm.fire_initial_transition().unwrap();
        fsm.fire(TestEvent::Start).unwrap();

        let plantuml = fsm.export_plantuml();
        assert!(plantuml.contains("state Playing <<Current>>"));
        assert!(!plantuml.contains("[*] --> Idle"));
    }

    #[test]
    fn test_unconfigured_parent_is_rendered() {
        let mut config = TestConfig::new();
        config
            .configure(TestState::Paused)
            .substate_of(TestState::Running)
            .unwrap();

        let plantuml = config.export_plantuml(None);
        assert!(plantuml.contains("state Running {\n  state Paused\n}"));
    }
}
