//! # Hierarchical State Machine
//!
//! A synchronous hierarchical finite state machine in Rust with entry/exit
//! actions, guarded transitions, initial substates and PlantUML diagram
//! generation.
//!
//! ## Features
//!
//! - 🏗️ **Hierarchical States**: Substates inherit unhandled triggers from their ancestors
//! - 🚪 **Entry/Exit Actions**: Run in least-common-ancestor order across hierarchy boundaries
//! - 🛡️ **Guards**: The innermost transition whose guard holds wins
//! - 🔁 **Transition Kinds**: External, reentry, internal and ignored triggers
//! - 📊 **PlantUML Export**: State diagram generation (`plantuml` feature)
//! - 🧵 **Shareable Config**: One configuration, borrowed by any number of machines
//!
//! ## Quick Start
//!
//! ```rust
//! use hierarchical_fsm::*;
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! enum State { Idle, Running, Playing, Paused }
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! enum Trigger { Start, Pause, Stop }
//!
//! # fn main() -> Result<(), State, Trigger> {
//! let mut config: StateMachineConfig<State, Trigger, Vec<&'static str>> = StateMachineConfig::new();
//!
//! config
//!     .configure(State::Idle)
//!     .permit(Trigger::Start, State::Playing)?;
//! config
//!     .configure(State::Running)
//!     .on_entry(|log| log.push("show timer"))
//!     .on_exit(|log| log.push("hide timer"))
//!     .permit(Trigger::Stop, State::Idle)?;
//! config
//!     .configure(State::Playing)
//!     .substate_of(State::Running)?
//!     .on_entry(|log| log.push("play"))
//!     .permit(Trigger::Pause, State::Paused)?;
//! config
//!     .configure(State::Paused)
//!     .substate_of(State::Running)?;
//!
//! let mut fsm = StateMachine::new(State::Idle, &config, Vec::new());
//! fsm.fire_initial_transition()?;
//! fsm.fire(Trigger::Start)?;
//! fsm.fire(Trigger::Stop)?;
//!
//! assert_eq!(fsm.state(), &State::Idle);
//! assert_eq!(fsm.context(), &vec!["show timer", "play", "hide timer"]);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod fsm;
mod representation;

#[cfg(feature = "plantuml")]
mod plantuml;

pub use builder::StateConfiguration;
pub use config::StateMachineConfig;
pub use error::{Error, Result};
pub use fsm::StateMachine;

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{Error, Result, StateConfiguration, StateMachine, StateMachineConfig};
}
