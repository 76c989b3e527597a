//! Host process pieces for the gauge emissions engines: the scheduler that
//! drives time-based transitions and a scenario simulator built on it.

pub mod scenario;
pub mod scheduler;
pub mod simulator;

pub use scenario::{Action, Scenario, TimedAction};
pub use scheduler::{GovernanceHandle, Scheduler, TickReport, VotingHandle};
pub use simulator::{Simulation, SimulationReport, SimulationState, StepRecord};
