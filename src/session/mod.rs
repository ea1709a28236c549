//! Game session: round tracking, stage machine, polling and player actions

pub mod events;
pub mod game;
pub mod poller;
pub mod rounds;
pub mod stage_machine;
mod submit;

pub use events::{EventBus, GameEvent};
pub use game::GameSession;
pub use poller::SessionView;
pub use rounds::RoundTracker;
pub use stage_machine::{RevealPlan, Snapshot, StageMachine, Transition};
