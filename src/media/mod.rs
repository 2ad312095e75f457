pub mod cmd;
pub mod events;
pub mod locate;
pub mod plan;
pub mod probe;
