pub mod sweeper;

pub use sweeper::{run_sweeper, spawn_sweeper, Sweep, SweeperHandle};
