/// Timers for modkit scripts
///
/// Timers are a flat list of delay-based callbacks. The host calls
/// [`Timers::tick`] once per discrete time step and every timer that has come
/// due fires, in the order it was scheduled.
pub mod timer;

pub use timer::{Scheduler, TimerCallback, TimerId, Timers};
