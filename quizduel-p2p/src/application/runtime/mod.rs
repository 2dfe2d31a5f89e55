mod game_loop;
mod timer;

pub use game_loop::GameLoop;
pub use timer::IntervalTimer;
