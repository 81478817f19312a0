pub mod controller;
pub mod handlers;
pub mod session;
pub mod ticker;

pub use controller::ArenaController;
pub use handlers::router;
pub use session::{
    normalize_facebook_link, normalize_uid, ArenaScores, ArenaView, IntakeRequest, Participant,
    Phase, SessionView, WheelSpin,
};
pub use ticker::{start_clock, ClockHandle};
