pub mod pipeline;
pub mod request;
pub mod session;
pub mod validate;

pub use pipeline::ExecutionPipeline;
pub use request::{allowed_fill_modes, build_market_order};
pub use session::{parse_sessions, SessionClock, SessionWindow};
pub use validate::{kill_switch_active, ValidationError};
