pub mod agent;
pub mod congestion;
pub mod driver;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod recovery;
pub mod scheduler;
pub mod state;
pub mod timeout;
pub mod window;

pub use agent::{RenoAgent, Rfc793Agent, TcpAgent};
pub use congestion::{BasicWindow, CongestionControl, RecoveryPhase, SlowStart};
pub use driver::ReplayDriver;
pub use error::ReplayError;
pub use estimator::JacobsonKarels;
pub use metrics::{TcpMetrics, TimeoutSeries, TimeoutUnit, WindowSeries};
pub use recovery::FastRetransmitState;
pub use scheduler::AlarmScheduler;
pub use state::TcpState;
pub use timeout::RetransmitTimer;
pub use window::CongestionWindow;
