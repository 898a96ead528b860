pub mod analysis;
pub mod briefing;
pub mod degraded;
pub mod indicators;
pub mod matcher;
pub mod sources;
pub mod types;

pub use analysis::{analyze_market, default_basket};
pub use briefing::synthesize_briefing;
pub use degraded::{simulated_analysis, SIMULATED_MARKER};
pub use matcher::MATCH_TOLERANCE;
pub use types::*;
