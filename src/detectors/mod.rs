pub mod fatigue;
pub mod flow;
pub mod frustration;
pub mod plateau;

pub use fatigue::{FatigueDetector, FatigueInput, FatigueSignal};
pub use flow::{FlowSignal, FlowStateDetector};
pub use frustration::{
    EngagementSignal, FrustrationDetector, FrustrationSignal,
};
pub use plateau::{PlateauDetector, PlateauSignal};
