pub mod classifier;
pub mod engine;

pub use classifier::{classify, AccessCategory};
pub use engine::{RequestContext, ResolvedLink, RoutingEngine, RoutingOutcome, SourceKind};
