//! Runtime actor handles.

/// Simulator actor handle type
pub type ActorId = u32;

/// Role name given to the ego vehicle when none is provided
pub const DEFAULT_ROLE_NAME: &str = "scenario";
