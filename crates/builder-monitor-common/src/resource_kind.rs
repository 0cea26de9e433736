//! AppStream 2.0 builder kinds
//!
//! Both kinds share one monitoring engine; everything that differs between
//! them (active states, configuration prefix, wording) lives here.

/// Kinds of AppStream 2.0 builders watched by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderKind {
    /// App block builder
    #[display("app block builder")]
    AppBlockBuilder,
    /// Image builder
    #[display("image builder")]
    ImageBuilder,
}

impl BuilderKind {
    /// All kinds, in the order they are processed within a region
    pub const ALL: [BuilderKind; 2] = [BuilderKind::AppBlockBuilder, BuilderKind::ImageBuilder];

    /// Lifecycle states during which the builder is billed and tracked
    pub fn active_states(self) -> &'static [&'static str] {
        match self {
            BuilderKind::AppBlockBuilder => &["STARTING", "RUNNING"],
            BuilderKind::ImageBuilder => &["PENDING", "UPDATING_AGENT", "RUNNING", "REBOOTING"],
        }
    }

    /// Check whether a lifecycle state counts as active for this kind
    pub fn is_active(self, state: &str) -> bool {
        self.active_states().contains(&state)
    }

    /// Prefix of the environment variables configuring this kind
    pub fn env_prefix(self) -> &'static str {
        match self {
            BuilderKind::AppBlockBuilder => "ABB",
            BuilderKind::ImageBuilder => "IB",
        }
    }

    /// Human-readable name with the first letter capitalized
    pub fn title(self) -> &'static str {
        match self {
            BuilderKind::AppBlockBuilder => "App block builder",
            BuilderKind::ImageBuilder => "Image builder",
        }
    }
}
