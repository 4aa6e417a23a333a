/// Error fallback that logs failures through `tracing`
#[cfg(feature = "logging")]
pub mod logging;

/// Error fallback that records failures for later inspection
#[cfg(feature = "collector")]
pub mod collector;
