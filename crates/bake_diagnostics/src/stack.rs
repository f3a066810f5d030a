//! Pluggable rendering of a failure message plus its stack frames.
//!
//! Stack text is platform-specific, so trimming is best-effort enrichment:
//! the default [`MarkerTrimmer`] keeps the macro author's own frames and stops
//! at the first frame that belongs to the orchestrator.

/// Builds the externally visible message for an execution failure.
pub trait StackTrimmer: Send + Sync {
    /// Combines `message` with whichever of `frames` should be visible.
    fn render(&self, message: &str, frames: &[String]) -> String;
}

/// Appends frames up to (not including) the first one containing `marker`.
#[derive(Debug, Clone)]
pub struct MarkerTrimmer {
    marker: String,
}

impl MarkerTrimmer {
    /// Creates a trimmer that cuts at frames containing `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Returns the marker text.
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl StackTrimmer for MarkerTrimmer {
    fn render(&self, message: &str, frames: &[String]) -> String {
        let mut out = message.to_string();
        for frame in frames {
            if frame.contains(&self.marker) {
                break;
            }
            out.push('\n');
            out.push_str(frame);
        }
        out
    }
}

/// Appends every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullStack;

impl StackTrimmer for FullStack {
    fn render(&self, message: &str, frames: &[String]) -> String {
        let mut out = message.to_string();
        for frame in frames {
            out.push('\n');
            out.push_str(frame);
        }
        out
    }
}

/// Drops all frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageOnly;

impl StackTrimmer for MessageOnly {
    fn render(&self, message: &str, _frames: &[String]) -> String {
        message.to_string()
    }
}
