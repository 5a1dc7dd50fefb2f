/// Viewport dimensions in CSS pixels, used by `vw`/`vh` and media scopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 100.0,
            height: 100.0,
        }
    }
}

/// Knobs for a cascade run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CascadeOptions {
    pub viewport: Viewport,
    /// Skip blocks whose `@media` conditions fail for `viewport`.
    /// Off by default: scopes are carried on every block but do not gate.
    pub evaluate_media: bool,
}

impl CascadeOptions {
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_media_evaluation(mut self, enabled: bool) -> Self {
        self.evaluate_media = enabled;
        self
    }
}
