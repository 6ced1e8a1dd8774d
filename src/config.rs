pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Run configuration, built from CLI arguments and passed explicitly into
/// the pipeline. Nothing is read from the environment or from files.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_results: u32,
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}
