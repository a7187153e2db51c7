//! Front-end configuration shared by the parser and the semantic analyzer.

/// Default bound on statement/expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Knobs for a single front-end run.
///
/// The lexer is iterative and needs no configuration; the parser and the
/// analyzer recurse over source nesting and stop descending at `max_depth`,
/// reporting a "nesting too deep" diagnostic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendConfig {
    pub max_depth: usize,
}

impl FrontendConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        FrontendConfig { max_depth }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
