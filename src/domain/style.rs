//! Route line styling injected into every feature before rendering.

pub const DEFAULT_LINE_COLOR: &str = "#ff920d";
pub const DEFAULT_LINE_WIDTH: u32 = 3;
pub const DEFAULT_LINE_OPACITY: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: u32,
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_LINE_COLOR.to_string(),
            width: DEFAULT_LINE_WIDTH,
            opacity: DEFAULT_LINE_OPACITY,
        }
    }
}
