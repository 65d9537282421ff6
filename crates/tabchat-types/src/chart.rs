//! Declarative chart descriptions handed to the rendering sink.

use serde::{Deserialize, Serialize};

/// The fixed set of supported plot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Histogram,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
        }
    }

    /// Histograms bin a single column; everything else needs an x/y pair.
    pub fn requires_y(&self) -> bool {
        !matches!(self, ChartKind::Histogram)
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            "scatter" => Ok(ChartKind::Scatter),
            "histogram" => Ok(ChartKind::Histogram),
            _ => Err(format!(
                "Invalid chart kind: '{}'. Use line, bar, scatter or histogram.",
                s
            )),
        }
    }
}

/// A declarative chart description.
///
/// Column identifiers are validated against the session's snapshot before a
/// spec is emitted; the rendering sink receives only valid specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// X-axis column.
    pub x: String,
    /// Y-axis column; absent for histograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Explicit x-axis range as [min, max].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_range: Option<[f64; 2]>,
    /// Explicit y-axis range as [min, max].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, x: impl Into<String>, y: Option<String>) -> Self {
        let x = x.into();
        let title = match &y {
            Some(y) => Some(format!("{} vs {}", x, y)),
            None => Some(x.clone()),
        };
        Self {
            kind,
            x,
            y,
            color: None,
            x_range: None,
            y_range: None,
            title,
        }
    }
}
