// Chart presenter - turns an accumulated sequence into an ECharts option
use crate::domain::backend::BackendKind;
use crate::domain::observation::Observation;
use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use std::fmt::Write;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub title: Title,
    pub tooltip: Tooltip,
    pub grid: Grid,
    pub data_zoom: Vec<DataZoom>,
    pub x_axis: CategoryAxis,
    pub y_axis: ValueAxis,
    pub series: Vec<LineSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    pub left: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub trigger: &'static str,
    /// Fixed number of decimals for tooltip values; absent means the
    /// default numeric formatting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_precision: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub left: &'static str,
    pub right: &'static str,
    pub bottom: &'static str,
    pub contain_label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataZoom {
    Slider { start: u8, end: u8 },
    Inside,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub boundary_gap: bool,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub scale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub symbol: &'static str,
    /// Decimation strategy applied by the renderer on large series.
    pub sampling: &'static str,
    pub large: bool,
    pub item_style: ItemStyle,
    pub area_style: AreaStyle,
    pub data: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStyle {
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStyle {
    pub color: LinearGradient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearGradient {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: u8,
    pub y: u8,
    pub x2: u8,
    pub y2: u8,
    pub color_stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorStop {
    pub offset: u8,
    pub color: String,
}

impl LinearGradient {
    /// Vertical fade from 30% opacity at the line down to transparent.
    fn fade(color: &str) -> Self {
        Self {
            kind: "linear",
            x: 0,
            y: 0,
            x2: 0,
            y2: 1,
            color_stops: vec![
                ColorStop {
                    offset: 0,
                    color: format!("{}4D", color),
                },
                ColorStop {
                    offset: 1,
                    color: format!("{}00", color),
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartPresenter {
    offset: FixedOffset,
    time_format: String,
}

impl Default for ChartPresenter {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl ChartPresenter {
    pub fn new(offset: FixedOffset, time_format: impl Into<String>) -> Self {
        Self {
            offset,
            time_format: time_format.into(),
        }
    }

    /// Falls back to RFC 3339 when the configured format cannot be rendered.
    pub fn format_time(&self, obs: &Observation) -> String {
        let local = obs.time.with_timezone(&self.offset);
        let mut label = String::new();
        match write!(label, "{}", local.format(&self.time_format)) {
            Ok(()) => label,
            Err(_) => local.to_rfc3339(),
        }
    }

    /// Rebuilt from scratch on every change; there is no incremental update.
    pub fn build_spec(&self, sequence: &[Observation], title: &str, kind: BackendKind) -> ChartSpec {
        let adapter = kind.adapter();
        let title = if title.trim().is_empty() {
            adapter.default_title
        } else {
            title
        };

        ChartSpec {
            title: Title {
                text: title.to_string(),
                left: "center",
            },
            tooltip: Tooltip {
                trigger: "axis",
                value_precision: adapter.precision,
            },
            grid: Grid {
                left: "5%",
                right: "5%",
                bottom: "15%",
                contain_label: true,
            },
            data_zoom: vec![DataZoom::Slider { start: 0, end: 100 }, DataZoom::Inside],
            x_axis: CategoryAxis {
                kind: "category",
                boundary_gap: false,
                data: sequence.iter().map(|obs| self.format_time(obs)).collect(),
            },
            y_axis: ValueAxis {
                kind: "value",
                name: adapter.axis_name,
                scale: true,
            },
            series: vec![LineSeries {
                name: adapter.series_name,
                kind: "line",
                symbol: "none",
                sampling: "lttb",
                large: true,
                item_style: ItemStyle {
                    color: adapter.color,
                },
                area_style: AreaStyle {
                    color: LinearGradient::fade(adapter.color),
                },
                data: sequence.iter().map(|obs| obs.value).collect(),
            }],
        }
    }
}

/// Tooltip text for one value, honouring the backend's fixed precision.
pub fn format_tooltip_value(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(digits) => format!("{:.*}", digits, value),
        None => value.to_string(),
    }
}
