// Backend kinds and the per-backend adapter table
use crate::domain::observation::Observation;
use crate::error::FetchError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "LDES", alias = "ldes")]
    Ldes,
    #[serde(rename = "LDESTSS", alias = "ldestss")]
    LdesTss,
    #[serde(rename = "SQL", alias = "sql")]
    Sql,
    #[serde(rename = "TTL", alias = "ttl")]
    Ttl,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Ldes,
        BackendKind::LdesTss,
        BackendKind::Sql,
        BackendKind::Ttl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ldes => "LDES",
            BackendKind::LdesTss => "LDESTSS",
            BackendKind::Sql => "SQL",
            BackendKind::Ttl => "TTL",
        }
    }

    pub fn adapter(&self) -> &'static BackendAdapter {
        match self {
            BackendKind::Ldes => &LDES,
            BackendKind::LdesTss => &LDES_TSS,
            BackendKind::Sql => &SQL,
            BackendKind::Ttl => &TTL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Where the observations live inside a page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The body is the array of observations.
    FlatArray,
    /// The body is an array of `{ points: [...] }` snippets.
    Snippets,
    /// The body is `{ data: [...] }`.
    Tabular,
}

/// Static description of how one backend kind is fetched and drawn.
#[derive(Debug, PartialEq)]
pub struct BackendAdapter {
    pub kind: BackendKind,
    pub shape: ResponseShape,
    pub limit: u32,
    pub value_field: &'static str,
    pub color: &'static str,
    pub label: &'static str,
    pub precision: Option<usize>,
    pub default_title: &'static str,
    pub series_name: &'static str,
    pub axis_name: &'static str,
    pub load_more_label: &'static str,
    pub end_label: &'static str,
}

pub static LDES: BackendAdapter = BackendAdapter {
    kind: BackendKind::Ldes,
    shape: ResponseShape::FlatArray,
    limit: 100,
    value_field: "value",
    color: "#1523e0",
    label: "LDES",
    precision: None,
    default_title: "River Monitoring (LDES)",
    series_name: "River Stage",
    axis_name: "Stage (m)",
    load_more_label: "Load Next 100 Points",
    end_label: "End of Records",
};

pub static LDES_TSS: BackendAdapter = BackendAdapter {
    kind: BackendKind::LdesTss,
    shape: ResponseShape::Snippets,
    limit: 10,
    value_field: "value",
    color: "#e67e22",
    label: "Snippets",
    precision: None,
    default_title: "River Monitoring (LDESTSS)",
    series_name: "Observation",
    axis_name: "Value",
    load_more_label: "Load More Snippets",
    end_label: "End of Data",
};

pub static SQL: BackendAdapter = BackendAdapter {
    kind: BackendKind::Sql,
    shape: ResponseShape::Tabular,
    limit: 100,
    value_field: "val",
    color: "#8e44ad",
    label: "SQL Rows",
    precision: None,
    default_title: "River Monitoring (SQL/Postgres)",
    series_name: "SQL Observation",
    axis_name: "Stage (m)",
    load_more_label: "Load Next 100 Rows",
    end_label: "End of Database",
};

pub static TTL: BackendAdapter = BackendAdapter {
    kind: BackendKind::Ttl,
    shape: ResponseShape::FlatArray,
    limit: 100,
    value_field: "value",
    color: "#27ae60",
    label: "TTL Points",
    precision: Some(3),
    default_title: "River Monitoring (TTL)",
    series_name: "Observation",
    axis_name: "Stage (m)",
    load_more_label: "Load More Data",
    end_label: "All Data Loaded",
};

/// Observations pulled out of one page response.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Number of top-level items the backend returned for this page
    /// (snippets for the snippet backend, observations otherwise).
    pub page_len: usize,
    pub records: Vec<Observation>,
}

impl BackendAdapter {
    pub fn extract(&self, body: &Value) -> Result<ExtractedPage, FetchError> {
        match self.shape {
            ResponseShape::FlatArray => {
                let items = expect_array(body, "response body")?;
                let records = self.parse_records(items)?;
                Ok(ExtractedPage {
                    page_len: records.len(),
                    records,
                })
            }
            ResponseShape::Snippets => {
                let snippets = expect_array(body, "response body")?;
                let mut records = Vec::new();
                for snippet in snippets {
                    match snippet.get("points") {
                        None | Some(Value::Null) => {}
                        Some(points) => {
                            let points = expect_array(points, "snippet points")?;
                            records.extend(self.parse_records(points)?);
                        }
                    }
                }
                Ok(ExtractedPage {
                    page_len: snippets.len(),
                    records,
                })
            }
            ResponseShape::Tabular => {
                if !body.is_object() {
                    return Err(FetchError::parse("response body is not an object"));
                }
                let records = match body.get("data") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(data) => self.parse_records(expect_array(data, "data field")?)?,
                };
                Ok(ExtractedPage {
                    page_len: records.len(),
                    records,
                })
            }
        }
    }

    /// A page shorter than the limit means the backend ran out of data.
    pub fn has_more(&self, page_len: usize) -> bool {
        page_len >= self.limit as usize
    }

    fn parse_records(&self, items: &[Value]) -> Result<Vec<Observation>, FetchError> {
        items
            .iter()
            .map(|item| self.parse_record(item))
            .collect()
    }

    fn parse_record(&self, item: &Value) -> Result<Observation, FetchError> {
        let fields = item
            .as_object()
            .ok_or_else(|| FetchError::parse("observation is not an object"))?;
        let time = fields
            .get("time")
            .ok_or_else(|| FetchError::parse("observation has no time field"))
            .and_then(parse_time)?;
        let value = fields.get(self.value_field).and_then(parse_value);
        Ok(Observation::new(time, value))
    }
}

fn expect_array<'a>(value: &'a Value, what: &str) -> Result<&'a [Value], FetchError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| FetchError::parse(format!("{} is not an array", what)))
}

/// Accepts RFC 3339 strings, naive `YYYY-MM-DD HH:MM:SS` strings (read as UTC)
/// and epoch milliseconds.
fn parse_time(value: &Value) -> Result<DateTime<Utc>, FetchError> {
    match value {
        Value::String(s) => {
            if let Ok(time) = DateTime::parse_from_rfc3339(s) {
                return Ok(time.with_timezone(&Utc));
            }
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(|| FetchError::parse(format!("invalid timestamp: {}", s)))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| FetchError::parse(format!("invalid timestamp: {}", n))),
        other => Err(FetchError::parse(format!("invalid timestamp: {}", other))),
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is a gap.
fn parse_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("ldestss".parse::<BackendKind>(), Ok(BackendKind::LdesTss));
        assert_eq!(" SQL ".parse::<BackendKind>(), Ok(BackendKind::Sql));
        assert!("mongo".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_flat_array_extraction() {
        let body = json!([
            { "time": "2024-03-01T10:00:00Z", "value": 1.25 },
            { "time": "2024-03-01T09:00:00+01:00", "value": "2.5" },
        ]);
        let page = LDES.extract(&body).unwrap();
        assert_eq!(page.page_len, 2);
        assert_eq!(page.records[0].value, Some(1.25));
        assert_eq!(page.records[1].value, Some(2.5));
        assert_eq!(page.records[1].time.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_snippet_extraction_flattens_points() {
        let body = json!([
            { "points": [
                { "time": "2024-03-01T10:00:00Z", "value": 1 },
                { "time": "2024-03-01T10:01:00Z", "value": 2 },
            ]},
            { "id": "no-points" },
            { "points": null },
            { "points": [{ "time": "2024-03-01T10:02:00Z", "value": 3 }] },
        ]);
        let page = LDES_TSS.extract(&body).unwrap();
        assert_eq!(page.page_len, 4);
        assert_eq!(page.records.len(), 3);
    }

    #[test]
    fn test_tabular_extraction_reads_val_field() {
        let body = json!({ "data": [
            { "time": "2024-03-01 10:00:00", "val": 0.75 },
        ]});
        let page = SQL.extract(&body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].value, Some(0.75));

        let page = SQL.extract(&json!({ "rows": 3 })).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.page_len, 0);
    }

    #[test]
    fn test_shape_mismatch_is_parse_error() {
        assert!(matches!(LDES.extract(&json!({ "data": [] })), Err(FetchError::Parse(_))));
        assert!(matches!(SQL.extract(&json!([])), Err(FetchError::Parse(_))));
        assert!(matches!(
            LDES_TSS.extract(&json!([{ "points": 4 }])),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            TTL.extract(&json!([{ "value": 1 }])),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            TTL.extract(&json!([{ "time": "yesterday", "value": 1 }])),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_non_numeric_value_is_gap() {
        let body = json!([{ "time": 1709287200000i64, "value": "n/a" }]);
        let page = TTL.extract(&body).unwrap();
        assert_eq!(page.records[0].value, None);
        assert_eq!(page.records[0].time.timestamp(), 1709287200);
    }

    #[test]
    fn test_has_more_compares_page_len_to_limit() {
        assert!(LDES.has_more(100));
        assert!(!LDES.has_more(99));
        assert!(LDES_TSS.has_more(10));
        assert!(!LDES_TSS.has_more(9));
    }
}
