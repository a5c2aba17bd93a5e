// Query console domain model
use crate::domain::backend::BackendKind;
use crate::error::{FetchError, SessionError};
use serde::Serialize;
use serde_json::{Map, Value};

pub const NO_RESULTS: &str = "No results found.";
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Rows of one query page. Columns come from the keys of the first row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

/// Display form of a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

impl QueryResultSet {
    /// Accepts a bare array of row objects or `{ "data": [...] }`.
    pub fn from_body(body: &Value) -> Result<Self, FetchError> {
        let rows = match body {
            Value::Array(rows) => rows,
            Value::Object(fields) => match fields.get("data") {
                Some(Value::Array(rows)) => rows,
                None | Some(Value::Null) => return Ok(Self::default()),
                Some(_) => return Err(FetchError::parse("data field is not an array")),
            },
            _ => return Err(FetchError::parse("query result is not an array")),
        };

        let rows = rows
            .iter()
            .map(|row| {
                row.as_object()
                    .cloned()
                    .ok_or_else(|| FetchError::parse("query row is not an object"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let columns = rows
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn table(&self) -> Table {
        if self.is_empty() {
            return Table {
                columns: Vec::new(),
                rows: Vec::new(),
                placeholder: Some(NO_RESULTS),
            };
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| row.get(col).map_or_else(|| "-".to_string(), render_cell))
                    .collect()
            })
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
            placeholder: None,
        }
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    pub generation: u64,
    pub backend: BackendKind,
    pub page: u32,
}

/// Query console state: backend selector, query text, current page and the
/// result set that page produced.
#[derive(Debug, Clone)]
pub struct QueryConsole {
    backend: BackendKind,
    query: String,
    page: u32,
    page_size: usize,
    results: QueryResultSet,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl QueryConsole {
    pub fn new(backend: BackendKind, template: String, page_size: usize) -> Self {
        Self {
            backend,
            query: template,
            page: 1,
            page_size,
            results: QueryResultSet::default(),
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> &QueryResultSet {
        &self.results
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the query text with the backend's template. Nothing is run.
    pub fn select_backend(&mut self, backend: BackendKind, template: String) {
        self.backend = backend;
        self.query = template;
        self.loading = false;
        self.error = None;
        self.generation += 1;
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub fn can_previous(&self) -> bool {
        self.page > 1 && !self.loading
    }

    /// A full page suggests there is another one.
    pub fn can_next(&self) -> bool {
        self.results.len() >= self.page_size && !self.loading
    }

    pub fn execute(&mut self, page: u32) -> Result<QueryTicket, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        self.page = page.max(1);
        self.loading = true;
        Ok(QueryTicket {
            generation: self.generation,
            backend: self.backend,
            page: self.page,
        })
    }

    pub fn next(&mut self) -> Result<QueryTicket, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        if !self.can_next() {
            return Err(SessionError::Exhausted);
        }
        self.execute(self.page + 1)
    }

    pub fn previous(&mut self) -> Result<QueryTicket, SessionError> {
        if self.loading {
            return Err(SessionError::Busy);
        }
        if !self.can_previous() {
            return Err(SessionError::Exhausted);
        }
        self.execute(self.page - 1)
    }

    /// Each page replaces the previous result set; a failure clears it.
    /// Returns false when the response belongs to a superseded request.
    pub fn finish(&mut self, ticket: QueryTicket, body: Result<Value, FetchError>) -> bool {
        if ticket.generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        match body.and_then(|body| QueryResultSet::from_body(&body)) {
            Ok(results) => {
                self.results = results;
                self.error = None;
            }
            Err(err) => {
                self.results = QueryResultSet::default();
                self.error = Some(format!("Query failed: {}", err));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn console() -> QueryConsole {
        QueryConsole::new(BackendKind::Ldes, "SELECT * WHERE { ?s ?p ?o }".into(), 2)
    }

    #[test]
    fn test_columns_from_first_row_in_order() {
        let body = json!([
            { "subject": "s1", "value": 1.5, "time": "t1" },
            { "subject": "s2", "runoffValue": null },
        ]);
        let results = QueryResultSet::from_body(&body).unwrap();
        assert_eq!(results.columns, vec!["subject", "value", "time"]);

        let table = results.table();
        assert_eq!(table.rows[0], vec!["s1", "1.5", "t1"]);
        assert_eq!(table.rows[1], vec!["s2", "-", "-"]);
        assert_eq!(table.placeholder, None);
    }

    #[test]
    fn test_data_wrapper_is_tolerated() {
        let results = QueryResultSet::from_body(&json!({ "data": [{ "a": 1 }] })).unwrap();
        assert_eq!(results.len(), 1);
        assert!(QueryResultSet::from_body(&json!({})).unwrap().is_empty());
        assert!(QueryResultSet::from_body(&json!("nope")).is_err());
        assert!(QueryResultSet::from_body(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_empty_results_show_placeholder() {
        let table = QueryResultSet::default().table();
        assert_eq!(table.placeholder, Some(NO_RESULTS));
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_select_backend_replaces_query_without_running() {
        let mut console = console();
        console.set_query("SELECT ?s WHERE { ?s a ?t }".into());
        console.select_backend(BackendKind::Ttl, "SELECT * WHERE { ?x ?y ?z }".into());
        assert_eq!(console.backend(), BackendKind::Ttl);
        assert_eq!(console.query(), "SELECT * WHERE { ?x ?y ?z }");
        assert!(!console.loading());
    }

    #[test]
    fn test_pages_replace_results() {
        let mut console = console();
        let ticket = console.execute(1).unwrap();
        assert_eq!(console.execute(1), Err(SessionError::Busy));
        assert!(console.finish(ticket, Ok(json!([{ "a": 1 }, { "a": 2 }]))));
        assert!(console.can_next());
        assert!(!console.can_previous());

        let ticket = console.next().unwrap();
        assert_eq!(ticket.page, 2);
        console.finish(ticket, Ok(json!([{ "b": 3 }])));
        assert_eq!(console.results().len(), 1);
        assert_eq!(console.results().columns, vec!["b"]);
        assert_eq!(console.next(), Err(SessionError::Exhausted));

        let ticket = console.previous().unwrap();
        assert_eq!(ticket.page, 1);
    }

    #[test]
    fn test_failure_clears_results_inline() {
        let mut console = console();
        let ticket = console.execute(1).unwrap();
        console.finish(ticket, Ok(json!([{ "a": 1 }])));

        let ticket = console.execute(1).unwrap();
        let err = FetchError::status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        console.finish(ticket, Err(err));
        assert!(console.results().is_empty());
        assert_eq!(console.error(), Some("Query failed: server error 500: boom"));
    }

    #[test]
    fn test_response_for_previous_backend_is_dropped() {
        let mut console = console();
        let ticket = console.execute(1).unwrap();
        console.select_backend(BackendKind::LdesTss, "q".into());
        assert!(!console.finish(ticket, Ok(json!([{ "a": 1 }]))));
        assert!(console.results().is_empty());
    }
}
