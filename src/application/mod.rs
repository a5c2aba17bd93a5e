// Application layer - use cases over the domain and the data source port
pub mod chart_service;
pub mod data_source;
pub mod query_service;
