//! Cross-module tests for ingestion and the query turn.

pub(crate) mod support;

mod scenarios;
