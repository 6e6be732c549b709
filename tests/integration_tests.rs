//! Integration tests for docdesk

mod integration;
