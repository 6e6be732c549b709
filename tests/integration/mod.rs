//! End-to-end scenarios through `ChatService` with deterministic providers.

mod build;
mod cli_contracts;
mod reconcile;
mod routing;
mod support;
