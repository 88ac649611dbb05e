//! Integration tests wiring the orchestrator to `JsonFileRegistry`.

mod registry_sharing;
mod workflow_flows;
