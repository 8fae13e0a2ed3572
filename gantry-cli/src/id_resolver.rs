//! ID resolver module
//!
//! Resolves run ID prefixes to full UUIDs by querying the server, so users
//! can type short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use gantry_client::{ClientError, GantryClient};
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a run ID or prefix to a full UUID
///
/// A full UUID is returned as is; a prefix is matched against every run the
/// server knows about.
pub async fn resolve_run_id(client: &GantryClient, id: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id.as_uuid() {
        return Ok(uuid);
    }

    let runs = client
        .list_runs()
        .await
        .context("Failed to fetch runs for ID resolution")?;

    select_unique(id, runs.iter().map(|run| run.id))
}

/// Reports a 404 for a resolved ID as a missing run
pub fn explain_missing(err: ClientError, id: Uuid) -> anyhow::Error {
    if err.is_not_found() {
        anyhow!("No run found with ID '{}'", id)
    } else {
        err.into()
    }
}

/// Picks the single candidate matching `id`
fn select_unique(id: &IdOrPrefix, candidates: impl Iterator<Item = Uuid>) -> Result<Uuid> {
    let matches: Vec<Uuid> = candidates.filter(|candidate| id.matches(candidate)).collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No run found with ID starting with '{}'", id)),
        [only] => Ok(*only),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple runs: {}",
                id,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        [
            "3f1c2b9a-7d4e-4f60-8182-93a4b5c6d7e8",
            "3f1d0000-0000-4000-8000-000000000000",
            "9a8b7c6d-5e4f-4021-8120-3f4e5d6c7b8a",
        ]
        .iter()
        .map(|s| Uuid::parse_str(s).unwrap())
        .collect()
    }

    #[test]
    fn test_unique_prefix() {
        let id = select_unique(&IdOrPrefix::parse("9a"), ids().into_iter()).unwrap();
        assert_eq!(id, ids()[2]);
    }

    #[test]
    fn test_ambiguous_prefix() {
        let err = select_unique(&IdOrPrefix::parse("3f1"), ids().into_iter()).unwrap_err();
        assert!(err.to_string().contains("Ambiguous prefix '3f1'"));
    }

    #[test]
    fn test_missing_run_is_explained() {
        let id = ids()[0];
        let err = explain_missing(ClientError::api_error(404, r#"{"error":"not found"}"#), id);
        assert_eq!(err.to_string(), format!("No run found with ID '{}'", id));

        let err = explain_missing(ClientError::api_error(500, "boom"), id);
        assert!(err.to_string().contains("status 500"));
    }

    #[test]
    fn test_unknown_prefix() {
        let err = select_unique(&IdOrPrefix::parse("ff"), ids().into_iter()).unwrap_err();
        assert!(err.to_string().contains("No run found"));
    }
}
