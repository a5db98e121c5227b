use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::source::AliasLookup;

#[derive(Debug, Default)]
pub struct AliasOutcome {
    pub resolved: HashMap<String, String>,
    pub failed_calls: usize,
}

async fn cascade_one(
    services: &[Arc<dyn AliasLookup>],
    node_id: &str,
) -> (Option<String>, usize) {
    let mut failed_calls = 0usize;

    for service in services {
        match service.lookup_alias(node_id).await {
            Ok(Some(alias)) if !alias.trim().is_empty() => {
                debug!(service = service.name(), node_id, %alias, "alias resolved");
                return (Some(alias.trim().to_owned()), failed_calls);
            }
            Ok(_) => {}
            Err(error) => {
                warn!(service = service.name(), node_id, %error, "alias lookup failed");
                failed_calls += 1;
            }
        }
    }

    (None, failed_calls)
}

/// Per node, services are asked in slice order; the first non-empty answer wins.
pub async fn resolve_aliases(
    services: &[Arc<dyn AliasLookup>],
    node_ids: &[String],
) -> AliasOutcome {
    if services.is_empty() || node_ids.is_empty() {
        return AliasOutcome::default();
    }

    let lookups = node_ids.iter().map(|node_id| async move {
        let (alias, failed_calls) = cascade_one(services, node_id).await;
        (node_id.clone(), alias, failed_calls)
    });

    let mut outcome = AliasOutcome::default();
    for (node_id, alias, failed_calls) in join_all(lookups).await {
        outcome.failed_calls += failed_calls;
        if let Some(alias) = alias {
            outcome.resolved.insert(node_id, alias);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::super::source::SourceError;
    use super::*;

    struct StaticAliases {
        name: &'static str,
        known: HashMap<&'static str, &'static str>,
        fail: bool,
    }

    #[async_trait]
    impl AliasLookup for StaticAliases {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup_alias(&self, node_id: &str) -> Result<Option<String>, SourceError> {
            if self.fail {
                return Err(SourceError::Status {
                    service: self.name.to_owned(),
                    status: 503,
                });
            }
            Ok(self.known.get(node_id).map(|alias| (*alias).to_owned()))
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[tokio::test]
    async fn first_service_with_an_answer_wins() {
        let primary: Arc<dyn AliasLookup> = Arc::new(StaticAliases {
            name: "primary",
            known: HashMap::from([("a", "Alpha")]),
            fail: false,
        });
        let secondary: Arc<dyn AliasLookup> = Arc::new(StaticAliases {
            name: "secondary",
            known: HashMap::from([("a", "Other"), ("b", "Bravo")]),
            fail: false,
        });

        let outcome = resolve_aliases(&[primary, secondary], &ids(&["a", "b", "c"])).await;
        assert_eq!(outcome.resolved.get("a").map(String::as_str), Some("Alpha"));
        assert_eq!(outcome.resolved.get("b").map(String::as_str), Some("Bravo"));
        assert!(!outcome.resolved.contains_key("c"));
        assert_eq!(outcome.failed_calls, 0);
    }

    #[tokio::test]
    async fn failing_service_does_not_block_the_fallback() {
        let broken: Arc<dyn AliasLookup> = Arc::new(StaticAliases {
            name: "broken",
            known: HashMap::new(),
            fail: true,
        });
        let backup: Arc<dyn AliasLookup> = Arc::new(StaticAliases {
            name: "backup",
            known: HashMap::from([("a", "Alpha")]),
            fail: false,
        });

        let outcome = resolve_aliases(&[broken, backup], &ids(&["a", "b"])).await;
        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.failed_calls, 2);
    }
}
