//! Recommendation resolution: external model first, then canned answers by
//! entity, then a random generic answer for the domain.
//!
//! Resolution is total. Failures of the external attempt are logged and
//! reported on [`Resolution::external`], never returned as errors.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::MockCatalog;
use crate::clients::traits::GenerativeBackend;
use crate::error::Result;
use crate::prompts::{parse_recommendation, recommendation_prompt};
use crate::storage::CredentialHolder;
use crate::types::{Domain, MAX_ACTIONS, Recommendation};

/// What the caller wants resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub domain: Domain,
    /// Free text forwarded to the model; also scanned for entity keys when
    /// `entity` is not set.
    pub context: String,
    /// Explicit entity key. When present it is looked up exactly and the
    /// context is not scanned.
    pub entity: Option<String>,
}

impl ResolveRequest {
    pub fn new(domain: Domain, context: impl Into<String>) -> Self {
        Self {
            domain,
            context: context.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

/// Which path produced the recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    External,
    Catalog { entity_key: String },
    Generic { index: usize },
}

/// Outcome of the external step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExternalAttempt {
    /// No usable credential or no backend
    Skipped,
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub id: Uuid,
    pub domain: Domain,
    pub recommendation: Recommendation,
    pub source: ResolutionSource,
    pub external: ExternalAttempt,
}

impl Resolution {
    /// True when a credential was configured but the external call failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self.external, ExternalAttempt::Failed { .. })
    }
}

pub struct RecommendationResolver {
    credentials: Arc<CredentialHolder>,
    backend: Option<Arc<dyn GenerativeBackend>>,
    catalog: Arc<MockCatalog>,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RecommendationResolver {
    /// Resolver over the built-in catalog with no backend and an
    /// entropy-seeded random source.
    pub fn new(credentials: Arc<CredentialHolder>) -> Self {
        Self {
            credentials,
            backend: None,
            catalog: Arc::new(MockCatalog::builtin().clone()),
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_catalog(mut self, catalog: MockCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn catalog(&self) -> &MockCatalog {
        &self.catalog
    }

    pub fn get_credential(&self) -> Option<String> {
        self.credentials.get_credential()
    }

    pub fn set_credential(&self, value: impl Into<String>) -> Result<()> {
        self.credentials.set_credential(value)
    }

    pub fn clear_credential(&self) -> Result<()> {
        self.credentials.clear_credential()
    }

    /// Resolve from free text. Never fails.
    pub async fn resolve(&self, domain: Domain, context: &str) -> Recommendation {
        self.resolve_detailed(&ResolveRequest::new(domain, context))
            .await
            .recommendation
    }

    pub async fn resolve_detailed(&self, request: &ResolveRequest) -> Resolution {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("resolve", %id, domain = %request.domain);
        self.resolve_inner(id, request).instrument(span).await
    }

    async fn resolve_inner(&self, id: Uuid, request: &ResolveRequest) -> Resolution {
        let domain = request.domain;

        let external = match (self.credentials.active_credential(), &self.backend) {
            (None, _) => ExternalAttempt::Skipped,
            (Some(_), None) => {
                tracing::debug!("credential set but no generative backend configured");
                ExternalAttempt::Skipped
            }
            (Some(credential), Some(backend)) => {
                match self.try_external(&**backend, &credential, request).await {
                    Ok(recommendation) => {
                        tracing::debug!("using external recommendation");
                        return Resolution {
                            id,
                            domain,
                            recommendation,
                            source: ResolutionSource::External,
                            external: ExternalAttempt::Succeeded,
                        };
                    }
                    Err(reason) => {
                        tracing::warn!("AI API error, falling back to mock: {}", reason);
                        ExternalAttempt::Failed { reason }
                    }
                }
            }
        };

        if let Some((entity_key, recommendation)) = self.match_entity(request) {
            tracing::debug!(%entity_key, "using canned recommendation");
            return Resolution {
                id,
                domain,
                recommendation,
                source: ResolutionSource::Catalog { entity_key },
                external,
            };
        }

        let (index, recommendation) = self.pick_generic(domain);
        tracing::debug!(index, "using generic recommendation");
        Resolution {
            id,
            domain,
            recommendation,
            source: ResolutionSource::Generic { index },
            external,
        }
    }

    async fn try_external(
        &self,
        backend: &dyn GenerativeBackend,
        credential: &str,
        request: &ResolveRequest,
    ) -> std::result::Result<Recommendation, String> {
        let prompt = recommendation_prompt(request.domain, &request.context);
        let reply = backend
            .generate(credential, &prompt)
            .await
            .map_err(|e| e.to_string())?;
        let rec = parse_recommendation(&reply)
            .map_err(|e| format!("reply is not a recommendation: {}", e))?;
        if !rec.is_well_formed() {
            return Err(format!(
                "reply has {} actions and savings '{}'; expected 1-{} actions and a savings label",
                rec.actions.len(),
                rec.savings_label,
                MAX_ACTIONS
            ));
        }
        Ok(rec)
    }

    fn match_entity(&self, request: &ResolveRequest) -> Option<(String, Recommendation)> {
        match &request.entity {
            Some(key) => self
                .catalog
                .lookup(request.domain, key)
                .map(|rec| (key.clone(), rec.clone())),
            None => self
                .catalog
                .match_context(request.domain, &request.context)
                .map(|(key, rec)| (key.to_string(), rec.clone())),
        }
    }

    fn pick_generic(&self, domain: Domain) -> (usize, Recommendation) {
        // Non-empty for every domain; MockCatalog::new enforces it.
        let pool = self.catalog.generic(domain);
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen_range(0..pool.len())
        };
        (index, pool[index].clone())
    }
}

impl std::fmt::Debug for RecommendationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationResolver")
            .field("credentials", &self.credentials)
            .field("backend", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImpactTier;

    fn offline() -> RecommendationResolver {
        RecommendationResolver::new(Arc::new(CredentialHolder::in_memory()))
            .with_rng(StdRng::seed_from_u64(7))
    }

    #[tokio::test]
    async fn explicit_entity_skips_substring_scan() {
        let resolver = offline();
        // Context names R101 but the explicit key wins.
        let request = ResolveRequest::new(Domain::Transport, "Route: R101").with_entity("R103");
        let resolution = resolver.resolve_detailed(&request).await;
        assert_eq!(
            resolution.source,
            ResolutionSource::Catalog {
                entity_key: "R103".into()
            }
        );
        assert_eq!(resolution.recommendation.savings_label, "8 min trip");
    }

    #[tokio::test]
    async fn unknown_explicit_entity_goes_generic() {
        let resolver = offline();
        let request =
            ResolveRequest::new(Domain::Energy, "Building: Skyline Tower").with_entity("Old Mill");
        let resolution = resolver.resolve_detailed(&request).await;
        assert_eq!(resolution.source, ResolutionSource::Generic { index: 0 });
        assert_eq!(resolution.recommendation.impact_tier, ImpactTier::Medium);
    }

    #[tokio::test]
    async fn no_credential_skips_external() {
        let resolution = offline()
            .resolve_detailed(&ResolveRequest::new(Domain::Grid, ""))
            .await;
        assert_eq!(resolution.external, ExternalAttempt::Skipped);
        assert!(!resolution.is_degraded());
    }

    #[tokio::test]
    async fn credential_without_backend_is_skipped() {
        let holder = Arc::new(CredentialHolder::in_memory());
        holder.set_credential("key").unwrap();
        let resolver = RecommendationResolver::new(holder);
        let resolution = resolver
            .resolve_detailed(&ResolveRequest::new(Domain::Energy, "Eco Plaza"))
            .await;
        assert_eq!(resolution.external, ExternalAttempt::Skipped);
        assert_eq!(resolution.recommendation.savings_label, "18%");
    }

    #[tokio::test]
    async fn seeded_rng_is_reproducible() {
        let picks = |seed| async move {
            let resolver = RecommendationResolver::new(Arc::new(CredentialHolder::in_memory()))
                .with_rng(StdRng::seed_from_u64(seed));
            let mut out = Vec::new();
            for _ in 0..16 {
                let r = resolver
                    .resolve_detailed(&ResolveRequest::new(Domain::Grid, "Range: Daily"))
                    .await;
                out.push(r.source);
            }
            out
        };
        assert_eq!(picks(42).await, picks(42).await);
    }

    #[test]
    fn resolution_source_serializes_tagged() {
        let value = serde_json::to_value(ResolutionSource::Catalog {
            entity_key: "R102".into(),
        })
        .unwrap();
        assert_eq!(value["kind"], "catalog");
        assert_eq!(value["entity_key"], "R102");
    }
}
