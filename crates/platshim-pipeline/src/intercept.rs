//! Resolver-interception pipeline.
//!
//! For bundlers that let configuration supply a resolve hook. The host's own
//! resolve function (if any) becomes the previous stage; the substitution
//! rules are layered on top of it exactly once.

use platshim_kernel::{
    ConfigError, FnResolver, Platform, Resolution, ResolutionRequest, ResolveError, Resolver,
    RuleTable, ShimConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const RESULT_ACCEPTED: &str = "accepted";
const RESULT_REJECTED: &str = "rejected";
const FAILURE_INVALID_REQUEST: &str = "intercept_invalid_request";
const FAILURE_UNRESOLVABLE: &str = "intercept_unresolvable";

/// JSON envelope returned across a host-bundler bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptEnvelope {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub rule_digest: String,
}

/// The installed interception stage.
#[derive(Clone)]
pub struct InterceptPipeline {
    rule_digest: String,
    rules: RuleTable,
    resolver: Arc<dyn Resolver>,
}

impl InterceptPipeline {
    /// Verify every replacement exists, then wrap `previous`.
    ///
    /// A missing replacement fails the install: the build must stop rather
    /// than let the real module through on the platform it cannot run on.
    pub fn install(
        config: &ShimConfig,
        previous: Option<Arc<dyn Resolver>>,
    ) -> Result<Self, ConfigError> {
        config.verify_replacements()?;
        Ok(Self::install_unverified(config, previous))
    }

    /// Wrap `previous` without touching the filesystem.
    pub fn install_unverified(config: &ShimConfig, previous: Option<Arc<dyn Resolver>>) -> Self {
        let rule_digest = config.rules().digest();
        info!(
            rules = config.rules().len(),
            digest = %rule_digest,
            wraps_previous = previous.is_some(),
            "intercept pipeline installed"
        );
        Self {
            rule_digest,
            rules: config.resolved_rules(),
            resolver: config.resolver(previous),
        }
    }

    /// Install around a host resolve function.
    pub fn wrap_host<F>(config: &ShimConfig, host: Option<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&ResolutionRequest) -> Result<Resolution, ResolveError> + Send + Sync + 'static,
    {
        let previous = host.map(|host| Arc::new(FnResolver::new(host)) as Arc<dyn Resolver>);
        Self::install(config, previous)
    }

    pub fn rule_digest(&self) -> &str {
        &self.rule_digest
    }

    /// Number of rules that can fire for `platform`.
    pub fn active_rules(&self, platform: Platform) -> usize {
        self.rules.for_platform(platform).count()
    }

    /// The composed resolver, for hosts that drive it directly.
    pub fn resolver(&self) -> Arc<dyn Resolver> {
        self.resolver.clone()
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(request)
    }

    /// Resolve a JSON-encoded request and return a JSON envelope.
    pub fn resolve_json(&self, request_json: &str) -> String {
        let envelope = match serde_json::from_str::<ResolutionRequest>(request_json) {
            Ok(request) => self.envelope(self.resolve(&request)),
            Err(source) => {
                warn!(error = %source, "invalid intercept request");
                self.rejected(FAILURE_INVALID_REQUEST, format!("invalid request: {source}"))
            }
        };
        serde_json::to_string(&envelope).unwrap_or_default()
    }

    fn envelope(&self, outcome: Result<Resolution, ResolveError>) -> InterceptEnvelope {
        match outcome {
            Ok(resolution) => InterceptEnvelope {
                result: RESULT_ACCEPTED.to_string(),
                resolution: Some(resolution),
                failure_class: None,
                message: None,
                rule_digest: self.rule_digest.clone(),
            },
            Err(ResolveError::InvalidRequest(message)) => {
                self.rejected(FAILURE_INVALID_REQUEST, message)
            }
            Err(err) => self.rejected(FAILURE_UNRESOLVABLE, err.to_string()),
        }
    }

    fn rejected(&self, failure_class: &str, message: String) -> InterceptEnvelope {
        InterceptEnvelope {
            result: RESULT_REJECTED.to_string(),
            resolution: None,
            failure_class: Some(failure_class.to_string()),
            message: Some(message),
            rule_digest: self.rule_digest.clone(),
        }
    }
}

impl std::fmt::Debug for InterceptPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptPipeline")
            .field("rule_digest", &self.rule_digest)
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}
