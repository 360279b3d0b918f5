//! Resolver composition.
//!
//! A resolver chain is built by wrapping, never by patching: each stage takes
//! the previous stage as a value and returns a new resolver. Stages can be
//! tested in isolation by injecting a fake delegate.
//!
//! ```text
//! SubstitutingResolver(rules, previous)
//!     request matches a rule  → Resolution::SourceFile(replacement)
//!     otherwise               → previous.resolve(request), unchanged
//!     no previous configured  → IdentityResolver
//! ```

use crate::error::ResolveError;
use crate::platform::Platform;
use crate::request::{ModuleId, Resolution, ResolutionRequest};
use crate::rules::RuleTable;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A stage in a module resolver chain.
///
/// Resolution is a synchronous, side-effect-free decision. Implementations
/// must be shareable across the host bundler's worker threads.
pub trait Resolver: Send + Sync {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        (**self).resolve(request)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        (**self).resolve(request)
    }
}

/// Degenerate default resolution: the safety net when nothing else is wired.
///
/// Relative specifiers are joined onto the origin module's directory; every
/// other specifier names its own source file. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl Resolver for IdentityResolver {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        let specifier = request.module.as_str();
        let origin_dir = request
            .context
            .origin()
            .and_then(|origin| origin.parent());
        let file_path = match origin_dir {
            Some(dir) if request.module.is_relative() => dir.join(specifier),
            _ => PathBuf::from(specifier),
        };
        Ok(Resolution::SourceFile { file_path })
    }
}

/// Adapts a closure into a [`Resolver`].
///
/// This is how a host bundler's own resolve function enters the chain.
pub struct FnResolver<F> {
    resolve: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&ResolutionRequest) -> Result<Resolution, ResolveError> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> Resolver for FnResolver<F>
where
    F: Fn(&ResolutionRequest) -> Result<Resolution, ResolveError> + Send + Sync,
{
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        (self.resolve)(request)
    }
}

impl<F> std::fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

/// Serves configured replacements and delegates everything else.
#[derive(Clone)]
pub struct SubstitutingResolver {
    rules: Arc<RuleTable>,
    previous: Arc<dyn Resolver>,
}

impl SubstitutingResolver {
    /// Wrap `previous` with the substitutions in `rules`.
    ///
    /// When no previous resolver exists the chain bottoms out in
    /// [`IdentityResolver`] instead of failing.
    pub fn compose(rules: Arc<RuleTable>, previous: Option<Arc<dyn Resolver>>) -> Self {
        let previous = previous.unwrap_or_else(|| Arc::new(IdentityResolver));
        Self { rules, previous }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// The wrapped stage, for callers that need to bypass substitution.
    pub fn previous(&self) -> &Arc<dyn Resolver> {
        &self.previous
    }
}

impl Resolver for SubstitutingResolver {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        match self.rules.matching(request) {
            Some(rule) => {
                debug!(
                    module = %request.module,
                    platform = %request.platform,
                    replacement = %rule.replacement.display(),
                    "substituted"
                );
                Ok(Resolution::source_file(rule.replacement.clone()))
            }
            None => {
                debug!(module = %request.module, platform = %request.platform, "delegated");
                self.previous.resolve(request)
            }
        }
    }
}

impl std::fmt::Debug for SubstitutingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstitutingResolver")
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

type MemoKey = (Option<PathBuf>, ModuleId, Platform);

/// Memoizes successful resolutions of the wrapped stage.
///
/// Only worthwhile when the wrapped stage touches the filesystem. The memo
/// key ignores request attributes, so do not put it in front of a stage whose
/// answer depends on them.
pub struct MemoResolver<R> {
    inner: R,
    memo: RwLock<HashMap<MemoKey, Resolution>>,
}

impl<R: Resolver> MemoResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Number of memoized resolutions.
    pub fn len(&self) -> usize {
        self.memo.read().map(|memo| memo.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Resolver> Resolver for MemoResolver<R> {
    fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, ResolveError> {
        let key = (
            request.context.origin.clone(),
            request.module.clone(),
            request.platform,
        );
        if let Ok(memo) = self.memo.read()
            && let Some(hit) = memo.get(&key)
        {
            return Ok(hit.clone());
        }

        let resolution = self.inner.resolve(request)?;
        if let Ok(mut memo) = self.memo.write() {
            memo.entry(key).or_insert_with(|| resolution.clone());
        }
        Ok(resolution)
    }
}
