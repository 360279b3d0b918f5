//! # platshim Kernel
//!
//! Platform-conditional module substitution: a request for a module on a
//! platform that cannot host it is served by a stub with the same export
//! surface, and every other request reaches the wrapped resolver untouched.
//!
//! This crate is **bundler-agnostic**: it does not know how a host bundler
//! finds files. It only prescribes how substitution composes with whatever
//! resolver chain is already in place.
//!
//! ## Architecture
//!
//! ```text
//! Platform              ← Closed set of build targets (ios, android, native, web)
//!     │
//! ResolutionRequest     ← (context, module, platform), one per import
//!     │
//! RuleTable             ← Exact (module, platform) → replacement, read-only
//!     │
//! Resolver              ← resolve(request) -> Resolution
//!     │
//! SubstitutingResolver  ← matches ? substitute : previous (decorator)
//!     │
//! StubModule            ← Inert export surface served in place of the real module
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod platform;
pub mod request;
pub mod resolver;
pub mod rules;
pub mod stub;

pub use capability::ModuleBinding;
pub use config::{DEFAULT_CONFIG_FILE, ResolverSettings, RuleEntry, ShimConfig};
pub use error::{ConfigError, ResolveError, StubError};
pub use platform::Platform;
pub use request::{ModuleId, RequestContext, Resolution, ResolutionRequest};
pub use resolver::{FnResolver, IdentityResolver, MemoResolver, Resolver, SubstitutingResolver};
pub use rules::{RULE_DIGEST_PREFIX, RuleTable, SubstitutionRule};
pub use stub::{REACT_NATIVE_MAPS, StubFormat, StubModule, enumerate_exports, missing_exports};
