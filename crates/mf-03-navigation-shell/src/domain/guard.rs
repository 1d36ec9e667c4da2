//! Navigation guards.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use super::pattern::RouteParams;

/// What a guard gets to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardContext {
    /// Path being navigated to.
    pub to: String,
    /// Currently active path, if any.
    pub from: Option<String>,
    /// Pattern of the matched route.
    pub route: String,
    /// Parameters captured from `to`.
    pub params: RouteParams,
}

/// Predicate that can veto a navigation.
///
/// `Ok(false)` rejects; `Err` counts as a rejection too and is reported
/// with its message.
#[async_trait]
pub trait NavigationGuard: Send + Sync {
    async fn check(&self, ctx: &GuardContext) -> anyhow::Result<bool>;
}

/// Shared guard handle.
pub type SharedGuard = Arc<dyn NavigationGuard>;

struct FnGuard<F>(F);

#[async_trait]
impl<F, Fut> NavigationGuard for FnGuard<F>
where
    F: Fn(GuardContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    async fn check(&self, ctx: &GuardContext) -> anyhow::Result<bool> {
        (self.0)(ctx.clone()).await
    }
}

/// Wrap an async closure as a guard.
///
/// ```rust,ignore
/// let signed_in = guard_fn(move |ctx| {
///     let session = session.clone();
///     async move { Ok(session.is_valid_for(&ctx.to).await) }
/// });
/// ```
pub fn guard_fn<F, Fut>(f: F) -> SharedGuard
where
    F: Fn(GuardContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    Arc::new(FnGuard(f))
}

/// Guard that always answers `allow`.
#[must_use]
pub fn constant_guard(allow: bool) -> SharedGuard {
    guard_fn(move |_| async move { Ok(allow) })
}
