//! # Navigation
//!
//! ```text
//! navigate(path)
//!   ├── resolve ──────── no match ──→ warn, NotFound (state untouched)
//!   ├── guards (route's, then global, in order)
//!   │       └── false / Err / panic ──→ on_error, Rejected (state untouched)
//!   ├── newer navigation already passed its guards? ──→ Superseded
//!   └── commit
//!         1. history push (replace leaves history alone)
//!         2. current_route
//!         3. browser push / replace (if integrated)
//!         4. page title (if declared)
//!         5. navigation:changed {to, from}
//!         6. mount
//! ```

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

use mf_shared_bus::BusEvent;

use super::core::{CompiledRoute, NavigationShell, ShellCounters};
use crate::domain::{
    normalize_path, GuardContext, NavigateOptions, NavigationError, NavigationOutcome, RouteMatch,
    SharedGuard,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMove {
    Push,
    Replace,
    Back,
    Forward,
}

/// Keeps `is_navigating` raised while at least one navigation is running.
struct InFlight<'a> {
    shell: &'a NavigationShell,
}

impl<'a> InFlight<'a> {
    fn enter(shell: &'a NavigationShell) -> Self {
        shell.in_flight.fetch_add(1, Ordering::SeqCst);
        shell.state.send_if_modified(|s| {
            let changed = !s.is_navigating;
            s.is_navigating = true;
            changed
        });
        Self { shell }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let remaining = self.shell.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        self.shell.state.send_if_modified(|s| {
            let busy = remaining > 0;
            let changed = s.is_navigating != busy;
            s.is_navigating = busy;
            changed
        });
    }
}

impl NavigationShell {
    /// Navigate to `path`.
    ///
    /// Never fails from the caller's point of view: an unknown path is a
    /// logged no-op and guard vetoes go to `on_error`.
    pub async fn navigate(&self, path: &str, options: NavigateOptions) -> NavigationOutcome {
        let path = normalize_path(path);
        let Some((route, matched)) = self.resolve(&path) else {
            warn!(path = %path, "No route matches, navigation ignored");
            ShellCounters::bump(&self.counters.not_found);
            return NavigationOutcome::NotFound;
        };

        let seq = self.nav_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(self);

        if !options.skip_guards {
            if let Err(error) = self.run_guards(&route, &matched).await {
                info!(path = %path, error = %error, "Navigation rejected");
                ShellCounters::bump(&self.counters.rejected);
                self.report(&error);
                return NavigationOutcome::Rejected(error);
            }
        }
        // Only a newer navigation that got through its own guards wins over
        // this one; a newer one that was vetoed does not.
        if self.passed_seq.fetch_max(seq, Ordering::SeqCst) > seq {
            debug!(path = %path, "Navigation superseded");
            ShellCounters::bump(&self.counters.superseded);
            return NavigationOutcome::Superseded;
        }

        let mv = if options.replace {
            HistoryMove::Replace
        } else {
            HistoryMove::Push
        };
        self.commit(&route, matched.clone(), mv, true);
        NavigationOutcome::Committed(matched)
    }

    /// Go back one entry.
    ///
    /// With browser integration this delegates to the browser; otherwise it
    /// walks the shell's own history. Guards are not re-run. Returns true if
    /// the shell moved.
    pub fn go_back(&self) -> bool {
        if self.config.browser_history {
            return self
                .browser
                .back()
                .is_some_and(|path| self.handle_pop_state(&path).is_committed());
        }

        let target = {
            let state = self.state.borrow();
            let len = state.history.len();
            if len < 2 {
                return false;
            }
            state.history[len - 2].clone()
        };
        self.recommit(target, HistoryMove::Back)
    }

    /// Go forward one entry. Mirrors `go_back`.
    pub fn go_forward(&self) -> bool {
        if self.config.browser_history {
            return self
                .browser
                .forward()
                .is_some_and(|path| self.handle_pop_state(&path).is_committed());
        }

        let Some(target) = self.forward.lock().last().cloned() else {
            return false;
        };
        self.recommit(target, HistoryMove::Forward)
    }

    /// Apply a browser back/forward that already happened.
    ///
    /// Commits without guards and without touching the browser history.
    pub fn handle_pop_state(&self, path: &str) -> NavigationOutcome {
        let path = normalize_path(path);
        let Some((route, matched)) = self.resolve(&path) else {
            warn!(path = %path, "No route matches popped state, ignored");
            ShellCounters::bump(&self.counters.not_found);
            return NavigationOutcome::NotFound;
        };

        let is_back = {
            let state = self.state.borrow();
            let len = state.history.len();
            len >= 2 && state.history[len - 2].path == path
        };
        let is_forward = self
            .forward
            .lock()
            .last()
            .is_some_and(|entry| entry.path == path);
        let mv = if is_back {
            HistoryMove::Back
        } else if is_forward {
            HistoryMove::Forward
        } else {
            HistoryMove::Replace
        };
        self.commit(&route, matched.clone(), mv, false);
        NavigationOutcome::Committed(matched)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn run_guards(
        &self,
        route: &CompiledRoute,
        matched: &RouteMatch,
    ) -> Result<(), NavigationError> {
        let chain: Vec<SharedGuard> = route
            .guards
            .iter()
            .cloned()
            .chain(self.guards.read().iter().map(|(_, g)| g.clone()))
            .collect();
        let ctx = GuardContext {
            to: matched.path.clone(),
            from: self.state.borrow().current_path().map(str::to_string),
            route: matched.route.clone(),
            params: matched.params.clone(),
        };

        for (index, guard) in chain.iter().enumerate() {
            let verdict = AssertUnwindSafe(guard.check(&ctx)).catch_unwind().await;
            match verdict {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    return Err(NavigationError::GuardRejected {
                        path: ctx.to.clone(),
                        guard: index,
                    })
                }
                Ok(Err(e)) => {
                    return Err(NavigationError::GuardFailed {
                        path: ctx.to.clone(),
                        guard: index,
                        reason: e.to_string(),
                    })
                }
                Err(_) => {
                    warn!(path = %ctx.to, guard = index, "Navigation guard panicked");
                    return Err(NavigationError::GuardFailed {
                        path: ctx.to.clone(),
                        guard: index,
                        reason: "guard panicked".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn recommit(&self, target: RouteMatch, mv: HistoryMove) -> bool {
        let Some((route, _)) = self.resolve(&target.path) else {
            warn!(path = %target.path, "History entry no longer resolves");
            return false;
        };
        self.commit(&route, target, mv, false);
        true
    }

    fn commit(
        &self,
        route: &CompiledRoute,
        matched: RouteMatch,
        mv: HistoryMove,
        sync_browser: bool,
    ) {
        let mut from = None;
        let mut first_entry = false;
        {
            let mut forward = self.forward.lock();
            self.state.send_modify(|state| {
                from = state.current_path().map(str::to_string);
                first_entry = state.history.is_empty();
                match mv {
                    HistoryMove::Push => {
                        state.history.push(matched.clone());
                        forward.clear();
                    }
                    HistoryMove::Replace => {}
                    HistoryMove::Back => {
                        let left = state.history.pop();
                        if let Some(left) = state.current_route.clone().or(left) {
                            forward.push(left);
                        }
                    }
                    HistoryMove::Forward => {
                        forward.pop();
                        state.history.push(matched.clone());
                    }
                }
                state.current_route = Some(matched.clone());
            });
        }

        if sync_browser && self.config.browser_history {
            match mv {
                // The page already shows the first committed path.
                HistoryMove::Push if first_entry => self.browser.replace(&matched.path),
                HistoryMove::Push => self.browser.push(&matched.path),
                HistoryMove::Replace => self.browser.replace(&matched.path),
                HistoryMove::Back | HistoryMove::Forward => {}
            }
        }
        if let Some(title) = &route.meta.title {
            self.browser.set_title(title);
        }

        if let Some(bus) = &self.bus {
            bus.emit(BusEvent::NavigationChanged {
                to: matched.path.clone(),
                from: from.clone(),
            });
        }
        ShellCounters::bump(&self.counters.committed);
        info!(to = %matched.path, from = ?from, route = %matched.route, "Navigation committed");

        self.mount(route, &matched.path);
    }
}
