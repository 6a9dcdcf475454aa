//! services/app/src/adapters/terminal.rs
//!
//! Terminal stand-ins for the mobile UI collaborators: alerts are printed to
//! stdout and navigation is kept as a simple route stack.

use adoption_core::ports::{Alert, AlertKind, Navigator, Presenter};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Prints alerts. There is no way to dismiss a line of text, so the confirm
/// callback runs right away when `auto_confirm` is set.
pub struct TerminalPresenter {
    auto_confirm: bool,
}

impl TerminalPresenter {
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

fn badge(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Success => "✔",
        AlertKind::Error => "✖",
        AlertKind::Info => "ℹ",
        AlertKind::Confirm => "?",
    }
}

impl Presenter for TerminalPresenter {
    fn show(&self, alert: Alert) {
        println!("\n{} {}\n  {}", badge(alert.kind), alert.title, alert.message);
        if let Some(on_confirm) = alert.on_confirm {
            if self.auto_confirm {
                on_confirm();
            }
        }
    }
}

/// Route stack. `replace` swaps the top entry, `push` adds one and `back` pops
/// unless only the root is left.
pub struct RouteStack {
    routes: Mutex<Vec<String>>,
}

impl RouteStack {
    pub fn new(root: &str) -> Self {
        Self {
            routes: Mutex::new(vec![root.to_string()]),
        }
    }

    pub fn current(&self) -> String {
        self.routes
            .lock()
            .map(|routes| routes.last().cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.routes.lock().map(|routes| routes.len()).unwrap_or(0)
    }

    fn with_routes(&self, f: impl FnOnce(&mut Vec<String>)) {
        match self.routes.lock() {
            Ok(mut routes) => f(&mut routes),
            Err(_) => warn!("route stack lock poisoned; navigation ignored"),
        }
    }
}

impl Navigator for RouteStack {
    fn replace(&self, route: &str) {
        debug!(route, "navigate: replace");
        self.with_routes(|routes| {
            routes.pop();
            routes.push(route.to_string());
        });
    }

    fn push(&self, route: &str) {
        debug!(route, "navigate: push");
        self.with_routes(|routes| routes.push(route.to_string()));
    }

    fn back(&self) {
        debug!("navigate: back");
        self.with_routes(|routes| {
            if routes.len() > 1 {
                routes.pop();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn route_stack_follows_navigation_requests() {
        let nav = RouteStack::new("/signup");
        nav.push("/chat-form");
        assert_eq!(nav.current(), "/chat-form");
        assert_eq!(nav.depth(), 2);

        nav.replace("/(tabs)");
        assert_eq!(nav.current(), "/(tabs)");
        assert_eq!(nav.depth(), 2);

        nav.back();
        nav.back();
        assert_eq!(nav.current(), "/signup");
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn presenter_runs_confirm_only_when_auto_confirming() {
        for auto in [true, false] {
            let fired = Arc::new(AtomicBool::new(false));
            let flag = fired.clone();
            TerminalPresenter::new(auto).show(
                Alert::new(AlertKind::Confirm, "Sair", "Deseja sair?")
                    .on_confirm(move || flag.store(true, Ordering::SeqCst)),
            );
            assert_eq!(fired.load(Ordering::SeqCst), auto);
        }
    }
}
