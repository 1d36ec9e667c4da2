//! Shared fixtures for integration flows and benchmarks.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use host_runtime::{HostConfig, HostPorts, RouteConfig};
use mf_02_remote_loader::{InMemoryScriptTransport, StaticContainer};
use mf_shared_types::{Component, LoadConfig, MicrofrontendRecord, RemoteModule};

pub const CART_URL: &str = "https://cdn.example.com/cart/remoteEntry.js";
pub const PROFILE_URL: &str = "https://cdn.example.com/profile/remoteEntry.js";

/// Component that renders its own name.
#[derive(Debug)]
pub struct Page(pub &'static str);

impl Component for Page {
    fn name(&self) -> &str {
        self.0
    }

    fn render(&self, _props: &Value) -> String {
        format!("<{}/>", self.0)
    }
}

pub fn page(name: &'static str) -> Arc<dyn Component> {
    Arc::new(Page(name))
}

pub fn cart_config() -> LoadConfig {
    LoadConfig::remote("cart", "./Cart", CART_URL)
}

pub fn profile_config() -> LoadConfig {
    LoadConfig::remote("profile", "./Profile", PROFILE_URL)
}

/// Transport serving the cart and profile remote entries.
pub fn remote_transport() -> Arc<InMemoryScriptTransport> {
    let transport = Arc::new(InMemoryScriptTransport::new());
    transport.add_entry(
        CART_URL,
        Arc::new(
            StaticContainer::new("cart")
                .expose("./Cart", || RemoteModule::with_default("cart", page("CartPage"))),
        ),
    );
    transport.add_entry(
        PROFILE_URL,
        Arc::new(
            StaticContainer::new("profile").expose("./Profile", || {
                RemoteModule::with_default("profile", page("ProfilePage"))
            }),
        ),
    );
    transport
}

/// `/` (home component), `/shop/cart` (remote) and `/users/:id` (remote).
pub fn shop_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            path: "/".to_string(),
            component: Some("home".to_string()),
            title: Some("Home".to_string()),
            ..RouteConfig::default()
        },
        RouteConfig {
            path: "/shop".to_string(),
            children: vec![RouteConfig {
                path: "cart".to_string(),
                title: Some("Cart".to_string()),
                remote: Some(cart_config()),
                ..RouteConfig::default()
            }],
            ..RouteConfig::default()
        },
        RouteConfig {
            path: "/users/:id".to_string(),
            remote: Some(profile_config()),
            ..RouteConfig::default()
        },
    ]
}

/// Host config for one context with background loops off.
pub fn host_config(context_id: &str) -> HostConfig {
    let mut config = HostConfig::default();
    config.bus.context_id = context_id.to_string();
    config.background_tasks = false;
    config.shell.browser_history = false;
    config.routes = shop_routes();
    config.microfrontends = vec![
        MicrofrontendRecord::new("cart", "Cart", "1.0.0", cart_config()),
        MicrofrontendRecord::new("profile-mf", "Profile", "2.1.0", profile_config()),
    ];
    config
}

/// Ports with the home component and the remote transport.
pub fn host_ports() -> HostPorts {
    HostPorts::default()
        .transport(remote_transport())
        .component("home", page("HomePage"))
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually<F>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let result = tokio::time::timeout(deadline, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    result.is_ok()
}
