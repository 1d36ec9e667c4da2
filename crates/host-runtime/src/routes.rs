//! Converts the configured route table into shell route nodes.

use std::collections::HashMap;
use std::sync::Arc;

use mf_03_navigation_shell::{RouteMeta, RouteNode};
use mf_shared_types::Component;

use crate::config::{ConfigError, RouteConfig};

/// Named components available to `component = "..."` routes.
pub type ComponentCatalog = HashMap<String, Arc<dyn Component>>;

/// Build the shell route tree, resolving component names against `catalog`.
pub fn build_routes(
    routes: &[RouteConfig],
    catalog: &ComponentCatalog,
) -> Result<Vec<RouteNode>, ConfigError> {
    routes.iter().map(|route| build_node(route, catalog)).collect()
}

fn build_node(route: &RouteConfig, catalog: &ComponentCatalog) -> Result<RouteNode, ConfigError> {
    let mut node = match (&route.remote, &route.component) {
        (Some(remote), None) => RouteNode::remote(&route.path, remote.clone()),
        (None, Some(name)) => {
            let component =
                catalog
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownComponent {
                        path: route.path.clone(),
                        component: name.clone(),
                    })?;
            RouteNode::component(&route.path, component)
        }
        (None, None) => RouteNode::group(&route.path),
        (Some(_), Some(_)) => {
            return Err(ConfigError::InvalidRoute {
                path: route.path.clone(),
                reason: "remote and component are mutually exclusive".to_string(),
            })
        }
    };

    node = node.meta(RouteMeta {
        title: route.title.clone(),
        requires_auth: route.requires_auth,
        preload: route.preload,
    });

    for child in &route.children {
        node = node.child(build_node(child, catalog)?);
    }
    Ok(node)
}
