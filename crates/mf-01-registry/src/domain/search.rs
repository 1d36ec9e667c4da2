//! Conjunctive record search.

use mf_shared_types::{MicrofrontendRecord, MicrofrontendStatus};

/// Search filter. Every supplied criterion must match; absent ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact status.
    pub status: Option<MicrofrontendStatus>,
    /// At least one of these tags.
    pub tags: Vec<String>,
    /// At least one of these capabilities.
    pub capabilities: Vec<String>,
}

impl SearchCriteria {
    /// Matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by name substring.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter by status.
    #[must_use]
    pub fn status(mut self, status: MicrofrontendStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Require a tag intersection.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Require a capability intersection.
    #[must_use]
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// True if `record` satisfies every supplied criterion.
    #[must_use]
    pub fn matches(&self, record: &MicrofrontendRecord) -> bool {
        if let Some(name) = &self.name {
            if !record.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if !self.tags.is_empty() && !intersects(&self.tags, &record.metadata.tags) {
            return false;
        }
        if !self.capabilities.is_empty()
            && !intersects(&self.capabilities, &record.metadata.capabilities)
        {
            return false;
        }
        true
    }
}

fn intersects(wanted: &[String], present: &[String]) -> bool {
    wanted.iter().any(|w| present.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_shared_types::{LoadConfig, MicrofrontendMetadata};

    fn record(name: &str, tags: &[&str], capabilities: &[&str]) -> MicrofrontendRecord {
        MicrofrontendRecord::new(name, name, "1.0.0", LoadConfig::host_linked(name, "./App"))
            .with_metadata(MicrofrontendMetadata {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
                ..MicrofrontendMetadata::default()
            })
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        assert!(SearchCriteria::new().matches(&record("Cart", &[], &[])));
    }

    #[test]
    fn test_name_is_case_insensitive_substring() {
        let cart = record("ShoppingCart", &[], &[]);
        assert!(SearchCriteria::new().name("cart").matches(&cart));
        assert!(!SearchCriteria::new().name("search").matches(&cart));
    }

    #[test]
    fn test_criteria_are_conjunctive() {
        let mut cart = record("Cart", &["commerce"], &["checkout"]);
        cart.status = MicrofrontendStatus::Healthy;

        let both = SearchCriteria::new().tag("commerce").capability("checkout");
        assert!(both.matches(&cart));

        let wrong_status = both.clone().status(MicrofrontendStatus::Unhealthy);
        assert!(!wrong_status.matches(&cart));

        let wrong_capability = SearchCriteria::new().tag("commerce").capability("search");
        assert!(!wrong_capability.matches(&cart));
    }

    #[test]
    fn test_tags_intersect() {
        let cart = record("Cart", &["commerce", "core"], &[]);
        assert!(SearchCriteria::new().tag("marketing").tag("core").matches(&cart));
        assert!(!SearchCriteria::new().tag("marketing").matches(&cart));
    }
}
