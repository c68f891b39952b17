// ABOUTME: Scope Policy: whitelist validation, default-scope fallback, refresh downscoping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// Split a whitespace-delimited scope string, deduping while preserving first-seen order.
#[must_use]
pub fn normalize(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split_whitespace()
        .filter(|s| seen.insert((*s).to_owned()))
        .map(str::to_owned)
        .collect()
}

/// Result of validating a requested scope string against the configured policy.
pub struct ScopePolicy {
    whitelist: Vec<String>,
    defaults: Vec<String>,
}

impl ScopePolicy {
    #[must_use]
    pub fn new(whitelist: Vec<String>, defaults: Vec<String>) -> Self {
        Self { whitelist, defaults }
    }

    /// Validate and normalize a requested scope string for a fresh grant (registration
    /// or `/authorize`). An empty request substitutes the configured defaults; any
    /// scope outside the whitelist is rejected outright.
    ///
    /// # Errors
    /// Returns `Err` with the offending scope when a requested scope is not whitelisted.
    pub fn resolve(&self, requested: Option<&str>) -> Result<Vec<String>, String> {
        let requested = requested.unwrap_or_default().trim();
        if requested.is_empty() {
            return Ok(self.defaults.clone());
        }

        let scopes = normalize(requested);
        for scope in &scopes {
            if !self.whitelist.iter().any(|w| w == scope) {
                return Err(scope.clone());
            }
        }
        Ok(scopes)
    }

    /// Narrow a refresh request to the intersection of what was requested and what was
    /// originally granted. Never upscopes (SPEC_FULL.md §9: intersection-filter is the
    /// resolved open question). `None` (no `scope` parameter on the refresh request)
    /// means "keep the original grant unchanged".
    #[must_use]
    pub fn downscope_for_refresh(&self, granted: &[String], requested: Option<&str>) -> Vec<String> {
        let Some(requested) = requested else {
            return granted.to_vec();
        };
        let requested = normalize(requested);
        if requested.is_empty() {
            return granted.to_vec();
        }
        granted
            .iter()
            .filter(|s| requested.contains(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScopePolicy {
        ScopePolicy::new(
            vec!["read".to_owned(), "write".to_owned(), "payment".to_owned()],
            vec!["read".to_owned()],
        )
    }

    #[test]
    fn empty_request_substitutes_defaults() {
        assert_eq!(policy().resolve(None).unwrap(), vec!["read".to_owned()]);
        assert_eq!(policy().resolve(Some("  ")).unwrap(), vec!["read".to_owned()]);
    }

    #[test]
    fn unknown_scope_is_rejected() {
        assert_eq!(policy().resolve(Some("read bogus")), Err("bogus".to_owned()));
    }

    #[test]
    fn scopes_are_deduped_preserving_order() {
        assert_eq!(
            policy().resolve(Some("write read write")).unwrap(),
            vec!["write".to_owned(), "read".to_owned()]
        );
    }

    #[test]
    fn refresh_scope_monotonicity_is_enforced_by_intersection() {
        let granted = vec!["read".to_owned()];
        // Scenario 4 in SPEC_FULL.md §8: requesting a superset downscopes, never errors.
        let result = policy().downscope_for_refresh(&granted, Some("read write"));
        assert_eq!(result, vec!["read".to_owned()]);
    }

    #[test]
    fn refresh_without_scope_param_keeps_original_grant() {
        let granted = vec!["read".to_owned(), "write".to_owned()];
        assert_eq!(policy().downscope_for_refresh(&granted, None), granted);
    }
}
