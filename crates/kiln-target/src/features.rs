//! Subtarget feature strings
//!
//! Features are requested as flags such as `+sse4.2`, `-avx` or a bare `popcnt`
//! (which means `+popcnt`). The builder keeps every request: after each insertion
//! it re-derives the string form of the whole feature list and appends that
//! snapshot to an accumulating buffer, so the final string records the full
//! history of insertions. Nothing is deduplicated or validated here; unknown
//! names are the backend's problem.

use std::fmt;

/// A single feature toggle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    pub name: String,
    pub enabled: bool,
}

impl Feature {
    /// Parse one flag. Returns `None` for empty flags.
    pub fn parse(flag: &str) -> Option<Self> {
        let flag = flag.trim();
        let (enabled, name) = if let Some(name) = flag.strip_prefix('+') {
            (true, name)
        } else if let Some(name) = flag.strip_prefix('-') {
            (false, name)
        } else {
            (true, flag)
        };

        if name.is_empty() {
            return None;
        }

        Some(Feature {
            name: name.to_ascii_lowercase(),
            enabled,
        })
    }

    /// Name of the Cranelift ISA setting controlling this feature
    /// (`sse4.2` becomes `has_sse42`).
    pub fn setting_name(&self) -> String {
        format!("has_{}", self.name.replace('.', ""))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.enabled { '+' } else { '-' };
        write!(f, "{sign}{}", self.name)
    }
}

/// Accumulates feature flags into a single feature string.
#[derive(Debug, Default, Clone)]
pub struct FeatureSetBuilder {
    features: Vec<Feature>,
    accumulated: String,
}

impl FeatureSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature flag and append the re-derived feature list to the buffer.
    pub fn add_feature(&mut self, flag: &str) -> &mut Self {
        let Some(feature) = Feature::parse(flag) else {
            return self;
        };
        self.features.push(feature);

        let snapshot = self.current();
        if !self.accumulated.is_empty() {
            self.accumulated.push(',');
        }
        self.accumulated.push_str(&snapshot);
        self
    }

    pub fn extend<I, S>(&mut self, flags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for flag in flags {
            self.add_feature(flag.as_ref());
        }
        self
    }

    /// Features added so far, in request order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// String form of the current feature list alone (no history).
    pub fn current(&self) -> String {
        self.features
            .iter()
            .map(Feature::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The accumulated feature string.
    pub fn as_str(&self) -> &str {
        &self.accumulated
    }

    pub fn finish(self) -> String {
        self.accumulated
    }
}

/// Compose the feature string for an ordered list of flags.
pub fn compose_feature_string<I, S>(flags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = FeatureSetBuilder::new();
    builder.extend(flags);
    builder.finish()
}

/// Split a feature string back into its flags, in order, duplicates included.
pub fn parse_feature_string(features: &str) -> Vec<Feature> {
    features.split(',').filter_map(Feature::parse).collect()
}

/// Effective features of a feature string: one entry per name in first-seen
/// order, with the state of the last flag naming it.
pub fn resolve_feature_string(features: &str) -> Vec<Feature> {
    let mut resolved: Vec<Feature> = Vec::new();
    for feature in parse_feature_string(features) {
        match resolved.iter_mut().find(|f| f.name == feature.name) {
            Some(existing) => existing.enabled = feature.enabled,
            None => resolved.push(feature),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let builder = FeatureSetBuilder::new();
        assert_eq!(builder.finish(), "");
        assert_eq!(compose_feature_string(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_single_feature() {
        assert_eq!(compose_feature_string(["+sse4.2"]), "+sse4.2");
        assert_eq!(compose_feature_string(["popcnt"]), "+popcnt");
        assert_eq!(compose_feature_string(["-AVX"]), "-avx");
    }

    #[test]
    fn test_accumulates_history() {
        let mut builder = FeatureSetBuilder::new();
        builder.add_feature("a");
        assert_eq!(builder.as_str(), "+a");
        builder.add_feature("b");
        assert_eq!(builder.current(), "+a,+b");
        assert_eq!(builder.as_str(), "+a,+a,+b");
    }

    #[test]
    fn test_no_deduplication() {
        let features = compose_feature_string(["+x", "+x"]);
        assert_eq!(features, "+x,+x,+x");
        assert_eq!(parse_feature_string(&features).len(), 3);
    }

    #[test]
    fn test_empty_flags_are_ignored() {
        assert_eq!(compose_feature_string(["", "+", "bmi1"]), "+bmi1");
    }

    #[test]
    fn test_round_trip_recovers_flags() {
        let features = compose_feature_string(["a", "b"]);
        let resolved = resolve_feature_string(&features);
        assert_eq!(
            resolved,
            vec![
                Feature {
                    name: "a".into(),
                    enabled: true
                },
                Feature {
                    name: "b".into(),
                    enabled: true
                },
            ]
        );
    }

    #[test]
    fn test_last_flag_wins_when_resolving() {
        let resolved = resolve_feature_string(&compose_feature_string(["+avx", "-avx"]));
        assert_eq!(resolved.len(), 1);
        assert!(!resolved[0].enabled);
    }

    #[test]
    fn test_setting_name() {
        let feature = Feature::parse("+sse4.2").unwrap();
        assert_eq!(feature.setting_name(), "has_sse42");
        assert_eq!(Feature::parse("lzcnt").unwrap().setting_name(), "has_lzcnt");
    }
}
