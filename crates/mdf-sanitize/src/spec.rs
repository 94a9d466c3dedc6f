//! Allow-list model for HTML tags and attributes.
//!
//! An [`AllowedHtml`] maps tag names to the attributes permitted on them.
//! The `*` tag holds global attributes that apply to every allowed tag, and
//! attribute names ending in `*` are prefix patterns (`aria*`, `data-*`).

use std::collections::{BTreeMap, BTreeSet};

/// Wildcard tag name and the bare wildcard attribute pattern.
pub const WILDCARD: &str = "*";

/// Rule attached to an attribute of a tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeRule {
    /// Attribute is allowed (`true`) or explicitly denied (`false`) with any value.
    Allowed(bool),
    /// Attribute is allowed only with one of these values.
    Values(BTreeSet<String>),
}

impl AttributeRule {
    /// Build a value-restricted rule.
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    /// Check whether this rule accepts the given attribute value.
    pub fn permits(&self, value: &str) -> bool {
        match self {
            Self::Allowed(allowed) => *allowed,
            Self::Values(values) => values.contains(value),
        }
    }

    /// Most-permissive union of two rules.
    ///
    /// `Allowed(true)` absorbs anything, `Allowed(false)` is the identity and
    /// value sets are joined.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Allowed(true), _) | (_, Self::Allowed(true)) => Self::Allowed(true),
            (Self::Allowed(false), rule) | (rule, Self::Allowed(false)) => rule.clone(),
            (Self::Values(a), Self::Values(b)) => Self::Values(a.union(b).cloned().collect()),
        }
    }

    /// Whether this rule can ever admit the attribute.
    pub fn is_permissive(&self) -> bool {
        match self {
            Self::Allowed(allowed) => *allowed,
            Self::Values(values) => !values.is_empty(),
        }
    }
}

/// Allow-list of HTML tags and their attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedHtml {
    tags: BTreeMap<String, BTreeMap<String, AttributeRule>>,
}

impl AllowedHtml {
    /// Create an empty allow-list (nothing is allowed).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of several allow-lists, applied in iteration order.
    pub fn union<'a, I>(layers: I) -> Self
    where
        I: IntoIterator<Item = &'a AllowedHtml>,
    {
        layers.into_iter().fold(Self::new(), |mut acc, layer| {
            acc.merge(layer);
            acc
        })
    }

    /// Allow a tag with the given plain attributes.
    #[must_use]
    pub fn with_tag(mut self, tag: &str, attributes: &[&str]) -> Self {
        self.allow_tag(tag);
        for attribute in attributes {
            self.allow_attribute(tag, attribute, AttributeRule::Allowed(true));
        }
        self
    }

    /// Allow an attribute on a tag, restricted to the given values.
    #[must_use]
    pub fn with_values(mut self, tag: &str, attribute: &str, values: &[&str]) -> Self {
        self.allow_attribute(tag, attribute, AttributeRule::values(values.iter().copied()));
        self
    }

    /// Add a tag to the allow-list without attributes.
    pub fn allow_tag(&mut self, tag: &str) -> &mut Self {
        self.tags.entry(tag.to_ascii_lowercase()).or_default();
        self
    }

    /// Add an attribute rule to a tag, unioning with any existing rule.
    ///
    /// The tag itself is added if missing.
    pub fn allow_attribute(&mut self, tag: &str, attribute: &str, rule: AttributeRule) -> &mut Self {
        let attributes = self.tags.entry(tag.to_ascii_lowercase()).or_default();
        let key = attribute.to_ascii_lowercase();
        let merged = match attributes.get(&key) {
            Some(existing) => existing.union(&rule),
            None => rule,
        };
        attributes.insert(key, merged);
        self
    }

    /// Set an attribute rule on a tag, replacing any existing rule.
    ///
    /// Use `AttributeRule::Allowed(false)` to deny an attribute that a
    /// wildcard would otherwise admit.
    pub fn set_attribute(&mut self, tag: &str, attribute: &str, rule: AttributeRule) -> &mut Self {
        self.tags
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .insert(attribute.to_ascii_lowercase(), rule);
        self
    }

    /// Merge another allow-list into this one (most-permissive union).
    ///
    /// Every declared `(tag, attribute)` entry of either side becomes the
    /// union of what each side resolves it to, so an exact rule from one side
    /// never narrows a wildcard or pattern of the other. An explicit denial
    /// survives only when the other side does not admit the attribute.
    pub fn merge(&mut self, other: &AllowedHtml) -> &mut Self {
        let before = self.clone();
        let keys: BTreeSet<(&str, &str)> = before
            .declared()
            .chain(other.declared())
            .collect();

        for (tag, attribute) in keys {
            let rule = match (
                before.attribute_rule(tag, attribute),
                other.attribute_rule(tag, attribute),
            ) {
                (Some(a), Some(b)) => a.union(b),
                (Some(rule), None) | (None, Some(rule)) => rule.clone(),
                (None, None) => continue,
            };
            self.set_attribute(tag, attribute, rule);
        }
        for tag in other.tags.keys() {
            self.allow_tag(tag);
        }
        self
    }

    /// Every declared `(tag, attribute)` pair, patterns included.
    fn declared(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().flat_map(|(tag, attributes)| {
            attributes
                .keys()
                .map(move |attribute| (tag.as_str(), attribute.as_str()))
        })
    }

    /// Return the union of `self` and `other`.
    #[must_use]
    pub fn merged(mut self, other: &AllowedHtml) -> Self {
        self.merge(other);
        self
    }

    /// Check whether nothing at all is allowed.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Check whether a tag may appear in output.
    ///
    /// The wildcard entry only carries global attributes, it does not admit
    /// arbitrary tags.
    pub fn allows_tag(&self, tag: &str) -> bool {
        tag != WILDCARD && self.tags.contains_key(&tag.to_ascii_lowercase())
    }

    /// Allowed tag names, excluding the wildcard entry.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .keys()
            .map(String::as_str)
            .filter(|tag| *tag != WILDCARD)
    }

    /// Attribute rules declared for a tag (or `*`).
    pub fn attributes(&self, tag: &str) -> Option<&BTreeMap<String, AttributeRule>> {
        self.tags.get(&tag.to_ascii_lowercase())
    }

    /// Iterate over every `(tag, attributes)` entry, including the wildcard.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, AttributeRule>)> {
        self.tags.iter().map(|(tag, attrs)| (tag.as_str(), attrs))
    }

    /// Resolve the rule governing `attribute` on `tag`.
    ///
    /// Lookup order: exact attribute on the tag, the tag's patterns (longest
    /// prefix first), exact attribute on `*`, then `*` patterns. The first hit
    /// wins, so explicit entries override wildcards.
    pub fn attribute_rule(&self, tag: &str, attribute: &str) -> Option<&AttributeRule> {
        let tag = tag.to_ascii_lowercase();
        let attribute = attribute.to_ascii_lowercase();

        let own = self.tags.get(&tag);
        let global = self.tags.get(WILDCARD);

        own.and_then(|attrs| attrs.get(&attribute))
            .or_else(|| own.and_then(|attrs| match_pattern(attrs, &attribute)))
            .or_else(|| global.and_then(|attrs| attrs.get(&attribute)))
            .or_else(|| global.and_then(|attrs| match_pattern(attrs, &attribute)))
    }

    /// Check whether `attribute="value"` may appear on `tag`.
    pub fn permits(&self, tag: &str, attribute: &str, value: &str) -> bool {
        self.allows_tag(tag)
            && self
                .attribute_rule(tag, attribute)
                .is_some_and(|rule| rule.permits(value))
    }
}

/// Prefix of an attribute pattern (`data-*` → `data-`), if it is one.
pub(crate) fn pattern_prefix(attribute: &str) -> Option<&str> {
    attribute.strip_suffix('*')
}

/// Find the rule of the longest pattern matching `attribute`.
fn match_pattern<'a>(
    attributes: &'a BTreeMap<String, AttributeRule>,
    attribute: &str,
) -> Option<&'a AttributeRule> {
    attributes
        .iter()
        .filter_map(|(name, rule)| pattern_prefix(name).map(|prefix| (prefix, rule)))
        .filter(|(prefix, _)| attribute.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, rule)| rule)
}
