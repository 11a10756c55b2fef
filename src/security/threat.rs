//! Pattern-based threat detection over normalized request content.
//!
//! Every pattern group is compiled once from configuration. Substrings are
//! lowercased at compile time and regexes run against lowercased content, so
//! matching is case-insensitive throughout. Groups are checked in configured
//! order and the first hit wins.

use std::fmt;

use regex::Regex;

use crate::config::schema::{PatternTarget, ThreatConfig};
use crate::config::validation::ValidationError;

/// Where in the request a pattern matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchLocation {
    Url,
    Header(String),
    UserAgent,
    Body,
}

impl fmt::Display for MatchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLocation::Url => write!(f, "url"),
            MatchLocation::Header(name) => write!(f, "header:{}", name),
            MatchLocation::UserAgent => write!(f, "user_agent"),
            MatchLocation::Body => write!(f, "body"),
        }
    }
}

/// A detected threat indicator. Carries the pattern, never the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatMatch {
    pub group: String,
    pub pattern: String,
    pub location: MatchLocation,
}

/// Lowercased request content ready for scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanInput {
    pub url: String,
    /// Percent-decoded URL, when decoding changed anything.
    pub decoded_url: Option<String>,
    /// Header name and value pairs, both lowercased.
    pub headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub body: Option<String>,
    /// Percent-decoded body, when decoding changed anything.
    pub decoded_body: Option<String>,
}

#[derive(Debug)]
struct CompiledGroup {
    name: String,
    target: PatternTarget,
    substrings: Vec<String>,
    regexes: Vec<Regex>,
}

impl CompiledGroup {
    fn find(&self, content: &str) -> Option<String> {
        if let Some(hit) = self.substrings.iter().find(|s| content.contains(s.as_str())) {
            return Some(hit.clone());
        }
        self.regexes
            .iter()
            .find(|re| re.is_match(content))
            .map(|re| re.as_str().to_string())
    }

    fn scan(&self, input: &ScanInput) -> Option<ThreatMatch> {
        let hit = |pattern: String, location: MatchLocation| ThreatMatch {
            group: self.name.clone(),
            pattern,
            location,
        };

        match self.target {
            PatternTarget::UserAgent => {
                let agent = input.user_agent.as_deref()?;
                self.find(agent).map(|p| hit(p, MatchLocation::UserAgent))
            }
            PatternTarget::All => {
                let url_hit = self
                    .find(&input.url)
                    .or_else(|| input.decoded_url.as_deref().and_then(|u| self.find(u)));
                if let Some(pattern) = url_hit {
                    return Some(hit(pattern, MatchLocation::Url));
                }
                for (name, value) in &input.headers {
                    if let Some(pattern) = self.find(value) {
                        return Some(hit(pattern, MatchLocation::Header(name.clone())));
                    }
                }
                let body = input.body.as_deref()?;
                self.find(body)
                    .or_else(|| input.decoded_body.as_deref().and_then(|b| self.find(b)))
                    .map(|p| hit(p, MatchLocation::Body))
            }
        }
    }
}

/// Compiled pattern groups.
#[derive(Debug)]
pub struct ThreatDetector {
    enabled: bool,
    groups: Vec<CompiledGroup>,
}

impl ThreatDetector {
    /// Compile the configured groups.
    pub fn compile(config: &ThreatConfig) -> Result<Self, ValidationError> {
        let mut groups = Vec::with_capacity(config.groups.len());

        for group in &config.groups {
            let mut regexes = Vec::with_capacity(group.regexes.len());
            for pattern in &group.regexes {
                let regex = Regex::new(pattern).map_err(|source| ValidationError::InvalidRegex {
                    group: group.name.clone(),
                    pattern: pattern.clone(),
                    source,
                })?;
                regexes.push(regex);
            }

            groups.push(CompiledGroup {
                name: group.name.clone(),
                target: group.target,
                substrings: group.substrings.iter().map(|s| s.to_lowercase()).collect(),
                regexes,
            });
        }

        tracing::debug!(groups = groups.len(), enabled = config.enabled, "Threat detector compiled");

        Ok(Self {
            enabled: config.enabled,
            groups,
        })
    }

    /// First indicator found in `input`, if any.
    pub fn scan(&self, input: &ScanInput) -> Option<ThreatMatch> {
        if !self.enabled {
            return None;
        }
        self.groups.iter().find_map(|group| group.scan(input))
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }
}
