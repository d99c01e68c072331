//! Service descriptors and immutable configuration snapshots.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jobmatch_common::ServiceKind;
use reqwest::Url;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Default per-call deadline when an entry omits `timeout_ms`.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Errors from loading or validating the services document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read services document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed services document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Unknown service '{0}' in services document")]
    UnknownService(String),
    #[error("Service '{0}' is listed more than once")]
    DuplicateService(ServiceKind),
    #[error("Service '{0}' is enabled but has no endpoint")]
    MissingEndpoint(ServiceKind),
    #[error("Service '{service}' has an invalid endpoint: {reason}")]
    InvalidEndpoint { service: ServiceKind, reason: String },
    #[error("Service '{0}' must have a positive timeout_ms")]
    InvalidTimeout(ServiceKind),
}

/// Routing information for one logical service.
///
/// Fields are private so a descriptor can only be built through
/// [`ServiceDescriptor::new`], which validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    name: ServiceKind,
    endpoint: String,
    timeout_ms: u64,
    enabled: bool,
}

impl ServiceDescriptor {
    pub fn new(
        name: ServiceKind,
        endpoint: impl Into<String>,
        timeout_ms: u64,
        enabled: bool,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into().trim().to_string();
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(name));
        }
        if enabled {
            if endpoint.is_empty() {
                return Err(ConfigError::MissingEndpoint(name));
            }
            validate_endpoint(name, &endpoint)?;
        }
        Ok(Self {
            name,
            endpoint,
            timeout_ms,
            enabled,
        })
    }

    pub fn name(&self) -> ServiceKind {
        self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

fn validate_endpoint(service: ServiceKind, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        service,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            service,
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// An immutable, versioned view of the full service configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    sequence: u64,
    loaded_at: DateTime<Utc>,
    services: BTreeMap<ServiceKind, ServiceDescriptor>,
}

impl ConfigSnapshot {
    pub fn new(sequence: u64, descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        Self {
            sequence,
            loaded_at: Utc::now(),
            services: descriptors.into_iter().map(|d| (d.name(), d)).collect(),
        }
    }

    /// Built-in routing table used when no services document can be loaded.
    pub fn defaults() -> Self {
        let descriptors = ServiceKind::ALL.into_iter().enumerate().map(|(i, kind)| {
            let timeout_ms = match kind {
                ServiceKind::ResumeParser => 10_000,
                _ => DEFAULT_TIMEOUT_MS,
            };
            let path = match kind {
                ServiceKind::JobRecommender => "recommend",
                ServiceKind::SalaryPredictor => "predict",
                ServiceKind::CandidateRanker => "rank",
                ServiceKind::ResumeParser => "parse",
                ServiceKind::DemandForecaster => "forecast",
                ServiceKind::CandidateSegmenter => "segment",
            };
            ServiceDescriptor {
                name: kind,
                endpoint: format!("http://localhost:{}/{}", 5001 + i, path),
                timeout_ms,
                enabled: true,
            }
        });
        Self::new(0, descriptors)
    }

    /// Parse and validate a services document.
    ///
    /// Either every entry is valid and a snapshot is produced, or nothing is.
    /// Keys must be config keys (`job_recommender`, ...); route aliases are
    /// rejected, as is any service listed twice.
    pub fn parse(sequence: u64, document: &str) -> Result<Self, ConfigError> {
        let document: ServicesDocument = serde_yaml::from_str(document)?;
        let mut descriptors = BTreeMap::new();
        for (name, entry) in document.services {
            let kind = ServiceKind::from_config_key(&name)
                .ok_or_else(|| ConfigError::UnknownService(name.clone()))?;
            if descriptors.contains_key(&kind) {
                return Err(ConfigError::DuplicateService(kind));
            }
            let descriptor = match entry {
                ServiceEntry::Endpoint(endpoint) => {
                    ServiceDescriptor::new(kind, endpoint, DEFAULT_TIMEOUT_MS, true)?
                }
                ServiceEntry::Detailed(entry) => {
                    ServiceDescriptor::new(kind, entry.endpoint, entry.timeout_ms, entry.enabled)?
                }
            };
            descriptors.insert(kind, descriptor);
        }
        Ok(Self::new(sequence, descriptors.into_values()))
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn get(&self, kind: ServiceKind) -> Option<&ServiceDescriptor> {
        self.services.get(&kind)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ServicesDocument {
    #[serde(deserialize_with = "entries_in_order")]
    services: Vec<(String, ServiceEntry)>,
}

/// Keeps every entry of the `services` mapping, repeated keys included, so
/// duplicates can be reported instead of silently overwritten.
fn entries_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, ServiceEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, ServiceEntry)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a mapping of service names to entries")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

/// Either `name: url` shorthand or a full mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceEntry {
    Endpoint(String),
    Detailed(DetailedEntry),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedEntry {
    #[serde(default)]
    endpoint: String,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
services:
  job_recommender:
    endpoint: http://models.internal:5001/recommend
    timeout_ms: 1500
  salary_predictor: http://models.internal:5002/predict
  resume_parser:
    endpoint: ""
    enabled: false
"#;

    #[test]
    fn test_parse_full_and_shorthand_entries() {
        let snapshot = ConfigSnapshot::parse(4, DOCUMENT).unwrap();
        assert_eq!(snapshot.sequence(), 4);
        assert_eq!(snapshot.len(), 3);

        let recommender = snapshot.get(ServiceKind::JobRecommender).unwrap();
        assert_eq!(recommender.endpoint(), "http://models.internal:5001/recommend");
        assert_eq!(recommender.timeout(), Duration::from_millis(1500));
        assert!(recommender.enabled());

        let salary = snapshot.get(ServiceKind::SalaryPredictor).unwrap();
        assert_eq!(salary.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert!(salary.enabled());

        let parser = snapshot.get(ServiceKind::ResumeParser).unwrap();
        assert!(!parser.enabled());
        assert!(snapshot.get(ServiceKind::CandidateRanker).is_none());
    }

    #[test]
    fn test_enabled_entry_requires_endpoint() {
        let doc = "services:\n  candidate_ranker:\n    enabled: true\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint(ServiceKind::CandidateRanker)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let doc = "services:\n  candidate_ranker:\n    endpoint: http://x/rank\n    timeout_ms: 0\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(ServiceKind::CandidateRanker)));
    }

    #[test]
    fn test_negative_timeout_is_malformed() {
        let doc = "services:\n  candidate_ranker:\n    endpoint: http://x/rank\n    timeout_ms: -5\n";
        assert!(ConfigSnapshot::parse(1, doc).is_err());
    }

    #[test]
    fn test_unknown_service_rejected() {
        let doc = "services:\n  fortune_teller: http://x/\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownService(name) if name == "fortune_teller"));
    }

    #[test]
    fn test_route_alias_is_not_a_config_key() {
        let doc = "services:\n  recommend: http://x/recommend\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownService(name) if name == "recommend"));
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let doc = "services:\n  job_recommender: http://a/recommend\n  job_recommender: http://b/recommend\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateService(ServiceKind::JobRecommender)));
    }

    #[test]
    fn test_alias_next_to_config_key_rejected() {
        let doc = "services:\n  job_recommender: http://a/recommend\n  recommend: http://b/recommend\n";
        assert!(ConfigSnapshot::parse(1, doc).is_err());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let doc = "services:\n  demand_forecaster: ftp://files/forecast\n";
        let err = ConfigSnapshot::parse(1, doc).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_missing_services_key_is_malformed() {
        let err = ConfigSnapshot::parse(1, "gateway:\n  log_requests: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_defaults_cover_every_service() {
        let snapshot = ConfigSnapshot::defaults();
        assert_eq!(snapshot.sequence(), 0);
        for kind in ServiceKind::ALL {
            assert!(snapshot.get(kind).is_some(), "missing default for {}", kind);
        }
        assert_eq!(
            snapshot.get(ServiceKind::ResumeParser).unwrap().timeout_ms(),
            10_000
        );
        assert_eq!(
            snapshot.get(ServiceKind::CandidateSegmenter).unwrap().endpoint(),
            "http://localhost:5006/segment"
        );
    }
}
