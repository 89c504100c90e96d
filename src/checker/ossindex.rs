use crate::assembler::{AuditConfig, Credentials};
use crate::cache::Cache;
use crate::model::Coordinate;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::HashMap;

const COMPONENT_REPORT_URL: &str = "https://ossindex.sonatype.org/api/v3/component-report";

/// Maximum number of coordinates OSS Index accepts in one request.
const MAX_COORDINATES: usize = 128;

/// Client for the Sonatype OSS Index component-report API.
pub struct OssIndexClient {
    client: reqwest::Client,
    cache: Cache,
}

#[derive(Serialize)]
struct ComponentReportRequest<'a> {
    coordinates: &'a [String],
}

impl OssIndexClient {
    pub fn new() -> Self {
        Self::with_cache(Cache::new())
    }

    pub fn with_cache(cache: Cache) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("depaudit/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            cache,
        }
    }

    /// Requests reports for a single chunk of purls.
    async fn component_report(
        &self,
        purls: &[String],
        credentials: Option<&Credentials>,
    ) -> Result<Vec<Coordinate>> {
        tracing::debug!(count = purls.len(), "requesting component reports");

        let mut request = self
            .client
            .post(COMPONENT_REPORT_URL)
            .json(&ComponentReportRequest { coordinates: purls });

        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.token));
        }

        let response = request
            .send()
            .await
            .context("OSS Index request failed")?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                bail!("OSS Index rejected the credentials, check --user and --token")
            }
            StatusCode::TOO_MANY_REQUESTS => {
                bail!("OSS Index rate limit exceeded, provide credentials to raise the limit")
            }
            status => bail!("OSS Index returned {}", status),
        }

        response
            .json::<Vec<Coordinate>>()
            .await
            .context("malformed OSS Index response")
    }
}

impl OssIndexClient {
    /// A cached report, if one exists for exactly this purl.
    fn cached_report(&self, purl: &str) -> Option<Coordinate> {
        let cached = self.cache.get::<Coordinate>(purl)?;
        if cached.coordinates.eq_ignore_ascii_case(purl) {
            Some(cached)
        } else {
            tracing::warn!(purl, cached = %cached.coordinates, "ignoring cache entry for another purl");
            None
        }
    }
}

impl Default for OssIndexClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Key a purl is matched on: lowercased, with any leading `v` dropped from
/// the version since OSS Index may echo `@1.4.0` for a submitted `@v1.4.0`.
fn report_key(purl: &str) -> String {
    let purl = purl.to_lowercase();
    match purl.rsplit_once('@') {
        Some((name, version)) => {
            format!("{}@{}", name, version.strip_prefix('v').unwrap_or(version))
        }
        None => purl,
    }
}

/// Pairs each purl with its report. A purl with no report gets an empty
/// coordinate; matched reports are renamed to the purl as submitted.
fn match_reports(purls: &[String], reports: Vec<Coordinate>) -> Vec<(String, Coordinate)> {
    let mut by_key: HashMap<String, Coordinate> = reports
        .into_iter()
        .map(|report| (report_key(&report.coordinates), report))
        .collect();

    let matched: Vec<(String, Coordinate)> = purls
        .iter()
        .map(|purl| {
            let report = match by_key.remove(&report_key(purl)) {
                Some(report) => Coordinate {
                    coordinates: purl.clone(),
                    ..report
                },
                None => {
                    tracing::debug!(purl = %purl, "no report returned for purl");
                    Coordinate::new(purl.clone())
                }
            };
            (purl.clone(), report)
        })
        .collect();

    for unmatched in by_key.values() {
        tracing::warn!(
            coordinates = %unmatched.coordinates,
            vulnerabilities = unmatched.vulnerabilities.len(),
            "OSS Index returned a report for a purl that was not requested"
        );
    }

    matched
}

#[async_trait]
impl super::VulnerabilityLookup for OssIndexClient {
    fn name(&self) -> &'static str {
        "OSS Index"
    }

    async fn lookup(&self, purls: &[String], config: &AuditConfig) -> Result<Vec<Coordinate>> {
        let mut found: HashMap<String, Coordinate> = HashMap::new();
        let mut pending = Vec::new();

        for purl in purls {
            match self.cached_report(purl) {
                Some(coordinate) => {
                    found.insert(purl.clone(), coordinate);
                }
                None => pending.push(purl.clone()),
            }
        }

        tracing::info!(
            cached = found.len(),
            pending = pending.len(),
            "auditing purls with OSS Index"
        );

        let requests = pending
            .chunks(MAX_COORDINATES)
            .map(|chunk| self.component_report(chunk, config.credentials.as_ref()));
        let responses = try_join_all(requests).await?;

        for (purl, report) in match_reports(&pending, responses.into_iter().flatten().collect()) {
            if let Err(e) = self.cache.set(&purl, &report) {
                tracing::warn!(purl = %purl, error = %e, "failed to cache report");
            }
            found.insert(purl, report);
        }

        Ok(purls
            .iter()
            .map(|purl| {
                found
                    .remove(purl)
                    .unwrap_or_else(|| Coordinate::new(purl.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::VulnerabilityLookup;
    use crate::model::Vulnerability;
    use std::time::Duration;

    #[test]
    fn test_match_reports_is_case_insensitive() {
        let purls = vec![
            "pkg:golang/github.com/BurntSushi/toml@v0.3.1".to_string(),
            "pkg:golang/github.com/pkg/errors@v0.9.1".to_string(),
        ];
        let reports = vec![
            Coordinate::new("pkg:golang/github.com/pkg/errors@v0.9.1")
                .with_vulnerabilities(vec![Vulnerability::new("1")]),
            Coordinate::new("pkg:golang/github.com/burntsushi/toml@v0.3.1"),
        ];

        let matched = match_reports(&purls, reports);

        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].0, purls[0]);
        assert!(matched[0].1.vulnerabilities.is_empty());
        assert_eq!(matched[1].1.vulnerabilities.len(), 1);
    }

    #[test]
    fn test_match_reports_ignores_leading_v() {
        let purls = vec!["pkg:golang/github.com/gorilla/websocket@v1.4.0".to_string()];
        let reports = vec![Coordinate::new("pkg:golang/github.com/gorilla/websocket@1.4.0")
            .with_vulnerabilities(vec![Vulnerability::new("1").with_cve("CVE-2020-27813")])];

        let matched = match_reports(&purls, reports);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].1.coordinates, purls[0]);
        assert_eq!(matched[0].1.vulnerabilities.len(), 1);
        assert_eq!(
            matched[0].1.vulnerabilities[0].cve.as_deref(),
            Some("CVE-2020-27813")
        );
    }

    #[test]
    fn test_report_key() {
        assert_eq!(
            report_key("pkg:golang/github.com/BurntSushi/toml@v0.3.1"),
            "pkg:golang/github.com/burntsushi/toml@0.3.1"
        );
        assert_eq!(
            report_key("pkg:golang/github.com/vmihailenco/msgpack@4.0.4"),
            "pkg:golang/github.com/vmihailenco/msgpack@4.0.4"
        );
        assert_eq!(report_key("pkg:golang/example.com/nover"), "pkg:golang/example.com/nover");
    }

    #[test]
    fn test_unrequested_report_is_not_attached() {
        let purls = vec!["pkg:golang/a@v1.0.0".to_string()];
        let reports = vec![Coordinate::new("pkg:golang/b@1.0.0")
            .with_vulnerabilities(vec![Vulnerability::new("1")])];

        let matched = match_reports(&purls, reports);
        assert_eq!(matched, vec![(purls[0].clone(), Coordinate::new("pkg:golang/a@v1.0.0"))]);
    }

    #[test]
    fn test_match_reports_fills_missing() {
        let purls = vec!["pkg:golang/a@v1.0.0".to_string()];
        let matched = match_reports(&purls, Vec::new());
        assert_eq!(matched[0].1, Coordinate::new("pkg:golang/a@v1.0.0"));
    }

    #[tokio::test]
    async fn test_lookup_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_dir(dir.path(), Duration::from_secs(3600));
        let purl = "pkg:golang/github.com/gorilla/websocket@v1.4.0".to_string();
        let cached = Coordinate::new(purl.clone())
            .with_vulnerabilities(vec![Vulnerability::new("x").with_cve("CVE-2020-27813")]);
        cache.set(&purl, &cached).unwrap();

        // Every purl is cached, so no request is made.
        let client = OssIndexClient::with_cache(cache);
        let result = client
            .lookup(&[purl.clone()], &AuditConfig::default())
            .await
            .unwrap();

        assert_eq!(result, vec![cached]);
        assert_eq!(client.name(), "OSS Index");
    }

    #[test]
    fn test_cached_report_must_name_the_purl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::in_dir(dir.path(), Duration::from_secs(3600));
        let purl = "pkg:golang/github.com/foo/bar_baz@v1.0.0";
        cache
            .set(purl, &Coordinate::new("pkg:golang/github.com/foo_bar/baz@v1.0.0"))
            .unwrap();
        let client = OssIndexClient::with_cache(cache);

        assert!(client.cached_report(purl).is_none());
        assert!(client
            .cached_report("pkg:golang/github.com/foo/bar_baz@v1.0.1")
            .is_none());
    }

    #[tokio::test]
    async fn test_lookup_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let client = OssIndexClient::with_cache(Cache::in_dir(dir.path(), Duration::from_secs(1)));
        let result = client.lookup(&[], &AuditConfig::default()).await.unwrap();
        assert!(result.is_empty());
    }
}
