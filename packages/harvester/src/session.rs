//! Feed session: paginated `ListRecords` crawl of one institution.
//!
//! A session walks `FIRST_REQUEST → CONTINUATION_REQUEST* → DONE`, following
//! resumption tokens until a page arrives without one. Server errors are
//! retried without limit after a fixed delay. Connection failures are
//! retried too, but the session gives up (`ABORTED`) once the configured
//! number of failures is reached and returns what it has.
//!
//! Every record on a page yields exactly one output record or one skip. An
//! institution without a registered URL strategy is a configuration fault:
//! the session scans the page for URL-like fields and stops with
//! [`HarvesterError::NoUrlStrategy`].

use std::fmt;
use std::thread;

use roxmltree::{Document, Node};

use crate::config::HarvestConfig;
use crate::error::{HarvesterError, Result};
use crate::http::{build_url, bytes_to_string, fetch, FetchOutcome};
use crate::mapping::{
    merge_candidates, search_for_urls, InstitutionRegistry, SchemaMapper, UrlCandidates,
};
use crate::oai::{self, OaiClient};
use crate::skip::{SkipReason, SkipTally};
use crate::types::{AggregationRecord, InstitutionDescriptor};
use crate::xml::{find_child, flatten, get_text, ParsedRecord};

/// Why a session stopped before the feed was exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Connection failures reached the configured limit.
    ConnectionFailures(u32),
    /// The endpoint answered with a 4xx status.
    ClientError(u16),
    /// A page body was not well-formed XML.
    UnparseableResponse(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailures(n) => write!(f, "{n} connection failures"),
            Self::ClientError(status) => write!(f, "client error (HTTP {status})"),
            Self::UnparseableResponse(e) => write!(f, "unparseable response: {e}"),
        }
    }
}

/// Pagination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Next request carries the metadata prefix and optional set.
    FirstRequest { set: Option<String> },
    /// Next request carries only the resumption token.
    Continuation(String),
    Done,
    Aborted(AbortReason),
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted(_))
    }
}

/// Running totals reported after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub records: usize,
    pub skipped: usize,
}

/// How a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Done,
    Aborted(AbortReason),
}

/// Result of one institution's crawl.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub institution_id: String,
    pub institution_name: String,
    pub records: Vec<AggregationRecord>,
    pub tally: SkipTally,
    pub termination: Termination,
}

impl CrawlReport {
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.tally.total()
    }

    /// Whether the crawl ended early with partial results.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self.termination, Termination::Aborted(_))
    }

    /// `(records, skipped count)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<AggregationRecord>, usize) {
        let skipped = self.skipped();
        (self.records, skipped)
    }
}

type ProgressFn<'a> = Box<dyn FnMut(Progress) + 'a>;

/// One institution's crawl. Owns all per-crawl state.
pub struct FeedSession<'a> {
    client: OaiClient,
    descriptor: &'a InstitutionDescriptor,
    institution_name: String,
    metadata_prefix: String,
    mapper: SchemaMapper<'a>,
    config: HarvestConfig,
    state: SessionState,
    connection_failures: u32,
    pages: usize,
    records: Vec<AggregationRecord>,
    tally: SkipTally,
    unregistered: bool,
    candidates: UrlCandidates,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> FeedSession<'a> {
    /// Create a session, discovering the display name and metadata prefix
    /// from the endpoint when the descriptor leaves them out.
    pub fn new(
        descriptor: &'a InstitutionDescriptor,
        registry: &'a InstitutionRegistry,
        config: HarvestConfig,
    ) -> Result<Self> {
        let client = OaiClient::new(&descriptor.url)?.with_retry(config.retry_policy());
        Self::with_client(client, descriptor, registry, config)
    }

    /// Create a session around an existing OAI client.
    pub fn with_client(
        client: OaiClient,
        descriptor: &'a InstitutionDescriptor,
        registry: &'a InstitutionRegistry,
        config: HarvestConfig,
    ) -> Result<Self> {
        let institution_name = match descriptor.configured_name() {
            Some(name) => name.to_string(),
            None => client.repository_name()?,
        };
        let metadata_prefix = match descriptor.metadata_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix.to_string(),
            _ => client.get_metadata_prefix()?,
        };
        let mapper = SchemaMapper::new(registry, descriptor, institution_name.clone());

        Ok(Self {
            client,
            descriptor,
            institution_name,
            metadata_prefix,
            mapper,
            config,
            state: SessionState::FirstRequest { set: None },
            connection_failures: 0,
            pages: 0,
            records: Vec::new(),
            tally: SkipTally::new(),
            unregistered: false,
            candidates: UrlCandidates::new(),
            progress: None,
        })
    }

    /// Receive running totals after every page.
    #[must_use]
    pub fn on_progress(mut self, callback: impl FnMut(Progress) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn institution_name(&self) -> &str {
        &self.institution_name
    }

    #[must_use]
    pub fn metadata_prefix(&self) -> &str {
        &self.metadata_prefix
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Skipped records so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.tally.total()
    }

    /// Crawl the feed to completion (or abort) and return the report.
    ///
    /// Each configured include set gets its own pagination sequence; all
    /// sequences share the failure counter, tally and output.
    pub fn crawl(mut self) -> Result<CrawlReport> {
        let sets: Vec<Option<String>> = if self.descriptor.include.is_empty() {
            vec![None]
        } else {
            self.descriptor.include.iter().cloned().map(Some).collect()
        };

        tracing::info!(
            institution = %self.descriptor.id,
            endpoint = %self.client.endpoint(),
            metadata_prefix = %self.metadata_prefix,
            sets = sets.len(),
            "Starting crawl"
        );

        for set in sets {
            self.state = SessionState::FirstRequest { set };
            self.run_sequence()?;
            if matches!(self.state, SessionState::Aborted(_)) {
                break;
            }
        }

        let termination = match self.state {
            SessionState::Aborted(reason) => {
                tracing::warn!(
                    institution = %self.descriptor.id,
                    reason = %reason,
                    records = self.records.len(),
                    "Crawl aborted, keeping partial results"
                );
                Termination::Aborted(reason)
            }
            _ => Termination::Done,
        };

        tracing::info!(
            institution = %self.descriptor.id,
            records = self.records.len(),
            skipped = self.tally.total(),
            pages = self.pages,
            "Crawl finished"
        );

        Ok(CrawlReport {
            institution_id: self.descriptor.id.clone(),
            institution_name: self.institution_name,
            records: self.records,
            tally: self.tally,
            termination,
        })
    }

    fn request_params(&self) -> Option<Vec<(&str, &str)>> {
        let mut params = vec![("verb", "ListRecords")];
        match &self.state {
            SessionState::FirstRequest { set } => {
                params.push(("metadataPrefix", self.metadata_prefix.as_str()));
                if let Some(set) = set {
                    params.push(("set", set.as_str()));
                }
            }
            SessionState::Continuation(token) => params.push(("resumptionToken", token.as_str())),
            SessionState::Done | SessionState::Aborted(_) => return None,
        }
        Some(params)
    }

    /// Run one pagination sequence until DONE or ABORTED.
    fn run_sequence(&mut self) -> Result<()> {
        loop {
            let url = match self.request_params() {
                Some(params) => build_url(self.client.endpoint(), &params)?,
                None => return Ok(()),
            };

            match fetch(self.client.http(), &url)? {
                FetchOutcome::ServerError(status) => {
                    tracing::warn!(status = %status, url = %url, "Server error, retrying");
                    thread::sleep(self.config.retry_delay);
                }
                FetchOutcome::ConnectionFailure(e) => {
                    self.connection_failures += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = self.connection_failures,
                        max = self.config.max_connection_failures,
                        "Connection failed"
                    );
                    if self.connection_failures >= self.config.max_connection_failures {
                        self.state = SessionState::Aborted(AbortReason::ConnectionFailures(
                            self.connection_failures,
                        ));
                    } else {
                        thread::sleep(self.config.retry_delay);
                    }
                }
                FetchOutcome::ClientError(status) => {
                    tracing::warn!(status = %status, url = %url, "Client error, stopping");
                    self.state = SessionState::Aborted(AbortReason::ClientError(status.as_u16()));
                }
                FetchOutcome::Body(bytes) => {
                    let text = bytes_to_string(&bytes, "ListRecords page");
                    self.state = self.process_page(&text);
                    self.report_progress();

                    if self.unregistered {
                        return Err(HarvesterError::NoUrlStrategy {
                            institution: self.descriptor.id.clone(),
                            candidates: std::mem::take(&mut self.candidates),
                        });
                    }
                }
            }
        }
    }

    /// Process one page body and return the next state.
    fn process_page(&mut self, text: &str) -> SessionState {
        let doc = match Document::parse(text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Page is not well-formed XML");
                return SessionState::Aborted(AbortReason::UnparseableResponse(e.to_string()));
            }
        };
        self.pages += 1;

        if let Some((code, message)) = oai::oai_error(&doc) {
            if code != "noRecordsMatch" {
                tracing::warn!(code = %code, message = %message, "OAI error response");
            }
        }

        let mut on_page = 0;
        for record in oai::page_records(&doc) {
            on_page += 1;
            self.process_record(record);
        }

        let token = oai::resumption_token(&doc);
        tracing::info!(
            page = self.pages,
            records_on_page = on_page,
            total = self.records.len(),
            skipped = self.tally.total(),
            has_more = token.is_some(),
            "Processed page"
        );

        match token {
            Some(token) => SessionState::Continuation(token),
            None => SessionState::Done,
        }
    }

    /// Route one raw record to exactly one output record or one skip.
    fn process_record(&mut self, record: Node<'_, '_>) {
        let Some(header) = find_child(record, "header") else {
            self.tally.record(SkipReason::MissingHeaderOrMetadata, None);
            return;
        };
        let identifier = find_child(header, "identifier").map(get_text);
        let identifier = identifier.as_deref().filter(|id| !id.is_empty());

        let header_fields = flatten(header);
        if let Some(reason) = self.mapper.screen(oai::is_deleted(header), &header_fields) {
            tracing::debug!(id = ?identifier, reason = %reason, "Skipping record");
            self.tally.record(reason, identifier);
            return;
        }

        let Some(metadata) = oai::metadata_root(record) else {
            self.tally
                .record(SkipReason::MissingHeaderOrMetadata, identifier);
            return;
        };

        let parsed = ParsedRecord {
            header: header_fields,
            metadata: flatten(metadata),
        };

        if !self.mapper.has_profile(&parsed) {
            if !self.unregistered {
                tracing::warn!(
                    institution = %self.descriptor.id,
                    "No URL mapping for institution, scanning for URL fields"
                );
            }
            self.unregistered = true;
            merge_candidates(&mut self.candidates, search_for_urls(&parsed.metadata));
            self.tally.record(SkipReason::NoDerivableUrl, identifier);
            return;
        }

        match self.mapper.map(parsed) {
            Ok(output) => self.records.push(output),
            Err(failure) => {
                tracing::debug!(id = ?identifier, reason = %failure, "Skipping record");
                self.tally.record(failure.skip_reason(), identifier);
            }
        }
    }

    fn report_progress(&mut self) {
        let progress = Progress {
            records: self.records.len(),
            skipped: self.tally.total(),
        };
        if let Some(callback) = self.progress.as_mut() {
            callback(progress);
        }
    }
}
