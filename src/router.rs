//! Input source routing.
//!
//! Picks where dependency data comes from and which manifest parser reads
//! it, then hands back a [`PurlBatch`] ready for lookup.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use crate::assembler::{AuditConfig, InputSource};
use crate::error::AuditError;
use crate::manifest::{
    extract_purls, GoListParser, GoSumParser, GopkgLockParser, ManifestKind, ManifestParser,
    PurlBatch,
};

/// A readable input stream that knows whether a person is typing into it.
pub trait InputStream {
    fn is_terminal(&self) -> bool;

    fn read_all(&mut self) -> io::Result<String>;
}

/// The process's standard input.
pub struct StdinInput {
    stdin: io::Stdin,
}

impl StdinInput {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStream for StdinInput {
    fn is_terminal(&self) -> bool {
        self.stdin.is_terminal()
    }

    fn read_all(&mut self) -> io::Result<String> {
        let mut content = String::new();
        self.stdin.lock().read_to_string(&mut content)?;
        Ok(content)
    }
}

/// In-memory input, for feeding module lists from elsewhere.
pub struct BufferedInput {
    content: String,
    terminal: bool,
}

impl BufferedInput {
    pub fn piped(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            terminal: false,
        }
    }

    /// Behaves like an interactive terminal with nothing piped in.
    pub fn terminal() -> Self {
        Self {
            content: String::new(),
            terminal: true,
        }
    }
}

impl InputStream for BufferedInput {
    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn read_all(&mut self) -> io::Result<String> {
        Ok(std::mem::take(&mut self.content))
    }
}

/// Produces the purls to audit.
///
/// `Ok(None)` means there is nothing to audit: the named `go.sum` does not
/// exist.
pub fn route(
    config: &AuditConfig,
    input: &mut dyn InputStream,
) -> Result<Option<PurlBatch>, AuditError> {
    match &config.input {
        InputSource::Stdin => route_stdin(input).map(Some),
        InputSource::Path(path) => match ManifestKind::detect(path) {
            Some(ManifestKind::GopkgLock) => route_gopkg_lock(path).map(Some),
            Some(ManifestKind::GoSum) => route_go_sum(path),
            None => Err(AuditError::UnroutablePath(path.display().to_string())),
        },
    }
}

fn route_stdin(input: &mut dyn InputStream) -> Result<PurlBatch, AuditError> {
    if input.is_terminal() {
        tracing::error!("stdin is a terminal, nothing was piped in");
        return Err(AuditError::InvalidStdin);
    }
    tracing::info!("parsing module list from stdin");

    let stdin_path = PathBuf::from("<stdin>");
    let content = input.read_all().map_err(|source| AuditError::Io {
        path: stdin_path.clone(),
        source,
    })?;

    parse_manifest(&GoListParser, &content, &stdin_path)
}

fn route_gopkg_lock(path: &Path) -> Result<PurlBatch, AuditError> {
    tracing::info!(path = %path.display(), "parsing Gopkg.lock");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AuditError::MissingLock(path.to_path_buf()))
        }
        Err(e) => {
            return Err(AuditError::ManifestParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let records = GopkgLockParser
        .parse_lock(&content)
        .map_err(|e| AuditError::ManifestParse {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        })?
        .ok_or_else(|| AuditError::MissingLock(path.to_path_buf()))?;

    let batch = extract_purls(&records);
    tracing::debug!(valid = batch.valid.len(), invalid = batch.invalid.len(), "extracted purls");
    Ok(batch)
}

fn route_go_sum(path: &Path) -> Result<Option<PurlBatch>, AuditError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "go.sum does not exist, nothing to audit");
        return Ok(None);
    }
    tracing::info!(path = %path.display(), "parsing go.sum");

    let content = fs::read_to_string(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(&GoSumParser, &content, path).map(Some)
}

fn parse_manifest(
    parser: &dyn ManifestParser,
    content: &str,
    path: &Path,
) -> Result<PurlBatch, AuditError> {
    let records = parser
        .parse(content)
        .map_err(|e| AuditError::ManifestParse {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        })?;
    tracing::debug!(parser = parser.name(), records = records.len(), "parsed manifest");

    let batch = extract_purls(&records);
    tracing::debug!(valid = batch.valid.len(), invalid = batch.invalid.len(), "extracted purls");
    Ok(batch)
}
