//! Outgoing request construction.
//!
//! # Wire contract
//! - `X-Ratelimit-Precision: millisecond` on every request
//! - `Authorization: Bot <token>` for bot accounts, raw token otherwise
//! - `Content-Type: application/json` whenever a bare JSON body is sent
//! - `X-Audit-Log-Reason` percent-encoded, space and `/` left as-is

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE,
    USER_AGENT,
};
use reqwest::Method;
use serde_json::Value;

pub const RATELIMIT_PRECISION: &str = "x-ratelimit-precision";
pub const AUDIT_LOG_REASON: &str = "x-audit-log-reason";

/// Characters left unescaped in audit log reasons.
const AUDIT_REASON_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/')
    .remove(b' ');

/// Percent-encode an audit log reason.
pub fn escape_audit_reason(reason: &str) -> String {
    utf8_percent_encode(reason, AUDIT_REASON_SET).to_string()
}

/// Account credentials sent with every request.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
    bot: bool,
}

impl Credentials {
    pub fn new(token: Option<String>, bot: bool) -> Self {
        Self { token, bot }
    }

    /// Value of the `Authorization` header, if a token is configured.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| {
            if self.bot {
                format!("Bot {}", token)
            } else {
                token.clone()
            }
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("bot", &self.bot)
            .finish()
    }
}

/// Build the header set shared by every attempt of one call.
pub fn build_headers(
    user_agent: &str,
    credentials: &Credentials,
    json_body: bool,
    reason: Option<&str>,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    headers.insert(
        HeaderName::from_static(RATELIMIT_PRECISION),
        HeaderValue::from_static("millisecond"),
    );

    if let Some(auth) = credentials.authorization() {
        let mut value = HeaderValue::from_str(&auth)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    if json_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        headers.insert(
            HeaderName::from_static(AUDIT_LOG_REASON),
            HeaderValue::from_str(&escape_audit_reason(reason))?,
        );
    }

    Ok(headers)
}

trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A file attached to a request.
///
/// The read cursor is rewound to where it stood at construction before
/// every attempt, so a partially consumed upload can be re-sent.
pub struct FilePayload {
    filename: String,
    reader: Box<dyn ReadSeek>,
    origin: u64,
}

impl FilePayload {
    /// Wrap a seekable reader, remembering its current position.
    pub fn new<R>(filename: impl Into<String>, mut reader: R) -> io::Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        let origin = reader.stream_position()?;
        Ok(Self {
            filename: filename.into(),
            reader: Box::new(reader),
            origin,
        })
    }

    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            reader: Box::new(Cursor::new(data)),
            origin: 0,
        }
    }

    /// Open a file from disk, named after its file name.
    pub fn open(path: &Path) -> io::Result<Self> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self::new(filename, File::open(path)?)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Rewind the cursor to its original position.
    pub fn reset(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(self.origin))?;
        Ok(())
    }

    /// Read the remaining content into a multipart part.
    pub fn read_part(&mut self) -> io::Result<FilePart> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(FilePart {
            filename: self.filename.clone(),
            data,
        })
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePayload")
            .field("filename", &self.filename)
            .field("origin", &self.origin)
            .finish()
    }
}

/// File content as handed to the transport for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Request body for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(String),
    /// `payload_json` plus files named `file` (single) or `file{i}`.
    Multipart {
        payload_json: Option<String>,
        files: Vec<FilePart>,
    },
}

/// One fully built HTTP request.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Per-call options supplied by the caller.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub json: Option<Value>,
    pub reason: Option<String>,
    pub files: Vec<FilePayload>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn file(mut self, file: FilePayload) -> Self {
        self.files.push(file);
        self
    }
}
