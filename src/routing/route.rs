//! API route descriptors.
//!
//! # Responsibilities
//! - Resolve `{name}` placeholders in a path template
//! - Derive the rate-limit bucket key shared by related routes
//!
//! # Design Decisions
//! - Bucket key = major parameters + unresolved template, so every
//!   channel/guild/webhook gets its own counter per endpoint
//! - Parameter values are percent-encoded with no safe characters

use std::collections::HashMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;

use crate::routing::RouteError;

/// Unreserved characters, the only ones left unescaped in parameters.
const PARAM_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Parameters that scope a rate-limit bucket.
const MAJOR_PARAMETERS: [&str; 3] = ["channel_id", "guild_id", "webhook_id"];

/// An API endpoint with its parameters resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    template: String,
    path: String,
    bucket: String,
}

impl Route {
    /// Resolve `template` against `params`.
    ///
    /// Every placeholder must have a matching parameter; extra parameters
    /// are ignored.
    pub fn new<I, K, V>(method: Method, template: &str, params: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let params: HashMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();

        let path = resolve(template, &params)?;

        let major: Vec<&str> = MAJOR_PARAMETERS
            .iter()
            .map(|name| params.get(*name).map(String::as_str).unwrap_or("-"))
            .collect();
        let bucket = format!("{}:{}", major.join(":"), template);

        Ok(Self {
            method,
            template: template.to_string(),
            path,
            bucket,
        })
    }

    /// A route without placeholders.
    pub fn fixed(method: Method, path: &str) -> Result<Self, RouteError> {
        Self::new(method, path, std::iter::empty::<(String, String)>())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolved path, relative to the API base.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

fn resolve(template: &str, params: &HashMap<String, String>) -> Result<String, RouteError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| RouteError::UnclosedPlaceholder(template.to_string()))?;
        let name = &after[..close];
        let value = params
            .get(name)
            .ok_or_else(|| RouteError::MissingParameter(name.to_string()))?;
        out.extend(utf8_percent_encode(value, PARAM_SET));
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
