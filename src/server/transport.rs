//! HTTP transport used by the session client
//!
//! The [`Transport`] trait is the seam between session logic and the wire.
//! [`HttpTransport`] talks to a real server through `reqwest` with a cookie
//! store; tests substitute a scripted implementation.

use async_trait::async_trait;
use reqwest::multipart;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FossDriverError, SessionError};

/// A response body together with its HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    /// A `200 OK` page with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    /// A file streamed from disk each time the request is sent
    File {
        name: String,
        file_name: String,
        mime: String,
        path: PathBuf,
        length: u64,
    },
}

/// A multipart form whose parts are sent in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field, with a mime type guessed from its name
    ///
    /// Only the file's metadata is read here; the contents are streamed when
    /// the request is sent.
    pub fn file(mut self, name: impl Into<String>, path: &Path) -> Result<Self, FossDriverError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| FossDriverError::io(path.display().to_string(), e))?;
        if !metadata.is_file() {
            return Err(FossDriverError::io(
                path.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.parts.push(FormPart::File {
            name: name.into(),
            mime: guess_mime(&file_name).to_string(),
            file_name,
            path: path.to_path_buf(),
            length: metadata.len(),
        });
        Ok(self)
    }

    /// Value of the first text field called `name`
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Mime type for the archive and SPDX files FOSSology accepts
pub fn guess_mime(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    const TABLE: [(&str, &str); 12] = [
        (".tar.gz", "application/x-gzip"),
        (".tgz", "application/x-gzip"),
        (".gz", "application/x-gzip"),
        (".tar.bz2", "application/x-bzip2"),
        (".bz2", "application/x-bzip2"),
        (".tar.xz", "application/x-xz"),
        (".xz", "application/x-xz"),
        (".tar", "application/x-tar"),
        (".zip", "application/zip"),
        (".rdf", "application/rdf+xml"),
        (".xml", "application/xml"),
        (".spdx", "text/plain"),
    ];
    TABLE
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}

/// A request the session may need to replay after re-authenticating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get { url: String },
    Form { url: String, fields: Vec<(String, String)> },
    Multipart { url: String, form: MultipartForm },
}

impl Request {
    pub fn url(&self) -> &str {
        match self {
            Request::Get { url } | Request::Form { url, .. } | Request::Multipart { url, .. } => {
                url
            }
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Request::Get { .. } => "GET",
            Request::Form { .. } | Request::Multipart { .. } => "POST",
        }
    }
}

/// Raw HTTP capability consumed by [`FossServer`](super::FossServer)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the response page
    async fn send(&self, request: &Request) -> Result<Page, SessionError>;
}

/// `reqwest`-backed transport holding the session cookies
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a client with a cookie store and the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("fossdriver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SessionError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Build the wire form, opening every file part afresh
    ///
    /// Replaying a request after re-login therefore streams the file again
    /// from the start.
    async fn build_multipart(
        url: &str,
        form: &MultipartForm,
    ) -> Result<multipart::Form, SessionError> {
        let mut out = multipart::Form::new();
        for part in &form.parts {
            out = match part {
                FormPart::Text { name, value } => out.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    path,
                    length,
                } => {
                    let file = tokio::fs::File::open(path).await.map_err(|source| {
                        SessionError::Attachment {
                            path: path.display().to_string(),
                            source,
                        }
                    })?;
                    let file = multipart::Part::stream_with_length(reqwest::Body::from(file), *length)
                        .file_name(file_name.clone())
                        .mime_str(mime)
                        .map_err(|source| SessionError::Http {
                            url: url.to_string(),
                            source,
                        })?;
                    out.part(name.clone(), file)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Page, SessionError> {
        let url = request.url().to_string();
        let http_err = |source: reqwest::Error| SessionError::Http {
            url: url.clone(),
            source,
        };

        let builder = match request {
            Request::Get { url } => self.client.get(url),
            Request::Form { url, fields } => self.client.post(url).form(fields),
            Request::Multipart { url, form } => self
                .client
                .post(url)
                .header("Referer", url.as_str())
                .header("Cache-Control", "no-cache")
                .multipart(Self::build_multipart(url, form).await?),
        };

        let response = builder.send().await.map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(http_err)?;
        Ok(Page { status, body })
    }
}
