//! Where the live HTML document comes from
//!
//! Production runs use [`HttpSource`]: one blocking GET, no retry. Tests and
//! offline runs read a saved page through [`FileSource`].

use crate::error::FetchError;
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;

const USER_AGENT: &str = concat!("outbreak-viz/", env!("CARGO_PKG_VERSION"));

/// Default page holding the cumulative worldwide figures
pub const DEFAULT_URL: &str =
    "https://en.wikipedia.org/wiki/COVID-19_pandemic_by_country_and_territory";

/// Something that can hand back the live page as HTML text.
pub trait LiveSource {
    fn fetch_document(&self) -> Result<String, FetchError>;

    /// Human-readable origin (URL or file path), used for logging and as
    /// the default citation of the live record.
    fn describe(&self) -> String;
}

impl<S: LiveSource + ?Sized> LiveSource for &S {
    fn fetch_document(&self) -> Result<String, FetchError> {
        (**self).fetch_document()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: LiveSource + ?Sized> LiveSource for Box<S> {
    fn fetch_document(&self) -> Result<String, FetchError> {
        (**self).fetch_document()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Single blocking HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn http_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Http {
            url: self.url.clone(),
            source,
        }
    }
}

impl LiveSource for HttpSource {
    fn fetch_document(&self) -> Result<String, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| self.http_error(e))?;

        info!("Fetching {}", self.url);
        let response = client.get(&self.url).send().map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| self.http_error(e))?;
        debug!("Received {} bytes from {}", body.len(), self.url);
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A saved copy of the live page.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LiveSource for FileSource {
    fn fetch_document(&self) -> Result<String, FetchError> {
        info!("Reading live page from {}", self.path.display());
        std::fs::read_to_string(&self.path).map_err(|source| FetchError::Fixture {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_reads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<table class=\"wikitable\"></table>").unwrap();

        let source = FileSource::new(file.path());
        assert!(source.fetch_document().unwrap().contains("wikitable"));
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_file_source_missing() {
        let source = FileSource::new("/no/such/page.html");
        assert!(matches!(source.fetch_document(), Err(FetchError::Fixture { .. })));
    }

    #[test]
    fn test_http_source_builder() {
        let source = HttpSource::new(DEFAULT_URL).with_timeout(Duration::from_secs(5));
        assert_eq!(source.timeout, Duration::from_secs(5));
        assert_eq!(source.describe(), DEFAULT_URL);
    }

    /// Serve one canned response on a local port and return its URL.
    fn one_shot_server(response: &'static str) -> String {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_http_source_reads_body() {
        let url = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 12\r\nConnection: close\r\n\r\n<p>live</p>\n",
        );
        let source = HttpSource::new(url).with_timeout(Duration::from_secs(5));

        assert_eq!(source.fetch_document().unwrap(), "<p>live</p>\n");
    }

    #[test]
    fn test_http_source_error_status() {
        let url = one_shot_server(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let source = HttpSource::new(url.clone()).with_timeout(Duration::from_secs(5));

        match source.fetch_document() {
            Err(FetchError::Status { url: failed, status }) => {
                assert_eq!(status, 500);
                assert_eq!(failed, url);
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_source_refused_is_fetch_error() {
        // Bind then drop so the port is known to be closed
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let source = HttpSource::new(format!("http://{}/", addr)).with_timeout(Duration::from_secs(2));

        assert!(matches!(source.fetch_document(), Err(FetchError::Http { .. })));
    }

    #[test]
    fn test_reference_forwards() {
        let source = FileSource::new("/x");
        let by_ref: &dyn LiveSource = &source;
        assert_eq!((&by_ref).describe(), "/x");
    }

    #[test]
    fn test_boxed_source_forwards() {
        let boxed: Box<dyn LiveSource> = Box::new(FileSource::new("/y"));
        assert_eq!(boxed.describe(), "/y");
        assert!(matches!(boxed.fetch_document(), Err(FetchError::Fixture { .. })));
    }
}
