use crate::error::TrackerError;
use crate::prelude::*;
use crate::request_client::REQUEST_CLIENT;
use reqwest::header::ACCEPT;
use std::time::Duration;
use url::Url;

mod image_ref;
mod wait;

pub use image_ref::ImageRef;
pub use wait::{WaitSettings, wait_for_images};

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

/// Client of the image registry that caches the runner's container images.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    timeout: Duration,
}

impl RegistryClient {
    /// `base_url` may omit the scheme (`localhost:5000`), plain HTTP is assumed then.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim();
        let with_scheme = if base_url.contains("://") {
            base_url.to_owned()
        } else {
            format!("http://{base_url}")
        };

        let mut url = Url::parse(&with_scheme)
            .with_context(|| format!("Invalid registry URL '{base_url}'"))?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "Unsupported registry URL scheme '{}'",
            url.scheme()
        );
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TrackerError> {
        self.base_url
            .join(path)
            .map_err(|err| self.unreachable(err.to_string()))
    }

    fn unreachable(&self, reason: impl Into<String>) -> TrackerError {
        TrackerError::RegistryUnreachable {
            url: self.base_url.to_string(),
            reason: reason.into(),
        }
    }

    /// Single liveness probe of the registry API root. Only a 2xx answer counts as alive.
    pub async fn check_alive(&self) -> Result<(), TrackerError> {
        let url = self.endpoint("v2/")?;
        debug!("Checking registry liveness at {url}");

        let response = REQUEST_CLIENT
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| self.unreachable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.unreachable(format!("API root answered with {status}")))
        }
    }

    /// Whether the registry holds a manifest for `image`.
    ///
    /// A non-2xx answer means the image is not cached yet. Failing to reach the registry at all
    /// is [`TrackerError::RegistryUnreachable`].
    pub async fn has_image(&self, image: &ImageRef) -> Result<bool, TrackerError> {
        let url = self.endpoint(&image.manifest_path())?;

        let response = REQUEST_CLIENT
            .head(url)
            .header(ACCEPT, MANIFEST_MEDIA_TYPES)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| self.unreachable(err.to_string()))?;

        trace!("{image}: {}", response.status());
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! A throwaway HTTP server answering every request with a status picked by a callback.

    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::thread;

    pub type Responder = Arc<dyn Fn(&str) -> u16 + Send + Sync>;

    fn read_request_line(stream: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut buffer = [0; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match stream.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buffer[..n]),
            }
        }
        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Start the server and return its base URL.
    pub fn serve(responder: Responder) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let request_line = read_request_line(&mut stream);
                let status = responder(&request_line);
                let response = format!(
                    "HTTP/1.1 {status} STUB\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        format!("http://{address}")
    }

    /// A base URL nothing listens on.
    pub fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{address}")
    }
}
