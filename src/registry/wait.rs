use super::{ImageRef, RegistryClient};
use crate::error::TrackerError;
use crate::prelude::*;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub poll_interval: Duration,
    /// Ceiling on the whole wait, after which the caller proceeds anyway
    pub max_wait: Duration,
}

/// Poll the registry until every image is cached or `settings.max_wait` has elapsed.
///
/// Returns [`TrackerError::Timeout`] listing the images still missing at the deadline, or
/// [`TrackerError::RegistryUnreachable`] as soon as the registry cannot be reached.
pub async fn wait_for_images(
    client: &RegistryClient,
    images: &[ImageRef],
    settings: &WaitSettings,
) -> Result<(), TrackerError> {
    let start = Instant::now();
    let mut pending: Vec<&ImageRef> = images.iter().collect();

    loop {
        let mut still_pending = Vec::with_capacity(pending.len());
        for image in pending {
            if client.has_image(image).await? {
                debug!("{image} is cached");
            } else {
                still_pending.push(image);
            }
        }
        pending = still_pending;

        if pending.is_empty() {
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= settings.max_wait {
            return Err(TrackerError::Timeout {
                waited: elapsed,
                pending: pending.iter().map(|image| image.to_string()).collect(),
            });
        }

        info!(
            "{}/{} images not cached yet, checking again in {}",
            pending.len(),
            images.len(),
            humantime::format_duration(settings.poll_interval)
        );
        sleep(settings.poll_interval.min(settings.max_wait - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::stub;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn images(names: &[&str]) -> Vec<ImageRef> {
        names.iter().map(|name| name.parse().unwrap()).collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_wait_returns_when_all_cached() {
        let base_url = stub::serve(Arc::new(|_: &str| 200));
        let client = RegistryClient::new(&base_url, TIMEOUT).unwrap();
        let settings = WaitSettings {
            poll_interval: Duration::from_secs(60),
            max_wait: Duration::from_secs(60),
        };

        wait_for_images(&client, &images(&["swebench/a", "swebench/b:v1"]), &settings)
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_wait_polls_until_cached() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        // The image shows up on the third poll
        let base_url = stub::serve(Arc::new(move |_: &str| {
            if counter.fetch_add(1, Ordering::SeqCst) >= 2 { 200 } else { 404 }
        }));
        let client = RegistryClient::new(&base_url, TIMEOUT).unwrap();
        let settings = WaitSettings {
            poll_interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(30),
        };

        wait_for_images(&client, &images(&["swebench/a"]), &settings)
            .await
            .unwrap();

        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_wait_times_out_with_pending_images() {
        let base_url = stub::serve(Arc::new(|request_line: &str| {
            if request_line.contains("/swebench/a/") { 200 } else { 404 }
        }));
        let client = RegistryClient::new(&base_url, TIMEOUT).unwrap();
        let settings = WaitSettings {
            poll_interval: Duration::from_millis(50),
            max_wait: Duration::from_millis(200),
        };

        let err = wait_for_images(&client, &images(&["swebench/a", "swebench/b"]), &settings)
            .await
            .unwrap_err();

        match err {
            TrackerError::Timeout { waited, pending } => {
                assert!(waited >= settings.max_wait);
                assert_eq!(pending, vec!["swebench/b:latest".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_wait_stops_on_unreachable_registry() {
        let client = RegistryClient::new(&stub::closed_port(), TIMEOUT).unwrap();
        let settings = WaitSettings {
            poll_interval: Duration::from_secs(60),
            max_wait: Duration::from_secs(600),
        };

        let started = Instant::now();
        let err = wait_for_images(&client, &images(&["swebench/a"]), &settings)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackerError::RegistryUnreachable { .. }));
        assert!(started.elapsed() < settings.poll_interval);
    }
}
