use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, thread, time::Duration};
use tracing::{debug, info};

use crate::{config::ScraperConfig, error::FetchError};

/// Anything that can turn a URL into page markup.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP source with a shared rate limit and retry with backoff.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    max_attempts: u32,
    initial_delay: Duration,
}

impl HttpSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()?;

        let rps = config.rate_limits.requests_per_second;
        let quota = Quota::per_second(NonZeroU32::new(rps).ok_or(FetchError::InvalidRateLimit(rps))?);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            max_attempts: config.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.retry.initial_delay_ms),
        })
    }

    fn wait_for_permit(&self) {
        while self.rate_limiter.check().is_err() {
            thread::sleep(Duration::from_millis(100));
        }
    }

    fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        self.wait_for_permit();
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text()?;
        if html.trim().is_empty() {
            return Err(FetchError::EmptyBody { url: url.to_string() });
        }
        debug!("Downloaded {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.max_attempts, self.initial_delay, || self.fetch_once(url))
    }
}

/// Runs `operation` up to `max_attempts` times, doubling the delay after each
/// failure. The last error is returned.
pub fn retry_with_backoff<F, T, E>(max_attempts: u32, initial_delay: Duration, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts {
                    return Err(e);
                }
                info!("Retry attempt {} after error: {}", attempt, e);
                thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn test_config(base_url: &str) -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.scraping.base_url = base_url.to_string();
        config.rate_limits.requests_per_second = 50;
        config.retry.initial_delay_ms = 1;
        config
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry_with_backoff(3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err("boom".to_string())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry_with_backoff(2, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        });
        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let mut config = test_config("http://localhost");
        config.rate_limits.requests_per_second = 0;
        assert!(matches!(HttpSource::new(&config), Err(FetchError::InvalidRateLimit(0))));
    }

    #[test]
    fn test_http_source_fetches_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/x/index/spielbericht/4001")
            .with_status(200)
            .with_body("<html>report</html>")
            .create();

        let config = test_config(&server.url());
        let source = HttpSource::new(&config).unwrap();
        let body = source
            .fetch(&format!("{}/x/index/spielbericht/4001", server.url()))
            .unwrap();
        assert_eq!(body, "<html>report</html>");
        mock.assert();
    }

    #[test]
    fn test_http_source_retries_on_error_status() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/missing")
            .with_status(503)
            .expect(2)
            .create();

        let config = test_config(&server.url());
        let source = HttpSource::new(&config).unwrap();
        let err = source.fetch(&format!("{}/missing", server.url())).unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
        mock.assert();
    }

    #[test]
    fn test_http_source_rejects_empty_body() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/empty").with_status(200).with_body("  ").create();

        let config = test_config(&server.url());
        let source = HttpSource::new(&config).unwrap();
        let err = source.fetch(&format!("{}/empty", server.url())).unwrap_err();
        assert!(matches!(err, FetchError::EmptyBody { .. }));
    }
}
