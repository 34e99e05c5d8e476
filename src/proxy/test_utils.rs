//! Test utilities for proxy module testing
//!
//! Fakes for the lookup seam and the clock, plus helpers for building
//! configurations and requests against mock backends.

#[cfg(test)]
pub mod test_helpers {
    use crate::domain::{DomainName, DomainPurpose};
    use crate::proxy::cache::Clock;
    use crate::proxy::resolver::{LookupError, PurposeLookup};
    use crate::proxy::types::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use http::StatusCode;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tracing_subscriber::fmt::MakeWriter;

    pub const TEST_API_KEY: &str = "test-api-key";

    pub fn test_api_key() -> ApiKey {
        ApiKey::try_new(TEST_API_KEY).expect("test API key should be valid")
    }

    /// Edge configuration pointing every backend at `base_url`
    pub fn test_edge_config(base_url: &str) -> EdgeConfig {
        EdgeConfig {
            base_url: UpstreamBaseUrl::try_new(base_url).expect("test base URL should be valid"),
            api_key: test_api_key(),
            ..EdgeConfig::default()
        }
    }

    /// A local URL with nothing listening on it
    pub fn unreachable_base_url() -> String {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("should bind an ephemeral port");
        let port = listener
            .local_addr()
            .expect("listener should have an address")
            .port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    /// Build an inbound edge request for `host` and `path`
    pub fn edge_request(host: &str, path: &str) -> http::Request<Body> {
        http::Request::builder()
            .uri(path)
            .header(http::header::HOST, host)
            .body(Body::empty())
            .expect("test request should be valid")
    }

    /// Clock that only moves when told to
    pub struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        pub fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock()
        }
    }

    /// Lookup fake that counts calls and always gives the same answer
    pub struct CountingLookup {
        answer: Option<DomainPurpose>,
        calls: AtomicUsize,
    }

    impl CountingLookup {
        pub fn answering(purpose: DomainPurpose) -> Self {
            Self {
                answer: Some(purpose),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                answer: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PurposeLookup for CountingLookup {
        async fn lookup(&self, _domain: &DomainName) -> Result<DomainPurpose, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .ok_or(LookupError::Status(StatusCode::SERVICE_UNAVAILABLE))
        }
    }

    /// In-memory sink for formatted log output
    #[derive(Clone, Default)]
    pub struct LogBuffer {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl LogBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.bytes.lock()).into_owned()
        }

        /// Plain-text subscriber writing into this buffer
        pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
            tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
