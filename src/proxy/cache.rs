//! Domain purpose cache with a single shared expiry per generation
//!
//! A generation is created by the first successful lookup after a cold start
//! or after the previous generation expired. Later lookups are added to the
//! same mapping without moving its expiry, so the whole mapping is dropped at
//! once when the TTL runs out. There is no per-key eviction.
//!
//! ## Concurrency
//!
//! The lock only provides memory safety. A resolver reads the cache, awaits
//! a lookup and then writes, and nothing holds the lock across that await.
//! Two requests that miss at the same time both perform a lookup and both
//! write; the later write wins. This costs at most a redundant lookup. A
//! stale entry corrects itself within one TTL.

use crate::domain::{DomainName, DomainPurpose};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Source of the current time for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct CacheGeneration {
    mapping: HashMap<DomainName, DomainPurpose>,
    expires_at: Instant,
}

impl CacheGeneration {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// What a `put` did to the cache
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheWrite {
    /// No live generation existed; a new one was started
    StartedGeneration,
    /// The entry was added to the live generation
    Appended,
}

/// In-memory mapping from domain to purpose
#[derive(Debug)]
pub struct DomainPurposeCache {
    ttl: Duration,
    generation: RwLock<Option<CacheGeneration>>,
}

impl DomainPurposeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached purpose for `domain`, if the generation is still live at `now`
    pub fn get(&self, domain: &DomainName, now: Instant) -> Option<DomainPurpose> {
        let guard = self.generation.read();
        guard
            .as_ref()
            .filter(|generation| generation.is_live(now))
            .and_then(|generation| generation.mapping.get(domain).copied())
    }

    /// Record a purpose, starting a new generation if none is live at `now`
    pub fn put(&self, domain: DomainName, purpose: DomainPurpose, now: Instant) -> CacheWrite {
        let mut guard = self.generation.write();
        if let Some(generation) = guard.as_mut().filter(|generation| generation.is_live(now)) {
            generation.mapping.insert(domain, purpose);
            return CacheWrite::Appended;
        }

        *guard = Some(CacheGeneration {
            mapping: HashMap::from([(domain, purpose)]),
            expires_at: now + self.ttl,
        });
        CacheWrite::StartedGeneration
    }

    /// Discard the current generation
    pub fn expire(&self) {
        *self.generation.write() = None;
    }

    /// Expiry of the current generation, live or not
    pub fn expires_at(&self) -> Option<Instant> {
        self.generation
            .read()
            .as_ref()
            .map(|generation| generation.expires_at)
    }

    /// Number of domains in the current generation
    pub fn len(&self) -> usize {
        self.generation
            .read()
            .as_ref()
            .map_or(0, |generation| generation.mapping.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
