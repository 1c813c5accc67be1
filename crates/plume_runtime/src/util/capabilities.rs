//! System capability traits for dependency injection.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock {
    fn unix_millis(&self) -> i64;
    fn mono_micros(&self) -> i64;
    fn sleep_millis(&self, ms: u64);
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn unix_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn mono_micros(&self) -> i64 {
        self.start.elapsed().as_micros() as i64
    }

    fn sleep_millis(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

pub trait FileSystem {
    fn exists(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn canonicalize(&self, path: &str) -> Result<String, String>;
    fn read_to_string(&self, path: &str) -> Result<String, String>;
}

pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &str) -> bool {
        std::fs::metadata(path).is_ok()
    }

    fn is_dir(&self, path: &str) -> bool {
        std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    fn canonicalize(&self, path: &str) -> Result<String, String> {
        let canonical = std::fs::canonicalize(path).map_err(|e| e.to_string())?;
        Ok(canonical.to_string_lossy().to_string())
    }

    fn read_to_string(&self, path: &str) -> Result<String, String> {
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    }
}

pub trait RngAlgorithm {
    fn next_u64(&self, state: &mut u64) -> u64;
}

pub struct Lcg64;

impl RngAlgorithm for Lcg64 {
    fn next_u64(&self, state: &mut u64) -> u64 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        *state
    }
}

pub struct Capabilities {
    pub clock: Box<dyn Clock>,
    pub fs: Box<dyn FileSystem>,
    pub rng: Box<dyn RngAlgorithm>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock::new()),
            fs: Box::new(StdFileSystem),
            rng: Box::new(Lcg64),
        }
    }
}
