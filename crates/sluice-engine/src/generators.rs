//! Injectable sources of time and identity.
//!
//! The engine never reads the wall clock or a global random source directly,
//! so sessions are reproducible when these are swapped for fixed ones.

use std::sync::Mutex;
use std::sync::PoisonError;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
  now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      now: Mutex::new(now),
    }
  }

  pub fn set(&self, now: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now += by;
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Source of new UUIDs.
pub trait UuidGenerator: Send + Sync {
  fn next(&self) -> Uuid;

  fn next_string(&self) -> String {
    self.next().to_string()
  }
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct V4Generator;

impl UuidGenerator for V4Generator {
  fn next(&self) -> Uuid {
    Uuid::new_v4()
  }
}

/// v4-shaped UUIDs from a seeded generator. The same seed always yields the
/// same sequence.
#[derive(Debug)]
pub struct SeededGenerator {
  rng: Mutex<StdRng>,
}

impl SeededGenerator {
  pub fn new(seed: u64) -> Self {
    Self {
      rng: Mutex::new(StdRng::seed_from_u64(seed)),
    }
  }
}

impl UuidGenerator for SeededGenerator {
  fn next(&self) -> Uuid {
    let mut bytes = [0u8; 16];
    self
      .rng
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_seeded_generator_is_repeatable() {
    let a = SeededGenerator::new(123);
    let b = SeededGenerator::new(123);

    let first: Vec<Uuid> = (0..3).map(|_| a.next()).collect();
    let second: Vec<Uuid> = (0..3).map(|_| b.next()).collect();
    assert_eq!(first, second);
    assert_ne!(first[0], first[1]);
    assert_eq!(first[0].get_version_num(), 4);
  }

  #[test]
  fn test_fixed_clock() {
    let start = DateTime::parse_from_rfc3339("2018-10-18T14:20:30Z")
      .unwrap()
      .with_timezone(&Utc);
    let clock = FixedClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::seconds(5));
    assert_eq!(clock.now(), start + Duration::seconds(5));
  }
}
