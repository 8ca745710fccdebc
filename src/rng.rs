//! Seeded random stream for trait selection.
//!
//! The stream is a xorshift64 generator whose state is a plain `Copy` value.
//! [`RngState::next`] is a pure step function; [`SeededRng`] is a per-call
//! cursor over that state which also counts how many values were drawn.
//! Nothing in this module is global, so any number of generations can run
//! side by side without influencing each other.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// xorshift cannot leave the all-zero state, so it is swapped for this.
const ZERO_STATE_REPLACEMENT: u64 = 0x1234_5678_9ABC_DEF0;

/// The sole source of entropy for one generation.
///
/// Deserializes from any JSON number or string. Non-negative integers
/// (including `7.0`) become [`Seed::Number`]. Strings go through
/// [`Seed::parse`], so `"1234"` and `1234` are the same seed. Every other
/// number is kept as its decimal text: `523.77` and `"523.77"` are one seed,
/// as are `-5` and `"-5"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "SeedRepr")]
pub enum Seed {
    Number(u64),
    Text(String),
}

impl Seed {
    /// Parse a seed from command-line or query text.
    ///
    /// Decimal integers become [`Seed::Number`]; anything else is kept as text.
    ///
    /// ```
    /// use spriteforge::rng::Seed;
    ///
    /// assert_eq!(Seed::parse("1234"), Seed::Number(1234));
    /// assert_eq!(Seed::parse("ember"), Seed::Text("ember".to_string()));
    /// ```
    pub fn parse(s: &str) -> Seed {
        let trimmed = s.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => Seed::Number(n),
            Err(_) => Seed::Text(trimmed.to_string()),
        }
    }

    /// Derive the initial generator state for this seed.
    pub fn state(&self) -> RngState {
        match self {
            Seed::Number(n) => RngState::from_raw(splitmix64(*n)),
            Seed::Text(text) => {
                let digest = Sha256::digest(text.as_bytes());
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&digest[..8]);
                RngState::from_raw(u64::from_le_bytes(bytes))
            }
        }
    }

    /// Short file-name friendly form (`1234`, `ember-42`).
    pub fn slug(&self) -> String {
        match self {
            Seed::Number(n) => n.to_string(),
            Seed::Text(text) => text
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect(),
        }
    }
}

/// Wire shapes accepted for a seed before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeedRepr {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

/// 2^64, the first float past `u64::MAX`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

impl From<SeedRepr> for Seed {
    fn from(repr: SeedRepr) -> Self {
        match repr {
            SeedRepr::Unsigned(n) => Seed::Number(n),
            SeedRepr::Signed(n) => Seed::parse(&n.to_string()),
            SeedRepr::Float(v) if v.fract() == 0.0 && (0.0..U64_LIMIT).contains(&v) => {
                Seed::Number(v as u64)
            }
            SeedRepr::Float(v) => Seed::Text(v.to_string()),
            SeedRepr::Text(text) => Seed::parse(&text),
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Number(n) => write!(f, "{}", n),
            Seed::Text(text) => write!(f, "\"{}\"", text),
        }
    }
}

impl From<u64> for Seed {
    fn from(n: u64) -> Self {
        Seed::Number(n)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

/// Spread nearby integer seeds (0, 1, 2, ...) across the state space.
fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator state. Stepping it never mutates anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RngState(u64);

impl RngState {
    /// Wrap a raw state value, replacing zero.
    pub fn from_raw(raw: u64) -> Self {
        Self(if raw == 0 { ZERO_STATE_REPLACEMENT } else { raw })
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Advance one step, returning a value in `[0, 1)` and the next state.
    pub fn next(self) -> (f64, RngState) {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        let value = (x >> 11) as f64 / (1u64 << 53) as f64;
        (value, RngState(x))
    }
}

/// Result of a weighted or uniform pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick<'a, T> {
    pub item: &'a T,
    pub index: usize,
    /// The raw value in `[0, 1)` that decided the pick.
    pub draw: f64,
}

/// Cursor over an [`RngState`] owned by a single generation call.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: RngState,
    draws: usize,
}

impl SeededRng {
    pub fn new(seed: &Seed) -> Self {
        Self::from_state(seed.state())
    }

    pub fn from_state(state: RngState) -> Self {
        Self { state, draws: 0 }
    }

    /// Current state; feeding it back into [`SeededRng::from_state`] resumes the stream.
    pub fn state(&self) -> RngState {
        self.state
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn next_f64(&mut self) -> f64 {
        let (value, next) = self.state.next();
        self.state = next;
        self.draws += 1;
        value
    }

    /// Pick one element with equal probability.
    ///
    /// # Panics
    ///
    /// Panics if `items` is empty; callers must filter before picking.
    pub fn pick_uniform<'a, T>(&mut self, items: &'a [T]) -> Pick<'a, T> {
        assert!(!items.is_empty(), "pick_uniform called with no candidates");
        let draw = self.next_f64();
        let index = ((draw * items.len() as f64) as usize).min(items.len() - 1);
        Pick { item: &items[index], index, draw }
    }

    /// Pick one element with probability proportional to its weight.
    ///
    /// Zero-weight elements are never chosen.
    ///
    /// # Panics
    ///
    /// Panics if `items` is empty, if the slices differ in length, or if every
    /// weight is zero.
    pub fn pick_weighted<'a, T>(&mut self, items: &'a [T], weights: &[u32]) -> Pick<'a, T> {
        assert!(!items.is_empty(), "pick_weighted called with no candidates");
        assert_eq!(items.len(), weights.len(), "one weight per candidate");
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        assert!(total > 0, "pick_weighted called with zero total weight");

        let draw = self.next_f64();
        let target = draw * total as f64;
        let mut cumulative = 0u64;
        let mut last_eligible = 0;
        for (index, &weight) in weights.iter().enumerate() {
            if weight == 0 {
                continue;
            }
            cumulative += weight as u64;
            last_eligible = index;
            if target < cumulative as f64 {
                return Pick { item: &items[index], index, draw };
            }
        }
        // Float rounding at the very top of the range lands here.
        Pick { item: &items[last_eligible], index: last_eligible, draw }
    }
}
