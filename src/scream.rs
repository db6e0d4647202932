use rand::{seq::SliceRandom, Rng};
use std::fmt;

const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 100;
const MAX_EXCLAMATIONS: usize = 5;

const BODIES: [char; 2] = ['A', 'O'];
const WRAPPERS: [&str; 3] = ["*", "**", "***"];
const SUFFIXES: [&str; 3] = ["H", "RGH", "ER"];

/// Rolls a weighted coin that lands `true` `percent` percent of the time.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, percent: f64) -> bool {
    rng.gen_bool((percent / 100.0).clamp(0.0, 1.0))
}

/// Every random decision that goes into one scream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreamStyle {
    /// The plain run of capital A's.
    Vanilla { length: usize },
    Styled {
        length: usize,
        body: char,
        wrapper: Option<&'static str>,
        suffix: Option<&'static str>,
        exclamations: usize,
        lowercase: bool,
    },
}

impl ScreamStyle {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let length = rng.gen_range(MIN_LENGTH..=MAX_LENGTH);

        if chance(rng, 50.0) {
            return Self::Vanilla { length };
        }

        let body = *BODIES.choose(rng).unwrap_or(&'A');
        let wrapper = pick_or_none(rng, &WRAPPERS);
        let suffix = pick_or_none(rng, &SUFFIXES);
        let exclamations = if chance(rng, 50.0) {
            rng.gen_range(1..=MAX_EXCLAMATIONS)
        } else {
            0
        };
        // Half of all screams are vanilla, so 25% here is 12.5% overall.
        let lowercase = chance(rng, 25.0);

        Self::Styled {
            length,
            body,
            wrapper,
            suffix,
            exclamations,
            lowercase,
        }
    }

    pub fn length(&self) -> usize {
        match *self {
            Self::Vanilla { length } | Self::Styled { length, .. } => length,
        }
    }

    pub fn is_vanilla(&self) -> bool {
        matches!(self, Self::Vanilla { .. })
    }

    pub fn wrapper(&self) -> Option<&'static str> {
        match *self {
            Self::Vanilla { .. } => None,
            Self::Styled { wrapper, .. } => wrapper,
        }
    }

    pub fn is_lowercase(&self) -> bool {
        matches!(self, Self::Styled { lowercase: true, .. })
    }
}

fn pick_or_none<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> Option<&'static str> {
    if chance(rng, 50.0) {
        None
    } else {
        options.choose(rng).copied()
    }
}

impl fmt::Display for ScreamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (length, body, wrapper, suffix, exclamations, lowercase) = match *self {
            Self::Vanilla { length } => (length, 'A', None, None, 0, false),
            Self::Styled {
                length,
                body,
                wrapper,
                suffix,
                exclamations,
                lowercase,
            } => (length, body, wrapper, suffix, exclamations, lowercase),
        };

        let mut inner: String = std::iter::repeat(body).take(length).collect();
        if let Some(suffix) = suffix {
            inner.push_str(suffix);
        }
        inner.push_str(&"!".repeat(exclamations));
        if lowercase {
            inner = inner.to_lowercase();
        }

        let wrapper = wrapper.unwrap_or("");
        write!(f, "{wrapper}{inner}{wrapper}")
    }
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    ScreamStyle::roll(rng).to_string()
}

pub fn generate() -> String {
    generate_with(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::{mock::StepRng, StdRng};
    use rand::{RngCore, SeedableRng};
    use std::collections::VecDeque;

    const SAMPLES: usize = 100_000;

    #[test]
    fn chance_bounds() {
        let mut zeros = StepRng::new(0, 0);
        let mut ones = StepRng::new(u64::MAX, 0);

        assert!(chance(&mut zeros, 50.0));
        assert!(!chance(&mut ones, 50.0));
        assert!(!chance(&mut zeros, 0.0));
        assert!(chance(&mut ones, 100.0));
        assert!(chance(&mut ones, 250.0));
        assert!(!chance(&mut zeros, -3.0));
    }

    #[test]
    fn never_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let style = ScreamStyle::roll(&mut rng);
            assert!((MIN_LENGTH..=MAX_LENGTH).contains(&style.length()));
            assert!(!style.to_string().is_empty());
        }
    }

    #[test]
    fn single_character_scream() {
        assert_eq!(ScreamStyle::Vanilla { length: 1 }.to_string(), "A");
    }

    #[test]
    fn vanilla_is_only_capital_a() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = 0;
        for _ in 0..10_000 {
            let style = ScreamStyle::roll(&mut rng);
            if style.is_vanilla() {
                seen += 1;
                let text = style.to_string();
                assert_eq!(text.len(), style.length());
                assert!(text.chars().all(|c| c == 'A'), "{text}");
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn renders_wrapper_and_suffix() {
        let style = ScreamStyle::Styled {
            length: 4,
            body: 'A',
            wrapper: Some("**"),
            suffix: Some("RGH"),
            exclamations: 0,
            lowercase: false,
        };
        assert_eq!(style.to_string(), "**AAAARGH**");

        let style = ScreamStyle::Styled {
            length: 3,
            body: 'O',
            wrapper: Some("*"),
            suffix: Some("H"),
            exclamations: 2,
            lowercase: true,
        };
        assert_eq!(style.to_string(), "*oooh!!*");
    }

    #[test]
    fn wrapper_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..10_000 {
            let style = ScreamStyle::roll(&mut rng);
            let text = style.to_string();
            if let Some(wrapper) = style.wrapper() {
                assert!(text.starts_with(wrapper), "{text}");
                assert!(text.ends_with(wrapper), "{text}");
                let inner = &text[wrapper.len()..text.len() - wrapper.len()];
                assert!(!inner.starts_with('*') && !inner.ends_with('*'), "{text}");
            } else {
                assert!(!text.contains('*'), "{text}");
            }
        }
    }

    #[test]
    fn branch_frequencies() {
        let mut rng = StdRng::seed_from_u64(0x5C12EA3);
        let mut vanilla = 0;
        let mut lowercase = 0;
        let mut styled = 0;
        let mut wrapped = 0;
        let mut suffixed = 0;
        let mut o_bodies = 0;
        let mut shouted = 0;
        for _ in 0..SAMPLES {
            let style = ScreamStyle::roll(&mut rng);
            if style.is_lowercase() {
                lowercase += 1;
            }
            match style {
                ScreamStyle::Vanilla { .. } => vanilla += 1,
                ScreamStyle::Styled {
                    body,
                    wrapper,
                    suffix,
                    exclamations,
                    ..
                } => {
                    styled += 1;
                    wrapped += usize::from(wrapper.is_some());
                    suffixed += usize::from(suffix.is_some());
                    o_bodies += usize::from(body == 'O');
                    shouted += usize::from(exclamations > 0);
                }
            }
        }

        let fraction = |count: usize, of: usize| count as f64 / of as f64;
        let near = |value: f64, expected: f64| (value - expected).abs() < 0.02;

        let vanilla = fraction(vanilla, SAMPLES);
        let lowercase = fraction(lowercase, SAMPLES);
        assert!(near(vanilla, 0.5), "vanilla fraction {vanilla}");
        assert!(near(lowercase, 0.125), "lowercase fraction {lowercase}");

        let wrapped = fraction(wrapped, styled);
        let suffixed = fraction(suffixed, styled);
        let o_bodies = fraction(o_bodies, styled);
        let shouted = fraction(shouted, styled);
        assert!(near(wrapped, 0.5), "wrapped fraction {wrapped}");
        assert!(near(suffixed, 0.5), "suffixed fraction {suffixed}");
        assert!(near(o_bodies, 0.5), "O body fraction {o_bodies}");
        assert!(near(shouted, 0.5), "exclamation fraction {shouted}");
    }

    /// Hands out a fixed list of raw values, then panics.
    struct ScriptedRng(VecDeque<u64>);

    impl ScriptedRng {
        fn new(values: &[u64]) -> Self {
            Self(values.iter().copied().collect())
        }

        fn is_drained(&self) -> bool {
            self.0.is_empty()
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0.pop_front().expect("scream rolled more often than scripted")
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            StepRng::new(self.next_u64(), 0).fill_bytes(dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    const HEADS: u64 = 0;
    const TAILS: u64 = u64::MAX;

    /// The raw `u64` that makes `gen_range` over `n` values land on index `k`.
    fn nth_of(k: u64, n: u64) -> u64 {
        k * (u64::MAX / n + 1)
    }

    /// Same for slice picks, which draw a `u32`.
    fn nth_item_of(k: u64, n: u64) -> u64 {
        k * (u32::MAX as u64 / n + 1)
    }

    #[test]
    fn styled_roll_draws_in_order() {
        let mut rng = ScriptedRng::new(&[
            nth_of(41, 100),    // length 42
            TAILS,              // not vanilla
            nth_item_of(1, 2),  // 'O'
            TAILS,              // wrapped...
            nth_item_of(2, 3),  // ...in "***"
            HEADS,              // no suffix
            HEADS,              // exclamations...
            nth_of(2, 5),       // ...three of them
            HEADS,              // lower-cased
        ]);

        let style = ScreamStyle::roll(&mut rng);
        assert!(rng.is_drained());
        assert_eq!(
            style,
            ScreamStyle::Styled {
                length: 42,
                body: 'O',
                wrapper: Some("***"),
                suffix: None,
                exclamations: 3,
                lowercase: true,
            }
        );
        assert_eq!(style.to_string(), format!("***{}!!!***", "o".repeat(42)));
    }

    #[test]
    fn styled_roll_with_suffix_and_no_extras() {
        let mut rng = ScriptedRng::new(&[
            nth_of(0, 100),
            TAILS,
            nth_item_of(0, 2),
            HEADS,
            TAILS,
            nth_item_of(1, 3),
            TAILS,
            TAILS,
        ]);

        let style = ScreamStyle::roll(&mut rng);
        assert!(rng.is_drained());
        assert_eq!(
            style,
            ScreamStyle::Styled {
                length: 1,
                body: 'A',
                wrapper: None,
                suffix: Some("RGH"),
                exclamations: 0,
                lowercase: false,
            }
        );
        assert_eq!(style.to_string(), "ARGH");
    }

    #[test]
    fn vanilla_roll_stops_after_two_draws() {
        let mut rng = ScriptedRng::new(&[nth_of(99, 100), HEADS]);

        let style = ScreamStyle::roll(&mut rng);
        assert!(rng.is_drained());
        assert_eq!(style, ScreamStyle::Vanilla { length: 100 });
        assert_eq!(style.to_string(), "A".repeat(100));
    }

    #[test]
    fn thread_rng_generation() {
        for _ in 0..100 {
            assert!(!generate().is_empty());
        }
    }
}
