//! Shortcode generation.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::{config, ErrorKind, Result};

/// Produces random codes drawn uniformly from a fixed alphabet.
#[derive(Clone, Debug)]
pub struct Generator {
    alphabet: Arc<[char]>,
    length: usize,
    warn_after: usize,
}

impl Generator {
    pub fn new(alphabet: &str, length: usize) -> Result<Self> {
        let mut chars = alphabet.chars().collect::<Vec<_>>();
        chars.sort_unstable();
        chars.dedup();
        if chars.is_empty() {
            return Err(ErrorKind::BadInput("shortcode alphabet must not be empty".to_string()).into());
        }
        if length == 0 {
            return Err(ErrorKind::BadInput("shortcode length must be at least 1".to_string()).into());
        }
        Ok(Self {
            alphabet: chars.into(),
            length,
            warn_after: usize::MAX,
        })
    }

    pub fn from_config(config: &config::Shortcode) -> Result<Self> {
        let mut generator = Self::new(&config.alphabet, config.length)?;
        generator.warn_after = config.warn_after;
        Ok(generator)
    }

    /// Number of distinct codes of the configured length, saturating at
    /// `u128::MAX`.
    pub fn codespace(&self) -> u128 {
        (self.alphabet.len() as u128)
            .checked_pow(self.length as u32)
            .unwrap_or(u128::MAX)
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .filter_map(|_| self.alphabet.choose(&mut rng))
            .collect()
    }

    /// Generates candidates until `exists` reports one as free.
    ///
    /// `occupied` is the current number of registered codes. Generation
    /// refuses to start when the code space is already full, as it would
    /// otherwise loop forever. Errors returned by `exists` are propagated.
    pub fn ensure_unique<F>(&self, occupied: usize, mut exists: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        if self.codespace() <= occupied as u128 {
            return Err(ErrorKind::CodespaceExhausted(format!(
                "{} codes of length {} already registered",
                occupied, self.length
            ))
            .into());
        }

        let mut attempts = 0usize;
        loop {
            let candidate = self.generate();
            attempts += 1;
            if !exists(&candidate)? {
                return Ok(candidate);
            }
            if attempts == self.warn_after || (attempts > self.warn_after && attempts % 100 == 0) {
                tracing::warn!(
                    attempts,
                    occupied,
                    codespace = %self.codespace(),
                    "shortcode generation keeps hitting taken codes, code space may be running out"
                );
            }
        }
    }
}
