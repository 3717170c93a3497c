//! Stateless password complexity rules.

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// A failed complexity rule, tagged so callers can render a combined message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    TooShort,
    MissingUppercase,
    MissingDigit,
    MissingSpecial,
}

/// Minimum complexity requirements for a new password.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    min_uppercase: usize,
    min_digits: usize,
    min_special: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            min_uppercase: 1,
            min_digits: 1,
            min_special: 1,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    #[must_use]
    pub const fn with_min_uppercase(mut self, min_uppercase: usize) -> Self {
        self.min_uppercase = min_uppercase;
        self
    }

    #[must_use]
    pub const fn with_min_digits(mut self, min_digits: usize) -> Self {
        self.min_digits = min_digits;
        self
    }

    #[must_use]
    pub const fn with_min_special(mut self, min_special: usize) -> Self {
        self.min_special = min_special;
        self
    }

    /// Check `candidate` against every rule. Pure, no I/O.
    ///
    /// Returns one tagged violation per failed rule; empty means the
    /// candidate passes.
    #[must_use]
    pub fn validate(&self, candidate: &str) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();

        if candidate.chars().count() < self.min_length {
            violations.push(PolicyViolation::TooShort);
        }
        if count_matching(candidate, |ch| ch.is_ascii_uppercase()) < self.min_uppercase {
            violations.push(PolicyViolation::MissingUppercase);
        }
        if count_matching(candidate, |ch| ch.is_ascii_digit()) < self.min_digits {
            violations.push(PolicyViolation::MissingDigit);
        }
        if count_matching(candidate, |ch| SPECIAL_CHARACTERS.contains(ch)) < self.min_special {
            violations.push(PolicyViolation::MissingSpecial);
        }

        violations
    }
}

fn count_matching(candidate: &str, rule: impl Fn(char) -> bool) -> usize {
    candidate.chars().filter(|ch| rule(*ch)).count()
}
