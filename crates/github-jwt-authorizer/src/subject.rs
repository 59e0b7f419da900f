//! Subject allow-list matching.
//!
//! Patterns are glob-style with `*` as the only wildcard ("zero or more
//! characters"). Every other character, including `?` and `[`, matches
//! itself. A pattern must cover the whole subject.
//!
//! ```text
//! repo:org/gates:*          matches  repo:org/gates:ref:refs/heads/main
//! repo:org/gates:*          rejects  repo:org/gates2:ref:refs/heads/main
//! repo:org/*:environment:*  matches  repo:org/api:environment:prod
//! ```

/// Returns `true` if `subject` matches at least one of `patterns`.
///
/// Fails closed: an absent or empty subject, or an empty pattern list,
/// never matches.
#[must_use]
pub fn matches(subject: Option<&str>, patterns: &[String]) -> bool {
    let Some(subject) = subject.filter(|s| !s.is_empty()) else {
        return false;
    };

    patterns
        .iter()
        .any(|pattern| wildcard_match(pattern, subject))
}

/// Anchored match of `text` against a pattern where `*` matches any run
/// of characters.
#[must_use]
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();

    let mut p = 0;
    let mut t = 0;
    // Position of the last `*` seen and the text position it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if Some(c) == text.get(t) => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                // Let the last `*` swallow one more byte and retry.
                Some((star, resume)) => {
                    p = star + 1;
                    t = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }

    pattern
        .get(p..)
        .is_some_and(|rest| rest.iter().all(|&c| c == b'*'))
}

/// The allow-list of subject patterns, fixed for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedSubjects {
    patterns: Vec<String>,
}

impl AllowedSubjects {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// See [`matches`].
    #[must_use]
    pub fn allows(&self, subject: Option<&str>) -> bool {
        matches(subject, &self.patterns)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
