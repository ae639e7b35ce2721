//! Filter-expression engine for the dashboard search box.
//!
//! A [`FilterSpec`] (free text plus three independent toggles) is lowered
//! to a closed [`MatchMode`] and compiled once into a [`Matcher`]. The
//! matcher is then a cheap, reusable predicate over candidate strings.
//!
//! # Semantics
//!
//! - `match_case = false` lower-cases **both** the candidate and the query
//!   before any comparison, in every mode.
//! - `WholeWord` wraps the query in `\b` anchors **without escaping it**,
//!   exactly as the search box always has; metacharacters stay live and a
//!   malformed query fails compilation in this mode too.
//! - `WholeWordRegex` requires **both** that the query, read as a regular
//!   expression, matches the candidate **and** that the query, read as a
//!   literal wrapped in word boundaries, also matches. The conjunction is
//!   intentional: "acts like a regex" AND "appears as a literal whole
//!   word". Do not simplify it to either test alone.
//! - An empty query matches every candidate.
//!
//! Compilation is the only fallible step. An invalid regular expression
//! yields [`MatchError`] carrying the underlying message; callers are
//! expected to show the message and treat the visible set as **empty**
//! until the expression is corrected, never falling back to unfiltered
//! results.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// The user-facing state of the search box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub text: String,
    pub match_case: bool,
    pub match_whole_word: bool,
    pub use_regex: bool,
}

impl FilterSpec {
    /// Plain substring filter with default toggles.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// MatchMode
// ---------------------------------------------------------------------------

/// The four reachable combinations of the whole-word / regex toggles.
///
/// Lowering the two booleans to a named variant keeps the unusual
/// [`MatchMode::WholeWordRegex`] conjunction an explicit, testable branch
/// instead of nested conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Neither toggle: candidate contains the query.
    Substring,
    /// Whole word only: query wrapped in word boundaries, unescaped.
    WholeWord,
    /// Regex only: query as a regular expression.
    Regex,
    /// Both toggles: regex match AND literal word-bounded match.
    WholeWordRegex,
}

impl MatchMode {
    pub fn from_flags(match_whole_word: bool, use_regex: bool) -> Self {
        match (match_whole_word, use_regex) {
            (false, false) => MatchMode::Substring,
            (true, false) => MatchMode::WholeWord,
            (false, true) => MatchMode::Regex,
            (true, true) => MatchMode::WholeWordRegex,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchError
// ---------------------------------------------------------------------------

/// Filter compilation failed (invalid regular expression).
///
/// Transient and user-visible: the message is shown at the search box and
/// the filtered view stays empty until the user edits the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchError {
    /// The offending query text.
    pub query: String,
    /// Message from the regex compiler, verbatim.
    pub message: String,
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid filter expression {:?}: {}", self.query, self.message)
    }
}

impl std::error::Error for MatchError {}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// A compiled predicate over candidate strings.
///
/// Construction via [`Matcher::compile`] is the only fallible step; calling
/// [`is_match`][Matcher::is_match] never fails and allocates only in the
/// case-folding path.
#[derive(Debug, Clone)]
pub struct Matcher {
    mode: CompiledMode,
    /// Query after optional case folding; substring mode compares
    /// against this.
    query: String,
    fold_case: bool,
}

#[derive(Debug, Clone)]
enum CompiledMode {
    /// Empty query: matches everything regardless of toggles.
    All,
    /// Poisoned matcher: excludes everything (invalid user expression).
    None,
    Substring,
    WholeWord(regex::Regex),
    Regex(regex::Regex),
    /// Both regexes must match: the free-form one and the literal
    /// word-bounded one.
    WholeWordRegex {
        free: regex::Regex,
        literal: regex::Regex,
    },
}

impl Matcher {
    /// Compile a filter spec into a reusable predicate.
    ///
    /// Must be re-invoked whenever any field of the spec changes; the
    /// caller then reapplies the new matcher to its current data
    /// immediately rather than waiting for the next tick.
    pub fn compile(spec: &FilterSpec) -> Result<Matcher, MatchError> {
        let fold_case = !spec.match_case;
        let query = if fold_case {
            spec.text.to_lowercase()
        } else {
            spec.text.clone()
        };

        if query.is_empty() {
            return Ok(Matcher {
                mode: CompiledMode::All,
                query,
                fold_case,
            });
        }

        let compile = |pattern: &str| {
            regex::Regex::new(pattern).map_err(|e| MatchError {
                query: spec.text.clone(),
                message: e.to_string(),
            })
        };
        let mode = match MatchMode::from_flags(spec.match_whole_word, spec.use_regex) {
            MatchMode::Substring => CompiledMode::Substring,
            // Historical behavior: the query is interpolated raw, so regex
            // metacharacters remain live in whole-word mode.
            MatchMode::WholeWord => {
                CompiledMode::WholeWord(compile(&format!(r"\b{query}\b"))?)
            }
            MatchMode::Regex => CompiledMode::Regex(compile(&query)?),
            MatchMode::WholeWordRegex => CompiledMode::WholeWordRegex {
                free: compile(&query)?,
                literal: compile(&format!(r"\b{}\b", regex::escape(&query)))?,
            },
        };

        Ok(Matcher {
            mode,
            query,
            fold_case,
        })
    }

    /// Does `candidate` satisfy the filter?
    pub fn is_match(&self, candidate: &str) -> bool {
        let folded;
        let candidate = if self.fold_case {
            folded = candidate.to_lowercase();
            folded.as_str()
        } else {
            candidate
        };

        match &self.mode {
            CompiledMode::All => true,
            CompiledMode::None => false,
            CompiledMode::Substring => candidate.contains(&self.query),
            CompiledMode::WholeWord(re) => re.is_match(candidate),
            CompiledMode::Regex(re) => re.is_match(candidate),
            CompiledMode::WholeWordRegex { free, literal } => {
                free.is_match(candidate) && literal.is_match(candidate)
            }
        }
    }

    /// A matcher that accepts everything (the state before any user input).
    pub fn match_all() -> Matcher {
        Matcher {
            mode: CompiledMode::All,
            query: String::new(),
            fold_case: true,
        }
    }

    /// A matcher that rejects everything.
    ///
    /// Installed while the user's expression fails to compile, so the view
    /// goes empty instead of silently reverting to unfiltered results.
    pub fn match_none() -> Matcher {
        Matcher {
            mode: CompiledMode::None,
            query: String::new(),
            fold_case: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str, match_case: bool, whole_word: bool, use_regex: bool) -> Matcher {
        Matcher::compile(&FilterSpec {
            text: text.to_string(),
            match_case,
            match_whole_word: whole_word,
            use_regex,
        })
        .expect("spec should compile")
    }

    #[test]
    fn empty_query_matches_everything() {
        let m = compile("", false, false, false);
        assert!(m.is_match("anything"));
        assert!(m.is_match(""));

        // Toggles are irrelevant for an empty query, including regex mode.
        let m = compile("", true, true, true);
        assert!(m.is_match("anything"));
    }

    #[test]
    fn substring_respects_match_case() {
        let sensitive = compile("ab", true, false, false);
        assert!(!sensitive.is_match("AB"));
        assert!(sensitive.is_match("xaby"));

        let insensitive = compile("ab", false, false, false);
        assert!(insensitive.is_match("AB"));
        assert!(insensitive.is_match("xAbY"));
    }

    #[test]
    fn whole_word_literal() {
        let m = compile("cat", false, true, false);
        assert!(m.is_match("a cat sat"));
        assert!(m.is_match("cat"));
        assert!(!m.is_match("concatenate"));
    }

    #[test]
    fn whole_word_keeps_metacharacters_live() {
        // The query is not escaped in whole-word mode: "c.t" behaves as
        // the pattern \bc.t\b and so matches "cat".
        let m = compile("c.t", false, true, false);
        assert!(m.is_match("cat"));
        assert!(m.is_match("c.t files"));
        assert!(!m.is_match("concatenate"));
    }

    #[test]
    fn whole_word_invalid_pattern_errors() {
        // Unescaped interpolation means a malformed query fails to compile
        // even with the regex toggle off.
        let err = Matcher::compile(&FilterSpec {
            text: "(".to_string(),
            match_whole_word: true,
            ..FilterSpec::default()
        })
        .unwrap_err();
        assert_eq!(err.query, "(");
    }

    #[test]
    fn regex_mode() {
        let m = compile("c.t", false, false, true);
        assert!(m.is_match("cat"));
        assert!(m.is_match("cut"));
        assert!(!m.is_match("dog"));
    }

    #[test]
    fn whole_word_regex_is_a_conjunction() {
        // "c.t" matches "cat" as a regex, but "c.t" as a literal whole
        // word does not appear in "cat", so the AND fails.
        let m = compile("c.t", false, true, true);
        assert!(!m.is_match("cat"));
        // Both tests pass when the candidate contains the literal text.
        assert!(m.is_match("open c.t now"));

        // With query "cat" both the regex and the literal word test hit.
        let m = compile("cat", false, true, true);
        assert!(m.is_match("a cat sat"));
        assert!(!m.is_match("concatenate"));
    }

    #[test]
    fn invalid_regex_reports_compile_error() {
        let err = Matcher::compile(&FilterSpec {
            text: "(".to_string(),
            use_regex: true,
            ..FilterSpec::default()
        })
        .unwrap_err();
        assert_eq!(err.query, "(");
        assert!(!err.message.is_empty());
        assert!(err.to_string().contains("invalid filter expression"));
    }

    #[test]
    fn match_none_rejects_every_candidate() {
        let m = Matcher::match_none();
        for candidate in ["", "a", "word boundary", "\\b\\B"] {
            assert!(!m.is_match(candidate));
        }
    }

    #[test]
    fn case_folding_applies_before_regex() {
        let m = compile("HOST-[0-9]+", false, false, true);
        // Pattern is lowercased too, so the literal part must compare
        // lowercase-to-lowercase.
        assert!(m.is_match("Host-12"));

        let sensitive = compile("Host-[0-9]+", true, false, true);
        assert!(sensitive.is_match("Host-12"));
        assert!(!sensitive.is_match("host-12"));
    }
}
