//! Shell expression (`shExpMatch`) matching.
//!
//! `*` matches any run of characters (including none), `?` matches exactly
//! one character, everything else matches itself. Matching is case-sensitive,
//! anchored at both ends, and has no escape syntax: a literal `*` or `?`
//! cannot be expressed, as in every browser implementation.

use std::convert::Infallible;

/// One element of a compiled shell expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// `*`
    AnyRun,

    /// `?`
    AnyOne,

    /// Any other character.
    Literal(char),
}

/// A compiled shell expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellPattern {
    tokens: Vec<Token>,
}

impl ShellPattern {
    /// Compile a pattern. Consecutive `*` collapse into one.
    pub fn new(pattern: &str) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            let token = match c {
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                other => Token::Literal(other),
            };
            if token == Token::AnyRun && tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            tokens.push(token);
        }
        Self { tokens }
    }

    /// Check if the whole subject matches the pattern.
    ///
    /// Iterative with a single backtrack point, so the worst case is
    /// O(|subject| * |pattern|) time and constant extra stack.
    pub fn matches(&self, subject: &str) -> bool {
        let subject: Vec<char> = subject.chars().collect();
        let tokens = &self.tokens;

        let mut si = 0;
        let mut ti = 0;
        // Token index after the last `*` and the subject index it is anchored at.
        let mut backtrack: Option<(usize, usize)> = None;

        while si < subject.len() {
            match tokens.get(ti) {
                Some(Token::AnyRun) => {
                    ti += 1;
                    backtrack = Some((ti, si));
                }
                Some(Token::AnyOne) => {
                    si += 1;
                    ti += 1;
                }
                Some(Token::Literal(c)) if *c == subject[si] => {
                    si += 1;
                    ti += 1;
                }
                _ => match backtrack {
                    Some((after_star, anchor)) => {
                        // Let the last `*` swallow one more character.
                        ti = after_star;
                        si = anchor + 1;
                        backtrack = Some((after_star, anchor + 1));
                    }
                    None => return false,
                },
            }
        }

        tokens[ti..].iter().all(|t| *t == Token::AnyRun)
    }

    /// Check if the pattern contains no wildcard.
    pub fn is_literal(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Literal(_)))
    }
}

impl std::fmt::Display for ShellPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;

        for token in &self.tokens {
            let c = match token {
                Token::AnyRun => '*',
                Token::AnyOne => '?',
                Token::Literal(c) => *c,
            };
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ShellPattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// `shExpMatch(str, shexp)`.
pub fn sh_exp_match(subject: &str, pattern: &str) -> bool {
    ShellPattern::new(pattern).matches(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_suffix() {
        assert!(sh_exp_match("foo.example.com", "*.example.com"));
        assert!(sh_exp_match(".example.com", "*.example.com"));
        assert!(!sh_exp_match("example.com", "*.example.com"));
        assert!(!sh_exp_match("foo.example.com.evil", "*.example.com"));
    }

    #[test]
    fn test_question_mark_is_exactly_one() {
        assert!(sh_exp_match("a1c", "a?c"));
        assert!(!sh_exp_match("ac", "a?c"));
        assert!(!sh_exp_match("a12c", "a?c"));
        assert!(sh_exp_match("ü", "?"));
    }

    #[test]
    fn test_literal_patterns_are_equality() {
        let cases = [
            ("", ""),
            ("abc", "abc"),
            ("abc", "abd"),
            ("abc", "ABC"),
            ("a.b", "a.b"),
            ("axb", "a.b"),
            ("abc", "ab"),
            ("ab", "abc"),
            ("[x]", "[x]"),
            ("a+b", "a+b"),
        ];
        for (subject, pattern) in cases {
            assert_eq!(
                sh_exp_match(subject, pattern),
                subject == pattern,
                "{subject:?} vs {pattern:?}"
            );
        }
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(!sh_exp_match("aaa", "a+"));
        assert!(sh_exp_match("a|b", "a|b"));
        assert!(!sh_exp_match("a", "a|b"));
        assert!(sh_exp_match("(x)", "(*)"));
    }

    #[test]
    fn test_empty_pattern() {
        assert!(sh_exp_match("", ""));
        assert!(!sh_exp_match("a", ""));
        assert!(sh_exp_match("", "*"));
        assert!(sh_exp_match("", "***"));
        assert!(!sh_exp_match("", "?"));
    }

    #[test]
    fn test_url_patterns() {
        assert!(sh_exp_match(
            "http://home.netscape.com/people/ari/index.html",
            "*/ari/*"
        ));
        assert!(!sh_exp_match(
            "http://home.netscape.com/people/montulli/index.html",
            "*/ari/*"
        ));
        assert!(sh_exp_match("http://intranet/a?b", "http://*/a?b"));
    }

    #[test]
    fn test_backtracking_across_multiple_stars() {
        assert!(sh_exp_match("abcbcd", "*bc*d"));
        assert!(sh_exp_match("mississippi", "m*iss*ppi"));
        assert!(!sh_exp_match("mississippi", "m*iss*ppx"));
        assert!(sh_exp_match("aXbXc", "a*b*c"));
    }

    #[test]
    fn test_pathological_pattern_terminates() {
        let subject = "a".repeat(5_000);
        let pattern = format!("{}b", "*a".repeat(2_000));
        assert!(!sh_exp_match(&subject, &pattern));

        let pattern = "*".repeat(10_000);
        assert!(sh_exp_match(&subject, &pattern));
    }

    #[test]
    fn test_compiled_pattern_display() {
        let pattern: ShellPattern = "**.example.???".parse().unwrap();
        assert_eq!(pattern.to_string(), "*.example.???");
        assert!(!pattern.is_literal());
        assert!(ShellPattern::new("example.com").is_literal());
    }
}
