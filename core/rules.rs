use crate::error::AppError;
use globset::{GlobBuilder, GlobMatcher};
use log;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rule that is always present, whether or not a rules file exists.
pub const SEED_RULE: &str = ".git";

/// Default rules file name looked up directly under the scan root.
pub const DEFAULT_RULES_FILE: &str = ".gitignore";

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: String,
    // None when the pattern is not a valid glob; substring matching still applies.
    matcher: Option<GlobMatcher>,
}

/// Rewrites `pattern` so globset reads it as a plain shell glob: runs of
/// `*` collapse to one `*` and braces are literal characters.
fn shell_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                if let Some(&neg) = chars.peek().filter(|n| **n == '^' || **n == '!') {
                    out.push(neg);
                    chars.next();
                }
                // A leading `]` is a member of the class, not its end.
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '*' if !in_class => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            '{' if !in_class => out.push_str("[{]"),
            '}' if !in_class => out.push_str("[}]"),
            _ => out.push(c),
        }
    }
    out
}

impl IgnoreRule {
    fn new(pattern: String) -> Self {
        let glob = shell_glob(&pattern);
        let matcher = match GlobBuilder::new(&glob).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                log::debug!("Rule \"{}\" is not a valid glob ({}), using substring match only", pattern, e);
                None
            }
        };
        Self { pattern, matcher }
    }

    fn matches(&self, candidate: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(candidate))
            || candidate.contains(self.pattern.as_str())
    }
}

/// Ordered, immutable set of simplified ignore rules.
///
/// Only a subset of `.gitignore` is understood: every retained line is
/// slash-trimmed and matched against the root-relative path either as a
/// single-segment glob or as a literal substring. Negation and
/// directory-only patterns are not supported.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::seeded()
    }
}

// Never empty: the seed rule is always present.
#[allow(clippy::len_without_is_empty)]
impl IgnoreRules {
    /// Rule set holding only the seed rule.
    pub fn seeded() -> Self {
        Self {
            rules: vec![IgnoreRule::new(SEED_RULE.to_string())],
        }
    }

    /// Builds a seeded rule set from raw rules-file lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::seeded();
        for line in lines {
            set.push_line(line.as_ref());
        }
        set
    }

    fn push_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let pattern = line.trim_matches('/');
        log::trace!("Adding ignore rule: {} (from \"{}\")", pattern, line);
        self.rules.push(IgnoreRule::new(pattern.to_string()));
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_ignored(&self, candidate: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(candidate))
    }
}

/// Loads rules from `path`.
///
/// Never fails outright: when the file cannot be opened or read, the
/// rules gathered so far (at least the seed rule) come back together with
/// the error so the caller can log it and carry on.
pub fn load_rules(path: &Path) -> (IgnoreRules, Option<AppError>) {
    log::debug!("Loading ignore rules from: {}", path.display());
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            return (
                IgnoreRules::seeded(),
                Some(AppError::RuleLoading(format!(
                    "Could not open rules file '{}': {}",
                    path.display(),
                    e
                ))),
            );
        }
    };

    let mut rules = IgnoreRules::seeded();
    // Lines are split on raw bytes so one badly encoded line cannot hide the rest.
    for line in BufReader::new(file).split(b'\n') {
        match line {
            Ok(bytes) => rules.push_line(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                return (
                    rules,
                    Some(AppError::RuleLoading(format!(
                        "Error reading rules file '{}': {}",
                        path.display(),
                        e
                    ))),
                );
            }
        }
    }
    log::debug!("Loaded {} ignore rules", rules.len());
    (rules, None)
}

/// Free-function form of [`IgnoreRules::is_ignored`].
pub fn is_ignored(candidate: &str, rules: &IgnoreRules) -> bool {
    rules.is_ignored(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rules(lines: &[&str]) -> IgnoreRules {
        IgnoreRules::from_lines(lines.iter().copied())
    }

    #[test]
    fn seed_rule_comes_first() {
        let set = rules(&["target", "*.log"]);
        let patterns: Vec<&str> = set.patterns().collect();
        assert_eq!(patterns, vec![".git", "target", "*.log"]);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let set = rules(&["", "   ", "# comment", "   # indented comment", "dist"]);
        let patterns: Vec<&str> = set.patterns().collect();
        assert_eq!(patterns, vec![".git", "dist"]);
    }

    #[test]
    fn strips_leading_and_trailing_slashes() {
        let set = rules(&["/build/", "node_modules/", "/docs/generated"]);
        let patterns: Vec<&str> = set.patterns().collect();
        assert_eq!(patterns, vec![".git", "build", "node_modules", "docs/generated"]);
    }

    #[test]
    fn glob_does_not_cross_separators() {
        let set = rules(&["*.tmp"]);
        assert!(set.is_ignored("scratch.tmp"));
        // No glob match for nested paths and no substring match either.
        assert!(!set.is_ignored("src/scratch.tmp"));
        assert!(!set.is_ignored("notes.txt"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let set = rules(&["v?.bin"]);
        assert!(set.is_ignored("v1.bin"));
        assert!(!set.is_ignored("v10.bin"));
    }

    #[test]
    fn substring_match_applies_anywhere() {
        let set = rules(&["log"]);
        assert!(set.is_ignored("log"));
        assert!(set.is_ignored("src/log/out.txt"));
        assert!(set.is_ignored("catalog.txt"));
        assert!(!set.is_ignored("src/main.rs"));
    }

    #[test]
    fn seed_rule_ignores_git_paths() {
        let set = IgnoreRules::seeded();
        assert!(set.is_ignored(".git"));
        assert!(set.is_ignored(".git/config"));
        assert!(!set.is_ignored("README.md"));
    }

    #[test]
    fn invalid_glob_falls_back_to_substring() {
        let set = rules(&["[oops"]);
        assert!(set.is_ignored("dir/[oops]/file"));
        assert!(!set.is_ignored("dir/file"));
    }

    #[test]
    fn free_function_matches_method() {
        let set = rules(&["build"]);
        assert!(is_ignored("build", &set));
        assert!(!is_ignored("src", &set));
    }

    #[test]
    fn load_rules_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitignore");
        fs::write(&path, "# generated\n/target/\n\n*.swp\n").unwrap();

        let (set, err) = load_rules(&path);
        assert!(err.is_none());
        let patterns: Vec<&str> = set.patterns().collect();
        assert_eq!(patterns, vec![".git", "target", "*.swp"]);
    }

    #[test]
    fn missing_file_yields_seed_and_error() {
        let dir = TempDir::new().unwrap();
        let (set, err) = load_rules(&dir.path().join(".gitignore"));
        assert!(matches!(err, Some(AppError::RuleLoading(_))));
        assert_eq!(set.patterns().collect::<Vec<_>>(), vec![".git"]);
        assert!(set.is_ignored(".git/HEAD"));
    }

    #[test]
    fn double_star_is_a_single_segment_star() {
        let set = rules(&["**/secret.txt"]);
        assert!(!set.is_ignored("secret.txt"));
        assert!(!set.is_ignored("a/b/secret.txt"));
        assert!(set.is_ignored("a/secret.txt"));
    }

    #[test]
    fn braces_are_literal() {
        let set = rules(&["{foo,bar}"]);
        assert!(!set.is_ignored("foo"));
        assert!(!set.is_ignored("bar"));
        assert!(set.is_ignored("{foo,bar}"));
    }

    #[test]
    fn shell_glob_rewrites_only_outside_classes() {
        assert_eq!(shell_glob("**/*.log"), "*/*.log");
        assert_eq!(shell_glob("a{b}"), "a[{]b[}]");
        assert_eq!(shell_glob("[{*]x"), "[{*]x");
        assert_eq!(shell_glob("[]*]**"), "[]*]*");
        assert_eq!(shell_glob("\\**"), "\\**");
    }

    #[test]
    fn badly_encoded_line_keeps_later_rules() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitignore");
        fs::write(&path, b"# caf\xe9\n.env\nsecrets\n").unwrap();

        let (set, err) = load_rules(&path);
        assert!(err.is_none());
        assert_eq!(
            set.patterns().collect::<Vec<_>>(),
            vec![".git", ".env", "secrets"]
        );
        assert!(set.is_ignored(".env"));
        assert!(set.is_ignored("config/secrets.toml"));
    }
}
