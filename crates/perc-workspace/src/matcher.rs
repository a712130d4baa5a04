//! Include/exclude glob evaluation.
//!
//! Every pattern and every candidate is anchored with a leading `/`, so a
//! pattern such as `src/**` only matches below the workspace root and a
//! bare `*.coffee` only matches files directly inside it. Matching is case
//! insensitive and wildcards match dot-files. An empty pattern list matches
//! nothing.
//!
//! Patterns use gitignore glob syntax: `*`, `?`, `[...]`, `**` and brace
//! alternation such as `*.{coffee,litcoffee}`. Extglob groups are not
//! supported; in `*.?(lit)coffee` the `?` is a single-character wildcard
//! and `(lit)` is literal text.

use camino::Utf8Path;
use ignore::overrides::Override;
use ignore::overrides::OverrideBuilder;

use crate::paths::to_slash;

/// Compiled include and exclude lists for one configuration snapshot.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Option<Override>,
    exclude: Option<Override>,
}

impl PathMatcher {
    /// Compile both lists. Patterns that fail to parse are skipped.
    #[must_use]
    pub fn new<I, E>(include: &[I], exclude: &[E]) -> Self
    where
        I: AsRef<str>,
        E: AsRef<str>,
    {
        Self {
            include: compile(include),
            exclude: compile(exclude),
        }
    }

    /// Whether `relative` is selected: exclusion always beats inclusion.
    #[must_use]
    pub fn is_match(&self, relative: &Utf8Path) -> bool {
        let candidate = anchor(&to_slash(relative));
        if matched(self.exclude.as_ref(), &candidate) {
            tracing::trace!(path = %relative, "excluded");
            return false;
        }
        matched(self.include.as_ref(), &candidate)
    }
}

/// One-shot form of [`PathMatcher::is_match`].
#[must_use]
pub fn matches<I, E>(relative: &Utf8Path, include: &[I], exclude: &[E]) -> bool
where
    I: AsRef<str>,
    E: AsRef<str>,
{
    PathMatcher::new(include, exclude).is_match(relative)
}

fn anchor(pattern: &str) -> String {
    if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}

fn compile<P: AsRef<str>>(patterns: &[P]) -> Option<Override> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = OverrideBuilder::new("/");
    if let Err(e) = builder.case_insensitive(true) {
        tracing::warn!("Failed to enable case-insensitive matching: {e}");
    }

    let mut added = 0usize;
    for pattern in patterns {
        let pattern = pattern.as_ref();
        match builder.add(&anchor(pattern)) {
            Ok(_) => added += 1,
            Err(e) => tracing::warn!(pattern, "Skipping invalid glob: {e}"),
        }
    }
    if added == 0 {
        return None;
    }

    match builder.build() {
        Ok(globs) => Some(globs),
        Err(e) => {
            tracing::warn!("Failed to compile glob set: {e}");
            None
        }
    }
}

fn matched(globs: Option<&Override>, candidate: &str) -> bool {
    globs.is_some_and(|globs| globs.matched(candidate, false).is_whitelist())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATCH_ALL: [&str; 1] = ["**/*.coffee"];
    const NONE: [&str; 0] = [];

    fn check(path: &str, include: &[&str], exclude: &[&str]) -> bool {
        matches(Utf8Path::new(path), include, exclude)
    }

    mod include {
        use super::*;

        #[test]
        fn test_catch_all_matches_any_depth() {
            assert!(check("a.coffee", &CATCH_ALL, &NONE));
            assert!(check("src/deep/b.coffee", &CATCH_ALL, &NONE));
            assert!(!check("src/b.js", &CATCH_ALL, &NONE));
        }

        #[test]
        fn test_directory_pattern_is_anchored_at_root() {
            assert!(check("src/a.coffee", &["src/**"], &NONE));
            assert!(!check("lib/src/a.coffee", &["src/**"], &NONE));
        }

        #[test]
        fn test_bare_extension_pattern_only_matches_root_level() {
            assert!(check("a.coffee", &["*.coffee"], &NONE));
            assert!(!check("src/a.coffee", &["*.coffee"], &NONE));
        }

        #[test]
        fn test_already_rooted_pattern() {
            assert!(check("src/a.coffee", &["/src/*.coffee"], &NONE));
        }

        #[test]
        fn test_empty_include_matches_nothing() {
            assert!(!check("a.coffee", &NONE, &NONE));
        }

        #[test]
        fn test_case_insensitive() {
            assert!(check("SRC/A.COFFEE", &["src/*.coffee"], &NONE));
        }

        #[test]
        fn test_dot_files_match_wildcards() {
            assert!(check(".config/a.coffee", &CATCH_ALL, &NONE));
            assert!(check("src/.hidden.coffee", &["src/*"], &NONE));
        }

        #[test]
        fn test_any_include_is_enough() {
            assert!(check("lib/a.coffee", &["src/**", "lib/**"], &NONE));
        }
    }

    mod exclude {
        use super::*;

        #[test]
        fn test_exclude_wins_over_include() {
            assert!(!check(
                "src/vendor/lib.coffee",
                &["src/**"],
                &["src/vendor/**"]
            ));
            assert!(check("src/app.coffee", &["src/**"], &["src/vendor/**"]));
        }

        #[test]
        fn test_exclude_identical_to_include() {
            assert!(!check("a.coffee", &CATCH_ALL, &CATCH_ALL));
        }

        #[test]
        fn test_empty_exclude_excludes_nothing() {
            assert!(check("a.coffee", &CATCH_ALL, &NONE));
        }
    }

    mod invalid {
        use super::*;

        #[test]
        fn test_invalid_pattern_is_skipped() {
            assert!(check("src/a.coffee", &["src/[", "src/**"], &NONE));
        }

        #[test]
        fn test_only_invalid_patterns_match_nothing() {
            assert!(!check("src/a.coffee", &["src/["], &NONE));
        }
    }

    mod syntax {
        use super::*;

        #[test]
        fn test_brace_alternation() {
            let include = ["**/*.{coffee,litcoffee}"];
            assert!(check("x/a.litcoffee", &include, &NONE));
            assert!(check("x/a.coffee", &include, &NONE));
        }

        #[test]
        fn test_extglob_is_not_supported() {
            assert!(!check("x/a.litcoffee", &["**/*.?(lit)coffee"], &NONE));
        }
    }
}
