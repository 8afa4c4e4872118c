use crate::model::DateWindow;
use std::path::{Path, PathBuf};

/// Sums numstat lines into `added,removed,net` with no trailing newline.
pub const SUMMATION_FILTER: &str =
    r#"awk '{ add += $1; subs += $2; loc += $1 - $2 } END { printf "%s,%s,%s", add, subs, loc }'"#;

const NUMSTAT_DIRECTIVE: &str = "--pretty=tformat: --numstat";

#[derive(Debug, Clone)]
pub struct LogQuery {
    git: PathBuf,
    window: DateWindow,
    exclusions: Vec<String>,
    extra_flags: Vec<String>,
}

impl LogQuery {
    pub fn new(git: impl Into<PathBuf>, window: DateWindow) -> Self {
        Self {
            git: git.into(),
            window,
            exclusions: Vec::new(),
            extra_flags: Vec::new(),
        }
    }

    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusions = non_blank(exclusions);
        self
    }

    pub fn with_extra_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_flags = non_blank(flags);
        self
    }

    pub fn git(&self) -> &Path {
        &self.git
    }

    /// Options come before `--` and pathspecs after it: git refuses an option
    /// once it has seen a pathspec.
    pub fn for_authors(&self, aliases: &[String]) -> String {
        let mut tokens: Vec<String> = Vec::with_capacity(aliases.len() + self.exclusions.len() + 8);
        tokens.push(quote(&self.git.to_string_lossy()));
        tokens.push("log".to_string());

        for alias in aliases {
            tokens.push(format!("--author={}", quote(alias)));
        }

        tokens.push(format!("--since={}", quote(&self.window.since_arg())));
        tokens.push(format!("--until={}", quote(&self.window.until_arg())));

        if !self.extra_flags.is_empty() {
            tokens.push(self.extra_flags.join(" "));
        }

        tokens.push(NUMSTAT_DIRECTIVE.to_string());
        tokens.push("--".to_string());
        tokens.push(".".to_string());

        for glob in &self.exclusions {
            tokens.push(quote(&format!(":(top,exclude){glob}")));
        }

        format!("{} | {}", tokens.join(" "), SUMMATION_FILTER)
    }
}

fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

fn non_blank<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn window() -> DateWindow {
        DateWindow::parse("2024-1-05", "2024-06-30").unwrap()
    }

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_full_command_line() {
        let query = LogQuery::new("git", window())
            .with_exclusions(["vendor", "docs/*.md"])
            .with_extra_flags(["--no-merges", "  ", "--first-parent"]);

        let line = query.for_authors(&aliases(&["Alice", "A.Smith"]));

        assert_eq!(
            line,
            concat!(
                r#""git" log --author="Alice" --author="A.Smith" "#,
                r#"--since="2024-01-05" --until="2024-06-30" "#,
                r#"--no-merges --first-parent --pretty=tformat: --numstat "#,
                r#"-- . ":(top,exclude)vendor" ":(top,exclude)docs/*.md" | "#,
                r#"awk '{ add += $1; subs += $2; loc += $1 - $2 } END { printf "%s,%s,%s", add, subs, loc }'"#
            )
        );
    }

    #[test]
    fn one_author_filter_per_alias() {
        let line = LogQuery::new("git", window()).for_authors(&aliases(&["a", "b", "c"]));
        assert_eq!(line.matches("--author=").count(), 3);
        assert!(!line.contains(":(top,exclude)"));
    }

    #[test]
    fn quotes_values_with_spaces() {
        let line = LogQuery::new("/opt/my tools/git", window())
            .with_exclusions(["third party"])
            .for_authors(&aliases(&["Jane Doe"]));
        assert!(line.starts_with(r#""/opt/my tools/git" log --author="Jane Doe""#));
        assert!(line.contains(r#"":(top,exclude)third party""#));
    }

    #[test]
    fn extra_flags_sit_between_filters_and_numstat() {
        let line = LogQuery::new("git", window())
            .with_exclusions(["target"])
            .with_extra_flags(["--no-merges"])
            .for_authors(&aliases(&["x"]));
        let flags = line.find("--no-merges").unwrap();
        assert!(line.find("--until=").unwrap() < flags);
        assert!(flags < line.find("--numstat").unwrap());
        assert!(line.find("--numstat").unwrap() < line.find(":(top,exclude)").unwrap());
    }
}
