use regex::{Regex, RegexBuilder};

/// Case-insensitive literal substring filter compiled from free-text input.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    query: String,
    regex: Regex,
}

impl SearchFilter {
    /// `None` for an empty or whitespace-only query.
    pub fn compile(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self {
            query: query.to_string(),
            regex,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for SearchFilter {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
    }
}

/// Whether `text` passes an optional filter. No filter passes everything.
pub fn passes(filter: Option<&SearchFilter>, text: &str) -> bool {
    filter.is_none_or(|f| f.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_compiles_to_none() {
        assert!(SearchFilter::compile("").is_none());
        assert!(SearchFilter::compile("   \t").is_none());
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let filter = SearchFilter::compile(" golem ").expect("filter");
        assert_eq!(filter.query(), "golem");
        assert!(filter.is_match("Ancient Golem"));
        assert!(filter.is_match("GOLEMITE"));
        assert!(!filter.is_match("Slime"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let filter = SearchFilter::compile("a.c (1)").expect("filter");
        assert!(filter.is_match("xA.C (1)y"));
        assert!(!filter.is_match("abc (1)"));

        let star = SearchFilter::compile("*").expect("filter");
        assert!(star.is_match("Boss*"));
        assert!(!star.is_match("Boss"));
    }

    #[test]
    fn passes_without_filter() {
        assert!(passes(None, "anything"));
        let filter = SearchFilter::compile("bat");
        assert!(passes(filter.as_ref(), "Vampire Bat"));
        assert!(!passes(filter.as_ref(), "Wolf"));
    }
}
