use crate::content::{self, Node, Rendered, SideArtifacts};
use crate::error::ContentError;
use crate::locale::Locale;
use crate::search::TermMatches;
use once_cell::sync::OnceCell;
use regex::Regex;

/// One table cell
///
/// The content is fixed at construction. Markup and plain text are derived
/// lazily on first access and cached for the lifetime of the cell; a failed
/// markup derivation leaves the cache empty so nothing poisoned is stored.
#[derive(Clone, Debug)]
pub struct Cell {
    content: Vec<Node>,
    rendered: OnceCell<Rendered>,
    text: OnceCell<String>,
}

impl Cell {
    pub fn create(content: Vec<Node>) -> Self {
        Cell {
            content,
            rendered: OnceCell::new(),
            text: OnceCell::new(),
        }
    }

    /// Shorthand for a cell holding a single text node
    pub fn text_cell(text: impl Into<String>) -> Self {
        Self::create(vec![Node::text(text)])
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    fn rendered(&self) -> Result<&Rendered, ContentError> {
        self.rendered.get_or_try_init(|| content::render(&self.content))
    }

    /// HTML markup of the cell content, without out-of-band nodes
    pub fn markup(&self) -> Result<&str, ContentError> {
        Ok(&self.rendered()?.markup)
    }

    /// Out-of-band nodes extracted while rendering the markup
    pub fn side_artifacts(&self) -> Result<&SideArtifacts, ContentError> {
        Ok(&self.rendered()?.side)
    }

    /// Plain text used for sorting and searching
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| content::text_content(&self.content))
    }

    /// Whether the markup has already been derived
    pub fn is_rendered(&self) -> bool {
        self.rendered.get().is_some()
    }

    /// Set the bit of every pattern that matches the whole plain text
    pub fn match_regex(&self, patterns: &[Regex], matches: &mut TermMatches) {
        let text = self.text();
        for (index, pattern) in patterns.iter().enumerate() {
            if pattern.is_match(text) {
                matches.set(index);
            }
        }
    }

    pub fn match_plain_text_case_sensitive(&self, terms: &[String], matches: &mut TermMatches) {
        let text = self.text();
        for (index, term) in terms.iter().enumerate() {
            if text.contains(term.as_str()) {
                matches.set(index);
            }
        }
    }

    pub fn match_plain_text_ignore_case(
        &self,
        terms: &[String],
        locale: &Locale,
        matches: &mut TermMatches,
    ) {
        // fold the cell once, not once per term
        let text = locale.to_lower(self.text());
        for (index, term) in terms.iter().enumerate() {
            if text.contains(&locale.to_lower(term)) {
                matches.set(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_derivation_is_cached() {
        let cell = Cell::create(vec![
            Node::element("i").with_child(Node::text("Hello")),
            Node::element("script").with_child(Node::text("x();")),
        ]);
        assert!(!cell.is_rendered());
        assert_eq!(cell.text(), "Hello");
        assert!(!cell.is_rendered());

        let first = cell.markup().unwrap().as_ptr();
        assert!(cell.is_rendered());
        let second = cell.markup().unwrap().as_ptr();
        assert_eq!(first, second);
        assert_eq!(cell.markup().unwrap(), "<i>Hello</i>");
        assert_eq!(cell.side_artifacts().unwrap().inline_js(), ["x();"]);
    }

    #[test]
    fn test_failed_render_is_not_cached() {
        let cell = Cell::create(vec![Node::element("bad tag")]);
        assert!(cell.markup().is_err());
        assert!(!cell.is_rendered());
        assert!(cell.markup().is_err());
        // text does not depend on markup
        assert_eq!(cell.text(), "");
    }

    #[test]
    fn test_matching_primitives() {
        let cell = Cell::text_cell("Red Apple");
        let locale = Locale::default();
        let terms = vec!["red".to_string(), "pear".to_string(), "APPLE".to_string()];

        let mut matches = TermMatches::new(terms.len());
        cell.match_plain_text_ignore_case(&terms, &locale, &mut matches);
        assert!(matches.get(0));
        assert!(!matches.get(1));
        assert!(matches.get(2));

        let mut matches = TermMatches::new(terms.len());
        cell.match_plain_text_case_sensitive(&terms, &mut matches);
        assert!(matches.is_empty());

        let patterns = vec![
            Regex::new("^(?:Red.*)$").unwrap(),
            Regex::new("^(?:Apple)$").unwrap(),
        ];
        let mut matches = TermMatches::new(patterns.len());
        cell.match_regex(&patterns, &mut matches);
        assert!(matches.get(0));
        assert!(!matches.get(1));
    }

    #[test]
    fn test_ignore_case_follows_locale() {
        let cell = Cell::text_cell("ISPARTA");
        let terms = vec!["ısp".to_string(), "isp".to_string()];

        let mut matches = TermMatches::new(terms.len());
        cell.match_plain_text_ignore_case(&terms, &Locale::parse("tr-TR"), &mut matches);
        assert!(matches.get(0));
        assert!(!matches.get(1));

        let mut matches = TermMatches::new(terms.len());
        cell.match_plain_text_ignore_case(&terms, &Locale::default(), &mut matches);
        assert!(!matches.get(0));
        assert!(matches.get(1));
    }
}
