//! Cell content fragments
//!
//! A cell's content is a list of [`Node`]s supplied by whoever renders the
//! table. The grid engine only needs three things from it: the HTML markup to
//! send to the browser, the plain text used for sorting and searching, and the
//! out-of-band resources ([`SideArtifacts`]) that must not be repeated inside
//! every cell.

use crate::error::ContentError;
use serde::{Deserialize, Serialize};

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "col", "wbr"];

/// One node of a content fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Character data, escaped on output.
    Text(String),
    /// CDATA section, written verbatim.
    CData(String),
    /// An element with ordered attributes and children.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
}

impl Node {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Create an empty element
    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. Has no effect on text and CDATA nodes.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Append a child. Has no effect on text and CDATA nodes.
    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    fn tag_is(&self, name: &str) -> bool {
        matches!(self, Node::Element { tag, .. } if tag.eq_ignore_ascii_case(name))
    }
}

/// Out-of-band resources pulled out of cell content while rendering.
///
/// Entries keep first-seen order; adding an entry that is already present is
/// a no-op, so merging the artifacts of a whole page of cells never produces
/// duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SideArtifacts {
    #[serde(rename = "externalcss", skip_serializing_if = "Vec::is_empty")]
    external_css: Vec<String>,
    #[serde(rename = "externaljs", skip_serializing_if = "Vec::is_empty")]
    external_js: Vec<String>,
    #[serde(rename = "inlinecss", skip_serializing_if = "Vec::is_empty")]
    inline_css: Vec<String>,
    #[serde(rename = "inlinejs", skip_serializing_if = "Vec::is_empty")]
    inline_js: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

impl SideArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.external_css.is_empty()
            && self.external_js.is_empty()
            && self.inline_css.is_empty()
            && self.inline_js.is_empty()
    }

    pub fn add_external_css(&mut self, href: &str) {
        push_unique(&mut self.external_css, href);
    }

    pub fn add_external_js(&mut self, src: &str) {
        push_unique(&mut self.external_js, src);
    }

    pub fn add_inline_css(&mut self, code: &str) {
        push_unique(&mut self.inline_css, code);
    }

    pub fn add_inline_js(&mut self, code: &str) {
        push_unique(&mut self.inline_js, code);
    }

    pub fn external_css(&self) -> &[String] {
        &self.external_css
    }

    pub fn external_js(&self) -> &[String] {
        &self.external_js
    }

    pub fn inline_css(&self) -> &[String] {
        &self.inline_css
    }

    pub fn inline_js(&self) -> &[String] {
        &self.inline_js
    }

    /// Merge another set into this one, skipping entries already present
    pub fn merge(&mut self, other: &SideArtifacts) {
        for href in &other.external_css {
            self.add_external_css(href);
        }
        for src in &other.external_js {
            self.add_external_js(src);
        }
        for code in &other.inline_css {
            self.add_inline_css(code);
        }
        for code in &other.inline_js {
            self.add_inline_js(code);
        }
    }
}

/// Markup and side artifacts derived from one content fragment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub markup: String,
    pub side: SideArtifacts,
}

/// Render a node list to HTML, extracting out-of-band nodes
///
/// `<script>`, `<style>` and stylesheet `<link>` elements are removed from the
/// markup and recorded in the returned [`SideArtifacts`] instead.
///
/// # Errors
/// * [`ContentError::InvalidTagName`] / [`ContentError::InvalidAttributeName`]
///   if a name cannot be written as HTML
pub fn render(nodes: &[Node]) -> Result<Rendered, ContentError> {
    let mut rendered = Rendered::default();
    for node in nodes {
        write_node(node, &mut rendered.markup, &mut rendered.side)?;
    }
    Ok(rendered)
}

/// Plain text of a node list, used for sorting and searching
///
/// A fragment that is a single whitespace-only text node has no text at all.
pub fn text_content(nodes: &[Node]) -> String {
    if let [Node::Text(text)] = nodes {
        if text.trim().is_empty() {
            return String::new();
        }
        return text.clone();
    }

    let mut out = String::new();
    for node in nodes {
        collect_text(node, &mut out);
    }
    out
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) | Node::CData(text) => out.push_str(text),
        Node::Element { children, .. } => {
            if node.tag_is("script") || node.tag_is("style") {
                return;
            }
            for child in children {
                collect_text(child, out);
            }
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
}

fn attr_value<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Record the node as a side artifact if it is out-of-band. Returns true if
/// the node was consumed.
fn extract_out_of_band(node: &Node, side: &mut SideArtifacts) -> bool {
    let Node::Element {
        attrs, children, ..
    } = node
    else {
        return false;
    };

    if node.tag_is("script") {
        match attr_value(attrs, "src") {
            Some(src) => side.add_external_js(src),
            None => side.add_inline_js(&raw_text(children)),
        }
        return true;
    }
    if node.tag_is("style") {
        side.add_inline_css(&raw_text(children));
        return true;
    }
    if node.tag_is("link") {
        let is_stylesheet = attr_value(attrs, "rel")
            .map(|rel| rel.eq_ignore_ascii_case("stylesheet"))
            .unwrap_or(false);
        if let (true, Some(href)) = (is_stylesheet, attr_value(attrs, "href")) {
            side.add_external_css(href);
            return true;
        }
    }
    false
}

fn raw_text(children: &[Node]) -> String {
    let mut out = String::new();
    for child in children {
        match child {
            Node::Text(text) | Node::CData(text) => out.push_str(text),
            Node::Element { children, .. } => out.push_str(&raw_text(children)),
        }
    }
    out
}

fn write_node(node: &Node, out: &mut String, side: &mut SideArtifacts) -> Result<(), ContentError> {
    match node {
        Node::Text(text) => escape_into(text, false, out),
        Node::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        Node::Element {
            tag,
            attrs,
            children,
        } => {
            if !is_valid_name(tag) {
                return Err(ContentError::InvalidTagName(tag.clone()));
            }
            if extract_out_of_band(node, side) {
                return Ok(());
            }

            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                if !is_valid_name(name) {
                    return Err(ContentError::InvalidAttributeName(name.clone()));
                }
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.iter().any(|void| tag.eq_ignore_ascii_case(void)) {
                return Ok(());
            }
            for child in children {
                write_node(child, out, side)?;
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
    Ok(())
}

fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escapes_text_and_attributes() {
        let nodes = vec![
            Node::element("a")
                .with_attr("href", "/x?a=1&b=\"2\"")
                .with_child(Node::text("Tom & <Jerry>")),
        ];
        let rendered = render(&nodes).unwrap();
        assert_eq!(
            rendered.markup,
            "<a href=\"/x?a=1&amp;b=&quot;2&quot;\">Tom &amp; &lt;Jerry&gt;</a>"
        );
        assert!(rendered.side.is_empty());
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let nodes = vec![Node::text("a"), Node::element("br"), Node::text("b")];
        assert_eq!(render(&nodes).unwrap().markup, "a<br>b");
    }

    #[test]
    fn test_scripts_and_styles_are_extracted() {
        let nodes = vec![
            Node::element("span").with_child(Node::text("x")),
            Node::element("script").with_attr("src", "/js/a.js"),
            Node::element("script").with_child(Node::text("init();")),
            Node::element("style").with_child(Node::text(".x{}")),
            Node::element("link")
                .with_attr("rel", "stylesheet")
                .with_attr("href", "/css/a.css"),
        ];
        let rendered = render(&nodes).unwrap();
        assert_eq!(rendered.markup, "<span>x</span>");
        assert_eq!(rendered.side.external_js(), ["/js/a.js"]);
        assert_eq!(rendered.side.inline_js(), ["init();"]);
        assert_eq!(rendered.side.inline_css(), [".x{}"]);
        assert_eq!(rendered.side.external_css(), ["/css/a.css"]);
    }

    #[test]
    fn test_invalid_names_fail() {
        let bad_tag = vec![Node::element("a b")];
        assert_eq!(
            render(&bad_tag),
            Err(ContentError::InvalidTagName("a b".to_string()))
        );

        let bad_attr = vec![Node::element("a").with_attr("on click", "x")];
        assert_eq!(
            render(&bad_attr),
            Err(ContentError::InvalidAttributeName("on click".to_string()))
        );
    }

    #[test]
    fn test_text_content() {
        assert_eq!(text_content(&[Node::text("   \n")]), "");
        assert_eq!(text_content(&[Node::text(" a ")]), " a ");
        assert_eq!(text_content(&[]), "");

        let nodes = vec![
            Node::element("b").with_child(Node::text("bold")),
            Node::text(" and "),
            Node::CData("raw".to_string()),
            Node::element("script").with_child(Node::text("ignored()")),
        ];
        assert_eq!(text_content(&nodes), "bold and raw");
    }

    #[test]
    fn test_merge_skips_duplicates() {
        let mut first = SideArtifacts::new();
        first.add_external_js("/a.js");
        first.add_inline_js("x();");

        let mut second = SideArtifacts::new();
        second.add_external_js("/a.js");
        second.add_external_js("/b.js");
        second.add_inline_js("x();");

        first.merge(&second);
        assert_eq!(first.external_js(), ["/a.js", "/b.js"]);
        assert_eq!(first.inline_js(), ["x();"]);
    }

    #[test]
    fn test_side_artifacts_serialize_only_present_keys() {
        let mut side = SideArtifacts::new();
        side.add_inline_js("go();");
        let json = serde_json::to_value(&side).unwrap();
        assert_eq!(json, serde_json::json!({ "inlinejs": ["go();"] }));
    }
}
