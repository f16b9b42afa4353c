//! Tolerant restricted-HTML tokenizer and tree builder.
//!
//! The input is a fragment produced by a rich-text editor. Nothing here
//! rejects malformed markup: stray `<` is text, unmatched closing tags are
//! ignored, unclosed elements are closed at the end of input. The only
//! failure is nesting deeper than the configured limit.
//!
//! Unknown elements are kept so the normalizer can dissolve them, except
//! `script` and `style`, whose content is code rather than text and is
//! dropped here.

use crate::error::{Error, Result};

/// A node of the parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with a lowercase tag name. Attributes are not kept.
    Element {
        /// Lowercase tag name
        tag: String,
        /// Child nodes in document order
        children: Vec<Node>,
    },
    /// Decoded character data
    Text(String),
}

impl Node {
    /// Tag name for elements.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text(_) => None,
        }
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element { tag, children } => {
                if tag == "br" {
                    out.push('\n');
                }
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "wbr", "col", "area", "base", "source",
];

/// Elements whose content is dropped entirely.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug)]
enum Token {
    Open { tag: String, self_closing: bool },
    Close { tag: String },
    Text(String),
}

/// Parse a fragment into its top-level nodes.
pub fn parse_fragment(input: &str, max_depth: usize) -> Result<Vec<Node>> {
    let tokens = tokenize(input);
    build_tree(tokens, max_depth)
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        text.push_str(&rest[..pos]);
        let after = &rest[pos..];

        if let Some(stripped) = after.strip_prefix("<!--") {
            // Comment; an unterminated one swallows the rest.
            rest = match stripped.find("-->") {
                Some(end) => &stripped[end + 3..],
                None => "",
            };
            continue;
        }

        match parse_tag(after) {
            Some((token, consumed)) => {
                flush_text(&mut text, &mut tokens);
                rest = &after[consumed..];

                if let Token::Open {
                    ref tag,
                    self_closing: false,
                } = token
                {
                    if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                        let close = format!("</{}", tag);
                        rest = match find_ascii_ci(rest, &close) {
                            Some(end) => match rest[end..].find('>') {
                                Some(gt) => &rest[end + gt + 1..],
                                None => "",
                            },
                            None => "",
                        };
                        continue;
                    }
                }
                match token {
                    Token::Open { ref tag, .. } if tag.starts_with('!') || tag.starts_with('?') => {}
                    other => tokens.push(other),
                }
            }
            None => {
                text.push('<');
                rest = &after[1..];
            }
        }
    }
    text.push_str(rest);
    flush_text(&mut text, &mut tokens);
    tokens
}

fn flush_text(text: &mut String, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Text(decode_entities(text)));
        text.clear();
    }
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Parse one tag at the start of `s` (which begins with `<`).
///
/// Returns `None` when the `<` does not start a tag.
fn parse_tag(s: &str) -> Option<(Token, usize)> {
    let bytes = s.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    match bytes.get(i) {
        Some(b) if b.is_ascii_alphabetic() => {}
        Some(b'!') | Some(b'?') if !closing => {}
        _ => return None,
    }
    while let Some(b) = bytes.get(i) {
        if b.is_ascii_alphanumeric() || *b == b'!' || *b == b'?' || *b == b'-' || *b == b':' {
            i += 1;
        } else {
            break;
        }
    }
    let tag = s[name_start..i].to_ascii_lowercase();

    // Skip attributes, honoring quotes.
    let mut quote: Option<u8> = None;
    let mut last_non_space = 0u8;
    while let Some(&b) = bytes.get(i) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                let self_closing = last_non_space == b'/';
                let token = if closing {
                    Token::Close { tag }
                } else {
                    Token::Open { tag, self_closing }
                };
                return Some((token, i + 1));
            }
            None => {}
        }
        if !b.is_ascii_whitespace() {
            last_non_space = b;
        }
        i += 1;
    }
    None
}

fn build_tree(tokens: Vec<Token>, max_depth: usize) -> Result<Vec<Node>> {
    // Each stack entry is an open element; index 0 is the fragment root.
    let mut stack: Vec<(String, Vec<Node>)> = vec![(String::new(), Vec::new())];

    for token in tokens {
        match token {
            Token::Text(t) => {
                if let Some((_, children)) = stack.last_mut() {
                    children.push(Node::Text(t));
                }
            }
            Token::Open { tag, self_closing } => {
                if VOID_ELEMENTS.contains(&tag.as_str()) || self_closing {
                    if let Some((_, children)) = stack.last_mut() {
                        children.push(Node::Element {
                            tag,
                            children: Vec::new(),
                        });
                    }
                    continue;
                }
                if let Some(open) = implicitly_closed_by(&stack, &tag) {
                    close_to(&mut stack, open);
                }
                if stack.len() > max_depth {
                    return Err(Error::Markup(format!(
                        "nesting deeper than {} elements",
                        max_depth
                    )));
                }
                stack.push((tag, Vec::new()));
            }
            Token::Close { tag } => {
                if let Some(open) = stack.iter().rposition(|(t, _)| *t == tag) {
                    if open > 0 {
                        close_to(&mut stack, open);
                    }
                }
            }
        }
    }

    close_to(&mut stack, 1);
    Ok(stack.pop().map(|(_, children)| children).unwrap_or_default())
}

/// Index of an open element that a new `tag` closes implicitly.
fn implicitly_closed_by(stack: &[(String, Vec<Node>)], tag: &str) -> Option<usize> {
    let (closes, boundaries): (&[&str], &[&str]) = match tag {
        "p" | "ul" | "ol" | "h2" | "h3" => (&["p"], &["li", "ul", "ol", "td", "div"]),
        "li" => (&["li"], &["ul", "ol"]),
        _ => return None,
    };
    for (idx, (open, _)) in stack.iter().enumerate().skip(1).rev() {
        if closes.contains(&open.as_str()) {
            return Some(idx);
        }
        if boundaries.contains(&open.as_str()) {
            return None;
        }
    }
    None
}

/// Close every element from the top of the stack down to `index`.
fn close_to(stack: &mut Vec<(String, Vec<Node>)>, index: usize) {
    while stack.len() > index.max(1) {
        if let Some((tag, children)) = stack.pop() {
            if let Some((_, parent)) = stack.last_mut() {
                parent.push(Node::Element { tag, children });
            }
        }
    }
}

/// Decode character references in text.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let end = after
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i);
        let decoded = end.and_then(|end| decode_reference(&after[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "laquo" => '«',
        "raquo" => '»',
        "bdquo" => '„',
        "ldquo" => '“',
        "rdquo" => '”',
        "lsquo" => '‘',
        "rsquo" => '’',
        "copy" => '©',
        "deg" => '°',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, children: Vec<Node>) -> Node {
        Node::Element {
            tag: tag.to_string(),
            children,
        }
    }

    fn text(t: &str) -> Node {
        Node::Text(t.to_string())
    }

    #[test]
    fn test_parse_simple_paragraph() {
        let nodes = parse_fragment("<p>Hello <b>world</b></p>", 64).unwrap();
        assert_eq!(
            nodes,
            vec![el("p", vec![text("Hello "), el("b", vec![text("world")])])]
        );
    }

    #[test]
    fn test_attributes_and_case() {
        let nodes = parse_fragment(r#"<P class="x>y">a</P>"#, 64).unwrap();
        assert_eq!(nodes, vec![el("p", vec![text("a")])]);
    }

    #[test]
    fn test_void_and_self_closing() {
        let nodes = parse_fragment("a<br>b<br/>c", 64).unwrap();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[1].tag(), Some("br"));
        assert_eq!(nodes[3].tag(), Some("br"));
    }

    #[test]
    fn test_unclosed_and_unmatched_tags() {
        let nodes = parse_fragment("<p>one<p>two</span>", 64).unwrap();
        assert_eq!(
            nodes,
            vec![el("p", vec![text("one")]), el("p", vec![text("two")])]
        );
    }

    #[test]
    fn test_implicit_li_close() {
        let nodes = parse_fragment("<ul><li>a<li>b</ul>", 64).unwrap();
        assert_eq!(
            nodes,
            vec![el(
                "ul",
                vec![el("li", vec![text("a")]), el("li", vec![text("b")])]
            )]
        );
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let nodes = parse_fragment("a < b", 64).unwrap();
        assert_eq!(nodes, vec![text("a < b")]);
    }

    #[test]
    fn test_script_and_comment_dropped() {
        let nodes = parse_fragment("<p>x<!-- note --><script>alert(1)</script>y</p>", 64).unwrap();
        assert_eq!(nodes, vec![el("p", vec![text("x"), text("y")])]);

        // Other unknown elements stay in the tree with their text
        let nodes = parse_fragment("<style>p{}</style><font>z</font>", 64).unwrap();
        assert_eq!(nodes, vec![el("font", vec![text("z")])]);
    }

    #[test]
    fn test_depth_limit() {
        let html = "<span>".repeat(10);
        assert!(parse_fragment(&html, 5).is_err());
        assert!(parse_fragment(&html, 20).is_ok());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#537;&#x21B;"), "șț");
        assert_eq!(decode_entities("&unknown; &"), "&unknown; &");
        assert_eq!(decode_entities("x&nbsp;y"), "x y");
    }

    #[test]
    fn test_text_content_includes_breaks() {
        let nodes = parse_fragment("<p>a<br>b</p>", 64).unwrap();
        assert_eq!(nodes[0].text_content(), "a\nb");
    }
}
