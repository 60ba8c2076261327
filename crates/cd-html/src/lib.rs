//! HTML tokenization and tree building.

use cd_dom::ClassList;
use cd_dom::Document;
use cd_dom::NodeId;
use cd_dom::StyleMap;

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Parsing never fails; malformed markup degrades to a best-effort tree.
    pub fn parse(&self, input: &str) -> Document {
        build_tree(tokenize(input))
    }
}

#[derive(Debug)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if starts_with(bytes, i, b"<!--") {
            i = skip_comment(bytes, i);
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with(bytes, i, b"</") {
                if let Some((tok, next)) = parse_end_tag(bytes, i) {
                    out.push(tok);
                    i = next;
                    continue;
                }
            } else if starts_with(bytes, i, b"<!") || starts_with(bytes, i, b"<?") {
                i = skip_decl(bytes, i);
                continue;
            } else if let Some((tok, next)) = parse_start_tag(bytes, i) {
                let mut raw_text_tag: Option<String> = None;
                if let Token::Start {
                    name, self_closing, ..
                } = &tok
                {
                    if !*self_closing && is_raw_text_tag(name) {
                        raw_text_tag = Some(name.clone());
                    }
                }

                out.push(tok);
                i = next;

                if let Some(tag_name) = raw_text_tag {
                    let (raw_text, closing_end) = parse_raw_text_until_end_tag(bytes, i, &tag_name);
                    if !raw_text.is_empty() {
                        out.push(Token::Text(raw_text));
                    }

                    if let Some(closing_end) = closing_end {
                        out.push(Token::End { name: tag_name });
                        i = closing_end;
                    } else {
                        i = bytes.len();
                    }
                }

                continue;
            }
        }

        let (txt, next) = parse_text(bytes, i);
        if !txt.is_empty() {
            out.push(Token::Text(txt));
        }
        i = next;
    }

    out
}

fn build_tree(tokens: Vec<Token>) -> Document {
    let mut doc = Document::new();
    let mut stack: Vec<(NodeId, String)> = vec![(doc.root(), "document".to_owned())];
    let mut title: Option<String> = None;

    for token in tokens {
        match token {
            Token::Text(text) => {
                let decoded = decode_entities(&text);
                if let Some((parent, parent_tag)) = stack.last() {
                    if parent_tag == "title" && title.is_none() {
                        let collapsed = collapse_whitespace(&decoded);
                        if !collapsed.is_empty() {
                            title = Some(collapsed);
                        }
                    }
                    let node = doc.create_text(&decoded);
                    doc.append_child(*parent, node);
                }
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let node = doc.create_element(&name);
                apply_attrs(&mut doc, node, attrs);
                if let Some((parent, _)) = stack.last() {
                    doc.append_child(*parent, node);
                }
                if !self_closing && !is_void(&name) {
                    stack.push((node, name));
                }
            }
            Token::End { name } => {
                // Pop until a matching open tag; unmatched end tags that never
                // find one would unwind the whole stack, so probe first.
                if stack.iter().skip(1).any(|(_, tag)| *tag == name) {
                    while stack.len() > 1 {
                        let Some((_, tag)) = stack.pop() else {
                            break;
                        };
                        if tag == name {
                            break;
                        }
                    }
                }
            }
        }
    }

    doc.title = title;
    doc
}

fn apply_attrs(doc: &mut Document, node: NodeId, attrs: Vec<(String, String)>) {
    let Some(el) = doc.element_mut(node) else {
        return;
    };
    for (name, value) in attrs {
        match name.as_str() {
            "id" => el.id = Some(value),
            "class" => el.classes = ClassList::from_attr(&value),
            "style" => el.style = StyleMap::parse_inline(&value),
            _ => el.attrs.push((name, value)),
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0_usize;

    while let Some(rel_amp) = input[cursor..].find('&') {
        let amp = cursor + rel_amp;
        out.push_str(&input[cursor..amp]);

        let rest = &input[(amp + 1)..];
        let Some(rel_semi) = rest.find(';') else {
            out.push('&');
            cursor = amp + 1;
            continue;
        };

        let semi = amp + 1 + rel_semi;
        let entity = &input[(amp + 1)..semi];
        if let Some(decoded) = decode_entity(entity) {
            out.push_str(&decoded);
            cursor = semi + 1;
        } else {
            out.push('&');
            cursor = amp + 1;
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "nbsp" => Some(" ".to_owned()),
        "amp" => Some("&".to_owned()),
        "lt" => Some("<".to_owned()),
        "gt" => Some(">".to_owned()),
        "quot" => Some("\"".to_owned()),
        "apos" => Some("'".to_owned()),
        _ => {
            if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                let value = u32::from_str_radix(hex, 16).ok()?;
                char::from_u32(value).map(|ch| ch.to_string())
            } else if let Some(dec) = entity.strip_prefix('#') {
                let value = dec.parse::<u32>().ok()?;
                char::from_u32(value).map(|ch| ch.to_string())
            } else {
                None
            }
        }
    }
}

fn starts_with(bytes: &[u8], i: usize, pat: &[u8]) -> bool {
    let end = i.saturating_add(pat.len());
    end <= bytes.len() && &bytes[i..end] == pat
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start.saturating_add(4);
    while i + 2 < bytes.len() {
        if bytes[i] == b'-' && bytes[i + 1] == b'-' && bytes[i + 2] == b'>' {
            return i + 3;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_decl(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i < bytes.len() {
        if bytes[i] == b'>' {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn parse_text(bytes: &[u8], start: usize) -> (String, usize) {
    let mut i = start;
    // A `<` that failed to parse as a tag is plain text; always consume it
    // so the scan advances.
    if i < bytes.len() && bytes[i] == b'<' {
        i += 1;
    }
    while i < bytes.len() && bytes[i] != b'<' {
        i += 1;
    }
    (String::from_utf8_lossy(&bytes[start..i]).to_string(), i)
}

fn parse_raw_text_until_end_tag(
    bytes: &[u8],
    start: usize,
    tag_name: &str,
) -> (String, Option<usize>) {
    let tag_bytes = tag_name.as_bytes();
    let mut i = start;

    while i < bytes.len() {
        if bytes[i] != b'<' || i + 2 + tag_bytes.len() > bytes.len() {
            i = i.saturating_add(1);
            continue;
        }
        if bytes[i + 1] != b'/' {
            i = i.saturating_add(1);
            continue;
        }

        let name_start = i + 2;
        let name_end = name_start + tag_bytes.len();
        if !bytes_eq_ignore_ascii_case(&bytes[name_start..name_end], tag_bytes) {
            i = i.saturating_add(1);
            continue;
        }

        let mut close = name_end;
        while close < bytes.len() && bytes[close].is_ascii_whitespace() {
            close = close.saturating_add(1);
        }

        if close < bytes.len() && bytes[close] == b'>' {
            let text = String::from_utf8_lossy(&bytes[start..i]).to_string();
            return (text, Some(close + 1));
        }

        i = i.saturating_add(1);
    }

    (String::from_utf8_lossy(&bytes[start..]).to_string(), None)
}

fn bytes_eq_ignore_ascii_case(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(lhs, rhs)| lhs.eq_ignore_ascii_case(rhs))
}

fn parse_end_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 2;
    skip_spaces(bytes, &mut i);
    let begin = i;
    while i < bytes.len() && is_name_char(bytes[i]) {
        i += 1;
    }
    if i == begin {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[begin..i]).to_ascii_lowercase();
    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    Some((Token::End { name }, i + 1))
}

fn parse_start_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut i = start + 1;
    skip_spaces(bytes, &mut i);
    let begin = i;
    while i < bytes.len() && is_name_char(bytes[i]) {
        i += 1;
    }
    if i == begin {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[begin..i]).to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        skip_spaces(bytes, &mut i);
        if i >= bytes.len() {
            return None;
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' {
            self_closing = true;
            i += 1;
            skip_spaces(bytes, &mut i);
            if i < bytes.len() && bytes[i] == b'>' {
                i += 1;
                break;
            }
            continue;
        }

        let a_start = i;
        while i < bytes.len() && is_name_char(bytes[i]) {
            i += 1;
        }
        if i == a_start {
            while i < bytes.len() && bytes[i] != b'>' {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
            break;
        }

        let a_name = String::from_utf8_lossy(&bytes[a_start..i]).to_ascii_lowercase();
        skip_spaces(bytes, &mut i);

        let mut val = String::new();
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            skip_spaces(bytes, &mut i);
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let q = bytes[i];
                i += 1;
                let v_start = i;
                while i < bytes.len() && bytes[i] != q {
                    i += 1;
                }
                val = String::from_utf8_lossy(&bytes[v_start..i]).to_string();
                if i < bytes.len() && bytes[i] == q {
                    i += 1;
                }
            } else {
                let v_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'>'
                    && bytes[i] != b'/'
                {
                    i += 1;
                }
                val = String::from_utf8_lossy(&bytes[v_start..i]).to_string();
            }
        }

        attrs.push((a_name, decode_entities(&val)));
    }

    Some((
        Token::Start {
            name,
            attrs,
            self_closing,
        },
        i,
    ))
}

fn skip_spaces(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
