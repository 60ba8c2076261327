//! Inline style declarations (the `style` attribute).

/// Ordered inline-style declaration list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    declarations: Vec<(String, String)>,
}

impl StyleMap {
    /// Parses a full cssText string. Splitting is string-literal aware so
    /// values such as `url("a;b")` survive intact.
    pub fn parse_inline(css_text: &str) -> Self {
        let mut map = Self::default();
        for declaration in split_top_level(css_text, ';') {
            let trimmed = declaration.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(colon_idx) = find_top_level_colon(trimmed) else {
                continue;
            };

            let name = normalize_ws(trimmed[..colon_idx].trim());
            let value = normalize_ws(trimmed[colon_idx + 1..].trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }

            map.set(&name, &value);
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.declarations.iter_mut().find(|(key, _)| key == name) {
            entry.1 = value.to_owned();
        } else {
            self.declarations.push((name.to_owned(), value.to_owned()));
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.declarations.retain(|(key, _)| key != name);
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_inline_string(&self) -> String {
        self.declarations
            .iter()
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn normalize_ws(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_top_level(input: &str, delimiter: char) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut idx = 0_usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    let mut paren_depth = 0_u32;

    while idx < bytes.len() {
        let byte = bytes[idx];

        if in_single {
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == b'\'' {
                in_single = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        if in_double {
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == b'"' {
                in_double = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        match byte {
            b'\'' => in_single = true,
            b'"' => in_double = true,
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            _ => {
                if byte == delimiter as u8 && paren_depth == 0 {
                    parts.push(&input[start..idx]);
                    start = idx.saturating_add(1);
                }
            }
        }

        idx = idx.saturating_add(1);
    }

    if start <= input.len() {
        parts.push(&input[start..]);
    }

    parts
}

fn find_top_level_colon(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut idx = 0_usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    let mut paren_depth = 0_u32;

    while idx < bytes.len() {
        let byte = bytes[idx];

        if in_single {
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == b'\'' {
                in_single = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        if in_double {
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == b'"' {
                in_double = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        match byte {
            b'\'' => in_single = true,
            b'"' => in_double = true,
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b':' if paren_depth == 0 => return Some(idx),
            _ => {}
        }

        idx = idx.saturating_add(1);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::StyleMap;

    #[test]
    fn parses_multiline_css_text() {
        let map = StyleMap::parse_inline(
            "\n position: fixed;\n inset: 0;\n background: rgba(0,0,0,0.9);\n opacity: 0;\n",
        );
        assert_eq!(map.get("position"), Some("fixed"));
        assert_eq!(map.get("background"), Some("rgba(0,0,0,0.9)"));
        assert_eq!(map.get("opacity"), Some("0"));
    }

    #[test]
    fn keeps_semicolons_inside_strings_and_functions() {
        let map =
            StyleMap::parse_inline(r#"background-image:url("data:image/svg+xml;utf8,x");color:red"#);
        assert_eq!(
            map.get("background-image"),
            Some(r#"url("data:image/svg+xml;utf8,x")"#)
        );
        assert_eq!(map.get("color"), Some("red"));
    }

    #[test]
    fn set_overwrites_in_place_and_round_trips() {
        let mut map = StyleMap::parse_inline("opacity:0;transform:scale(0.8)");
        map.set("opacity", "1");
        map.set("transform", "scale(1)");
        assert_eq!(map.to_inline_string(), "opacity:1;transform:scale(1)");
        map.remove("opacity");
        assert_eq!(map.to_inline_string(), "transform:scale(1)");
    }

    #[test]
    fn skips_malformed_declarations() {
        let map = StyleMap::parse_inline("color red; ;border:none;");
        assert_eq!(map.get("color"), None);
        assert_eq!(map.get("border"), Some("none"));
    }
}
