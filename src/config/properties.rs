//! `.properties` file parsing.

use indexmap::IndexMap;

use crate::config::loader::PropertySourceLoader;
use crate::config::property_source::PropertySource;
use crate::config::resource::Resource;
use crate::error::Result;

/// Parses `.properties` files into a single property source.
///
/// # Supported Formats
///
/// - Simple: `key=value` or `key: value`
/// - Whitespace separator: `key value`
/// - Quoted: `key="value with spaces"` or `key='single quoted'`
/// - Empty: `key=`
/// - Comments: `# comment` or `! comment`
/// - Continuation: a trailing `\` joins the next line
/// - Escapes: `\=`, `\:`, `\ `, `\t`, `\n`, `\\`
///
/// # Example
///
/// ```
/// use autowire::config::PropertiesPropertySourceLoader;
///
/// let content = r#"
/// # Server
/// server.port=8080
/// server.name: "edge node"
/// autowire.modules=web.Server,\
///     data.Pool
/// "#;
///
/// let props = PropertiesPropertySourceLoader::parse(content);
/// assert_eq!(props.get("server.port"), Some(&"8080".to_string()));
/// assert_eq!(props.get("server.name"), Some(&"edge node".to_string()));
/// assert_eq!(props.get("autowire.modules"), Some(&"web.Server,data.Pool".to_string()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesPropertySourceLoader;

impl PropertiesPropertySourceLoader {
    /// Parse properties content, keeping key order. Later keys win.
    pub fn parse(content: &str) -> IndexMap<String, String> {
        let mut props = IndexMap::new();

        for line in logical_lines(content) {
            let line = line.trim_start();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = Self::parse_line(line);
            props.insert(key, value);
        }

        props
    }

    /// Split a line at the first unescaped `=`, `:` or whitespace.
    fn parse_line(line: &str) -> (String, String) {
        let mut key = String::new();
        let mut chars = line.char_indices().peekable();
        let mut rest = "";

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        key.push(unescape(escaped));
                    }
                }
                '=' | ':' => {
                    rest = &line[i + 1..];
                    break;
                }
                c if c.is_whitespace() => {
                    let tail = line[i..].trim_start();
                    rest = tail
                        .strip_prefix('=')
                        .or_else(|| tail.strip_prefix(':'))
                        .unwrap_or(tail);
                    break;
                }
                c => key.push(c),
            }
        }

        (key, Self::unquote(&unescape_value(rest.trim())))
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    }
}

impl PropertySourceLoader for PropertiesPropertySourceLoader {
    fn file_extensions(&self) -> &[&str] {
        &["properties"]
    }

    fn load(&self, name: &str, resource: &Resource) -> Result<Vec<PropertySource>> {
        let properties = Self::parse(&resource.content);
        if properties.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![PropertySource::from_properties(name, properties)])
    }
}

/// Join physical lines ending in an odd number of backslashes.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in content.lines() {
        let piece = match current {
            Some(_) => raw.trim_start(),
            None => raw,
        };

        let trailing = piece.chars().rev().take_while(|c| *c == '\\').count();
        let continues = trailing % 2 == 1;
        let piece = if continues {
            &piece[..piece.len() - 1]
        } else {
            piece
        };

        let line = current.get_or_insert_with(String::new);
        line.push_str(piece);

        if !continues {
            lines.extend(current.take());
        }
    }
    lines.extend(current);

    lines
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(unescape(escaped));
            }
        } else {
            out.push(c);
        }
    }
    out
}
