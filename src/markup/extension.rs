//! Markup-extension syntax in attribute values.
//!
//! ```text
//! {x:Reference __Reference_ID_0}
//! {p:Point 1, 2}
//! {p:Pair First='a, b', Second={p:Point 3, 4}}
//! ```

/// A parsed `{Type args}` expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Extension {
    /// Type name as written, possibly prefixed.
    pub type_name: String,
    pub positional: Vec<ExtArg>,
    pub named: Vec<(String, ExtArg)>,
}

/// An argument of an extension.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExtArg {
    Text(String),
    Extension(Extension),
}

impl Extension {
    /// `(prefix, local)` of the type name.
    pub fn split_name(&self) -> (Option<&str>, &str) {
        match self.type_name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, &self.type_name),
        }
    }
}

/// Parse a whole attribute value as an extension nested at most
/// `max_depth` levels.
pub(crate) fn parse(text: &str, max_depth: usize) -> Result<Extension, String> {
    let mut cursor = Cursor {
        chars: text.chars().collect(),
        pos: 0,
        depth: 0,
        max_depth,
    };
    let ext = cursor.extension()?;
    cursor.skip_ws();
    if cursor.pos < cursor.chars.len() {
        return Err(format!("unexpected text after markup extension at offset {}", cursor.pos));
    }
    Ok(ext)
}

/// Format an extension with positional text arguments.
pub(crate) fn format(type_name: &str, args: &[String]) -> String {
    let mut out = format!("{{{type_name}");
    for (i, arg) in args.iter().enumerate() {
        out.push_str(if i == 0 { " " } else { ", " });
        out.push_str(&quote(arg));
    }
    out.push('}');
    out
}

fn quote(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg.trim() != arg
        || arg.chars().any(|c| matches!(c, ',' | '{' | '}' | '=' | '\'' | '"' | '\\'));
    if !needs_quotes {
        return arg.to_string();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for c in arg.chars() {
        if matches!(c, '\'' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{expected}', found '{c}' at offset {}", self.pos - 1)),
            None => Err(format!("expected '{expected}', found end of value")),
        }
    }

    fn extension(&mut self) -> Result<Extension, String> {
        if self.depth >= self.max_depth {
            return Err(format!(
                "markup extension nested deeper than {} levels",
                self.max_depth
            ));
        }
        self.depth += 1;
        let ext = self.extension_body();
        self.depth -= 1;
        ext
    }

    fn extension_body(&mut self) -> Result<Extension, String> {
        self.skip_ws();
        self.expect('{')?;
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && c != '}' && c != ',')
        {
            self.pos += 1;
        }
        let type_name: String = self.chars[start..self.pos].iter().collect();
        if type_name.is_empty() {
            return Err("markup extension has no type name".to_string());
        }

        let mut ext = Extension {
            type_name,
            positional: Vec::new(),
            named: Vec::new(),
        };
        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(ext);
        }
        loop {
            self.argument(&mut ext)?;
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(ext),
                Some(c) => return Err(format!("unexpected '{c}' in markup extension")),
                None => return Err("unterminated markup extension".to_string()),
            }
        }
    }

    fn argument(&mut self, ext: &mut Extension) -> Result<(), String> {
        self.skip_ws();
        match self.peek() {
            Some('{') => {
                let nested = self.extension()?;
                ext.positional.push(ExtArg::Extension(nested));
            }
            Some('\'' | '"') => {
                let text = self.quoted()?;
                ext.positional.push(ExtArg::Text(text));
            }
            _ => {
                let token = self.bare(true)?;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    let value = self.value()?;
                    ext.named.push((token.trim().to_string(), value));
                } else {
                    ext.positional.push(ExtArg::Text(token.trim().to_string()));
                }
            }
        }
        Ok(())
    }

    fn value(&mut self) -> Result<ExtArg, String> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.extension().map(ExtArg::Extension),
            Some('\'' | '"') => self.quoted().map(ExtArg::Text),
            _ => self.bare(false).map(|t| ExtArg::Text(t.trim().to_string())),
        }
    }

    /// Unquoted text up to `,` or `}` (and `=` when looking for a name).
    fn bare(&mut self, stop_at_eq: bool) -> Result<String, String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            match c {
                ',' | '}' => break,
                '=' if stop_at_eq => break,
                '{' => return Err("unexpected '{' in markup extension argument".to_string()),
                '\\' => {
                    self.pos += 1;
                    out.extend(self.bump());
                }
                c => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(out)
    }

    fn quoted(&mut self) -> Result<String, String> {
        let Some(quote) = self.bump() else {
            return Err("expected quoted value".to_string());
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => out.extend(self.bump()),
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated quoted value in markup extension".to_string()),
            }
        }
    }
}
