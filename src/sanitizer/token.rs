//! Minimal HTML tokenizer.
//!
//! Splits input into text, start tags, end tags and discarded markup. It does
//! not build a tree or decode entities. Quoted attribute values may contain
//! `>`, and a tag cut off by the end of input is discarded as a whole, which
//! is all the whitelist filter needs to work on structured tokens instead of
//! regex captures.

/// A single attribute as written in the source. Names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attr<'a> {
    pub name: String,
    pub value: Option<&'a str>,
}

/// A start tag. Names are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag<'a> {
    pub name: String,
    pub attrs: Vec<Attr<'a>>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Text between tags. Never contains `<`.
    Text(&'a str),
    /// A `<` that does not open a tag.
    Lt,
    StartTag(Tag<'a>),
    /// An end tag, by lowercased name.
    EndTag(String),
    /// Comments, declarations, processing instructions and tags cut off by
    /// the end of input.
    Discarded,
}

fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

pub(crate) struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn scan_while(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        let bytes = self.src.as_bytes();
        let mut i = from;
        while i < bytes.len() && pred(bytes[i]) {
            i += 1;
        }
        i
    }

    /// Move past `>` starting at `from`, or to the end of input.
    fn skip_past_gt(&mut self, from: usize) {
        self.pos = self.src[from..]
            .find('>')
            .map_or(self.src.len(), |i| from + i + 1);
    }

    /// Skip raw text up to (not including) the matching `</name` end tag, or
    /// to the end of input if there is none.
    pub fn skip_raw_text(&mut self, name: &str) {
        let bytes = self.src.as_bytes();
        let mut from = self.pos;
        while let Some(i) = self.src[from..].find("</") {
            let at = from + i;
            let name_start = at + 2;
            let name_end = name_start + name.len();
            let name_matches = name_end <= bytes.len()
                && bytes[name_start..name_end].eq_ignore_ascii_case(name.as_bytes());
            let terminated = bytes
                .get(name_end)
                .is_none_or(|b| is_space(*b) || *b == b'/' || *b == b'>');
            if name_matches && terminated {
                self.pos = at;
                return;
            }
            from = name_start;
        }
        self.pos = self.src.len();
    }

    /// Discard everything that is left.
    pub fn skip_to_end(&mut self) {
        self.pos = self.src.len();
    }

    fn discard_rest(&mut self) -> Token<'a> {
        self.skip_to_end();
        Token::Discarded
    }

    /// Attributes and self-closing flag up to and including `>`.
    /// `None` when the input ends first.
    fn tag_body(&mut self) -> Option<(Vec<Attr<'a>>, bool)> {
        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            self.pos = self.scan_while(self.pos, is_space);
            match self.peek()? {
                b'>' => {
                    self.pos += 1;
                    return Some((attrs, self_closing));
                }
                b'/' => {
                    self.pos += 1;
                    self_closing = self.peek() == Some(b'>');
                }
                _ => {
                    attrs.push(self.attribute()?);
                    self_closing = false;
                }
            }
        }
    }

    fn attribute(&mut self) -> Option<Attr<'a>> {
        let src = self.src;
        let name_start = self.pos;
        // the first character is part of the name even if it is `=`
        let name_end = self.scan_while(name_start + 1, |b| {
            !is_space(b) && !matches!(b, b'/' | b'>' | b'=')
        });
        let name = src[name_start..name_end].to_ascii_lowercase();
        self.pos = self.scan_while(name_end, is_space);

        if self.peek() != Some(b'=') {
            return Some(Attr { name, value: None });
        }
        self.pos = self.scan_while(self.pos + 1, is_space);

        let value = match self.peek()? {
            quote @ (b'"' | b'\'') => {
                let start = self.pos + 1;
                let end = start + src[start..].find(quote as char)?;
                self.pos = end + 1;
                &src[start..end]
            }
            b'>' => "",
            _ => {
                let start = self.pos;
                self.pos = self.scan_while(start, |b| !is_space(b) && b != b'>');
                &src[start..self.pos]
            }
        };
        Some(Attr {
            name,
            value: Some(value),
        })
    }

    fn tag_name(&mut self, start: usize) -> String {
        let end = self.scan_while(start, |b| !is_space(b) && b != b'/' && b != b'>');
        self.pos = end;
        self.src[start..end].to_ascii_lowercase()
    }

    fn start_tag(&mut self) -> Token<'a> {
        let name = self.tag_name(self.pos + 1);
        match self.tag_body() {
            Some((attrs, self_closing)) => Token::StartTag(Tag {
                name,
                attrs,
                self_closing,
            }),
            None => self.discard_rest(),
        }
    }

    fn end_tag(&mut self) -> Token<'a> {
        let after_slash = self.pos + 2;
        match self.src.as_bytes().get(after_slash).copied() {
            Some(b) if b.is_ascii_alphabetic() => {
                let name = self.tag_name(after_slash);
                match self.tag_body() {
                    Some(_) => Token::EndTag(name),
                    None => self.discard_rest(),
                }
            }
            _ => {
                self.skip_past_gt(after_slash);
                Token::Discarded
            }
        }
    }

    fn comment_or_declaration(&mut self) -> Token<'a> {
        let rest = &self.src[self.pos..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let body_start = self.pos + 4;
            self.pos = if body.starts_with('>') {
                body_start + 1
            } else if body.starts_with("->") {
                body_start + 2
            } else {
                body.find("-->")
                    .map_or(self.src.len(), |i| body_start + i + 3)
            };
        } else {
            self.skip_past_gt(self.pos + 2);
        }
        Token::Discarded
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        let start = self.pos;
        let bytes = src.as_bytes();
        let first = *bytes.get(start)?;

        if first != b'<' {
            let end = src[start..].find('<').map_or(src.len(), |i| start + i);
            self.pos = end;
            return Some(Token::Text(&src[start..end]));
        }

        let token = match bytes.get(start + 1).copied() {
            Some(b) if b.is_ascii_alphabetic() => self.start_tag(),
            Some(b'/') => self.end_tag(),
            Some(b'!') => self.comment_or_declaration(),
            Some(b'?') => {
                self.skip_past_gt(start + 2);
                Token::Discarded
            }
            _ => {
                self.pos = start + 1;
                Token::Lt
            }
        };
        Some(token)
    }
}
