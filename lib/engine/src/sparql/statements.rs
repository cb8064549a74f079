//! Splits SPARQL Update text into its top-level statements.
//!
//! spargebra rewrites `ADD`, `COPY`, and `MOVE` into `DROP` and modify operations, which loses
//! the `SILENT` flag of `ADD` and `COPY` and the check for a missing source graph. The scanner only
//! recognizes enough of the grammar to find these statements again. The text itself is still
//! validated by spargebra.

/// A top-level statement of an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statement<'a> {
    /// The `PREFIX` and `BASE` declarations in effect for the statement, including its own.
    pub prologue: String,
    /// The statement without its own declarations. Empty if the statement only has declarations.
    pub body: &'a str,
    /// Set if the statement is an `ADD`, `COPY`, or `MOVE`.
    pub transfer: Option<GraphTransfer<'a>>,
}

/// A parsed `ADD`, `COPY`, or `MOVE` statement. Graph references are kept as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GraphTransfer<'a> {
    pub kind: TransferKind,
    pub silent: bool,
    pub source: GraphReference<'a>,
    pub destination: GraphReference<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferKind {
    Add,
    Copy,
    Move,
}

/// A graph reference as written in the text: `DEFAULT`, an IRI reference, or a prefixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GraphReference<'a> {
    Default,
    Iri(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Iri(&'a str),
    Open,
    Close,
    Separator,
    Other,
}

/// Splits `update` into statements separated by a top-level `;`.
pub(crate) fn split_statements(update: &str) -> Vec<Statement<'_>> {
    let mut segments = Vec::new();
    let mut segment = Vec::new();
    let mut depth = 0_usize;
    for (start, token) in Lexer::new(update) {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth = depth.saturating_sub(1),
            Token::Separator if depth == 0 => {
                segments.push((std::mem::take(&mut segment), start));
                continue;
            }
            _ => {}
        }
        if depth == 0 || token == Token::Open {
            segment.push((start, token));
        }
    }
    segments.push((segment, update.len()));

    let mut prologue = String::new();
    let mut statements = Vec::with_capacity(segments.len());
    for (segment, end) in &segments {
        let mut tokens = segment.as_slice();
        loop {
            match tokens {
                [(_, Token::Word(keyword)), (_, Token::Word(prefix)), (_, Token::Iri(iri)), rest @ ..]
                    if keyword.eq_ignore_ascii_case("PREFIX") =>
                {
                    prologue.extend(["PREFIX ", *prefix, " ", *iri, "\n"]);
                    tokens = rest;
                }
                [(_, Token::Word(keyword)), (_, Token::Iri(iri)), rest @ ..]
                    if keyword.eq_ignore_ascii_case("BASE") =>
                {
                    prologue.extend(["BASE ", *iri, "\n"]);
                    tokens = rest;
                }
                _ => break,
            }
        }

        statements.push(Statement {
            prologue: prologue.clone(),
            body: tokens
                .first()
                .map_or("", |(start, _)| &update[*start..*end]),
            transfer: parse_transfer(tokens),
        });
    }
    statements
}

fn parse_transfer<'a>(tokens: &[(usize, Token<'a>)]) -> Option<GraphTransfer<'a>> {
    let mut tokens = tokens.iter().map(|(_, token)| *token);
    let kind = match tokens.next()? {
        Token::Word(word) if word.eq_ignore_ascii_case("ADD") => TransferKind::Add,
        Token::Word(word) if word.eq_ignore_ascii_case("COPY") => TransferKind::Copy,
        Token::Word(word) if word.eq_ignore_ascii_case("MOVE") => TransferKind::Move,
        _ => return None,
    };
    let mut next = tokens.next()?;
    let silent = matches!(next, Token::Word(word) if word.eq_ignore_ascii_case("SILENT"));
    if silent {
        next = tokens.next()?;
    }
    let source = parse_graph_reference(next, &mut tokens)?;
    if !matches!(tokens.next()?, Token::Word(word) if word.eq_ignore_ascii_case("TO")) {
        return None;
    }
    let destination = parse_graph_reference(tokens.next()?, &mut tokens)?;
    tokens.next().is_none().then_some(GraphTransfer {
        kind,
        silent,
        source,
        destination,
    })
}

fn parse_graph_reference<'a>(
    first: Token<'a>,
    tokens: &mut impl Iterator<Item = Token<'a>>,
) -> Option<GraphReference<'a>> {
    match first {
        Token::Word(word) if word.eq_ignore_ascii_case("DEFAULT") => Some(GraphReference::Default),
        Token::Word(word) if word.eq_ignore_ascii_case("GRAPH") => match tokens.next()? {
            Token::Iri(iri) | Token::Word(iri) => Some(GraphReference::Iri(iri)),
            _ => None,
        },
        Token::Iri(iri) => Some(GraphReference::Iri(iri)),
        Token::Word(name) if name.contains(':') => Some(GraphReference::Iri(name)),
        _ => None,
    }
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = (usize, Token<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.position;
            let rest = &self.input[start..];
            let c = rest.chars().next()?;
            if c.is_whitespace() {
                self.position += c.len_utf8();
                continue;
            }
            if c == '#' {
                self.position += rest.find('\n').unwrap_or(rest.len());
                continue;
            }

            let (len, token) = match c {
                '{' => (1, Token::Open),
                '}' => (1, Token::Close),
                ';' => (1, Token::Separator),
                '"' | '\'' => (string_len(rest, c), Token::Other),
                '<' => match iri_len(rest) {
                    Some(len) => (len, Token::Iri(&rest[..len])),
                    None => (1, Token::Other),
                },
                c if is_word_char(c) => {
                    let len = rest.find(|c| !is_word_char(c)).unwrap_or(rest.len());
                    (len, Token::Word(&rest[..len]))
                }
                c => (c.len_utf8(), Token::Other),
            };
            self.position += len;
            return Some((start, token));
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '?' | '$' | '@' | '%' | '\\')
}

/// Returns the length of the IRI reference at the start of `input`, or [None] if the `<` is an
/// operator.
fn iri_len(input: &str) -> Option<usize> {
    let end = input[1..].find(|c: char| {
        c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`')
    })? + 1;
    input[end..].starts_with('>').then_some(end + 1)
}

/// Returns the length of the string literal at the start of `input`. An unterminated string spans
/// the rest of the input.
fn string_len(input: &str, quote: char) -> usize {
    let long_quote = [quote; 3].iter().collect::<String>();
    if input.starts_with(&long_quote) {
        let mut offset = 3;
        while let Some(found) = input[offset..].find(['\\', quote]) {
            let position = offset + found;
            if input[position..].starts_with('\\') {
                let escaped = input[position + 1..].chars().next();
                offset = position + 1 + escaped.map_or(0, char::len_utf8);
            } else if input[position..].starts_with(&long_quote) {
                return position + 3;
            } else {
                offset = position + 1;
            }
        }
        return input.len();
    }

    let mut escaped = false;
    for (position, c) in input.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == quote => return position + 1,
            _ => {}
        }
    }
    input.len()
}
