//! Tolerant S-expression reader for rule documents.
//!
//! Structural problems (stray atoms, unbalanced parentheses, unterminated
//! strings) become diagnostics; the reader always returns the forms it could
//! recover.

use crate::diagnostics::Diagnostic;

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Atom {
        text: String,
        quoted: bool,
        line: usize,
    },
    List {
        items: Vec<SExpr>,
        line: usize,
    },
}

impl SExpr {
    pub fn line(&self) -> usize {
        match self {
            SExpr::Atom { line, .. } | SExpr::List { line, .. } => *line,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom { text, .. } => Some(text),
            SExpr::List { .. } => None,
        }
    }

    /// The leading keyword of a list, e.g. `rule` for `(rule ...)`.
    pub fn head(&self) -> Option<&str> {
        match self {
            SExpr::List { items, .. } => match items.first() {
                Some(SExpr::Atom {
                    text,
                    quoted: false,
                    ..
                }) => Some(text),
                _ => None,
            },
            SExpr::Atom { .. } => None,
        }
    }

    /// Items after the head of a list.
    pub fn args(&self) -> &[SExpr] {
        match self {
            SExpr::List { items, .. } if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Open,
    Close,
    Atom(String, bool),
}

/// Keywords that only appear at the top level; seeing one nested means a `)` is missing.
const TOP_LEVEL_KEYWORDS: &[&str] = &["rule", "version"];

pub fn read_document(src: &str) -> (Vec<SExpr>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let tokens = tokenize(src, &mut diagnostics);

    let mut forms = Vec::new();
    // Open lists: (items, line of the opening parenthesis)
    let mut stack: Vec<(Vec<SExpr>, usize)> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let (tok, line) = &tokens[i];
        let line = *line;
        match tok {
            Tok::Open => {
                let next_is_top_level = matches!(
                    tokens.get(i + 1),
                    Some((Tok::Atom(word, false), _)) if TOP_LEVEL_KEYWORDS.contains(&word.as_str())
                );
                if next_is_top_level && !stack.is_empty() {
                    diagnostics.push(Diagnostic::warning(
                        line,
                        format!("missing ')' before line {line}; closing the open form"),
                    ));
                    close_all(&mut stack, &mut forms);
                }
                stack.push((Vec::new(), line));
            }
            Tok::Close => match stack.pop() {
                Some((items, open_line)) => {
                    let list = SExpr::List {
                        items,
                        line: open_line,
                    };
                    match stack.last_mut() {
                        Some((parent, _)) => parent.push(list),
                        None => forms.push(list),
                    }
                }
                None => diagnostics.push(Diagnostic::warning(line, "unexpected ')'")),
            },
            Tok::Atom(text, quoted) => {
                let atom = SExpr::Atom {
                    text: text.clone(),
                    quoted: *quoted,
                    line,
                };
                match stack.last_mut() {
                    Some((parent, _)) => parent.push(atom),
                    None => diagnostics.push(Diagnostic::warning(
                        line,
                        format!("unexpected '{text}' outside of a form"),
                    )),
                }
            }
        }
        i += 1;
    }

    if let Some((_, open_line)) = stack.first() {
        diagnostics.push(Diagnostic::warning(
            *open_line,
            "form is not closed before end of document",
        ));
        close_all(&mut stack, &mut forms);
    }

    (forms, diagnostics)
}

fn close_all(stack: &mut Vec<(Vec<SExpr>, usize)>, forms: &mut Vec<SExpr>) {
    while let Some((items, line)) = stack.pop() {
        let list = SExpr::List { items, line };
        match stack.last_mut() {
            Some((parent, _)) => parent.push(list),
            None => forms.push(list),
        }
    }
}

fn tokenize(src: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<(Tok, usize)> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line = 1usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c == '#' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
            }
            pos += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push((Tok::Open, line));
                pos += 1;
            }
            ')' => {
                tokens.push((Tok::Close, line));
                pos += 1;
            }
            '"' => {
                let start_line = line;
                pos += 1;
                let mut s = String::new();
                let mut closed = false;
                while pos < chars.len() {
                    let sc = chars[pos];
                    if sc == '"' {
                        pos += 1;
                        closed = true;
                        break;
                    }
                    if sc == '\n' {
                        break;
                    }
                    if sc == '\\' && pos + 1 < chars.len() {
                        pos += 1;
                        match chars[pos] {
                            'n' => s.push('\n'),
                            't' => s.push('\t'),
                            other => s.push(other),
                        }
                        pos += 1;
                        continue;
                    }
                    s.push(sc);
                    pos += 1;
                }
                if !closed {
                    diagnostics.push(Diagnostic::warning(
                        start_line,
                        "unterminated string; closing it at end of line",
                    ));
                }
                tokens.push((Tok::Atom(s, true), start_line));
            }
            _ => {
                let start = pos;
                while pos < chars.len()
                    && !chars[pos].is_whitespace()
                    && !matches!(chars[pos], '(' | ')' | '"' | '#')
                {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                tokens.push((Tok::Atom(text, false), line));
            }
        }
    }

    tokens
}
