//! Content expressions.
//!
//! A content expression describes which sequences of child types a
//! container accepts: a sequence of terms, each a type or group name (or a
//! parenthesised `|` alternative) followed by an optional `+`, `*` or `?`.
//! Group names are expanded to their member types when the schema is built,
//! so matching only ever compares node type names.

use std::collections::BTreeSet;

/// A parsed, not yet resolved term.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTerm {
    pub names: Vec<String>,
    pub min: usize,
    pub repeat: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    types: Vec<String>,
    min: usize,
    repeat: bool,
}

/// A compiled content expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentExpr {
    source: String,
    terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Name(&'a str),
    Open,
    Close,
    Pipe,
    Quantifier(char),
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            '|' => {
                tokens.push(Token::Pipe);
                chars.next();
            }
            '+' | '*' | '?' => {
                tokens.push(Token::Quantifier(c));
                chars.next();
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = i;
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = j + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(&source[i..end]));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

/// Parse an expression into unresolved terms.
pub(crate) fn parse(source: &str) -> Result<Vec<RawTerm>, String> {
    let tokens = tokenize(source)?;
    let mut terms = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let names = match tokens[i] {
            Token::Name(name) => {
                i += 1;
                vec![name.to_string()]
            }
            Token::Open => {
                i += 1;
                let mut names = Vec::new();
                loop {
                    match tokens.get(i) {
                        Some(Token::Name(name)) => names.push(name.to_string()),
                        _ => return Err("expected a name inside parentheses".to_string()),
                    }
                    i += 1;
                    match tokens.get(i) {
                        Some(Token::Pipe) => i += 1,
                        Some(Token::Close) => {
                            i += 1;
                            break;
                        }
                        _ => return Err("unterminated group".to_string()),
                    }
                }
                names
            }
            ref other => return Err(format!("unexpected {other:?}")),
        };
        let (min, repeat) = match tokens.get(i) {
            Some(Token::Quantifier('+')) => (1, true),
            Some(Token::Quantifier('*')) => (0, true),
            Some(Token::Quantifier('?')) => (0, false),
            _ => (1, false),
        };
        if matches!(tokens.get(i), Some(Token::Quantifier(_))) {
            i += 1;
        }
        terms.push(RawTerm { names, min, repeat });
    }
    Ok(terms)
}

// Matching state: index of the current term and whether it has matched at
// least once.
type State = (usize, bool);

impl ContentExpr {
    /// Compile parsed terms, expanding each name through `resolve`.
    pub(crate) fn compile<F>(source: &str, raw: Vec<RawTerm>, mut resolve: F) -> Result<Self, String>
    where
        F: FnMut(&str) -> Option<Vec<String>>,
    {
        let mut terms = Vec::with_capacity(raw.len());
        for term in raw {
            let mut types = Vec::new();
            for name in &term.names {
                let expanded = resolve(name).ok_or_else(|| name.clone())?;
                for t in expanded {
                    if !types.contains(&t) {
                        types.push(t);
                    }
                }
            }
            terms.push(Term {
                types,
                min: term.min,
                repeat: term.repeat,
            });
        }
        Ok(Self {
            source: source.to_string(),
            terms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the expression accepts no children at all.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn closure(&self, states: &mut BTreeSet<State>) {
        let mut pending: Vec<State> = states.iter().copied().collect();
        while let Some((i, matched)) = pending.pop() {
            if i < self.terms.len() && (matched || self.terms[i].min == 0) && states.insert((i + 1, false)) {
                pending.push((i + 1, false));
            }
        }
    }

    fn start(&self) -> BTreeSet<State> {
        let mut states = BTreeSet::from([(0, false)]);
        self.closure(&mut states);
        states
    }

    fn step(&self, states: &BTreeSet<State>, node_type: &str) -> BTreeSet<State> {
        let mut next = BTreeSet::new();
        for &(i, matched) in states {
            if let Some(term) = self.terms.get(i)
                && (term.repeat || !matched)
                && term.types.iter().any(|t| t == node_type)
            {
                next.insert((i, true));
            }
        }
        self.closure(&mut next);
        next
    }

    /// Whether the sequence of child types is accepted.
    pub fn matches<'a>(&self, types: impl IntoIterator<Item = &'a str>) -> bool {
        let mut states = self.start();
        for node_type in types {
            states = self.step(&states, node_type);
            if states.is_empty() {
                return false;
            }
        }
        states.contains(&(self.terms.len(), false))
    }

    /// Types that may appear as the first child.
    pub fn first_types(&self) -> BTreeSet<&str> {
        self.start()
            .into_iter()
            .filter_map(|(i, _)| self.terms.get(i))
            .flat_map(|term| term.types.iter().map(String::as_str))
            .collect()
    }

    /// Whether `node_type` appears anywhere in the expression.
    pub fn mentions(&self, node_type: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.types.iter().any(|t| t == node_type))
    }

    /// Every type named by the expression, in order of appearance.
    pub(crate) fn types(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .flat_map(|term| term.types.iter().map(String::as_str))
    }

    /// For each required term, the candidate types in preference order.
    pub(crate) fn required_terms(&self) -> impl Iterator<Item = &[String]> {
        self.terms
            .iter()
            .filter(|term| term.min > 0)
            .map(|term| term.types.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn compile(source: &str) -> ContentExpr {
        let raw = parse(source).unwrap();
        ContentExpr::compile(source, raw, |name| match name {
            "block" => Some(vec!["paragraph".to_string(), "heading".to_string()]),
            "inline" => Some(vec!["text".to_string(), "hard_break".to_string()]),
            other => Some(vec![other.to_string()]),
        })
        .unwrap()
    }

    #[rstest]
    #[case("block+", &[], false)]
    #[case("block+", &["paragraph"], true)]
    #[case("block+", &["paragraph", "heading", "paragraph"], true)]
    #[case("block+", &["text"], false)]
    #[case("inline*", &[], true)]
    #[case("inline*", &["text", "hard_break", "text"], true)]
    #[case("paragraph block*", &["paragraph"], true)]
    #[case("paragraph block*", &["heading"], false)]
    #[case("paragraph block*", &["paragraph", "heading"], true)]
    #[case("(paragraph | heading)+", &["heading", "paragraph"], true)]
    #[case("heading? paragraph", &["paragraph"], true)]
    #[case("heading? paragraph", &["heading", "heading", "paragraph"], false)]
    #[case("", &[], true)]
    #[case("", &["text"], false)]
    fn test_matches(#[case] source: &str, #[case] children: &[&str], #[case] expected: bool) {
        assert_eq!(compile(source).matches(children.iter().copied()), expected);
    }

    #[test]
    fn test_first_types() {
        let expr = compile("heading? paragraph block*");
        let first: Vec<_> = expr.first_types().into_iter().collect();
        assert_eq!(first, vec!["heading", "paragraph"]);
    }

    #[rstest]
    #[case("block+ (")]
    #[case("()")]
    #[case("+")]
    #[case("a | b")]
    #[case("block$")]
    fn test_parse_errors(#[case] source: &str) {
        assert!(parse(source).is_err());
    }

    #[test]
    fn test_unknown_name_is_reported() {
        let raw = parse("block+").unwrap();
        let err = ContentExpr::compile("block+", raw, |_| None).unwrap_err();
        assert_eq!(err, "block");
    }
}
