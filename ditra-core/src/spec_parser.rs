//! Parser for the textual subtree-specification form.
//!
//! Accepts the RFC 3672 grammar, e.g.
//!
//! ```text
//! { base "ou=users", minimum 1, maximum 3,
//!   specificExclusions { chopBefore:"cn=closed", chopAfter:"cn=open" },
//!   specificationFilter and:{ item:person, not:item:device } }
//! ```
//!
//! The empty specification `{}` selects the whole administrative area.
//! Structural errors in the filter report `MalformedRefinement`; every other
//! failure reports `InvalidSubtreeSpecification` with the byte position.

use crate::error::{Error, Result};
use crate::name::Name;
use crate::refinement::Refinement;
use crate::subtree::SubtreeSpecification;

/// Parse a textual subtree specification.
pub fn parse_subtree_specification(text: &str) -> Result<SubtreeSpecification> {
    Parser::new(text)?.parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    LBrace,
    RBrace,
    Colon,
    Comma,
    /// Double-quoted string (quotes stripped, no inner escapes)
    Quoted(String),
    /// Bare word: keyword, objectClass descriptor, OID, or integer
    Word(String),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    start: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '{' | '}' | ':' | ',' => {
                chars.next();
                let kind = match ch {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ':' => TokenKind::Colon,
                    _ => TokenKind::Comma,
                };
                tokens.push(Token { kind, start: pos });
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(Error::invalid_subtree_specification(format!(
                        "unterminated string at position {pos}"
                    )));
                }
                tokens.push(Token {
                    kind: TokenKind::Quoted(value),
                    start: pos,
                });
            }
            c if c.is_ascii_alphanumeric() => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ';' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Word(word),
                    start: pos,
                });
            }
            other => {
                return Err(Error::invalid_subtree_specification(format!(
                    "unexpected character '{other}' at position {pos}"
                )));
            }
        }
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        start: input.len(),
    });
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(Error::invalid_subtree_specification(format!(
                "expected {what} at position {}",
                self.current().start
            )))
        }
    }

    fn parse(mut self) -> Result<SubtreeSpecification> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut spec = SubtreeSpecification::default();
        let mut seen: Vec<String> = Vec::new();

        if self.current().kind != TokenKind::RBrace {
            loop {
                self.parse_component(&mut spec, &mut seen)?;
                if self.current().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        self.expect(TokenKind::Eof, "end of input")?;
        Ok(spec)
    }

    fn parse_component(
        &mut self,
        spec: &mut SubtreeSpecification,
        seen: &mut Vec<String>,
    ) -> Result<()> {
        let token = self.advance();
        let keyword = match &token.kind {
            TokenKind::Word(w) => w.clone(),
            _ => {
                return Err(Error::invalid_subtree_specification(format!(
                    "expected component keyword at position {}",
                    token.start
                )))
            }
        };
        if seen.iter().any(|s| s.eq_ignore_ascii_case(&keyword)) {
            return Err(Error::invalid_subtree_specification(format!(
                "duplicate component '{keyword}' at position {}",
                token.start
            )));
        }
        seen.push(keyword.clone());

        match keyword.as_str() {
            "base" => {
                spec.base = self.parse_name("base")?;
            }
            "minimum" => {
                spec.minimum = self.parse_number("minimum")?;
            }
            "maximum" => {
                spec.maximum = Some(self.parse_number("maximum")?);
            }
            "specificExclusions" => {
                self.parse_exclusions(spec)?;
            }
            "specificationFilter" => {
                spec.refinement = Some(self.parse_refinement()?);
            }
            other => {
                return Err(Error::invalid_subtree_specification(format!(
                    "unknown component '{other}' at position {}",
                    token.start
                )));
            }
        }
        Ok(())
    }

    fn parse_name(&mut self, what: &str) -> Result<Name> {
        let token = self.advance();
        let TokenKind::Quoted(text) = token.kind else {
            return Err(Error::invalid_subtree_specification(format!(
                "expected quoted name after '{what}' at position {}",
                token.start
            )));
        };
        Name::parse(&text).map_err(|e| {
            Error::invalid_subtree_specification(format!(
                "bad name in '{what}' at position {}: {e}",
                token.start
            ))
        })
    }

    fn parse_number(&mut self, what: &str) -> Result<u32> {
        let token = self.advance();
        if let TokenKind::Word(w) = &token.kind {
            if let Ok(n) = w.parse::<u32>() {
                return Ok(n);
            }
        }
        Err(Error::invalid_subtree_specification(format!(
            "expected non-negative integer after '{what}' at position {}",
            token.start
        )))
    }

    fn parse_exclusions(&mut self, spec: &mut SubtreeSpecification) -> Result<()> {
        self.expect(TokenKind::LBrace, "'{' after specificExclusions")?;
        if self.current().kind != TokenKind::RBrace {
            loop {
                let token = self.advance();
                let keyword = match &token.kind {
                    TokenKind::Word(w) => w.clone(),
                    _ => {
                        return Err(Error::invalid_subtree_specification(format!(
                            "expected chopBefore or chopAfter at position {}",
                            token.start
                        )))
                    }
                };
                self.expect(TokenKind::Colon, "':'")?;
                let name = self.parse_name(&keyword)?;
                match keyword.as_str() {
                    "chopBefore" => {
                        spec.chop_before.insert(name);
                    }
                    "chopAfter" => {
                        spec.chop_after.insert(name);
                    }
                    other => {
                        return Err(Error::invalid_subtree_specification(format!(
                            "unknown exclusion '{other}' at position {}",
                            token.start
                        )));
                    }
                }
                if self.current().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "'}' after exclusions")?;
        Ok(())
    }

    fn parse_refinement(&mut self) -> Result<Refinement> {
        let token = self.advance();
        let keyword = match &token.kind {
            TokenKind::Word(w) => w.clone(),
            _ => {
                return Err(Error::malformed_refinement(format!(
                    "expected item, and, or, or not at position {}",
                    token.start
                )))
            }
        };
        match keyword.as_str() {
            "item" => {
                self.expect(TokenKind::Colon, "':' after item")
                    .map_err(malformed)?;
                let value = self.advance();
                match value.kind {
                    TokenKind::Word(w) => Ok(Refinement::item(w)),
                    _ => Err(Error::malformed_refinement(format!(
                        "expected objectClass descriptor or OID at position {}",
                        value.start
                    ))),
                }
            }
            "and" | "or" => {
                self.expect(TokenKind::Colon, "':'").map_err(malformed)?;
                self.expect(TokenKind::LBrace, "'{'").map_err(malformed)?;
                let mut children = Vec::new();
                if self.current().kind != TokenKind::RBrace {
                    loop {
                        children.push(self.parse_refinement()?);
                        if self.current().kind == TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "'}'").map_err(malformed)?;
                if keyword == "and" {
                    Ok(Refinement::And(children))
                } else {
                    Ok(Refinement::Or(children))
                }
            }
            "not" => {
                self.expect(TokenKind::Colon, "':' after not")
                    .map_err(malformed)?;
                Ok(Refinement::Not(Box::new(self.parse_refinement()?)))
            }
            other => Err(Error::malformed_refinement(format!(
                "unknown refinement '{other}' at position {}",
                token.start
            ))),
        }
    }
}

fn malformed(err: Error) -> Error {
    Error::malformed_refinement(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::parse(s).unwrap()
    }

    #[test]
    fn test_empty_spec_selects_whole_area() {
        let spec = parse_subtree_specification("{}").unwrap();
        assert_eq!(spec, SubtreeSpecification::whole_area());
        assert_eq!(parse_subtree_specification("{ }").unwrap(), spec);
    }

    #[test]
    fn test_full_spec() {
        let spec = parse_subtree_specification(
            r#"{ base "ou=users", minimum 1, maximum 3,
                 specificExclusions { chopBefore:"cn=closed", chopAfter:"cn=open" },
                 specificationFilter item:person }"#,
        )
        .unwrap();
        assert_eq!(spec.base, name("ou=users"));
        assert_eq!(spec.minimum, 1);
        assert_eq!(spec.maximum, Some(3));
        assert!(spec.chop_before.contains(&name("cn=closed")));
        assert!(spec.chop_after.contains(&name("cn=open")));
        assert_eq!(spec.refinement, Some(Refinement::item("person")));
    }

    #[test]
    fn test_nested_filter() {
        let spec = parse_subtree_specification(
            "{ specificationFilter and:{ item:person, or:{ item:2.5.6.5, not:item:device } } }",
        )
        .unwrap();
        let Refinement::And(children) = spec.refinement.unwrap() else {
            panic!("expected And");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], Refinement::item("person"));
        let Refinement::Or(inner) = &children[1] else {
            panic!("expected Or");
        };
        assert_eq!(inner[0], Refinement::item("2.5.6.5"));
        assert_eq!(inner[1], Refinement::Not(Box::new(Refinement::item("device"))));
    }

    #[test]
    fn test_malformed_spec_text() {
        for text in [
            "",
            "{",
            "{ base ou=users }",
            "{ minimum -1 }",
            "{ bogus 1 }",
            "{ base \"ou=a\", base \"ou=b\" }",
            "{ specificExclusions { chopSideways:\"cn=x\" } }",
            "{} trailing",
        ] {
            assert!(
                matches!(
                    parse_subtree_specification(text),
                    Err(Error::InvalidSubtreeSpecification(_))
                ),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_malformed_refinement_text() {
        for text in [
            "{ specificationFilter nand:{ item:a } }",
            "{ specificationFilter item person }",
            "{ specificationFilter not:{} }",
        ] {
            assert!(
                matches!(
                    parse_subtree_specification(text),
                    Err(Error::MalformedRefinement(_))
                ),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_escaped_name_inside_spec() {
        let spec = parse_subtree_specification(r#"{ base "cn=a\,b" }"#).unwrap();
        assert_eq!(spec.base.rdn().unwrap().value(), "a,b");
    }
}
