//! Tokenizer for `/`-separated CSDL paths.
//!
//! Paths show up in binding paths, partner names, entity-set paths, path
//! expressions and annotation targets. This module only splits them into
//! syntactic segments; binding segments to properties, types and terms is
//! done by the semantic model.

use logos::Logos;
use smol_str::SmolStr;

/// A `@Term#Qualifier` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSegment {
    pub term: SmolStr,
    pub qualifier: Option<SmolStr>,
}

/// Path token.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum PathToken {
    #[token("/")]
    Slash,

    /// `@NS.Term` with an optional `#Qualifier`.
    #[regex(r"@[\p{L}_][\p{L}\p{N}_]*(\.[\p{L}_][\p{L}\p{N}_]*)*(#[\p{L}_][\p{L}\p{N}_]*)?", term_segment)]
    Term(TermSegment),

    /// `$count`, `$It` and friends.
    #[regex(r"\$[A-Za-z]+", |lex| SmolStr::new(&lex.slice()[1..]))]
    Keyword(SmolStr),

    /// A simple or dotted (qualified) name.
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*(\.[\p{L}_][\p{L}\p{N}_]*)*", |lex| SmolStr::new(lex.slice()))]
    Name(SmolStr),
}

fn term_segment(lex: &mut logos::Lexer<PathToken>) -> TermSegment {
    let body = &lex.slice()[1..];
    match body.split_once('#') {
        Some((term, qualifier)) => TermSegment {
            term: term.into(),
            qualifier: Some(qualifier.into()),
        },
        None => TermSegment {
            term: body.into(),
            qualifier: None,
        },
    }
}

/// One segment of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegmentSyntax {
    /// A property name, or a type cast when qualified.
    Name(SmolStr),
    Term(TermSegment),
    Keyword(SmolStr),
}

impl PathSegmentSyntax {
    /// Returns true for dotted names, which denote type casts.
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Name(name) if name.contains('.'))
    }

    /// The segment as written, without `@`/`$` markers.
    pub fn text(&self) -> &SmolStr {
        match self {
            Self::Name(name) | Self::Keyword(name) => name,
            Self::Term(segment) => &segment.term,
        }
    }
}

/// Why a path could not be split.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("empty path segment at offset {offset}")]
    EmptySegment { offset: usize },
    #[error("unexpected '{text}' at offset {offset}")]
    Unexpected { text: SmolStr, offset: usize },
}

/// Splits a path into segments.
///
/// Leading, trailing and doubled slashes are rejected.
pub fn parse_path(path: &str) -> Result<Vec<PathSegmentSyntax>, PathError> {
    let mut segments = Vec::new();
    let mut expect_segment = true;

    for (token, span) in PathToken::lexer(path).spanned() {
        let segment = match token {
            Ok(PathToken::Slash) => {
                if expect_segment {
                    return Err(PathError::EmptySegment { offset: span.start });
                }
                expect_segment = true;
                continue;
            }
            Ok(PathToken::Name(name)) => PathSegmentSyntax::Name(name),
            Ok(PathToken::Term(term)) => PathSegmentSyntax::Term(term),
            Ok(PathToken::Keyword(keyword)) => PathSegmentSyntax::Keyword(keyword),
            Err(()) => {
                return Err(PathError::Unexpected {
                    text: path[span.clone()].into(),
                    offset: span.start,
                });
            }
        };
        if !expect_segment {
            return Err(PathError::Unexpected {
                text: path[span.clone()].into(),
                offset: span.start,
            });
        }
        segments.push(segment);
        expect_segment = false;
    }

    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    if expect_segment {
        return Err(PathError::EmptySegment { offset: path.len() });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> PathSegmentSyntax {
        PathSegmentSyntax::Name(text.into())
    }

    #[test]
    fn splits_names_and_casts() {
        let segments = parse_path("Orders/NS.SpecialOrder/Lines").expect("path");
        assert_eq!(
            segments,
            vec![name("Orders"), name("NS.SpecialOrder"), name("Lines")]
        );
        assert!(segments[1].is_qualified());
        assert!(!segments[0].is_qualified());
    }

    #[test]
    fn term_segments_keep_qualifier() {
        let segments = parse_path("Address/@Core.Description#Short").expect("path");
        assert_eq!(
            segments[1],
            PathSegmentSyntax::Term(TermSegment {
                term: "Core.Description".into(),
                qualifier: Some("Short".into()),
            })
        );
        assert_eq!(segments[1].text(), "Core.Description");
    }

    #[test]
    fn keywords() {
        let segments = parse_path("Lines/$count").expect("path");
        assert_eq!(segments[1], PathSegmentSyntax::Keyword("count".into()));
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(parse_path(""), Err(PathError::Empty));
        assert_eq!(parse_path("A/"), Err(PathError::EmptySegment { offset: 2 }));
        assert_eq!(parse_path("/A"), Err(PathError::EmptySegment { offset: 0 }));
        assert_eq!(parse_path("A//B"), Err(PathError::EmptySegment { offset: 2 }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_path("A B"),
            Err(PathError::Unexpected { offset: 1, .. })
        ));
        assert!(matches!(parse_path("A@T"), Err(PathError::Unexpected { .. })));
    }
}
