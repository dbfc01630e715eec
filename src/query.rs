//! A small query language: bag of terms with required/prohibited clauses.
//!
//! Syntax:
//! - `term` scores documents containing it
//! - `+term` additionally requires it, `-term` excludes documents containing it
//! - `"several words"` groups words into one clause (scored as a bag, no positions)
//!
//! Parentheses (grouping) are rejected rather than silently ignored.

use crate::analysis::Analyzer;
use crate::bm25::InvertedIndex;
use crate::Error;

/// How a clause constrains matching documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// Scored, optional.
    Should,
    /// Scored and required.
    Must,
    /// Excluded.
    MustNot,
}

/// One clause of a parsed query, before analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Constraint kind.
    pub occur: Occur,
    /// Raw clause text (a word or quoted group).
    pub text: String,
}

/// Parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    clauses: Vec<Clause>,
}

impl ParsedQuery {
    /// Clauses in query order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Run every clause through `analyzer`.
    pub fn analyze(&self, analyzer: &Analyzer) -> AnalyzedQuery {
        let mut out = AnalyzedQuery::default();
        for clause in &self.clauses {
            let terms = analyzer.analyze(&clause.text);
            match clause.occur {
                Occur::Should => out.scoring.extend(terms),
                Occur::Must => {
                    out.scoring.extend(terms.iter().cloned());
                    if !terms.is_empty() {
                        out.required.push(terms);
                    }
                }
                Occur::MustNot => out.prohibited.extend(terms),
            }
        }
        out
    }
}

/// Query after analysis, ready to run against an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzedQuery {
    /// Terms that contribute to the score.
    pub scoring: Vec<String>,
    /// Each group must be fully present in a matching document.
    pub required: Vec<Vec<String>>,
    /// No matching document may contain any of these.
    pub prohibited: Vec<String>,
}

impl AnalyzedQuery {
    /// Whether `doc_id` satisfies the required/prohibited constraints.
    pub fn admits(&self, index: &InvertedIndex, doc_id: u32) -> bool {
        self.required
            .iter()
            .all(|group| group.iter().all(|t| index.contains(doc_id, t)))
            && !self.prohibited.iter().any(|t| index.contains(doc_id, t))
    }
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::QueryParse(msg.into())
}

/// Parse a query string.
pub fn parse(query: &str) -> Result<ParsedQuery, Error> {
    let mut clauses = Vec::new();
    let mut chars = query.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let occur = match c {
            '+' => Occur::Must,
            '-' => Occur::MustNot,
            _ => Occur::Should,
        };
        if occur != Occur::Should {
            chars.next();
            match chars.peek() {
                None => return Err(parse_error(format!("dangling '{c}' at end of query"))),
                Some(&(_, next)) if next.is_whitespace() => {
                    return Err(parse_error(format!("dangling '{c}' at offset {start}")))
                }
                _ => {}
            }
        }

        let text = match chars.peek() {
            Some(&(open, '"')) => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(parse_error(format!("unterminated quote at offset {open}")));
                }
                if text.trim().is_empty() {
                    return Err(parse_error(format!("empty quoted group at offset {open}")));
                }
                text
            }
            _ => {
                let mut text = String::new();
                while let Some(&(offset, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    match c {
                        '(' | ')' => {
                            return Err(parse_error(format!(
                                "grouping with parentheses is not supported (offset {offset})"
                            )))
                        }
                        '"' => {
                            return Err(parse_error(format!(
                                "unexpected quote inside term at offset {offset}"
                            )))
                        }
                        _ => text.push(c),
                    }
                    chars.next();
                }
                text
            }
        };

        clauses.push(Clause { occur, text });
    }

    if clauses.is_empty() {
        return Err(parse_error("empty query"));
    }
    if clauses.iter().all(|c| c.occur == Occur::MustNot) {
        return Err(parse_error("query has only prohibited clauses"));
    }
    Ok(ParsedQuery { clauses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisParams;

    fn occurs(q: &str) -> Vec<(Occur, String)> {
        parse(q)
            .unwrap()
            .clauses()
            .iter()
            .map(|c| (c.occur, c.text.clone()))
            .collect()
    }

    #[test]
    fn bag_of_terms() {
        assert_eq!(
            occurs("cross-language  information retrieval"),
            vec![
                (Occur::Should, "cross-language".to_string()),
                (Occur::Should, "information".to_string()),
                (Occur::Should, "retrieval".to_string()),
            ]
        );
    }

    #[test]
    fn operators_and_quotes() {
        assert_eq!(
            occurs("+retrieval -music \"polyglot search\""),
            vec![
                (Occur::Must, "retrieval".to_string()),
                (Occur::MustNot, "music".to_string()),
                (Occur::Should, "polyglot search".to_string()),
            ]
        );
        assert_eq!(occurs("+\"a b\""), vec![(Occur::Must, "a b".to_string())]);
    }

    #[test]
    fn malformed_queries_are_rejected() {
        for q in [
            "",
            "   ",
            "\"unterminated",
            "retrieval +",
            "- retrieval",
            "(a OR b)",
            "ab\"c",
            "\"  \"",
            "-only -negative",
        ] {
            assert!(
                matches!(parse(q), Err(Error::QueryParse(_))),
                "expected parse error for {q:?}"
            );
        }
    }

    #[test]
    fn analyzed_constraints() {
        let analyzer = Analyzer::new(AnalysisParams::default());
        let q = parse("+alpha beta -gamma").unwrap().analyze(&analyzer);
        assert_eq!(q.scoring, vec!["alpha", "beta"]);
        assert_eq!(q.required, vec![vec!["alpha".to_string()]]);
        assert_eq!(q.prohibited, vec!["gamma"]);

        let mut ix = InvertedIndex::new();
        ix.add_document(0, &["alpha".into(), "beta".into()]);
        ix.add_document(1, &["beta".into()]);
        ix.add_document(2, &["alpha".into(), "gamma".into()]);
        assert!(q.admits(&ix, 0));
        assert!(!q.admits(&ix, 1));
        assert!(!q.admits(&ix, 2));
    }
}
