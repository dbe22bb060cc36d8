//! Query templates with named placeholders.
//!
//! `{name}` marks a parameter. A placeholder wrapped in matching quotes
//! (`'{start_date}'`, `"{start_date}"`) is replaced together with its quotes,
//! so templates written for string formatting keep working once the value is
//! bound. `{{` and `}}` produce literal braces.
//!
//! Nothing is ever spliced into SQL text: compilation emits Postgres
//! positional parameters (`$1..$n`) and a matching bind list.

use std::collections::HashMap;

use wb_schemas::{ParamValue, Params};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("undefined parameter '{name}'")]
    UndefinedParameter { name: String },
    #[error("malformed template: {reason}")]
    Malformed { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed query template.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryTemplate {
    segments: Vec<Segment>,
}

/// SQL with positional parameters plus the values to bind, in position order.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub binds: Vec<ParamValue>,
}

impl QueryTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut lit = String::new();
        let mut chars = raw.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    lit.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c2) in chars.by_ref() {
                        match c2 {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(malformed(format!(
                                    "nested '{{' inside placeholder at byte {at}"
                                )))
                            }
                            _ => name.push(c2),
                        }
                    }
                    if !closed {
                        return Err(malformed(format!("unterminated placeholder at byte {at}")));
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(malformed(format!("empty placeholder at byte {at}")));
                    }
                    if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
                        return Err(malformed(format!("invalid placeholder name '{name}'")));
                    }
                    if !lit.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut lit)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    lit.push('}');
                }
                '}' => return Err(malformed(format!("unmatched '}}' at byte {at}"))),
                _ => lit.push(c),
            }
        }
        if !lit.is_empty() {
            segments.push(Segment::Literal(lit));
        }

        strip_placeholder_quotes(&mut segments);
        Ok(Self { segments })
    }

    /// Distinct placeholder names in first-use order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for s in &self.segments {
            if let Segment::Param(name) = s {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Bind `params` into positional SQL. The first undefined placeholder wins.
    pub fn bind(&self, params: &Params) -> Result<BoundQuery, TemplateError> {
        let mut sql = String::new();
        let mut binds: Vec<ParamValue> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for s in &self.segments {
            match s {
                Segment::Literal(text) => sql.push_str(text),
                Segment::Param(name) => {
                    let pos = match positions.get(name.as_str()) {
                        Some(p) => *p,
                        None => {
                            let value = params.get(name).ok_or_else(|| {
                                TemplateError::UndefinedParameter { name: name.clone() }
                            })?;
                            binds.push(value.clone());
                            positions.insert(name, binds.len());
                            binds.len()
                        }
                    };
                    sql.push('$');
                    sql.push_str(&pos.to_string());
                }
            }
        }

        Ok(BoundQuery { sql, binds })
    }
}

/// Parse and bind in one step.
pub fn compile(raw: &str, params: &Params) -> Result<BoundQuery, TemplateError> {
    QueryTemplate::parse(raw)?.bind(params)
}

fn malformed(reason: String) -> TemplateError {
    TemplateError::Malformed { reason }
}

/// `'{x}'` and `"{x}"` become a bare `{x}`.
fn strip_placeholder_quotes(segments: &mut [Segment]) {
    for i in 1..segments.len().saturating_sub(1) {
        if !matches!(segments[i], Segment::Param(_)) {
            continue;
        }
        let (before, rest) = segments.split_at_mut(i);
        let (_, after) = rest.split_at_mut(1);
        if let (Segment::Literal(prev), Segment::Literal(next)) =
            (&mut before[i - 1], &mut after[0])
        {
            let quote = match prev.chars().last() {
                Some(q @ ('\'' | '"')) => q,
                _ => continue,
            };
            if next.starts_with(quote) {
                prev.pop();
                next.remove(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn params() -> Params {
        let mut p = Params::new();
        p.insert(
            "start_date".to_string(),
            ParamValue::Date(NaiveDate::from_ymd_opt(2023, 5, 31).unwrap()),
        );
        p.insert(
            "end_date".to_string(),
            ParamValue::Date(NaiveDate::from_ymd_opt(2023, 6, 3).unwrap()),
        );
        p
    }

    #[test]
    fn quoted_placeholders_become_positional_binds() {
        let q = compile(
            r#"SELECT * FROM price_prediction WHERE time BETWEEN "{start_date}" AND '{end_date}'"#,
            &params(),
        )
        .unwrap();
        assert_eq!(q.sql, "SELECT * FROM price_prediction WHERE time BETWEEN $1 AND $2");
        assert_eq!(q.binds, vec![params()["start_date"].clone(), params()["end_date"].clone()]);
    }

    #[test]
    fn repeated_name_reuses_position() {
        let q = compile(
            "a >= {start_date} AND b >= {start_date} AND c < {end_date}",
            &params(),
        )
        .unwrap();
        assert_eq!(q.sql, "a >= $1 AND b >= $1 AND c < $2");
        assert_eq!(q.binds.len(), 2);
    }

    #[test]
    fn escaped_braces_are_literal() {
        let q = compile("SELECT '{{\"a\": 1}}'::jsonb, {end_date}", &params()).unwrap();
        assert_eq!(q.sql, "SELECT '{\"a\": 1}'::jsonb, $1");
    }

    #[test]
    fn mismatched_quotes_are_left_alone() {
        let q = compile("x = '{end_date}\"", &params()).unwrap();
        assert_eq!(q.sql, "x = '$1\"");
    }

    #[test]
    fn undefined_parameter_is_named() {
        let err = compile("WHERE t > {since}", &params()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UndefinedParameter {
                name: "since".to_string()
            }
        );
    }

    #[test]
    fn malformed_templates_rejected() {
        for raw in ["WHERE t > {start_date", "WHERE {}", "a } b", "{a{b}}", "{bad-name}"] {
            assert!(
                matches!(QueryTemplate::parse(raw), Err(TemplateError::Malformed { .. })),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let q = compile("SELECT 1", &Params::new()).unwrap();
        assert_eq!(q.sql, "SELECT 1");
        assert!(q.binds.is_empty());
    }

    #[test]
    fn placeholders_listed_once_in_order() {
        let t = QueryTemplate::parse("{b} {a} {b}").unwrap();
        assert_eq!(t.placeholders(), vec!["b", "a"]);
    }
}
