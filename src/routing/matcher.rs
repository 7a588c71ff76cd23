//! Rule compilation.
//!
//! # Responsibilities
//! - Parse `{keyword}`, `{prefix:keyword}`, `{keyword:suffix}` and
//!   `{prefix:keyword:suffix}` placeholders out of a path rule
//! - Synthesize an anchored regex with one named capture per bound keyword
//! - Keep the ordered literal/placeholder segments for reverse building
//! - Check custom rules against the keywords their family requires
//!
//! # Design Decisions
//! - Literals and affixes are escaped, keyword fragments are embedded verbatim
//! - An affixed placeholder compiles to `(?:prefix CAPTURE suffix)?` so the
//!   affixes never match without the value
//! - Anchored as `^/rule$`; the resolver always hands over a leading slash

use std::collections::HashSet;

use regex::Regex;

use crate::routing::error::{CompileError, ValidationError};
use crate::routing::template::{KeywordSpec, RouteTemplate};

/// One piece of a compiled rule, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A keyword occurrence in a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub keyword: String,
    pub prepend: String,
    pub append: String,
    /// The keyword binds an output parameter.
    pub required: bool,
}

/// Immutable matcher + reverse template derived from a `RouteTemplate`.
#[derive(Debug)]
pub struct CompiledRoute {
    template: RouteTemplate,
    matcher: Regex,
    segments: Vec<Segment>,
}

impl CompiledRoute {
    pub fn route_id(&self) -> &str {
        &self.template.route_id
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    pub fn placeholder(&self, keyword: &str) -> Option<&Placeholder> {
        self.placeholders().find(|p| p.keyword == keyword)
    }

    /// True for a rule with nothing in it (the index fallback).
    pub fn is_empty_rule(&self) -> bool {
        self.template.path_pattern.is_empty()
    }

    /// Match a normalized path (leading slash, no trailing slash).
    ///
    /// Returns every named capture that participated in the match.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.matcher.captures(path)?;
        let bound = self
            .matcher
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Some(bound)
    }
}

enum Piece<'a> {
    Literal(&'a str),
    Token { body: &'a str, position: usize },
}

fn malformed(pattern: &str, position: usize) -> CompileError {
    CompileError::MalformedPlaceholder {
        pattern: pattern.to_string(),
        position,
    }
}

fn split_rule(pattern: &str) -> Result<Vec<Piece<'_>>, CompileError> {
    let mut pieces = Vec::new();
    let mut rest = pattern;
    let mut offset = 0;

    while let Some(open) = rest.find(['{', '}']) {
        if rest.as_bytes()[open] == b'}' {
            return Err(malformed(pattern, offset + open));
        }
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after
            .find(['{', '}'])
            .filter(|&i| after.as_bytes()[i] == b'}')
            .ok_or_else(|| malformed(pattern, offset + open))?;
        pieces.push(Piece::Token {
            body: &after[..close],
            position: offset + open,
        });
        let consumed = open + 1 + close + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    Ok(pieces)
}

fn is_keyword_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Resolve a placeholder body into keyword + affixes.
///
/// Affixes may themselves contain `:`, so the keyword is the right-most
/// colon-delimited part that names a known keyword.
fn parse_token<'t>(
    template: &'t RouteTemplate,
    body: &str,
    position: usize,
) -> Result<(&'t KeywordSpec, String, String), CompileError> {
    let parts: Vec<&str> = body.split(':').collect();

    let found = parts
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, part)| template.find_keyword(part).map(|kw| (i, kw)));

    match found {
        Some((i, kw)) => Ok((kw, parts[..i].join(":"), parts[i + 1..].join(":"))),
        None => match parts.iter().rev().find(|p| is_keyword_name(p)) {
            Some(name) => Err(CompileError::UnknownKeyword {
                route_id: template.route_id.clone(),
                keyword: name.to_string(),
            }),
            None => Err(malformed(&template.path_pattern, position)),
        },
    }
}

/// Compile a template into its matcher and reverse segments.
pub fn compile(template: RouteTemplate) -> Result<CompiledRoute, CompileError> {
    let mut pattern = String::from("^/");
    let mut segments = Vec::new();
    let mut seen = HashSet::new();

    for piece in split_rule(&template.path_pattern)? {
        match piece {
            Piece::Literal(text) => {
                pattern.push_str(&regex::escape(text));
                segments.push(Segment::Literal(text.to_string()));
            }
            Piece::Token { body, position } => {
                let (keyword, prepend, append) = parse_token(&template, body, position)?;
                if !seen.insert(keyword.name.clone()) {
                    return Err(CompileError::DuplicateKeyword {
                        route_id: template.route_id.clone(),
                        keyword: keyword.name.clone(),
                    });
                }

                let capture = match &keyword.param {
                    Some(param) => format!("(?P<{}>{})", param, keyword.regexp),
                    None => format!("(?:{})", keyword.regexp),
                };
                if prepend.is_empty() && append.is_empty() {
                    pattern.push_str(&capture);
                } else {
                    pattern.push_str("(?:");
                    pattern.push_str(&regex::escape(&prepend));
                    pattern.push_str(&capture);
                    pattern.push_str(&regex::escape(&append));
                    pattern.push_str(")?");
                }

                segments.push(Segment::Placeholder(Placeholder {
                    keyword: keyword.name.clone(),
                    prepend,
                    append,
                    required: keyword.is_required(),
                }));
            }
        }
    }
    pattern.push('$');

    let matcher = Regex::new(&pattern).map_err(|source| CompileError::InvalidPattern {
        route_id: template.route_id.clone(),
        source,
    })?;

    Ok(CompiledRoute {
        template,
        matcher,
        segments,
    })
}

/// True if `rule` has a placeholder naming `keyword`, whatever its affixes.
pub fn mentions_keyword(rule: &str, keyword: &str) -> bool {
    crate::regex!(r"\{([^{}]*)\}")
        .captures_iter(rule)
        .any(|c| c[1].split(':').any(|part| part == keyword))
}

/// Check a custom rule against the keyword vocabulary of its family.
///
/// With templated routing on, `id` may be omitted and `rewrite` becomes
/// mandatory.
pub fn validate_template(
    family: &RouteTemplate,
    rule: &str,
    templated_routing: bool,
) -> Result<(), ValidationError> {
    let missing: Vec<String> = family
        .keywords
        .iter()
        .filter(|k| !(templated_routing && k.name == "id"))
        .filter(|k| k.is_required() || (templated_routing && k.name == "rewrite"))
        .filter(|k| !mentions_keyword(rule, &k.name))
        .map(|k| k.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingKeywords {
            route_id: family.route_id.clone(),
            keywords: missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::default_routes;

    fn family(id: &str) -> RouteTemplate {
        default_routes().into_iter().find(|r| r.route_id == id).unwrap()
    }

    fn promo(rule: &str) -> RouteTemplate {
        RouteTemplate::new("promo_rule", rule, Some("promo"))
            .keyword(KeywordSpec::new("id", "[0-9]+").bound("id_category"))
            .keyword(KeywordSpec::new("rewrite", r"[_a-zA-Z0-9\pL\pS-]*"))
    }

    #[test]
    fn test_plain_placeholders() {
        let route = compile(promo("{id}-{rewrite}.html")).unwrap();
        assert!(route.matcher().as_str().starts_with("^/(?P<id_category>[0-9]+)"));
        assert!(route.matcher().as_str().ends_with(r"\.html$"));
        let caps = route.captures("/5-shoes.html").unwrap();
        assert_eq!(caps, vec![("id_category".to_string(), "5".to_string())]);
        assert!(route.captures("/shoes.html").is_none());
    }

    #[test]
    fn test_affix_group_is_atomic() {
        let route = compile(family("product_rule")).unwrap();
        assert!(route.captures("/9-shirt.html").is_some());
        assert!(route.captures("/men/9-shirt-1234567890123.html").is_some());
        // The `/` suffix never matches without its category value.
        assert!(route.captures("/men9-shirt.html").is_none());

        let ean = route.placeholder("ean13").unwrap();
        assert_eq!(ean.prepend, "-");
        assert_eq!(ean.append, "");
        assert!(!ean.required);

        let category = route.placeholder("category").unwrap();
        assert_eq!(category.prepend, "");
        assert_eq!(category.append, "/");
    }

    #[test]
    fn test_segments_follow_rule_order() {
        let route = compile(family("module")).unwrap();
        let kinds: Vec<String> = route
            .segments()
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => format!("lit:{}", l),
                Segment::Placeholder(p) => format!("kw:{}", p.keyword),
            })
            .collect();
        assert_eq!(kinds, vec!["lit:module/", "kw:module", "kw:controller"]);
    }

    #[test]
    fn test_unicode_rewrite() {
        let route = compile(promo("{id}-{rewrite}")).unwrap();
        assert!(route.captures("/3-größe").is_some());
    }

    #[test]
    fn test_literals_are_escaped() {
        let route = compile(RouteTemplate::new("faq", "help+faq.(1)", Some("faq"))).unwrap();
        assert!(route.captures("/help+faq.(1)").is_some());
        assert!(route.captures("/helppfaqx(1)").is_none());
    }

    #[test]
    fn test_empty_rule() {
        let route = compile(RouteTemplate::new("index", "", Some("index"))).unwrap();
        assert!(route.is_empty_rule());
        assert!(route.captures("/").is_some());
        assert!(route.captures("/anything").is_none());
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        let err = compile(promo("{id}-{slug}")).unwrap_err();
        assert!(matches!(err, CompileError::UnknownKeyword { ref keyword, .. } if keyword == "slug"));
    }

    #[test]
    fn test_malformed_braces_rejected() {
        for rule in ["{id", "id}", "{{id}}", "{id}-{}", "{-:}"] {
            assert!(
                matches!(compile(promo(rule)), Err(CompileError::MalformedPlaceholder { .. })),
                "rule {rule:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let err = compile(promo("{id}/{-:id}")).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateKeyword { .. }));
    }

    #[test]
    fn test_invalid_keyword_regex_rejected() {
        let t = RouteTemplate::new("bad", "{id}", Some("x"))
            .keyword(KeywordSpec::new("id", "[0-9").bound("id"));
        assert!(matches!(compile(t), Err(CompileError::InvalidPattern { .. })));
    }

    #[test]
    fn test_affix_may_contain_colon() {
        let t = RouteTemplate::new("t", "{a:b:id}", Some("x"))
            .keyword(KeywordSpec::new("id", "[0-9]+").bound("id"));
        let route = compile(t).unwrap();
        assert_eq!(route.placeholder("id").unwrap().prepend, "a:b");
        assert!(route.captures("/a:b7").is_some());
    }

    #[test]
    fn test_mentions_keyword() {
        assert!(mentions_keyword("{category:/}{id}-{rewrite}", "category"));
        assert!(mentions_keyword("x{-:ean13}", "ean13"));
        assert!(!mentions_keyword("{id}-{rewrite}", "ean13"));
        assert!(!mentions_keyword("id-rewrite", "id"));
    }

    #[test]
    fn test_validate_template_modes() {
        let category = family("category_rule");

        // Plain mode: only bound keywords are required.
        assert!(validate_template(&category, "c/{id}", false).is_ok());
        assert_eq!(
            validate_template(&category, "c/{rewrite}", false),
            Err(ValidationError::MissingKeywords {
                route_id: "category_rule".into(),
                keywords: vec!["id".into()],
            })
        );

        // Templated mode: id is exempt, rewrite becomes required.
        assert!(validate_template(&category, "c/{rewrite}", true).is_ok());
        assert_eq!(
            validate_template(&category, "c/{id}", true),
            Err(ValidationError::MissingKeywords {
                route_id: "category_rule".into(),
                keywords: vec!["rewrite".into()],
            })
        );
    }
}
