use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Named values captured while matching a path against a pattern.
pub type Params = BTreeMap<String, String>;

/// Suffix that turns a named parameter into a catch-all (`:pathMatch(.*)*`).
const CATCH_ALL_SUFFIX: &str = "(.*)*";

/// Bytes escaped when a value is written into a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// PathPattern
///
/// A compiled route path. Supports three segment kinds:
/// - `/literal`: matched case-insensitively against one path segment.
/// - `/:name`: captures exactly one non-empty segment.
/// - `/:name(.*)*`: captures zero or more trailing segments, joined with `/`.
///
/// Empty segments are ignored on both sides, so `/usuarios/` and `//usuarios`
/// resolve the same way as `/usuarios`. Segments are percent-decoded before
/// comparison and capture; `to_href` encodes them again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

/// PatternError
///
/// Reason a pattern failed to compile. Wrapped into `TableError::InvalidPattern`
/// by the table builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError(pub String);

impl PathPattern {
    /// parse
    ///
    /// Compiles a pattern string. Only the syntax listed on the type is accepted;
    /// anything else (optional parameters, custom regex groups, repeated names)
    /// is rejected rather than silently matched as a literal.
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError("pattern must start with '/'".to_string()));
        }

        let raw: Vec<&str> = source.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (index, raw_segment) in raw.iter().enumerate() {
            let segment = match raw_segment.strip_prefix(':') {
                None => {
                    if raw_segment.contains(['(', ')', '*', '?', ':']) {
                        return Err(PatternError(format!(
                            "unsupported characters in literal segment `{raw_segment}`"
                        )));
                    }
                    Segment::Literal(raw_segment.to_string())
                }
                Some(rest) => match rest.strip_suffix(CATCH_ALL_SUFFIX) {
                    Some(name) => {
                        if index + 1 != raw.len() {
                            return Err(PatternError(
                                "catch-all parameter must be the final segment".to_string(),
                            ));
                        }
                        Segment::CatchAll(parameter_name(name)?)
                    }
                    None => Segment::Param(parameter_name(rest)?),
                },
            };
            segments.push(segment);
        }

        let mut seen = Vec::new();
        for segment in &segments {
            if let Segment::Param(name) | Segment::CatchAll(name) = segment {
                if seen.contains(&name) {
                    return Err(PatternError(format!("parameter `{name}` declared twice")));
                }
                seen.push(name);
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern ends in a catch-all segment and therefore matches
    /// every path that reaches it.
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    /// Names of the parameters this pattern captures, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// matches
    ///
    /// Returns the captured parameters when `path` matches this pattern.
    /// Any query string or fragment on `path` is ignored.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = strip_query(path)
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let mut params = Params::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    let part = decode(parts.get(index)?);
                    if !part.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = decode(parts.get(index)?);
                    params.insert(name.clone(), part.into_owned());
                }
                Segment::CatchAll(name) => {
                    // Every earlier segment consumed exactly one part, so `index <= parts.len()`.
                    let rest: Vec<Cow<'_, str>> = parts[index..].iter().map(|part| decode(part)).collect();
                    params.insert(name.clone(), rest.join("/"));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    /// to_href
    ///
    /// Builds a concrete path from `params`. On failure returns the name of the
    /// first required parameter that was not supplied. Catch-all parameters are
    /// optional and render as nothing when absent.
    ///
    /// Parameter values are percent-encoded as whole segments, so a value such
    /// as `a/b` or `?x` resolves back to the same route and parameters. A
    /// catch-all value keeps its `/` separators.
    pub fn to_href(&self, params: &Params) -> Result<String, String> {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(encode(literal)),
                Segment::Param(name) => match params.get(name) {
                    Some(value) if !value.is_empty() => parts.push(encode(value)),
                    _ => return Err(name.clone()),
                },
                Segment::CatchAll(name) => {
                    if let Some(value) = params.get(name) {
                        parts.extend(value.split('/').filter(|s| !s.is_empty()).map(encode));
                    }
                }
            }
        }
        Ok(format!("/{}", parts.join("/")))
    }
}

fn parameter_name(name: &str) -> Result<String, PatternError> {
    if name.is_empty() {
        return Err(PatternError("empty parameter name".to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError(format!("unsupported parameter syntax `:{name}`")));
    }
    Ok(name.to_string())
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn decode(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
