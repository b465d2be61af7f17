use datamap_core::{bail, Error, Record, Result};

use std::path::{Component, Path, PathBuf};

/// A relative path with `{field}` placeholders, such as `users/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Field(String),
}

impl Template {
    pub(crate) fn parse(text: &str) -> Result<Template> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_config("fs statement must be a path template"));
        }

        let mut segments = vec![];
        for raw in text.split('/').filter(|raw| !raw.is_empty()) {
            if raw == "." || raw == ".." {
                bail!("fs path template `{text}` must not contain `{raw}`");
            }
            segments.push(Segment::parse(raw, text)?);
        }

        Ok(Template { segments })
    }

    /// Every placeholder name, in order of appearance.
    pub(crate) fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .flat_map(|segment| &segment.parts)
            .filter_map(|part| match part {
                Part::Field(name) => Some(name.as_str()),
                Part::Literal(_) => None,
            })
    }

    /// Renders the full path, failing when a placeholder has no value.
    pub(crate) fn render(&self, values: &Record) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        for segment in &self.segments {
            match segment.render(values)? {
                Some(rendered) => path.push(rendered),
                None => bail!("path needs field `{}`", segment.missing(values).unwrap_or_default()),
            }
        }
        Ok(path)
    }

    /// Splits the template into a rendered directory and a file name
    /// pattern. Placeholders of the last segment without a value act as
    /// wildcards; the directory must render completely.
    pub(crate) fn scan(&self, values: &Record) -> Result<(PathBuf, Pattern)> {
        let Some((last, dirs)) = self.segments.split_last() else {
            bail!("empty fs path template");
        };

        let mut dir = PathBuf::new();
        for segment in dirs {
            match segment.render(values)? {
                Some(rendered) => dir.push(rendered),
                None => bail!(
                    "listing needs directory field `{}`",
                    segment.missing(values).unwrap_or_default()
                ),
            }
        }

        let mut pieces = vec![];
        for part in &last.parts {
            match part {
                Part::Literal(text) => pieces.push(Some(text.clone())),
                Part::Field(name) => match values.get(name) {
                    Some(value) => pieces.push(Some(path_value(name, value)?)),
                    None => pieces.push(None),
                },
            }
        }

        Ok((dir, Pattern { pieces }))
    }
}

impl Segment {
    fn parse(raw: &str, template: &str) -> Result<Segment> {
        let mut parts = vec![];
        let mut rest = raw;

        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }

            let Some(close) = rest[open..].find('}') else {
                bail!("unclosed placeholder in fs path template `{template}`");
            };

            let name = rest[open + 1..open + close].trim();
            if name.is_empty() {
                bail!("empty placeholder in fs path template `{template}`");
            }

            parts.push(Part::Field(name.to_string()));
            rest = &rest[open + close + 1..];
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Segment { parts })
    }

    fn render(&self, values: &Record) -> Result<Option<String>> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Field(name) => match values.get(name) {
                    Some(value) => out.push_str(&path_value(name, value)?),
                    None => return Ok(None),
                },
            }
        }
        Ok(Some(out))
    }

    fn missing<'a>(&'a self, values: &Record) -> Option<&'a str> {
        self.parts.iter().find_map(|part| match part {
            Part::Field(name) if !values.contains(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// A file name with wildcard gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    pieces: Vec<Option<String>>,
}

impl Pattern {
    pub(crate) fn matches(&self, name: &str) -> bool {
        matches(&self.pieces, name)
    }
}

fn matches(pieces: &[Option<String>], name: &str) -> bool {
    match pieces.split_first() {
        None => name.is_empty(),
        Some((Some(literal), rest)) => name
            .strip_prefix(literal.as_str())
            .is_some_and(|name| matches(rest, name)),
        // A gap takes at least one character
        Some((None, rest)) => name
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain([name.len()])
            .filter(|&i| i > 0)
            .any(|i| matches(rest, &name[i..])),
    }
}

/// A record value as a single path segment. Values that would climb out of
/// the base directory are rejected.
fn path_value(name: &str, value: &datamap_core::Value) -> Result<String> {
    let Some(text) = value.to_text() else {
        bail!("field `{name}` of kind {} cannot appear in a path", value.kind());
    };

    let mut components = Path::new(&text).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !single || text.contains('/') || text.contains('\\') {
        bail!("field `{name}` value {text:?} is not a valid path segment");
    }

    Ok(text)
}
