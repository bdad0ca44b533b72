//! Positional templates for URL suffixes and request bodies.
//!
//! A template is literal text interleaved with `{n}` placeholders. Its arity
//! is one past the highest placeholder index, and rendering requires exactly
//! that many arguments.

use std::fmt;

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Arg(usize),
}

/// A parsed positional template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  source: String,
  segments: Vec<Segment>,
  arity: usize,
}

impl Template {
  /// A template with no text and no placeholders.
  pub fn empty() -> Self {
    Self {
      source: String::new(),
      segments: Vec::new(),
      arity: 0,
    }
  }

  /// Parse a template string such as `action=rename&path={0}`.
  pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
    let source = source.into();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut arity = 0;
    let mut chars = source.char_indices();

    while let Some((offset, c)) = chars.next() {
      if c != '{' {
        literal.push(c);
        continue;
      }

      let mut digits = String::new();
      let mut closed = false;
      for (_, d) in chars.by_ref() {
        if d == '}' {
          closed = true;
          break;
        }
        digits.push(d);
      }

      let index = match (closed, digits.parse::<usize>()) {
        (true, Ok(index)) => index,
        _ => {
          return Err(TemplateError::MalformedPlaceholder {
            template: source.clone(),
            offset,
          });
        }
      };

      if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
      }
      segments.push(Segment::Arg(index));
      arity = arity.max(index + 1);
    }

    if !literal.is_empty() {
      segments.push(Segment::Literal(literal));
    }

    Ok(Self {
      source,
      segments,
      arity,
    })
  }

  /// Number of positional arguments this template requires.
  pub fn arity(&self) -> usize {
    self.arity
  }

  /// The unparsed template text.
  pub fn as_str(&self) -> &str {
    &self.source
  }

  /// Substitute `args` verbatim.
  pub fn render(&self, args: &[String]) -> Result<String, TemplateError> {
    self.render_with(args, |value| value.to_string())
  }

  /// Substitute `args` as `application/x-www-form-urlencoded` values.
  pub fn render_form(&self, args: &[String]) -> Result<String, TemplateError> {
    self.render_with(args, |value| {
      url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
    })
  }

  fn render_with<F>(&self, args: &[String], encode: F) -> Result<String, TemplateError>
  where
    F: Fn(&str) -> String,
  {
    if args.len() != self.arity {
      return Err(TemplateError::ArgumentCount {
        template: self.source.clone(),
        expected: self.arity,
        actual: args.len(),
      });
    }

    let mut out = String::with_capacity(self.source.len());
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Arg(index) => out.push_str(&encode(&args[*index])),
      }
    }
    Ok(out)
  }
}

impl fmt::Display for Template {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}
