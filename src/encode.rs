//! The encoder: render an object graph back into a document.
//!
//! Encoding rides on `Display`: `#[derive(Bind)]` gives every composite a
//! `Display` implementation that renders its fields as child elements, and
//! [`to_string`] wraps that rendering in the type's root element tag. The
//! output carries no declaration, no namespaces and no insignificant
//! whitespace.

use std::fmt::{self, Write as _};
use std::io;

use crate::info::{Described, FieldShape, FieldValue};

/// Encode `value` as a document, root wrapper included.
///
/// # Example
///
/// ```
/// use xmlbind::derive::Bind;
///
/// #[derive(Bind, Clone, Debug, Default, PartialEq)]
/// struct Cfg {
///     retries: u32,
///     name: String,
/// }
///
/// let cfg = Cfg { retries: 3, name: "a".into() };
/// assert_eq!(
///     xmlbind::to_string(&cfg),
///     "<cfg><retries>3</retries><name>a</name></cfg>",
/// );
/// ```
pub fn to_string<T: Described + fmt::Display>(value: &T) -> String {
    let root = T::descriptor().root_element();
    format!("<{root}>{value}</{root}>")
}

/// Encode `value` into a writer.
pub fn to_writer<T: Described + fmt::Display, W: io::Write>(
    mut writer: W,
    value: &T,
) -> io::Result<()> {
    writer.write_all(to_string(value).as_bytes())
}

// -----------------------------------------------------------------------------
// Rendering helpers
//
// Called from derive-generated `Display` implementations.

/// Write `text` with the markup-significant characters escaped.
pub fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            _ => f.write_char(ch)?,
        }
    }
    Ok(())
}

/// Write one element whose content is `value`'s escaped rendering.
pub fn write_scalar<V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    value: &V,
) -> fmt::Result {
    write!(f, "<{name}>")?;
    write_escaped(f, &value.to_string())?;
    write!(f, "</{name}>")
}

/// Write one field element.
///
/// Composites render their own markup and go through unescaped; scalar and
/// enum content is escaped. `F::SHAPE` is const, so the branch folds away
/// per instantiation.
pub fn write_field<F: FieldValue + fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    value: &F,
) -> fmt::Result {
    match F::SHAPE {
        FieldShape::Composite => write!(f, "<{name}>{value}</{name}>"),
        _ => write_scalar(f, name, value),
    }
}

/// Write a wrapped list field. An empty list writes nothing at all.
pub fn write_list<F: FieldValue + fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    wrapper: &str,
    item: &str,
    items: &[F],
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    write!(f, "<{wrapper}>")?;
    for value in items {
        write_field(f, item, value)?;
    }
    write!(f, "</{wrapper}>")
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::derive::Bind;

    #[derive(Bind, Clone, Copy, Debug, Default, PartialEq)]
    enum Mode {
        #[default]
        Plain,
        #[xml(rename = "STRICT")]
        Strict,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    struct Schema {
        input: String,
        output: String,
    }

    #[derive(Bind, Clone, Debug, Default, PartialEq)]
    #[xml(root = "settings")]
    struct Settings {
        mode: Mode,
        retries: u32,
        #[xml(element = "defaultSchema")]
        default_schema: Option<Schema>,
        #[xml(wrap = "tags", element = "tag")]
        tags: Vec<String>,
    }

    #[test]
    fn renders_fields_in_declaration_order() {
        let settings = Settings {
            mode: Mode::Strict,
            retries: 3,
            default_schema: Some(Schema {
                input: "in".into(),
                output: "out".into(),
            }),
            tags: vec!["x".into(), "y".into()],
        };
        assert_eq!(
            crate::to_string(&settings),
            "<settings>\
                <mode>STRICT</mode>\
                <retries>3</retries>\
                <defaultSchema><input>in</input><output>out</output></defaultSchema>\
                <tags><tag>x</tag><tag>y</tag></tags>\
             </settings>",
        );
    }

    #[test]
    fn absent_and_empty_fields_write_nothing() {
        let rendered = crate::to_string(&Settings::default());
        assert!(!rendered.contains("defaultSchema"));
        assert!(!rendered.contains("tags"));
    }

    #[test]
    fn text_content_is_escaped() {
        let schema = Schema {
            input: "a < b & c".into(),
            output: String::new(),
        };
        assert_eq!(
            crate::to_string(&schema),
            "<schema><input>a &lt; b &amp; c</input><output></output></schema>",
        );
    }

    #[test]
    fn encode_then_decode_restores_the_graph() {
        let settings = Settings {
            mode: Mode::Strict,
            retries: 9,
            default_schema: Some(Schema {
                input: "1 & 2".into(),
                output: "o".into(),
            }),
            tags: vec!["t".into()],
        };
        let back: Settings = crate::from_str(&crate::to_string(&settings)).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn writer_output_matches_string_output() {
        let settings = Settings {
            retries: 1,
            ..Settings::default()
        };
        let mut buffer = Vec::new();
        crate::to_writer(&mut buffer, &settings).unwrap();
        assert_eq!(buffer, crate::to_string(&settings).into_bytes());
    }
}
