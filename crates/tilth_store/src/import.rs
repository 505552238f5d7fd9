//! Alternate open sources: XML projections, skeleton text, and
//! fileset archives.
//!
//! Open names may carry a magic prefix selecting a non-database
//! source. All import paths converge on [`Record`], the same
//! interchange form the database stores.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tilth_foundation::{Error, Result};

use crate::database::Record;

const FILESET_VERSION: u32 = 1;

/// Parsed form of an open name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OpenSource {
    /// An ordinary database path.
    Native(String),
    /// `#XML:` prefix; the remainder is inline XML text.
    XmlText(String),
    /// `#XMLFILE:` prefix; the remainder is a file path.
    XmlFile(String),
    /// `#SKEL:` prefix; the remainder is inline skeleton text.
    Skeleton(String),
    /// `#FILESET:` prefix; the remainder is an archive file path.
    Fileset(String),
}

impl OpenSource {
    /// Classifies an open name by its magic prefix.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        for (prefix, make) in [
            ("#XMLFILE:", Self::XmlFile as fn(String) -> Self),
            ("#XML:", Self::XmlText),
            ("#SKEL:", Self::Skeleton),
            ("#FILESET:", Self::Fileset),
        ] {
            if name.len() >= prefix.len()
                && name[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                return make(name[prefix.len()..].to_string());
            }
        }
        Self::Native(name.to_string())
    }
}

/// Parses an XML object projection into a record.
///
/// The projection is the fixed shape this system writes: one `object`
/// element with `type` and `path` attributes, containing `attr`
/// elements that hold `cell` children in index order.
///
/// # Errors
/// Returns a validation error for malformed projection text.
pub fn parse_xml(text: &str) -> Result<Record> {
    let mut scanner = Scanner::new(text);
    let object = scanner.open_tag("object")?;
    let mut record = Record {
        path: object.attr("path").unwrap_or_default(),
        object_type: object
            .attr("type")
            .ok_or_else(|| Error::validation("object element lacks a type attribute"))?,
        ..Record::default()
    };
    loop {
        if scanner.try_close_tag("object") {
            break;
        }
        if let Ok(dim) = scanner.open_tag("dim") {
            let axis = dim
                .attr("axis")
                .ok_or_else(|| Error::validation("dim element lacks an axis attribute"))?;
            let size = dim
                .attr("size")
                .ok_or_else(|| Error::validation("dim element lacks a size attribute"))?;
            let size: usize = size.parse().map_err(|_| {
                Error::validation(format!("bad size '{size}' on axis '{axis}'"))
            })?;
            record.sizes.insert(axis, size);
            continue;
        }
        let attr = scanner.open_tag("attr")?;
        let name = attr
            .attr("name")
            .ok_or_else(|| Error::validation("attr element lacks a name attribute"))?;
        let mut cells = Vec::new();
        while !scanner.try_close_tag("attr") {
            scanner.open_tag("cell")?;
            cells.push(xml_unescape(scanner.text_until_close("cell")?));
        }
        record.values.insert(name, cells);
    }
    Ok(record)
}

/// Writes a record as an XML object projection.
#[must_use]
pub fn to_xml(record: &Record) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<object type=\"{}\" path=\"{}\">\n",
        xml_escape(&record.object_type),
        xml_escape(&record.path)
    ));
    for (axis, size) in &record.sizes {
        out.push_str(&format!(
            "  <dim axis=\"{}\" size=\"{size}\"/>\n",
            xml_escape(axis)
        ));
    }
    for (name, cells) in &record.values {
        out.push_str(&format!("  <attr name=\"{}\">\n", xml_escape(name)));
        for cell in cells {
            out.push_str(&format!("    <cell>{}</cell>\n", xml_escape(cell)));
        }
        out.push_str("  </attr>\n");
    }
    out.push_str("</object>\n");
    out
}

/// Parses skeleton text into a record of default-valued attributes.
///
/// The format is line based: `object: TYPE`, an optional
/// `path: table\name`, then one `attr: NAME` line per attribute.
/// Blank lines and `#` comment lines are skipped.
///
/// # Errors
/// Returns a validation error for unknown keys or a missing object line.
pub fn parse_skeleton(text: &str) -> Result<Record> {
    let mut record = Record::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            Error::validation(format!("skeleton line '{line}' is not 'key: value'"))
        })?;
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "object" => record.object_type = value.to_string(),
            "path" => record.path = value.to_string(),
            "attr" => {
                record.values.insert(value.to_string(), Vec::new());
            }
            other => {
                return Err(Error::validation(format!(
                    "unknown skeleton key '{other}'"
                )));
            }
        }
    }
    if record.object_type.is_empty() {
        return Err(Error::validation("skeleton lacks an object line"));
    }
    Ok(record)
}

#[derive(Serialize, Deserialize)]
struct FilesetImage {
    version: u32,
    records: Vec<Record>,
}

/// Reads a fileset archive: a versioned MessagePack record list.
///
/// # Errors
/// Fails on I/O errors, malformed archives, or a version mismatch.
pub fn read_fileset(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| Error::not_found(format!("fileset '{}': {e}", path.display())))?;
    let image: FilesetImage = rmp_serde::from_slice(&bytes)
        .map_err(|e| Error::validation(format!("fileset '{}': {e}", path.display())))?;
    if image.version != FILESET_VERSION {
        return Err(Error::validation(format!(
            "fileset '{}' has version {} (expected {FILESET_VERSION})",
            path.display(),
            image.version
        )));
    }
    Ok(image.records)
}

/// Writes a fileset archive.
///
/// # Errors
/// Fails on serialization or I/O errors.
pub fn write_fileset(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let image = FilesetImage {
        version: FILESET_VERSION,
        records: records.to_vec(),
    };
    let bytes = rmp_serde::to_vec_named(&image)
        .map_err(|e| Error::internal(format!("fileset image: {e}")))?;
    std::fs::write(path.as_ref(), bytes)
        .map_err(|e| Error::internal(format!("fileset: {e}")))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn xml_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Opened tag with its attributes.
struct Tag {
    attrs: Vec<(String, String)>,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| xml_unescape(v))
    }
}

/// A minimal forward scanner over the projection's fixed shape.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn open_tag(&mut self, name: &str) -> Result<Tag> {
        self.skip_ws();
        let open = format!("<{name}");
        let Some(stripped) = self.rest.strip_prefix(open.as_str()) else {
            return Err(Error::validation(format!(
                "expected <{name}> near '{}'",
                self.rest.chars().take(24).collect::<String>()
            )));
        };
        let end = stripped
            .find('>')
            .ok_or_else(|| Error::validation(format!("unterminated <{name}> tag")))?;
        // Self-closing tags drop the trailing slash
        let inner = stripped[..end].trim_end_matches('/');
        let attrs = parse_attrs(inner)?;
        self.rest = &stripped[end + 1..];
        Ok(Tag { attrs })
    }

    fn try_close_tag(&mut self, name: &str) -> bool {
        self.skip_ws();
        let close = format!("</{name}>");
        if let Some(stripped) = self.rest.strip_prefix(close.as_str()) {
            self.rest = stripped;
            true
        } else {
            false
        }
    }

    fn text_until_close(&mut self, name: &str) -> Result<&'a str> {
        let close = format!("</{name}>");
        let end = self.rest.find(close.as_str()).ok_or_else(|| {
            Error::validation(format!("missing </{name}>"))
        })?;
        let text = &self.rest[..end];
        self.rest = &self.rest[end + close.len()..];
        Ok(text)
    }
}

fn parse_attrs(text: &str) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| Error::validation(format!("malformed tag attributes '{text}'")))?;
        let key = rest[..eq].trim().to_string();
        let after = rest[eq + 1..].trim_start();
        let Some(after) = after.strip_prefix('"') else {
            return Err(Error::validation(format!(
                "attribute '{key}' value is not quoted"
            )));
        };
        let close = after
            .find('"')
            .ok_or_else(|| Error::validation(format!("unterminated value for '{key}'")))?;
        attrs.push((key, after[..close].to_string()));
        rest = after[close + 1..].trim_start();
    }
    Ok(attrs)
}
