//! Database find: wildcard queries over records, served through
//! numbered cursors.

use tilth_foundation::{Error, ObjectPath, Result};

use crate::database::{Database, Record};

/// Handle to an open find cursor.
pub type CursorId = u32;

/// Behavior flags for a find query.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FindFlags {
    /// Descend into subfolders instead of listing direct children.
    pub recurse: bool,
    /// Match the query as one exact path instead of a listing.
    pub exact: bool,
    /// Include the queried folder itself as the first hit.
    pub add_root: bool,
    /// Include data records. When neither `files` nor `folders` is
    /// set, data records are listed.
    pub files: bool,
    /// Include folder placeholders.
    pub folders: bool,
    /// List root tables instead of records.
    pub tables: bool,
    /// Report the original query text in the `Query` field.
    pub as_query: bool,
}

/// Projection field of a find hit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FindField {
    /// The query string that produced the hit.
    Query,
    /// Final name component.
    Name,
    /// Folder path between table and name.
    Path,
    /// Everything after the table.
    Right,
    /// Root table component.
    Table,
    /// Table and name with the folder elided.
    Outer,
    /// Everything before the name.
    Left,
    /// The full path.
    Full,
    /// Record owner.
    Owner,
    /// Record group.
    Group,
    /// Record permissions.
    Perms,
    /// Record date stamp.
    Date,
    /// Record object type.
    Data,
    /// `"yes"` for a folder hit, `"no"` otherwise.
    Folder,
}

impl FindField {
    /// Parses a field name token, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.to_ascii_uppercase();
        Some(match t.as_str() {
            "QUERY" => Self::Query,
            "NAME" => Self::Name,
            "PATH" => Self::Path,
            "RIGHT" => Self::Right,
            "TABLE" => Self::Table,
            "OUTER" => Self::Outer,
            "LEFT" => Self::Left,
            "FULL" => Self::Full,
            "OWNER" => Self::Owner,
            "GROUP" => Self::Group,
            "PERMS" => Self::Perms,
            "DATE" => Self::Date,
            "DATA" => Self::Data,
            "FOLDER" => Self::Folder,
            _ => return None,
        })
    }
}

/// One match produced by a find query.
#[derive(Clone, Debug)]
pub struct FindHit {
    path: ObjectPath,
    query: String,
    owner: String,
    group: String,
    perms: String,
    date: String,
    object_type: String,
    folder: bool,
}

impl FindHit {
    fn from_record(record: &Record, query: &str) -> Result<Self> {
        Ok(Self {
            path: ObjectPath::parse(&record.path)?,
            query: query.to_string(),
            owner: record.owner.clone(),
            group: record.group.clone(),
            perms: record.perms.clone(),
            date: record.date.clone(),
            object_type: record.object_type.clone(),
            folder: record.folder,
        })
    }

    fn table(name: &str, query: &str) -> Result<Self> {
        Ok(Self {
            path: ObjectPath::parse(name)?,
            query: query.to_string(),
            owner: String::new(),
            group: String::new(),
            perms: String::new(),
            date: String::new(),
            object_type: String::new(),
            folder: true,
        })
    }

    /// The hit's full path.
    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Projects one field of this hit as protocol text.
    #[must_use]
    pub fn field(&self, field: FindField) -> String {
        match field {
            FindField::Query => self.query.clone(),
            FindField::Name => self.path.name().to_string(),
            FindField::Path => self.path.folder(),
            FindField::Right => self.path.right(),
            FindField::Table => self.path.table().to_string(),
            FindField::Outer => self.path.outer(),
            FindField::Left => self.path.left(),
            FindField::Full => self.path.full().to_string(),
            FindField::Owner => self.owner.clone(),
            FindField::Group => self.group.clone(),
            FindField::Perms => self.perms.clone(),
            FindField::Date => self.date.clone(),
            FindField::Data => self.object_type.clone(),
            FindField::Folder => if self.folder { "yes" } else { "no" }.to_string(),
        }
    }
}

/// An open cursor: a materialized hit list plus a read position.
#[derive(Debug)]
pub(crate) struct FindCursor {
    hits: Vec<FindHit>,
    pos: usize,
}

impl FindCursor {
    pub(crate) fn new(hits: Vec<FindHit>) -> Self {
        Self { hits, pos: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }

    pub(crate) fn hit(&self, index: usize) -> Option<&FindHit> {
        self.hits.get(index)
    }

    /// The current position, advanced by [`Self::advance`].
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn advance(&mut self) -> Option<&FindHit> {
        let hit = self.hits.get(self.pos)?;
        self.pos += 1;
        Some(hit)
    }
}

/// Runs a find query against the database, materializing all hits.
///
/// The final query component may contain `*` wildcards. Without
/// `recurse`, only direct children of the query folder match.
pub(crate) fn search(db: &Database, query: &str, flags: FindFlags) -> Result<Vec<FindHit>> {
    if flags.tables {
        return search_tables(db, query);
    }
    let query_path = ObjectPath::parse(query)
        .map_err(|e| e.with_context("find query"))?;

    let mut hits = Vec::new();
    if flags.add_root {
        if let Some(record) = db.record(query_path.key()) {
            hits.push(FindHit::from_record(record, query)?);
        }
    }
    let want_files = flags.files || !flags.folders;
    let want_folders = flags.folders;

    if flags.exact {
        if let Some(record) = db.record(query_path.key()) {
            if (record.folder && want_folders) || (!record.folder && want_files) {
                hits.push(FindHit::from_record(record, query)?);
            }
        }
        return Ok(hits);
    }

    // The final component is the match pattern; everything before it
    // is the folder being listed.
    let pattern = query_path.name().to_ascii_lowercase();
    let parent = query_path.left();
    let parent_path = if parent.is_empty() {
        None
    } else {
        Some(ObjectPath::parse(&parent)?)
    };

    for record in db.records() {
        if (record.folder && !want_folders) || (!record.folder && !want_files) {
            continue;
        }
        let path = ObjectPath::parse(&record.path)?;
        let in_scope = match &parent_path {
            Some(p) => {
                path.starts_with(p)
                    && path.depth() > p.depth()
                    && (flags.recurse || path.depth() == p.depth() + 1)
            }
            // A one-component query patterns over root tables' children
            None => flags.recurse || path.depth() == 2,
        };
        if in_scope && wildcard_match(&pattern, &path.name().to_ascii_lowercase()) {
            hits.push(FindHit::from_record(record, query)?);
        }
    }
    Ok(hits)
}

fn search_tables(db: &Database, query: &str) -> Result<Vec<FindHit>> {
    let mut tables: Vec<String> = Vec::new();
    for record in db.records() {
        let path = ObjectPath::parse(&record.path)?;
        let table = path.table().to_string();
        if !tables.iter().any(|t| t.eq_ignore_ascii_case(&table)) {
            tables.push(table);
        }
    }
    tables
        .iter()
        .map(|t| FindHit::table(t, query))
        .collect()
}

/// Case-normalized glob match; `*` matches any run of characters.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            let Some(stripped) = rest.strip_prefix(part) else {
                return false;
            };
            rest = stripped;
        } else if i == parts.len() - 1 && !pattern.ends_with('*') {
            return rest.ends_with(part) && rest.len() >= part.len();
        } else {
            let Some(found) = rest.find(part) else {
                return false;
            };
            rest = &rest[found + part.len()..];
        }
    }
    true
}
