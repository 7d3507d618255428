use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use super::database::DefDatabase;
use super::records::{
    LevelPresetRecord, LevelTypeRecord, MonStatRecord, ObjectLookupRecord, ObjectRecord, RegionId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDef,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_path.display())?;
        if let Some(loc) = self.location {
            write!(f, ":{}:{}", loc.line, loc.column)?;
        }
        write!(f, ": {:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
enum ParsedDef {
    LevelType(LevelTypeRecord),
    LevelPreset(LevelPresetRecord),
    MonPreset { act: i32, places: Vec<String> },
    MonStat(MonStatRecord),
    ObjectLookup(ObjectLookupRecord),
    Object(ObjectRecord),
}

impl ParsedDef {
    fn key(&self) -> String {
        match self {
            Self::LevelType(record) => format!("LevelType id={}", record.id),
            Self::LevelPreset(record) => format!("LevelPreset defId={}", record.definition_id),
            Self::MonPreset { act, .. } => format!("MonPreset act={act}"),
            Self::MonStat(record) => format!("MonStat key={}", record.key),
            Self::ObjectLookup(record) => format!(
                "ObjectLookup act={} type={} id={}",
                record.act, record.object_type, record.id
            ),
            Self::Object(record) => format!("ObjectDef index={}", record.index),
        }
    }

    fn insert_into(self, db: &mut DefDatabase) {
        match self {
            Self::LevelType(record) => db.insert_level_type(record),
            Self::LevelPreset(record) => db.insert_level_preset(record),
            Self::MonPreset { act, places } => db.set_monster_presets(act, places),
            Self::MonStat(record) => db.insert_monster_stats(record),
            Self::ObjectLookup(record) => db.insert_object_lookup(record),
            Self::Object(record) => db.insert_object(record),
        }
    }
}

/// Compiles every `.xml` file under `defs_dir`, in sorted relative-path order.
/// Keys repeated across files resolve to the later file.
pub fn compile_def_database(defs_dir: &Path) -> Result<DefDatabase, ContentCompileError> {
    let xml_files = definition_files(defs_dir)?;

    let mut db = DefDatabase::default();
    for (_, xml_file) in &xml_files {
        let raw = fs::read_to_string(xml_file)
            .map_err(|source| read_error(xml_file.clone(), source))?;
        for def in parse_defs_document(xml_file, &raw)? {
            def.insert_into(&mut db);
        }
    }

    info!(
        defs_dir = %defs_dir.display(),
        xml_file_count = xml_files.len(),
        level_types = db.level_type_count(),
        level_presets = db.level_preset_count(),
        monster_stats = db.monster_stats_count(),
        objects = db.object_count(),
        "content_defs_compiled"
    );
    Ok(db)
}

impl DefDatabase {
    /// Compiles a single definitions document held in memory.
    pub fn from_xml_str(file_path: &Path, raw: &str) -> Result<Self, ContentCompileError> {
        let mut db = Self::default();
        for def in parse_defs_document(file_path, raw)? {
            def.insert_into(&mut db);
        }
        Ok(db)
    }
}

struct DefContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DefContext<'_, '_> {
    fn error_at(&self, code: ContentErrorCode, message: String, node: Node<'_, '_>) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

fn parse_defs_document(file_path: &Path, raw: &str) -> Result<Vec<ParsedDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = DefContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut seen = HashSet::<String>::new();
    let mut defs = Vec::<ParsedDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        let def = match child.tag_name().name() {
            "LevelType" => parse_level_type(&ctx, child)?,
            "LevelPreset" => parse_level_preset(&ctx, child)?,
            "MonPreset" => parse_mon_preset(&ctx, child)?,
            "MonStat" => parse_mon_stat(&ctx, child)?,
            "ObjectLookup" => parse_object_lookup(&ctx, child)?,
            "ObjectDef" => parse_object_def(&ctx, child)?,
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{other}>; expected LevelType, LevelPreset, \
MonPreset, MonStat, ObjectLookup or ObjectDef"
                    ),
                    child,
                ))
            }
        };
        let key = def.key();
        if !seen.insert(key.clone()) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateDef,
                format!("duplicate {key}; each file may define a key only once"),
                child,
            ));
        }
        defs.push(def);
    }

    Ok(defs)
}

fn parse_level_type(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(
        ctx,
        "LevelType",
        node,
        &["id", "name", "act", "files", "beta", "expansion"],
    )?;
    Ok(ParsedDef::LevelType(LevelTypeRecord {
        id: RegionId(fields.required_int(ctx, "id")?),
        name: fields.required_text(ctx, "name")?,
        act: fields.required_int(ctx, "act")?,
        files: fields.list("files"),
        beta: fields.flag(ctx, "beta")?,
        expansion: fields.flag(ctx, "expansion")?,
    }))
}

fn parse_level_preset(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(
        ctx,
        "LevelPreset",
        node,
        &[
            "defId",
            "levelId",
            "name",
            "populate",
            "logicals",
            "outdoors",
            "animate",
            "killEdge",
            "fillBlanks",
            "sizeX",
            "sizeY",
            "automap",
            "scan",
            "pops",
            "popPad",
            "files",
            "dt1Mask",
        ],
    )?;
    Ok(ParsedDef::LevelPreset(LevelPresetRecord {
        definition_id: fields.required_int(ctx, "defId")?,
        level_id: fields.int(ctx, "levelId")?.unwrap_or(0),
        name: fields.required_text(ctx, "name")?,
        populate: fields.flag(ctx, "populate")?,
        logicals: fields.flag(ctx, "logicals")?,
        outdoors: fields.flag(ctx, "outdoors")?,
        animate: fields.flag(ctx, "animate")?,
        kill_edge: fields.flag(ctx, "killEdge")?,
        fill_blanks: fields.flag(ctx, "fillBlanks")?,
        size_x: fields.int(ctx, "sizeX")?.unwrap_or(0),
        size_y: fields.int(ctx, "sizeY")?.unwrap_or(0),
        automap: fields.flag(ctx, "automap")?,
        scan: fields.flag(ctx, "scan")?,
        pops: fields.int(ctx, "pops")?.unwrap_or(0),
        pop_pad: fields.int(ctx, "popPad")?.unwrap_or(0),
        files: fields.list("files"),
        dt1_mask: fields.mask(ctx, "dt1Mask")?.unwrap_or(0),
    }))
}

fn parse_mon_preset(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(ctx, "MonPreset", node, &["act", "places"])?;
    Ok(ParsedDef::MonPreset {
        act: fields.required_int(ctx, "act")?,
        places: fields.list("places"),
    })
}

fn parse_mon_stat(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(
        ctx,
        "MonStat",
        node,
        &["key", "name", "code", "baseKey", "velocity", "runVelocity", "npc"],
    )?;
    let key = fields.required_text(ctx, "key")?;
    Ok(ParsedDef::MonStat(MonStatRecord {
        name: fields.required_text(ctx, "name")?,
        code: fields.text(ctx, "code")?.unwrap_or_default(),
        base_key: fields.text(ctx, "baseKey")?.unwrap_or_else(|| key.clone()),
        velocity: fields.int(ctx, "velocity")?.unwrap_or(0),
        run_velocity: fields.int(ctx, "runVelocity")?.unwrap_or(0),
        npc: fields.flag(ctx, "npc")?,
        key,
    }))
}

fn parse_object_lookup(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(
        ctx,
        "ObjectLookup",
        node,
        &[
            "act",
            "type",
            "id",
            "description",
            "objectsTxtId",
            "monstatsTxtId",
            "direction",
            "base",
            "token",
            "mode",
            "class",
        ],
    )?;
    Ok(ParsedDef::ObjectLookup(ObjectLookupRecord {
        act: fields.required_int(ctx, "act")?,
        object_type: fields.required_int(ctx, "type")?,
        id: fields.required_int(ctx, "id")?,
        description: fields.text(ctx, "description")?.unwrap_or_default(),
        objects_txt_id: fields.required_int(ctx, "objectsTxtId")?,
        monstats_txt_id: fields.int(ctx, "monstatsTxtId")?.unwrap_or(-1),
        direction: fields.int(ctx, "direction")?.unwrap_or(0),
        base: fields.text(ctx, "base")?.unwrap_or_default(),
        token: fields.text(ctx, "token")?.unwrap_or_default(),
        mode: fields.text(ctx, "mode")?.unwrap_or_default(),
        class: fields.text(ctx, "class")?.unwrap_or_default(),
    }))
}

fn parse_object_def(ctx: &DefContext<'_, '_>, node: Node<'_, '_>) -> Result<ParsedDef, ContentCompileError> {
    let fields = Fields::collect(
        ctx,
        "ObjectDef",
        node,
        &["index", "name", "token", "sizeX", "sizeY", "subClass"],
    )?;
    Ok(ParsedDef::Object(ObjectRecord {
        index: fields.required_int(ctx, "index")?,
        name: fields.required_text(ctx, "name")?,
        token: fields.text(ctx, "token")?.unwrap_or_default(),
        size_x: fields.int(ctx, "sizeX")?.unwrap_or(0),
        size_y: fields.int(ctx, "sizeY")?.unwrap_or(0),
        sub_class: fields.int(ctx, "subClass")?.unwrap_or(0),
    }))
}

/// Field elements of one def, checked for unknown and duplicate names.
struct Fields<'a, 'input> {
    element: &'static str,
    node: Node<'a, 'input>,
    by_name: HashMap<String, Node<'a, 'input>>,
}

impl<'a, 'input> Fields<'a, 'input> {
    fn collect(
        ctx: &DefContext<'_, '_>,
        element: &'static str,
        node: Node<'a, 'input>,
        allowed: &[&str],
    ) -> Result<Self, ContentCompileError> {
        let mut by_name = HashMap::new();
        for field in node.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name().to_string();
            if !allowed.contains(&field_name.as_str()) {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <{element}>"),
                    field,
                ));
            }
            if by_name.insert(field_name.clone(), field).is_some() {
                return Err(ctx.error_at(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{field_name}> in <{element}>"),
                    field,
                ));
            }
        }
        Ok(Self {
            element,
            node,
            by_name,
        })
    }

    fn text(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<Option<String>, ContentCompileError> {
        let Some(field) = self.by_name.get(name) else {
            return Ok(None);
        };
        let value = field.text().map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(ctx.error_at(
                ContentErrorCode::MissingField,
                format!("field <{name}> must not be empty"),
                *field,
            ));
        }
        Ok(Some(value.to_string()))
    }

    fn required_text(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<String, ContentCompileError> {
        self.text(ctx, name)?.ok_or_else(|| self.missing(ctx, name))
    }

    fn int(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<Option<i32>, ContentCompileError> {
        self.parsed(ctx, name, "an integer", |value| value.parse::<i32>().ok())
    }

    fn required_int(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<i32, ContentCompileError> {
        self.int(ctx, name)?.ok_or_else(|| self.missing(ctx, name))
    }

    fn mask(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<Option<u32>, ContentCompileError> {
        self.parsed(ctx, name, "an unsigned integer", |value| {
            match value.strip_prefix("0x") {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => value.parse::<u32>().ok(),
            }
        })
    }

    /// Absent flags are false.
    fn flag(&self, ctx: &DefContext<'_, '_>, name: &str) -> Result<bool, ContentCompileError> {
        Ok(self
            .parsed(ctx, name, "a boolean (true/false/1/0)", |value| match value {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            })?
            .unwrap_or(false))
    }

    /// `<li>` children in order. Empty items are kept as empty slots.
    fn list(&self, name: &str) -> Vec<String> {
        let Some(field) = self.by_name.get(name) else {
            return Vec::new();
        };
        field
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "li")
            .map(|item| item.text().map(str::trim).unwrap_or_default().to_string())
            .collect()
    }

    fn parsed<T>(
        &self,
        ctx: &DefContext<'_, '_>,
        name: &str,
        expected: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<Option<T>, ContentCompileError> {
        let Some(value) = self.text(ctx, name)? else {
            return Ok(None);
        };
        match parse(&value) {
            Some(parsed) => Ok(Some(parsed)),
            None => Err(ctx.error_at(
                ContentErrorCode::InvalidValue,
                format!("field <{name}> in <{}> must be {expected}, got '{value}'", self.element),
                self.by_name[name],
            )),
        }
    }

    fn missing(&self, ctx: &DefContext<'_, '_>, name: &str) -> ContentCompileError {
        ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{name}> in <{}>", self.element),
            self.node,
        )
    }
}

/// `.xml` files under `root` with their `/`-joined relative paths, ordered by
/// that relative path.
fn definition_files(root: &Path) -> Result<Vec<(String, PathBuf)>, ContentCompileError> {
    let mut found = Vec::<(String, PathBuf)>::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| read_error(dir.clone(), source))?;
        for entry in entries {
            let path = entry
                .map_err(|source| read_error(dir.clone(), source))?
                .path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_xml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if is_xml {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                let key = relative
                    .iter()
                    .map(|segment| segment.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                found.push((key, path));
            }
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read definitions: {source}"),
        file_path: path,
        location: None,
    }
}
