//! AcroForm text field filling and flattening.

use std::collections::HashMap;

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{Error, Result};
use crate::render::pdf::{wrap, FontSet, FontStyle, Piece};

/// Field flag marking a multi-line text field.
const MULTILINE: i64 = 1 << 12;

/// Font size used when a field asks for auto sizing or has none.
const DEFAULT_FONT_SIZE: f32 = 10.0;

const PADDING: f32 = 2.0;

/// A terminal form field and its widgets.
#[derive(Debug, Clone)]
pub struct FormField {
    /// Object holding the field's value
    pub id: ObjectId,
    /// Dotted full name
    pub full_name: String,
    /// Last component of the name
    pub partial_name: String,
    /// Field type name (`Tx`, `Btn`, ...), inherited from parents
    pub field_type: Option<String>,
    flags: i64,
    default_appearance: Option<String>,
    widgets: Vec<ObjectId>,
}

impl FormField {
    /// Check if the field matches `name` by full or partial name.
    pub fn matches(&self, name: &str) -> bool {
        self.full_name == name || self.partial_name == name
    }

    /// Check if the field is a text field.
    pub fn is_text(&self) -> bool {
        self.field_type.as_deref() == Some("Tx")
    }

    /// Check if the field accepts several lines.
    pub fn is_multiline(&self) -> bool {
        self.flags & MULTILINE != 0
    }

    /// Font size from the default appearance, 10 when it has none.
    pub fn font_size(&self) -> f32 {
        self.default_appearance
            .as_deref()
            .and_then(parse_da_size)
            .filter(|size| *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// Font size of a `/DA` string such as `/Helv 12 Tf 0 g`.
fn parse_da_size(da: &str) -> Option<f32> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().position(|t| *t == "Tf")?;
    tokens.get(tf.checked_sub(1)?)?.parse().ok()
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, else byte per char).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xfe, 0xff]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a value as a PDF text string.
pub fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xfe, 0xff];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn catalog_id(doc: &Document) -> Result<ObjectId> {
    Ok(doc.trailer.get(b"Root")?.as_reference()?)
}

fn acroform<'a>(doc: &'a Document) -> Result<&'a Dictionary> {
    let catalog = doc.get_dictionary(catalog_id(doc)?)?;
    let form = catalog
        .get(b"AcroForm")
        .map_err(|_| Error::Template("document has no form".to_string()))?;
    Ok(resolve(doc, form)?.as_dict()?)
}

#[derive(Clone, Default)]
struct Inherited {
    name: String,
    field_type: Option<String>,
    flags: i64,
    default_appearance: Option<String>,
}

fn walk(doc: &Document, id: ObjectId, parent: &Inherited, depth: usize, out: &mut Vec<FormField>) -> Result<()> {
    if depth > 32 {
        return Err(Error::Template("form field tree too deep".to_string()));
    }
    let dict = doc.get_dictionary(id)?;

    let mut current = parent.clone();
    if let Ok(Object::String(bytes, _)) = dict.get(b"T") {
        let partial = decode_text_string(bytes);
        current.name = if parent.name.is_empty() {
            partial
        } else {
            format!("{}.{}", parent.name, partial)
        };
    }
    if let Ok(ft) = dict.get(b"FT").and_then(Object::as_name) {
        current.field_type = Some(String::from_utf8_lossy(ft).into_owned());
    }
    if let Ok(flags) = dict.get(b"Ff").and_then(Object::as_i64) {
        current.flags = flags;
    }
    if let Ok(Object::String(bytes, _)) = dict.get(b"DA") {
        current.default_appearance = Some(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut child_fields = Vec::new();
    let mut widgets = Vec::new();
    if let Ok(kids) = dict.get(b"Kids") {
        for kid in resolve(doc, kids)?.as_array()? {
            let kid_id = kid.as_reference()?;
            let kid_dict = doc.get_dictionary(kid_id)?;
            if kid_dict.has(b"T") {
                child_fields.push(kid_id);
            } else {
                widgets.push(kid_id);
            }
        }
    }

    if child_fields.is_empty() {
        let is_widget = dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|s| s == b"Widget")
            .unwrap_or(false);
        if is_widget {
            widgets.push(id);
        }
        let partial_name = current
            .name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string();
        out.push(FormField {
            id,
            full_name: current.name.clone(),
            partial_name,
            field_type: current.field_type.clone(),
            flags: current.flags,
            default_appearance: current.default_appearance.clone(),
            widgets,
        });
    } else {
        for child in child_fields {
            walk(doc, child, &current, depth + 1, out)?;
        }
    }
    Ok(())
}

/// All terminal fields of the document form.
pub fn fields(doc: &Document) -> Result<Vec<FormField>> {
    let form = acroform(doc)?;
    let mut out = Vec::new();
    let roots = resolve(doc, form.get(b"Fields")?)?.as_array()?;
    for root in roots {
        walk(doc, root.as_reference()?, &Inherited::default(), 0, &mut out)?;
    }
    Ok(out)
}

/// Set text field values by name. Returns how many fields were set.
///
/// Names with no matching text field are skipped.
pub fn fill(doc: &mut Document, values: &[(&str, String)]) -> Result<usize> {
    let fields = fields(doc)?;
    let mut filled = 0;
    for field in fields.iter().filter(|f| f.is_text()) {
        let Some((_, value)) = values.iter().find(|(name, _)| field.matches(name)) else {
            continue;
        };
        let dict = doc.get_dictionary_mut(field.id)?;
        dict.set("V", encode_text_string(value));
        filled += 1;
    }
    debug!("Filled {} of {} form fields", filled, fields.len());
    Ok(filled)
}

fn field_value(doc: &Document, field: &FormField) -> String {
    match doc.get_dictionary(field.id).and_then(|d| d.get(b"V")) {
        Ok(Object::String(bytes, _)) => decode_text_string(bytes),
        _ => String::new(),
    }
}

fn widget_rect(doc: &Document, widget: ObjectId) -> Result<[f32; 4]> {
    let dict = doc.get_dictionary(widget)?;
    let rect = resolve(doc, dict.get(b"Rect")?)?.as_array()?;
    if rect.len() != 4 {
        return Err(Error::Template("widget rectangle is malformed".to_string()));
    }
    let mut values = [0.0f32; 4];
    for (slot, value) in values.iter_mut().zip(rect) {
        *slot = match value {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => return Err(Error::Template("widget rectangle is malformed".to_string())),
        };
    }
    Ok([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// Map each annotation object to the page listing it.
fn annotation_pages(doc: &Document) -> HashMap<ObjectId, ObjectId> {
    let mut pages = HashMap::new();
    for page_id in doc.get_pages().into_values() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        if let Ok(Object::Array(items)) = resolve(doc, annots) {
            for item in items {
                if let Object::Reference(id) = item {
                    pages.insert(*id, page_id);
                }
            }
        }
    }
    pages
}

fn appearance_stream(fonts: &mut FontSet, field: &FormField, value: &str, width: f32, height: f32) -> Result<Stream> {
    let size = field.font_size();
    let line_height = size * 1.15;
    let inner = (width - 2.0 * PADDING).max(1.0);
    let lines = if field.is_multiline() {
        wrap(&[Piece::new(value, FontStyle::Regular)], fonts, size, inner)
    } else {
        let single = value.replace('\n', " ");
        vec![wrap(&[Piece::new(single, FontStyle::Regular)], fonts, size, f32::MAX)
            .into_iter()
            .next()
            .unwrap_or_default()]
    };

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("re", vec![0.into(), 0.into(), width.into(), height.into()]),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
    ];
    let first_baseline = if field.is_multiline() {
        height - PADDING - size
    } else {
        (height - size) / 2.0 + size * 0.22
    };
    operations.push(Operation::new("Td", vec![PADDING.into(), first_baseline.into()]));
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-line_height).into()]));
        }
        operations.push(Operation::new("Tj", vec![fonts.encode(&line.text(), FontStyle::Regular)]));
    }
    operations.push(Operation::new("ET", vec![]));
    operations.push(Operation::new("Q", vec![]));

    let content = Content { operations }.encode()?;
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        },
        content,
    ))
}

/// Resources a page inherits from its ancestors in the page tree.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
        if let Ok(resources) = current.get(b"Resources") {
            return resolve(doc, resources).ok()?.as_dict().ok().cloned();
        }
    }
    None
}

/// Get (creating if needed) the `/XObject` dictionary of a page's resources.
fn page_xobjects<'a>(doc: &'a mut Document, page_id: ObjectId) -> Result<&'a mut Dictionary> {
    let resources = doc.get_dictionary(page_id)?.get(b"Resources").ok().cloned();
    let resources_id = match resources {
        Some(Object::Reference(id)) => Some(id),
        Some(Object::Dictionary(_)) => None,
        _ => {
            let inherited = inherited_resources(doc, page_id).unwrap_or_default();
            let page = doc.get_dictionary_mut(page_id)?;
            page.set("Resources", inherited);
            None
        }
    };

    let xobject = {
        let resources = match resources_id {
            Some(id) => doc.get_dictionary(id)?,
            None => doc.get_dictionary(page_id)?.get(b"Resources")?.as_dict()?,
        };
        resources.get(b"XObject").ok().cloned()
    };
    let shared_xobject = match xobject {
        Some(Object::Reference(id)) => Some(id),
        Some(Object::Dictionary(_)) => None,
        _ => {
            resources_mut(doc, page_id, resources_id)?.set("XObject", Dictionary::new());
            None
        }
    };

    match shared_xobject {
        Some(id) => Ok(doc.get_dictionary_mut(id)?),
        None => Ok(resources_mut(doc, page_id, resources_id)?
            .get_mut(b"XObject")?
            .as_dict_mut()?),
    }
}

fn resources_mut(doc: &mut Document, page_id: ObjectId, shared: Option<ObjectId>) -> Result<&mut Dictionary> {
    match shared {
        Some(id) => Ok(doc.get_dictionary_mut(id)?),
        None => Ok(doc
            .get_dictionary_mut(page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?),
    }
}

fn append_content(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
    let prefix = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut ops = vec![Operation::new("Q", vec![])];
    ops.extend(operations);
    let suffix = doc.add_object(Stream::new(dictionary! {}, Content { operations: ops }.encode()?));

    let page = doc.get_dictionary_mut(page_id)?;
    let mut contents = vec![Object::Reference(prefix)];
    match page.get(b"Contents") {
        Ok(Object::Array(items)) => contents.extend(items.iter().cloned()),
        Ok(other) => contents.push(other.clone()),
        Err(_) => {}
    }
    contents.push(Object::Reference(suffix));
    page.set("Contents", contents);
    Ok(())
}

fn remove_annotations(doc: &mut Document, page_id: ObjectId, widgets: &[ObjectId]) -> Result<()> {
    let annots = doc.get_dictionary(page_id)?.get(b"Annots").ok().cloned();
    let keep = |items: &[Object]| -> Vec<Object> {
        items
            .iter()
            .filter(|item| !matches!(item, Object::Reference(id) if widgets.contains(id)))
            .cloned()
            .collect()
    };
    match annots {
        Some(Object::Array(items)) => {
            let remaining = keep(&items);
            let page = doc.get_dictionary_mut(page_id)?;
            if remaining.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", remaining);
            }
        }
        Some(Object::Reference(id)) => {
            let remaining = keep(doc.get_object(id)?.as_array()?);
            doc.objects.insert(id, Object::Array(remaining));
        }
        _ => {}
    }
    Ok(())
}

/// Draw every field value into its page and remove the form.
///
/// Text fields are painted as form XObjects in the standard Times face;
/// the widgets of all fields are removed, as is the catalog `/AcroForm`.
pub fn flatten(doc: &mut Document) -> Result<usize> {
    let fields = fields(doc)?;
    let pages = annotation_pages(doc);
    let mut fonts = FontSet::standard();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut painted = 0;
    let mut removed: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
    let mut page_ops: HashMap<ObjectId, Vec<Operation>> = HashMap::new();
    for field in &fields {
        let value = field_value(doc, field);
        for widget in &field.widgets {
            let page_id = match doc
                .get_dictionary(*widget)
                .and_then(|d| d.get(b"P"))
                .and_then(Object::as_reference)
            {
                Ok(id) => id,
                Err(_) => match pages.get(widget) {
                    Some(id) => *id,
                    None => continue,
                },
            };
            removed.entry(page_id).or_default().push(*widget);

            if !field.is_text() || value.is_empty() {
                continue;
            }
            let [x1, y1, x2, y2] = widget_rect(doc, *widget)?;
            let mut stream = appearance_stream(&mut fonts, field, &value, x2 - x1, y2 - y1)?;
            stream.dict.set(
                "Resources",
                dictionary! { "Font" => dictionary! { "F1" => font_id } },
            );
            let xobject_id = doc.add_object(stream);
            painted += 1;
            let name = format!("Flat{}", painted);
            page_xobjects(doc, page_id)?.set(name.as_str(), xobject_id);
            page_ops.entry(page_id).or_default().extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), x1.into(), y1.into()],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ]);
        }
    }

    for (page_id, operations) in page_ops {
        append_content(doc, page_id, operations)?;
    }
    for (page_id, widgets) in &removed {
        remove_annotations(doc, *page_id, widgets)?;
    }
    let catalog = catalog_id(doc)?;
    doc.get_dictionary_mut(catalog)?.remove(b"AcroForm");
    debug!("Flattened {} field appearances", painted);
    Ok(painted)
}
