use super::{
    ATTR_ANCHOR_SHAPE, ATTR_END_CONNECTION, ATTR_ID, ATTR_PARENT, ATTR_PROVENANCE,
    ATTR_START_CONNECTION, ATTR_THEME_STYLE, ATTR_TYPE,
};
use crate::error::ImportError;
use crate::scene::Scene;
use crate::shapes::{
    Circle, Connection, DEFAULT_FONT_SIZE, Element, ElementId, Ellipse, Group, Line, Provenance,
    Rectangle, Shape, Style, Text,
};
use kurbo::{Point, Rect};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};

/// Result of a successful import.
#[derive(Debug, Clone)]
pub struct ImportedDocument {
    pub scene: Scene,
    /// The document's `viewBox` (or `0 0 width height`), if it declared one.
    pub view_box: Option<Rect>,
}

type Attrs = HashMap<String, String>;
type XmlReader<'a> = Reader<&'a [u8]>;

/// Presentation state inherited from enclosing foreign `<g>` elements.
#[derive(Debug, Clone, Default)]
struct Inherited {
    style: Style,
    transform: Option<String>,
    parent: Option<ElementId>,
}

fn position_of(pos: impl TryInto<u64>) -> u64 {
    pos.try_into().unwrap_or_default()
}

fn syntax_error(reader: &XmlReader<'_>, err: impl std::fmt::Display) -> ImportError {
    ImportError::Syntax {
        position: position_of(reader.error_position()),
        message: err.to_string(),
    }
}

fn unexpected_eof(reader: &XmlReader<'_>) -> ImportError {
    ImportError::Syntax {
        position: position_of(reader.buffer_position()),
        message: "unexpected end of document".to_string(),
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(reader: &XmlReader<'_>, e: &BytesStart<'_>) -> Result<Attrs, ImportError> {
    let mut attrs = Attrs::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| syntax_error(reader, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| syntax_error(reader, err))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn parse_number(attribute: &str, value: &str) -> Result<f64, ImportError> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix("px").unwrap_or(trimmed);
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ImportError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

/// Numeric attribute; missing attributes read as zero.
fn number(attrs: &Attrs, name: &str) -> Result<f64, ImportError> {
    attrs
        .get(name)
        .map_or(Ok(0.0), |value| parse_number(name, value))
}

fn view_box_of(attrs: &Attrs) -> Result<Option<Rect>, ImportError> {
    if let Some(value) = attrs.get("viewBox") {
        let parts: Vec<&str> = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        let numbers = parts
            .iter()
            .map(|p| parse_number("viewBox", p))
            .collect::<Result<Vec<f64>, _>>()?;
        return match numbers.as_slice() {
            [x, y, w, h] if *w > 0.0 && *h > 0.0 => Ok(Some(Rect::new(*x, *y, x + w, y + h))),
            _ => Err(ImportError::InvalidNumber {
                attribute: "viewBox".to_string(),
                value: value.clone(),
            }),
        };
    }
    match (attrs.get("width"), attrs.get("height")) {
        (Some(w), Some(h)) => {
            let (w, h) = (parse_number("width", w)?, parse_number("height", h)?);
            Ok((w > 0.0 && h > 0.0).then(|| Rect::new(0.0, 0.0, w, h)))
        }
        _ => Ok(None),
    }
}

/// Presentation attributes, then inline `style` declarations (which win).
fn read_style(attrs: &Attrs, inherited: &Style) -> Result<Style, ImportError> {
    let mut style = inherited.clone();
    if let Some(fill) = attrs.get("fill") {
        style.fill = Some(fill.trim().to_string());
    }
    if let Some(stroke) = attrs.get("stroke") {
        style.stroke = Some(stroke.trim().to_string());
    }
    if let Some(width) = attrs.get("stroke-width") {
        style.stroke_width = Some(parse_number("stroke-width", width)?);
    }
    if let Some(inline) = attrs.get("style") {
        for declaration in inline.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match property.trim() {
                "fill" => style.fill = Some(value.to_string()),
                "stroke" => style.stroke = Some(value.to_string()),
                "stroke-width" => style.stroke_width = Some(parse_number("style", value)?),
                _ => {}
            }
        }
    }
    Ok(style)
}

fn join_transform(outer: Option<&str>, inner: Option<&str>) -> Option<String> {
    match (outer, inner) {
        (Some(outer), Some(inner)) => Some(format!("{outer} {inner}")),
        (Some(t), None) | (None, Some(t)) => Some(t.to_string()),
        (None, None) => None,
    }
}

fn connection(attrs: &Attrs, name: &str) -> Result<Option<Connection>, ImportError> {
    attrs
        .get(name)
        .map(|value| {
            Connection::decode(value).ok_or_else(|| ImportError::InvalidMetadata {
                attribute: name.to_string(),
                value: value.clone(),
            })
        })
        .transpose()
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// An element read from the document. Placeholder ids belong to plain
/// elements and are only unique among themselves; native ids may spell
/// the same string.
struct Imported {
    element: Element,
    placeholder: bool,
}

#[derive(Default)]
struct Importer {
    elements: Vec<Imported>,
    native_ids: HashSet<ElementId>,
    placeholders: usize,
    dropped_connections: usize,
}

impl Importer {
    fn placeholder_id(&mut self) -> ElementId {
        self.placeholders += 1;
        ElementId::new(format!("plain:{}", self.placeholders - 1))
    }

    /// Identity, provenance, membership and style shared by every element.
    fn element(
        &mut self,
        shape: Shape,
        attrs: &Attrs,
        inherited: &Inherited,
    ) -> Result<Imported, ImportError> {
        let native = attrs.contains_key(ATTR_TYPE);
        let id = match attrs.get(ATTR_ID).filter(|_| native) {
            Some(id) => {
                let id = ElementId::from(id.as_str());
                if !self.native_ids.insert(id.clone()) {
                    return Err(ImportError::DuplicateId(id.to_string()));
                }
                id
            }
            None => self.placeholder_id(),
        };

        let mut element = Element::new(id, shape);
        element.transform = join_transform(
            inherited.transform.as_deref(),
            attrs.get("transform").map(String::as_str),
        );
        if !element.shape.is_group() {
            element.style = read_style(attrs, &inherited.style)?;
        }

        if native {
            element.parent_id = attrs.get(ATTR_PARENT).map(|p| ElementId::from(p.as_str()));
            if attrs.get(ATTR_PROVENANCE).map(String::as_str) == Some("plain") {
                element.provenance = Provenance::Plain;
            }
            if let Some(fields) = attrs.get(ATTR_THEME_STYLE) {
                for field in fields.split(',') {
                    match field.trim() {
                        "fill" => element.style.fill = None,
                        "stroke" => element.style.stroke = None,
                        "stroke-width" => element.style.stroke_width = None,
                        _ => {}
                    }
                }
            }
            match &mut element.shape {
                Shape::Line(line) => {
                    line.start_connection = connection(attrs, ATTR_START_CONNECTION)?;
                    line.end_connection = connection(attrs, ATTR_END_CONNECTION)?;
                }
                Shape::Text(text) => {
                    text.anchor_shape =
                        attrs.get(ATTR_ANCHOR_SHAPE).map(|o| ElementId::from(o.as_str()));
                }
                _ => {}
            }
        } else {
            element.parent_id = inherited.parent.clone();
            element.provenance = Provenance::Plain;
            if attrs.contains_key(ATTR_START_CONNECTION) || attrs.contains_key(ATTR_END_CONNECTION)
            {
                self.dropped_connections += 1;
            }
        }
        Ok(Imported {
            element,
            placeholder: !native,
        })
    }

    fn shape(tag: &str, attrs: &Attrs) -> Result<Option<Shape>, ImportError> {
        let shape = match tag {
            "rect" => Shape::Rectangle(Rectangle::new(
                Point::new(number(attrs, "x")?, number(attrs, "y")?),
                number(attrs, "width")?,
                number(attrs, "height")?,
            )),
            "circle" => Shape::Circle(Circle::new(
                Point::new(number(attrs, "cx")?, number(attrs, "cy")?),
                number(attrs, "r")?.max(0.0),
            )),
            "ellipse" => Shape::Ellipse(Ellipse::new(
                Point::new(number(attrs, "cx")?, number(attrs, "cy")?),
                number(attrs, "rx")?.max(0.0),
                number(attrs, "ry")?.max(0.0),
            )),
            "line" => {
                let mut line = Line::new(
                    Point::new(number(attrs, "x1")?, number(attrs, "y1")?),
                    Point::new(number(attrs, "x2")?, number(attrs, "y2")?),
                );
                line.arrowhead = attrs.get("marker-end").is_some_and(|m| m.trim() != "none");
                Shape::Line(line)
            }
            _ => return Ok(None),
        };
        Ok(Some(shape))
    }

    /// Read the children of the current container up to its end tag.
    fn read_children(
        &mut self,
        reader: &mut XmlReader<'_>,
        inherited: &Inherited,
    ) -> Result<(), ImportError> {
        loop {
            let event = reader.read_event().map_err(|err| syntax_error(reader, err))?;
            let (e, has_content) = match event {
                Event::Start(e) => (e, true),
                Event::Empty(e) => (e, false),
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(unexpected_eof(reader)),
                _ => continue,
            };
            let tag = local_name(&e);
            let attrs = attributes(reader, &e)?;
            match tag.as_str() {
                "g" => {
                    let inner = self.group(&attrs, inherited)?;
                    if has_content {
                        self.read_children(reader, &inner)?;
                    }
                }
                "text" => self.text(reader, &attrs, inherited, has_content)?,
                _ => {
                    if let Some(shape) = Self::shape(&tag, &attrs)? {
                        let element = self.element(shape, &attrs, inherited)?;
                        self.elements.push(element);
                    } else {
                        log::debug!("skipping <{tag}>");
                    }
                    if has_content {
                        reader
                            .read_to_end(e.name())
                            .map_err(|err| syntax_error(reader, err))?;
                    }
                }
            }
        }
    }

    /// Native `<g>` markers become groups directly; foreign groups become
    /// plain groups whose presentation attributes flow to their children.
    fn group(&mut self, attrs: &Attrs, inherited: &Inherited) -> Result<Inherited, ImportError> {
        let group = self.element(Shape::Group(Group::new()), attrs, inherited)?;
        let inner = if group.placeholder {
            Inherited {
                style: read_style(attrs, &inherited.style)?,
                transform: group.element.transform.clone(),
                parent: Some(group.element.id.clone()),
            }
        } else {
            inherited.clone()
        };
        self.elements.push(group);
        Ok(inner)
    }

    fn text(
        &mut self,
        reader: &mut XmlReader<'_>,
        attrs: &Attrs,
        inherited: &Inherited,
        has_content: bool,
    ) -> Result<(), ImportError> {
        let mut lines: Vec<String> = Vec::new();
        let mut direct = String::new();
        let mut tspan_depth = 0usize;

        while has_content {
            let chunk = match reader.read_event().map_err(|err| syntax_error(reader, err))? {
                Event::Start(e) if e.local_name().as_ref() == b"tspan" => {
                    if tspan_depth == 0 {
                        lines.push(String::new());
                    }
                    tspan_depth += 1;
                    continue;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"tspan" => {
                    if tspan_depth == 0 {
                        lines.push(String::new());
                    }
                    continue;
                }
                Event::Start(e) => {
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| syntax_error(reader, err))?;
                    continue;
                }
                Event::End(e) if e.local_name().as_ref() == b"tspan" => {
                    tspan_depth = tspan_depth.saturating_sub(1);
                    continue;
                }
                Event::End(_) => break,
                Event::Text(t) => String::from_utf8_lossy(&t).into_owned(),
                Event::CData(t) => String::from_utf8_lossy(&t).into_owned(),
                Event::GeneralRef(r) => {
                    let name = String::from_utf8_lossy(&r).into_owned();
                    match resolve_entity(&name) {
                        Some(c) => c.to_string(),
                        None => format!("&{name};"),
                    }
                }
                Event::Eof => return Err(unexpected_eof(reader)),
                _ => continue,
            };
            if tspan_depth > 0 {
                if let Some(line) = lines.last_mut() {
                    line.push_str(&chunk);
                }
            } else if lines.is_empty() {
                direct.push_str(&chunk);
            }
        }

        let position = Point::new(number(attrs, "x")?, number(attrs, "y")?);
        let mut text = Text::new(position, direct.trim());
        if !lines.is_empty() {
            text.lines = lines;
        }
        text.font_size = match attrs.get("font-size") {
            Some(size) => parse_number("font-size", size)?,
            None => DEFAULT_FONT_SIZE,
        };
        let element = self.element(Shape::Text(text), attrs, inherited)?;
        self.elements.push(element);
        Ok(())
    }

    fn finish(mut self, previous: &Scene) -> Scene {
        if self.dropped_connections > 0 {
            log::warn!(
                "dropped connection metadata on {} plain element(s)",
                self.dropped_connections
            );
        }

        // Plain groups that ended up empty carry nothing. Placeholder
        // parents are only ever set on placeholder children.
        loop {
            let parents: HashSet<ElementId> = self
                .elements
                .iter()
                .filter(|i| i.placeholder)
                .filter_map(|i| i.element.parent_id.clone())
                .collect();
            let before = self.elements.len();
            self.elements.retain(|i| {
                !(i.placeholder && i.element.shape.is_group() && !parents.contains(&i.element.id))
            });
            if self.elements.len() == before {
                break;
            }
        }

        let mut counter = Scene::new();
        counter.inherit_ids_from(previous);
        for id in &self.native_ids {
            counter.note_id(id);
        }
        let fresh: HashMap<ElementId, ElementId> = self
            .elements
            .iter()
            .filter(|i| i.placeholder)
            .map(|i| (i.element.id.clone(), counter.next_id()))
            .collect();
        let resolve = |id: ElementId, placeholder: bool| {
            if placeholder {
                fresh.get(&id).cloned().unwrap_or(id)
            } else {
                id
            }
        };
        let known: HashSet<ElementId> = self
            .elements
            .iter()
            .map(|i| resolve(i.element.id.clone(), i.placeholder))
            .collect();

        let mut elements = Vec::with_capacity(self.elements.len());
        for Imported {
            mut element,
            placeholder,
        } in self.elements
        {
            element.id = resolve(element.id, placeholder);
            if let Some(parent) = element.parent_id.take() {
                let parent = resolve(parent, placeholder);
                if known.contains(&parent) {
                    element.parent_id = Some(parent);
                } else {
                    log::warn!("{} refers to missing group {parent}", element.id);
                }
            }
            if let Shape::Text(text) = &mut element.shape {
                if let Some(owner) = text.anchor_shape.take() {
                    if known.contains(&owner) {
                        text.anchor_shape = Some(owner);
                    } else {
                        log::warn!("{} labels missing element {owner}", element.id);
                    }
                }
            }
            elements.push(element);
        }

        Scene::from_elements(elements)
    }
}

/// Parse SVG markup into a scene. Nothing is returned unless the whole
/// document parses.
pub fn import_svg(markup: &str) -> Result<ImportedDocument, ImportError> {
    import_svg_continuing(markup, &Scene::new())
}

/// Like [`import_svg`], but fresh ids for plain elements continue after the
/// ids already issued by `previous`.
pub fn import_svg_continuing(
    markup: &str,
    previous: &Scene,
) -> Result<ImportedDocument, ImportError> {
    let mut reader = Reader::from_str(markup);

    let (view_box, has_content) = loop {
        match reader.read_event().map_err(|err| syntax_error(&reader, err))? {
            Event::Start(e) | Event::Empty(e) if local_name(&e) != "svg" => {
                return Err(ImportError::MissingRoot);
            }
            Event::Start(e) => break (view_box_of(&attributes(&reader, &e)?)?, true),
            Event::Empty(e) => break (view_box_of(&attributes(&reader, &e)?)?, false),
            Event::Eof => return Err(ImportError::MissingRoot),
            _ => {}
        }
    };

    let mut importer = Importer::default();
    if has_content {
        importer.read_children(&mut reader, &Inherited::default())?;
    }
    // Only comments, whitespace and instructions may follow the root.
    loop {
        match reader.read_event().map_err(|err| syntax_error(&reader, err))? {
            Event::Eof => break,
            Event::Start(_) | Event::Empty(_) | Event::End(_) => {
                return Err(ImportError::Syntax {
                    position: position_of(reader.buffer_position()),
                    message: "content after the root element".to_string(),
                });
            }
            _ => {}
        }
    }
    let native = importer.native_ids.len();
    let scene = importer.finish(previous);
    log::info!("imported {} element(s), {} native", scene.len(), native);
    Ok(ImportedDocument { scene, view_box })
}
