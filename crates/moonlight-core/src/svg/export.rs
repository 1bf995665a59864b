use super::{
    ARROWHEAD_ID, ATTR_ANCHOR_SHAPE, ATTR_END_CONNECTION, ATTR_ID, ATTR_PARENT, ATTR_PROVENANCE,
    ATTR_ROOT, ATTR_START_CONNECTION, ATTR_THEME_STYLE, ATTR_TYPE, SVG_NS, fmt_num,
};
use crate::config::Theme;
use crate::error::{EngineError, EngineResult};
use crate::scene::Scene;
use crate::shapes::{Element, Provenance, Shape, Style};
use kurbo::Rect;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Document-level export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub view_box: Rect,
    pub width: f64,
    pub height: f64,
    pub theme: Theme,
}

fn xml_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::Export(err.to_string())
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> EngineResult<()> {
    writer.write_event(event).map_err(xml_error)
}

/// Serialize the scene in paint order.
pub fn export_svg(scene: &Scene, options: &ExportOptions) -> EngineResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let vb = options.view_box;
    let view_box = format!(
        "{} {} {} {}",
        fmt_num(vb.x0),
        fmt_num(vb.y0),
        fmt_num(vb.width()),
        fmt_num(vb.height())
    );

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    root.push_attribute(("viewBox", view_box.as_str()));
    root.push_attribute(("width", fmt_num(options.width).as_str()));
    root.push_attribute(("height", fmt_num(options.height).as_str()));
    root.push_attribute((ATTR_ROOT, "1"));
    write(&mut writer, Event::Start(root))?;

    let theme = options.theme.style();
    if scene
        .iter()
        .any(|e| e.shape.as_line().is_some_and(|l| l.arrowhead))
    {
        write_arrowhead(&mut writer, theme.stroke)?;
    }

    for element in scene.iter() {
        write_element(&mut writer, scene, element, options.theme)?;
    }

    write(&mut writer, Event::End(BytesEnd::new("svg")))?;
    let bytes = writer.into_inner().into_inner();
    log::info!("exported {} element(s), {} bytes", scene.len(), bytes.len());
    String::from_utf8(bytes).map_err(xml_error)
}

fn write_arrowhead(writer: &mut XmlWriter, color: &str) -> EngineResult<()> {
    write(writer, Event::Start(BytesStart::new("defs")))?;
    let mut marker = BytesStart::new("marker");
    marker.push_attribute(("id", ARROWHEAD_ID));
    marker.push_attribute(("viewBox", "0 0 10 10"));
    marker.push_attribute(("refX", "9"));
    marker.push_attribute(("refY", "5"));
    marker.push_attribute(("markerWidth", "6"));
    marker.push_attribute(("markerHeight", "6"));
    marker.push_attribute(("orient", "auto-start-reverse"));
    write(writer, Event::Start(marker))?;
    let mut path = BytesStart::new("path");
    path.push_attribute(("d", "M 0 0 L 10 5 L 0 10 z"));
    path.push_attribute(("fill", color));
    write(writer, Event::Empty(path))?;
    write(writer, Event::End(BytesEnd::new("marker")))?;
    write(writer, Event::End(BytesEnd::new("defs")))
}

/// Style fields left unset on the element, in `data-theme-style` order.
fn unset_fields(style: &Style) -> String {
    let mut fields = Vec::new();
    if style.fill.is_none() {
        fields.push("fill");
    }
    if style.stroke.is_none() {
        fields.push("stroke");
    }
    if style.stroke_width.is_none() {
        fields.push("stroke-width");
    }
    fields.join(",")
}

fn write_element(
    writer: &mut XmlWriter,
    scene: &Scene,
    element: &Element,
    theme: Theme,
) -> EngineResult<()> {
    let mut attrs: Vec<(&str, String)> = vec![
        (ATTR_ID, element.id.to_string()),
        (ATTR_TYPE, element.shape.type_name().to_string()),
    ];
    if let Some(parent) = &element.parent_id {
        attrs.push((ATTR_PARENT, parent.to_string()));
    }
    if element.provenance == Provenance::Plain {
        attrs.push((ATTR_PROVENANCE, "plain".to_string()));
    }
    let unset = unset_fields(&element.style);
    if !unset.is_empty() {
        attrs.push((ATTR_THEME_STYLE, unset));
    }

    let tag = match &element.shape {
        Shape::Rectangle(r) => {
            attrs.push(("x", fmt_num(r.position.x)));
            attrs.push(("y", fmt_num(r.position.y)));
            attrs.push(("width", fmt_num(r.width)));
            attrs.push(("height", fmt_num(r.height)));
            "rect"
        }
        Shape::Circle(c) => {
            attrs.push(("cx", fmt_num(c.center.x)));
            attrs.push(("cy", fmt_num(c.center.y)));
            attrs.push(("r", fmt_num(c.radius)));
            "circle"
        }
        Shape::Ellipse(e) => {
            attrs.push(("cx", fmt_num(e.center.x)));
            attrs.push(("cy", fmt_num(e.center.y)));
            attrs.push(("rx", fmt_num(e.radius_x)));
            attrs.push(("ry", fmt_num(e.radius_y)));
            "ellipse"
        }
        Shape::Line(l) => {
            attrs.push(("x1", fmt_num(l.start.x)));
            attrs.push(("y1", fmt_num(l.start.y)));
            attrs.push(("x2", fmt_num(l.end.x)));
            attrs.push(("y2", fmt_num(l.end.y)));
            if let Some(conn) = &l.start_connection {
                attrs.push((ATTR_START_CONNECTION, conn.encode()));
            }
            if let Some(conn) = &l.end_connection {
                attrs.push((ATTR_END_CONNECTION, conn.encode()));
            }
            if l.arrowhead {
                attrs.push(("marker-end", format!("url(#{ARROWHEAD_ID})")));
            }
            "line"
        }
        Shape::Text(t) => {
            attrs.push(("x", fmt_num(t.position.x)));
            attrs.push(("y", fmt_num(t.position.y)));
            attrs.push(("font-size", fmt_num(t.font_size)));
            if let Some(owner) = &t.anchor_shape {
                attrs.push((ATTR_ANCHOR_SHAPE, owner.to_string()));
            }
            "text"
        }
        Shape::Group(_) => "g",
    };

    if !element.shape.is_group() {
        let is_text = matches!(element.shape, Shape::Text(_));
        let mut style = element.style.clone();
        if is_text {
            style.fill = scene.effective_fill(&element.id);
        }
        let (resolved, _) = theme.style().resolve(&style, is_text);
        if let Some(fill) = resolved.fill {
            attrs.push(("fill", fill));
        }
        if let Some(stroke) = resolved.stroke {
            attrs.push(("stroke", stroke));
        }
        if let Some(width) = resolved.stroke_width {
            attrs.push(("stroke-width", fmt_num(width)));
        }
    }
    if let Some(transform) = &element.transform {
        attrs.push(("transform", transform.clone()));
    }

    let mut start = BytesStart::new(tag);
    for (name, value) in &attrs {
        start.push_attribute((*name, value.as_str()));
    }

    let Shape::Text(text) = &element.shape else {
        return write(writer, Event::Empty(start));
    };
    write(writer, Event::Start(start))?;
    let x = fmt_num(text.position.x);
    let dy = fmt_num(text.line_height());
    for (i, line) in text.lines.iter().enumerate() {
        let mut tspan = BytesStart::new("tspan");
        tspan.push_attribute(("x", x.as_str()));
        if i > 0 {
            tspan.push_attribute(("dy", dy.as_str()));
        }
        if line.is_empty() {
            write(writer, Event::Empty(tspan))?;
            continue;
        }
        write(writer, Event::Start(tspan))?;
        write(writer, Event::Text(BytesText::new(line)))?;
        write(writer, Event::End(BytesEnd::new("tspan")))?;
    }
    write(writer, Event::End(BytesEnd::new("text")))
}
