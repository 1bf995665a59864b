//! SVG export and import.
//!
//! Exported documents carry `data-*` metadata (ids, element types, group
//! membership, labels, connections) so that native elements round-trip
//! exactly. Markup without that metadata imports as plain elements.

mod export;
mod import;

pub use export::{ExportOptions, export_svg};
pub use import::{ImportedDocument, import_svg, import_svg_continuing};

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub(crate) const ARROWHEAD_ID: &str = "moonlight-arrowhead";

pub(crate) const ATTR_ROOT: &str = "data-moonlight";
pub(crate) const ATTR_ID: &str = "data-id";
pub(crate) const ATTR_TYPE: &str = "data-element-type";
pub(crate) const ATTR_PARENT: &str = "data-parent-id";
pub(crate) const ATTR_ANCHOR_SHAPE: &str = "data-anchor-shape";
pub(crate) const ATTR_START_CONNECTION: &str = "data-start-connection";
pub(crate) const ATTR_END_CONNECTION: &str = "data-end-connection";
pub(crate) const ATTR_THEME_STYLE: &str = "data-theme-style";
pub(crate) const ATTR_PROVENANCE: &str = "data-provenance";

/// Format a coordinate: integers without a fraction, others with at most
/// three decimals.
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Adding zero turns -0 into 0
    format!("{}", rounded + 0.0)
}
