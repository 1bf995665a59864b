//! Moonlight Core Library
//!
//! Editable vector-scene engine: element model, selection, handles and
//! anchors, line connections, the pointer/keyboard interaction state
//! machine, undo/redo history and SVG import/export. Platform-agnostic and
//! single-threaded; hosts render the scene and forward input.

pub mod camera;
pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod handles;
pub mod history;
pub mod input;
pub mod interaction;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod shortcuts;
pub mod snap;
pub mod svg;

pub use camera::Camera;
pub use capability::{Capability, capability_of};
pub use config::{EngineConfig, Theme};
pub use engine::{ElementInfo, EndpointInfo, Engine};
pub use error::{EngineError, EngineResult, ImportError};
pub use events::{Event, EventKind, Subscription};
pub use handles::{Anchor, Corner, Handle, HandleKind};
pub use history::{Command, History, Step};
pub use input::{InputState, KeyInput, Modifiers, MouseButton, PointerInput};
pub use interaction::{Editor, GestureKind, Overlay, ToolMode};
pub use scene::{RemovePolicy, Scene, ZOrder};
pub use selection::Selection;
pub use shapes::{
    AnchorName, Connection, ConnectionStatus, Element, ElementId, LineEnd, Provenance, Shape,
    ShapeKind, Style, StylePatch,
};
pub use shortcuts::{Action, Shortcut, ShortcutRegistry};
pub use snap::{GRID_SIZE, Grid, snap_to_grid};
