//! Document commands behind the `moonlight` binary.

use crate::script::{Operation, parse_script};
use moonlight_core::{Engine, EngineConfig, EngineError, ShortcutRegistry};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Operation {index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: &'static str,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    Stdout(#[from] io::Error),
}

/// Command-line application state: the engine configuration every
/// document is opened with.
#[derive(Debug, Clone, Default)]
pub struct App {
    config: EngineConfig,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Load the engine configuration from a JSON file, or use defaults.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = read(path)?;
        let config = EngineConfig::from_json(&json)?;
        log::info!("Loaded config from: {}", path.display());
        Ok(Self::new(config))
    }

    /// Open a document in a fresh engine.
    pub fn open(&self, path: &Path) -> Result<Engine, AppError> {
        let markup = read(path)?;
        let mut engine = Engine::new(self.config.clone())?;
        engine.import_svg(&markup)?;
        log::info!(
            "Opened {} ({} elements)",
            path.display(),
            engine.scene().len()
        );
        Ok(engine)
    }

    /// Element snapshots of a document as pretty JSON.
    pub fn inspect(&self, path: &Path) -> Result<String, AppError> {
        let engine = self.open(path)?;
        Ok(serde_json::to_string_pretty(&engine.elements())?)
    }

    /// Import and re-export a document. Foreign markup comes out with
    /// native metadata.
    pub fn normalize(&self, path: &Path) -> Result<String, AppError> {
        let engine = self.open(path)?;
        Ok(engine.export_svg()?)
    }

    /// Replay a script against a document and export the result. Stops at
    /// the first failing operation.
    pub fn apply(&self, path: &Path, script: &Path) -> Result<String, AppError> {
        let operations = parse_script(&read(script)?).map_err(|source| AppError::Script {
            path: script.to_path_buf(),
            source,
        })?;
        let mut engine = self.open(path)?;
        run_operations(&mut engine, &operations)?;
        Ok(engine.export_svg()?)
    }
}

pub fn run_operations(engine: &mut Engine, operations: &[Operation]) -> Result<(), AppError> {
    for (index, op) in operations.iter().enumerate() {
        log::debug!("op {index}: {}", op.name());
        op.apply(engine).map_err(|source| AppError::Operation {
            index,
            op: op.name(),
            source,
        })?;
    }
    log::info!("Applied {} operation(s)", operations.len());
    Ok(())
}

/// Keyboard shortcut reference, one per line.
pub fn shortcut_table() -> String {
    ShortcutRegistry::all()
        .iter()
        .map(|s| format!("{:<14} {}\n", s.format(), s.description))
        .collect()
}

/// Write to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<(), AppError> {
    match path {
        Some(path) => {
            std::fs::write(path, content).map_err(|source| AppError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonlight_core::ImportError;
    use tempfile::TempDir;

    const EMPTY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600"/>"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_normalize_foreign_markup() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "plain.svg",
            r#"<svg width="100" height="50"><rect x="1" y="2" width="10" height="5"/></svg>"#,
        );
        let app = App::default();
        let normalized = app.normalize(&input).unwrap();
        assert!(normalized.contains(r#"data-moonlight="1""#));
        assert!(normalized.contains(r#"data-element-type="rect""#));

        // Normalizing is idempotent
        let output = dir.path().join("out.svg");
        write_output(Some(&output), &normalized).unwrap();
        assert_eq!(app.normalize(&output).unwrap(), normalized);
    }

    #[test]
    fn test_apply_script() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "doc.svg", EMPTY);
        let script = write(
            &dir,
            "ops.json",
            r#"[
                {"op": "insert", "shape": "rectangle", "x": 100, "y": 100},
                {"op": "insert", "shape": "circle"},
                {"op": "undo"},
                {"op": "move", "ids": ["el-1"], "dx": 20, "dy": 0}
            ]"#,
        );
        let app = App::default();
        let markup = app.apply(&input, &script).unwrap();
        let output = write(&dir, "result.svg", &markup);

        let json = app.inspect(&output).unwrap();
        let elements: serde_json::Value = serde_json::from_str(&json).unwrap();
        let elements = elements.as_array().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["id"], "el-1");
        assert_eq!(elements[0]["x"], 60.0);
    }

    #[test]
    fn test_failing_operation_reports_index() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "doc.svg", EMPTY);
        let script = write(
            &dir,
            "ops.json",
            r#"[{"op": "select-all"}, {"op": "select", "ids": ["el-9"]}]"#,
        );
        let err = App::default().apply(&input, &script).unwrap_err();
        assert!(matches!(
            err,
            AppError::Operation {
                index: 1,
                op: "select",
                source: EngineError::UnknownElement(_)
            }
        ));
    }

    #[test]
    fn test_errors() {
        let dir = TempDir::new().unwrap();
        let app = App::default();
        assert!(matches!(
            app.inspect(&dir.path().join("missing.svg")),
            Err(AppError::Read { .. })
        ));

        let broken = write(&dir, "broken.svg", "<html/>");
        assert!(matches!(
            app.normalize(&broken),
            Err(AppError::Engine(EngineError::Import(ImportError::MissingRoot)))
        ));

        let input = write(&dir, "doc.svg", EMPTY);
        let script = write(&dir, "ops.json", "{ not json");
        assert!(matches!(
            app.apply(&input, &script),
            Err(AppError::Script { .. })
        ));
    }

    #[test]
    fn test_config_file() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "config.json", r#"{"gridSnap": true, "gridSize": 25}"#);
        let app = App::from_config_file(Some(&config)).unwrap();
        let input = write(&dir, "doc.svg", EMPTY);
        let engine = app.open(&input).unwrap();
        assert!(engine.config().gridsnap);
        assert_eq!(engine.config().grid_size, 25.0);
    }

    #[test]
    fn test_shortcut_table() {
        let table = shortcut_table();
        assert!(table.contains("Ctrl+Shift+Z"));
        assert!(table.lines().count() >= 20);
    }
}
