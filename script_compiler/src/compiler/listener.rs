//! Hooks a host application can install on a [`ScriptCompiler`](super::ScriptCompiler)

use super::CompileError;
use crate::ast::{AbstractTree, NodeId};
use crate::file_processor::FileProcessor;
use crate::log_warning;
use crate::script::ConcreteNode;
use std::path::{Path, PathBuf};

/// Questions the compiler asks while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerEvent<'a> {
    /// Whether an object of class `cls` directly inside `parent` takes no
    /// name. Answering `None` keeps the built-in rules.
    NameExclusion {
        cls: &'a str,
        parent: Option<&'a str>,
    },
}

/// Every hook has a default, so listeners implement only what they need
pub trait CompilerListener {
    /// Source text of an imported script, or `None` when it cannot be found
    fn import_file(&mut self, _name: &str) -> Option<String> {
        None
    }

    /// Sees the concrete tree before it is converted
    fn pre_conversion(&mut self, _file: &str, _nodes: &mut Vec<ConcreteNode>) {}

    /// Sees the finished tree before translation. Returning false stops the
    /// compile without translating anything.
    fn post_conversion(&mut self, _tree: &AbstractTree, _roots: &[NodeId]) -> bool {
        true
    }

    /// Returning true marks the error as handled, so the compiler does not
    /// log it. It is recorded either way.
    fn handle_error(&mut self, _error: &CompileError) -> bool {
        false
    }

    fn handle_event(&mut self, _event: &CompilerEvent<'_>) -> Option<bool> {
        None
    }
}

/// Resolves imports relative to a directory
#[derive(Debug, Clone)]
pub struct DirectoryImporter {
    root: PathBuf,
    processor: FileProcessor,
}

impl DirectoryImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            processor: FileProcessor::new().with_performance_logging(false),
        }
    }

    /// Importer for the directory holding `script`
    pub fn for_script(script: &Path) -> Self {
        Self::new(script.parent().unwrap_or_else(|| Path::new(".")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CompilerListener for DirectoryImporter {
    fn import_file(&mut self, name: &str) -> Option<String> {
        let path = self.root.join(name);
        let path_str = path.to_string_lossy();
        match self.processor.process_file(&path_str) {
            Ok(result) => Some(result.source),
            Err(e) => {
                log_warning!("Import could not be read", "import" => name, "error" => e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_directory_importer_reads_siblings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.material"), "material Base\n{\n}\n").unwrap();

        let mut importer = DirectoryImporter::for_script(&dir.path().join("main.material"));
        assert_eq!(importer.root(), dir.path());
        assert_eq!(
            importer.import_file("base.material").as_deref(),
            Some("material Base\n{\n}\n")
        );
        assert_eq!(importer.import_file("missing.material"), None);
    }

    #[test]
    fn test_default_hooks() {
        struct Silent;
        impl CompilerListener for Silent {}

        let mut listener = Silent;
        let event = CompilerEvent::NameExclusion {
            cls: "emitter",
            parent: Some("particle_system"),
        };
        assert_eq!(listener.handle_event(&event), None);
        assert!(listener.post_conversion(&AbstractTree::new(), &[]));
        assert_eq!(listener.import_file("x"), None);
    }
}
