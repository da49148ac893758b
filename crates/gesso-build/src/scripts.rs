//! Script entries.

use std::fs;
use std::path::Path;

use oxc::allocator::Allocator;
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::builder::BuildError;

/// Read and syntax-check one script entry.
///
/// Module-graph bundling is out of scope; entries are emitted as written and
/// module semantics are left to the browser. Parsing up front turns syntax
/// errors into build errors instead of broken pages.
pub fn compile(entry: &Path) -> Result<String, BuildError> {
    let source = fs::read_to_string(entry).map_err(|e| BuildError::Read {
        path: entry.display().to_string(),
        message: e.to_string(),
    })?;

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(entry).unwrap_or_default();
    let ret = Parser::new(&allocator, &source, source_type).parse();

    if !ret.errors.is_empty() {
        return Err(BuildError::Script {
            path: entry.display().to_string(),
            message: format!("{:?}", ret.errors),
        });
    }

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn passes_valid_scripts_through() {
        let temp = tempdir().unwrap();
        let entry = temp.path().join("main.js");
        let source = "const greeting = \"hello\";\nconsole.log(greeting);\n";
        fs::write(&entry, source).unwrap();

        assert_eq!(compile(&entry).unwrap(), source);
    }

    #[test]
    fn syntax_errors_fail_the_build() {
        let temp = tempdir().unwrap();
        let entry = temp.path().join("main.js");
        fs::write(&entry, "const = ;").unwrap();

        let err = compile(&entry).unwrap_err();

        assert!(matches!(err, BuildError::Script { .. }));
    }

    #[test]
    fn missing_entry_is_a_read_error() {
        let temp = tempdir().unwrap();

        let err = compile(&temp.path().join("absent.js")).unwrap_err();

        assert!(matches!(err, BuildError::Read { .. }));
    }
}
