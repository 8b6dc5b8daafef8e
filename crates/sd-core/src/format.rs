//! Document formatting pipeline: load → emit.
//!
//! Single idempotent entry point for normalizing hand-written markup into
//! the canonical form the editor saves.

use crate::emitter::{EmitConfig, emit_document_with};
use crate::error::LoadError;
use crate::metadata::Registry;
use crate::model::Document;
use crate::resolve::TypeResolver;

// ─── Pipeline ─────────────────────────────────────────────────────────────

/// Load markup and re-emit it in canonical form.
///
/// The output is idempotent: formatting it again yields the same text.
///
/// # Errors
/// Returns the load error if the input is not well-formed markup.
pub fn format_markup(
    text: &str,
    registry: &Registry,
    resolver: &dyn TypeResolver,
    config: &EmitConfig,
) -> Result<String, LoadError> {
    let doc = Document::load(text, registry, resolver)?;
    Ok(emit_document_with(&doc, registry, config))
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::RegistryResolver;

    fn format(input: &str) -> String {
        let registry = Registry::builtin();
        format_markup(
            input,
            &registry,
            &RegistryResolver::new(&registry),
            &EmitConfig::default(),
        )
        .expect("format failed")
    }

    #[test]
    fn format_markup_is_idempotent() {
        let input = r#"<?import javafx.scene.control.*?>
<?import javafx.scene.layout.*?>
<!-- login form -->
<VBox spacing='8'>
    <Label text="User"/>
    <Button text="Sign in" defaultButton="true"/>
</VBox>
"#;
        let first = format(input);
        let second = format(&first);
        assert_eq!(first, second, "format must be idempotent");
    }

    #[test]
    fn format_markup_makes_default_slots_explicit() {
        let output = format("<?import javafx.scene.layout.*?><HBox><Pane/></HBox>");
        assert!(output.contains("<children>"), "default property should be written out");
    }

    #[test]
    fn format_markup_reports_errors() {
        let registry = Registry::builtin();
        let result = format_markup(
            "<VBox>",
            &registry,
            &RegistryResolver::new(&registry),
            &EmitConfig::default(),
        );
        assert!(matches!(result, Err(LoadError::Syntax { .. })));
    }
}
