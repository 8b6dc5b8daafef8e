//! Component type resolution.
//!
//! The loader does not decide on its own what a markup type name refers to;
//! it asks a `TypeResolver`. This keeps loading pure and lets a host plug in
//! its own class path. `RegistryResolver` answers from a `Registry`.

use crate::metadata::{ClassName, Registry};

// ─── Resolver Trait ──────────────────────────────────────────────────────

/// Maps a type name written in markup to a registered class.
pub trait TypeResolver {
    /// Resolve `type_name` (simple or fully qualified) in the scope of the
    /// document's `<?import ...?>` targets. `None` leaves the node
    /// unresolved.
    fn resolve(&self, type_name: &str, imports: &[String]) -> Option<ClassName>;
}

// ─── Registry Resolver ───────────────────────────────────────────────────

/// Resolves names against the classes of a registry, honoring explicit
/// (`javafx.scene.control.Button`) and wildcard (`javafx.scene.control.*`)
/// imports. `java.lang` is always in scope.
#[derive(Debug, Clone, Copy)]
pub struct RegistryResolver<'a> {
    registry: &'a Registry,
}

impl<'a> RegistryResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }
}

fn is_qualified(type_name: &str) -> bool {
    type_name
        .rsplit_once('.')
        .is_some_and(|(package, _)| package.starts_with(|c: char| c.is_ascii_lowercase()))
}

impl TypeResolver for RegistryResolver<'_> {
    fn resolve(&self, type_name: &str, imports: &[String]) -> Option<ClassName> {
        if is_qualified(type_name) {
            return self.registry.resolve_qualified(type_name);
        }

        for import in imports {
            let candidate = match import.strip_suffix(".*") {
                Some(package) => format!("{package}.{type_name}"),
                None if import.rsplit('.').next() == Some(type_name) => import.clone(),
                None => continue,
            };
            if let Some(class) = self.registry.resolve_qualified(&candidate) {
                return Some(class);
            }
        }

        self.registry
            .resolve_qualified(&format!("java.lang.{type_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn explicit_and_wildcard_imports() {
        let registry = Registry::builtin();
        let resolver = RegistryResolver::new(&registry);
        let scope = imports(&["javafx.scene.control.Button", "javafx.scene.layout.*"]);

        assert_eq!(resolver.resolve("Button", &scope), Some(ClassName::of("Button")));
        assert_eq!(resolver.resolve("GridPane", &scope), Some(ClassName::of("GridPane")));
        assert_eq!(resolver.resolve("Label", &scope), None);
    }

    #[test]
    fn qualified_names_and_java_lang() {
        let registry = Registry::builtin();
        let resolver = RegistryResolver::new(&registry);

        assert_eq!(
            resolver.resolve("javafx.scene.control.Label", &[]),
            Some(ClassName::of("Label"))
        );
        assert_eq!(resolver.resolve("String", &[]), Some(ClassName::of("String")));
        assert_eq!(resolver.resolve("com.example.Missing", &[]), None);
    }

    #[test]
    fn custom_classes_resolve_through_imports() {
        let mut registry = Registry::builtin();
        let fancy = registry
            .register_custom("FancyBox", "com.example.FancyBox", &["VBox"])
            .unwrap();
        let resolver = RegistryResolver::new(&registry);
        assert_eq!(
            resolver.resolve("FancyBox", &imports(&["com.example.*"])),
            Some(fancy)
        );
    }
}
