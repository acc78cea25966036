use crate::tree::{NodeError, NodeRef};
use crate::ts::language::Language;
use crate::ts::node::view_root;
use crate::types::TypeProvider;

/// Dynamic type exposing a file's language view (`/x.yml/YamlFile()`).
///
/// Finds nothing on contexts that are not files of the language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageType {
    language: Language,
}

impl LanguageType {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl TypeProvider for LanguageType {
    fn type_name(&self) -> &str {
        self.language.view_type_name()
    }

    fn find(&self, context: &NodeRef) -> Result<Vec<NodeRef>, NodeError> {
        let Some(file) = context.clone().into_file() else {
            return Ok(Vec::new());
        };
        if Language::from_path(&file.path()) != Some(self.language) {
            return Ok(Vec::new());
        }
        Ok(vec![view_root(file, self.language)? as NodeRef])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    #[test]
    fn finds_view_only_for_matching_files() {
        let project = Project::new("p");
        project.add_file("a.yml", "k: v\n").unwrap();
        project.add_file("b.rs", "fn main() {}\n").unwrap();
        let yaml = LanguageType::new(Language::Yaml);

        let a: NodeRef = project.file("a.yml").unwrap();
        let b: NodeRef = project.file("b.rs").unwrap();
        let found = yaml.find(&a).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address(), "/a.yml/YamlFile()");
        assert!(yaml.find(&b).unwrap().is_empty());
        assert!(yaml.find(&project.root()).unwrap().is_empty());
    }
}
