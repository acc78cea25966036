use crate::ts::errors::TreeSitterError;
use ast_grep_language::SupportLang;
use std::fmt;
use std::str::FromStr;

/// Languages with a built-in view over project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Java,
    Scala,
    Python,
    Yaml,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::Rust,
        Language::Java,
        Language::Scala,
        Language::Python,
        Language::Yaml,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Scala => "scala",
            Language::Python => "python",
            Language::Yaml => "yaml",
        }
    }

    /// Grammar bundled with ast-grep.
    pub fn support_lang(self) -> SupportLang {
        match self {
            Language::Rust => SupportLang::Rust,
            Language::Java => SupportLang::Java,
            Language::Scala => SupportLang::Scala,
            Language::Python => SupportLang::Python,
            Language::Yaml => SupportLang::Yaml,
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Java => &["java"],
            Language::Scala => &["scala", "sc"],
            Language::Python => &["py"],
            Language::Yaml => &["yml", "yaml"],
        }
    }

    /// Dynamic type name of the file view, as used in `/YamlFile()`.
    pub fn view_type_name(self) -> &'static str {
        match self {
            Language::Rust => "RustFile",
            Language::Java => "JavaFile",
            Language::Scala => "ScalaFile",
            Language::Python => "PythonFile",
            Language::Yaml => "YamlFile",
        }
    }

    /// Tag carried by every node of the view.
    pub fn node_tag(self) -> &'static str {
        match self {
            Language::Rust => "RustNode",
            Language::Java => "JavaNode",
            Language::Scala => "ScalaNode",
            Language::Python => "PythonNode",
            Language::Yaml => "YamlNode",
        }
    }

    /// Tags the view's nodes can carry.
    pub fn tags(self) -> Vec<&'static str> {
        let mut tags = vec![self.node_tag()];
        if self == Language::Yaml {
            tags.extend(["YamlKeyValue", "YamlString", "YamlMap", "YamlSequence"]);
        }
        tags
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&extension.as_str()))
    }

    /// Language of a `/`-separated path, by extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (stem, extension) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = TreeSitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Language::Rust),
            "java" => Ok(Language::Java),
            "scala" => Ok(Language::Scala),
            "python" | "py" => Ok(Language::Python),
            "yaml" | "yml" => Ok(Language::Yaml),
            _ => Err(TreeSitterError::UnsupportedLanguage {
                name: s.to_string(),
            }),
        }
    }
}
