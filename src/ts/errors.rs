use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeSitterError {
    #[error("failed to set {language} grammar on tree-sitter parser")]
    LanguageSet { language: String },

    #[error("failed to parse {path} as {language}")]
    ParseFailed { path: String, language: String },

    #[error("unsupported language '{name}' (expected one of rust, java, scala, python, yaml)")]
    UnsupportedLanguage { name: String },
}
