use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MicrogrammarError {
    #[error("microgrammar '{name}' has an empty grammar")]
    EmptyGrammar { name: String },

    #[error("microgrammar '{name}' binds '${binding}' more than once")]
    DuplicateBinding { name: String, binding: String },

    #[error("microgrammar '{name}' has a '$' not followed by a binding name at byte {offset}")]
    DanglingBinding { name: String, offset: usize },

    #[error("microgrammar '{name}' does not compile: {message}")]
    InvalidPattern { name: String, message: String },
}
