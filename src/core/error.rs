use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Script parse error: {0}")]
    ScriptError(#[from] serde_json::Error),

    #[error("Symbol redefinition or illegal symbol name: '{0}'")]
    SymbolRedefinition(String),

    #[error("Cannot resolve alias '{symbol}' with source '{source_id}' under the requested kinds")]
    UnresolvedSource { symbol: String, source_id: String },

    #[error("Rule for '{target}' failed to compile: {message}")]
    RuleCompile { target: String, message: String },

    #[error("Circular reference detected in morph rule for '{target}' through symbol '{symbol}'")]
    CircularReference { target: String, symbol: String },

    #[error("Attempting to overwrite a Setter with an Adder: '{0}'. The Adder will be ignored.")]
    SetterCollision(String),
}

pub type Result<T> = std::result::Result<T, RulesError>;
