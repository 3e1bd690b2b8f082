//! Errors raised while parsing or evaluating an expression.

/// Result alias used throughout the expression module.
pub type Result<T> = std::result::Result<T, ExpressionError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    /// Malformed source text. `position` is a byte offset into the source.
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// The expression names a namespace that no model was registered for.
    #[error("no model with name '{name}' defined")]
    UnknownModel { name: String },

    /// A strict lookup hit a path the model does not have.
    #[error("value of {path} is undefined, set strict to false to allow undefined values")]
    UndefinedValue { path: String },

    #[error("type error: {message}")]
    Type { message: String },

    #[error("division by zero")]
    DivisionByZero,
}

impl ExpressionError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> ExpressionError {
        ExpressionError::Type {
            message: message.into(),
        }
    }

    /// `true` for errors caused by the source text itself.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ExpressionError::Syntax { .. })
    }

    /// `true` for errors caused by models that do not match the expression.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            ExpressionError::UnknownModel { .. } | ExpressionError::UndefinedValue { .. }
        )
    }
}
