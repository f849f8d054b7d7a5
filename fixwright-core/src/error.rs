//! Generation error taxonomy with breadcrumb paths.

use std::fmt;

/// What went wrong during generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateErrorKind {
    /// No usable constructor was found, or the class cannot be instantiated.
    Initialization { class: String, reason: String },
    /// The recursion depth ceiling was exceeded, signaling a likely cyclic type graph.
    PossibleCycle { depth: usize },
    /// A capability or field could not be accessed or was never generated.
    MethodExecution { message: String },
    /// The specification contradicts itself or the declared types.
    IllegalArgument { message: String },
    /// A textual value could not be converted to the target class.
    Conversion {
        class: String,
        input: String,
        message: String,
    },
}

/// A fatal generation error carrying the chain of path segments from the
/// failure site back to the top-level call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateError {
    kind: GenerateErrorKind,
    path: Vec<String>,
}

impl GenerateError {
    pub fn new(kind: GenerateErrorKind) -> Self {
        Self {
            kind,
            path: Vec::new(),
        }
    }

    pub fn initialization(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::Initialization {
            class: class.into(),
            reason: reason.into(),
        })
    }

    pub fn possible_cycle(depth: usize) -> Self {
        Self::new(GenerateErrorKind::PossibleCycle { depth })
    }

    pub fn method_execution(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::MethodExecution {
            message: message.into(),
        })
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::IllegalArgument {
            message: message.into(),
        })
    }

    pub fn conversion(
        class: impl Into<String>,
        input: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(GenerateErrorKind::Conversion {
            class: class.into(),
            input: input.into(),
            message: message.into(),
        })
    }

    pub fn kind(&self) -> &GenerateErrorKind {
        &self.kind
    }

    /// Path segments from the outermost call site to the failure site.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Prepends a path segment while the error unwinds.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            GenerateErrorKind::Initialization { class, reason } => {
                write!(f, "cannot instantiate '{class}': {reason}")?;
            }
            GenerateErrorKind::PossibleCycle { depth } => {
                write!(f, "possible cycle detected at depth {depth}")?;
            }
            GenerateErrorKind::MethodExecution { message } => write!(f, "{message}")?,
            GenerateErrorKind::IllegalArgument { message } => write!(f, "{message}")?,
            GenerateErrorKind::Conversion {
                class,
                input,
                message,
            } => {
                write!(f, "cannot convert '{input}' to '{class}': {message}")?;
            }
        }
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path.join("."))?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_accumulate_outermost_first() {
        let error = GenerateError::possible_cycle(21)
            .with_segment("next")
            .with_segment("head")
            .with_segment("chain");
        assert_eq!(error.path(), ["chain", "head", "next"]);
        assert_eq!(
            error.to_string(),
            "possible cycle detected at depth 21 (at chain.head.next)"
        );
    }

    #[test]
    fn conversion_error_names_class_and_input() {
        let error = GenerateError::conversion("i32", "seven", "invalid digit");
        assert_eq!(
            error.to_string(),
            "cannot convert 'seven' to 'i32': invalid digit"
        );
    }
}
