use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TestgenResult<T> = Result<T, TestgenError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestgenErrorCategory {
    InputValidationError,
    MissingDependencyError,
    ParseError,
    IoSystemError,
    ExternalToolError,
    InternalError,
}

impl TestgenErrorCategory {
    pub const fn exit_mapping(self) -> ExitMapping {
        match self {
            Self::InputValidationError => ExitMapping {
                exit_code: 2,
                rust_category: "InputValidationError",
                diagnostic_class: "INPUT",
            },
            Self::MissingDependencyError => ExitMapping {
                exit_code: 3,
                rust_category: "MissingDependencyError",
                diagnostic_class: "MISSING",
            },
            Self::ParseError => ExitMapping {
                exit_code: 4,
                rust_category: "ParseError",
                diagnostic_class: "PARSE",
            },
            Self::IoSystemError => ExitMapping {
                exit_code: 5,
                rust_category: "IoSystemError",
                diagnostic_class: "IO",
            },
            Self::ExternalToolError => ExitMapping {
                exit_code: 6,
                rust_category: "ExternalToolError",
                diagnostic_class: "TOOL",
            },
            Self::InternalError => ExitMapping {
                exit_code: 7,
                rust_category: "InternalError",
                diagnostic_class: "SYS",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_mapping().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_mapping().rust_category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitMapping {
    pub exit_code: i32,
    pub rust_category: &'static str,
    pub diagnostic_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestgenError {
    category: TestgenErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl TestgenError {
    pub fn new(
        category: TestgenErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            TestgenErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn missing_dependency(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            TestgenErrorCategory::MissingDependencyError,
            placeholder,
            message,
        )
    }

    pub fn parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(TestgenErrorCategory::ParseError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(TestgenErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn external_tool(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(TestgenErrorCategory::ExternalToolError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(TestgenErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> TestgenErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for TestgenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for TestgenError {}

#[cfg(test)]
mod tests {
    use super::{TestgenError, TestgenErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (
                TestgenErrorCategory::InputValidationError,
                2,
                "InputValidationError",
                "INPUT",
            ),
            (
                TestgenErrorCategory::MissingDependencyError,
                3,
                "MissingDependencyError",
                "MISSING",
            ),
            (TestgenErrorCategory::ParseError, 4, "ParseError", "PARSE"),
            (TestgenErrorCategory::IoSystemError, 5, "IoSystemError", "IO"),
            (
                TestgenErrorCategory::ExternalToolError,
                6,
                "ExternalToolError",
                "TOOL",
            ),
            (TestgenErrorCategory::InternalError, 7, "InternalError", "SYS"),
        ];

        for (category, exit_code, rust_category, diagnostic_class) in cases {
            let mapping = category.exit_mapping();
            assert_eq!(mapping.exit_code, exit_code);
            assert_eq!(mapping.rust_category, rust_category);
            assert_eq!(mapping.diagnostic_class, diagnostic_class);
        }
    }

    #[test]
    fn error_renders_diagnostic_lines() {
        let error = TestgenError::missing_dependency(
            "MISSING.GRAPH",
            "graph file not found for template 'simple'",
        );

        assert_eq!(error.exit_code(), 3);
        assert_eq!(error.category(), TestgenErrorCategory::MissingDependencyError);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [MISSING.GRAPH] graph file not found for template 'simple'"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 3");
        assert_eq!(
            error.to_string(),
            "MissingDependencyError [MISSING.GRAPH] graph file not found for template 'simple'"
        );
    }
}
