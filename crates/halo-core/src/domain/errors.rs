pub type HaloResult<T> = Result<T, HaloError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HaloErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    TransportError,
    SchemaError,
    InternalError,
}

impl HaloErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::TransportError => 4,
            Self::SchemaError => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::TransportError => "TransportError",
            Self::SchemaError => "SchemaError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} [{placeholder}] {message}", .category.as_str())]
pub struct HaloError {
    category: HaloErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl HaloError {
    pub fn new(
        category: HaloErrorCategory,
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
            HaloErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HaloErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn transport(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HaloErrorCategory::TransportError, placeholder, message)
    }

    pub fn schema(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HaloErrorCategory::SchemaError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(HaloErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> HaloErrorCategory {
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
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}
