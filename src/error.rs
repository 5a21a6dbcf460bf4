/// What went wrong, at a granularity callers can match on.
///
/// Parse-stage kinds carry the offending field or token in the error message;
/// fit-stage kinds carry the model and iteration context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required procpar field is absent.
    MissingField,
    /// A procpar field exists but cannot be coerced to the expected type.
    TypeMismatch,
    /// The nucleus is not in the gyromagnetic ratio table.
    UnsupportedNucleus,
    /// A retained integration-log token is not numeric.
    MalformedRecord,
    /// The integration log has no non-empty records.
    EmptyLog,
    /// The intensity maximum is non-positive, so normalization is undefined.
    DegenerateSeries,
    /// Gradient and intensity series have different lengths.
    LengthMismatch,
    /// The solver exhausted its iteration/tolerance budget.
    FitDidNotConverge,
    /// The covariance matrix cannot be estimated.
    SingularCovariance,
    /// Filesystem failure (open/read/write).
    Io,
    /// Bad CLI arguments or configuration.
    Usage,
}

impl ErrorKind {
    /// Process exit code for this kind: 2 = input/usage, 3 = data, 4 = fit.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::MissingField
            | ErrorKind::TypeMismatch
            | ErrorKind::MalformedRecord
            | ErrorKind::EmptyLog
            | ErrorKind::Io
            | ErrorKind::Usage => 2,
            ErrorKind::UnsupportedNucleus
            | ErrorKind::DegenerateSeries
            | ErrorKind::LengthMismatch => 3,
            ErrorKind::FitDidNotConverge | ErrorKind::SingularCovariance => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
