// HTTP Status Codes

/// Status codes the renderer produces itself or maps its errors onto.
///
/// Handlers may render with any `u16`; this enum only names the ones the
/// crate needs to refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    Forbidden = 403,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::Forbidden => "Forbidden",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.code() >= 500
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.code()
    }
}
