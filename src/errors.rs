use thiserror::Error;
use tide::StatusCode;

/**
 * Application error taxonomy
 *
 * Every failure is terminal for the triggering request; nothing here is
 * retried and nothing is fatal to the process. Write failures must leave
 * in-memory state exactly as it was.
 */
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("not allowed: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("storage write rejected: {0}")]
    WriteFailure(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::Unauthorized,
            AppError::Forbidden(_) => StatusCode::Forbidden,
            AppError::NotFound(_) => StatusCode::NotFound,
            AppError::Conflict(_) => StatusCode::Conflict,
            AppError::Invalid(_) => StatusCode::BadRequest,
            AppError::WriteFailure(_) | AppError::Database(_) => {
                StatusCode::InternalServerError
            }
        }
    }
}

impl From<AppError> for tide::Error {
    fn from(err: AppError) -> Self {
        tide::Error::from_str(err.status(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::Unauthorized);
        assert_eq!(AppError::Forbidden("nope").status(), StatusCode::Forbidden);
        assert_eq!(AppError::NotFound("poll").status(), StatusCode::NotFound);
        assert_eq!(
            AppError::Conflict("already in this crew").status(),
            StatusCode::Conflict
        );
        assert_eq!(
            AppError::Invalid("bad".to_string()).status(),
            StatusCode::BadRequest
        );
        assert_eq!(
            AppError::WriteFailure(sqlx::Error::PoolClosed).status(),
            StatusCode::InternalServerError
        );
    }

    #[test]
    fn not_found_names_the_missing_thing() {
        let err = AppError::NotFound("poll");
        assert_eq!(err.to_string(), "poll not found");
    }
}
