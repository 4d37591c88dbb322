//! Input checks shared by the handlers. Each failure names its field.

use crate::error::ApiError;

pub fn name(field: &'static str, value: &str) -> Result<(), ApiError> {
    let len = value.trim().chars().count();
    if len == 0 || value.chars().count() > 255 {
        return Err(ApiError::validation(field, format!("{field} must be between 1 and 255 characters")));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::validation("email", "invalid email address");
    if value.len() > 255 || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.len() < 2 {
        return Err(invalid());
    }
    Ok(())
}

pub fn range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ApiError> {
    if value < min || value > max {
        return Err(ApiError::validation(field, format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

pub fn positive(field: &'static str, value: i64) -> Result<(), ApiError> {
    if value < 1 {
        return Err(ApiError::validation(field, format!("{field} must be at least 1")));
    }
    Ok(())
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Resolve `?page=&limit=` into `(page, limit, offset)`.
pub fn pagination(page: Option<i64>, limit: Option<i64>) -> Result<(i64, i64, i64), ApiError> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    positive("page", page)?;
    range("limit", limit, 1, MAX_PAGE_LIMIT)?;
    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| ApiError::validation("page", "page is out of range"))?;
    Ok((page, limit, offset))
}

/// Parse a numeric path segment.
pub fn path_id(field: &'static str, raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(field, format!("Invalid {} number", field.replace('_', " "))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(email("ruth@example.com").is_ok());
        assert!(email("a.b+c@sub.example.org").is_ok());
        assert!(email("").is_err());
        assert!(email("no-at-sign").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("ruth@localhost").is_err());
        assert!(email("ru th@example.com").is_err());
        assert!(email("a@b@example.com").is_err());
    }

    #[test]
    fn names() {
        assert!(name("first_name", "Ruth").is_ok());
        assert!(name("first_name", "   ").is_err());
        assert!(name("first_name", &"x".repeat(256)).is_err());
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        assert_eq!(pagination(None, None).unwrap(), (1, 10, 0));
        assert_eq!(pagination(Some(3), Some(5)).unwrap(), (3, 5, 10));
        assert!(pagination(Some(0), None).is_err());
        assert!(pagination(None, Some(101)).is_err());
        assert!(pagination(None, Some(0)).is_err());

        match pagination(Some(i64::MAX), Some(MAX_PAGE_LIMIT)) {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "page"),
            other => panic!("unexpected: {other:?}"),
        }
        let last = i64::MAX / MAX_PAGE_LIMIT + 1;
        assert!(pagination(Some(last), Some(MAX_PAGE_LIMIT)).is_ok());
    }

    #[test]
    fn path_ids() {
        assert_eq!(path_id("chapter", "12").unwrap(), 12);
        match path_id("chapter", "abc") {
            Err(ApiError::Validation { field, message }) => {
                assert_eq!(field, "chapter");
                assert_eq!(message, "Invalid chapter number");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match path_id("book_id", "x") {
            Err(ApiError::Validation { message, .. }) => assert_eq!(message, "Invalid book id number"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
