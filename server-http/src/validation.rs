use crate::api::PageQuery;
use reel::domain::PageRequest;

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    MissingQuery,
    InvalidNumber { field: &'static str, value: String },
    OutOfRange { field: &'static str, value: u32, min: u32 },
    InvalidMovieId(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingQuery => write!(f, "Search query is required"),
            ValidationError::InvalidNumber { field, value } => {
                write!(f, "Field '{}' must be a positive integer, got '{}'", field, value)
            }
            ValidationError::OutOfRange { field, value, min } => {
                write!(f, "Field '{}' value {} is out of range (min: {})", field, value, min)
            }
            ValidationError::InvalidMovieId(id) => write!(f, "Invalid movie id '{}'", id),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Resolve `page`/`limit` against their defaults; both must be at least 1
pub fn page_request(query: &PageQuery) -> Result<PageRequest, ValidationError> {
    let page = parse_number("page", query.page.as_deref())?;
    let limit = parse_number("limit", query.limit.as_deref())?;
    Ok(PageRequest::new(page, limit))
}

/// The trimmed, non-blank search text
pub fn search_text(query: &PageQuery) -> Result<&str, ValidationError> {
    query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ValidationError::MissingQuery)
}

pub fn movie_id(raw: &str) -> Result<u64, ValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidMovieId(raw.to_string()))
}

fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        });
    }

    // No upper bound: anything past u32::MAX saturates
    let value = raw
        .parse::<u64>()
        .map_or(u32::MAX, |v| u32::try_from(v).unwrap_or(u32::MAX));

    if value < 1 {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: 1,
        });
    }

    Ok(Some(value))
}
