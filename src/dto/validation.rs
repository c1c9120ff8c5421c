//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::scoring::team::is_valid_score;

/// Validates that a score lies in `[-1, 100]`, `-1` meaning "did not participate".
///
/// # Examples
///
/// ```ignore
/// validate_score(85.5) // Ok
/// validate_score(-1.0) // Ok - absent
/// validate_score(101.0) // Err - above maximum
/// ```
pub fn validate_score(score: f64) -> Result<(), ValidationError> {
    if !is_valid_score(score) {
        let mut err = ValidationError::new("score_range");
        err.message = Some(format!("Score must be between -1 and 100 (got {score})").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a rank is empty or a positive whole number.
pub fn validate_rank(rank: &str) -> Result<(), ValidationError> {
    if rank.is_empty() {
        return Ok(());
    }

    match rank.parse::<u32>() {
        Ok(value) if value > 0 && !rank.starts_with('0') => Ok(()),
        _ => {
            let mut err = ValidationError::new("rank_format");
            err.message = Some(format!("Rank must be empty or a positive number (got `{rank}`)").into());
            Err(err)
        }
    }
}

/// Validates that a destructive operation was explicitly confirmed.
pub fn validate_confirmed(confirm: bool) -> Result<(), ValidationError> {
    if confirm {
        Ok(())
    } else {
        let mut err = ValidationError::new("confirmation_required");
        err.message = Some("This operation requires `confirm: true`".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(-1.0).is_ok());
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(100.0).is_ok());
        assert!(validate_score(100.5).is_err());
        assert!(validate_score(-0.5).is_ok());
        assert!(validate_score(-2.0).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_rank_format() {
        assert!(validate_rank("").is_ok());
        assert!(validate_rank("1").is_ok());
        assert!(validate_rank("12").is_ok());
        assert!(validate_rank("0").is_err());
        assert!(validate_rank("01").is_err());
        assert!(validate_rank("first").is_err());
        assert!(validate_rank("-3").is_err());
    }

    #[test]
    fn test_validate_confirmed() {
        assert!(validate_confirmed(true).is_ok());
        assert!(validate_confirmed(false).is_err());
    }
}
