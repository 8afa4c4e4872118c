use crate::model::ContributionTriple;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidResult {
    #[error("expected 3 comma-separated values, got {count} in '{raw}'")]
    Arity { count: usize, raw: String },
    #[error("'{token}' is not an integer in '{raw}'")]
    NotInteger { token: String, raw: String },
}

pub fn parse_triple(raw: &str) -> Result<ContributionTriple, InvalidResult> {
    let text = raw.trim();
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    if tokens.len() != 3 {
        return Err(InvalidResult::Arity {
            count: tokens.len(),
            raw: text.to_string(),
        });
    }

    let mut values = [0i64; 3];
    for (slot, token) in values.iter_mut().zip(&tokens) {
        *slot = token.parse().map_err(|_| InvalidResult::NotInteger {
            token: token.to_string(),
            raw: text.to_string(),
        })?;
    }

    Ok(ContributionTriple::new(values[0], values[1], values[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_three_integers() {
        assert_eq!(parse_triple("12,4,8").unwrap(), ContributionTriple::new(12, 4, 8));
    }

    #[test]
    fn tolerates_whitespace_and_negatives() {
        assert_eq!(
            parse_triple(" 3 , 10 ,-7\n").unwrap(),
            ContributionTriple::new(3, 10, -7)
        );
    }

    #[test]
    fn net_is_taken_verbatim() {
        assert_eq!(
            parse_triple("12,4,100").unwrap(),
            ContributionTriple::new(12, 4, 100)
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        assert_eq!(
            parse_triple("12,4"),
            Err(InvalidResult::Arity {
                count: 2,
                raw: "12,4".into()
            })
        );
        assert!(matches!(parse_triple("1,2,3,4"), Err(InvalidResult::Arity { count: 4, .. })));
        assert!(matches!(parse_triple(""), Err(InvalidResult::Arity { count: 1, .. })));
    }

    #[test]
    fn rejects_non_integers() {
        assert_eq!(
            parse_triple("12,x,8"),
            Err(InvalidResult::NotInteger {
                token: "x".into(),
                raw: "12,x,8".into()
            })
        );
        assert!(parse_triple("1.5,2,3").is_err());
    }

    #[test]
    fn rejects_output_of_empty_log() {
        // awk prints unset accumulators as empty strings
        assert!(matches!(parse_triple(",,"), Err(InvalidResult::NotInteger { .. })));
    }
}
