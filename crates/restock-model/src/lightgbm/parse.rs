//! `key=value` and `key=v1 v2 ...` line parsing.

use crate::error::{ModelError, ModelResult};
use std::fmt::Display;
use std::str::FromStr;

pub(crate) fn parse_value<T>(line: &str, prefix: &str) -> ModelResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = line
        .strip_prefix(prefix)
        .ok_or_else(|| ModelError::Parse(format!("expected a line starting with {prefix}")))?;
    raw.trim()
        .parse::<T>()
        .map_err(|err| ModelError::Parse(format!("bad value for {prefix} in \"{line}\": {err}")))
}

pub(crate) fn parse_array<T>(line: &str, prefix: &str) -> ModelResult<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = line
        .strip_prefix(prefix)
        .ok_or_else(|| ModelError::Parse(format!("expected a line starting with {prefix}")))?;
    raw.split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|err| ModelError::Parse(format!("bad value {token} for {prefix}: {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<usize>("num_leaves=31", "num_leaves=").unwrap(), 31);
        assert!(parse_value::<usize>("num_leaves=x", "num_leaves=").is_err());
        assert!(parse_value::<usize>("leaves=3", "num_leaves=").is_err());
    }

    #[test]
    fn test_parse_array() {
        let values: Vec<f64> = parse_array("threshold=1.5 -2 1e-35", "threshold=").unwrap();
        assert_eq!(values, vec![1.5, -2.0, 1e-35]);
        let empty: Vec<i32> = parse_array("left_child=", "left_child=").unwrap();
        assert!(empty.is_empty());
    }
}
