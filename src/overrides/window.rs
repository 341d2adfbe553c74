//! Text form of a window table: `left right c0 c1 ...` rows separated by `;`.

use nom::{
    IResult, Parser,
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map_res},
    multi::{many1, separated_list1},
    number::complete::double,
    sequence::{delimited, preceded},
};
use serde::{Deserialize, Deserializer};

use crate::window::{WindowDefinition, Windows, build_window_set};

use super::error::DeserializeError;

fn context_width(i: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>).parse(i)
}

fn window_row(i: &str) -> IResult<&str, WindowDefinition> {
    let (i, (left, _, right, coefficients)) = (
        context_width,
        space1,
        context_width,
        many1(preceded(space1, double)),
    )
        .parse(i)?;
    Ok((i, WindowDefinition::new(left, right, coefficients)))
}

/// Parse `;`-separated window rows, without checking coefficient counts.
pub fn parse_window_rows(input: &str) -> Result<Vec<WindowDefinition>, DeserializeError> {
    let result = all_consuming(separated_list1(
        char(';'),
        delimited(space0, window_row, space0),
    ))
    .parse(input);

    match result {
        Ok((_, rows)) => Ok(rows),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(DeserializeError::WindowSyntax {
            near: e.input.chars().take(20).collect(),
            kind: format!("{:?}", e.code),
        }),
        Err(nom::Err::Incomplete(needed)) => Err(DeserializeError::WindowSyntax {
            near: input.chars().take(20).collect(),
            kind: format!("{:?}", needed),
        }),
    }
}

pub(super) fn deserialize_windows<'de, D>(deserializer: D) -> Result<Option<Windows>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = <&'de str>::deserialize(deserializer)?;
    let rows = parse_window_rows(text).map_err(serde::de::Error::custom)?;
    build_window_set(rows)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use crate::overrides::error::DeserializeError;
    use crate::window::WindowDefinition;

    use super::parse_window_rows;

    #[test]
    fn rows() {
        assert_eq!(
            parse_window_rows("0 0 1.0;1 1 -0.5 0.0 0.5; 1 1 1.0 -2.0 1.0"),
            Ok(vec![
                WindowDefinition::new(0, 0, vec![1.0]),
                WindowDefinition::new(1, 1, vec![-0.5, 0.0, 0.5]),
                WindowDefinition::new(1, 1, vec![1.0, -2.0, 1.0]),
            ])
        );
    }

    #[test]
    fn single_row() {
        assert_eq!(
            parse_window_rows("0 0 1"),
            Ok(vec![WindowDefinition::new(0, 0, vec![1.0])])
        );
    }

    #[test]
    fn count_is_not_checked_here() {
        let rows = parse_window_rows("0 0 1.0;1 1 -0.5 0.5").unwrap();
        assert_eq!(rows[1].coefficients.len(), 2);
    }

    #[test]
    fn huge_context() {
        let rows = parse_window_rows("0 0 1.0;18446744073709551615 0 1.0").unwrap();
        assert_eq!(rows[1].left, usize::MAX);

        let err = parse_window_rows("0 0 1.0;18446744073709551616 0 1.0").unwrap_err();
        assert!(matches!(err, DeserializeError::WindowSyntax { .. }), "{err}");
    }

    #[test]
    fn missing_coefficients() {
        let err = parse_window_rows("0 0 1.0;1 1").unwrap_err();
        assert!(matches!(err, DeserializeError::WindowSyntax { .. }), "{err}");
    }
}
