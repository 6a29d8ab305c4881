use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid delimiter '{0}'. Expected a single ASCII character or 'tab'.")]
    InvalidDelimiter(String),

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),
}

/// Accepts one ASCII character, or `tab`/`\t` for a tab.
pub fn parse_delimiter(value: &str) -> Result<u8, ParseError> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(*byte),
            _ => Err(ParseError::InvalidDelimiter(value.to_string())),
        },
    }
}

/// Splits a `KEY=VALUE` pair at the first `=`. The value may be empty.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value))
}
