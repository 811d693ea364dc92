use serde_json::Value;
use std::io::{self, Read};

/// Document piped in by another process. A terminal on stdin means nothing
/// was piped; whitespace-only input counts as absent too.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    parse_piped(io::stdin().lock())
}

fn parse_piped(mut reader: impl Read) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| format!("piped input is not a JSON document ({e})").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_pipe_is_absent() {
        assert!(parse_piped(&b" \n\t"[..]).unwrap().is_none());
    }

    #[test]
    fn test_piped_document_is_parsed() {
        let v = parse_piped(&br#"{"equity": "60000"}"#[..]).unwrap().unwrap();
        assert_eq!(v["equity"], "60000");
    }

    #[test]
    fn test_garbage_names_the_source() {
        let err = parse_piped(&b"price=300000"[..]).unwrap_err();
        assert!(err.to_string().starts_with("piped input is not a JSON document"));
    }
}
