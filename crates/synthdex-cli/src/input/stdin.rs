use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin, or `None` when stdin is a terminal or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    match buffer.trim() {
        "" => Ok(None),
        trimmed => Ok(Some(serde_json::from_str(trimmed)?)),
    }
}
