/// Quotes a string so the shell treats it as a single word.
///
/// Wraps the value in single quotes and splices embedded single quotes
/// as `'\''`. The composed backup pipelines run through `sh -c`, so every
/// path and binary token goes through here before it touches the command
/// string.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(is_safe_byte) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'_' | b'-' | b'.' | b'/' | b'=' | b':' | b',' | b'+' | b'@' | b'%')
}
