pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// `@@ROWCOUNT` and friends are server functions, never parameters.
pub(super) fn is_system_variable(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx + 1) == Some(&b'@') || (idx > 0 && bytes[idx - 1] == b'@')
}

/// An `@` glued to a preceding identifier (e.g. an e-mail literal outside
/// quotes) does not start a parameter.
pub(super) fn follows_identifier(bytes: &[u8], idx: usize) -> bool {
    idx > 0 && super::scanner::is_identifier_byte(bytes[idx - 1])
}
