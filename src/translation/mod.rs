use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    follows_identifier, is_block_comment_end, is_block_comment_start, is_line_comment_start,
    is_system_variable,
};
use scanner::{State, scan_identifier};

/// Rewrite `@Name` placeholders into the positional `@P1..@Pn` form the driver binds.
///
/// `names[i]` becomes `@P{i + 1}`. Matching is ASCII case-insensitive, like
/// parameter resolution on a default-collation server. Placeholders whose name is
/// not in `names` (local variables, for instance) are left alone, as are string
/// literals, quoted and bracketed identifiers, comments and `@@` functions.
///
/// ```rust
/// use adventure_data::translation::bind_named_parameters;
///
/// let sql = bind_named_parameters(
///     "SELECT * FROM Production.Product WHERE ProductID = @ProductID",
///     &["ProductID"],
/// );
/// assert_eq!(sql, "SELECT * FROM Production.Product WHERE ProductID = @P1");
/// ```
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn bind_named_parameters<'a>(sql: &'a str, names: &[&str]) -> Cow<'a, str> {
    if names.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();
    // copy in slices so multi-byte characters survive untouched
    let mut copied_to = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'@' if !is_system_variable(bytes, idx) && !follows_identifier(bytes, idx) => {
                    if let Some((name_end, name)) = scan_identifier(bytes, idx + 1)
                        && let Some(position) =
                            names.iter().position(|n| n.eq_ignore_ascii_case(name))
                    {
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                        buf.push_str(&sql[copied_to..idx]);
                        buf.push_str("@P");
                        buf.push_str(&(position + 1).to_string());
                        copied_to = name_end;
                        idx = name_end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    if bytes.get(idx + 1) == Some(&b']') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_in_binding_order() {
        let sql = "UPDATE t SET b = @Name WHERE a = @Id";
        let res = bind_named_parameters(sql, &["Id", "Name"]);
        assert_eq!(res, "UPDATE t SET b = @P2 WHERE a = @P1");
    }

    #[test]
    fn matches_names_case_insensitively() {
        let res = bind_named_parameters("select @productid", &["ProductID"]);
        assert_eq!(res, "select @P1");
    }

    #[test]
    fn skips_literals_comments_and_brackets() {
        let sql = "select '@Id', [@Id], \"@Id\" -- @Id\n/* @Id /* @Id */ @Id */ from t where x = @Id";
        let res = bind_named_parameters(sql, &["Id"]);
        assert_eq!(
            res,
            "select '@Id', [@Id], \"@Id\" -- @Id\n/* @Id /* @Id */ @Id */ from t where x = @P1"
        );
    }

    #[test]
    fn leaves_system_functions_and_unknown_variables() {
        let sql = "declare @local int = @Id; select @@ROWCOUNT, @local, @Identity";
        let res = bind_named_parameters(sql, &["Id"]);
        assert_eq!(
            res,
            "declare @local int = @P1; select @@ROWCOUNT, @local, @Identity"
        );
    }

    #[test]
    fn borrows_when_nothing_matches() {
        let sql = "select N'ñandú' where 1 = 1";
        assert!(matches!(bind_named_parameters(sql, &["Id"]), Cow::Borrowed(_)));
    }

    #[test]
    fn preserves_multibyte_text_around_rewrites() {
        let res = bind_named_parameters("select N'año', @Id", &["Id"]);
        assert_eq!(res, "select N'año', @P1");
    }
}
