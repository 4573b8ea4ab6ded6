//! Named (`:name`) to positional placeholder rewriting.

/// SQL with positional placeholders and the parameter name bound at each position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalSql {
    pub sql: String,
    /// `names[i]` is bound at position `i + 1`.
    pub names: Vec<String>,
}

pub(super) fn rewrite(sql: &str, positional: impl Fn(usize) -> String) -> PositionalSql {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut copied = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"') => i = skip_quoted(bytes, i, q),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = bytes[i..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b'$' => i = skip_dollar_quoted(sql, i),
            b':' => {
                if bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }
                let start = i + 1;
                if !bytes.get(start).is_some_and(|b| is_ident_start(*b)) {
                    i += 1;
                    continue;
                }
                let end = start
                    + bytes[start..]
                        .iter()
                        .take_while(|b| is_ident_char(**b))
                        .count();
                let name = &sql[start..end];
                let position = match names.iter().position(|n| n == name) {
                    Some(p) => p + 1,
                    None => {
                        names.push(name.to_string());
                        names.len()
                    }
                };
                out.push_str(&sql[copied..i]);
                out.push_str(&positional(position));
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied..]);

    PositionalSql { sql: out, names }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            // Doubled quote is an escaped quote.
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_dollar_quoted(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let tag_len = bytes[start + 1..]
        .iter()
        .take_while(|b| is_ident_char(**b))
        .count();
    let close = start + 1 + tag_len;
    let tag_is_valid = tag_len == 0 || is_ident_start(bytes[start + 1]);
    if !tag_is_valid || bytes.get(close) != Some(&b'$') {
        return start + 1;
    }
    let delimiter = &sql[start..=close];
    sql[close + 1..]
        .find(delimiter)
        .map_or(bytes.len(), |p| close + 1 + p + delimiter.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pg(sql: &str) -> PositionalSql {
        rewrite(sql, |idx| format!("${idx}"))
    }

    #[test]
    fn rewrites_and_reuses_positions() {
        let out = pg("SELECT * FROM t WHERE a = :f1__site AND b @@ :query OR c = :f1__site");
        assert_eq!(out.sql, "SELECT * FROM t WHERE a = $1 AND b @@ $2 OR c = $1");
        assert_eq!(out.names, vec!["f1__site", "query"]);
    }

    #[test]
    fn keeps_casts_and_literals() {
        let out = pg("SELECT 'a:b'::text, \":x\", :p::text[] -- :ignored\nFROM t");
        assert_eq!(out.sql, "SELECT 'a:b'::text, \":x\", $1::text[] -- :ignored\nFROM t");
        assert_eq!(out.names, vec!["p"]);
    }

    #[test]
    fn skips_escaped_quotes_and_dollar_bodies() {
        let out = pg("SELECT 'it''s :no', $fn$ :nope $fn$, arr[1:2], :yes");
        assert_eq!(out.sql, "SELECT 'it''s :no', $fn$ :nope $fn$, arr[1:2], $1");
        assert_eq!(out.names, vec!["yes"]);
    }

    #[test]
    fn positional_dollar_is_not_a_quote() {
        let out = pg("SELECT $1, :a /* :b */");
        assert_eq!(out.sql, "SELECT $1, $1 /* :b */");
        assert_eq!(out.names, vec!["a"]);
    }
}
