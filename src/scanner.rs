//! Lexical scan of SQL and PL/SQL text.
//!
//! The scanner classifies a statement by its first keyword and extracts bind
//! placeholder names. It skips comments, string literals, q-quoted literals
//! and quoted identifiers. It never validates syntax: a malformed statement
//! still scans, and the server reports the error on execute.
//!
//! Bind names follow Oracle rules:
//! - `:name` is upper-cased, must start with a letter and may contain letters,
//!   digits, `_`, `$` and `#`;
//! - `:"Name"` is kept verbatim;
//! - `:1` is a numeric name kept verbatim;
//! - whitespace is allowed between the colon and the name;
//! - a colon directly after a string literal is JSON constant syntax, not a bind.

use std::fmt;

/// Statement type, from the first keyword of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Drop,
    Alter,
    Begin,
    Declare,
    Call,
    Commit,
    Rollback,
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementType::Select => "SELECT",
            StatementType::Insert => "INSERT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
            StatementType::Merge => "MERGE",
            StatementType::Create => "CREATE",
            StatementType::Drop => "DROP",
            StatementType::Alter => "ALTER",
            StatementType::Begin => "BEGIN",
            StatementType::Declare => "DECLARE",
            StatementType::Call => "CALL",
            StatementType::Commit => "COMMIT",
            StatementType::Rollback => "ROLLBACK",
            StatementType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Execution category, which decides how binds and results are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementCategory {
    /// SELECT or WITH.
    Query,
    /// INSERT, UPDATE, DELETE, MERGE.
    Dml,
    /// CREATE, ALTER, DROP, TRUNCATE, GRANT and friends. Never has binds.
    Ddl,
    /// Anonymous block or CALL.
    PlSql,
    /// COMMIT, ROLLBACK and anything unrecognized.
    Other,
}

/// One occurrence of a bind placeholder in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOccurrence {
    /// Normalized name.
    pub name: String,
    /// Placeholder follows `RETURNING ... INTO` in a DML statement.
    pub is_return: bool,
}

/// Result of scanning one SQL text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementInfo {
    /// Type from the first keyword.
    pub statement_type: StatementType,
    /// Execution category.
    pub category: StatementCategory,
    /// Distinct bind names in first-occurrence order.
    pub bind_names: Vec<String>,
    /// Every bind occurrence in text order. PL/SQL repeats are collapsed.
    pub occurrences: Vec<BindOccurrence>,
    /// DML with a `RETURNING ... INTO` clause.
    pub is_returning: bool,
}

impl StatementInfo {
    pub fn is_query(&self) -> bool {
        self.category == StatementCategory::Query
    }

    pub fn is_dml(&self) -> bool {
        self.category == StatementCategory::Dml
    }

    pub fn is_ddl(&self) -> bool {
        self.category == StatementCategory::Ddl
    }

    pub fn is_plsql(&self) -> bool {
        self.category == StatementCategory::PlSql
    }

    /// Index of a normalized name in `bind_names`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.bind_names.iter().position(|n| n == name)
    }

    /// Whether a bind name only appears after `RETURNING ... INTO`.
    pub fn is_return_bind(&self, name: &str) -> bool {
        let mut seen = false;
        for occ in self.occurrences.iter().filter(|o| o.name == name) {
            if !occ.is_return {
                return false;
            }
            seen = true;
        }
        seen
    }
}

fn classify(keyword: &str) -> (StatementType, StatementCategory) {
    use StatementCategory as C;
    use StatementType as T;
    match keyword {
        "SELECT" => (T::Select, C::Query),
        "WITH" => (T::Unknown, C::Query),
        "INSERT" => (T::Insert, C::Dml),
        "UPDATE" => (T::Update, C::Dml),
        "DELETE" => (T::Delete, C::Dml),
        "MERGE" => (T::Merge, C::Dml),
        "CREATE" => (T::Create, C::Ddl),
        "DROP" => (T::Drop, C::Ddl),
        "ALTER" => (T::Alter, C::Ddl),
        "ANALYZE" | "AUDIT" | "COMMENT" | "GRANT" | "REVOKE" | "TRUNCATE" => (T::Unknown, C::Ddl),
        "BEGIN" => (T::Begin, C::PlSql),
        "DECLARE" => (T::Declare, C::PlSql),
        "CALL" => (T::Call, C::PlSql),
        "COMMIT" => (T::Commit, C::Other),
        "ROLLBACK" => (T::Rollback, C::Other),
        _ => (T::Unknown, C::Other),
    }
}

/// Scan SQL text into a [`StatementInfo`].
///
/// # Example
///
/// ```
/// use oracle_thin_bind::scanner::{scan, StatementType};
///
/// let info = scan("select * from emp where id = :id and name = :Name -- :ignored");
/// assert_eq!(info.statement_type, StatementType::Select);
/// assert_eq!(info.bind_names, vec!["ID", "NAME"]);
/// ```
pub fn scan(sql: &str) -> StatementInfo {
    Scanner::new(sql).run()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    statement_type: StatementType,
    category: StatementCategory,
    returning_keyword: bool,
    is_returning: bool,
    bind_names: Vec<String>,
    occurrences: Vec<BindOccurrence>,
}

impl Scanner {
    fn new(sql: &str) -> Self {
        Self {
            chars: sql.chars().collect(),
            pos: 0,
            statement_type: StatementType::Unknown,
            category: StatementCategory::Other,
            returning_keyword: false,
            is_returning: false,
            bind_names: Vec::new(),
            occurrences: Vec::new(),
        }
    }

    fn run(mut self) -> StatementInfo {
        let mut keyword_found = false;
        let mut last_was_string = false;
        let mut last_was_alpha = false;
        let mut last_ch = '\0';
        let mut word_start = 0;

        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            let is_alpha = ch.is_alphabetic();

            if is_alpha && !last_was_alpha {
                word_start = self.pos;
            } else if !is_alpha && last_was_alpha {
                let word: String = self.chars[word_start..self.pos].iter().collect();
                if !keyword_found {
                    keyword_found = true;
                    self.set_keyword(&word);
                    if self.category == StatementCategory::Ddl {
                        break;
                    }
                } else {
                    self.check_returning(&word);
                }
            }

            if ch == '\'' {
                last_was_string = true;
                if last_ch == 'q' || last_ch == 'Q' {
                    self.skip_q_string();
                } else {
                    self.skip_quoted('\'');
                }
            } else if !ch.is_whitespace() {
                match ch {
                    '-' => self.skip_line_comment(),
                    '/' => self.skip_block_comment(),
                    '"' => self.skip_quoted('"'),
                    ':' if !last_was_string => self.parse_bind_name(),
                    _ => {}
                }
                last_was_string = false;
            }

            self.pos += 1;
            last_was_alpha = is_alpha;
            last_ch = ch;
        }

        // Text that is a single word, e.g. "commit".
        if !keyword_found && last_was_alpha {
            let word: String = self.chars[word_start..].iter().collect();
            self.set_keyword(&word);
        }

        StatementInfo {
            statement_type: self.statement_type,
            category: self.category,
            bind_names: self.bind_names,
            occurrences: self.occurrences,
            is_returning: self.is_returning,
        }
    }

    fn set_keyword(&mut self, word: &str) {
        let (statement_type, category) = classify(&word.to_uppercase());
        self.statement_type = statement_type;
        self.category = category;
    }

    fn check_returning(&mut self, word: &str) {
        if self.category == StatementCategory::Dml && !self.returning_keyword {
            if word.eq_ignore_ascii_case("RETURNING") || word.eq_ignore_ascii_case("RETURN") {
                self.returning_keyword = true;
            }
        } else if self.returning_keyword && word.eq_ignore_ascii_case("INTO") {
            self.is_returning = true;
        }
    }

    fn add_bind(&mut self, name: String) {
        let known = self.bind_names.contains(&name);
        if self.category == StatementCategory::PlSql && known {
            return;
        }
        if !known {
            self.bind_names.push(name.clone());
        }
        self.occurrences.push(BindOccurrence {
            name,
            is_return: self.is_returning,
        });
    }

    /// Called with `pos` on the colon. Leaves `pos` on the last character of
    /// the name, or untouched when no name follows.
    fn parse_bind_name(&mut self) {
        let mut pos = self.pos + 1;
        while pos < self.chars.len() && self.chars[pos].is_whitespace() {
            pos += 1;
        }
        let Some(&first) = self.chars.get(pos) else {
            return;
        };
        let start = pos;

        let name = if first == '"' {
            let end = self.chars[start + 1..]
                .iter()
                .position(|&c| c == '"')
                .map(|i| start + 1 + i)
                .unwrap_or(self.chars.len());
            self.pos = end;
            self.chars[start + 1..end].iter().collect::<String>()
        } else if first.is_numeric() {
            let end = self.run_end(start, |c| c.is_numeric());
            self.pos = end - 1;
            self.chars[start..end].iter().collect::<String>()
        } else if first.is_alphabetic() {
            let end = self.run_end(start, |c| c.is_alphanumeric() || matches!(c, '$' | '_' | '#'));
            self.pos = end - 1;
            self.chars[start..end].iter().collect::<String>().to_uppercase()
        } else {
            return;
        };
        self.add_bind(name);
    }

    fn run_end(&self, start: usize, accept: impl Fn(char) -> bool) -> usize {
        self.chars[start..]
            .iter()
            .position(|&c| !accept(c))
            .map(|i| start + i)
            .unwrap_or(self.chars.len())
    }

    /// Skip to the closing separator, leaving `pos` on it.
    fn skip_quoted(&mut self, sep: char) {
        self.pos += 1;
        while self.pos < self.chars.len() && self.chars[self.pos] != sep {
            self.pos += 1;
        }
    }

    /// Skip `q'[...]'` style literals, leaving `pos` on the closing quote.
    fn skip_q_string(&mut self) {
        self.pos += 1;
        let Some(&open) = self.chars.get(self.pos) else {
            return;
        };
        let close = match open {
            '[' => ']',
            '{' => '}',
            '(' => ')',
            '<' => '>',
            other => other,
        };
        self.pos += 1;
        while self.pos + 1 < self.chars.len() {
            if self.chars[self.pos] == close && self.chars[self.pos + 1] == '\'' {
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.chars.len();
    }

    /// `--` to end of line. A single dash is left alone.
    fn skip_line_comment(&mut self) {
        if self.chars.get(self.pos + 1) != Some(&'-') {
            return;
        }
        self.pos += 2;
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
    }

    /// `/* ... */`, not nested. An unterminated comment runs to end of text.
    fn skip_block_comment(&mut self) {
        if self.chars.get(self.pos + 1) != Some(&'*') {
            return;
        }
        let mut pos = self.pos + 2;
        let mut star = false;
        while pos < self.chars.len() {
            let ch = self.chars[pos];
            if star && ch == '/' {
                self.pos = pos;
                return;
            }
            star = ch == '*';
            pos += 1;
        }
        self.pos = self.chars.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let info = scan("SELECT * FROM emp WHERE id = :id AND dept = :dept");
        assert_eq!(info.statement_type, StatementType::Select);
        assert!(info.is_query());
        assert_eq!(info.bind_names, vec!["ID", "DEPT"]);
    }

    #[test]
    fn test_duplicates_alias() {
        let info = scan("select :b, :a, :B, :a from dual");
        assert_eq!(info.bind_names, vec!["B", "A"]);
        assert_eq!(info.occurrences.len(), 4);
    }

    #[test]
    fn test_plsql_collapses_repeats() {
        let info = scan("begin :x := :x + 1; end;");
        assert_eq!(info.statement_type, StatementType::Begin);
        assert_eq!(info.bind_names, vec!["X"]);
        assert_eq!(info.occurrences.len(), 1);
    }

    #[test]
    fn test_comments_ignored() {
        assert!(scan("select 1 from dual -- :a\n").bind_names.is_empty());
        assert!(scan("select 1 from dual -- :a").bind_names.is_empty());
        assert!(scan("select /* :a */ 1 from dual").bind_names.is_empty());
        assert!(scan("select /** :a **/ 1 from dual").bind_names.is_empty());
        assert!(scan("select /* :a").bind_names.is_empty());

        let info = scan("select /* :a */ :b -- :c\n, :d from dual");
        assert_eq!(info.bind_names, vec!["B", "D"]);
    }

    #[test]
    fn test_block_comment_does_not_nest() {
        let info = scan("select /* /* :a */ :b */ from dual");
        assert_eq!(info.bind_names, vec!["B"]);
    }

    #[test]
    fn test_literals_ignored() {
        let info = scan("select ':a', \"COL:b\", q'[it's :c]', :d from dual");
        assert_eq!(info.bind_names, vec!["D"]);

        let info = scan("select Q'{:x}' || :y from dual");
        assert_eq!(info.bind_names, vec!["Y"]);
    }

    #[test]
    fn test_quoted_and_numeric_names() {
        let info = scan("insert into t values (:\"MixedCase\", :1, : spaced)");
        assert_eq!(info.bind_names, vec!["MixedCase", "1", "SPACED"]);
    }

    #[test]
    fn test_name_characters() {
        let info = scan("select :a$b_c#1, :x.y from dual");
        assert_eq!(info.bind_names, vec!["A$B_C#1", "X"]);
    }

    #[test]
    fn test_not_binds() {
        let info = scan("begin x := 1; end;");
        assert!(info.bind_names.is_empty());
        let info = scan("select json_object('key' : 'value') from dual");
        assert!(info.bind_names.is_empty());
    }

    #[test]
    fn test_ddl_has_no_binds() {
        let info = scan("create table t (c varchar2(10) default ':x')");
        assert_eq!(info.statement_type, StatementType::Create);
        assert!(info.is_ddl());
        assert!(info.bind_names.is_empty());

        let info = scan("truncate table t");
        assert_eq!(info.statement_type, StatementType::Unknown);
        assert!(info.is_ddl());
    }

    #[test]
    fn test_classification() {
        let cases = [
            ("  select 1 from dual", StatementType::Select),
            ("INSERT into t values (1)", StatementType::Insert),
            ("merge into t using s on (1=1)", StatementType::Merge),
            ("declare x number; begin null; end;", StatementType::Declare),
            ("call proc(:a)", StatementType::Call),
            ("commit", StatementType::Commit),
            ("ROLLBACK", StatementType::Rollback),
            ("explain plan for select 1 from dual", StatementType::Unknown),
            ("", StatementType::Unknown),
        ];
        for (sql, expected) in cases {
            assert_eq!(scan(sql).statement_type, expected, "sql: {sql}");
        }
    }

    #[test]
    fn test_with_is_query() {
        let info = scan("with x as (select :a v from dual) select * from x");
        assert!(info.is_query());
        assert_eq!(info.bind_names, vec!["A"]);
    }

    #[test]
    fn test_leading_comment_skipped() {
        let info = scan("/* header */ -- note\nupdate t set c = :c");
        assert_eq!(info.statement_type, StatementType::Update);
        assert_eq!(info.bind_names, vec!["C"]);
    }

    #[test]
    fn test_returning_into() {
        let info = scan("insert into t (a) values (:a) returning id into :out_id");
        assert!(info.is_returning);
        assert!(!info.is_return_bind("A"));
        assert!(info.is_return_bind("OUT_ID"));

        let info = scan("update t set a = :a");
        assert!(!info.is_returning);
    }

    #[test]
    fn test_syntax_errors_still_scan() {
        let info = scan("selec * frm where :a = ");
        assert_eq!(info.statement_type, StatementType::Unknown);
        assert_eq!(info.bind_names, vec!["A"]);
    }
}
