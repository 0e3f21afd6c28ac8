//! Finite scanner for ES module specifier literals.
//!
//! Walks JavaScript source once, stepping over comments, string literals,
//! template literals and regex literals, and reports the specifier of every
//! `import ... from "x"`, `import "x"`, `export ... from "x"` and
//! `import("x")` it meets. Byte offsets point at the specifier text between
//! the quotes so callers can splice a replacement without touching the quotes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x from "..."`
    Static,
    /// `import "..."`
    SideEffect,
    /// `export ... from "..."`
    ReExport,
    /// `import("...")`
    Dynamic,
}

/// A specifier literal located in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    pub kind: ImportKind,
    pub specifier: String,
    /// Byte offset of the first specifier character (after the opening quote).
    pub start: usize,
    /// Byte offset one past the last specifier character (at the closing quote).
    pub end: usize,
    pub quote: char,
    /// Source text from the keyword through the closing quote.
    pub statement: String,
    /// 1-indexed line of the keyword.
    pub line: usize,
}

impl ImportStatement {
    pub fn is_relative(&self) -> bool {
        is_relative(&self.specifier)
    }
}

/// A relative specifier whose literal could not be parsed safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSpecifier {
    pub kind: ImportKind,
    /// Specifier text up to where parsing gave up.
    pub specifier: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    Statement(ImportStatement),
    Malformed(MalformedSpecifier),
}

/// `.`, `..`, or anything starting with `./` or `../`.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Scan `source` and return every import/export specifier in source order.
pub fn scan(source: &str) -> Vec<Scanned> {
    let mut scanner = Scanner::new(source);
    scanner.run();
    scanner.out
}

// ============================================================================
// Scanner
// ============================================================================

/// What the previous significant token was. Decides whether `/` opens a
/// regex literal or is a division operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Punct,
    /// A keyword after which an expression starts (`return`, `typeof`, ...).
    Keyword,
    /// Identifier, literal, or closing bracket.
    Value,
}

const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
    "await",
];

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    prev: Prev,
    out: Vec<Scanned>,
    /// Line number at `line_pos`, advanced as statements are recorded.
    line: usize,
    line_pos: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            prev: Prev::Start,
            out: Vec::new(),
            line: 1,
            line_pos: 0,
        }
    }

    fn peek(&self, p: usize) -> Option<u8> {
        self.bytes.get(p).copied()
    }

    fn run(&mut self) {
        if self.src.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
        }
        if self.src[self.pos..].starts_with("#!") {
            self.pos = self.skip_line_comment(self.pos);
        }

        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];

            if is_whitespace(b) {
                self.pos += 1;
                continue;
            }

            match b {
                b'/' if self.peek(self.pos + 1) == Some(b'/') => {
                    self.pos = self.skip_line_comment(self.pos);
                }
                b'/' if self.peek(self.pos + 1) == Some(b'*') => {
                    self.pos = self.skip_block_comment(self.pos);
                }
                b'/' => {
                    if self.regex_allowed() {
                        match self.skip_regex(self.pos) {
                            Some(end) => {
                                self.pos = end;
                                self.prev = Prev::Value;
                            }
                            None => {
                                self.pos += 1;
                                self.prev = Prev::Punct;
                            }
                        }
                    } else {
                        self.pos += 1;
                        self.prev = Prev::Punct;
                    }
                }
                b'"' | b'\'' => {
                    self.pos = self.skip_string(self.pos);
                    self.prev = Prev::Value;
                }
                b'`' => {
                    self.pos = self.skip_template(self.pos);
                    self.prev = Prev::Value;
                }
                b')' | b']' => {
                    self.pos += 1;
                    self.prev = Prev::Value;
                }
                b'.' if self.peek(self.pos + 1).is_some_and(|n| n.is_ascii_digit()) => {
                    self.pos = self.skip_number(self.pos);
                    self.prev = Prev::Value;
                }
                _ if b.is_ascii_digit() => {
                    self.pos = self.skip_number(self.pos);
                    self.prev = Prev::Value;
                }
                _ if is_ident_start(b) => self.word(),
                _ => {
                    self.pos += 1;
                    self.prev = Prev::Punct;
                }
            }
        }
    }

    fn regex_allowed(&self) -> bool {
        matches!(self.prev, Prev::Start | Prev::Punct | Prev::Keyword)
    }

    /// Handle an identifier at `self.pos`, including `import`/`export` statements.
    fn word(&mut self) {
        let src = self.src;
        let start = self.pos;
        let end = self.word_end(start);
        let word = &src[start..end];
        let after_member_dot = start > 0 && self.preceded_by_dot(start);

        self.pos = end;
        self.prev = if EXPRESSION_KEYWORDS.contains(&word) {
            Prev::Keyword
        } else {
            Prev::Value
        };

        if after_member_dot {
            return;
        }

        let literal = match word {
            "import" => self.import_literal(end),
            "export" => self.export_literal(end),
            _ => None,
        };

        if let Some((quote_pos, kind)) = literal {
            self.pos = self.take_literal(quote_pos, kind, start);
            self.prev = Prev::Value;
        }
    }

    /// True when the nearest non-trivia byte before `p` is a `.` (member access).
    fn preceded_by_dot(&self, p: usize) -> bool {
        self.src[..p]
            .trim_end_matches(|c: char| c.is_ascii_whitespace())
            .ends_with('.')
    }

    fn word_end(&self, mut p: usize) -> usize {
        while p < self.bytes.len() && is_ident_char(self.bytes[p]) {
            p += 1;
        }
        p
    }

    /// After `import`: locate the opening quote of the specifier, if any.
    fn import_literal(&self, after_kw: usize) -> Option<(usize, ImportKind)> {
        let p = self.skip_trivia(after_kw);
        let b = self.peek(p)?;

        match b {
            b'(' => {
                let q = self.skip_trivia(p + 1);
                if self.peek(q).is_some_and(is_quote) {
                    Some((q, ImportKind::Dynamic))
                } else {
                    None
                }
            }
            _ if is_quote(b) => Some((p, ImportKind::SideEffect)),
            b'{' | b'*' => self.clause_literal(p).map(|q| (q, ImportKind::Static)),
            _ if is_ident_start(b) => self.clause_literal(p).map(|q| (q, ImportKind::Static)),
            _ => None,
        }
    }

    /// After `export`: only `export * ...` and `export { ... } from` re-exports.
    fn export_literal(&self, after_kw: usize) -> Option<(usize, ImportKind)> {
        let p = self.skip_trivia(after_kw);
        match self.peek(p)? {
            b'{' | b'*' => self.clause_literal(p).map(|q| (q, ImportKind::ReExport)),
            _ => None,
        }
    }

    /// Walk an import/export clause looking for `from "<specifier>"`.
    ///
    /// Only identifiers, braces, commas and `*` may appear before `from`,
    /// plus string names inside braces or after `as` (`{ "a-b" as ab }`,
    /// `* as "ns"`). Anything else means this is not a module statement.
    fn clause_literal(&self, mut p: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut after_as = false;

        loop {
            p = self.skip_trivia(p);
            let b = self.peek(p)?;

            if is_ident_start(b) {
                let end = self.word_end(p);
                let word = &self.src[p..end];
                if depth == 0 && word == "from" {
                    let q = self.skip_trivia(end);
                    if self.peek(q).is_some_and(is_quote) {
                        return Some(q);
                    }
                }
                after_as = word == "as";
                p = end;
                continue;
            }

            if is_quote(b) && (depth > 0 || after_as) {
                let end = self.skip_string(p);
                if self.peek(end.checked_sub(1)?) != Some(b) || end == p + 1 {
                    return None;
                }
                after_as = false;
                p = end;
                continue;
            }
            after_as = false;

            match b {
                b'{' => depth += 1,
                b'}' => depth = depth.checked_sub(1)?,
                b',' | b'*' => {}
                _ => return None,
            }
            p += 1;
        }
    }

    /// Parse the string literal at `quote_pos` and record it. Returns the
    /// position scanning resumes from.
    fn take_literal(&mut self, quote_pos: usize, kind: ImportKind, kw_start: usize) -> usize {
        let quote = self.bytes[quote_pos];
        let content_start = quote_pos + 1;
        let mut p = content_start;
        let mut escaped = false;

        let (content_end, resume, terminated) = loop {
            match self.peek(p) {
                None => break (p, p, false),
                Some(b) if b == quote => break (p, p + 1, true),
                Some(b'\n') | Some(b'\r') => break (p, p, false),
                Some(b'\\') => {
                    escaped = true;
                    p += 2;
                }
                Some(_) => p += 1,
            }
        };
        let src = self.src;
        let content_end = content_end.min(self.bytes.len());
        let specifier = &src[content_start..content_end.max(content_start)];
        let line = self.line_of(kw_start);

        if terminated && !escaped {
            if kind == ImportKind::Dynamic && !self.dynamic_call_closes(resume) {
                if is_relative(specifier) {
                    self.out.push(Scanned::Malformed(MalformedSpecifier {
                        kind,
                        specifier: specifier.to_string(),
                        line,
                    }));
                }
                return resume;
            }

            self.out.push(Scanned::Statement(ImportStatement {
                kind,
                specifier: specifier.to_string(),
                start: content_start,
                end: content_end,
                quote: quote as char,
                statement: src[kw_start..resume].to_string(),
                line,
            }));
        } else if specifier.starts_with('.') {
            self.out.push(Scanned::Malformed(MalformedSpecifier {
                kind,
                specifier: specifier.to_string(),
                line,
            }));
        }

        resume
    }

    /// `import("x")` and `import("x", { with: ... })` take the literal as-is;
    /// `import("./a" + name)` is built at runtime.
    fn dynamic_call_closes(&self, after_literal: usize) -> bool {
        let p = self.skip_trivia(after_literal);
        matches!(self.peek(p), Some(b')') | Some(b','))
    }

    /// Statements are recorded in source order, so only the bytes since the
    /// previous statement need counting.
    fn line_of(&mut self, p: usize) -> usize {
        if p < self.line_pos {
            self.line = 1;
            self.line_pos = 0;
        }
        self.line += self.bytes[self.line_pos..p]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line_pos = p;
        self.line
    }

    // ------------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------------

    fn skip_trivia(&self, mut p: usize) -> usize {
        loop {
            match self.peek(p) {
                Some(b) if is_whitespace(b) => p += 1,
                Some(b'/') if self.peek(p + 1) == Some(b'/') => p = self.skip_line_comment(p),
                Some(b'/') if self.peek(p + 1) == Some(b'*') => p = self.skip_block_comment(p),
                _ => return p,
            }
        }
    }

    fn skip_line_comment(&self, p: usize) -> usize {
        match self.src[p..].find('\n') {
            Some(offset) => p + offset,
            None => self.bytes.len(),
        }
    }

    fn skip_block_comment(&self, p: usize) -> usize {
        match self.src[p + 2..].find("*/") {
            Some(offset) => p + 2 + offset + 2,
            None => self.bytes.len(),
        }
    }

    /// Skip a quoted string. Unterminated strings stop at the line break.
    fn skip_string(&self, p: usize) -> usize {
        let quote = self.bytes[p];
        let mut p = p + 1;
        while let Some(b) = self.peek(p) {
            match b {
                b'\\' => p += 2,
                b'\n' => return p,
                _ if b == quote => return p + 1,
                _ => p += 1,
            }
        }
        self.bytes.len()
    }

    fn skip_template(&self, p: usize) -> usize {
        let mut p = p + 1;
        while let Some(b) = self.peek(p) {
            match b {
                b'\\' => p += 2,
                b'`' => return p + 1,
                b'$' if self.peek(p + 1) == Some(b'{') => p = self.skip_template_expr(p + 2),
                _ => p += 1,
            }
        }
        self.bytes.len()
    }

    /// Skip a `${ ... }` substitution, returning the position after its `}`.
    fn skip_template_expr(&self, mut p: usize) -> usize {
        let mut depth = 1usize;
        while let Some(b) = self.peek(p) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return p + 1;
                    }
                }
                b'"' | b'\'' => {
                    p = self.skip_string(p);
                    continue;
                }
                b'`' => {
                    p = self.skip_template(p);
                    continue;
                }
                b'/' if self.peek(p + 1) == Some(b'/') => {
                    p = self.skip_line_comment(p);
                    continue;
                }
                b'/' if self.peek(p + 1) == Some(b'*') => {
                    p = self.skip_block_comment(p);
                    continue;
                }
                _ => {}
            }
            p += 1;
        }
        self.bytes.len()
    }

    /// Skip a regex literal starting at `/`. `None` when the line ends first,
    /// in which case the slash was not a regex after all.
    fn skip_regex(&self, p: usize) -> Option<usize> {
        let mut p = p + 1;
        let mut in_class = false;
        loop {
            match self.peek(p)? {
                b'\\' => p += 2,
                b'\n' | b'\r' => return None,
                b'[' => {
                    in_class = true;
                    p += 1;
                }
                b']' => {
                    in_class = false;
                    p += 1;
                }
                b'/' if !in_class => {
                    return Some(self.word_end(p + 1));
                }
                _ => p += 1,
            }
        }
    }

    fn skip_number(&self, mut p: usize) -> usize {
        while let Some(b) = self.peek(p) {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
                p += 1;
            } else {
                break;
            }
        }
        p
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(source: &str) -> Vec<ImportStatement> {
        scan(source)
            .into_iter()
            .filter_map(|s| match s {
                Scanned::Statement(stmt) => Some(stmt),
                Scanned::Malformed(_) => None,
            })
            .collect()
    }

    fn specifiers(source: &str) -> Vec<String> {
        statements(source).into_iter().map(|s| s.specifier).collect()
    }

    fn malformed(source: &str) -> Vec<MalformedSpecifier> {
        scan(source)
            .into_iter()
            .filter_map(|s| match s {
                Scanned::Malformed(m) => Some(m),
                Scanned::Statement(_) => None,
            })
            .collect()
    }

    #[test]
    fn relative_detection() {
        assert!(is_relative("./foo"));
        assert!(is_relative("../components/foo"));
        assert!(is_relative("."));
        assert!(is_relative(".."));
        assert!(!is_relative("lodash"));
        assert!(!is_relative("/components/foo"));
        assert!(!is_relative("components/foo"));
        assert!(!is_relative(".hidden/foo"));
    }

    #[test]
    fn finds_default_named_and_namespace_imports() {
        let src = r#"
import Foo from "../components/foo";
import { a, b as c } from './bar';
import * as ns from "./ns";
import Def, { x } from "./mixed";
"#;
        assert_eq!(
            specifiers(src),
            vec!["../components/foo", "./bar", "./ns", "./mixed"]
        );
    }

    #[test]
    fn records_offsets_quote_and_line() {
        let src = "const a = 1;\nimport Foo from '../components/foo';\n";
        let stmts = statements(src);
        assert_eq!(stmts.len(), 1);

        let stmt = &stmts[0];
        assert_eq!(stmt.kind, ImportKind::Static);
        assert_eq!(stmt.quote, '\'');
        assert_eq!(stmt.line, 2);
        assert_eq!(&src[stmt.start..stmt.end], "../components/foo");
        assert_eq!(stmt.statement, "import Foo from '../components/foo'");
    }

    #[test]
    fn finds_side_effect_reexport_and_dynamic_imports() {
        let src = r#"
import "./bootstrap";
export * from "./all";
export { one, two as three } from "./some";
export * as helpers from "./helpers";
const lazy = () => import("./lazy");
const withAttrs = import('./data', { with: { type: 'json' } });
"#;
        let stmts = statements(src);
        let kinds: Vec<ImportKind> = stmts.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ImportKind::SideEffect,
                ImportKind::ReExport,
                ImportKind::ReExport,
                ImportKind::ReExport,
                ImportKind::Dynamic,
                ImportKind::Dynamic,
            ]
        );
        assert_eq!(stmts[4].specifier, "./lazy");
    }

    #[test]
    fn string_named_bindings_keep_the_module_specifier() {
        let src = "import { \"a-b\" as ab } from \"./x\";\nexport { \"c\" } from './y';\nexport * as \"ns\" from './z';\n";
        let stmts = statements(src);

        let found: Vec<(ImportKind, &str, usize)> = stmts
            .iter()
            .map(|s| (s.kind, s.specifier.as_str(), s.line))
            .collect();
        assert_eq!(
            found,
            vec![
                (ImportKind::Static, "./x", 1),
                (ImportKind::ReExport, "./y", 2),
                (ImportKind::ReExport, "./z", 3),
            ]
        );
        assert_eq!(&src[stmts[0].start..stmts[0].end], "./x");
    }

    #[test]
    fn string_name_in_braces_does_not_end_the_clause() {
        let src = "export { \"from\" as f } from \"./kw\";\n";
        assert_eq!(specifiers(src), vec!["./kw"]);
    }

    #[test]
    fn line_numbers_follow_many_statements() {
        let src: String = (0..50).map(|i| format!("import './m{}';\n", i)).collect();
        let lines: Vec<usize> = statements(&src).iter().map(|s| s.line).collect();
        assert_eq!(lines, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn multiline_clause_is_supported() {
        let src = "import {\n  alpha,\n  beta,\n} from \"./greek\";\n";
        let stmts = statements(src);
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].specifier, "./greek");
        assert_eq!(stmts[0].line, 1);
    }

    #[test]
    fn ignores_comments() {
        let src = r#"
// import Foo from "./commented";
/* import Bar from "./block";
   export * from "./also-block"; */
import Real from "./real";
"#;
        assert_eq!(specifiers(src), vec!["./real"]);
    }

    #[test]
    fn ignores_strings_and_templates() {
        let src = r#"
const a = "import Foo from './in-double'";
const b = 'export * from "./in-single"';
const c = `import("./in-template") ${ "import './in-expr'" }`;
import Real from "./real";
"#;
        assert_eq!(specifiers(src), vec!["./real"]);
    }

    #[test]
    fn ignores_regex_literals_containing_quotes() {
        let src = r#"
const re = /["']/g;
import Real from "./real";
const half = total / 2; const other = count / 4;
"#;
        assert_eq!(specifiers(src), vec!["./real"]);
    }

    #[test]
    fn ignores_non_module_uses_of_keywords() {
        let src = r#"
const meta = import.meta.url;
loader.import("./not-a-module");
export const value = 1;
export default function main() {}
export { value as renamed };
const dynamic = import(name);
"#;
        assert!(scan(src).is_empty());
    }

    #[test]
    fn default_import_named_from() {
        let src = r#"import from from "./from";"#;
        assert_eq!(specifiers(src), vec!["./from"]);
    }

    #[test]
    fn keeps_bare_and_absolute_specifiers_as_non_relative() {
        let stmts = statements(
            r#"import _ from "lodash"; import Foo from "/components/foo"; import Bar from "components/bar";"#,
        );
        assert_eq!(stmts.len(), 3);
        assert!(stmts.iter().all(|s| !s.is_relative()));
    }

    #[test]
    fn multiline_specifier_is_malformed() {
        let src = "import Foo from \"./foo\nbar\";\nimport Ok from './ok';\n";
        let bad = malformed(src);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].specifier, "./foo");
        assert_eq!(bad[0].line, 1);
        assert_eq!(specifiers(src), vec!["./ok"]);
    }

    #[test]
    fn escaped_specifier_is_malformed() {
        let bad = malformed(r#"import Foo from "./fo\o";"#);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].kind, ImportKind::Static);
    }

    #[test]
    fn unterminated_specifier_at_eof_is_malformed() {
        let bad = malformed("import './never-closed");
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].specifier, "./never-closed");
    }

    #[test]
    fn concatenated_dynamic_import_is_malformed() {
        let bad = malformed(r#"const page = import("./pages/" + name);"#);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].kind, ImportKind::Dynamic);
        assert!(statements(r#"import("./pages/" + name)"#).is_empty());
    }

    #[test]
    fn malformed_bare_specifier_is_not_reported() {
        assert!(scan("import x from \"lod\nash\";").is_empty());
    }

    #[test]
    fn handles_bom_and_hashbang() {
        let src = "\u{feff}#!/usr/bin/env node\nimport a from './a';\n";
        assert_eq!(specifiers(src), vec!["./a"]);
    }

    #[test]
    fn non_ascii_content_keeps_offsets_valid() {
        let src = "const greeting = 'héllo';\nimport Ünïcode from \"./ünï\";\n";
        let stmts = statements(src);
        assert_eq!(stmts.len(), 1);
        assert_eq!(&src[stmts[0].start..stmts[0].end], "./ünï");
    }
}
