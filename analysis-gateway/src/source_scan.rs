//! Lightweight, language-aware scanning of submitted code.
//!
//! Nothing here is a parser. The scanner blanks out comments and string
//! contents ([`mask`]) so that bracket counting and the regex-based function
//! discovery in [`functions`] are not fooled by text inside literals.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::Language;

lazy_static! {
    static ref PY_DEF: Regex = Regex::new(r"^([ \t]*)(?:async[ \t]+)?def[ \t]+(\w+)").unwrap();
    static ref RUBY_DEF: Regex =
        Regex::new(r"^([ \t]*)def[ \t]+(?:self\.)?([\w?!]+)").unwrap();
    /// `name(<params>) <tail> {` where params allow one level of nesting.
    static ref FN_HEADER: Regex = Regex::new(
        r"([A-Za-z_]\w*)\s*(?:<[^<>(){};]*>\s*)?\(([^;{}()]*(?:\([^;{}()]*\)[^;{}()]*)*)\)([^;{}()=]*)\{"
    )
    .unwrap();
    static ref PY_RETURN: Regex = Regex::new(r"^(?:return|yield)\b").unwrap();
    static ref RETURN_KW: Regex = Regex::new(r"\breturn\b").unwrap();
    static ref PY_EXTRA_FN: Regex = Regex::new(r"\blambda\b").unwrap();
    static ref JS_EXTRA_FN: Regex = Regex::new(r"\bfunction\b|=>").unwrap();
    static ref KOTLIN_EXTRA_FN: Regex = Regex::new(r"\bfun\s+\w+").unwrap();
    static ref SWIFT_EXTRA_FN: Regex = Regex::new(r"\bfunc\s+\w+").unwrap();
    static ref GO_EXTRA_FN: Regex = Regex::new(r"\bfunc\b").unwrap();
    static ref RUST_EXTRA_FN: Regex = Regex::new(r"\bfn\s+\w+").unwrap();
}

const NOT_FUNCTIONS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "when", "else", "return", "new", "sizeof",
    "do", "try", "match", "elif", "foreach", "using", "lock", "synchronized", "unless", "until",
    "typeof", "await", "yield", "func", "function", "fun", "fn", "super", "this", "guard",
    "defer", "go", "select", "throw", "case",
];

const JS_DECL_WORDS: &[&str] = &[
    "function", "async", "static", "get", "set", "public", "private", "protected", "export",
    "default", "readonly", "override", "function*",
];

const C_FAMILY_MODIFIERS: &[&str] = &[
    "public", "private", "protected", "static", "final", "inline", "virtual", "override",
    "synchronized", "abstract", "extern", "constexpr", "explicit", "friend", "native",
    "strictfp", "default",
];

/* ------------------------------------------------------------------------- */
/* Masking                                                                   */
/* ------------------------------------------------------------------------- */

fn blank(c: char) -> char {
    if c == '\n' { '\n' } else { ' ' }
}

fn uses_hash_comments(language: Language) -> bool {
    matches!(language, Language::Python | Language::Ruby)
}

/// `'x'` or `'\n'`, as opposed to a lifetime like `'a`.
fn is_rust_char_literal(chars: &[char], i: usize) -> bool {
    chars.get(i + 1) == Some(&'\\') || chars.get(i + 2) == Some(&'\'')
}

/// Replaces comments and string contents with spaces. Line structure and
/// string delimiters are preserved.
pub fn mask(code: &str, language: Language) -> String {
    let chars: Vec<char> = code.chars().collect();
    let hash_comments = uses_hash_comments(language);
    let backtick_strings = matches!(
        language,
        Language::JavaScript | Language::TypeScript | Language::Go
    );
    let triple_quotes = matches!(
        language,
        Language::Python | Language::Kotlin | Language::Swift
    );

    let mut out = String::with_capacity(code.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        let line_comment =
            (hash_comments && c == '#') || (!hash_comments && c == '/' && next == Some('/'));
        if line_comment {
            while i < chars.len() && chars[i] != '\n' {
                out.push(' ');
                i += 1;
            }
            continue;
        }

        if !hash_comments && c == '/' && next == Some('*') {
            out.push_str("  ");
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                out.push(blank(chars[i]));
                i += 1;
            }
            if i < chars.len() {
                out.push_str("  ");
                i += 2;
            }
            continue;
        }

        let is_quote = c == '"' || c == '\'' || (c == '`' && backtick_strings);
        if !is_quote {
            out.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && language == Language::Rust && !is_rust_char_literal(&chars, i) {
            out.push(c);
            i += 1;
            continue;
        }

        if triple_quotes && next == Some(c) && chars.get(i + 2) == Some(&c) {
            out.extend([c, c, c]);
            i += 3;
            while i < chars.len()
                && !(chars[i] == c && chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c))
            {
                out.push(blank(chars[i]));
                i += 1;
            }
            if i < chars.len() {
                out.extend([c, c, c]);
                i += 3;
            }
            continue;
        }

        let raw = c == '`';
        out.push(c);
        i += 1;
        while i < chars.len() && chars[i] != c {
            if chars[i] == '\\' && !raw {
                out.push(' ');
                i += 1;
                if i < chars.len() {
                    out.push(blank(chars[i]));
                    i += 1;
                }
                continue;
            }
            if chars[i] == '\n' && !raw {
                // Unterminated single-line literal.
                break;
            }
            out.push(blank(chars[i]));
            i += 1;
        }
        if i < chars.len() && chars[i] == c {
            out.push(c);
            i += 1;
        }
    }
    out
}

/* ------------------------------------------------------------------------- */
/* Brackets                                                                  */
/* ------------------------------------------------------------------------- */

/// First bracket problem found in masked code. Lines are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketIssue {
    Unclosed { open: char, line: usize },
    Unexpected { close: char, line: usize },
    Mismatched { open: char, close: char, line: usize },
}

/// Plural noun for a bracket family.
pub fn bracket_noun(c: char) -> &'static str {
    match c {
        '(' | ')' => "parentheses",
        '[' | ']' => "brackets",
        _ => "braces",
    }
}

impl BracketIssue {
    pub fn bracket(&self) -> char {
        match *self {
            BracketIssue::Unclosed { open, .. } => open,
            BracketIssue::Unexpected { close, .. } => close,
            BracketIssue::Mismatched { open, .. } => open,
        }
    }

    pub fn line(&self) -> usize {
        match *self {
            BracketIssue::Unclosed { line, .. }
            | BracketIssue::Unexpected { line, .. }
            | BracketIssue::Mismatched { line, .. } => line,
        }
    }
}

impl fmt::Display for BracketIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketIssue::Unclosed { open, line } => {
                write!(f, "'{open}' opened on line {line} is never closed")
            }
            BracketIssue::Unexpected { close, line } => {
                write!(f, "unexpected '{close}' on line {line}")
            }
            BracketIssue::Mismatched { open, close, line } => {
                write!(f, "'{close}' on line {line} does not match '{open}'")
            }
        }
    }
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Checks `()[]{}` nesting in already masked code.
pub fn check_brackets(masked: &str) -> Result<(), BracketIssue> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (idx, line) in masked.lines().enumerate() {
        let line_no = idx + 1;
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => stack.push((c, line_no)),
                ')' | ']' | '}' => match stack.pop() {
                    Some((open, _)) if closer_for(open) == c => {}
                    Some((open, _)) => {
                        return Err(BracketIssue::Mismatched {
                            open,
                            close: c,
                            line: line_no,
                        });
                    }
                    None => {
                        return Err(BracketIssue::Unexpected {
                            close: c,
                            line: line_no,
                        });
                    }
                },
                _ => {}
            }
        }
    }
    match stack.pop() {
        Some((open, line)) => Err(BracketIssue::Unclosed { open, line }),
        None => Ok(()),
    }
}

/* ------------------------------------------------------------------------- */
/* Functions                                                                 */
/* ------------------------------------------------------------------------- */

/// A function found in the code, with its body statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    /// Non-blank statements/lines of the body (masked text).
    pub statements: Vec<String>,
    /// The signature promises a value to the caller.
    pub needs_return: bool,
    /// A `return` (or `yield`) appears in the body.
    pub has_return: bool,
    /// Constructor, initializer or destructor; an empty body is normal here.
    pub is_initializer: bool,
}

impl FunctionSpan {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Body is nothing but placeholders (`pass`, `...`, `raise NotImplementedError`).
    pub fn is_stub(&self) -> bool {
        !self.is_empty() && self.is_placeholder_only()
    }

    /// Empty or stub body.
    pub fn has_no_logic(&self) -> bool {
        self.is_empty() || self.is_placeholder_only()
    }

    fn is_placeholder_only(&self) -> bool {
        self.statements.iter().all(|s| {
            s == "pass"
                || s == "..."
                || s.starts_with("raise NotImplementedError")
                || s.starts_with('"')
                || s.starts_with('\'')
        })
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Finds every function with its body, for the given language.
pub fn functions(masked: &str, language: Language) -> Vec<FunctionSpan> {
    match language {
        Language::Python => python_functions(masked),
        Language::Ruby => ruby_functions(masked),
        _ => brace_functions(masked, language),
    }
}

/// True when the code declares at least one function in any form
/// (including lambdas and arrow functions).
pub fn has_function_definition(masked: &str, language: Language) -> bool {
    if !functions(masked, language).is_empty() {
        return true;
    }
    let extra: Option<&Regex> = match language {
        Language::Python => Some(&PY_EXTRA_FN),
        Language::JavaScript | Language::TypeScript => Some(&JS_EXTRA_FN),
        Language::Kotlin => Some(&KOTLIN_EXTRA_FN),
        Language::Swift => Some(&SWIFT_EXTRA_FN),
        Language::Go => Some(&GO_EXTRA_FN),
        Language::Rust => Some(&RUST_EXTRA_FN),
        _ => None,
    };
    extra.is_some_and(|re| re.is_match(masked))
}

fn python_functions(masked: &str) -> Vec<FunctionSpan> {
    let lines: Vec<&str> = masked.lines().collect();
    let mut out = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = PY_DEF.captures(line) else {
            continue;
        };
        let def_indent = caps.get(1).map_or(0, |m| m.as_str().len());
        let name = caps.get(2).map_or("", |m| m.as_str()).to_string();

        // Walk the signature (possibly multi-line) to the ':' at depth 0.
        let mut depth = 0i32;
        let mut seen_paren = false;
        let mut signature = String::new();
        let mut sig_end: Option<(usize, String)> = None;
        'scan: for (j, l) in lines.iter().enumerate().skip(i) {
            let start = if j == i {
                caps.get(0).map_or(0, |m| m.end())
            } else {
                0
            };
            for (k, c) in l[start..].char_indices() {
                match c {
                    '(' | '[' | '{' => {
                        depth += 1;
                        seen_paren = true;
                    }
                    ')' | ']' | '}' => depth -= 1,
                    ':' if depth == 0 && seen_paren => {
                        let rest = l[start + k + 1..].trim().to_string();
                        sig_end = Some((j, rest));
                        break 'scan;
                    }
                    _ => {}
                }
                signature.push(c);
            }
            signature.push('\n');
        }
        let Some((sig_line, inline_body)) = sig_end else {
            continue;
        };

        let statements: Vec<String> = if !inline_body.is_empty() {
            inline_body
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            lines
                .iter()
                .skip(sig_line + 1)
                .take_while(|l| l.trim().is_empty() || indent_of(l) > def_indent)
                .map(|l| l.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let returns_none = signature
            .rsplit_once("->")
            .is_some_and(|(_, ret)| ret.trim() == "None");
        let dunder = name.starts_with("__") && name.ends_with("__");
        let has_return = statements.iter().any(|s| PY_RETURN.is_match(s));

        out.push(FunctionSpan {
            is_initializer: name == "__init__",
            name,
            statements,
            needs_return: !returns_none && !dunder,
            has_return,
        });
    }
    out
}

fn ruby_functions(masked: &str) -> Vec<FunctionSpan> {
    let lines: Vec<&str> = masked.lines().collect();
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = RUBY_DEF.captures(line) else {
            continue;
        };
        let def_indent = caps.get(1).map_or(0, |m| m.as_str().len());
        let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let statements: Vec<String> = lines
            .iter()
            .skip(i + 1)
            .take_while(|l| !(l.trim() == "end" && indent_of(l) <= def_indent))
            .map(|l| l.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let has_return = statements.iter().any(|s| RETURN_KW.is_match(s));
        out.push(FunctionSpan {
            is_initializer: name == "initialize",
            name,
            statements,
            needs_return: false,
            has_return,
        });
    }
    out
}

/// Index of the `}` matching the `{` at `open`.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Declared return type for C-family headers, `None` for constructors.
fn c_family_return_type(prefix: &str) -> Option<String> {
    let ty: Vec<&str> = prefix
        .split_whitespace()
        .filter(|w| !C_FAMILY_MODIFIERS.contains(w))
        .collect();
    if ty.is_empty() {
        None
    } else {
        Some(ty.join(" "))
    }
}

fn brace_functions(masked: &str, language: Language) -> Vec<FunctionSpan> {
    let bytes = masked.as_bytes();
    let mut out = Vec::new();

    for caps in FN_HEADER.captures_iter(masked) {
        let (Some(whole), Some(name_m)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name_m.as_str();
        if NOT_FUNCTIONS.contains(&name) {
            continue;
        }
        let tail = caps.get(3).map_or("", |m| m.as_str()).trim();
        let line_start = masked[..name_m.start()].rfind('\n').map_or(0, |i| i + 1);
        let prefix = masked[line_start..name_m.start()].trim();

        let words: Vec<&str> = prefix.split_whitespace().collect();
        let is_declaration = match language {
            Language::Rust => words.last() == Some(&"fn"),
            Language::Go => words.first() == Some(&"func"),
            Language::Swift => words.contains(&"func") || name == "init",
            Language::Kotlin => words.contains(&"fun") || name == "constructor",
            Language::JavaScript | Language::TypeScript => {
                words.iter().all(|w| JS_DECL_WORDS.contains(w))
            }
            _ => {
                !prefix.contains(['=', '.', ',', '(', ')', '}', '{', ';', '!', '+', '-'])
                    && !words.iter().any(|w| NOT_FUNCTIONS.contains(w))
            }
        };
        if !is_declaration {
            continue;
        }

        let is_initializer = match language {
            Language::Java | Language::C | Language::Cpp => {
                prefix.ends_with('~') || c_family_return_type(prefix).is_none()
            }
            Language::Swift => name == "init" || name == "deinit",
            Language::Kotlin | Language::JavaScript | Language::TypeScript => name == "constructor",
            _ => false,
        };

        let needs_return = match language {
            Language::Java | Language::C | Language::Cpp => {
                !is_initializer && c_family_return_type(prefix).is_some_and(|t| t != "void")
            }
            Language::Go => !tail.is_empty(),
            Language::Swift => tail.contains("->") && !tail.contains("Void"),
            Language::Kotlin | Language::TypeScript => tail
                .strip_prefix(':')
                .map(str::trim)
                .is_some_and(|t| !matches!(t, "Unit" | "void" | "never" | "undefined" | "Promise<void>")),
            _ => false,
        };

        let open = whole.end() - 1;
        let Some(close) = matching_brace(bytes, open) else {
            continue;
        };
        let body = &masked[open + 1..close];
        let statements: Vec<String> = body
            .split(['\n', ';'])
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let has_return = RETURN_KW.is_match(body);

        out.push(FunctionSpan {
            name: name.to_string(),
            statements,
            needs_return,
            has_return,
            is_initializer,
        });
    }
    out
}
