//! Output templates
//!
//! A small renderer for the Go-template dialect packer2terraform templates
//! are written in. Supported actions:
//!
//! - `{{.Field}}` and `{{.}}`
//! - `{{index .IdSplit N}}`
//! - `{{range .Artifacts}} ... {{else}} ... {{end}}`
//! - `{{if .Field}} ... {{else}} ... {{end}}`
//! - `{{/* comment */}}`
//! - `{{- ` / ` -}}` whitespace trimming
//!
//! The template's root exposes `.Artifacts`; each artifact exposes
//! `.BuilderType`, `.BuilderId`, `.Id`, `.IdSplit`, `.Message` and
//! `.FilesCount`.
//!
//! Rendering goes into a private buffer, so a failing template never
//! produces partial output.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::artifact::Artifact;
use crate::error::TemplateError;

/// Built-in template: a Terraform `images` map keyed by region.
pub const DEFAULT_TEMPLATE: &str = r#"variable "images" {
    default = {
{{range .Artifacts}}
        {{index .IdSplit 0}} = "{{index .IdSplit 1}}"{{end}}
    }
}"#;

fn action_pattern() -> &'static Regex {
    static ACTION: OnceLock<Regex> = OnceLock::new();
    ACTION.get_or_init(|| {
        Regex::new(
            r"(?s)\{\{(?P<ltrim>-\s)?(?:(?P<comment>\s*/\*.*?\*/\s*)|(?P<body>.*?))(?P<rtrim>\s-)?\}\}",
        )
        .expect("action pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Action(String),
}

/// Push literal text between actions, applying trim markers.
fn push_text(
    tokens: &mut Vec<Token>,
    start: usize,
    mut text: &str,
    trim_start: bool,
    trim_end: bool,
) -> Result<(), TemplateError> {
    if let Some(offset) = text.find("{{") {
        return Err(TemplateError::UnclosedAction {
            offset: start + offset,
        });
    }
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }
    Ok(())
}

fn lex(src: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    let mut trim_next = false;

    for caps in action_pattern().captures_iter(src) {
        let Some(whole) = caps.get(0) else { continue };

        push_text(
            &mut tokens,
            cursor,
            &src[cursor..whole.start()],
            trim_next,
            caps.name("ltrim").is_some(),
        )?;

        // comments produce no token
        if let Some(body) = caps.name("body") {
            let body = body.as_str().trim();
            if body.starts_with("/*") {
                return Err(TemplateError::UnclosedComment {
                    offset: whole.start(),
                });
            }
            tokens.push(Token::Action(body.to_string()));
        }

        trim_next = caps.name("rtrim").is_some();
        cursor = whole.end();
    }

    push_text(&mut tokens, cursor, &src[cursor..], trim_next, false)?;
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Dot,
    Field(String),
    Index(Box<Expr>, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Range,
    If,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            BlockKind::Range => "range",
            BlockKind::If => "if",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Print(Expr),
    Block {
        kind: BlockKind,
        expr: Expr,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

struct Frame {
    kind: BlockKind,
    expr: Expr,
    body: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl Frame {
    fn current(&mut self) -> &mut Vec<Node> {
        match &mut self.otherwise {
            Some(otherwise) => otherwise,
            None => &mut self.body,
        }
    }
}

fn parse_field(word: &str, action: &str) -> Result<Expr, TemplateError> {
    if word == "." {
        return Ok(Expr::Dot);
    }
    match word.strip_prefix('.') {
        Some(name)
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            Ok(Expr::Field(name.to_string()))
        }
        _ => Err(TemplateError::UnknownAction(action.to_string())),
    }
}

fn parse_expr(words: &[&str], action: &str) -> Result<Expr, TemplateError> {
    match words {
        ["index", target, index] => {
            let index = index
                .parse::<usize>()
                .map_err(|_| TemplateError::BadIndex(action.to_string()))?;
            Ok(Expr::Index(Box::new(parse_field(target, action)?), index))
        }
        ["index", ..] => Err(TemplateError::BadIndex(action.to_string())),
        [word] => parse_field(word, action),
        _ => Err(TemplateError::UnknownAction(action.to_string())),
    }
}

/// Node list that new nodes are appended to.
fn innermost<'a>(stack: &'a mut [Frame], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => frame.current(),
        None => root,
    }
}

fn parse(tokens: Vec<Token>) -> Result<Vec<Node>, TemplateError> {
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        let body = match token {
            Token::Text(text) => {
                innermost(&mut stack, &mut root).push(Node::Text(text));
                continue;
            }
            Token::Action(body) => body,
        };

        let words: Vec<&str> = body.split_whitespace().collect();
        match words.as_slice() {
            ["range", rest @ ..] | ["if", rest @ ..] => {
                let kind = if words[0] == "range" {
                    BlockKind::Range
                } else {
                    BlockKind::If
                };
                stack.push(Frame {
                    kind,
                    expr: parse_expr(rest, &body)?,
                    body: Vec::new(),
                    otherwise: None,
                });
            }
            ["else"] => match stack.last_mut() {
                Some(frame) if frame.otherwise.is_none() => frame.otherwise = Some(Vec::new()),
                _ => return Err(TemplateError::Unexpected("else".to_string())),
            },
            ["end"] => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| TemplateError::Unexpected("end".to_string()))?;
                let node = Node::Block {
                    kind: frame.kind,
                    expr: frame.expr,
                    body: frame.body,
                    otherwise: frame.otherwise.unwrap_or_default(),
                };
                innermost(&mut stack, &mut root).push(node);
            }
            _ => {
                let node = Node::Print(parse_expr(&words, &body)?);
                innermost(&mut stack, &mut root).push(node);
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(TemplateError::Unterminated(frame.kind.name().to_string()));
    }
    Ok(root)
}

/// Data reachable from a template expression.
#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Page(&'a [Artifact]),
    Artifacts(&'a [Artifact]),
    Artifact(&'a Artifact),
    Str(&'a str),
    List(&'a [String]),
}

impl<'a> Value<'a> {
    fn scope(&self) -> &'static str {
        match self {
            Value::Page(_) => "page",
            Value::Artifacts(_) => "artifact list",
            Value::Artifact(_) => "artifact",
            Value::Str(_) => "string",
            Value::List(_) => "string list",
        }
    }

    fn field(self, name: &str) -> Result<Value<'a>, TemplateError> {
        let value = match (self, name) {
            (Value::Page(artifacts), "Artifacts") => Value::Artifacts(artifacts),
            (Value::Artifact(a), "BuilderType") => Value::Str(&a.builder_target),
            (Value::Artifact(a), "BuilderId") => Value::Str(&a.builder_id),
            (Value::Artifact(a), "Id") => Value::Str(&a.id),
            (Value::Artifact(a), "IdSplit") => Value::List(&a.id_parts),
            (Value::Artifact(a), "Message") => Value::Str(&a.message),
            (Value::Artifact(a), "FilesCount") => Value::Str(&a.files_count),
            _ => {
                return Err(TemplateError::UnknownField {
                    field: name.to_string(),
                    scope: self.scope(),
                })
            }
        };
        Ok(value)
    }

    fn index(self, index: usize) -> Result<Value<'a>, TemplateError> {
        let len = match self {
            Value::List(items) => {
                if let Some(item) = items.get(index) {
                    return Ok(Value::Str(item));
                }
                items.len()
            }
            Value::Artifacts(artifacts) => {
                if let Some(artifact) = artifacts.get(index) {
                    return Ok(Value::Artifact(artifact));
                }
                artifacts.len()
            }
            other => {
                return Err(TemplateError::BadIndex(format!(
                    "can't index {}",
                    other.scope()
                )))
            }
        };
        Err(TemplateError::IndexOutOfRange { index, len })
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Page(_) | Value::Artifact(_) => true,
            Value::Artifacts(artifacts) => !artifacts.is_empty(),
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    fn write_to(&self, out: &mut String) -> Result<(), TemplateError> {
        match self {
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                let _ = write!(out, "[{}]", items.join(" "));
            }
            other => return Err(TemplateError::NotPrintable(other.scope())),
        }
        Ok(())
    }
}

fn eval<'a>(expr: &Expr, dot: Value<'a>) -> Result<Value<'a>, TemplateError> {
    match expr {
        Expr::Dot => Ok(dot),
        Expr::Field(name) => dot.field(name),
        Expr::Index(target, index) => eval(target, dot)?.index(*index),
    }
}

fn exec(nodes: &[Node], dot: Value<'_>, out: &mut String) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Print(expr) => eval(expr, dot)?.write_to(out)?,
            Node::Block {
                kind: BlockKind::If,
                expr,
                body,
                otherwise,
            } => {
                if eval(expr, dot)?.is_truthy() {
                    exec(body, dot, out)?;
                } else {
                    exec(otherwise, dot, out)?;
                }
            }
            Node::Block {
                kind: BlockKind::Range,
                expr,
                body,
                otherwise,
            } => match eval(expr, dot)? {
                Value::Artifacts([]) | Value::List([]) => exec(otherwise, dot, out)?,
                Value::Artifacts(artifacts) => {
                    for artifact in artifacts {
                        exec(body, Value::Artifact(artifact), out)?;
                    }
                }
                Value::List(items) => {
                    for item in items {
                        exec(body, Value::Str(item), out)?;
                    }
                }
                other => return Err(TemplateError::NotIterable(other.scope())),
            },
        }
    }
    Ok(())
}

/// A parsed output template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source.
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        Ok(Template {
            nodes: parse(lex(src)?)?,
        })
    }

    /// Render the template over `artifacts`.
    pub fn render(&self, artifacts: &[Artifact]) -> Result<String, TemplateError> {
        let mut out = String::new();
        exec(&self.nodes, Value::Page(artifacts), &mut out)?;
        Ok(out)
    }
}
