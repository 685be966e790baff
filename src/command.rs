//! 交互式命令的解析器
//!
//! ## 命令语法
//!
//! ```text
//! show | json | help | quit
//! add-rule PATH          add-group PATH
//! remove PATH            clone PATH          lock PATH
//! set PATH key=value...  (field= operator= locked= value=, value= 必须放在最后)
//! combinator PATH and|or
//! move FROM TO
//! find ID                operators PATH
//! load FILE              save FILE
//! ```
//!
//! PATH 写作 `root` 或以点分隔的下标，例如 `0.2.1`。
//! `value=` 之后的整段文本先按JSON解析（`3`、`true`、`[1, 5]`），失败则当作字符串。

use crate::ast::{Combinator, RulePatch, Value};
use std::fmt;

/// 输入中的位置（字节偏移）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandError {
    pub message: String,
    pub span: Option<Span>,
}

impl CommandError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (位置 {}-{})", self.message, span.start, span.end),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Json,
    Help,
    Quit,
    AddRule(Vec<usize>),
    AddGroup(Vec<usize>),
    Remove(Vec<usize>),
    Clone(Vec<usize>),
    Lock(Vec<usize>),
    Set(Vec<usize>, RulePatch),
    Combinator(Vec<usize>, Combinator),
    Move { from: Vec<usize>, to: Vec<usize> },
    Find(String),
    Operators(Vec<usize>),
    Load(String),
    Save(String),
}

/// 以空白分隔的单词
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    span: Span,
}

fn split_words(input: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in input.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push(Word {
                    text: &input[s..i],
                    span: Span::new(s, i),
                });
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(Word {
            text: &input[s..],
            span: Span::new(s, input.len()),
        });
    }
    words
}

pub struct CommandParser<'a> {
    input: &'a str,
    words: Vec<Word<'a>>,
    position: usize,
}

impl<'a> CommandParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            words: split_words(input),
            position: 0,
        }
    }

    /// 返回当前单词并推进位置
    fn advance(&mut self) -> Option<Word<'a>> {
        let word = self.words.get(self.position).copied();
        if word.is_some() {
            self.position += 1;
        }
        word
    }

    /// 期望还有一个参数，否则返回错误
    fn expect(&mut self, what: &str) -> Result<Word<'a>, CommandError> {
        self.advance().ok_or_else(|| {
            CommandError::new(format!("缺少参数: {}", what), Some(Span::new(self.input.len(), self.input.len())))
        })
    }

    fn expect_path(&mut self) -> Result<Vec<usize>, CommandError> {
        let word = self.expect("PATH")?;
        parse_path(word.text).map_err(|message| CommandError::at(message, word.span))
    }

    /// 命令结束后不应再有多余的单词
    fn finish(&mut self, command: Command) -> Result<Command, CommandError> {
        match self.advance() {
            Some(extra) => Err(CommandError::at(format!("多余的参数: {}", extra.text), extra.span)),
            None => Ok(command),
        }
    }

    pub fn parse(&mut self) -> Result<Command, CommandError> {
        let Some(name) = self.advance() else {
            return Err(CommandError::new("空命令".to_string(), None));
        };

        let command = match name.text {
            "show" => Command::Show,
            "json" => Command::Json,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "add-rule" => Command::AddRule(self.expect_path()?),
            "add-group" => Command::AddGroup(self.expect_path()?),
            "remove" => Command::Remove(self.expect_path()?),
            "clone" => Command::Clone(self.expect_path()?),
            "lock" => Command::Lock(self.expect_path()?),
            "operators" => Command::Operators(self.expect_path()?),
            "move" => {
                let from = self.expect_path()?;
                let to = self.expect_path()?;
                Command::Move { from, to }
            }
            "combinator" => {
                let path = self.expect_path()?;
                let word = self.expect("and|or")?;
                let combinator = match word.text {
                    "and" => Combinator::And,
                    "or" => Combinator::Or,
                    other => {
                        return Err(CommandError::at(format!("未知的组合方式: {}", other), word.span));
                    }
                };
                Command::Combinator(path, combinator)
            }
            "find" => Command::Find(self.expect("ID")?.text.to_string()),
            "load" => Command::Load(self.expect("FILE")?.text.to_string()),
            "save" => Command::Save(self.expect("FILE")?.text.to_string()),
            // set 自己消费剩余输入
            "set" => return self.parse_set(),
            other => return Err(CommandError::at(format!("未知命令: {}", other), name.span)),
        };

        self.finish(command)
    }

    fn parse_set(&mut self) -> Result<Command, CommandError> {
        let path = self.expect_path()?;
        let mut patch = RulePatch::default();

        while let Some(word) = self.advance() {
            let Some((key, raw)) = word.text.split_once('=') else {
                return Err(CommandError::at(format!("期望 key=value, 得到 {}", word.text), word.span));
            };
            match key {
                "field" => patch.field = Some(raw.to_string()),
                "operator" => patch.operator = Some(raw.to_string()),
                "locked" => {
                    let locked = raw
                        .parse::<bool>()
                        .map_err(|_| CommandError::at(format!("locked 需要 true 或 false, 得到 {}", raw), word.span))?;
                    patch.is_locked = Some(locked);
                }
                "value" => {
                    // 取到行尾，允许值里有空格
                    let start = word.span.start + "value=".len();
                    let rest = self.input[start..].trim();
                    patch.value = Some(parse_value(rest));
                    self.position = self.words.len();
                }
                other => {
                    return Err(CommandError::at(format!("未知的规则属性: {}", other), word.span));
                }
            }
        }

        if patch.is_empty() {
            return Err(CommandError::new("set 至少需要一个 key=value".to_string(), None));
        }
        Ok(Command::Set(path, patch))
    }
}

/// `root` 或点分隔的下标
pub fn parse_path(text: &str) -> Result<Vec<usize>, String> {
    if matches!(text, "root" | "/" | "[]") {
        return Ok(Vec::new());
    }
    text.split('.')
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| format!("无效的路径: {}", text))
        })
        .collect()
}

/// 空文本清除值；能按JSON解析的按JSON，其余当作字符串
fn parse_value(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::text(raw)))
}

/// 解析一行命令
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    CommandParser::new(line).parse()
}
