use anyhow::{Context, Result};
use query_builder::ast::{GroupPatch, RuleGroup};
use query_builder::builder::QueryBuilder;
use query_builder::command::{parse_command, Command};
use query_builder::config::{BuilderConfig, DEFAULT_CONFIG_FILE};
use query_builder::edit::Edit;
use query_builder::ids::UuidIds;
use query_builder::path::format_path;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
命令:
  show | json | help | quit
  add-rule PATH | add-group PATH | remove PATH | clone PATH | lock PATH
  set PATH field=.. operator=.. locked=true|false value=..
  combinator PATH and|or
  move FROM TO
  find ID | operators PATH
  load FILE | save FILE
PATH 写作 root 或 0.2.1";

/// 加载配置，失败时使用默认配置
fn load_config() -> BuilderConfig {
    match BuilderConfig::from_json_file(DEFAULT_CONFIG_FILE) {
        Ok(config) => {
            println!("✅ 使用JSON配置文件: {}", DEFAULT_CONFIG_FILE);
            if let Some(max_depth) = config.max_depth {
                println!("  最大嵌套层数: {}", max_depth);
            }
            println!("  加载了 {} 个字段", config.fields.len());
            config
        }
        Err(e) => {
            println!("⚠️ 无法加载配置文件 ({}), 使用默认配置", e);
            BuilderConfig::default()
        }
    }
}

fn report(action: &str, edit: &Edit) {
    match edit.rejected {
        None => println!("✓ {}", action),
        Some(reason) => println!("✗ {} 未执行: {}", action, reason),
    }
}

/// 执行一条命令，返回 false 表示退出
fn execute(builder: &mut QueryBuilder, command: Command) -> Result<bool> {
    match command {
        Command::Show => print!("{}", builder.query()),
        Command::Json => println!("{}", serde_json::to_string_pretty(builder.query())?),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(false),
        Command::AddRule(path) => report("add-rule", &builder.add_rule(&path)),
        Command::AddGroup(path) => report("add-group", &builder.add_group(&path)),
        Command::Remove(path) => report("remove", &builder.remove(&path)),
        Command::Clone(path) => report("clone", &builder.clone_node(&path)),
        Command::Lock(path) => report("lock", &builder.toggle_lock(&path)),
        Command::Set(path, patch) => report("set", &builder.update_rule(&path, &patch)),
        Command::Combinator(path, combinator) => {
            let patch = GroupPatch {
                combinator: Some(combinator),
                ..Default::default()
            };
            report("combinator", &builder.update_group(&path, &patch));
        }
        Command::Move { from, to } => report("move", &builder.move_node(&from, &to)),
        Command::Find(id) => match builder.find(&id) {
            Some(path) => println!("{} -> {}", id, format_path(&path)),
            None => println!("未找到: {}", id),
        },
        Command::Operators(path) => {
            let operators = builder.operators_at(&path);
            if operators.is_empty() {
                println!("没有可用的运算符（不是规则，或字段未在配置中声明）");
            }
            for op in operators {
                println!("  {:<18} {:<22} {:?}", op.value, op.name, op.kind);
            }
        }
        Command::Load(file) => {
            let content = fs::read_to_string(&file).with_context(|| format!("无法读取 {}", file))?;
            let query: RuleGroup =
                serde_json::from_str(&content).with_context(|| format!("无法解析查询 {}", file))?;
            builder.replace(Arc::new(query));
            println!("✓ 已加载 {}", file);
        }
        Command::Save(file) => {
            let json = serde_json::to_string_pretty(builder.query())?;
            fs::write(&file, json).with_context(|| format!("无法写入 {}", file))?;
            println!("✓ 已保存到 {}", file);
        }
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("--- Query Builder: 规则树编辑器 ---");
    let mut builder = QueryBuilder::blank(load_config(), Arc::new(UuidIds));
    println!("输入 help 查看命令\n");
    print!("{}", builder.query());

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("query> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("✗ {}", e);
                        continue;
                    }
                };
                match execute(&mut builder, command) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("✗ {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
