use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anvil::constraint::ConstraintSelector;
use anvil::printer::OutputKind;
use anvil::value::{parse_literal, DataType, Value};
use anvil::{Engine, EngineConfig};
use clap::Parser;
use colored::*;

#[derive(Parser)]
struct Opts {
    #[clap(subcommand)]
    cmd: Command,
    /// Root directory databases are stored under.
    #[clap(long, default_value = "./data")]
    root: PathBuf,
}

#[derive(Parser)]
enum Command {
    /// Start an interactive line-oriented shell.
    Open {
        name: String,
    },
    /// Execute a script file line-by-line.
    Run {
        name: String,
        script: PathBuf,
    },
}

fn main() {
    let opts: Opts = Opts::parse();
    let config = EngineConfig::new(opts.root);
    let engine = Engine::new(config);

    let result = match opts.cmd {
        Command::Open { name } => {
            open_database(&engine, &name);
            repl(&engine, &mut io::stdin().lock())
        }
        Command::Run { name, script } => {
            open_database(&engine, &name);
            let file = fs::File::open(&script).map(io::BufReader::new);
            match file {
                Ok(mut reader) => repl(&engine, &mut reader),
                Err(e) => Err(anyhow::anyhow!("could not open script '{}': {}", script.display(), e)),
            }
        }
    };

    if let Err(e) = result {
        println!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}

fn open_database(engine: &Engine, name: &str) {
    match engine.open(name, None) {
        Ok(()) => println!("{} opened '{}'", "+".green(), name),
        Err(_) => match engine.create_database(name, None) {
            Ok(()) => println!("{} created '{}'", "+".green(), name),
            Err(e) => println!("{} {}", "error:".red(), e),
        },
    }
}

/// Drives the engine façade one line at a time: each line is tokenized
/// into a command keyword and its arguments, not through the
/// condition-expression grammar (the command layer owns that).
fn repl(engine: &Engine, input: &mut impl BufRead) -> anyhow::Result<()> {
    print!("> ");
    io::stdout().flush().ok();

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            print!("> ");
            io::stdout().flush().ok();
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        match execute_line(engine, trimmed) {
            Ok(Some(message)) => println!("{}", message),
            Ok(None) => println!("{}", "ok".green()),
            Err(e) => println!("{} {}", "error:".red(), e),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

fn execute_line(engine: &Engine, line: &str) -> anyhow::Result<Option<String>> {
    let (keyword, rest) = split_first_word(line);

    match keyword.to_uppercase().as_str() {
        "OPEN" => {
            engine.open(rest.trim(), None)?;
            Ok(None)
        }
        "CREATE" => {
            let (what, rest) = split_first_word(rest);
            match what.to_uppercase().as_str() {
                "DATABASE" => {
                    engine.create_database(rest.trim(), None)?;
                    Ok(None)
                }
                "TABLE" => {
                    let (name, defs) = split_first_word(rest);
                    let column_defs = parse_paren_list(defs)?;
                    engine.create_table(name, column_defs)?;
                    Ok(None)
                }
                other => anyhow::bail!("unrecognized CREATE target '{}'", other),
            }
        }
        "ALTER" => {
            let (what, rest) = split_first_word(rest);
            if !what.eq_ignore_ascii_case("TABLE") {
                anyhow::bail!("unrecognized ALTER target '{}'", what);
            }
            let (table_name, rest) = split_first_word(rest);
            let (action, rest) = split_first_word(rest);
            match action.to_uppercase().as_str() {
                "ADD" => {
                    engine.alter_table(table_name, Some(vec![rest.trim().to_string()]), None, None, None)?;
                    Ok(None)
                }
                "MODIFY" => {
                    let (column, type_name) = split_first_word(rest);
                    let new_type = DataType::parse(type_name.trim())?;
                    engine.alter_table(
                        table_name,
                        None,
                        Some(vec![(column.to_string(), new_type)]),
                        None,
                        None,
                    )?;
                    Ok(None)
                }
                "DROP" => {
                    let (what, rest) = split_first_word(rest);
                    match what.to_uppercase().as_str() {
                        "COLUMN" => {
                            engine.alter_table(table_name, None, None, Some(vec![rest.trim().to_string()]), None)?;
                            Ok(None)
                        }
                        "CONSTRAINT" => {
                            let (column, selector_text) = split_first_word(rest);
                            let selector = parse_constraint_selector(selector_text.trim());
                            engine.alter_table(
                                table_name,
                                None,
                                None,
                                None,
                                Some(vec![(column.to_string(), selector)]),
                            )?;
                            Ok(None)
                        }
                        other => anyhow::bail!("unrecognized ALTER ... DROP target '{}'", other),
                    }
                }
                "RENAME" => {
                    let (_to, new_name) = split_first_word(rest);
                    engine.rename_table(table_name, new_name.trim())?;
                    Ok(None)
                }
                other => anyhow::bail!("unrecognized ALTER TABLE action '{}'", other),
            }
        }
        "DROP" => {
            let (what, rest) = split_first_word(rest);
            match what.to_uppercase().as_str() {
                "TABLE" => {
                    engine.drop_table(rest.trim())?;
                    Ok(None)
                }
                other => anyhow::bail!("unrecognized DROP target '{}'", other),
            }
        }
        "INSERT" => {
            let (into, rest) = split_first_word(rest);
            if !into.eq_ignore_ascii_case("INTO") {
                anyhow::bail!("expected INTO after INSERT");
            }
            let (table_name, rest) = split_first_word(rest);
            let (columns_part, values_part) = rest
                .split_once("VALUES")
                .or_else(|| rest.split_once("values"))
                .ok_or_else(|| anyhow::anyhow!("expected VALUES in INSERT"))?;
            let columns = parse_paren_list(columns_part)?;
            let literals = parse_paren_list(values_part)?;
            let values: Vec<Value> = literals
                .iter()
                .map(|s| parse_literal(s))
                .collect::<Result<_, _>>()?;
            engine.insert(table_name, columns, vec![values])?;
            Ok(None)
        }
        "UPDATE" => {
            let (table_name, rest) = split_first_word(rest);
            let (set_kw, rest) = split_first_word(rest);
            if !set_kw.eq_ignore_ascii_case("SET") {
                anyhow::bail!("expected SET after UPDATE <table>");
            }
            let (assignments_text, condition) = split_where(rest);
            let assignments = parse_assignments(assignments_text)?;
            engine.update(table_name, assignments, condition.as_deref())?;
            Ok(None)
        }
        "DELETE" => {
            let (from, rest) = split_first_word(rest);
            if !from.eq_ignore_ascii_case("FROM") {
                anyhow::bail!("expected FROM after DELETE");
            }
            let (table_name, rest) = split_first_word(rest);
            let (_, condition) = split_where(rest);
            engine.delete(table_name, condition.as_deref())?;
            Ok(None)
        }
        "SELECT" => {
            let (projection, rest) = rest
                .split_once("FROM")
                .or_else(|| rest.split_once("from"))
                .ok_or_else(|| anyhow::anyhow!("expected FROM in SELECT"))?;
            let (table_name, rest) = split_first_word(rest);
            let (_, condition) = split_where(rest);
            let columns = if projection.trim() == "*" {
                None
            } else {
                Some(
                    projection
                        .split(',')
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect(),
                )
            };
            let response = engine.select(table_name, columns, condition.as_deref())?;
            Ok(Some(anvil::printer::render(&response)))
        }
        "BEGIN" => {
            engine.begin()?;
            Ok(None)
        }
        "COMMIT" => {
            engine.commit()?;
            Ok(None)
        }
        "ROLLBACK" => {
            engine.rollback()?;
            Ok(None)
        }
        "UNDO" => {
            engine.undo()?;
            Ok(None)
        }
        "SHOW" => {
            let arg = rest.trim();
            let path = if arg.is_empty() { None } else { Some(PathBuf::from(arg)) };
            let response = engine.show(path)?;
            Ok(Some(anvil::printer::render(&response)))
        }
        "HELP" => {
            let topic = rest.trim();
            let topic = if topic.is_empty() { None } else { Some(topic.to_string()) };
            Ok(Some(engine.help(topic)?.to_string()))
        }
        "PRINT" => {
            engine.print(OutputKind::Console, None)?;
            Ok(None)
        }
        other => anyhow::bail!("unrecognized command '{}'", other),
    }
}

fn split_first_word(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    }
}

fn split_where(text: &str) -> (&str, Option<String>) {
    if let Some(idx) = text.to_uppercase().find("WHERE") {
        (&text[..idx], Some(text[idx + "WHERE".len()..].trim().to_string()))
    } else {
        (text, None)
    }
}

/// Parses a parenthesized comma-separated list, respecting quoted strings
/// and nested `CHECK(...)` parens so commas inside a quoted literal or a
/// check expression do not split the list.
fn parse_paren_list(text: &str) -> anyhow::Result<Vec<String>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| anyhow::anyhow!("expected a parenthesized list in '{}'", text))?;

    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();

    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    items.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        items.push(current.trim().to_string());
    }
    Ok(items)
}

fn parse_assignments(text: &str) -> anyhow::Result<Vec<(String, Value)>> {
    parse_paren_list(&format!("({})", text))?
        .iter()
        .map(|assignment| {
            let (name, literal) = assignment
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("expected '=' in assignment '{}'", assignment))?;
            Ok((name.trim().to_string(), parse_literal(literal.trim())?))
        })
        .collect()
}

fn parse_constraint_selector(text: &str) -> ConstraintSelector {
    match text.to_lowercase().as_str() {
        "not_null" | "unique" | "primary_key" | "foreign_key" | "check" => {
            ConstraintSelector::Kind(text.to_lowercase())
        }
        _ => ConstraintSelector::Name(text.to_string()),
    }
}
