//! Interactive console over a session.
//!
//! Usage: `tilth <catalog.json> [database]`

use std::collections::HashMap;
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tilth_catalog::Catalog;
use tilth_foundation::ObjectId;
use tilth_runtime::Session;
use tilth_store::FindFlags;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  open <name>                  open an object (handle printed)
  close <handle>               drop a reference
  get <handle> <attr> [index] [unit]
  set <handle> <attr> <index> <value>
  size <handle> <attr>
  resize <handle> <attr> <n>
  save <handle>                write the object to the database
  xml <handle>                 print the object as XML
  opendb <path> [ro]           open the backing database
  closedb                      close the backing database
  find <query>                 list matching record paths
  lock | unlock | run | finish update engine controls
  autorun <on|off>
  error                        print and clear the last error
  help | quit";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(catalog_path) = args.next() else {
        eprintln!("usage: tilth <catalog.json> [database]");
        std::process::exit(2);
    };
    let catalog = match Catalog::load_json(&catalog_path) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let mut session = Session::new(catalog);
    if let Some(db) = args.next() {
        if session.open_database(&db, false) < 0 {
            eprintln!("error: {}", session.last_error());
            std::process::exit(1);
        }
        println!("database: {db}");
    }

    let mut editor = match DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let mut handles: HashMap<usize, ObjectId> = HashMap::new();
    let mut next_handle = 1usize;

    loop {
        let line = match editor.readline("tilth> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let rest: Vec<&str> = words.collect();

        match command {
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "open" => {
                let name = line["open".len()..].trim();
                let id = session.open_object(name);
                if id.is_null() {
                    println!("error: {}", session.last_error());
                } else {
                    handles.insert(next_handle, id);
                    println!("#{next_handle}");
                    next_handle += 1;
                }
            }
            "close" => match lookup(&handles, &rest) {
                Some(id) => report(session.close_object(id), &session),
                None => println!("usage: close <handle>"),
            },
            "get" => match (lookup(&handles, &rest), rest.get(1)) {
                (Some(id), Some(attr)) => {
                    let index = rest.get(2).and_then(|s| s.parse().ok()).unwrap_or(-1);
                    let unit = rest.get(3).copied().unwrap_or("");
                    match session.get_value(id, attr, unit, index) {
                        Some(text) => println!("{text}"),
                        None => println!("error: {}", session.last_error()),
                    }
                }
                _ => println!("usage: get <handle> <attr> [index] [unit]"),
            },
            "set" => match (lookup(&handles, &rest), rest.get(1), rest.get(2)) {
                (Some(id), Some(attr), Some(index)) => {
                    let index: i32 = index.parse().unwrap_or(-1);
                    let value = rest.get(3..).unwrap_or_default().join(" ");
                    report(session.set_value(id, attr, "", index, &value), &session);
                }
                _ => println!("usage: set <handle> <attr> <index> <value>"),
            },
            "size" => match (lookup(&handles, &rest), rest.get(1)) {
                (Some(id), Some(attr)) => report(session.get_size(id, attr), &session),
                _ => println!("usage: size <handle> <attr>"),
            },
            "resize" => match (lookup(&handles, &rest), rest.get(1), rest.get(2)) {
                (Some(id), Some(attr), Some(n)) => {
                    let n: i32 = n.parse().unwrap_or(-1);
                    report(session.set_size(id, attr, n), &session);
                }
                _ => println!("usage: resize <handle> <attr> <n>"),
            },
            "save" => match lookup(&handles, &rest) {
                Some(id) => report(session.save_object(id), &session),
                None => println!("usage: save <handle>"),
            },
            "xml" => match lookup(&handles, &rest) {
                Some(id) => match session.export_xml(id) {
                    Some(text) => println!("{text}"),
                    None => println!("error: {}", session.last_error()),
                },
                None => println!("usage: xml <handle>"),
            },
            "opendb" => match rest.first() {
                Some(path) => {
                    let ro = rest.get(1).is_some_and(|w| w.eq_ignore_ascii_case("ro"));
                    report(session.open_database(path, ro), &session);
                }
                None => println!("usage: opendb <path> [ro]"),
            },
            "closedb" => report(session.close_database(), &session),
            "find" => match rest.first() {
                Some(query) => {
                    let cursor = session.find(query, FindFlags::default());
                    if cursor < 0 {
                        println!("error: {}", session.last_error());
                    } else {
                        while let Some(path) = session.find_next(cursor, "FULL") {
                            println!("{path}");
                        }
                        session.find_close(cursor);
                    }
                }
                None => println!("usage: find <query>"),
            },
            "lock" => report(session.lock_update(), &session),
            "unlock" => report(session.unlock_update(), &session),
            "run" => report(session.run_updates(), &session),
            "finish" => report(session.finish_updates(), &session),
            "autorun" => match rest.first() {
                Some(&"on") => report(session.set_autorun(true), &session),
                Some(&"off") => report(session.set_autorun(false), &session),
                _ => println!("usage: autorun <on|off>"),
            },
            "error" => {
                println!("{}", session.last_error());
                session.clear_last_error();
            }
            other => println!("unknown command '{other}' (try 'help')"),
        }
    }
    session.exit();
}

fn lookup(handles: &HashMap<usize, ObjectId>, rest: &[&str]) -> Option<ObjectId> {
    let token = rest.first()?.trim_start_matches('#');
    handles.get(&token.parse().ok()?).copied()
}

fn report(code: i32, session: &Session) {
    if code < 0 {
        println!("error: {}", session.last_error());
    } else {
        println!("{code}");
    }
}
