//! `botshim run`: execute a script's entry point in a fresh session.

use botshim_core::scripting::{ScriptEngine, ScriptOutcome};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{fail, load_config};
use super::output::print_json;
use crate::RunArgs;

pub fn run(config_path: Option<&Path>, profile: Option<&str>, args: &RunArgs) {
    let rc = load_config(config_path, profile);

    let script_path = resolve_script(&args.script, rc.scripts_dir.as_deref());
    let source = fs::read_to_string(&script_path).unwrap_or_else(|e| {
        fail(format!("Failed to read script {}: {e}", script_path.display()))
    });

    let engine = ScriptEngine::from_config(&rc)
        .unwrap_or_else(|e| fail(format!("Failed to start Lua engine: {e}")));

    for var in &args.vars {
        let Some((name, raw)) = var.split_once('=') else {
            fail(format!("Invalid --var '{var}': expected NAME=VALUE"));
        };
        let seeded = engine
            .with_context(|ctx| ctx.set_variable(name, parse_value(raw), 0))
            .unwrap_or_else(|e| fail(e));
        if let Err(e) = seeded {
            fail(format!("Invalid --var '{var}': {}: {e}", e.kind()));
        }
    }

    let script_args: Vec<Value> = args.args.iter().map(|a| parse_value(a)).collect();
    let name = script_path.display().to_string();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("Failed to start async runtime: {e}")));

    match runtime.block_on(engine.run(&name, &source, script_args)) {
        Ok(ScriptOutcome::Completed(value)) => print_json(&value),
        Ok(ScriptOutcome::Captured { variable, message }) => {
            println!("captured into '{variable}': {message}");
        }
        Err(e) => fail(e.script_message()),
    }

    if args.show_context {
        let vars = engine
            .with_context(|ctx| {
                ctx.purge_expired();
                ctx.variables()
            })
            .unwrap_or_else(|e| fail(e));
        print_json(&vars);
    }

    crate::logging::flush();
}

/// Use the path as given when it exists, else look under `scripts_dir`.
fn resolve_script(script: &Path, scripts_dir: Option<&Path>) -> PathBuf {
    if script.exists() || script.is_absolute() {
        return script.to_path_buf();
    }
    match scripts_dir {
        Some(dir) => dir.join(script),
        None => script.to_path_buf(),
    }
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("hello"), json!("hello"));
        assert_eq!(parse_value(""), json!(""));
    }

    #[test]
    fn test_resolve_script_prefers_existing_path() {
        let tmp = std::env::temp_dir();
        assert_eq!(resolve_script(&tmp, Some(Path::new("/scripts"))), tmp);
    }

    #[test]
    fn test_resolve_script_falls_back_to_scripts_dir() {
        let resolved = resolve_script(Path::new("greet.lua"), Some(Path::new("/scripts")));
        assert_eq!(resolved, PathBuf::from("/scripts/greet.lua"));
    }
}
