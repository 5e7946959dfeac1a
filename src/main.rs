use log::{error, info};
use std::path::{Path, PathBuf};

fn configure_env_from_cli() -> Result<Option<PathBuf>, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--env-file") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--env-file=") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let path_str = &s["--env-file=".len()..];
                if path_str.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                env_file = Some(PathBuf::from(path_str));
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    match env_file {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("env file not found: {}", path.display()));
            }
            load_env_file(&path)?;
            Ok(Some(path))
        }
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let default_path = cwd.join(".env");
            if default_path.is_file() {
                load_env_file(&default_path)?;
                Ok(Some(default_path))
            } else {
                Ok(None)
            }
        }
    }
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    for (index, line) in contents.lines().enumerate() {
        match parse_env_assignment(line) {
            Ok(Some((key, value))) => {
                // Values already present in the process environment win.
                if std::env::var_os(&key).is_none() {
                    // Updating process-level environment variables is unsafe on some targets.
                    unsafe {
                        std::env::set_var(key, value);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                return Err(format!("{}:{}: {}", path.display(), index + 1, e));
            }
        }
    }

    Ok(())
}

fn parse_env_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let without_export = trimmed
        .strip_prefix("export ")
        .map(|s| s.trim_start())
        .unwrap_or(trimmed);

    let (key, value_part) = without_export
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();

    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    let value = parse_env_value(value_part)?;
    Ok(Some((key.to_string(), value)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix('"') {
        parse_quoted(rest, '"', "double")
    } else if let Some(rest) = trimmed.strip_prefix('\'') {
        parse_quoted(rest, '\'', "single")
    } else {
        // Unquoted values end at an inline comment.
        let value = trimmed.split('#').next().unwrap_or_default().trim_end();
        Ok(value.to_string())
    }
}

fn parse_quoted(input: &str, quote: char, label: &str) -> Result<String, String> {
    match input.split_once(quote) {
        Some((value, remainder)) => {
            // Only a comment may follow the closing quote.
            let remainder = remainder.trim();
            if remainder.is_empty() || remainder.starts_with('#') {
                Ok(value.to_string())
            } else {
                Err(format!("unexpected characters after closing {} quote", label))
            }
        }
        None => Err(format!("unterminated {}-quoted value", label)),
    }
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(path) = loaded_env.as_ref() {
        info!("Environment loaded from .env file: {}", path.display());
    }

    info!(
        "homewatt {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = homewatt::run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_assignment() {
        let parsed = parse_env_assignment("DATABASE_URL=postgres://localhost/homewatt").unwrap();
        assert_eq!(
            parsed,
            Some((
                "DATABASE_URL".to_string(),
                "postgres://localhost/homewatt".to_string()
            ))
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(parse_env_assignment("# comment").unwrap(), None);
        assert_eq!(parse_env_assignment("   ").unwrap(), None);
    }

    #[test]
    fn strips_quotes_and_inline_comments() {
        assert_eq!(
            parse_env_assignment("COLLECT_ACTOR=\"meter reader\"").unwrap(),
            Some(("COLLECT_ACTOR".to_string(), "meter reader".to_string()))
        );
        assert_eq!(
            parse_env_assignment("SEED_ENABLED=true # once").unwrap(),
            Some(("SEED_ENABLED".to_string(), "true".to_string()))
        );
    }

    #[test]
    fn accepts_comment_after_closing_quote() {
        assert_eq!(
            parse_env_assignment("DATABASE_URL=\"postgres://localhost/homewatt\" # local").unwrap(),
            Some((
                "DATABASE_URL".to_string(),
                "postgres://localhost/homewatt".to_string()
            ))
        );
        assert_eq!(
            parse_env_assignment("COLLECT_ACTOR='meter reader' # shared").unwrap(),
            Some(("COLLECT_ACTOR".to_string(), "meter reader".to_string()))
        );
        assert!(parse_env_assignment("BAD=\"value\" trailing").is_err());
    }

    #[test]
    fn rejects_malformed_assignments() {
        assert!(parse_env_assignment("NOEQUALS").is_err());
        assert!(parse_env_assignment("BAD KEY=1").is_err());
        assert!(parse_env_assignment("QUOTED=\"unterminated").is_err());
    }
}
