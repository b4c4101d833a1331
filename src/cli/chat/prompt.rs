use rustyline::{Config, Editor, Result};

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("you > ").to_string()
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}

/// Asks a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let mut rl = rl()?;
    let line = rl.readline(&generate_prompt(Some(&format!("{question} [y/N] "))))?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
