//! Operator subcommands
//!
//! `api hash-password` reads a password from stdin and prints the Argon2id
//! PHC string to put into `ADMIN_PASSWORD`.

use anyhow::{Context, bail};
use std::io::{BufRead, Write};

pub const HASH_PASSWORD: &str = "hash-password";

/// Hash the first line of `input` and write the PHC string to `out`
pub fn hash_password(mut input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Refusing to hash an empty password");
    }

    let phc = platform::password::hash_password(password)?;
    writeln!(out, "{phc}")?;
    Ok(())
}
