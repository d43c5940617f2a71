//! Cleanup script rendering for deleted paths.
//!
//! Every dialect takes the target directory as its first argument, removes
//! each listed path relative to it and prints `Deleted: <dir>/<path>`.

/// Supported script dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptDialect {
    Bash,
    Batch,
    PowerShell,
}

impl ScriptDialect {
    /// Default dialect for the host platform.
    pub fn native() -> Self {
        if cfg!(windows) {
            ScriptDialect::PowerShell
        } else {
            ScriptDialect::Bash
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ScriptDialect::Bash => "sh",
            ScriptDialect::Batch => "bat",
            ScriptDialect::PowerShell => "ps1",
        }
    }

    pub fn render(self, deleted: &[String]) -> String {
        match self {
            ScriptDialect::Bash => render_bash(deleted),
            ScriptDialect::Batch => render_batch(deleted),
            ScriptDialect::PowerShell => render_powershell(deleted),
        }
    }
}

fn render_bash(deleted: &[String]) -> String {
    let mut s = String::from("#!/bin/bash\ndir=\"$1\"\n");
    for p in deleted {
        let q = shell_words::quote(p);
        s.push_str(&format!("rm -- \"$dir/\"{q} && echo \"Deleted: $dir/\"{q}\n"));
    }
    s
}

fn render_batch(deleted: &[String]) -> String {
    let mut s = String::from("@echo off\r\nset \"dir=%~1\"\r\n");
    for p in deleted {
        let p = p.replace('/', "\\").replace('%', "%%");
        let shown = cmd_escape(&p);
        s.push_str(&format!("del \"%dir%\\{p}\" && echo Deleted: %dir%\\{shown}\r\n"));
    }
    s
}

fn render_powershell(deleted: &[String]) -> String {
    let mut s = String::from("Param( [string]$dir )\n$ErrorActionPreference = 'Stop'\n");
    for p in deleted {
        let q = ps_quote(p);
        s.push_str(&format!(
            "Remove-Item -LiteralPath (Join-Path $dir {q}); Write-Output (\"Deleted: \" + (Join-Path $dir {q}))\n"
        ));
    }
    s
}

/// Escape cmd metacharacters for unquoted `echo` text.
fn cmd_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '^' | '&' | '|' | '<' | '>' | '(' | ')') {
            out.push('^');
        }
        out.push(c);
    }
    out
}

fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
