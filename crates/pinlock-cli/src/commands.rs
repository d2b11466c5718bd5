//! Command handlers

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;
use zeroize::Zeroizing;

use pinlock_core::{
    AccessController, AccessState, ActivityOutcome, FileStore, GateConfig, SystemClock,
    WalletFileProbe,
};

/// Wire the gate over the file-backed store and wallet-file probe
pub fn open_gate(config: &GateConfig) -> Result<AccessController> {
    let store = FileStore::new(config.storage_dir.clone()).with_context(|| {
        format!(
            "Failed to open storage at {}",
            config.storage_dir.display()
        )
    })?;
    debug!(storage = %config.storage_dir.display(), wallet = %config.wallet_path.display(), "opening gate");

    Ok(AccessController::from_config(
        config,
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(WalletFileProbe::new(config.wallet_path.clone())),
    ))
}

pub fn status(gate: &AccessController) -> Result<()> {
    let snapshot = gate.startup();

    println!("State:            {}", describe_state(snapshot.state()));
    println!("Wallet present:   {}", yes_no(snapshot.wallet_exists));
    println!("PIN set:          {}", yes_no(gate.has_credential()));
    if snapshot.has_credential {
        println!("Session left:     {}", format_remaining(gate.remaining_time()));
    }
    Ok(())
}

pub fn set_pin(gate: &AccessController, pin: Option<String>, confirm: Option<String>) -> Result<()> {
    if gate.has_credential() {
        bail!("A PIN is already set - use change-pin instead");
    }

    let pin = read_pin(pin, "New PIN")?;
    let confirm = read_pin(confirm, "Confirm PIN")?;
    gate.setup_pin(&pin, &confirm)?;

    println!("PIN set. Session valid for {}", format_remaining(gate.remaining_time()));
    Ok(())
}

pub fn unlock(gate: &AccessController, pin: Option<String>) -> Result<()> {
    let pin = read_pin(pin, "PIN")?;
    gate.unlock(&pin)?;

    println!("Unlocked. Session valid for {}", format_remaining(gate.remaining_time()));
    Ok(())
}

pub fn change_pin(
    gate: &AccessController,
    current: Option<String>,
    new: Option<String>,
    confirm: Option<String>,
) -> Result<()> {
    let current = read_pin(current, "Current PIN")?;
    let new = read_pin(new, "New PIN")?;
    let confirm = read_pin(confirm, "Confirm new PIN")?;
    gate.change_pin(&current, &new, &confirm)?;

    println!("PIN changed");
    Ok(())
}

pub fn remove_pin(gate: &AccessController, current: Option<String>) -> Result<()> {
    let current = read_pin(current, "Current PIN")?;
    gate.remove_pin(&current)?;

    println!("PIN removed - the wallet is no longer PIN protected");
    Ok(())
}

pub fn lock(gate: &AccessController) -> Result<()> {
    gate.lock()?;
    println!("Locked");
    Ok(())
}

pub fn extend(gate: &AccessController) -> Result<()> {
    gate.extend()?;
    println!("Session left: {}", format_remaining(gate.remaining_time()));
    Ok(())
}

pub fn activity(gate: &AccessController) -> Result<()> {
    match gate.record_activity() {
        ActivityOutcome::Extended => println!(
            "Session extended: {}",
            format_remaining(gate.remaining_time())
        ),
        ActivityOutcome::Ignored => println!("No active session to extend"),
    }
    Ok(())
}

pub fn remaining(gate: &AccessController) -> Result<()> {
    println!("{}", format_remaining(gate.remaining_time()));
    Ok(())
}

pub fn reset(gate: &AccessController, yes: bool) -> Result<()> {
    if !yes {
        eprint!("This deletes the PIN and session. Type RESET to confirm: ");
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if answer.trim() != "RESET" {
            bail!("Reset cancelled");
        }
    }

    gate.reset()?;
    println!("PIN and session cleared");
    Ok(())
}

pub fn config_init(config: &GateConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    config.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn config_show(config: &GateConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Take the PIN from a flag, or prompt for one line on stdin
fn read_pin(value: Option<String>, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(value) = value {
        return Ok(Zeroizing::new(value));
    }

    eprint!("{prompt}: ");
    io::stderr().flush()?;

    let mut line = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read PIN from stdin")?;
    Ok(Zeroizing::new(
        line.trim_end_matches(&['\r', '\n'][..]).to_string(),
    ))
}

fn describe_state(state: AccessState) -> &'static str {
    match state {
        AccessState::Uninitialized => "uninitialized (no wallet)",
        AccessState::Locked => "locked",
        AccessState::Unlocked => "unlocked",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Format remaining time as MM:SS
fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(dir: &Path) -> GateConfig {
        GateConfig {
            storage_dir: dir.join("store"),
            wallet_path: dir.join("wallet.json"),
            ..GateConfig::default()
        }
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(125)), "02:05");
        assert_eq!(format_remaining(Duration::ZERO), "00:00");
        assert_eq!(format_remaining(Duration::from_millis(900_000)), "15:00");
    }

    #[test]
    fn test_gate_over_files() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        let gate = open_gate(&config).unwrap();
        assert_eq!(gate.state(), AccessState::Uninitialized);

        std::fs::write(&config.wallet_path, "{}").unwrap();
        set_pin(&gate, Some("123456".into()), Some("123456".into())).unwrap();
        lock(&gate).unwrap();

        // A second process sees the same records
        let reopened = open_gate(&config).unwrap();
        assert_eq!(reopened.state(), AccessState::Locked);
        unlock(&reopened, Some("123456".into())).unwrap();
        assert_eq!(gate.state(), AccessState::Unlocked);

        assert!(unlock(&gate, Some("000000".into())).is_err());
        reset(&gate, true).unwrap();
        assert!(!reopened.has_credential());
    }

    #[test]
    fn test_lockout_holds_across_invocations() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.wallet_path, "{}").unwrap();
        set_pin(&open_gate(&config).unwrap(), Some("123456".into()), Some("123456".into()))
            .unwrap();
        lock(&open_gate(&config).unwrap()).unwrap();

        // Each command opens its own gate, as separate CLI runs do
        let mut errors = Vec::new();
        for _ in 0..3 {
            let err = unlock(&open_gate(&config).unwrap(), Some("000000".into())).unwrap_err();
            errors.push(err.to_string());
        }
        assert_eq!(errors[0], "Incorrect PIN (2 attempts remaining)");
        assert_eq!(errors[1], "Incorrect PIN (1 attempts remaining)");
        assert_eq!(errors[2], "Too many attempts - locked for 30 seconds");

        let err = unlock(&open_gate(&config).unwrap(), Some("123456".into())).unwrap_err();
        assert!(err.to_string().starts_with("Too many attempts"));
        assert_eq!(open_gate(&config).unwrap().state(), AccessState::Locked);
    }

    #[test]
    fn test_set_pin_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.wallet_path, "{}").unwrap();

        let gate = open_gate(&config).unwrap();
        set_pin(&gate, Some("123456".into()), Some("123456".into())).unwrap();
        assert!(set_pin(&gate, Some("654321".into()), Some("654321".into())).is_err());
    }

    #[test]
    fn test_config_init_respects_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = test_config(dir.path());

        config_init(&config, &path, false).unwrap();
        assert!(config_init(&config, &path, false).is_err());
        config_init(&config, &path, true).unwrap();
        assert_eq!(GateConfig::load(&path).unwrap(), config);
    }
}
