use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CATALOG: &str = "\
Game,Prize Name,Cost USD,Weight (g),Notes
GAME 1: Labubu,Mini,12,40,
GAME 1: Labubu,Mega,80,900,Pink edition
GAME Labubu,Keychain,9,,
GAME 1: Labubu,Plush,25,200,
GAME 2: Smiski,Bath,10,30,
";

/// Scratch working directory with a catalog file and no API credential.
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().expect("temp dir");
        fs::write(root.path().join("prizes.csv"), CATALOG).expect("write catalog");
        Self { root }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn out(&self) -> PathBuf {
        self.path().join("generated")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("grabbit-images").expect("binary built");
        cmd.current_dir(self.path())
            .env_remove("GEMINI_API_KEY")
            .env_remove("GOOGLE_API_KEY")
            .env_remove("GRABBIT_LOG");
        cmd
    }

    fn batch(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("batch")
            .arg("--csv")
            .arg(self.path().join("prizes.csv"))
            .arg("--out")
            .arg(self.out());
        cmd
    }
}

#[test]
fn dry_run_previews_catalog_without_writing() {
    let ws = Workspace::new();
    ws.batch()
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: 2 games, 5 prizes"))
        .stdout(predicate::str::contains("Labubu: 4 prizes"))
        .stdout(predicate::str::contains("... and 1 more"))
        .stdout(predicate::str::contains("Would generate 5 of 5 prize images"));
    assert!(!ws.out().exists());
}

#[test]
fn dry_run_honours_game_filter() {
    let ws = Workspace::new();
    ws.batch()
        .args(["--dry-run", "--game", "SMISKI", "--banners-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: 1 games, 1 prizes"))
        .stdout(predicate::str::contains("Would generate 1 of 1 banner images"))
        .stdout(predicate::str::contains("prize images").not());
}

#[test]
fn missing_catalog_exits_with_config_code() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["batch", "--csv", "nope.csv", "--dry-run"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("input file not found"));
}

#[test]
fn unmatched_filter_exits_with_config_code() {
    let ws = Workspace::new();
    ws.batch()
        .args(["--game", "pokemon", "--provider", "placeholder"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no games found matching 'pokemon'"));
}

#[test]
fn missing_credential_is_reported_before_any_work() {
    let ws = Workspace::new();
    ws.batch()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
    assert!(!ws.out().exists());
}

#[test]
fn missing_explicit_reference_is_fatal() {
    let ws = Workspace::new();
    ws.batch()
        .args(["--provider", "placeholder", "--prize-ref", "missing.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.png"));
}

#[test]
fn placeholder_batch_writes_layout_and_is_idempotent() {
    let ws = Workspace::new();
    ws.batch()
        .args(["--provider", "placeholder"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prizes: 5 generated, 0 skipped, 0 failed"))
        .stdout(predicate::str::contains("Banners: 2 generated, 0 skipped, 0 failed"));

    let out = ws.out();
    assert!(out.join("prizes/labubu/mini.png").is_file());
    assert!(out.join("prizes/labubu/keychain.png").is_file());
    assert!(out.join("prizes/smiski/bath.png").is_file());
    assert!(out.join("games/labubu-banner.png").is_file());
    assert!(out.join("games/smiski-banner.png").is_file());
    assert!(out.join("events.jsonl").is_file());

    ws.batch()
        .args(["--provider", "placeholder"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Prizes: 0 generated, 5 skipped, 0 failed"))
        .stdout(predicate::str::contains("Banners: 0 generated, 2 skipped, 0 failed"));
}

#[test]
fn prize_subcommand_generates_one_image() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "prize",
            "--name",
            "Space Molly",
            "--game",
            "Pop Mart",
            "--provider",
            "placeholder",
            "--grounding",
            "--out",
        ])
        .arg(ws.out())
        .assert()
        .success()
        .stdout(predicate::str::contains("Prizes: 1 generated"));
    assert!(ws.out().join("prizes/pop-mart/space-molly.png").is_file());
}

#[test]
fn banner_subcommand_accepts_comma_list() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "banner",
            "--game",
            "Sanrio Friends",
            "--prizes",
            "Kuromi, My Melody",
            "--provider",
            "placeholder",
            "--out",
        ])
        .arg(ws.out())
        .assert()
        .success()
        .stdout(predicate::str::contains("Banners: 1 generated"));
    assert!(ws.out().join("games/sanrio-friends-banner.png").is_file());
}

#[test]
fn prize_with_unusable_game_name_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["prize", "--name", "Mini", "--game", "(%)", "--provider", "placeholder", "--out"])
        .arg(ws.out())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("game name '(%)'"));
    assert!(!ws.out().exists());
}
