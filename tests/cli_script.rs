mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

use common::{config, setup_home};

const ARTIST_SIGNUP: &str = "\
start artist-signup
set fullName \"Ada Lovelace\"
set email ada@example.com
set password abcdefgh
set confirmPassword abcdefgh
next
set accountType composer
toggle genres \"hip hop\"
next
confirm
exit
";

fn cli(accepts: bool) -> Command {
    let home = setup_home(&config(accepts));
    let mut cmd = Command::cargo_bin("registration_cli").unwrap();
    cmd.env("REGISTRATION_CLI_SCRIPT", "1")
        .env("REGISTRATION_CORE_HOME", home)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_submits_artist_signup() {
    cli(true)
        .write_stdin(ARTIST_SIGNUP)
        .assert()
        .success()
        .stdout(contains("Registration submitted successfully"))
        .stdout(contains("Redirecting to /dashboard"));
}

#[test]
fn script_mode_reports_failures_and_retry() {
    let script = ARTIST_SIGNUP.replace("confirm\nexit\n", "confirm\nretry\nstatus\nexit\n");
    cli(false)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Submission failed"))
        .stdout(contains("Form reopened"))
        .stdout(contains("Redirecting").not());
}

#[test]
fn blocked_step_lists_the_errors() {
    cli(true)
        .write_stdin("start music\nset fullName Al\nnext\nexit\n")
        .assert()
        .success()
        .stdout(contains("Name must be at least 3 characters"))
        .stdout(contains("Please fix 3 error(s) before continuing."))
        .stdout(contains("Address is required"));
}

#[test]
fn music_registration_with_files() {
    let dir = tempfile::tempdir().unwrap();
    let id_doc = dir.path().join("passport.pdf");
    let song = dir.path().join("desert-rain.mp3");
    std::fs::write(&id_doc, b"%PDF-1.4").unwrap();
    std::fs::write(&song, b"ID3").unwrap();

    let script = format!(
        "start music-registration
set fullName \"Thandiwe Moyo\"
set address \"12 Independence Ave, Windhoek\"
attach idDocument \"{}\"
next
add songs
update songs 1 title \"Desert Rain\"
update songs 1 genre jazz
update songs 1 composer \"T. Moyo\"
attach songs 1 \"{}\"
remove songs 2
next
confirm
exit
",
        id_doc.display(),
        song.display()
    );

    cli(true)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Attached passport.pdf"))
        .stdout(contains("Attached desert-rain.mp3"))
        .stdout(contains("Removed item 2 of `songs`"))
        .stdout(contains("Redirecting to /dashboard"));
}

#[test]
fn unknown_commands_get_suggestions() {
    cli(true)
        .write_stdin("statsu\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `statsu`"))
        .stdout(contains("Suggestion: `status`?"));
}

#[test]
fn commands_without_a_form_explain_how_to_start() {
    cli(true)
        .write_stdin("next\nforms\nexit\n")
        .assert()
        .success()
        .stdout(contains("No form in progress."))
        .stdout(contains("music-registration"))
        .stdout(contains("admin-signup"));
}

#[test]
fn draft_is_written_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts").join("artist.json");
    let script = format!(
        "start artist\nset fullName Ada\ndraft \"{}\"\nexit\n",
        path.display()
    );

    cli(true)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Draft saved."));

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.contains("\"artist-signup\""));
    assert!(json.contains("\"Ada\""));
}
