use docqa::{Reply, Session};
use docqa_core::Corpus;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _base: TempDir,
    _docs: TempDir,
    session: Session,
}

fn fixture(setup: impl FnOnce(&Path, &Path)) -> Fixture {
    let base = tempdir().unwrap();
    let docs = tempdir().unwrap();
    setup(base.path(), docs.path());
    let session = Session::new(Corpus::new(), base.path().to_path_buf(), docs.path().to_path_buf());
    Fixture { _base: base, _docs: docs, session }
}

fn say(session: &mut Session, line: &str) -> String {
    session.respond(line).text().to_string()
}

#[test]
fn load_then_ask_prints_ranked_matches() {
    let mut f = fixture(|base, _| {
        fs::write(base.join("pets.txt"), "the cat sat\n\nthe dog ran").unwrap();
    });
    assert_eq!(
        say(&mut f.session, "load pets.txt"),
        "Loaded pets.txt with 2 chunks. Ask with: ask <question>"
    );
    let out = say(&mut f.session, "ask cat");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Top matches for: cat");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("- [pets.txt] ("));
    assert!(lines[1].ends_with(") the cat sat"));
}

#[test]
fn load_falls_back_to_docs_dir() {
    let mut f = fixture(|_, docs| {
        fs::write(docs.join("guide.md"), "hello from docs").unwrap();
    });
    assert!(say(&mut f.session, "LOAD \"guide.md\"").starts_with("Loaded guide.md with 1 chunks."));
}

#[test]
fn unsupported_or_missing_file_is_rejected() {
    let mut f = fixture(|base, _| {
        fs::write(base.join("data.bin"), "binary").unwrap();
    });
    let msg = "File not found or unsupported. Use .txt/.md/.log";
    assert_eq!(say(&mut f.session, "load data.bin"), msg);
    assert_eq!(say(&mut f.session, "load missing.txt"), msg);
    assert!(f.session.corpus().documents().is_empty());
}

#[test]
fn folder_intent_wins_over_file_intent() {
    let mut f = fixture(|base, _| {
        let dir = base.join("notes");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.txt"), "Hello world").unwrap();
        fs::write(dir.join("b.md"), "Hello there").unwrap();
        fs::write(dir.join("c.bin"), [0u8, 1, 2]).unwrap();
        fs::create_dir(base.join("empty")).unwrap();
    });
    assert_eq!(
        say(&mut f.session, "load folder notes"),
        "Indexed 2 files, 2 chunks. Ask with: ask <question>"
    );
    assert_eq!(say(&mut f.session, "load folder empty"), "No .txt/.md/.log files found in that folder.");
    assert_eq!(say(&mut f.session, "load folder nowhere"), "Folder not found.");
    assert_eq!(
        say(&mut f.session, "show docs"),
        "Docs:\n   1. a.txt  (1 chunks)\n   2. b.md  (1 chunks)"
    );
}

#[test]
fn clear_docs_resets_everything() {
    let mut f = fixture(|base, _| {
        fs::write(base.join("a.txt"), "alpha beta").unwrap();
    });
    say(&mut f.session, "load a.txt");
    assert_eq!(say(&mut f.session, "clear docs"), "Cleared all docs.");
    assert_eq!(say(&mut f.session, "list docs"), "No docs loaded. Use: load <file> or load folder <path>");
    assert_eq!(
        say(&mut f.session, "ask alpha"),
        "No good matches found. Try rephrasing or loading more files."
    );
}

#[test]
fn fallbacks_and_quit() {
    let mut f = fixture(|_, _| {});
    assert_eq!(say(&mut f.session, "   "), "Say something.");
    assert_eq!(say(&mut f.session, "remember x is y"), "Not sure. Try 'help'.");
    assert!(say(&mut f.session, "help").contains("load folder <path>"));
    assert_eq!(f.session.respond("Quit"), Reply::Quit("Bye!".to_string()));
}

#[test]
fn deferred_rebuild_leaves_chunks_unscored() {
    let base = tempdir().unwrap();
    fs::write(base.path().join("a.txt"), "deferred words").unwrap();
    let mut session = Session::new(Corpus::new(), base.path().to_path_buf(), base.path().to_path_buf())
        .with_auto_rebuild(false)
        .with_top_k(1);
    session.load_file("a.txt").unwrap();
    assert!(session.corpus().needs_rebuild());
    assert!(session.ask("deferred").text().starts_with("No good matches"));
    session.rebuild();
    assert!(session.ask("deferred").text().starts_with("Top matches for: deferred"));
}
