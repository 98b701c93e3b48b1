use super::rows::{TrackRow, read_csv, write_csv};
use super::store::played;
use super::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn three_tracks() -> Value {
    json!([
        {
            "title": "Shape of You",
            "singer": "Ed Sheeran",
            "rating": 5,
            "link": "https://example.com/shape",
            "image_url": "https://example.com/shape.jpg",
            "play_count": 3
        },
        {
            "title": "Hello",
            "singer": "Adele",
            "rating": 4,
            "link": "https://example.com/hello",
            "play_count": 0
        },
        {
            "title": "Perfect",
            "singer": "Ed Sheeran",
            "rating": 3,
            "link": "https://example.com/perfect",
            "play_count": 1
        }
    ])
}

fn write_library(dir: &TempDir, value: &Value) -> PathBuf {
    let path = dir.path().join("song.json");
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn loaded(value: &Value) -> (TempDir, JsonFileStorage, TrackCatalog) {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(write_library(&dir, value));
    let mut catalog = TrackCatalog::new();
    catalog.load(&storage).unwrap();
    (dir, storage, catalog)
}

fn key(s: &str) -> TrackKey {
    s.parse().unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn strings(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

#[test]
fn record_new_accepts_valid_values_and_defaults_play_count() {
    let r = TrackRecord::new("Shape of You", "Ed Sheeran", 5, "http://example.com").unwrap();
    assert_eq!(r.title(), "Shape of You");
    assert_eq!(r.singer(), "Ed Sheeran");
    assert_eq!(r.rating(), 5);
    assert_eq!(r.link(), "http://example.com");
    assert_eq!(r.image_url(), None);
    assert_eq!(r.play_count(), 0);

    let r = r.with_play_count(10).unwrap().with_image_url("http://example.com/a.png");
    assert_eq!(r.play_count(), 10);
    assert_eq!(r.image_url(), Some("http://example.com/a.png"));

    for rating in 0..=5 {
        assert!(TrackRecord::new("t", "s", rating, "l").is_ok());
    }
}

#[test]
fn record_new_rejects_out_of_range_values() {
    for rating in [6, -1, 100] {
        let err = TrackRecord::new("t", "s", rating, "l").unwrap_err();
        assert!(matches!(err, CatalogError::Validation { field: "rating", .. }));
    }

    let err = TrackRecord::new("t", "s", 4, "l")
        .unwrap()
        .with_play_count(-1)
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation { field: "play_count", .. }));

    let err = TrackRecord::new("  ", "s", 4, "l").unwrap_err();
    assert!(matches!(err, CatalogError::Validation { field: "title", .. }));
}

#[test]
fn record_from_json_rejects_non_integer_fields() {
    let cases = [
        json!({"title": "t", "singer": "s", "rating": "four", "link": "l"}),
        json!({"title": "t", "singer": "s", "rating": 4.5, "link": "l"}),
        json!({"title": "t", "singer": "s", "rating": 4, "link": "l", "play_count": "ten"}),
        json!({"title": "t", "singer": "s", "rating": 4, "link": "l", "play_count": -1}),
    ];
    for case in cases {
        let err = TrackRecord::from_json(case.clone()).unwrap_err();
        assert!(
            matches!(err, CatalogError::Validation { .. }),
            "expected validation error for {case}"
        );
    }
}

#[test]
fn track_key_parses_loosely_and_renders_zero_padded() {
    assert_eq!(key("2"), key("02"));
    assert_eq!(key("002"), key("02"));
    assert_eq!(key("02").to_string(), "02");
    assert_eq!(TrackKey::from_index(0).to_string(), "01");
    assert_eq!(TrackKey::from_index(99).to_string(), "100");

    for bad in ["", "0", "00", "-1", "abc", "1a", "99999999999999999999999999"] {
        assert!(matches!(
            bad.parse::<TrackKey>(),
            Err(CatalogError::NotFound(_))
        ));
    }
}

#[test]
fn load_assigns_positional_keys_in_source_order() {
    let (_dir, _storage, catalog) = loaded(&three_tracks());
    assert_eq!(catalog.state(), CatalogState::Loaded);

    let all = catalog.list_all();
    let keys: Vec<String> = all.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["01", "02", "03"]);
    let titles: Vec<&str> = all.iter().map(|(_, r)| r.title()).collect();
    assert_eq!(titles, vec!["Shape of You", "Hello", "Perfect"]);
}

#[test]
fn load_defaults_missing_play_count_and_skips_malformed_entries() {
    let source = json!([
        {"title": "A", "singer": "X", "rating": 2, "link": "l"},
        {"title": "B", "singer": "Y", "link": "l"},
        {"title": "C", "singer": "Z", "rating": 9, "link": "l"},
        {"title": "D", "singer": "W", "rating": 1, "link": "l", "play_count": null}
    ]);
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(write_library(&dir, &source));

    let mut catalog = TrackCatalog::new();
    let report = catalog.load(&storage).unwrap();

    assert_eq!(report.loaded, 2);
    let positions: Vec<usize> = report.skipped.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![2, 3]);
    assert_eq!(catalog.get(key("01")).unwrap().play_count(), 0);
    assert_eq!(catalog.get(key("02")).unwrap().title(), "D");
}

#[test]
fn load_failure_leaves_an_empty_catalog() {
    let (dir, _storage, mut catalog) = loaded(&three_tracks());
    assert_eq!(catalog.len(), 3);

    let missing = JsonFileStorage::new(dir.path().join("nope.json"));
    let err = catalog.load(&missing).unwrap_err();
    assert!(err.is_storage());
    assert_eq!(catalog.state(), CatalogState::Empty);
    assert!(catalog.list_all().is_empty());

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "{ not json").unwrap();
    assert!(catalog.load(&JsonFileStorage::new(&garbage)).unwrap_err().is_storage());

    let object = dir.path().join("object.json");
    fs::write(&object, r#"{"title": "x"}"#).unwrap();
    assert!(catalog.load(&JsonFileStorage::new(&object)).unwrap_err().is_storage());
    assert!(catalog.is_empty());
}

#[test]
fn empty_catalog_queries_are_empty_and_mutations_not_found() {
    let mut catalog = TrackCatalog::new();
    assert_eq!(catalog.state(), CatalogState::Empty);
    assert!(catalog.list_all().is_empty());
    assert!(catalog.list_by_artist("Adele").is_empty());
    assert!(catalog.get(key("01")).is_none());
    assert!(matches!(catalog.record_play(key("01")), Err(CatalogError::NotFound(_))));
    assert!(matches!(catalog.set_rating(key("01"), 3), Err(CatalogError::NotFound(_))));
}

#[test]
fn record_play_increments_only_the_target() {
    let (_dir, _storage, mut catalog) = loaded(&three_tracks());

    assert_eq!(catalog.record_play(key("02")).unwrap(), 1);
    assert_eq!(catalog.get(key("01")).unwrap().play_count(), 3);
    assert_eq!(catalog.get(key("02")).unwrap().play_count(), 1);
    assert_eq!(catalog.get(key("03")).unwrap().play_count(), 1);

    assert_eq!(catalog.record_play(key("02")).unwrap(), 2);
    assert_eq!(catalog.get(key("02")).unwrap().play_count(), 2);
}

#[test]
fn record_play_unknown_key_mutates_nothing() {
    let (_dir, _storage, mut catalog) = loaded(&three_tracks());
    let before: Vec<u64> = catalog.list_all().iter().map(|(_, r)| r.play_count()).collect();

    let err = catalog.record_play(key("99")).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref k) if k == "99"));

    let after: Vec<u64> = catalog.list_all().iter().map(|(_, r)| r.play_count()).collect();
    assert_eq!(before, after);
}

#[test]
fn set_rating_validates_before_applying() {
    let (_dir, _storage, mut catalog) = loaded(&three_tracks());

    let err = catalog.set_rating(key("01"), 7).unwrap_err();
    assert!(matches!(err, CatalogError::Validation { field: "rating", .. }));
    assert_eq!(catalog.get(key("01")).unwrap().rating(), 5);

    assert_eq!(catalog.set_rating(key("01"), 2).unwrap(), 5);
    assert_eq!(catalog.get(key("01")).unwrap().rating(), 2);

    // A bad rating wins over an unknown key.
    assert!(matches!(
        catalog.set_rating(key("99"), -1),
        Err(CatalogError::Validation { .. })
    ));
}

#[test]
fn list_by_artist_is_case_sensitive_substring_match() {
    let (_dir, _storage, catalog) = loaded(&three_tracks());

    let sheeran = catalog.list_by_artist("Sheeran");
    let keys: Vec<String> = sheeran.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["01", "03"]);

    assert!(catalog.list_by_artist("Zzz").is_empty());
    assert!(catalog.list_by_artist("sheeran").is_empty());
    assert_eq!(catalog.artists(), vec!["Adele", "Ed Sheeran"]);
}

#[test]
fn save_after_load_round_trips_every_field() {
    let mut source = three_tracks();
    source[1]["album"] = json!("25");
    source[1]["tags"] = json!(["soul", "pop"]);
    let (dir, storage, catalog) = loaded(&source);

    let out = JsonFileStorage::new(dir.path().join("out.json"));
    catalog.save(&out).unwrap();
    assert_eq!(read_json(out.path()), source);

    // Saving over the source file works too.
    catalog.save(&storage).unwrap();
    assert_eq!(read_json(storage.path()), source);
}

#[test]
fn save_keeps_canonical_field_order_and_extras_in_place() {
    let text = r#"[
    {
        "title": "Hello",
        "singer": "Adele",
        "rating": 4,
        "link": "https://example.com/hello",
        "image_url": "https://example.com/hello.jpg",
        "play_count": 2,
        "year": 2015,
        "album": "25"
    },
    {
        "title": "Perfect",
        "singer": "Ed Sheeran",
        "rating": 3,
        "link": "",
        "play_count": 0
    }
]
"#;
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.json");
    fs::write(&path, text).unwrap();
    let storage = JsonFileStorage::new(&path);
    let mut catalog = TrackCatalog::new();
    catalog.load(&storage).unwrap();

    catalog.save(&storage).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn legacy_field_names_load_and_save_under_canonical_names() {
    let source = json!([
        {"song": "Hello", "artist": "Adele", "rating": 4, "link": "l", "image_path": "i", "play_count": 2}
    ]);
    let (dir, _storage, catalog) = loaded(&source);

    let r = catalog.get(key("01")).unwrap();
    assert_eq!(r.title(), "Hello");
    assert_eq!(r.singer(), "Adele");
    assert_eq!(r.image_url(), Some("i"));
    assert!(r.extra().is_empty());

    let out = JsonFileStorage::new(dir.path().join("out.json"));
    catalog.save(&out).unwrap();
    assert_eq!(
        read_json(out.path()),
        json!([
            {"title": "Hello", "singer": "Adele", "rating": 4, "link": "l", "image_url": "i", "play_count": 2}
        ])
    );
}

#[test]
fn failed_save_keeps_memory_state() {
    let (dir, _storage, mut catalog) = loaded(&three_tracks());
    catalog.record_play(key("02")).unwrap();

    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();
    let unwritable = JsonFileStorage::new(blocker.join("song.json"));

    assert!(catalog.save(&unwritable).unwrap_err().is_storage());
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get(key("02")).unwrap().play_count(), 1);
}

#[test]
fn export_filtered_returns_played_rows_in_key_order() {
    let (_dir, _storage, catalog) = loaded(&three_tracks());

    let rows = catalog.export_filtered(played);
    assert_eq!(
        rows,
        vec![
            TrackRow {
                title: "Shape of You".into(),
                artist: "Ed Sheeran".into(),
                rating: 5,
                play_count: 3
            },
            TrackRow {
                title: "Perfect".into(),
                artist: "Ed Sheeran".into(),
                rating: 3,
                play_count: 1
            },
        ]
    );

    let top_rated = catalog.export_filtered(|r| r.rating() >= 4);
    assert_eq!(top_rated.len(), 2);
}

#[test]
fn import_rows_appends_valid_rows_and_reports_bad_ones() {
    let (_dir, _storage, mut catalog) = loaded(&three_tracks());

    let rows = vec![
        strings(&["Someone Like You", "Adele", "5", "2"]),
        strings(&["Too", "Few"]),
        strings(&["Bad Rating", "Adele", "five", "0"]),
        strings(&["Out Of Range", "Adele", "6", "0"]),
        strings(&["Negative", "Adele", "3", "-4"]),
        strings(&["Thinking Out Loud", "Ed Sheeran", "4", "0"]),
    ];
    let report = catalog.import_rows(&rows, ImportMode::Append);

    assert_eq!(report.appended, 2);
    assert_eq!(report.merged, 0);
    let positions: Vec<usize> = report.skipped.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![2, 3, 4, 5]);

    assert_eq!(catalog.len(), 5);
    let added = catalog.get(key("04")).unwrap();
    assert_eq!(added.title(), "Someone Like You");
    assert_eq!(added.play_count(), 2);
    assert_eq!(added.link(), "");
    assert_eq!(catalog.get(key("05")).unwrap().singer(), "Ed Sheeran");
}

#[test]
fn import_rows_merge_updates_matching_records() {
    let (_dir, _storage, mut catalog) = loaded(&three_tracks());

    let rows = vec![
        strings(&["Hello", "Adele", "1", "9"]),
        strings(&["Hello", "Someone Else", "2", "0"]),
    ];
    let report = catalog.import_rows(&rows, ImportMode::Merge);

    assert_eq!(report.merged, 1);
    assert_eq!(report.appended, 1);
    let hello = catalog.get(key("02")).unwrap();
    assert_eq!(hello.rating(), 1);
    assert_eq!(hello.play_count(), 9);
    assert_eq!(hello.link(), "https://example.com/hello");
    assert_eq!(catalog.get(key("04")).unwrap().singer(), "Someone Else");
}

#[test]
fn import_into_empty_catalog_loads_it() {
    let mut catalog = TrackCatalog::new();
    let report = catalog.import_rows(vec![strings(&["A", "B", "3", "0"])], ImportMode::Append);
    assert_eq!(report.appended, 1);
    assert_eq!(catalog.state(), CatalogState::Loaded);
}

#[test]
fn read_csv_honors_header_choice_and_keeps_ragged_rows() {
    let text = "Song,Artist,Rating,Play Count\nHello,Adele,4,2\n\"Hi, there\",X,3\n";

    let with_header = read_csv(text.as_bytes(), true).unwrap();
    assert_eq!(
        with_header,
        vec![Ok(strings(&["Hello", "Adele", "4", "2"])), Ok(strings(&["Hi, there", "X", "3"]))]
    );

    let without_header = read_csv(text.as_bytes(), false).unwrap();
    assert_eq!(without_header.len(), 3);

    let mut catalog = TrackCatalog::new();
    let report = catalog.import_rows(&without_header, ImportMode::Append);
    assert_eq!(report.appended, 1);
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn read_csv_rejects_undecodable_rows_one_by_one() {
    let bytes: &[u8] = b"Song,Artist,Rating,Play Count\nHello,Adele,4,1\nBad\xff,X,3,0\nPerfect,Ed Sheeran,3,2\n";

    let rows = read_csv(bytes, true).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].as_ref().unwrap_err().contains("column 1"));

    let mut catalog = TrackCatalog::new();
    let report = catalog.import_rows(&rows, ImportMode::Append);
    assert_eq!(report.appended, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].position, 2);
    assert_eq!(catalog.get(key("02")).unwrap().title(), "Perfect");
}

#[test]
fn write_csv_always_writes_header() {
    let mut buf = Vec::new();
    write_csv(&mut buf, &[]).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "Song,Artist,Rating,Play Count\n");

    let mut buf = Vec::new();
    let rows = [TrackRow {
        title: "Hi, there".into(),
        artist: "X".into(),
        rating: 3,
        play_count: 1,
    }];
    write_csv(&mut buf, &rows).unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "Song,Artist,Rating,Play Count\n\"Hi, there\",X,3,1\n"
    );
}

#[test]
fn library_autosave_persists_every_play_path() {
    let dir = tempdir().unwrap();
    let path = write_library(&dir, &three_tracks());
    let Opened { mut library, load } = Library::open(Box::new(JsonFileStorage::new(&path)), true);
    assert_eq!(load.unwrap().loaded, 3);

    library.play(key("02")).unwrap();
    library.play_all(&[key("02"), key("03")]).unwrap();

    let on_disk = read_json(&path);
    assert_eq!(on_disk[1]["play_count"], json!(2));
    assert_eq!(on_disk[2]["play_count"], json!(2));
    assert_eq!(on_disk[0]["play_count"], json!(3));
}

#[test]
fn library_play_all_rejects_unknown_keys_without_counting() {
    let dir = tempdir().unwrap();
    let path = write_library(&dir, &three_tracks());
    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), true);

    let err = library.play_all(&[key("01"), key("42")]).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref k) if k == "42"));
    assert_eq!(library.catalog().get(key("01")).unwrap().play_count(), 3);
}

#[test]
fn library_without_autosave_writes_only_on_save() {
    let dir = tempdir().unwrap();
    let path = write_library(&dir, &three_tracks());
    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), false);

    library.rate(key("01"), 1).unwrap();
    assert_eq!(read_json(&path)[0]["rating"], json!(5));

    library.save().unwrap();
    assert_eq!(read_json(&path)[0]["rating"], json!(1));
}

#[test]
fn library_open_on_missing_file_is_empty_but_usable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new").join("song.json");
    let Opened { mut library, load } = Library::open(Box::new(JsonFileStorage::new(&path)), true);

    assert!(load.unwrap_err().is_storage());
    assert!(library.catalog().is_empty());
    assert_eq!(library.load_failure(), None);

    let record = TrackRecord::new("Hello", "Adele", 4, "l").unwrap();
    assert_eq!(library.add(record).unwrap().to_string(), "01");
    assert_eq!(read_json(&path).as_array().unwrap().len(), 1);
}

#[test]
fn library_import_and_export_csv_files() {
    let dir = tempdir().unwrap();
    let path = write_library(&dir, &three_tracks());
    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), true);

    let import = dir.path().join("in.csv");
    fs::write(&import, "Song,Artist,Rating,Play Count\nRolling,Adele,5,4\nbroken\n").unwrap();
    let imported = library.import_csv(&import, true, ImportMode::Append).unwrap();
    assert!(imported.saved.is_ok());
    assert_eq!(imported.report.summary(), "1 added, 0 updated, 1 skipped");
    assert_eq!(read_json(&path).as_array().unwrap().len(), 4);

    let export = dir.path().join("out.csv");
    assert_eq!(library.export_played_csv(&export).unwrap(), 3);
    let text = fs::read_to_string(&export).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Song,Artist,Rating,Play Count",
            "Shape of You,Ed Sheeran,5,3",
            "Perfect,Ed Sheeran,3,1",
            "Rolling,Adele,5,4",
        ]
    );
}

#[test]
fn library_import_reports_rows_when_the_save_fails() {
    let dir = tempdir().unwrap();
    let path = write_library(&dir, &three_tracks());
    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), true);

    // A directory in place of the file makes the rename fail.
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let import = dir.path().join("in.csv");
    fs::write(&import, "Song,Artist,Rating,Play Count\nRolling,Adele,5,4\nbroken\n").unwrap();
    let imported = library.import_csv(&import, true, ImportMode::Append).unwrap();

    assert_eq!(imported.report.summary(), "1 added, 0 updated, 1 skipped");
    assert!(imported.saved.unwrap_err().is_storage());
    assert_eq!(library.catalog().len(), 4);
}

#[test]
fn library_refuses_to_overwrite_a_file_it_could_not_parse() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.json");
    let broken = r#"[{"title":"A","singer":"B","rating":3,"link":"l"},]"#;
    fs::write(&path, broken).unwrap();

    let Opened { mut library, load } = Library::open(Box::new(JsonFileStorage::new(&path)), true);
    assert!(load.unwrap_err().is_storage());
    assert!(library.load_failure().is_some());

    let record = TrackRecord::new("New", "Song", 3, "l").unwrap();
    assert!(library.add(record).unwrap_err().is_storage());
    assert!(library.save().unwrap_err().is_storage());
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);

    let import = dir.path().join("in.csv");
    fs::write(&import, "Song,Artist,Rating,Play Count\nRolling,Adele,5,4\n").unwrap();
    let imported = library.import_csv(&import, true, ImportMode::Append).unwrap();
    assert!(imported.saved.unwrap_err().is_storage());
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn library_refuses_to_overwrite_a_file_that_is_not_an_array() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.json");
    fs::write(&path, r#"{"title": "A"}"#).unwrap();

    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), true);
    let record = TrackRecord::new("New", "Song", 3, "l").unwrap();
    assert!(library.add(record).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"title": "A"}"#);
}

#[test]
fn library_saves_again_after_a_successful_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.json");
    fs::write(&path, "[{,]").unwrap();
    let Opened { mut library, .. } = Library::open(Box::new(JsonFileStorage::new(&path)), true);
    assert!(library.load_failure().is_some());

    fs::write(&path, serde_json::to_string(&three_tracks()).unwrap()).unwrap();
    assert_eq!(library.reload().unwrap().loaded, 3);
    assert_eq!(library.load_failure(), None);

    library.play(key("02")).unwrap();
    assert_eq!(read_json(&path)[1]["play_count"], json!(1));
}
