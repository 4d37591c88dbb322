//! Behavioral tests run against both adapters: SQLite in memory and
//! `MemoryStore`.

use lumen_types::models::{Verse, VerseRef};

use crate::models::{NewLastRead, NewUser, UserUpdate};
use crate::{Database, MemoryStore, Store, StoreError};

fn verse(book_id: i64, book: &str, chapter: i64, verse: i64) -> Verse {
    Verse {
        book_id,
        book: book.to_string(),
        chapter,
        verse,
        text: format!("{book} {chapter}:{verse}"),
    }
}

fn fixture() -> Vec<Verse> {
    vec![
        verse(1, "Genesis", 1, 2),
        verse(1, "Genesis", 1, 1),
        verse(1, "Genesis", 2, 1),
        verse(1, "Genesis", 50, 26),
        verse(2, "Exodus", 1, 1),
    ]
}

fn stores() -> Vec<(&'static str, Box<dyn Store>)> {
    let sqlite = Database::open_in_memory().expect("in-memory database");
    sqlite.import_verses(&fixture()).expect("import");
    vec![
        ("sqlite", Box::new(sqlite) as Box<dyn Store>),
        ("memory", Box::new(MemoryStore::with_verses(fixture())) as Box<dyn Store>),
    ]
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: "hunter22".to_string(),
        first_name: "Ruth".to_string(),
        last_name: "Moab".to_string(),
        age: 40,
        believer_category: 5,
    }
}

// ─── Scripture ───────────────────────────────────────────────────────────────

#[test]
fn chapter_listing_filters_and_orders_by_verse() {
    for (name, store) in stores() {
        let verses = store.list_verses_by_chapter(1, 1).unwrap();
        let numbers: Vec<i64> = verses.iter().map(|v| v.verse).collect();
        assert_eq!(numbers, vec![1, 2], "{name}");
        assert!(verses.iter().all(|v| v.book_id == 1 && v.chapter == 1), "{name}");

        assert!(store.list_verses_by_chapter(1, 999).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn books_are_distinct() {
    for (name, store) in stores() {
        let books = store.list_books().unwrap();
        let ids: Vec<i64> = books.iter().map(|b| b.book_id).collect();
        assert_eq!(ids, vec![1, 2], "{name}");
        assert_eq!(books[0].book, "Genesis", "{name}");
    }
}

#[test]
fn max_chapter_of_unknown_book_is_none() {
    for (name, store) in stores() {
        assert_eq!(store.max_chapter(1).unwrap(), Some(50), "{name}");
        assert_eq!(store.max_chapter(999).unwrap(), None, "{name}");
    }
}

#[test]
fn import_skips_existing_keys() {
    for (name, store) in stores() {
        let inserted = store
            .import_verses(&[verse(1, "Genesis", 1, 1), verse(3, "Leviticus", 1, 1)])
            .unwrap();
        assert_eq!(inserted, 1, "{name}");
        assert_eq!(store.count_verses().unwrap(), 6, "{name}");
        assert_eq!(store.list_verses().unwrap().len(), 6, "{name}");
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[test]
fn duplicate_email_conflicts() {
    for (name, store) in stores() {
        store.create_user(&new_user("ruth@example.com")).unwrap();
        let err = store.create_user(&new_user("ruth@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{name}: {err}");
    }
}

#[test]
fn password_is_stored_hashed() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        assert_ne!(user.password_hash, "hunter22", "{name}");
        assert!(user.password_hash.starts_with("$argon2"), "{name}");
    }
}

#[test]
fn verify_password_does_not_reveal_which_part_failed() {
    for (name, store) in stores() {
        store.create_user(&new_user("ruth@example.com")).unwrap();

        let user = store.verify_password("ruth@example.com", "hunter22").unwrap();
        assert_eq!(user.email, "ruth@example.com", "{name}");

        let wrong_password = store.verify_password("ruth@example.com", "nope").unwrap_err();
        let unknown_email = store.verify_password("nobody@example.com", "hunter22").unwrap_err();
        assert!(matches!(wrong_password, StoreError::InvalidCredentials), "{name}");
        assert!(matches!(unknown_email, StoreError::InvalidCredentials), "{name}");
        assert_eq!(wrong_password.to_string(), unknown_email.to_string(), "{name}");
    }
}

#[test]
fn update_user_applies_only_supplied_fields() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        store
            .update_user(
                user.id,
                &UserUpdate {
                    age: Some(41),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.get_user_by_id(user.id).unwrap();
        assert_eq!(updated.age, 41, "{name}");
        assert_eq!(updated.first_name, "Ruth", "{name}");
        assert_eq!(updated.believer_category, 5, "{name}");

        let missing = store.update_user(9999, &UserUpdate::default()).unwrap_err();
        assert!(matches!(missing, StoreError::NotFound(_)), "{name}");
    }
}

#[test]
fn delete_user_cascades() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        store.add_favorite_verse(user.id, VerseRef::new(1, 1, 1)).unwrap();
        store.add_highlighted_verse(user.id, VerseRef::new(1, 1, 1), "", "").unwrap();
        store
            .update_last_read(
                user.id,
                &NewLastRead {
                    book_id: 1,
                    book_name: "Genesis".into(),
                    chapter: 1,
                    verse: 1,
                },
            )
            .unwrap();

        store.delete_user(user.id).unwrap();

        assert!(matches!(store.get_user_by_id(user.id), Err(StoreError::NotFound(_))), "{name}");
        assert_eq!(store.count_favorite_verses(user.id).unwrap(), 0, "{name}");
        assert_eq!(store.count_highlighted_verses(user.id).unwrap(), 0, "{name}");
        assert!(store.get_last_read(user.id).unwrap().is_none(), "{name}");
    }
}

#[test]
fn deleted_user_cannot_record_activity() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        store.delete_user(user.id).unwrap();
        let r = VerseRef::new(1, 1, 1);

        let favorite = store.add_favorite_verse(user.id, r).unwrap_err();
        assert!(matches!(favorite, StoreError::NotFound("user")), "{name}: {favorite}");

        let highlight = store.add_highlighted_verse(user.id, r, "", "").unwrap_err();
        assert!(matches!(highlight, StoreError::NotFound("user")), "{name}: {highlight}");

        let last_read = store
            .update_last_read(
                user.id,
                &NewLastRead {
                    book_id: 1,
                    book_name: "Genesis".into(),
                    chapter: 1,
                    verse: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(last_read, StoreError::NotFound("user")), "{name}: {last_read}");

        assert_eq!(store.count_favorite_verses(user.id).unwrap(), 0, "{name}");
        assert_eq!(store.count_highlighted_verses(user.id).unwrap(), 0, "{name}");
        assert!(store.get_last_read(user.id).unwrap().is_none(), "{name}");
    }
}

// ─── Favorites ───────────────────────────────────────────────────────────────

#[test]
fn favorite_add_twice_then_remove() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        let r = VerseRef::new(1, 1, 1);

        assert!(!store.is_favorite_verse(user.id, r).unwrap(), "{name}");

        let row = store.add_favorite_verse(user.id, r).unwrap();
        assert_eq!(row.book_name, "Genesis", "{name}");
        assert_eq!(row.text, "Genesis 1:1", "{name}");
        assert!(store.is_favorite_verse(user.id, r).unwrap(), "{name}");

        let err = store.add_favorite_verse(user.id, r).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{name}");

        store.remove_favorite_verse(user.id, r).unwrap();
        assert!(!store.is_favorite_verse(user.id, r).unwrap(), "{name}");

        // Removing again is not an error.
        store.remove_favorite_verse(user.id, r).unwrap();
    }
}

#[test]
fn favorites_are_paginated_newest_first() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        for v in 1..=3 {
            store.add_favorite_verse(user.id, VerseRef::new(7, 1, v)).unwrap();
        }

        assert_eq!(store.count_favorite_verses(user.id).unwrap(), 3, "{name}");

        let first = store.get_favorite_verses(user.id, 2, 0).unwrap();
        let verses: Vec<i64> = first.iter().map(|f| f.verse).collect();
        assert_eq!(verses, vec![3, 2], "{name}");

        let second = store.get_favorite_verses(user.id, 2, 2).unwrap();
        assert_eq!(second.len(), 1, "{name}");
        assert_eq!(second[0].verse, 1, "{name}");
        // No verse row for book 7.
        assert_eq!(second[0].text, "", "{name}");
    }
}

#[test]
fn favorites_are_scoped_per_user() {
    for (name, store) in stores() {
        let a = store.create_user(&new_user("a@example.com")).unwrap();
        let b = store.create_user(&new_user("b@example.com")).unwrap();
        let r = VerseRef::new(1, 1, 1);

        store.add_favorite_verse(a.id, r).unwrap();
        store.add_favorite_verse(b.id, r).unwrap();

        assert_eq!(store.count_favorite_verses(a.id).unwrap(), 1, "{name}");
        store.remove_favorite_verse(a.id, r).unwrap();
        assert!(store.is_favorite_verse(b.id, r).unwrap(), "{name}");
    }
}

// ─── Highlights ──────────────────────────────────────────────────────────────

#[test]
fn highlight_defaults_to_yellow_and_rejects_duplicates() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        let r = VerseRef::new(1, 2, 1);

        let row = store.add_highlighted_verse(user.id, r, "rest", "").unwrap();
        assert_eq!(row.color, "yellow", "{name}");
        assert_eq!(row.note, "rest", "{name}");

        let err = store.add_highlighted_verse(user.id, r, "", "green").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{name}");
    }
}

#[test]
fn highlight_update_touches_only_non_empty_fields() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        let first = VerseRef::new(1, 1, 1);
        let second = VerseRef::new(1, 1, 2);
        store.add_highlighted_verse(user.id, first, "light", "blue").unwrap();
        store.add_highlighted_verse(user.id, second, "", "").unwrap();

        store.update_highlighted_verse(user.id, first, "", "green").unwrap();

        let rows = store.get_highlighted_verses(user.id, 10, 0).unwrap();
        // The updated highlight moves to the front.
        assert_eq!(rows[0].verse, 1, "{name}");
        assert_eq!(rows[0].note, "light", "{name}");
        assert_eq!(rows[0].color, "green", "{name}");

        let err = store
            .update_highlighted_verse(user.id, VerseRef::new(9, 9, 9), "x", "")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{name}");

        store.remove_highlighted_verse(user.id, first).unwrap();
        store.remove_highlighted_verse(user.id, first).unwrap();
        assert_eq!(store.count_highlighted_verses(user.id).unwrap(), 1, "{name}");
    }
}

#[test]
fn empty_highlight_update_still_reports_missing_row() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        let r = VerseRef::new(1, 1, 1);

        let err = store.update_highlighted_verse(user.id, r, "", "").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("highlight")), "{name}: {err}");

        store.add_highlighted_verse(user.id, r, "light", "blue").unwrap();
        store.update_highlighted_verse(user.id, r, "", "").unwrap();

        let rows = store.get_highlighted_verses(user.id, 10, 0).unwrap();
        assert_eq!(rows[0].note, "light", "{name}");
        assert_eq!(rows[0].color, "blue", "{name}");
    }
}

// ─── Last read ───────────────────────────────────────────────────────────────

#[test]
fn last_read_is_absent_until_written() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        assert!(store.get_last_read(user.id).unwrap().is_none(), "{name}");
        assert!(store.get_last_read_verses(user.id).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn last_read_upsert_keeps_one_row_with_latest_values() {
    for (name, store) in stores() {
        let user = store.create_user(&new_user("ruth@example.com")).unwrap();
        for chapter in [1, 2, 50] {
            store
                .update_last_read(
                    user.id,
                    &NewLastRead {
                        book_id: 1,
                        book_name: "Genesis".into(),
                        chapter,
                        verse: if chapter == 50 { 26 } else { 1 },
                    },
                )
                .unwrap();
        }

        let rows = store.get_last_read_verses(user.id).unwrap();
        assert_eq!(rows.len(), 1, "{name}");
        assert_eq!(rows[0].chapter, 50, "{name}");
        assert_eq!(rows[0].text, "Genesis 50:26", "{name}");

        let current = store.get_last_read(user.id).unwrap().unwrap();
        assert_eq!(current.id, rows[0].id, "{name}");
    }
}

#[test]
fn sqlite_store_reports_ready() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.ready());
}
