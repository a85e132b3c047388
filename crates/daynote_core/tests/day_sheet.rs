use chrono::NaiveDate;
use daynote_core::db::open_db_in_memory;
use daynote_core::sheet::{parse, render};
use daynote_core::{
    DayNotesService, DayRepository, NoteRepository, RecordRef, RepoError, ServiceError,
    SheetError, SqliteDayRepository, SqliteNoteRepository,
};
use rusqlite::Connection;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn service(
    conn: &Connection,
) -> DayNotesService<SqliteDayRepository<'_>, SqliteNoteRepository<'_>> {
    DayNotesService::new(
        SqliteDayRepository::try_new(conn).unwrap(),
        SqliteNoteRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn reading_an_unknown_date_creates_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let day = service.day_notes(date(1)).unwrap();
    assert!(day.is_empty());
    assert_eq!(day.day_id, None);

    let days = SqliteDayRepository::try_new(&conn).unwrap();
    assert!(days.get_day_by_date(date(1)).unwrap().is_none());
}

#[test]
fn add_note_creates_day_on_first_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.add_note(date(2), "water plants").unwrap();
    let second = service.add_note(date(2), "pay rent").unwrap();
    assert_eq!(first.day_id, second.day_id);

    let day = service.day_notes(date(2)).unwrap();
    assert_eq!(day.note_count, 2);
    assert_eq!(
        day.notes.iter().map(|n| n.body.as_str()).collect::<Vec<_>>(),
        vec!["water plants", "pay rent"]
    );
}

#[test]
fn range_groups_notes_by_day() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.add_note(date(3), "c").unwrap();
    service.add_note(date(1), "a").unwrap();
    service.add_note(date(1), "b").unwrap();
    service.add_note(date(20), "out of range").unwrap();

    let range = service.range(date(1), date(7)).unwrap();
    assert_eq!(range.len(), 2);
    assert_eq!(range[0].date, date(1));
    assert_eq!(range[0].note_count, 2);
    assert_eq!(range[1].date, date(3));
    assert_eq!(range[1].notes[0].body, "c");
}

#[test]
fn applying_edited_sheet_reconciles_notes_and_text() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let keep = service.add_note(date(1), "buy milk").unwrap();
    let drop_me = service.add_note(date(1), "call bob").unwrap();

    let mut sheet = render(&service.day_notes(date(1)).unwrap(), date(1));
    sheet = sheet.replace(
        &format!(" - [ ] :{}: buy milk", keep.id),
        &format!(" - [x] :{}: buy oat milk", keep.id),
    );
    sheet = sheet.replace(&format!(" - [ ] :{}: call bob\n", drop_me.id), "");
    sheet = sheet.replace(" - [ ] :\n", " - [ ] : book dentist\n - [x] : stretch\n");
    sheet.push_str("tired but fine\n");

    let applied = service.apply_sheet(&parse(&sheet).unwrap()).unwrap();
    assert_eq!(applied.created, 2);
    assert_eq!(applied.updated, 1);
    assert_eq!(applied.deleted, 1);
    assert!(applied.day_text_changed);

    let day = applied.day;
    assert_eq!(day.day_text, "tired but fine");
    assert_eq!(day.note_count, 3);
    let summary: Vec<_> = day
        .notes
        .iter()
        .map(|n| (n.body.as_str(), n.completed))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("buy oat milk", true),
            ("book dentist", false),
            ("stretch", true)
        ]
    );

    let days = SqliteDayRepository::try_new(&conn).unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let stored_day = days.get_day_by_date(date(1)).unwrap().unwrap();
    assert_eq!(stored_day.task_count, 3);
    assert!(notes.get_note(drop_me.id, true).unwrap().unwrap().deleted_at().is_some());
    assert!(days.audit_task_counts().unwrap().is_empty());
}

#[test]
fn unchanged_sheet_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.add_note(date(1), "same").unwrap();
    let days = SqliteDayRepository::try_new(&conn).unwrap();
    let day = days.get_day_by_date(date(1)).unwrap().unwrap();
    days.update_day_text(day.id, "line one\nline two\n").unwrap();

    let sheet = render(&service.day_notes(date(1)).unwrap(), date(1));
    let applied = service.apply_sheet(&parse(&sheet).unwrap()).unwrap();
    assert_eq!(
        (applied.created, applied.updated, applied.deleted),
        (0, 0, 0)
    );
    assert!(!applied.day_text_changed);
    assert!(applied.day.notes[0].updated_at.is_none());
}

#[test]
fn unchanged_sheet_with_multi_line_and_padded_bodies_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let multi = service.add_note(date(1), "line1\nline2").unwrap();
    let padded = service.add_note(date(1), "  padded  ").unwrap();
    let days = SqliteDayRepository::try_new(&conn).unwrap();
    let day = days.get_day_by_date(date(1)).unwrap().unwrap();
    days.update_day_text(day.id, "morning\n\n  walked the dog\n").unwrap();

    let sheet = render(&service.day_notes(date(1)).unwrap(), date(1));
    let applied = service.apply_sheet(&parse(&sheet).unwrap()).unwrap();
    assert_eq!(
        (applied.created, applied.updated, applied.deleted),
        (0, 0, 0)
    );
    assert!(!applied.day_text_changed);

    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    for original in [&multi, &padded] {
        let stored = notes.get_note(original.id, false).unwrap().unwrap();
        assert_eq!(stored.body, original.body);
        assert!(stored.updated_at.is_none());
    }
    let stored_day = days.get_day(day.id).unwrap().unwrap();
    assert_eq!(stored_day.day_text, "morning\n\n  walked the dog\n");
}

#[test]
fn editing_a_multi_line_body_keeps_its_line_breaks() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let note = service.add_note(date(1), "line1\nline2").unwrap();

    let sheet = render(&service.day_notes(date(1)).unwrap(), date(1)).replace(
        &format!(" - [ ] :{}: line1\\nline2", note.id),
        &format!(" - [x] :{}: line1\\nline2\\nline3", note.id),
    );
    let applied = service.apply_sheet(&parse(&sheet).unwrap()).unwrap();
    assert_eq!(applied.updated, 1);
    assert!(!applied.day_text_changed);
    assert_eq!(applied.day.notes[0].body, "line1\nline2\nline3");
    assert!(applied.day.notes[0].completed);
    assert!(applied.day.day_text.is_empty());
}

#[test]
fn ticked_new_entry_is_created_completed_without_update() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let parsed = parse("# Day: 2024-01-04\n\n - [x] : stretch\n").unwrap();
    let applied = service.apply_sheet(&parsed).unwrap();
    assert_eq!((applied.created, applied.updated), (1, 0));

    let note = &applied.day.notes[0];
    assert!(note.completed);
    assert!(note.updated_at.is_none());
    assert_eq!(applied.day.note_count, 1);
}

#[test]
fn sheet_for_new_date_creates_the_day() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let parsed = parse("# Day: 2024-01-09\n\n - [ ] : first\n").unwrap();
    let applied = service.apply_sheet(&parsed).unwrap();
    assert_eq!(applied.created, 1);
    assert!(applied.day.day_id.is_some());
    assert_eq!(applied.day.note_count, 1);

    let empty = parse("# Day: 2024-01-10\n\n - [ ] :\n").unwrap();
    let applied = service.apply_sheet(&empty).unwrap();
    assert_eq!(applied.day.day_id, None);
}

#[test]
fn sheet_referencing_foreign_note_fails_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let other = service.add_note(date(2), "other day").unwrap();
    let mine = service.add_note(date(1), "mine").unwrap();

    let text = format!(
        "# Day: 2024-01-01\n - [x] :{}: mine edited\n - [ ] :{}: stolen\n",
        mine.id, other.id
    );
    let err = service.apply_sheet(&parse(&text).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::NotFound(RecordRef::Note(id))) if id == other.id
    ));

    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let untouched = notes.get_note(mine.id, false).unwrap().unwrap();
    assert_eq!(untouched.body, "mine");
    assert!(!untouched.completed);
}

#[test]
fn sheet_errors_convert_into_service_errors() {
    let err: ServiceError = parse("no header").unwrap_err().into();
    assert!(matches!(err, ServiceError::Sheet(SheetError::MissingHeader)));
}
