use std::fs::File;
use std::io::Write;

use tickets::{TicketError, TicketStore};

#[test]
fn sanity() {
    let mut store = TicketStore::new();
    store
        .load_from_reader(
            "1,A,a@x,China,10:00,100\n\
             2,B,b@x,China,15:00,200\n\
             3,C,c@x,Peru,06:00,50\n"
                .as_bytes(),
        )
        .unwrap();

    assert_eq!(store.count_by_destination("china").unwrap(), 2);
    assert_eq!(store.count_by_period("tarde").unwrap(), 1);
    let avg = store.average_destination("Peru").unwrap();
    assert!((avg - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn load_from_disk_and_query() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tickets.csv");
    let mut file = File::create(&path).unwrap();
    write!(
        file,
        "1,A,a@x,China,10:00,100\n\
         2,B,b@x,China,15:00,200\n\
         3,C,c@x,Peru,06:00,50\n"
    )
    .unwrap();

    let mut store = TicketStore::new();
    store.load(&path).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.count_by_destination("China").unwrap(), 2);
}

#[test]
fn missing_file_reports_open_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut store = TicketStore::new();

    let err = store.load(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, TicketError::FileOpen { .. }));
}
