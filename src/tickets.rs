use chrono::{NaiveTime, Timelike};
use csv::ReaderBuilder;
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Path the driver falls back to when no file argument is given.
pub const DEFAULT_FILE_PATH: &str = "./tickets.csv";

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed ticket record: {0}")]
    MalformedRecord(#[from] csv::Error),
    #[error("destination is empty")]
    EmptyDestination,
    #[error("invalid period: {0}")]
    UnknownPeriod(String),
    #[error("there are no tickets in the store")]
    EmptyStore,
}

pub type Result<T> = std::result::Result<T, TicketError>;

#[derive(Debug, Clone, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub destination: String,
    #[serde(deserialize_with = "flight_time_from_hhmm")]
    pub flight_time: NaiveTime,
    pub price: u64,
}

fn flight_time_from_hhmm<'de, D>(deserializer: D) -> std::result::Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Madrugada,
    Manana,
    Tarde,
    Noche,
}

impl Period {
    /// Interval bounds in minutes since midnight; 1440 stands for end of day.
    fn bounds(self) -> (u32, u32) {
        match self {
            Period::Madrugada => (0, 7 * 60),
            Period::Manana => (7 * 60, 13 * 60),
            Period::Tarde => (13 * 60, 20 * 60),
            Period::Noche => (20 * 60, 24 * 60),
        }
    }

    /// Exclusive on both ends: a flight at exactly 07:00 belongs to
    /// neither madrugada nor mañana.
    pub fn contains(self, flight_time: NaiveTime) -> bool {
        let minute = flight_time.hour() * 60 + flight_time.minute();
        let (start, end) = self.bounds();
        minute > start && minute < end
    }
}

impl FromStr for Period {
    type Err = TicketError;

    fn from_str(name: &str) -> Result<Period> {
        match name.to_lowercase().as_str() {
            "madrugada" => Ok(Period::Madrugada),
            "mañana" => Ok(Period::Manana),
            "tarde" => Ok(Period::Tarde),
            "noche" => Ok(Period::Noche),
            _ => Err(TicketError::UnknownPeriod(name.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
}

impl TicketStore {
    pub fn new() -> Self {
        TicketStore {
            tickets: Vec::new(),
        }
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TicketError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_reader(file)?;
        debug!(
            "loaded {} tickets from {}",
            self.tickets.len(),
            path.display()
        );
        Ok(())
    }

    /// Rows are appended only once the whole input has parsed; a failed
    /// load leaves the store as it was.
    pub fn load_from_reader<R: io::Read>(&mut self, rdr: R) -> Result<()> {
        let mut reader = ReaderBuilder::new().has_headers(false).from_reader(rdr);
        let mut rows = Vec::new();
        for record in reader.deserialize::<Ticket>() {
            rows.push(record?);
        }
        self.tickets.append(&mut rows);
        Ok(())
    }

    pub fn count_by_destination(&self, destination: &str) -> Result<usize> {
        if destination.is_empty() {
            return Err(TicketError::EmptyDestination);
        }
        if self.tickets.is_empty() {
            return Err(TicketError::EmptyStore);
        }
        let needle = destination.to_lowercase();
        Ok(self
            .tickets
            .iter()
            .filter(|ticket| ticket.destination.to_lowercase() == needle)
            .count())
    }

    pub fn count_by_period(&self, period_name: &str) -> Result<usize> {
        let period: Period = period_name.parse()?;
        Ok(self
            .tickets
            .iter()
            .filter(|ticket| period.contains(ticket.flight_time))
            .count())
    }

    pub fn average_destination(&self, destination: &str) -> Result<f64> {
        let count = self.count_by_destination(destination)?;
        Ok(count as f64 / self.tickets.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }
}

#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
const SAMPLE_ROWS: &str = "\
1,Tait Mc Caughan,tmc0@scribd.com,Finland,17:11,785
2,Padget McKellen,pmckellen1@prlog.org,China,15:04,537
3,Cuthbert Furnivall,cfurnivall2@marriott.com,China,06:34,822
4,Cloris Bulfoot,cbulfoot3@yellowpages.com,Peru,21:30,290
5,Ezekiel Vannet,evannet4@fda.gov,Brazil,09:45,613
";

#[cfg(test)]
fn sample_store() -> TicketStore {
    let mut store = TicketStore::new();
    store.load_from_reader(SAMPLE_ROWS.as_bytes()).unwrap();
    store
}

#[test]
fn load_maps_rows_to_tickets() {
    let store = sample_store();

    assert_eq!(store.len(), 5);
    let first = store.tickets().next().unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.name, "Tait Mc Caughan");
    assert_eq!(first.email, "tmc0@scribd.com");
    assert_eq!(first.destination, "Finland");
    assert_eq!(first.flight_time, NaiveTime::from_hms_opt(17, 11, 0).unwrap());
    assert_eq!(first.price, 785);
}

#[test]
fn load_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tickets.csv");
    let mut file = File::create(&path).unwrap();
    write!(file, "{}", SAMPLE_ROWS).unwrap();

    let mut store = TicketStore::new();
    store.load(&path).unwrap();
    assert_eq!(store.len(), 5);
}

#[test]
fn load_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut store = TicketStore::new();

    let err = store.load(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, TicketError::FileOpen { .. }));
    assert!(store.is_empty());
}

#[test]
fn load_rejects_non_numeric_id() {
    let mut store = TicketStore::new();
    let err = store
        .load_from_reader("abc,A,a@x,China,10:00,100\n".as_bytes())
        .unwrap_err();
    assert!(matches!(err, TicketError::MalformedRecord(_)));
}

#[test]
fn load_rejects_malformed_time() {
    let mut store = TicketStore::new();
    let err = store
        .load_from_reader("1,A,a@x,China,25:99,100\n".as_bytes())
        .unwrap_err();
    assert!(matches!(err, TicketError::MalformedRecord(_)));
}

#[test]
fn load_rejects_non_numeric_price() {
    let mut store = TicketStore::new();
    let err = store
        .load_from_reader("1,A,a@x,China,10:00,-5\n".as_bytes())
        .unwrap_err();
    assert!(matches!(err, TicketError::MalformedRecord(_)));
}

#[test]
fn failed_load_leaves_store_unchanged() {
    let mut store = sample_store();

    let err = store
        .load_from_reader("6,F,f@x,Chile,08:15,120\n7,G,g@x,Chile,bad,130\n".as_bytes())
        .unwrap_err();
    assert!(matches!(err, TicketError::MalformedRecord(_)));
    assert_eq!(store.len(), 5);
}

#[test]
fn count_by_destination_rejects_empty_destination() {
    let store = sample_store();
    let err = store.count_by_destination("").unwrap_err();
    assert!(matches!(err, TicketError::EmptyDestination));

    // checked before the empty-store case
    let empty = TicketStore::new();
    let err = empty.count_by_destination("").unwrap_err();
    assert!(matches!(err, TicketError::EmptyDestination));
}

#[test]
fn count_by_destination_rejects_empty_store() {
    let store = TicketStore::new();
    let err = store.count_by_destination("China").unwrap_err();
    assert!(matches!(err, TicketError::EmptyStore));
}

#[test]
fn count_by_destination_is_case_insensitive_exact() {
    let mut store = TicketStore::new();
    store
        .load_from_reader(
            "1,A,a@x,China,10:00,100\n\
             2,B,b@x,china,15:00,200\n\
             3,C,c@x,Chinatown,06:00,50\n"
                .as_bytes(),
        )
        .unwrap();

    assert_eq!(store.count_by_destination("CHINA").unwrap(), 2);
    assert_eq!(store.count_by_destination("chinatown").unwrap(), 1);
}

#[test]
fn count_by_period_counts_matching_flights() {
    let store = sample_store();

    assert_eq!(store.count_by_period("madrugada").unwrap(), 1);
    assert_eq!(store.count_by_period("mañana").unwrap(), 1);
    assert_eq!(store.count_by_period("tarde").unwrap(), 2);
    assert_eq!(store.count_by_period("noche").unwrap(), 1);
}

#[test]
fn count_by_period_name_is_case_insensitive() {
    let store = sample_store();

    assert_eq!(store.count_by_period("TARDE").unwrap(), 2);
    assert_eq!(store.count_by_period("MAÑANA").unwrap(), 1);
}

#[test]
fn count_by_period_rejects_unknown_name() {
    let store = sample_store();
    let err = store.count_by_period("siesta").unwrap_err();
    assert!(matches!(err, TicketError::UnknownPeriod(_)));
}

#[test]
fn period_bounds_are_exclusive() {
    let seven = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
    assert!(!Period::Madrugada.contains(seven));
    assert!(!Period::Manana.contains(seven));

    // a midnight flight belongs to no period at all
    let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
    assert!(!Period::Madrugada.contains(midnight));
    assert!(!Period::Noche.contains(midnight));

    let mut store = TicketStore::new();
    store
        .load_from_reader("1,A,a@x,China,07:00,100\n".as_bytes())
        .unwrap();
    assert_eq!(store.count_by_period("madrugada").unwrap(), 0);
    assert_eq!(store.count_by_period("mañana").unwrap(), 0);
}

#[test]
fn average_destination_is_count_over_total() {
    let store = sample_store();

    let avg = store.average_destination("China").unwrap();
    assert_eq!(avg, 0.4);
}

#[test]
fn average_destination_propagates_count_errors() {
    let empty = TicketStore::new();
    let err = empty.average_destination("China").unwrap_err();
    assert!(matches!(err, TicketError::EmptyStore));

    let store = sample_store();
    let err = store.average_destination("").unwrap_err();
    assert!(matches!(err, TicketError::EmptyDestination));
}
