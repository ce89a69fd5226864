use log::error;
use std::env;

use tickets::{TicketStore, DEFAULT_FILE_PATH};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() > 2 {
        error!("At most one argument (the tickets file) is supported");
        std::process::exit(1);
    }
    let file_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_FILE_PATH);

    let mut store = TicketStore::new();
    if let Err(err) = store.load(file_path) {
        error!("{err}");
        std::process::exit(1);
    }

    match store.count_by_destination("Brazil") {
        Ok(count) => println!("Brazil count: {count}"),
        Err(err) => println!("{err}"),
    }

    match store.count_by_period("madrugada") {
        Ok(count) => println!("Period count: {count}"),
        Err(err) => println!("{err}"),
    }

    match store.average_destination("Brazil") {
        Ok(avg) => println!("Average: {avg}"),
        Err(err) => println!("{err}"),
    }
}
