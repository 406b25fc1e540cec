fn main() {
    if let Err(err) = shelfsense_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
