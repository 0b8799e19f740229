fn main() {
    if let Err(err) = tabscan::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
