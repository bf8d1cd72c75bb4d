fn main() {
    if let Err(err) = cflowchart::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
