fn main() {
    if let Err(error) = bagtrack_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
