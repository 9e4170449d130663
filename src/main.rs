fn main() {
    std::process::exit(nestest::cli::run());
}
