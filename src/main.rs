fn main() {
    #[cfg(feature = "cli")]
    olepack::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("olepack: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
