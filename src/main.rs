fn main() {
    #[cfg(feature = "cli")]
    bvdf::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("bvdf: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
