use env_logger::Builder;
use log::LevelFilter;

pub fn init(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .try_init()
        .ok();
}
